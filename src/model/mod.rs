pub mod attendance;
pub mod department;
pub mod device;
pub mod employee;
pub mod ledger;
