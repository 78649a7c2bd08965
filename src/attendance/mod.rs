pub mod clock;
pub mod fetcher;
pub mod punctuality;
pub mod reconciler;
pub mod scheduler;
pub mod service;
