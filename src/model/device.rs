use derive_more::Display;
use serde::Deserialize;

/// Login for one access-control terminal.
///
/// `ip` is the address as stored in the device table and may carry an
/// explicit port (`192.168.1.64:8080`).
#[derive(Clone, Deserialize, sqlx::FromRow, Display)]
#[display(fmt = "{}", ip)]
pub struct DeviceCredential {
    pub ip: String,
    pub username: String,
    pub password: String,
}

impl DeviceCredential {
    pub fn new(
        ip: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

// keeps the password out of logs
impl std::fmt::Debug for DeviceCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCredential")
            .field("ip", &self.ip)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
