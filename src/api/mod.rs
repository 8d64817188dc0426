mod session;
pub use session::{HttpSession, Session};

mod model;
pub use model::*;

pub mod endpoint {
    pub const AUTH_STATUS: &str = "/api/iserver/auth/status";
    pub const SERVER_ACCOUNT: &str = "/api/iserver/account";
    pub const SSO_VALIDATE: &str = "/api/sso/validate";
    pub const REAUTHENTICATE: &str = "/api/iserver/reauthenticate";
    pub const LOGOUT: &str = "/api/logout";
}
