mod authenticator;
pub use authenticator::{Authenticator, Login, RunningCheck};
