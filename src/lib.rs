//! Launch the Client Portal Gateway, detect a running one and authenticate
//! against it.

mod login;
pub use login::*;

pub mod api;
pub mod config;
pub mod logger;
pub mod process;
