#![doc = "The `taskhive` library crate."]
#![doc = ""]
#![doc = "This crate contains the session credential lifecycle (token issuance,"]
#![doc = "rotation, reuse detection and revocation), domain models, routing"]
#![doc = "configuration, and error handling for the TaskHive application."]
#![doc = "It is used by the main binary (`main.rs`) to construct and run the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::auth::{SessionManager, TokenEncoder};
pub use crate::error::AppError;
