#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Session-token core of the TaskDesk backend: credential signing, the"]
#![doc = "server-side token record store, the session manager that ties them"]
#![doc = "together, and the actix-web authorization gate in front of the API."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::error::AppError;
