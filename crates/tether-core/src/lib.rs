//! Core tether library (endpoint auth, probe client, credential stores).

pub mod auth;
pub mod config;
pub mod endpoint;
pub mod host;
pub mod probe;
