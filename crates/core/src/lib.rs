//! Core business logic for the estate backend.

pub mod services;

pub use services::*;
