//! Shared building blocks for the course report pipelines.
//!
//! Holds the record types, the error type, configuration resolution, text
//! encodings and timezone handling used by the data and runtime crates.

pub mod encoding;
pub mod error;
pub mod models;
pub mod settings;
pub mod time_utils;
