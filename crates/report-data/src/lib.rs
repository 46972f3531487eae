//! Data layer for the course reports.
//!
//! Loads catalogs and previous exports, talks to the REST API, reconciles
//! users into flat rows, joins lesson progress, builds the grouped summary
//! and writes the timestamped report files.

pub mod aggregator;
pub mod assembler;
pub mod catalog;
pub mod client;
pub mod completed;
pub mod reader;
pub mod reconcile;
pub mod summary;
pub mod writer;

pub use report_core as core;
