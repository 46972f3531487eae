//! Runtime orchestration layer for the course report.
//!
//! Chains the ingestion, reconciliation and export stages of `report-data`
//! into the three flows the binary exposes.

pub mod orchestrator;

pub use report_core as core;
pub use report_data as data;
