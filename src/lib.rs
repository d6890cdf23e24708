//! Records API for disaster-relief coordination: donations, beneficiaries,
//! volunteers and disasters over a pluggable document store, plus a summary
//! report.

pub mod api;
pub mod config;
pub mod reporting;
pub mod repository;
pub mod store;
pub mod telemetry;
