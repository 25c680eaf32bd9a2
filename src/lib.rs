//! Scoring backend for structured technical interviews.
//!
//! Interviewers score candidates topic by topic against a weighted competency
//! matrix; this crate turns those raw scores into per-module and per-assessment
//! statistics, aggregates multiple assessors' evaluations for one candidate,
//! and exposes the results over an HTTP API alongside CSV/JSON import-export.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
