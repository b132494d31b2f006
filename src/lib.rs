//! Intake Core Library
//!
//! This crate provides the core functionality for the intake export service,
//! including provider fallback orchestration, the self-healing service
//! launcher, the document export pipeline, and telemetry.

pub mod export;
pub mod launcher;
pub mod orchestrator;
pub mod service;
pub mod telemetry;
