//! perceptor-core: Core audit engine, traits, scoring, and storage.
//!
//! This crate defines the data model, the provider trait, the heuristic
//! scorer, and the dispatcher that turns golden questions into an
//! evaluation report.

pub mod defaults;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod prompt;
pub mod quick;
pub mod report;
pub mod scoring;
pub mod statistics;
pub mod store;
pub mod synthesis;
pub mod traits;
