//! Configuration validation
//!
//! - `trait_def`: Core Validate trait definition
//! - `rate_limit_validators`: Rate limiter, fallback and violation validators
//! - `storage_validators`: Redis validators
//! - `tests`: Test suite for all validators

mod rate_limit_validators;
mod storage_validators;
mod trait_def;

pub use trait_def::Validate;
