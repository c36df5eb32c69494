//! PathLab Core — domain models, error taxonomy and repository traits
//! shared across all crates.

pub mod error;
pub mod models;
pub mod repository;
