//! Domain models for the PathLab portal.
//!
//! These are the core types shared across all crates.

pub mod appointment;
pub mod audit;
pub mod employee;
pub mod permission;
pub mod service;
pub mod session;
pub mod user;
