//! PathLab Auth — authentication, sessions and access control.
//!
//! This crate provides:
//! - Password hashing and verification (Argon2id)
//! - Opaque bearer session tokens ([`token`])
//! - Login/logout orchestration ([`AuthService`])
//! - Role and permission gates ([`gate`])
//!
//! Authorization is evaluated in two stages: a coarse role gate, then
//! a fine permission gate for staff. Admins pass both stages.

pub mod config;
pub mod error;
pub mod gate;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::AuthService;
