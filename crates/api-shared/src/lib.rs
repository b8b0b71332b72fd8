//! # API Shared
//!
//! Shared definitions for the slide filler HTTP surfaces.
//!
//! Contains:
//! - Wire types for the fill envelope and health checks
//! - Shared services like `HealthService`
//! - API-key validation
//!
//! Used by `api-rest` and the workspace's main binary.

pub mod auth;
pub mod health;
pub mod wire;

pub use auth::{validate_api_key, AuthError, API_KEY_HEADER};
pub use health::HealthService;
pub use wire::{ErrorRes, FillReq, FillRes, HealthRes};
