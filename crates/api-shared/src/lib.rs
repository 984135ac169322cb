//! # API Shared
//!
//! Wire types and shared services for the EMC location APIs.
//!
//! Contains:
//! - The JSON representation of a location and its request/response envelopes (`wire` module)
//! - `HealthService`
//!
//! Used by `emc-core` (which returns wire types from its read/write operations) and by
//! `api-rest`.

pub mod health;
pub mod wire;

pub use health::{HealthRes, HealthService};
pub use wire::*;
