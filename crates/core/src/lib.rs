//! # EMC Core
//!
//! Core business logic for the EMC location registry.
//!
//! This crate contains the location hierarchy and its rules:
//! - The [`Location`] entity and its wire mapping
//! - The [`PersistenceGateway`] capability, with in-memory and file-backed implementations
//! - [`LocationTree`]: skeleton bootstrap and iterative traversal
//! - [`LocationRegistry`]: list, search, retrieve, create, update and delete
//!
//! **No API concerns**: HTTP servers and CLI parsing belong in `api-rest` and `emc-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod location;
pub mod registry;
pub mod tree;

pub use api_shared::wire;
pub use config::CoreConfig;
pub use constants::DEFAULT_DATA_DIR;
pub use emc_types::{NonEmptyText, TextError};
pub use emc_uuid::{LocationId, PatientId, RecordId};
pub use error::{ErrorKind, LocationError, LocationResult};
pub use gateway::{FileGateway, MemoryGateway, PersistenceGateway};
pub use location::{Location, PatientRecord};
pub use registry::{LocationRegistry, Ready, Uninitialised};
pub use tree::{BootstrapReport, LocationTree};
