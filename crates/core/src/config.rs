//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Nothing in the core reads environment variables during request handling.

use crate::constants::{
    ASSIGNED_LOCATION_ATTRIBUTE, DEFAULT_LOCALE, LOCATIONS_DIR_NAME, PATIENTS_DIR_NAME,
};
use crate::{LocationError, LocationResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    default_locale: String,
    patient_location_attributes: Vec<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvalidInput`] if the locale is blank or no location-valued
    /// patient attribute is configured (the delete safety scan would otherwise never match).
    pub fn new(
        data_dir: PathBuf,
        default_locale: String,
        patient_location_attributes: Vec<String>,
    ) -> LocationResult<Self> {
        let default_locale = default_locale.trim().to_string();
        if default_locale.is_empty() {
            return Err(LocationError::InvalidInput(
                "default_locale cannot be empty".into(),
            ));
        }

        let patient_location_attributes: Vec<String> = patient_location_attributes
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if patient_location_attributes.is_empty() {
            return Err(LocationError::InvalidInput(
                "at least one patient location attribute must be configured".into(),
            ));
        }

        Ok(Self {
            data_dir,
            default_locale,
            patient_location_attributes,
        })
    }

    /// Configuration with default locale and attributes rooted at `data_dir`.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            default_locale: DEFAULT_LOCALE.into(),
            patient_location_attributes: vec![ASSIGNED_LOCATION_ATTRIBUTE.into()],
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn locations_dir(&self) -> PathBuf {
        self.data_dir.join(LOCATIONS_DIR_NAME)
    }

    pub fn patients_dir(&self) -> PathBuf {
        self.data_dir.join(PATIENTS_DIR_NAME)
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn patient_location_attributes(&self) -> &[String] {
        &self.patient_location_attributes
    }
}

/// Parse the default locale from an optional environment value.
///
/// `None` or blank values fall back to [`DEFAULT_LOCALE`].
pub fn locale_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCALE.into())
}

/// Parse a comma-separated list of location-valued patient attributes.
///
/// `None` or a list with no non-blank entries falls back to [`ASSIGNED_LOCATION_ATTRIBUTE`].
pub fn patient_location_attributes_from_env_value(value: Option<String>) -> Vec<String> {
    let parsed: Vec<String> = value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        vec![ASSIGNED_LOCATION_ATTRIBUTE.into()]
    } else {
        parsed
    }
}
