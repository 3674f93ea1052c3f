// ABOUTME: Consultant catalog access
// ABOUTME: Read-only catalog trait plus a static implementation backed by bundled or file-based JSON

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use crate::types::{CatalogEntry, ConsultantProfile, ConsultantStatus};
use crate::validation::{validate_catalog, ValidationError};

const BUILTIN_CATALOG: &str = include_str!("../data/consultants.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(#[from] ValidationError),
}

/// Read-only access to the consultant roster.
///
/// The catalog is owned outside the recommender; implementations must be
/// deterministic and free of side effects.
pub trait ConsultantCatalog: Send + Sync {
    /// All consultants, in catalog order
    fn consultants(&self) -> &[ConsultantProfile];

    fn find_by_id(&self, id: &str) -> Option<&ConsultantProfile> {
        self.consultants().iter().find(|c| c.id == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Matching view of every consultant
    fn entries(&self) -> Vec<CatalogEntry> {
        self.consultants().iter().map(ConsultantProfile::to_entry).collect()
    }
}

/// Specialty label that stands for "every specialty"
pub const ALL_SPECIALTIES: &str = "전체";

/// Browse filter over the catalog; an unset field matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsultantFilter {
    pub specialty: Option<String>,
    pub status: Option<ConsultantStatus>,
}

impl ConsultantFilter {
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        let specialty = specialty.into();
        let specialty = specialty.trim();
        self.specialty = (!specialty.is_empty() && specialty != ALL_SPECIALTIES)
            .then(|| specialty.to_string());
        self
    }

    pub fn with_status(mut self, status: ConsultantStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, consultant: &ConsultantProfile) -> bool {
        self.specialty
            .as_deref()
            .map_or(true, |s| consultant.specialty == s)
            && self.status.map_or(true, |s| consultant.status == s)
    }
}

/// Catalog held entirely in memory
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    consultants: Vec<ConsultantProfile>,
}

impl StaticCatalog {
    /// Catalog bundled with the crate
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Load a catalog from a JSON file (an array of consultant profiles)
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        info!("Loading consultant catalog from {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read catalog {}: {}", path.display(), e);
            CatalogError::Io(e)
        })?;

        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let consultants: Vec<ConsultantProfile> = serde_json::from_str(json)?;
        Self::from_profiles(consultants)
    }

    pub fn from_profiles(consultants: Vec<ConsultantProfile>) -> Result<Self, CatalogError> {
        validate_catalog(&consultants)?;
        Ok(Self { consultants })
    }

    /// Consultants matching the filter, in catalog order
    pub fn filter(&self, filter: &ConsultantFilter) -> Vec<&ConsultantProfile> {
        self.consultants
            .iter()
            .filter(|c| filter.matches(c))
            .collect()
    }

    /// Distinct specialties in order of first appearance
    pub fn specialties(&self) -> Vec<&str> {
        let mut specialties: Vec<&str> = Vec::new();
        for c in &self.consultants {
            if !specialties.contains(&c.specialty.as_str()) {
                specialties.push(&c.specialty);
            }
        }
        specialties
    }

    pub fn len(&self) -> usize {
        self.consultants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consultants.is_empty()
    }
}

impl ConsultantCatalog for StaticCatalog {
    fn consultants(&self) -> &[ConsultantProfile] {
        &self.consultants
    }
}
