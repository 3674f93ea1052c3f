// ABOUTME: Core types and catalog access for Innerspell
// ABOUTME: Foundational package providing consultant data shared by the recommender and the API

pub mod catalog;
pub mod types;
pub mod validation;

// Re-export main types
pub use types::{CatalogEntry, ConsultantProfile, ConsultantStatus};

// Re-export catalog access
pub use catalog::{
    CatalogError, ConsultantCatalog, ConsultantFilter, StaticCatalog, ALL_SPECIALTIES,
};

// Re-export validation
pub use validation::{validate_catalog, ValidationError};
