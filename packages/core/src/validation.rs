// ABOUTME: Catalog validation
// ABOUTME: Ensures consultant data is usable for matching before it reaches the recommender

use std::collections::HashSet;

use thiserror::Error;

use crate::types::ConsultantProfile;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Catalog contains no consultants")]
    EmptyCatalog,

    #[error("Consultant at position {0} has an empty id")]
    EmptyId(usize),

    #[error("Duplicate consultant id: {0}")]
    DuplicateId(String),

    #[error("Consultant {0} has no keywords")]
    MissingKeywords(String),

    #[error("Consultant {id} has invalid rating {rating}")]
    InvalidRating { id: String, rating: f32 },
}

/// Validate a consultant list.
///
/// Ids must be non-empty and unique, since recommendations reference
/// consultants by id. Keywords are the only structured matching field, so
/// every consultant needs at least one.
pub fn validate_catalog(consultants: &[ConsultantProfile]) -> Result<(), ValidationError> {
    if consultants.is_empty() {
        return Err(ValidationError::EmptyCatalog);
    }

    let mut seen = HashSet::new();
    for (position, consultant) in consultants.iter().enumerate() {
        if consultant.id.trim().is_empty() {
            return Err(ValidationError::EmptyId(position));
        }
        if !seen.insert(consultant.id.as_str()) {
            return Err(ValidationError::DuplicateId(consultant.id.clone()));
        }
        if consultant.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ValidationError::MissingKeywords(consultant.id.clone()));
        }
        if !(0.0..=5.0).contains(&consultant.rating) {
            return Err(ValidationError::InvalidRating {
                id: consultant.id.clone(),
                rating: consultant.rating,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConsultantStatus;
    use pretty_assertions::assert_eq;

    fn consultant(id: &str, keywords: &[&str]) -> ConsultantProfile {
        ConsultantProfile {
            id: id.to_string(),
            name: format!("상담사 {}", id),
            phone_id: 100,
            specialty: "타로".to_string(),
            image: "/images/con1.png".to_string(),
            rating: 4.8,
            review_count: 10,
            status: ConsultantStatus::Available,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            price: 2000,
            bio: String::new(),
            data_ai_hint: None,
        }
    }

    #[test]
    fn test_valid_catalog() {
        let consultants = vec![consultant("1", &["타로"]), consultant("2", &["사주"])];
        assert_eq!(validate_catalog(&consultants), Ok(()));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let consultants = vec![consultant("1", &["타로"]), consultant("1", &["사주"])];
        assert_eq!(
            validate_catalog(&consultants),
            Err(ValidationError::DuplicateId("1".to_string()))
        );
    }

    #[test]
    fn test_blank_id_rejected() {
        let consultants = vec![consultant("1", &["타로"]), consultant("  ", &["사주"])];
        assert_eq!(validate_catalog(&consultants), Err(ValidationError::EmptyId(1)));
    }

    #[test]
    fn test_missing_keywords_rejected() {
        let consultants = vec![consultant("7", &[])];
        assert_eq!(
            validate_catalog(&consultants),
            Err(ValidationError::MissingKeywords("7".to_string()))
        );
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let mut bad = consultant("3", &["관상"]);
        bad.rating = 7.5;
        assert!(matches!(
            validate_catalog(&[bad]),
            Err(ValidationError::InvalidRating { .. })
        ));
    }
}
