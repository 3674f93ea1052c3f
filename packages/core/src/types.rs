// ABOUTME: Consultant data model
// ABOUTME: Full consultant profiles and the reduced entry shape used for matching

use serde::{Deserialize, Serialize};

/// Availability of a consultant for a live call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsultantStatus {
    Available,
    Busy,
}

impl std::str::FromStr for ConsultantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(ConsultantStatus::Available),
            "busy" => Ok(ConsultantStatus::Busy),
            other => Err(format!("unknown consultant status: {}", other)),
        }
    }
}

/// A consultant as listed on the site.
///
/// Profiles are created out of band and are read-only to the rest of the
/// workspace. Only `id`, `name`, `specialty` and `keywords` are ever shown
/// to the model; see [`CatalogEntry`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantProfile {
    pub id: String,
    pub name: String,
    pub phone_id: u32,
    pub specialty: String,
    pub image: String,
    pub rating: f32,
    pub review_count: u32,
    pub status: ConsultantStatus,
    pub keywords: Vec<String>,
    /// Price per 30 seconds, in KRW
    pub price: u32,
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_ai_hint: Option<String>,
}

impl ConsultantProfile {
    /// Project the profile onto the fields the matching logic needs
    pub fn to_entry(&self) -> CatalogEntry {
        CatalogEntry {
            id: self.id.clone(),
            name: self.name.clone(),
            specialty: self.specialty.clone(),
            keywords: self.keywords.clone(),
        }
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}

/// Matching view of a consultant, as returned by the catalog tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> ConsultantProfile {
        ConsultantProfile {
            id: "1".to_string(),
            name: "세라피나".to_string(),
            phone_id: 1023,
            specialty: "타로".to_string(),
            image: "/images/con1.png".to_string(),
            rating: 4.9,
            review_count: 281,
            status: ConsultantStatus::Available,
            keywords: vec!["타로".to_string(), "연애".to_string(), "따뜻함".to_string()],
            price: 2500,
            bio: "타로 마스터".to_string(),
            data_ai_hint: None,
        }
    }

    #[test]
    fn test_to_entry_drops_extended_fields() {
        let entry = sample_profile().to_entry();
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["id"], "1");
        assert_eq!(json["specialty"], "타로");
        assert!(json.get("price").is_none());
        assert!(json.get("bio").is_none());
        assert!(json.get("rating").is_none());
    }

    #[test]
    fn test_profile_uses_camel_case_on_the_wire() {
        let json = serde_json::to_value(sample_profile()).unwrap();
        assert_eq!(json["phoneId"], 1023);
        assert_eq!(json["reviewCount"], 281);
        assert_eq!(json["status"], "available");
        assert!(json.get("dataAiHint").is_none());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("Busy".parse::<ConsultantStatus>(), Ok(ConsultantStatus::Busy));
        assert!("offline".parse::<ConsultantStatus>().is_err());
    }

    #[test]
    fn test_has_keyword() {
        let profile = sample_profile();
        assert!(profile.has_keyword("연애"));
        assert!(!profile.has_keyword("사주"));
    }
}
