use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::StoreError;
use crate::images::models::ImageResponse;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Spring water classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpringType {
    Sulfur,
    Carbonic,
    Alkaline,
    Acidic,
    Salt,
    Iron,
    Radium,
    Simple,
    Other,
    Unknown,
}

impl SpringType {
    pub const ALL: [SpringType; 10] = [
        SpringType::Sulfur,
        SpringType::Carbonic,
        SpringType::Alkaline,
        SpringType::Acidic,
        SpringType::Salt,
        SpringType::Iron,
        SpringType::Radium,
        SpringType::Simple,
        SpringType::Other,
        SpringType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpringType::Sulfur => "sulfur",
            SpringType::Carbonic => "carbonic",
            SpringType::Alkaline => "alkaline",
            SpringType::Acidic => "acidic",
            SpringType::Salt => "salt",
            SpringType::Iron => "iron",
            SpringType::Radium => "radium",
            SpringType::Simple => "simple",
            SpringType::Other => "other",
            SpringType::Unknown => "unknown",
        }
    }
}

impl FromStr for SpringType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpringType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown spring type: {}", s))
    }
}

impl fmt::Display for SpringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facility or characteristic of a visited onsen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    OutdoorBath,
    PrivateBath,
    DirectFromSpring,
    Sauna,
    Restaurant,
    Accommodation,
    Viewpoint,
    Historical,
}

impl Feature {
    pub const ALL: [Feature; 8] = [
        Feature::OutdoorBath,
        Feature::PrivateBath,
        Feature::DirectFromSpring,
        Feature::Sauna,
        Feature::Restaurant,
        Feature::Accommodation,
        Feature::Viewpoint,
        Feature::Historical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::OutdoorBath => "outdoor_bath",
            Feature::PrivateBath => "private_bath",
            Feature::DirectFromSpring => "direct_from_spring",
            Feature::Sauna => "sauna",
            Feature::Restaurant => "restaurant",
            Feature::Accommodation => "accommodation",
            Feature::Viewpoint => "viewpoint",
            Feature::Historical => "historical",
        }
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown feature: {}", s))
    }
}

/// A single onsen visit owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub location: String,
    pub spring_type: SpringType,
    pub features: Vec<Feature>,
    pub visit_date: NaiveDate,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LogEntry {
    /// Build a new entry for `owner` from validated input
    pub fn new(owner: Uuid, draft: LogDraft) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: owner,
            name: draft.name,
            location: draft.location,
            spring_type: draft.spring_type,
            features: draft.features,
            visit_date: draft.visit_date,
            rating: draft.rating,
            comment: draft.comment,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every mutable field; id, owner and creation time are kept
    pub fn apply(&mut self, draft: LogDraft) {
        self.name = draft.name;
        self.location = draft.location;
        self.spring_type = draft.spring_type;
        self.features = draft.features;
        self.visit_date = draft.visit_date;
        self.rating = draft.rating;
        self.comment = draft.comment;
        self.updated_at = Utc::now();
    }

    pub fn features_as_strings(&self) -> Vec<String> {
        self.features.iter().map(|f| f.as_str().to_string()).collect()
    }
}

/// Raw database row for `log_entries`
#[derive(Debug, FromRow)]
pub struct LogEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub location: String,
    pub spring_type: String,
    pub features: Vec<String>,
    pub visit_date: NaiveDate,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LogEntryRow> for LogEntry {
    type Error = StoreError;

    fn try_from(row: LogEntryRow) -> Result<Self, Self::Error> {
        let spring_type = row.spring_type.parse().map_err(StoreError::Backend)?;
        let features = row
            .features
            .iter()
            .map(|f| f.parse())
            .collect::<Result<Vec<Feature>, _>>()
            .map_err(StoreError::Backend)?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            location: row.location,
            spring_type,
            features,
            visit_date: row.visit_date,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Request DTO for creating or fully replacing a log entry
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LogRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"),
        custom = "crate::validation::validate_not_blank"
    )]
    pub name: String,
    #[validate(
        length(min = 1, max = 200, message = "Location must be between 1 and 200 characters"),
        custom = "crate::validation::validate_not_blank"
    )]
    pub location: String,
    #[validate(custom = "crate::validation::validate_spring_type")]
    pub spring_type: String,
    #[serde(default)]
    #[validate(custom = "crate::validation::validate_features")]
    pub features: Vec<String>,
    /// `YYYY-MM-DD`
    #[validate(custom = "crate::validation::validate_visit_date")]
    pub visit_date: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Comment must not exceed 1000 characters"))]
    pub comment: String,
}

/// Typed, validated log entry fields
#[derive(Debug, Clone, PartialEq)]
pub struct LogDraft {
    pub name: String,
    pub location: String,
    pub spring_type: SpringType,
    pub features: Vec<Feature>,
    pub visit_date: NaiveDate,
    pub rating: i16,
    pub comment: String,
}

impl LogRequest {
    /// Validate and convert into typed fields
    ///
    /// Duplicate features collapse to their first occurrence.
    pub fn into_draft(self) -> Result<LogDraft, validator::ValidationErrors> {
        self.validate()?;

        let mut errors = validator::ValidationErrors::new();
        let spring_type = self.spring_type.parse::<SpringType>();
        let visit_date = NaiveDate::parse_from_str(&self.visit_date, DATE_FORMAT);
        let mut features: Vec<Feature> = Vec::with_capacity(self.features.len());
        for raw in &self.features {
            match raw.parse::<Feature>() {
                Ok(feature) if !features.contains(&feature) => features.push(feature),
                Ok(_) => {}
                Err(_) => errors.add("features", validator::ValidationError::new("invalid_feature")),
            }
        }

        match (spring_type, visit_date) {
            (Ok(spring_type), Ok(visit_date)) if errors.is_empty() => Ok(LogDraft {
                name: self.name.trim().to_string(),
                location: self.location.trim().to_string(),
                spring_type,
                features,
                visit_date,
                rating: self.rating,
                comment: self.comment,
            }),
            (spring_type, visit_date) => {
                if spring_type.is_err() {
                    errors.add("spring_type", validator::ValidationError::new("invalid_spring_type"));
                }
                if visit_date.is_err() {
                    errors.add("visit_date", validator::ValidationError::new("invalid_date"));
                }
                Err(errors)
            }
        }
    }
}

/// Log entry with its images, as returned by the detail endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct LogEntryResponse {
    #[serde(flatten)]
    pub entry: LogEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageResponse>,
}

/// One page of log entries
#[derive(Debug, Serialize, ToSchema)]
pub struct LogListResponse {
    pub onsen_logs: Vec<LogEntry>,
    pub total_count: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kusatsu() -> LogRequest {
        LogRequest {
            name: "Kusatsu".into(),
            location: "Gunma".into(),
            spring_type: "sulfur".into(),
            features: vec!["outdoor_bath".into(), "sauna".into(), "outdoor_bath".into()],
            visit_date: "2024-01-10".into(),
            rating: 5,
            comment: String::new(),
        }
    }

    #[test]
    fn test_enum_wire_names_round_trip() {
        for t in SpringType::ALL {
            assert_eq!(t.as_str().parse::<SpringType>().unwrap(), t);
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
        for f in Feature::ALL {
            assert_eq!(f.as_str().parse::<Feature>().unwrap(), f);
            assert_eq!(serde_json::to_value(f).unwrap(), f.as_str());
        }
    }

    #[test]
    fn test_into_draft_collapses_duplicate_features() {
        let draft = kusatsu().into_draft().unwrap();
        assert_eq!(draft.spring_type, SpringType::Sulfur);
        assert_eq!(draft.features, vec![Feature::OutdoorBath, Feature::Sauna]);
        assert_eq!(draft.visit_date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    }

    #[test]
    fn test_into_draft_rejects_bad_fields() {
        let bad_rating = LogRequest { rating: 6, ..kusatsu() };
        assert!(bad_rating.into_draft().unwrap_err().field_errors().contains_key("rating"));

        let bad_date = LogRequest { visit_date: "2024-13-40".into(), ..kusatsu() };
        assert!(bad_date.into_draft().unwrap_err().field_errors().contains_key("visit_date"));

        let bad_type = LogRequest { spring_type: "lava".into(), ..kusatsu() };
        assert!(bad_type.into_draft().unwrap_err().field_errors().contains_key("spring_type"));

        let blank_name = LogRequest { name: "   ".into(), ..kusatsu() };
        assert!(blank_name.into_draft().unwrap_err().field_errors().contains_key("name"));
    }

    #[test]
    fn test_apply_keeps_identity() {
        let owner = Uuid::new_v4();
        let mut entry = LogEntry::new(owner, kusatsu().into_draft().unwrap());
        let id = entry.id;
        let created = entry.created_at;

        entry.apply(LogRequest { name: "Hakone".into(), rating: 3, ..kusatsu() }.into_draft().unwrap());

        assert_eq!(entry.id, id);
        assert_eq!(entry.user_id, owner);
        assert_eq!(entry.created_at, created);
        assert_eq!(entry.name, "Hakone");
        assert_eq!(entry.rating, 3);
    }

    #[test]
    fn test_row_with_unknown_type_is_backend_error() {
        let row = LogEntryRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "x".into(),
            location: "y".into(),
            spring_type: "lava".into(),
            features: vec![],
            visit_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            rating: 3,
            comment: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(LogEntry::try_from(row), Err(StoreError::Backend(_))));
    }
}
