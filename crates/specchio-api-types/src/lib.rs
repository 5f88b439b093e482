//! Shared request and response types for the estates backend REST API.
//!
//! Every payload the backend sends is wrapped in an [`Envelope`]; the records
//! below mirror the JSON bodies inside it. Draft types carry the writable
//! subset used by create and update calls.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ============================================================================
// Envelope
// ============================================================================

/// Standard response wrapper used by every backend route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, turning a `success: false` body into the
    /// backend-supplied message.
    pub fn into_result(self) -> Result<T, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self
                .message
                .unwrap_or_else(|| "backend reported failure".to_string()))
        }
    }
}

// ============================================================================
// Common argument shapes
// ============================================================================

/// Argument for detail and delete calls addressed by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ById {
    pub id: i64,
}

impl ById {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// Argument for update calls: the target id plus the writable fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithId<T> {
    pub id: i64,
    #[serde(flatten)]
    pub data: T,
}

impl<T> WithId<T> {
    pub fn new(id: i64, data: T) -> Self {
        Self { id, data }
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Upcoming => "upcoming",
            ProjectStatus::Ongoing => "ongoing",
            ProjectStatus::Completed => "completed",
        }
    }
}

/// Filter for project list queries. Absent fields match everything, so an
/// empty filter requests the full list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilter {
    #[serde(default)]
    pub city_id: Option<i64>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    pub location: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_min: Option<i64>,
    #[serde(default)]
    pub price_max: Option<i64>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

// ============================================================================
// Blogs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogDraft {
    pub title: String,
    pub author: String,
    pub body: String,
    #[serde(default)]
    pub cover_image: Option<String>,
}

// ============================================================================
// Careers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerRecord {
    pub id: i64,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: String,
    pub description: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerDraft {
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: String,
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub venue: String,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub ends_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub venue: String,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub ends_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub description: Option<String>,
}

// ============================================================================
// Cities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: i64,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDraft {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

// ============================================================================
// Leads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub project_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success_unwraps_data() {
        let env: Envelope<Vec<i64>> = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": [1, 2, 3]
        }))
        .unwrap();
        assert_eq!(env.into_result().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn envelope_failure_surfaces_message() {
        let env: Envelope<Option<i64>> = serde_json::from_value(serde_json::json!({
            "success": false,
            "message": "city not found",
            "data": null
        }))
        .unwrap();
        assert_eq!(env.into_result().unwrap_err(), "city not found");
    }

    #[test]
    fn with_id_flattens_draft_fields() {
        let update = WithId::new(
            4,
            CityDraft {
                name: "Pune".to_string(),
                state: "Maharashtra".to_string(),
                description: None,
                image_url: None,
            },
        );
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["name"], "Pune");
    }

    #[test]
    fn project_filter_accepts_an_empty_object() {
        let filter: ProjectFilter = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(filter, ProjectFilter::default());
    }

    #[test]
    fn blog_record_parses_backend_shape() {
        let blog: BlogRecord = serde_json::from_value(serde_json::json!({
            "id": 12,
            "title": "Monsoon-ready homes",
            "author": "site-team",
            "body": "…",
            "published_at": "2024-06-01T09:30:00Z"
        }))
        .unwrap();
        assert_eq!(blog.id, 12);
        assert!(blog.published_at.is_some());
        assert!(blog.cover_image.is_none());
    }
}
