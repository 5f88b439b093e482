//! Invalidation tags.
//!
//! Defines the `Tag` tagged union that relates queries (which *provide* tags)
//! to mutations (which *invalidate* them), plus the matching rule that drives
//! invalidation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource domain a tag belongs to. Matching never crosses types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagType {
    Project,
    Blog,
    Career,
    Event,
    City,
    Service,
    Lead,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Project => "Project",
            TagType::Blog => "Blog",
            TagType::Career => "Career",
            TagType::Event => "Event",
            TagType::City => "City",
            TagType::Service => "Service",
            TagType::Lead => "Lead",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete resource identity within a tag type.
///
/// Backend ids are numeric today; string ids stay representable for resources
/// addressed by slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceId {
    Int(i64),
    Str(String),
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        ResourceId::Int(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId::Str(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        ResourceId::Str(id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Int(id) => write!(f, "{id}"),
            ResourceId::Str(id) => f.write_str(id),
        }
    }
}

/// Either a concrete resource id or the list sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagId {
    /// Sentinel for "the collection of this type" (index/list queries).
    List,
    Id(ResourceId),
}

/// A `(type, id)` label. Queries declare the tags they provide; mutations
/// declare the tags they invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub ty: TagType,
    pub id: TagId,
}

impl Tag {
    /// Tag for the whole collection of `ty`.
    pub fn list(ty: TagType) -> Self {
        Self {
            ty,
            id: TagId::List,
        }
    }

    /// Tag for one resource of `ty`.
    pub fn id(ty: TagType, id: impl Into<ResourceId>) -> Self {
        Self {
            ty,
            id: TagId::Id(id.into()),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.id, TagId::List)
    }

    /// Whether invalidating `self` reaches an entry that provided `provided`.
    ///
    /// Invalidating `(T, id)` matches providers of `(T, id)` and `(T, LIST)`:
    /// a list is affected by any single-item change within its type.
    /// Invalidating `(T, LIST)` matches providers of `(T, LIST)` and of any
    /// `(T, id)`: the sentinel addresses the whole domain.
    pub fn invalidates(&self, provided: &Tag) -> bool {
        if self.ty != provided.ty {
            return false;
        }
        match (&self.id, &provided.id) {
            (TagId::List, _) => true,
            (_, TagId::List) => true,
            (TagId::Id(a), TagId::Id(b)) => a == b,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            TagId::List => write!(f, "{}:LIST", self.ty),
            TagId::Id(id) => write!(f, "{}:{}", self.ty, id),
        }
    }
}
