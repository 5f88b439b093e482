//! Public view of a cache entry.
//!
//! Subscribers observe entries through [`QuerySnapshot`] values published on
//! a watch channel. Data survives revalidation: a snapshot can be `Pending`
//! and still carry the previous payload (stale-while-revalidate).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;

use crate::transport::TransportError;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Uninitialized,
    Pending,
    Fulfilled,
    Rejected,
}

/// Immutable point-in-time view of one entry.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    pub data: Option<Arc<Value>>,
    pub error: Option<TransportError>,
    pub fulfilled_at: Option<OffsetDateTime>,
}

impl QuerySnapshot {
    /// First load: in flight with nothing cached yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.data.is_none()
    }

    /// Any request in flight, including background revalidation.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Fulfilled
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Rejected
    }

    /// Deserializes the cached payload into the endpoint's result type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.data {
            Some(value) => serde_json::from_value(value.as_ref().clone()).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for QuerySnapshot {
    fn default() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            fulfilled_at: None,
        }
    }
}
