//! Per-resource endpoint modules.
//!
//! Each module declares the queries and mutations for one backend resource
//! and the tag rules that keep them coherent: list queries provide the list
//! tag plus one tag per element, detail queries provide the id tag, creates
//! invalidate the list tag, updates and deletes invalidate the id tag.
//! [`site_registry`] assembles the full data layer.

use serde::Serialize;
use serde_json::Value;
use specchio_api_types::Envelope;

use crate::error::ValidationError;
use crate::registry::{EndpointRegistry, RegistryBuilder, RegistryError};
use crate::tag::{Tag, TagType};
use crate::transport::TransportError;

pub mod blogs;
pub mod careers;
pub mod cities;
pub mod events;
pub mod leads;
pub mod projects;
pub mod services;

/// The complete endpoint registry for the site backend.
pub fn site_registry() -> Result<EndpointRegistry, RegistryError> {
    let builder = EndpointRegistry::builder();
    let builder = projects::register(builder);
    let builder = blogs::register(builder);
    let builder = careers::register(builder);
    let builder = events::register(builder);
    let builder = cities::register(builder);
    let builder = services::register(builder);
    let builder = leads::register(builder);
    builder.build()
}

/// Unwraps the backend's `{ success, message, data }` envelope. A body with
/// `success: false` rejects the request with the backend-supplied message.
pub(crate) fn unwrap_envelope(raw: Value) -> Result<Value, TransportError> {
    let envelope: Envelope<Value> = serde_json::from_value(raw)
        .map_err(|err| TransportError::decode(format!("response envelope: {err}")))?;
    envelope.into_result().map_err(TransportError::rejected)
}

pub(crate) fn to_body<T: Serialize>(value: &T) -> Result<Value, ValidationError> {
    serde_json::to_value(value)
        .map_err(|err| ValidationError::new(format!("unserializable request body: {err}")))
}

/// List tag plus one id tag per element.
pub(crate) fn list_tags(ty: TagType, ids: impl IntoIterator<Item = i64>) -> Vec<Tag> {
    let mut tags = vec![Tag::list(ty)];
    tags.extend(ids.into_iter().map(|id| Tag::id(ty, id)));
    tags
}
