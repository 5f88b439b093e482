//! Event endpoints.

use serde_json::Value;
use specchio_api_types::{ById, EventDraft, EventRecord, WithId};

use super::{list_tags, to_body, unwrap_envelope};
use crate::endpoint::{Mutation, Query};
use crate::error::CacheError;
use crate::registry::RegistryBuilder;
use crate::store::{MutationOutcome, ResourceCache};
use crate::subscription::QuerySubscription;
use crate::tag::{Tag, TagType};
use crate::transport::RequestDescriptor;

pub const GET_ALL_EVENTS: &str = "getAllEvents";
pub const GET_EVENT_BY_ID: &str = "getEventById";
pub const CREATE_EVENT: &str = "createEvent";
pub const UPDATE_EVENT: &str = "updateEvent";
pub const DELETE_EVENT: &str = "deleteEvent";

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .query(
            Query::<(), Vec<EventRecord>>::new(GET_ALL_EVENTS, |_| {
                Ok(RequestDescriptor::get("/event/getallevents"))
            })
            .transform(unwrap_envelope)
            .provides(|events, _| list_tags(TagType::Event, events.iter().map(|event| event.id))),
        )
        .query(
            Query::<ById, EventRecord>::new(GET_EVENT_BY_ID, |args| {
                Ok(RequestDescriptor::get(format!("/event/getevent/{}", args.id)))
            })
            .transform(unwrap_envelope)
            .provides(|_, args| vec![Tag::id(TagType::Event, args.id)]),
        )
        .mutation(
            Mutation::<EventDraft, EventRecord>::new(CREATE_EVENT, |draft| {
                Ok(RequestDescriptor::post("/event/addevent").body(to_body(draft)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, _| vec![Tag::list(TagType::Event)]),
        )
        .mutation(
            Mutation::<WithId<EventDraft>, EventRecord>::new(UPDATE_EVENT, |update| {
                Ok(RequestDescriptor::put(format!("/event/updateevent/{}", update.id))
                    .body(to_body(&update.data)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, update| vec![Tag::id(TagType::Event, update.id)]),
        )
        .mutation(
            Mutation::<ById, Value>::new(DELETE_EVENT, |args| {
                Ok(RequestDescriptor::delete(format!(
                    "/event/deleteevent/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, args| vec![Tag::id(TagType::Event, args.id)]),
        )
}

pub fn all_events(cache: &ResourceCache) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_EVENTS, &())
}

pub fn event_by_id(cache: &ResourceCache, id: i64) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_EVENT_BY_ID, &ById::new(id))
}

pub async fn create(
    cache: &ResourceCache,
    draft: &EventDraft,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(CREATE_EVENT, draft).await
}

pub async fn update(
    cache: &ResourceCache,
    update: &WithId<EventDraft>,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(UPDATE_EVENT, update).await
}

pub async fn delete(cache: &ResourceCache, id: i64) -> Result<MutationOutcome, CacheError> {
    cache.mutate(DELETE_EVENT, &ById::new(id)).await
}
