//! Service listing endpoints.
//!
//! Services have no detail route on the backend; per-id tags still flow from
//! the list settlement, so updating one service refreshes the cached list.

use serde_json::Value;
use specchio_api_types::{ById, ServiceDraft, ServiceRecord, WithId};

use super::{list_tags, to_body, unwrap_envelope};
use crate::endpoint::{Mutation, Query};
use crate::error::CacheError;
use crate::registry::RegistryBuilder;
use crate::store::{MutationOutcome, ResourceCache};
use crate::subscription::QuerySubscription;
use crate::tag::{Tag, TagType};
use crate::transport::RequestDescriptor;

pub const GET_ALL_SERVICES: &str = "getAllServices";
pub const CREATE_SERVICE: &str = "createService";
pub const UPDATE_SERVICE: &str = "updateService";
pub const DELETE_SERVICE: &str = "deleteService";

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .query(
            Query::<(), Vec<ServiceRecord>>::new(GET_ALL_SERVICES, |_| {
                Ok(RequestDescriptor::get("/service/getallservices"))
            })
            .transform(unwrap_envelope)
            .provides(|services, _| {
                list_tags(TagType::Service, services.iter().map(|service| service.id))
            }),
        )
        .mutation(
            Mutation::<ServiceDraft, ServiceRecord>::new(CREATE_SERVICE, |draft| {
                Ok(RequestDescriptor::post("/service/addservice").body(to_body(draft)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, _| vec![Tag::list(TagType::Service)]),
        )
        .mutation(
            Mutation::<WithId<ServiceDraft>, ServiceRecord>::new(UPDATE_SERVICE, |update| {
                Ok(
                    RequestDescriptor::put(format!("/service/updateservice/{}", update.id))
                        .body(to_body(&update.data)?),
                )
            })
            .transform(unwrap_envelope)
            .invalidates(|_, update| vec![Tag::id(TagType::Service, update.id)]),
        )
        .mutation(
            Mutation::<ById, Value>::new(DELETE_SERVICE, |args| {
                Ok(RequestDescriptor::delete(format!(
                    "/service/deleteservice/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, args| vec![Tag::id(TagType::Service, args.id)]),
        )
}

pub fn all_services(cache: &ResourceCache) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_SERVICES, &())
}

pub async fn create(
    cache: &ResourceCache,
    draft: &ServiceDraft,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(CREATE_SERVICE, draft).await
}

pub async fn update(
    cache: &ResourceCache,
    update: &WithId<ServiceDraft>,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(UPDATE_SERVICE, update).await
}

pub async fn delete(cache: &ResourceCache, id: i64) -> Result<MutationOutcome, CacheError> {
    cache.mutate(DELETE_SERVICE, &ById::new(id)).await
}
