//! Career posting endpoints.

use serde_json::Value;
use specchio_api_types::{ById, CareerDraft, CareerRecord, WithId};

use super::{list_tags, to_body, unwrap_envelope};
use crate::endpoint::{Mutation, Query};
use crate::error::CacheError;
use crate::registry::RegistryBuilder;
use crate::store::{MutationOutcome, ResourceCache};
use crate::subscription::QuerySubscription;
use crate::tag::{Tag, TagType};
use crate::transport::RequestDescriptor;

pub const GET_ALL_CAREERS: &str = "getAllCareers";
pub const GET_CAREER_BY_ID: &str = "getCareerById";
pub const CREATE_CAREER: &str = "createCareer";
pub const UPDATE_CAREER: &str = "updateCareer";
pub const DELETE_CAREER: &str = "deleteCareer";

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .query(
            Query::<(), Vec<CareerRecord>>::new(GET_ALL_CAREERS, |_| {
                Ok(RequestDescriptor::get("/career/getallcareers"))
            })
            .transform(unwrap_envelope)
            .provides(|careers, _| {
                list_tags(TagType::Career, careers.iter().map(|career| career.id))
            }),
        )
        .query(
            Query::<ById, CareerRecord>::new(GET_CAREER_BY_ID, |args| {
                Ok(RequestDescriptor::get(format!(
                    "/career/getcareer/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .provides(|_, args| vec![Tag::id(TagType::Career, args.id)]),
        )
        .mutation(
            Mutation::<CareerDraft, CareerRecord>::new(CREATE_CAREER, |draft| {
                Ok(RequestDescriptor::post("/career/addcareer").body(to_body(draft)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, _| vec![Tag::list(TagType::Career)]),
        )
        .mutation(
            Mutation::<WithId<CareerDraft>, CareerRecord>::new(UPDATE_CAREER, |update| {
                Ok(
                    RequestDescriptor::put(format!("/career/updatecareer/{}", update.id))
                        .body(to_body(&update.data)?),
                )
            })
            .transform(unwrap_envelope)
            .invalidates(|_, update| vec![Tag::id(TagType::Career, update.id)]),
        )
        .mutation(
            Mutation::<ById, Value>::new(DELETE_CAREER, |args| {
                Ok(RequestDescriptor::delete(format!(
                    "/career/deletecareer/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, args| vec![Tag::id(TagType::Career, args.id)]),
        )
}

/// Subscribes to every career posting, including inactive ones.
pub fn all_careers(cache: &ResourceCache) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_CAREERS, &())
}

pub fn career_by_id(cache: &ResourceCache, id: i64) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_CAREER_BY_ID, &ById::new(id))
}

pub async fn create(
    cache: &ResourceCache,
    draft: &CareerDraft,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(CREATE_CAREER, draft).await
}

pub async fn update(
    cache: &ResourceCache,
    update: &WithId<CareerDraft>,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(UPDATE_CAREER, update).await
}

pub async fn delete(cache: &ResourceCache, id: i64) -> Result<MutationOutcome, CacheError> {
    cache.mutate(DELETE_CAREER, &ById::new(id)).await
}
