//! City endpoints.

use serde_json::Value;
use specchio_api_types::{ById, CityDraft, CityRecord, WithId};

use super::{list_tags, to_body, unwrap_envelope};
use crate::endpoint::{Mutation, Query};
use crate::error::CacheError;
use crate::registry::RegistryBuilder;
use crate::store::{MutationOutcome, ResourceCache};
use crate::subscription::QuerySubscription;
use crate::tag::{Tag, TagType};
use crate::transport::RequestDescriptor;

pub const GET_ALL_CITIES: &str = "getAllCities";
pub const GET_CITY_BY_ID: &str = "getCityById";
pub const CREATE_CITY: &str = "createCity";
pub const UPDATE_CITY: &str = "updateCity";
pub const DELETE_CITY: &str = "deleteCity";

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .query(
            Query::<(), Vec<CityRecord>>::new(GET_ALL_CITIES, |_| {
                Ok(RequestDescriptor::get("/city/getallcities"))
            })
            .transform(unwrap_envelope)
            .provides(|cities, _| list_tags(TagType::City, cities.iter().map(|city| city.id))),
        )
        .query(
            Query::<ById, CityRecord>::new(GET_CITY_BY_ID, |args| {
                Ok(RequestDescriptor::get(format!("/city/getcity/{}", args.id)))
            })
            .transform(unwrap_envelope)
            .provides(|_, args| vec![Tag::id(TagType::City, args.id)]),
        )
        .mutation(
            Mutation::<CityDraft, CityRecord>::new(CREATE_CITY, |draft| {
                Ok(RequestDescriptor::post("/city/addcity").body(to_body(draft)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, _| vec![Tag::list(TagType::City)]),
        )
        .mutation(
            Mutation::<WithId<CityDraft>, CityRecord>::new(UPDATE_CITY, |update| {
                Ok(RequestDescriptor::put(format!("/city/updatecity/{}", update.id))
                    .body(to_body(&update.data)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, update| vec![Tag::id(TagType::City, update.id)]),
        )
        .mutation(
            Mutation::<ById, Value>::new(DELETE_CITY, |args| {
                Ok(RequestDescriptor::delete(format!(
                    "/city/deletecity/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, args| vec![Tag::id(TagType::City, args.id)]),
        )
}

pub fn all_cities(cache: &ResourceCache) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_CITIES, &())
}

pub fn city_by_id(cache: &ResourceCache, id: i64) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_CITY_BY_ID, &ById::new(id))
}

pub async fn create(
    cache: &ResourceCache,
    draft: &CityDraft,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(CREATE_CITY, draft).await
}

pub async fn update(
    cache: &ResourceCache,
    update: &WithId<CityDraft>,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(UPDATE_CITY, update).await
}

pub async fn delete(cache: &ResourceCache, id: i64) -> Result<MutationOutcome, CacheError> {
    cache.mutate(DELETE_CITY, &ById::new(id)).await
}
