//! Project endpoints.
//!
//! Project lists are filterable by city and status. Every filtered list
//! provides the same `(Project, LIST)` tag, so creating a project refreshes
//! each cached filter variant, not just the unfiltered one.

use serde_json::Value;
use specchio_api_types::{ById, ProjectDraft, ProjectFilter, ProjectRecord, WithId};

use super::{list_tags, to_body, unwrap_envelope};
use crate::endpoint::{Mutation, Query};
use crate::error::CacheError;
use crate::registry::RegistryBuilder;
use crate::store::{MutationOutcome, ResourceCache};
use crate::subscription::QuerySubscription;
use crate::tag::{Tag, TagType};
use crate::transport::RequestDescriptor;

pub const GET_ALL_PROJECTS: &str = "getAllProjects";
pub const GET_PROJECT_BY_ID: &str = "getProjectById";
pub const CREATE_PROJECT: &str = "createProject";
pub const UPDATE_PROJECT: &str = "updateProject";
pub const DELETE_PROJECT: &str = "deleteProject";

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .query(
            Query::<ProjectFilter, Vec<ProjectRecord>>::new(GET_ALL_PROJECTS, |filter| {
                let mut request = RequestDescriptor::get("/project/getallprojects");
                if let Some(city_id) = filter.city_id {
                    request = request.param("city_id", city_id.to_string());
                }
                if let Some(status) = filter.status {
                    request = request.param("status", status.as_str());
                }
                Ok(request)
            })
            .transform(unwrap_envelope)
            .provides(|projects, _| {
                list_tags(TagType::Project, projects.iter().map(|project| project.id))
            }),
        )
        .query(
            Query::<ById, ProjectRecord>::new(GET_PROJECT_BY_ID, |args| {
                Ok(RequestDescriptor::get(format!(
                    "/project/getproject/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .provides(|_, args| vec![Tag::id(TagType::Project, args.id)]),
        )
        .mutation(
            Mutation::<ProjectDraft, ProjectRecord>::new(CREATE_PROJECT, |draft| {
                Ok(RequestDescriptor::post("/project/addproject").body(to_body(draft)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, _| vec![Tag::list(TagType::Project)]),
        )
        .mutation(
            Mutation::<WithId<ProjectDraft>, ProjectRecord>::new(UPDATE_PROJECT, |update| {
                Ok(
                    RequestDescriptor::put(format!("/project/updateproject/{}", update.id))
                        .body(to_body(&update.data)?),
                )
            })
            .transform(unwrap_envelope)
            .invalidates(|_, update| vec![Tag::id(TagType::Project, update.id)]),
        )
        .mutation(
            Mutation::<ById, Value>::new(DELETE_PROJECT, |args| {
                Ok(RequestDescriptor::delete(format!(
                    "/project/deleteproject/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, args| vec![Tag::id(TagType::Project, args.id)]),
        )
}

/// Subscribes to the unfiltered project list.
pub fn all_projects(cache: &ResourceCache) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_PROJECTS, &ProjectFilter::default())
}

/// Subscribes to a filtered project list. Each distinct filter is its own
/// cache entry.
pub fn filtered(
    cache: &ResourceCache,
    filter: &ProjectFilter,
) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_PROJECTS, filter)
}

pub fn project_by_id(cache: &ResourceCache, id: i64) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_PROJECT_BY_ID, &ById::new(id))
}

pub async fn create(
    cache: &ResourceCache,
    draft: &ProjectDraft,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(CREATE_PROJECT, draft).await
}

pub async fn update(
    cache: &ResourceCache,
    update: &WithId<ProjectDraft>,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(UPDATE_PROJECT, update).await
}

pub async fn delete(cache: &ResourceCache, id: i64) -> Result<MutationOutcome, CacheError> {
    cache.mutate(DELETE_PROJECT, &ById::new(id)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CacheKey;
    use crate::registry::EndpointRegistry;
    use serde_json::json;
    use specchio_api_types::ProjectStatus;

    fn registry() -> EndpointRegistry {
        register(EndpointRegistry::builder()).build().unwrap()
    }

    #[test]
    fn filters_become_query_params() {
        let registry = registry();
        let registration = registry.query(GET_ALL_PROJECTS).unwrap();

        let request = (registration.build)(&json!({})).unwrap();
        assert_eq!(request.path, "/project/getallprojects");
        assert!(request.params.is_empty());

        let request =
            (registration.build)(&json!({"city_id": 4, "status": "ongoing"})).unwrap();
        assert_eq!(
            request.params,
            vec![
                ("city_id".to_string(), "4".to_string()),
                ("status".to_string(), "ongoing".to_string()),
            ]
        );
        assert_eq!(ProjectStatus::Ongoing.as_str(), "ongoing");
    }

    #[test]
    fn absent_filter_fields_share_a_cache_key() {
        let explicit = CacheKey::new(
            GET_ALL_PROJECTS,
            &serde_json::to_value(ProjectFilter::default()).unwrap(),
        );
        let empty = CacheKey::new(GET_ALL_PROJECTS, &json!({}));
        assert_eq!(explicit, empty, "serialized nulls drop out of the key");
    }

    #[test]
    fn list_settlement_tags_every_project() {
        let registry = registry();
        let registration = registry.query(GET_ALL_PROJECTS).unwrap();
        let (_, tags) = (registration.settle)(
            json!({
                "success": true,
                "data": [
                    {"id": 1, "name": "Skyline", "location": "Baner", "status": "ongoing"},
                    {"id": 2, "name": "Riverside", "location": "Kharadi", "status": "upcoming"}
                ]
            }),
            &json!({}),
        )
        .unwrap();
        assert_eq!(
            tags,
            vec![
                Tag::list(TagType::Project),
                Tag::id(TagType::Project, 1),
                Tag::id(TagType::Project, 2),
            ]
        );
    }
}
