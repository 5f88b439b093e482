//! Blog endpoints.

use serde_json::Value;
use specchio_api_types::{BlogDraft, BlogRecord, ById, WithId};

use super::{list_tags, to_body, unwrap_envelope};
use crate::endpoint::{Mutation, Query};
use crate::error::CacheError;
use crate::registry::RegistryBuilder;
use crate::store::{MutationOutcome, ResourceCache};
use crate::subscription::QuerySubscription;
use crate::tag::{Tag, TagType};
use crate::transport::RequestDescriptor;

pub const GET_ALL_BLOGS: &str = "getAllBlogs";
pub const GET_BLOG_BY_ID: &str = "getBlogById";
pub const CREATE_BLOG: &str = "createBlog";
pub const UPDATE_BLOG: &str = "updateBlog";
pub const DELETE_BLOG: &str = "deleteBlog";

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .query(
            Query::<(), Vec<BlogRecord>>::new(GET_ALL_BLOGS, |_| {
                Ok(RequestDescriptor::get("/blog/viewblogs"))
            })
            .transform(unwrap_envelope)
            .provides(|blogs, _| list_tags(TagType::Blog, blogs.iter().map(|blog| blog.id))),
        )
        .query(
            Query::<ById, BlogRecord>::new(GET_BLOG_BY_ID, |args| {
                Ok(RequestDescriptor::get(format!("/blog/getblog/{}", args.id)))
            })
            .transform(unwrap_envelope)
            .provides(|_, args| vec![Tag::id(TagType::Blog, args.id)]),
        )
        .mutation(
            Mutation::<BlogDraft, BlogRecord>::new(CREATE_BLOG, |draft| {
                Ok(RequestDescriptor::post("/blog/addblog").body(to_body(draft)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, _| vec![Tag::list(TagType::Blog)]),
        )
        .mutation(
            Mutation::<WithId<BlogDraft>, BlogRecord>::new(UPDATE_BLOG, |update| {
                Ok(RequestDescriptor::put(format!("/blog/updateblog/{}", update.id))
                    .body(to_body(&update.data)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, update| vec![Tag::id(TagType::Blog, update.id)]),
        )
        .mutation(
            Mutation::<ById, Value>::new(DELETE_BLOG, |args| {
                Ok(RequestDescriptor::delete(format!(
                    "/blog/deleteblog/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, args| vec![Tag::id(TagType::Blog, args.id)]),
        )
}

/// Subscribes to the full blog list.
pub fn all_blogs(cache: &ResourceCache) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_BLOGS, &())
}

pub fn blog_by_id(cache: &ResourceCache, id: i64) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_BLOG_BY_ID, &ById::new(id))
}

pub async fn create(
    cache: &ResourceCache,
    draft: &BlogDraft,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(CREATE_BLOG, draft).await
}

pub async fn update(
    cache: &ResourceCache,
    update: &WithId<BlogDraft>,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(UPDATE_BLOG, update).await
}

pub async fn delete(cache: &ResourceCache, id: i64) -> Result<MutationOutcome, CacheError> {
    cache.mutate(DELETE_BLOG, &ById::new(id)).await
}
