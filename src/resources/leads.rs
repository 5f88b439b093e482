//! Lead endpoints.
//!
//! Leads come in through the public contact form and are read back in the
//! admin panel, so the submit mutation invalidates the admin list.

use serde_json::Value;
use specchio_api_types::{ById, LeadDraft, LeadRecord};

use super::{list_tags, to_body, unwrap_envelope};
use crate::endpoint::{Mutation, Query};
use crate::error::CacheError;
use crate::registry::RegistryBuilder;
use crate::store::{MutationOutcome, ResourceCache};
use crate::subscription::QuerySubscription;
use crate::tag::{Tag, TagType};
use crate::transport::RequestDescriptor;

pub const GET_ALL_LEADS: &str = "getAllLeads";
pub const CREATE_LEAD: &str = "createLead";
pub const DELETE_LEAD: &str = "deleteLead";

pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .query(
            Query::<(), Vec<LeadRecord>>::new(GET_ALL_LEADS, |_| {
                Ok(RequestDescriptor::get("/lead/getallleads"))
            })
            .transform(unwrap_envelope)
            .provides(|leads, _| list_tags(TagType::Lead, leads.iter().map(|lead| lead.id))),
        )
        .mutation(
            Mutation::<LeadDraft, LeadRecord>::new(CREATE_LEAD, |draft| {
                Ok(RequestDescriptor::post("/lead/addlead").body(to_body(draft)?))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, _| vec![Tag::list(TagType::Lead)]),
        )
        .mutation(
            Mutation::<ById, Value>::new(DELETE_LEAD, |args| {
                Ok(RequestDescriptor::delete(format!(
                    "/lead/deletelead/{}",
                    args.id
                )))
            })
            .transform(unwrap_envelope)
            .invalidates(|_, args| vec![Tag::id(TagType::Lead, args.id)]),
        )
}

pub fn all_leads(cache: &ResourceCache) -> Result<QuerySubscription, CacheError> {
    cache.subscribe(GET_ALL_LEADS, &())
}

/// Submits a contact form lead.
pub async fn submit(
    cache: &ResourceCache,
    draft: &LeadDraft,
) -> Result<MutationOutcome, CacheError> {
    cache.mutate(CREATE_LEAD, draft).await
}

pub async fn delete(cache: &ResourceCache, id: i64) -> Result<MutationOutcome, CacheError> {
    cache.mutate(DELETE_LEAD, &ById::new(id)).await
}
