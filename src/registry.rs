//! Endpoint registry.
//!
//! Accumulates endpoint definitions at startup and freezes them before first
//! use. The built registry is immutable; the cache holds it for the life of
//! the process.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::endpoint::{Mutation, MutationRegistration, Query, QueryRegistration};
use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("endpoint name `{name}` is registered twice")]
    DuplicateEndpoint { name: &'static str },
}

enum Registration {
    Query(QueryRegistration),
    Mutation(MutationRegistration),
}

impl Registration {
    fn name(&self) -> &'static str {
        match self {
            Registration::Query(query) => query.name,
            Registration::Mutation(mutation) => mutation.name,
        }
    }

    fn tagged(&self) -> bool {
        match self {
            Registration::Query(query) => query.tagged,
            Registration::Mutation(mutation) => mutation.tagged,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Registration::Query(_) => "query",
            Registration::Mutation(_) => "mutation",
        }
    }
}

/// Accumulates definitions before the freeze.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Registration>,
}

impl RegistryBuilder {
    pub fn query<A, T>(mut self, query: Query<A, T>) -> Self
    where
        A: Serialize + DeserializeOwned + 'static,
        T: DeserializeOwned + 'static,
    {
        self.entries
            .push(Registration::Query(query.into_registration()));
        self
    }

    pub fn mutation<A, T>(mut self, mutation: Mutation<A, T>) -> Self
    where
        A: Serialize + DeserializeOwned + 'static,
        T: DeserializeOwned + 'static,
    {
        self.entries
            .push(Registration::Mutation(mutation.into_registration()));
        self
    }

    /// Freezes the registry. Fails on duplicate names across both kinds and
    /// warns for every endpoint registered without a tag rule, since such an
    /// endpoint silently opts out of cache coherence.
    pub fn build(self) -> Result<EndpointRegistry, RegistryError> {
        let mut endpoints = HashMap::with_capacity(self.entries.len());
        for registration in self.entries {
            let name = registration.name();
            if !registration.tagged() {
                warn!(
                    endpoint = name,
                    kind = registration.kind(),
                    "Endpoint registered without a tag rule; it will not participate in invalidation"
                );
            }
            if endpoints.insert(name, registration).is_some() {
                return Err(RegistryError::DuplicateEndpoint { name });
            }
        }
        Ok(EndpointRegistry { endpoints })
    }
}

/// Frozen endpoint table.
pub struct EndpointRegistry {
    endpoints: HashMap<&'static str, Registration>,
}

impl EndpointRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    pub(crate) fn query(&self, name: &str) -> Result<&QueryRegistration, CacheError> {
        match self.endpoints.get(name) {
            Some(Registration::Query(query)) => Ok(query),
            Some(Registration::Mutation(_)) => Err(CacheError::kind_mismatch(name, "query")),
            None => Err(CacheError::unknown_endpoint(name)),
        }
    }

    pub(crate) fn mutation(&self, name: &str) -> Result<&MutationRegistration, CacheError> {
        match self.endpoints.get(name) {
            Some(Registration::Mutation(mutation)) => Ok(mutation),
            Some(Registration::Query(_)) => Err(CacheError::kind_mismatch(name, "mutation")),
            None => Err(CacheError::unknown_endpoint(name)),
        }
    }
}
