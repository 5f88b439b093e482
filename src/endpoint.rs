//! Endpoint definitions.
//!
//! Every resource module declares its endpoints through the typed [`Query`]
//! and [`Mutation`] builders: a unique name, a request builder, a tag rule,
//! and optionally a response transform. The builders erase the types into
//! `serde_json::Value` closures the cache core can store uniformly.
//!
//! A successful fetch settles through transform, then a decode against the
//! declared result type, then the tag rule. A payload that fails the decode
//! rejects the entry instead of silently caching data the tag rule never saw.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ValidationError;
use crate::tag::Tag;
use crate::transport::{RequestDescriptor, TransportError};

pub(crate) type BuildFn =
    Arc<dyn Fn(&Value) -> Result<RequestDescriptor, ValidationError> + Send + Sync>;
pub(crate) type SettleFn =
    Arc<dyn Fn(Value, &Value) -> Result<(Value, Vec<Tag>), TransportError> + Send + Sync>;

type TypedBuild<A> = Box<dyn Fn(&A) -> Result<RequestDescriptor, ValidationError> + Send + Sync>;
type TypedTransform = Box<dyn Fn(Value) -> Result<Value, TransportError> + Send + Sync>;
type TypedTags<A, T> = Box<dyn Fn(&T, &A) -> Vec<Tag> + Send + Sync>;

/// Declarative definition of a cached read endpoint.
pub struct Query<A, T> {
    name: &'static str,
    build: TypedBuild<A>,
    transform: Option<TypedTransform>,
    provides: Option<TypedTags<A, T>>,
    _marker: PhantomData<fn(&A) -> T>,
}

impl<A, T> Query<A, T>
where
    A: Serialize + DeserializeOwned + 'static,
    T: DeserializeOwned + 'static,
{
    pub fn new(
        name: &'static str,
        build: impl Fn(&A) -> Result<RequestDescriptor, ValidationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            build: Box::new(build),
            transform: None,
            provides: None,
            _marker: PhantomData,
        }
    }

    /// Applied to the raw payload before caching and before the result decode.
    pub fn transform(
        mut self,
        transform: impl Fn(Value) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Tags this query provides, computed from the decoded result. A query
    /// without a provides rule is never refetched by invalidation.
    pub fn provides(mut self, provides: impl Fn(&T, &A) -> Vec<Tag> + Send + Sync + 'static) -> Self {
        self.provides = Some(Box::new(provides));
        self
    }

    pub(crate) fn into_registration(self) -> QueryRegistration {
        let tagged = self.provides.is_some();
        QueryRegistration {
            name: self.name,
            build: erase_build(self.name, self.build),
            settle: erase_settle(self.name, self.transform, self.provides),
            tagged,
        }
    }
}

/// Declarative definition of a write endpoint.
pub struct Mutation<A, T> {
    name: &'static str,
    build: TypedBuild<A>,
    transform: Option<TypedTransform>,
    invalidates: Option<TypedTags<A, T>>,
    _marker: PhantomData<fn(&A) -> T>,
}

impl<A, T> Mutation<A, T>
where
    A: Serialize + DeserializeOwned + 'static,
    T: DeserializeOwned + 'static,
{
    pub fn new(
        name: &'static str,
        build: impl Fn(&A) -> Result<RequestDescriptor, ValidationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            build: Box::new(build),
            transform: None,
            invalidates: None,
            _marker: PhantomData,
        }
    }

    /// Applied to the raw payload before the result decode.
    pub fn transform(
        mut self,
        transform: impl Fn(Value) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Tags this mutation invalidates on success. A mutation without an
    /// invalidates rule leaves every cached query stale after a write.
    pub fn invalidates(
        mut self,
        invalidates: impl Fn(&T, &A) -> Vec<Tag> + Send + Sync + 'static,
    ) -> Self {
        self.invalidates = Some(Box::new(invalidates));
        self
    }

    pub(crate) fn into_registration(self) -> MutationRegistration {
        let tagged = self.invalidates.is_some();
        MutationRegistration {
            name: self.name,
            build: erase_build(self.name, self.build),
            settle: erase_settle(self.name, self.transform, self.invalidates),
            tagged,
        }
    }
}

fn erase_build<A>(name: &'static str, build: TypedBuild<A>) -> BuildFn
where
    A: DeserializeOwned + 'static,
{
    Arc::new(move |args: &Value| {
        let typed: A = serde_json::from_value(args.clone()).map_err(|err| {
            ValidationError::new(format!("arguments do not match `{name}` schema: {err}"))
        })?;
        build(&typed)
    })
}

fn erase_settle<A, T>(
    name: &'static str,
    transform: Option<TypedTransform>,
    tags: Option<TypedTags<A, T>>,
) -> SettleFn
where
    A: DeserializeOwned + 'static,
    T: DeserializeOwned + 'static,
{
    Arc::new(move |raw: Value, args: &Value| {
        let data = match &transform {
            Some(transform) => transform(raw)?,
            None => raw,
        };
        let typed: T = serde_json::from_value(data.clone()).map_err(|err| {
            TransportError::decode(format!("`{name}` result does not match schema: {err}"))
        })?;
        let tags = match &tags {
            Some(tags) => {
                // The build step already checked the args shape at issue time.
                let typed_args: A = serde_json::from_value(args.clone()).map_err(|err| {
                    TransportError::decode(format!(
                        "`{name}` arguments do not match schema: {err}"
                    ))
                })?;
                tags(&typed, &typed_args)
            }
            None => Vec::new(),
        };
        Ok((data, tags))
    })
}

/// Type-erased query endpoint held by the frozen registry.
#[derive(Clone)]
pub(crate) struct QueryRegistration {
    pub name: &'static str,
    pub build: BuildFn,
    pub settle: SettleFn,
    pub tagged: bool,
}

/// Type-erased mutation endpoint held by the frozen registry.
#[derive(Clone)]
pub(crate) struct MutationRegistration {
    pub name: &'static str,
    pub build: BuildFn,
    pub settle: SettleFn,
    pub tagged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TagType;
    use serde_json::json;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct ById {
        id: i64,
    }

    fn detail_query() -> QueryRegistration {
        Query::<ById, Value>::new("getCityById", |args| {
            Ok(RequestDescriptor::get(format!("/city/getcity/{}", args.id)))
        })
        .provides(|_, args| vec![Tag::id(TagType::City, args.id)])
        .into_registration()
    }

    #[test]
    fn build_rejects_mismatched_args() {
        let registration = detail_query();
        let err = (registration.build)(&json!({"id": "three"})).unwrap_err();
        assert!(err.message.contains("getCityById"));

        let request = (registration.build)(&json!({"id": 3})).unwrap();
        assert_eq!(request.path, "/city/getcity/3");
    }

    #[test]
    fn settle_decodes_and_computes_tags() {
        let registration = detail_query();
        let (data, tags) =
            (registration.settle)(json!({"id": 3, "name": "Pune"}), &json!({"id": 3})).unwrap();
        assert_eq!(data["name"], "Pune");
        assert_eq!(tags, vec![Tag::id(TagType::City, 3)]);
    }

    #[test]
    fn settle_rejects_payloads_outside_the_schema() {
        let registration = Query::<ById, Vec<i64>>::new("getAllCities", |_| {
            Ok(RequestDescriptor::get("/city/getallcities"))
        })
        .into_registration();
        let err = (registration.settle)(json!({"not": "a list"}), &json!({"id": 1})).unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }));
    }

    #[test]
    fn transform_runs_before_the_decode() {
        let registration = Query::<ById, Vec<i64>>::new("getAllCities", |_| {
            Ok(RequestDescriptor::get("/city/getallcities"))
        })
        .transform(|raw| {
            raw.get("data")
                .cloned()
                .ok_or_else(|| TransportError::decode("missing data field"))
        })
        .into_registration();

        let (data, tags) =
            (registration.settle)(json!({"data": [1, 2]}), &json!({"id": 1})).unwrap();
        assert_eq!(data, json!([1, 2]));
        assert!(tags.is_empty(), "no provides rule registered");
    }

    #[test]
    fn untagged_registrations_are_flagged() {
        let tagged = detail_query();
        assert!(tagged.tagged);
        let untagged = Mutation::<ById, Value>::new("deleteCity", |args| {
            Ok(RequestDescriptor::delete(format!("/city/{}", args.id)))
        })
        .into_registration();
        assert!(!untagged.tagged);
    }
}
