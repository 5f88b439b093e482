//! Tag-driven resource cache for the estates site backend.
//!
//! specchio sits between UI state and the REST backend. Query results are
//! cached per `(endpoint, canonicalized args)` key, concurrent subscribers
//! share a single in-flight request, and mutations invalidate by declared
//! tag so every affected query refetches without manual wiring. Entries keep
//! their last good payload visible while a revalidation is in flight and are
//! evicted once they have had no subscribers for a grace period.
//!
//! # Layout
//!
//! - **key / tag**: cache identity and the invalidation vocabulary
//! - **endpoint / registry**: typed endpoint definitions, frozen at startup
//! - **entry / subscription**: snapshots and the live handles onto them
//! - **transport / http**: the wire seam and its reqwest implementation
//! - **resources**: the site's endpoint surface (projects, blogs, cities, …)
//! - **config / telemetry**: tuning knobs, tracing setup, metric names
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use specchio::resources::{self, blogs};
//! use specchio::{CacheConfig, HttpTransport, ResourceCache};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = resources::site_registry()?;
//! let transport = Arc::new(HttpTransport::new("https://api.example.com")?);
//! let cache = ResourceCache::new(registry, transport, CacheConfig::default());
//! let _reaper = cache.start_reaper();
//!
//! let mut list = blogs::all_blogs(&cache)?;
//! let snapshot = list.settled().await;
//! let blogs: Option<Vec<specchio_api_types::BlogRecord>> = snapshot.data_as()?;
//! println!("{} blogs cached", blogs.map_or(0, |blogs| blogs.len()));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod endpoint;
pub mod entry;
pub mod error;
pub mod http;
pub mod key;
pub mod registry;
pub mod resources;
pub mod subscription;
pub mod tag;
pub mod telemetry;
pub mod transport;

mod index;
mod lock;
mod store;

pub use config::CacheConfig;
pub use endpoint::{Mutation, Query};
pub use entry::{QuerySnapshot, QueryStatus};
pub use error::{CacheError, ValidationError};
pub use http::{HttpTransport, HttpTransportError};
pub use key::CacheKey;
pub use registry::{EndpointRegistry, RegistryBuilder, RegistryError};
pub use store::{CacheStats, LifecycleEvent, MutationOutcome, ResourceCache};
pub use subscription::QuerySubscription;
pub use tag::{ResourceId, Tag, TagId, TagType};
pub use transport::{Method, RequestDescriptor, Transport, TransportError};
