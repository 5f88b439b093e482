//! Cache store.
//!
//! [`ResourceCache`] owns the entry map, the tag index, and the transport.
//! Entries live in a concurrent map keyed by [`CacheKey`]; each entry carries
//! its own lock and a watch channel subscribers observe snapshots through.
//! At most one request per key is authoritative at a time: issuing a fetch
//! stamps the entry with a fresh request id, and a response arriving under any
//! other id is discarded instead of applied.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use dashmap::DashMap;
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::endpoint::SettleFn;
use crate::entry::{QuerySnapshot, QueryStatus};
use crate::error::CacheError;
use crate::index::TagIndex;
use crate::key::CacheKey;
use crate::lock::lock_guard;
use crate::registry::EndpointRegistry;
use crate::subscription::QuerySubscription;
use crate::tag::Tag;
use crate::telemetry::{
    METRIC_ACTIVE_ENTRIES, METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_MISS_TOTAL, METRIC_EVICTED_TOTAL,
    METRIC_FETCH_DEDUP_TOTAL, METRIC_FETCH_DISCARDED_TOTAL, METRIC_FETCH_MS,
    METRIC_INVALIDATED_TOTAL, METRIC_REFETCH_TOTAL,
};
use crate::transport::{RequestDescriptor, Transport, TransportError};

const WHAT: &str = "store";

// ==== Public types ====

/// Result of a settled mutation.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    data: Arc<Value>,
    invalidated: Vec<Tag>,
}

impl MutationOutcome {
    /// Response payload after the endpoint transform.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Tags the mutation invalidated, in declaration order.
    pub fn invalidated(&self) -> &[Tag] {
        &self.invalidated
    }

    /// Decodes the payload into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.as_ref().clone())
    }
}

/// Point-in-time counters describing cache occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub active_subscriptions: usize,
    pub inflight: usize,
    pub stale_entries: usize,
}

/// Application lifecycle signals that may trigger revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Focus,
    Reconnect,
}

// ==== Entry state ====

struct EntryState {
    status: QueryStatus,
    data: Option<Arc<Value>>,
    error: Option<TransportError>,
    fulfilled_at: Option<OffsetDateTime>,
    subscribers: HashSet<Uuid>,
    provided: HashSet<Tag>,
    args: Value,
    last_request: u64,
    stale: bool,
    idle_since: Option<Instant>,
    evicted: bool,
    tx: watch::Sender<QuerySnapshot>,
}

impl EntryState {
    fn new(args: Value) -> Self {
        let (tx, _rx) = watch::channel(QuerySnapshot::default());
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            fulfilled_at: None,
            subscribers: HashSet::new(),
            provided: HashSet::new(),
            args,
            last_request: 0,
            stale: false,
            idle_since: None,
            evicted: false,
            tx,
        }
    }

    fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fulfilled_at: self.fulfilled_at,
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }

    /// Marks this request id as the authoritative one. Previous data stays
    /// visible while the fetch is in flight.
    fn begin_fetch(&mut self, request_id: u64) {
        self.last_request = request_id;
        self.status = QueryStatus::Pending;
    }

    /// Rejection keeps the last good payload and its provided tags.
    fn reject(&mut self, err: TransportError) {
        self.status = QueryStatus::Rejected;
        self.error = Some(err);
        self.stale = false;
        self.publish();
    }
}

// ==== Cache core ====

struct CacheInner {
    config: CacheConfig,
    registry: EndpointRegistry,
    transport: Arc<dyn Transport>,
    entries: DashMap<CacheKey, Arc<Mutex<EntryState>>>,
    index: TagIndex,
    request_seq: AtomicU64,
}

impl CacheInner {
    fn entry_arc(&self, key: &CacheKey) -> Option<Arc<Mutex<EntryState>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn entry_or_insert(&self, key: &CacheKey, args: &Value) -> Arc<Mutex<EntryState>> {
        Arc::clone(
            self.entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(EntryState::new(args.clone()))))
                .value(),
        )
    }

    fn next_request_id(&self) -> u64 {
        self.request_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply_response(
        &self,
        key: &CacheKey,
        entry_arc: &Arc<Mutex<EntryState>>,
        request_id: u64,
        outcome: Result<Value, TransportError>,
        settle: &SettleFn,
    ) {
        let raw = match outcome {
            Ok(raw) => raw,
            Err(err) => {
                let mut entry = lock_guard(entry_arc, WHAT);
                if entry.evicted || entry.last_request != request_id {
                    drop(entry);
                    self.note_discard(key, request_id);
                    return;
                }
                entry.reject(err.clone());
                drop(entry);
                warn!(key = %key, error = %err, "Query rejected");
                return;
            }
        };

        let args = {
            let entry = lock_guard(entry_arc, WHAT);
            if entry.evicted || entry.last_request != request_id {
                drop(entry);
                self.note_discard(key, request_id);
                return;
            }
            entry.args.clone()
        };

        // Transforms and tag rules run without the entry lock held.
        let settled = settle(raw, &args);

        let mut entry = lock_guard(entry_arc, WHAT);
        if entry.evicted || entry.last_request != request_id {
            drop(entry);
            self.note_discard(key, request_id);
            return;
        }
        match settled {
            Ok((data, tags)) => {
                let provided: HashSet<Tag> = tags.into_iter().collect();
                let previous = std::mem::replace(&mut entry.provided, provided.clone());
                entry.status = QueryStatus::Fulfilled;
                entry.data = Some(Arc::new(data));
                entry.error = None;
                entry.stale = false;
                entry.fulfilled_at = Some(OffsetDateTime::now_utc());
                entry.publish();
                drop(entry);
                if previous != provided {
                    self.index.unregister(key, &previous);
                    self.index.register(key, &provided);
                }
                debug!(key = %key, request_id, tags = provided.len(), "Entry fulfilled");
            }
            Err(err) => {
                entry.reject(err.clone());
                drop(entry);
                warn!(key = %key, error = %err, "Query rejected");
            }
        }
    }

    fn note_discard(&self, key: &CacheKey, request_id: u64) {
        counter!(METRIC_FETCH_DISCARDED_TOTAL).increment(1);
        debug!(key = %key, request_id, "Superseded response discarded");
    }

    fn sweep_idle(&self) -> usize {
        let keep = self.config.keep_unused();
        let candidates: Vec<(CacheKey, Arc<Mutex<EntryState>>)> = self
            .entries
            .iter()
            .map(|item| (item.key().clone(), Arc::clone(item.value())))
            .collect();

        let mut evicted = 0usize;
        for (key, entry_arc) in candidates {
            let provided = {
                let mut entry = lock_guard(&entry_arc, WHAT);
                if entry.evicted
                    || !entry.subscribers.is_empty()
                    || entry.status == QueryStatus::Pending
                {
                    continue;
                }
                let Some(idle_since) = entry.idle_since else {
                    continue;
                };
                if idle_since.elapsed() < keep {
                    continue;
                }
                entry.evicted = true;
                std::mem::take(&mut entry.provided)
            };
            self.entries
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &entry_arc));
            self.index.unregister(&key, &provided);
            evicted += 1;
            debug!(key = %key, "Idle entry evicted");
        }

        if evicted > 0 {
            counter!(METRIC_EVICTED_TOTAL).increment(evicted as u64);
            gauge!(METRIC_ACTIVE_ENTRIES).set(self.entries.len() as f64);
            debug!(evicted, remaining = self.entries.len(), "Idle sweep finished");
        }
        evicted
    }

    fn stats(&self) -> CacheStats {
        let entries: Vec<Arc<Mutex<EntryState>>> = self
            .entries
            .iter()
            .map(|item| Arc::clone(item.value()))
            .collect();
        let mut stats = CacheStats {
            entries: entries.len(),
            ..CacheStats::default()
        };
        for entry_arc in entries {
            let entry = lock_guard(&entry_arc, WHAT);
            stats.active_subscriptions += entry.subscribers.len();
            if entry.status == QueryStatus::Pending {
                stats.inflight += 1;
            }
            if entry.stale {
                stats.stale_entries += 1;
            }
        }
        stats
    }
}

// ==== Public handle ====

/// Shared handle over the cache. Cheap to clone; all clones observe the same
/// entries.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<CacheInner>,
}

impl ResourceCache {
    pub fn new(
        registry: EndpointRegistry,
        transport: Arc<dyn Transport>,
        config: CacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                config,
                registry,
                transport,
                entries: DashMap::new(),
                index: TagIndex::new(),
                request_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Subscribes to a query endpoint, fetching on a cache miss and joining
    /// the in-flight request on a concurrent one.
    ///
    /// Arguments are validated through the endpoint's request builder on every
    /// call, including calls served entirely from cache. Must be called from
    /// within a Tokio runtime.
    pub fn subscribe<A>(&self, endpoint: &str, args: &A) -> Result<QuerySubscription, CacheError>
    where
        A: Serialize + ?Sized,
    {
        let args = serde_json::to_value(args).map_err(CacheError::args)?;
        self.subscribe_value(endpoint, args)
    }

    fn subscribe_value(&self, endpoint: &str, args: Value) -> Result<QuerySubscription, CacheError> {
        let registration = self.inner.registry.query(endpoint)?;
        let request = (registration.build)(&args)?;
        let key = CacheKey::new(registration.name, &args);
        let subscriber_id = Uuid::new_v4();

        loop {
            let entry_arc = self.inner.entry_or_insert(&key, &args);
            let mut entry = lock_guard(&entry_arc, WHAT);
            if entry.evicted {
                // Lost a race against the sweeper; retry on a fresh entry.
                drop(entry);
                self.inner
                    .entries
                    .remove_if(&key, |_, current| Arc::ptr_eq(current, &entry_arc));
                continue;
            }
            entry.subscribers.insert(subscriber_id);
            entry.idle_since = None;

            let status = entry.status;
            match status {
                QueryStatus::Uninitialized => counter!(METRIC_CACHE_MISS_TOTAL).increment(1),
                QueryStatus::Pending => counter!(METRIC_FETCH_DEDUP_TOTAL).increment(1),
                QueryStatus::Fulfilled | QueryStatus::Rejected => {
                    counter!(METRIC_CACHE_HIT_TOTAL).increment(1)
                }
            }
            let needs_fetch = match status {
                QueryStatus::Uninitialized | QueryStatus::Rejected => true,
                QueryStatus::Pending => false,
                QueryStatus::Fulfilled => entry.stale || self.inner.config.refetch_on_subscribe,
            };

            let rx = entry.tx.subscribe();
            if !needs_fetch {
                drop(entry);
                debug!(key = %key, ?status, "Subscription joined cached entry");
                return Ok(QuerySubscription::new(self.clone(), key, subscriber_id, rx));
            }

            let request_id = self.inner.next_request_id();
            entry.begin_fetch(request_id);
            entry.publish();
            drop(entry);
            if status == QueryStatus::Uninitialized {
                gauge!(METRIC_ACTIVE_ENTRIES).set(self.inner.entries.len() as f64);
            }
            debug!(key = %key, request_id, ?status, "Query fetch issued");
            self.spawn_fetch(
                key.clone(),
                entry_arc,
                request_id,
                request,
                Arc::clone(&registration.settle),
                "query",
            );
            return Ok(QuerySubscription::new(self.clone(), key, subscriber_id, rx));
        }
    }

    /// Executes a mutation endpoint and applies its invalidations before
    /// returning. Transport and settle failures invalidate nothing.
    pub async fn mutate<A>(&self, endpoint: &str, args: &A) -> Result<MutationOutcome, CacheError>
    where
        A: Serialize + ?Sized,
    {
        let args = serde_json::to_value(args).map_err(CacheError::args)?;
        self.mutate_value(endpoint, args).await
    }

    #[instrument(skip(self, args))]
    async fn mutate_value(&self, endpoint: &str, args: Value) -> Result<MutationOutcome, CacheError> {
        let registration = self.inner.registry.mutation(endpoint)?;
        let request = (registration.build)(&args)?;
        debug!(endpoint, "Mutation issued");
        let started = Instant::now();
        let outcome = self.inner.transport.execute(request).await;
        histogram!(METRIC_FETCH_MS, "kind" => "mutation")
            .record(started.elapsed().as_secs_f64() * 1000.0);
        let raw = outcome?;
        let (data, tags) = (registration.settle)(raw, &args)?;
        self.apply_invalidation(&tags, endpoint);
        Ok(MutationOutcome {
            data: Arc::new(data),
            invalidated: tags,
        })
    }

    /// Invalidates entries matching the given tags, as if a mutation had
    /// declared them. Returns the number of affected entries.
    pub fn invalidate_tags(&self, tags: impl IntoIterator<Item = Tag>) -> usize {
        let tags: Vec<Tag> = tags.into_iter().collect();
        let (refetched, stale_only) = self.apply_invalidation(&tags, "manual");
        refetched + stale_only
    }

    fn apply_invalidation(&self, tags: &[Tag], source: &str) -> (usize, usize) {
        if tags.is_empty() {
            return (0, 0);
        }
        let affected = self.inner.index.affected_by(tags.iter());
        if affected.is_empty() {
            debug!(source, tags = tags.len(), "Invalidation matched no entries");
            return (0, 0);
        }
        let mut refetched = 0usize;
        let mut stale_only = 0usize;
        for key in affected {
            let Some(entry_arc) = self.inner.entry_arc(&key) else {
                continue;
            };
            let active = {
                let mut entry = lock_guard(&entry_arc, WHAT);
                if entry.evicted {
                    continue;
                }
                entry.stale = true;
                !entry.subscribers.is_empty()
            };
            counter!(METRIC_INVALIDATED_TOTAL).increment(1);
            if active {
                self.refetch_key(&key, "invalidation");
                refetched += 1;
            } else {
                stale_only += 1;
            }
        }
        info!(source, tags = tags.len(), refetched, stale_only, "Invalidation applied");
        (refetched, stale_only)
    }

    /// Refetches every entry that currently has subscribers.
    pub fn revalidate_active(&self) -> usize {
        self.revalidate_with_reason("manual")
    }

    /// Applies a lifecycle signal, refetching active entries when the
    /// corresponding config flag is set.
    pub fn handle_lifecycle(&self, event: LifecycleEvent) -> usize {
        let (enabled, reason) = match event {
            LifecycleEvent::Focus => (self.inner.config.refetch_on_focus, "focus"),
            LifecycleEvent::Reconnect => (self.inner.config.refetch_on_reconnect, "reconnect"),
        };
        if !enabled {
            debug!(?event, "Lifecycle revalidation disabled");
            return 0;
        }
        self.revalidate_with_reason(reason)
    }

    fn revalidate_with_reason(&self, reason: &'static str) -> usize {
        let candidates: Vec<(CacheKey, Arc<Mutex<EntryState>>)> = self
            .inner
            .entries
            .iter()
            .map(|item| (item.key().clone(), Arc::clone(item.value())))
            .collect();
        let mut refetched = 0usize;
        for (key, entry_arc) in candidates {
            let active = {
                let entry = lock_guard(&entry_arc, WHAT);
                !entry.evicted && !entry.subscribers.is_empty()
            };
            if active {
                self.refetch_key(&key, reason);
                refetched += 1;
            }
        }
        if refetched > 0 {
            info!(reason, refetched, "Active entries revalidated");
        }
        refetched
    }

    /// Evicts entries whose grace period has expired. Returns the number of
    /// evicted entries.
    pub fn sweep_idle(&self) -> usize {
        self.inner.sweep_idle()
    }

    /// Spawns the periodic sweeper. The task stops once the cache is dropped;
    /// it holds no strong reference.
    pub fn start_reaper(&self) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        let interval = self.inner.config.sweep_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.sweep_idle();
            }
            debug!("Cache reaper stopped");
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    /// Number of live cache entries.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub(crate) fn release(&self, key: &CacheKey, subscriber_id: Uuid) {
        let Some(entry_arc) = self.inner.entry_arc(key) else {
            return;
        };
        let mut entry = lock_guard(&entry_arc, WHAT);
        if !entry.subscribers.remove(&subscriber_id) {
            return;
        }
        if entry.subscribers.is_empty() && !entry.evicted {
            entry.idle_since = Some(Instant::now());
            debug!(key = %key, "Last subscriber released; grace period started");
        }
    }

    pub(crate) fn refetch_key(&self, key: &CacheKey, reason: &'static str) {
        let Some(entry_arc) = self.inner.entry_arc(key) else {
            return;
        };
        let registration = match self.inner.registry.query(key.endpoint()) {
            Ok(registration) => registration,
            Err(err) => {
                warn!(key = %key, error = %err, "Refetch skipped: endpoint lookup failed");
                return;
            }
        };
        let args = {
            let entry = lock_guard(&entry_arc, WHAT);
            if entry.evicted {
                return;
            }
            entry.args.clone()
        };
        let request = match (registration.build)(&args) {
            Ok(request) => request,
            Err(err) => {
                warn!(key = %key, error = %err, "Refetch skipped: request build failed");
                return;
            }
        };
        let request_id = self.inner.next_request_id();
        {
            let mut entry = lock_guard(&entry_arc, WHAT);
            if entry.evicted {
                return;
            }
            entry.begin_fetch(request_id);
            entry.publish();
        }
        counter!(METRIC_REFETCH_TOTAL, "reason" => reason).increment(1);
        debug!(key = %key, request_id, reason, "Refetch issued");
        self.spawn_fetch(
            key.clone(),
            entry_arc,
            request_id,
            request,
            Arc::clone(&registration.settle),
            "query",
        );
    }

    fn spawn_fetch(
        &self,
        key: CacheKey,
        entry: Arc<Mutex<EntryState>>,
        request_id: u64,
        request: RequestDescriptor,
        settle: SettleFn,
        kind: &'static str,
    ) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = inner.transport.execute(request).await;
            histogram!(METRIC_FETCH_MS, "kind" => kind)
                .record(started.elapsed().as_secs_f64() * 1000.0);
            inner.apply_response(&key, &entry, request_id, outcome, &settle);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Mutation, Query};
    use crate::error::ValidationError;
    use crate::tag::TagType;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    struct ScriptedTransport {
        responses: Mutex<HashMap<String, Value>>,
        calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            })
        }

        fn respond(&self, path: &str, value: Value) {
            self.responses
                .lock()
                .unwrap()
                .insert(path.to_string(), value);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: RequestDescriptor) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.responses.lock().unwrap().get(&request.path).cloned();
            response
                .ok_or_else(|| TransportError::status(404, format!("no stub for {}", request.path)))
        }
    }

    fn city_registry() -> EndpointRegistry {
        EndpointRegistry::builder()
            .query(
                Query::<(), Vec<Value>>::new("getAllCities", |_| {
                    Ok(RequestDescriptor::get("/city/getallcities"))
                })
                .provides(|cities, _| {
                    let mut tags = vec![Tag::list(TagType::City)];
                    tags.extend(
                        cities
                            .iter()
                            .filter_map(|city| city.get("id").and_then(Value::as_i64))
                            .map(|id| Tag::id(TagType::City, id)),
                    );
                    tags
                }),
            )
            .query(
                Query::<Value, Value>::new("getCityById", |args| {
                    let id = args
                        .get("id")
                        .and_then(Value::as_i64)
                        .ok_or_else(|| ValidationError::missing("id"))?;
                    Ok(RequestDescriptor::get(format!("/city/getcity/{id}")))
                })
                .provides(|_, args| {
                    args.get("id")
                        .and_then(Value::as_i64)
                        .map(|id| vec![Tag::id(TagType::City, id)])
                        .unwrap_or_default()
                }),
            )
            .mutation(
                Mutation::<Value, Value>::new("createCity", |args| {
                    Ok(RequestDescriptor::post("/city/addcity").body(args.clone()))
                })
                .invalidates(|_, _| vec![Tag::list(TagType::City)]),
            )
            .build()
            .unwrap()
    }

    fn cache_with(transport: Arc<ScriptedTransport>, config: CacheConfig) -> ResourceCache {
        ResourceCache::new(city_registry(), transport, config)
    }

    #[tokio::test]
    async fn first_subscribe_fetches_and_caches() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([{"id": 1, "name": "Pune"}]));
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut sub = cache.subscribe("getAllCities", &()).unwrap();
        assert!(sub.snapshot().is_loading());

        let snapshot = sub.settled().await;
        assert!(snapshot.is_success());
        let cities: Vec<Value> = snapshot.data_as().unwrap().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(transport.calls(), 1);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.active_subscriptions, 1);
    }

    #[tokio::test]
    async fn second_subscribe_is_served_from_cache() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([]));
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut first = cache.subscribe("getAllCities", &()).unwrap();
        first.settled().await;

        let second = cache.subscribe("getAllCities", &()).unwrap();
        assert!(second.snapshot().is_success(), "served without a new fetch");
        assert_eq!(transport.calls(), 1);
        assert_eq!(cache.stats().active_subscriptions, 2);
    }

    #[tokio::test]
    async fn invalid_args_fail_synchronously_without_an_entry() {
        let transport = ScriptedTransport::new();
        let cache = cache_with(transport, CacheConfig::default());

        let err = cache
            .subscribe("getCityById", &json!({"name": "Pune"}))
            .unwrap_err();
        assert!(matches!(err, CacheError::Validation(_)));
        assert_eq!(cache.stats().entries, 0);
    }

    #[tokio::test]
    async fn unknown_and_mismatched_endpoints_are_rejected() {
        let transport = ScriptedTransport::new();
        let cache = cache_with(transport, CacheConfig::default());

        let err = cache.subscribe("getAllBlogs", &()).unwrap_err();
        assert_eq!(err, CacheError::unknown_endpoint("getAllBlogs"));

        let err = cache.subscribe("createCity", &json!({})).unwrap_err();
        assert_eq!(err, CacheError::kind_mismatch("createCity", "query"));

        let err = cache.mutate("getAllCities", &()).await.unwrap_err();
        assert_eq!(err, CacheError::kind_mismatch("getAllCities", "mutation"));
    }

    #[tokio::test]
    async fn rejected_entries_surface_the_error_and_retry_on_subscribe() {
        let transport = ScriptedTransport::new();
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut sub = cache.subscribe("getAllCities", &()).unwrap();
        let snapshot = sub.settled().await;
        assert!(snapshot.is_error());
        assert!(matches!(
            snapshot.error,
            Some(TransportError::Status { status: 404, .. })
        ));

        transport.respond("/city/getallcities", json!([]));
        let mut retry = cache.subscribe("getAllCities", &()).unwrap();
        let snapshot = retry.settled().await;
        assert!(snapshot.is_success());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn dropping_the_last_subscriber_arms_the_sweep() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([{"id": 1}]));
        let config = CacheConfig {
            keep_unused_for_ms: 0,
            ..CacheConfig::default()
        };
        let cache = cache_with(Arc::clone(&transport), config);

        let mut sub = cache.subscribe("getAllCities", &()).unwrap();
        sub.settled().await;
        drop(sub);

        assert_eq!(cache.sweep_idle(), 1);
        assert_eq!(cache.stats().entries, 0);
        assert_eq!(cache.inner.index.tag_count(), 0);

        let mut again = cache.subscribe("getAllCities", &()).unwrap();
        again.settled().await;
        assert_eq!(transport.calls(), 2, "evicted entry fetches from scratch");
    }

    #[tokio::test]
    async fn entries_within_grace_survive_the_sweep() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([]));
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut sub = cache.subscribe("getAllCities", &()).unwrap();
        sub.settled().await;
        drop(sub);

        assert_eq!(cache.sweep_idle(), 0);
        let again = cache.subscribe("getAllCities", &()).unwrap();
        assert!(again.snapshot().is_success(), "still served from cache");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn invalidation_refetches_active_entries_and_marks_idle_ones_stale() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([{"id": 1, "name": "Pune"}]));
        transport.respond("/city/getcity/1", json!({"id": 1, "name": "Pune"}));
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut list = cache.subscribe("getAllCities", &()).unwrap();
        list.settled().await;
        let mut detail = cache.subscribe("getCityById", &json!({"id": 1})).unwrap();
        detail.settled().await;
        detail.unsubscribe();
        assert_eq!(transport.calls(), 2);

        let affected = cache.invalidate_tags([Tag::list(TagType::City)]);
        assert_eq!(affected, 2, "list invalidation reaches every city entry");

        list.settled().await;
        assert_eq!(transport.calls(), 3, "only the subscribed entry refetched");
        assert_eq!(cache.stats().stale_entries, 1);

        let mut detail = cache.subscribe("getCityById", &json!({"id": 1})).unwrap();
        assert!(detail.snapshot().is_fetching(), "stale entry revalidates");
        detail.settled().await;
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test]
    async fn mutation_settles_invalidates_and_returns_data() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([]));
        transport.respond("/city/addcity", json!({"id": 7, "name": "Nagpur"}));
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut list = cache.subscribe("getAllCities", &()).unwrap();
        assert!(list.settled().await.is_success());

        transport.respond("/city/getallcities", json!([{"id": 7, "name": "Nagpur"}]));
        let outcome = cache
            .mutate("createCity", &json!({"name": "Nagpur"}))
            .await
            .unwrap();
        assert_eq!(outcome.invalidated(), &[Tag::list(TagType::City)]);
        assert_eq!(outcome.data()["id"], 7);

        let snapshot = list.settled().await;
        let cities: Vec<Value> = snapshot.data_as().unwrap().unwrap();
        assert_eq!(cities.len(), 1, "list refreshed by the invalidation");
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn failed_mutations_invalidate_nothing() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([]));
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut list = cache.subscribe("getAllCities", &()).unwrap();
        list.settled().await;

        let err = cache
            .mutate("createCity", &json!({"name": "Nagpur"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::Transport(TransportError::Status { status: 404, .. })
        ));
        assert!(list.snapshot().is_success(), "cached data untouched");
        assert_eq!(cache.stats().stale_entries, 0);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn manual_refetch_issues_a_new_request() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([]));
        let cache = cache_with(Arc::clone(&transport), CacheConfig::default());

        let mut sub = cache.subscribe("getAllCities", &()).unwrap();
        sub.settled().await;

        sub.refetch();
        let snapshot = sub.settled().await;
        assert!(snapshot.is_success());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn lifecycle_events_respect_config_flags() {
        let transport = ScriptedTransport::new();
        transport.respond("/city/getallcities", json!([]));
        let config = CacheConfig {
            refetch_on_focus: true,
            ..CacheConfig::default()
        };
        let cache = cache_with(Arc::clone(&transport), config);

        let mut sub = cache.subscribe("getAllCities", &()).unwrap();
        sub.settled().await;

        assert_eq!(cache.handle_lifecycle(LifecycleEvent::Reconnect), 0);
        assert_eq!(transport.calls(), 1);

        assert_eq!(cache.handle_lifecycle(LifecycleEvent::Focus), 1);
        sub.settled().await;
        assert_eq!(transport.calls(), 2);
    }
}
