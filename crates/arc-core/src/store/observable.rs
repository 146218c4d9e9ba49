// ── Observable resource cache ──
//
// Holds one resource's state (`Loading` / `Loaded(collection)` / `Error`)
// in a `watch` channel. Loads are serialized by an async gate so at most one
// `retrieveAll` is in flight. Local writes go to the server first and touch
// the cache only on success. Every visible change bumps the version counter
// and wakes subscribers exactly once.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::ask::{Ask, AskFinished};
use crate::endpoint::ResourceEndpoint;
use crate::error::CoreError;
use crate::model::{Record, RecordCollection, ResourceName};
use crate::stream::ResourceStream;

/// Cached state of one resource.
pub type ResourceState = Ask<Arc<RecordCollection>>;

pub struct ResourceObservable {
    endpoint: ResourceEndpoint,
    state: watch::Sender<ResourceState>,
    /// Bumped on every visible change.
    version: watch::Sender<u64>,
    /// Held for the duration of a `retrieveAll`.
    load_gate: Mutex<()>,
}

impl ResourceObservable {
    pub fn new(endpoint: ResourceEndpoint) -> Self {
        let (state, _) = watch::channel(Ask::Loading);
        let (version, _) = watch::channel(0u64);
        Self {
            endpoint,
            state,
            version,
            load_gate: Mutex::new(()),
        }
    }

    pub fn name(&self) -> ResourceName {
        self.endpoint.name()
    }

    pub fn endpoint(&self) -> &ResourceEndpoint {
        &self.endpoint
    }

    /// Current state (cheap `Arc` clone).
    pub fn state(&self) -> ResourceState {
        self.state.borrow().clone()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn subscribe(&self) -> ResourceStream {
        ResourceStream::new(self.state.subscribe())
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Load once. Later calls, including concurrent ones, reuse the first outcome.
    pub async fn initialize(&self) -> ResourceState {
        let _gate = self.load_gate.lock().await;
        let current = self.state();
        if !current.is_loading() {
            debug!(resource = %self.name(), status = %current.status(), "already initialized");
            return current;
        }
        self.load().await
    }

    /// Alias for [`ResourceObservable::initialize`].
    pub async fn load_record_collection(&self) -> ResourceState {
        self.initialize().await
    }

    /// Re-fetch unconditionally, replacing the state with the new outcome.
    pub async fn force_refresh(&self) -> ResourceState {
        let _gate = self.load_gate.lock().await;
        self.load().await
    }

    async fn load(&self) -> ResourceState {
        let next = match self.endpoint.retrieve_all().await {
            AskFinished::Loaded(collection) => {
                info!(resource = %self.name(), records = collection.len(), "resource loaded");
                Ask::Loaded(Arc::new(collection))
            }
            AskFinished::Error(message) => {
                warn!(resource = %self.name(), error = %message, "resource load failed");
                Ask::Error(message)
            }
        };
        // `send_replace` updates unconditionally, even with zero receivers.
        self.state.send_replace(next.clone());
        self.bump_version();
        next
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The loaded collection, or why it is unavailable.
    pub fn get_record_collection_or_fail(&self) -> Result<Arc<RecordCollection>, CoreError> {
        let resource = self.name();
        match &*self.state.borrow() {
            Ask::Loaded(collection) => Ok(Arc::clone(collection)),
            Ask::Loading => Err(CoreError::NotLoaded { resource }),
            Ask::Error(message) => Err(CoreError::ResourceFailed {
                resource,
                message: message.clone(),
            }),
        }
    }

    pub fn get_record_or_fail(&self, id: i64) -> Result<Record, CoreError> {
        self.find_record(id)?
            .ok_or(CoreError::RecordNotAvailable {
                resource: self.name(),
                id,
            })
    }

    /// Like [`ResourceObservable::get_record_or_fail`], but a missing id is `Ok(None)`.
    pub fn find_record(&self, id: i64) -> Result<Option<Record>, CoreError> {
        Ok(self.get_record_collection_or_fail()?.get(id).cloned())
    }

    /// Wait for a running load to settle, then look up `id`.
    ///
    /// Never triggers a load itself: with no load in flight, a resource that
    /// was never initialized fails immediately.
    pub async fn depend_on_record_or_fail(&self, id: i64) -> Result<Record, CoreError> {
        // Subscribe before probing the gate so a load finishing in between is seen.
        let mut rx = self.state.subscribe();
        if rx.borrow().is_loading() && self.load_gate.try_lock().is_ok() {
            return Err(CoreError::NotLoaded {
                resource: self.name(),
            });
        }
        rx.wait_for(|state| !state.is_loading())
            .await
            .map_err(|_| CoreError::NotLoaded {
                resource: self.name(),
            })?;
        self.get_record_or_fail(id)
    }

    // ── Write-through mutations ──────────────────────────────────────

    /// Create on the server; on success cache the record the server returned.
    pub async fn create_record(&self, record: Record) -> AskFinished<Record> {
        if let Err(e) = self.ensure_loaded() {
            return AskFinished::error(e.to_string());
        }
        let outcome = self.endpoint.create(&record).await;
        match &outcome {
            AskFinished::Loaded(created) => {
                debug!(resource = %self.name(), id = created.id, "record created");
                self.put(created.clone());
            }
            AskFinished::Error(message) => {
                warn!(resource = %self.name(), error = %message, "create failed");
            }
        }
        outcome
    }

    /// Update on the server; on success cache the submitted record.
    pub async fn update_record(&self, record: Record) -> AskFinished<()> {
        if let Err(e) = self.ensure_loaded() {
            return AskFinished::error(e.to_string());
        }
        let outcome = self.endpoint.update(&record).await;
        match &outcome {
            AskFinished::Loaded(()) => {
                debug!(resource = %self.name(), id = record.id, "record updated");
                self.put(record);
            }
            AskFinished::Error(message) => {
                warn!(resource = %self.name(), id = record.id, error = %message, "update failed");
            }
        }
        outcome
    }

    /// Delete on the server; on success drop the id from the cache.
    pub async fn delete_record(&self, id: i64) -> AskFinished<()> {
        if let Err(e) = self.ensure_loaded() {
            return AskFinished::error(e.to_string());
        }
        let outcome = self.endpoint.delete(id).await;
        match &outcome {
            AskFinished::Loaded(()) => {
                debug!(resource = %self.name(), id, "record deleted");
                self.take(id);
            }
            AskFinished::Error(message) => {
                warn!(resource = %self.name(), id, error = %message, "delete failed");
            }
        }
        outcome
    }

    // ── Server notifications ─────────────────────────────────────────
    //
    // Applied to the cache only, with no RPC. Ignored unless loaded.
    // Each returns whether the cache changed.

    pub fn on_server_notification_create(&self, record: Record) -> bool {
        self.put(record)
    }

    pub fn on_server_notification_update(&self, record: Record) -> bool {
        self.put(record)
    }

    pub fn on_server_notification_delete(&self, id: i64) -> bool {
        self.take(id)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn ensure_loaded(&self) -> Result<(), CoreError> {
        self.get_record_collection_or_fail().map(|_| ())
    }

    fn put(&self, record: Record) -> bool {
        self.modify_loaded(|collection| {
            Arc::make_mut(collection).insert(record);
            true
        })
    }

    fn take(&self, id: i64) -> bool {
        self.modify_loaded(|collection| {
            if !collection.contains(id) {
                return false;
            }
            Arc::make_mut(collection).remove(id);
            true
        })
    }

    fn modify_loaded(&self, apply: impl FnOnce(&mut Arc<RecordCollection>) -> bool) -> bool {
        let changed = self.state.send_if_modified(|state| match state {
            Ask::Loaded(collection) => apply(collection),
            _ => false,
        });
        if changed {
            self.bump_version();
        } else {
            debug!(resource = %self.name(), "cache unchanged");
        }
        changed
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl std::fmt::Debug for ResourceObservable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceObservable")
            .field("name", &self.name())
            .field("status", &self.state.borrow().status())
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use arc_api::{Backend, Error, MockBackend, RpcClient, ServerResponse};
    use futures_util::future::BoxFuture;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tokio_test::{assert_pending, assert_ready};

    use super::*;

    /// Answers from a queue and counts calls.
    #[derive(Default)]
    struct Scripted {
        replies: std::sync::Mutex<VecDeque<ServerResponse>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(replies: impl IntoIterator<Item = ServerResponse>) -> Arc<Self> {
            Arc::new(Self {
                replies: std::sync::Mutex::new(replies.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Backend for Scripted {
        fn call<'a>(&'a self, _args: &'a [Value]) -> BoxFuture<'a, Result<ServerResponse, Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ServerResponse::failure("no scripted reply"));
            Box::pin(async move { Ok(reply) })
        }

        fn kind(&self) -> &'static str {
            "scripted"
        }
    }

    fn observable(backend: Arc<Scripted>) -> ResourceObservable {
        let rpc = RpcClient::from_arc(backend);
        ResourceObservable::new(ResourceEndpoint::new(ResourceName::Tutors, rpc))
    }

    fn two_tutors() -> ServerResponse {
        ServerResponse::ok(json!({
            "1": {"id": 1, "date": 10, "firstName": "Ada"},
            "2": {"id": 2, "date": 20, "firstName": "Bo"}
        }))
    }

    async fn loaded(extra: impl IntoIterator<Item = ServerResponse>) -> (Arc<Scripted>, ResourceObservable) {
        let backend = Scripted::new(std::iter::once(two_tutors()).chain(extra));
        let obs = observable(backend.clone());
        assert!(obs.initialize().await.is_loaded());
        (backend, obs)
    }

    // ── Loading ──

    #[tokio::test]
    async fn starts_loading_and_reads_fail() {
        let obs = observable(Scripted::new([]));
        assert!(obs.state().is_loading());
        assert_eq!(obs.version(), 0);

        let err = obs.get_record_or_fail(1).unwrap_err();
        assert_eq!(err.to_string(), "resource is not loaded: tutors");
    }

    #[tokio::test]
    async fn initialize_loads_once() {
        let (backend, obs) = loaded([]).await;
        assert_eq!(obs.get_record_collection_or_fail().unwrap().len(), 2);
        assert_eq!(obs.version(), 1);

        assert!(obs.initialize().await.is_loaded());
        assert_eq!(backend.calls(), 1);
        assert_eq!(obs.version(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_initialize_issues_one_request() {
        let mock = Arc::new(
            MockBackend::new(["tutors"])
                .with_latency(Duration::from_millis(200))
                .with_records("tutors", [json!({"id": 1, "date": 0})]),
        );
        let obs = ResourceObservable::new(ResourceEndpoint::new(
            ResourceName::Tutors,
            RpcClient::from_arc(mock),
        ));

        let (a, b) = tokio::join!(obs.initialize(), obs.initialize());
        assert_eq!(a, b);
        assert_eq!(obs.version(), 1);
    }

    #[tokio::test]
    async fn failed_load_poisons_reads_with_server_message() {
        let obs = observable(Scripted::new([ServerResponse::failure("sheet missing")]));
        assert_eq!(obs.initialize().await, Ask::Error("sheet missing".into()));

        let err = obs.get_record_or_fail(1).unwrap_err();
        assert_eq!(err.to_string(), "sheet missing");
        assert!(matches!(err, CoreError::ResourceFailed { .. }));
    }

    #[tokio::test]
    async fn force_refresh_replaces_state() {
        let (backend, obs) = loaded([
            ServerResponse::ok(json!({"5": {"id": 5, "date": 0}})),
            ServerResponse::failure("quota exceeded"),
        ])
        .await;

        obs.force_refresh().await;
        let ids: Vec<i64> = obs.get_record_collection_or_fail().unwrap().ids().collect();
        assert_eq!(ids, [5]);

        assert!(obs.force_refresh().await.is_error());
        assert_eq!(backend.calls(), 3);
        assert_eq!(obs.version(), 3);
    }

    // ── Reads ──

    #[tokio::test]
    async fn missing_record_is_not_available() {
        let (_, obs) = loaded([]).await;
        assert_eq!(obs.get_record_or_fail(2).unwrap().text("firstName"), "Bo");
        assert_eq!(obs.find_record(9).unwrap(), None);

        let err = obs.get_record_or_fail(9).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "record not available: tutors/#9");
    }

    #[tokio::test(start_paused = true)]
    async fn depend_on_record_waits_for_running_load() {
        let mock = Arc::new(
            MockBackend::new(["tutors"])
                .with_latency(Duration::from_millis(200))
                .with_records("tutors", [json!({"id": 1, "date": 0, "firstName": "Ada"})]),
        );
        let obs = ResourceObservable::new(ResourceEndpoint::new(
            ResourceName::Tutors,
            RpcClient::from_arc(mock),
        ));

        // The load is polled first, so it holds the gate when the lookup starts.
        let (state, record) = tokio::join!(obs.initialize(), obs.depend_on_record_or_fail(1));
        assert!(state.is_loaded());
        assert_eq!(record.unwrap().text("firstName"), "Ada");
    }

    #[tokio::test]
    async fn depend_on_record_without_initialize_fails_immediately() {
        let backend = Scripted::new([two_tutors()]);
        let obs = observable(backend.clone());

        let mut waiting = tokio_test::task::spawn(obs.depend_on_record_or_fail(1));
        let err = assert_ready!(waiting.poll()).unwrap_err();
        assert!(matches!(err, CoreError::NotLoaded { .. }));
        assert_eq!(backend.calls(), 0);
        assert!(obs.state().is_loading());
    }

    #[tokio::test]
    async fn depend_on_record_after_load_is_immediate() {
        let (_, obs) = loaded([]).await;
        let mut lookup = tokio_test::task::spawn(obs.depend_on_record_or_fail(2));
        assert_eq!(assert_ready!(lookup.poll()).unwrap().text("firstName"), "Bo");
    }

    #[tokio::test]
    async fn depend_on_record_fails_after_failed_load() {
        let obs = observable(Scripted::new([ServerResponse::failure("boom")]));
        obs.initialize().await;
        let err = obs.depend_on_record_or_fail(1).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    // ── Mutations ──

    #[tokio::test]
    async fn create_caches_server_record() {
        let stored = json!({"id": 1000, "date": 555, "firstName": "Cy"});
        let (_, obs) = loaded([ServerResponse::ok(stored)]).await;
        let mut sub = obs.subscribe();

        let draft = Record::draft(serde_json::Map::new()).with_field("firstName", "Cy");
        let created = obs.create_record(draft).await.unwrap_or_fail().unwrap();
        assert_eq!(created.id, 1000);
        assert_eq!(obs.get_record_or_fail(1000).unwrap(), created);

        let state = sub.changed().await.unwrap();
        assert_eq!(state.unwrap_or_fail().unwrap().len(), 3);
        assert_eq!(obs.version(), 2);
    }

    #[tokio::test]
    async fn failed_create_leaves_cache_alone() {
        let (_, obs) = loaded([ServerResponse::failure("sheet locked")]).await;
        let outcome = obs.create_record(Record::new(-1, -1)).await;
        assert_eq!(outcome, AskFinished::Error("sheet locked".into()));
        assert_eq!(obs.get_record_collection_or_fail().unwrap().len(), 2);
        assert_eq!(obs.version(), 1);
    }

    #[tokio::test]
    async fn writes_on_unloaded_resource_skip_the_server() {
        let backend = Scripted::new([ServerResponse::failure("sheet missing")]);
        let obs = observable(backend.clone());

        let outcome = obs.delete_record(1).await;
        assert_eq!(outcome.message(), Some("resource is not loaded: tutors"));

        obs.initialize().await;
        let outcome = obs.update_record(Record::new(1, 0)).await;
        assert_eq!(outcome.message(), Some("sheet missing"));
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn failed_update_keeps_cached_record() {
        let (backend, obs) = loaded([ServerResponse::failure("record not found: tutors/#1")]).await;
        let before = obs.get_record_or_fail(1).unwrap();

        let edited = before.clone().with_field("firstName", "Changed");
        let outcome = obs.update_record(edited).await;
        assert_eq!(outcome.message(), Some("record not found: tutors/#1"));

        assert_eq!(obs.get_record_or_fail(1).unwrap(), before);
        assert_eq!(obs.version(), 1);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn failed_delete_keeps_record_retrievable() {
        let (backend, obs) = loaded([ServerResponse::failure("sheet locked")]).await;
        let mut sub = obs.subscribe();

        assert!(obs.delete_record(2).await.is_error());
        assert_eq!(obs.get_record_or_fail(2).unwrap().text("firstName"), "Bo");
        assert_eq!(obs.get_record_collection_or_fail().unwrap().len(), 2);
        assert_eq!(obs.version(), 1);
        assert_eq!(backend.calls(), 2);

        let mut next = tokio_test::task::spawn(sub.changed());
        assert_pending!(next.poll());
    }

    #[tokio::test]
    async fn update_and_delete_write_through() {
        let (_, obs) = loaded([ServerResponse::ok(Value::Null), ServerResponse::ok(Value::Null)]).await;

        let edited = obs.get_record_or_fail(1).unwrap().with_field("firstName", "Ada L.");
        assert!(obs.update_record(edited.clone()).await.is_loaded());
        assert_eq!(obs.get_record_or_fail(1).unwrap(), edited);

        assert!(obs.delete_record(2).await.is_loaded());
        assert_eq!(obs.find_record(2).unwrap(), None);
        assert_eq!(obs.version(), 3);
    }

    // ── Notifications ──

    #[tokio::test]
    async fn notifications_apply_without_rpc() {
        let (backend, obs) = loaded([]).await;

        assert!(obs.on_server_notification_create(Record::new(7, 0)));
        assert!(obs.on_server_notification_update(Record::new(7, 1)));
        assert_eq!(obs.get_record_or_fail(7).unwrap().date, 1);
        assert!(obs.on_server_notification_delete(7));
        assert_eq!(backend.calls(), 1);
        assert_eq!(obs.version(), 4);
    }

    #[tokio::test]
    async fn deleting_absent_id_does_not_notify() {
        let (_, obs) = loaded([]).await;
        let mut sub = obs.subscribe();

        assert!(!obs.on_server_notification_delete(42));
        assert_eq!(obs.version(), 1);

        let mut next = tokio_test::task::spawn(sub.changed());
        assert_pending!(next.poll());
    }

    #[tokio::test]
    async fn notifications_before_load_are_ignored() {
        let obs = observable(Scripted::new([]));
        assert!(!obs.on_server_notification_create(Record::new(1, 0)));
        assert!(obs.state().is_loading());
        assert_eq!(obs.version(), 0);
    }
}
