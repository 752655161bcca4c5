//! Cached, cancellable bill-status lookups.
//!
//! The resolver keeps one entry per [`BillKey`]. Each entry owns a watch
//! channel carrying the latest [`BillStatus`] and at most one in-flight
//! fetch task. Lookups are deduplicated: every subscriber to the same key
//! shares the same channel and the same fetch.
//!
//! Staleness is handled explicitly. Generations are allocated from a
//! resolver-wide counter, so no two fetches ever run under the same one.
//! A fetch task records the generation it was spawned under and its result
//! is applied only if the entry still holds that generation.
//! [`BillStatusResolver::refresh`] moves its entry to a fresh generation
//! and aborts the old task, so a superseded response can never overwrite a
//! newer one even if the abort lands late; an entry that was evicted and
//! recreated holds a generation the old task can never match.

use crate::BillingResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

// ============================================================================
// Public types
// ============================================================================

/// Cache key for a bill-status lookup: one prescription for one patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BillKey {
    /// The medication request the bill would cover.
    pub request_id: Uuid,
    /// The patient who would owe it.
    pub patient_id: Uuid,
}

/// Snapshot of the billing answer for one prescription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BillStatus {
    /// The patient has an unsettled bill covering this prescription.
    pub should_pay_bill: bool,
    /// A lookup is in flight and the answer is not yet known.
    pub is_loading: bool,
}

impl BillStatus {
    /// Status published while a lookup is in flight.
    pub fn loading() -> Self {
        Self {
            should_pay_bill: false,
            is_loading: true,
        }
    }

    /// Status published once a lookup has settled.
    pub fn resolved(should_pay_bill: bool) -> Self {
        Self {
            should_pay_bill,
            is_loading: false,
        }
    }

    /// Whether this status currently keeps the dispense action disabled.
    ///
    /// True while the lookup is still loading as well as when an unsettled
    /// bill was found; the action only proceeds on a settled "no bill due".
    pub fn blocks_dispensing(&self) -> bool {
        self.should_pay_bill || self.is_loading
    }
}

/// Backend seam for bill lookups.
///
/// Implementations wrap whatever billing system the deployment runs. They
/// may take as long as they need; the resolver publishes a loading status
/// in the meantime and aborts the call if it is superseded.
#[async_trait]
pub trait BillingSource: Send + Sync {
    /// Whether the patient has an outstanding bill covering the
    /// given prescription.
    async fn outstanding_bill(&self, key: BillKey) -> BillingResult<bool>;
}

// ============================================================================
// Resolver
// ============================================================================

struct Entry {
    tx: watch::Sender<BillStatus>,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct ResolverState {
    entries: HashMap<BillKey, Entry>,
    next_generation: u64,
}

impl ResolverState {
    /// Hand out a generation no fetch has ever run under. Generations are
    /// never reused, so a completion from an evicted entry cannot match a
    /// later entry for the same key.
    fn allocate_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }
}

/// Shared cache of bill statuses, one watch channel per prescription.
///
/// Cloning is cheap; all clones share the same cache. Subscribers read the
/// latest status from the receiver's current value and await `changed` for
/// updates. When an entry is invalidated its channel closes, which
/// subscribers observe as an error from `changed`; they resubscribe to
/// trigger a fresh lookup.
///
/// Lookup failures fail open: the status settles to "no bill due" and a
/// warning is logged. See the crate docs for the policy.
#[derive(Clone)]
pub struct BillStatusResolver {
    source: Arc<dyn BillingSource>,
    state: Arc<Mutex<ResolverState>>,
}

impl BillStatusResolver {
    /// Create a resolver backed by the given billing source.
    pub fn new(source: Arc<dyn BillingSource>) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(ResolverState {
                entries: HashMap::new(),
                next_generation: 0,
            })),
        }
    }

    /// Subscribe to the bill status for a prescription.
    ///
    /// The first subscriber for a key starts the lookup; later subscribers
    /// share the cached channel without touching the backend. The returned
    /// receiver's current value is the latest known status, starting at
    /// [`BillStatus::loading`] until the first lookup settles.
    pub async fn subscribe(&self, key: BillKey) -> watch::Receiver<BillStatus> {
        let mut state = self.state.lock().await;

        if let Some(entry) = state.entries.get(&key) {
            tracing::debug!(request_id = %key.request_id, "bill status cache hit");
            return entry.tx.subscribe();
        }

        let generation = state.allocate_generation();
        let (tx, rx) = watch::channel(BillStatus::loading());
        let task = self.spawn_fetch(key, generation);
        state.entries.insert(
            key,
            Entry {
                tx,
                generation,
                task: Some(task),
            },
        );
        rx
    }

    /// Force a fresh lookup for a prescription.
    ///
    /// Aborts any in-flight fetch, moves the entry to a fresh generation so
    /// a late response from the old fetch is discarded, publishes a loading
    /// status and starts a new fetch. Called after an action that may have
    /// changed the patient's account, such as settling a bill at the desk.
    pub async fn refresh(&self, key: BillKey) {
        let mut state = self.state.lock().await;
        let generation = state.allocate_generation();

        match state.entries.get_mut(&key) {
            Some(entry) => {
                if let Some(task) = entry.task.take() {
                    task.abort();
                }
                entry.generation = generation;
                let _ = entry.tx.send_replace(BillStatus::loading());
                let task = self.spawn_fetch(key, generation);
                entry.task = Some(task);
            }
            None => {
                // Nothing cached yet; warm the entry so later subscribers
                // pick up the settled answer.
                let (tx, _rx) = watch::channel(BillStatus::loading());
                let task = self.spawn_fetch(key, generation);
                state.entries.insert(
                    key,
                    Entry {
                        tx,
                        generation,
                        task: Some(task),
                    },
                );
            }
        }
    }

    /// Drop the cached status for a prescription.
    ///
    /// Any in-flight fetch is aborted and the watch channel closes.
    /// Subscribers that resubscribe start a fresh lookup.
    pub async fn invalidate(&self, key: BillKey) {
        let mut state = self.state.lock().await;
        if let Some(mut entry) = state.entries.remove(&key) {
            if let Some(task) = entry.task.take() {
                task.abort();
            }
        }
    }

    /// Spawn a fetch for `key` under `generation`.
    ///
    /// Callers hold the state lock while installing the returned handle,
    /// so the task (which needs the same lock to publish) cannot complete
    /// before its entry is in place.
    fn spawn_fetch(&self, key: BillKey, generation: u64) -> JoinHandle<()> {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let status = match source.outstanding_bill(key).await {
                Ok(outstanding) => BillStatus::resolved(outstanding),
                Err(err) => {
                    tracing::warn!(
                        request_id = %key.request_id,
                        "bill status lookup failed, not blocking dispense: {err}"
                    );
                    BillStatus::resolved(false)
                }
            };

            let mut state = state.lock().await;
            apply_completion(&mut state.entries, key, generation, status);
        })
    }
}

/// Apply a fetch result to the cache if it is still current.
///
/// Returns `true` if the result was published, `false` if it was discarded
/// because the entry is gone or its generation has moved on.
fn apply_completion(
    entries: &mut HashMap<BillKey, Entry>,
    key: BillKey,
    generation: u64,
    status: BillStatus,
) -> bool {
    match entries.get_mut(&key) {
        Some(entry) if entry.generation == generation => {
            let _ = entry.tx.send_replace(status);
            entry.task = None;
            true
        }
        _ => {
            tracing::warn!(
                request_id = %key.request_id,
                "discarding bill status from a superseded or evicted lookup"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BillingError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn key() -> BillKey {
        BillKey {
            request_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
        }
    }

    /// Source that answers only after the test releases it. Calls are
    /// counted after the gate, so an aborted fetch never counts.
    struct GatedSource {
        gate: Notify,
        answer: bool,
        calls: AtomicUsize,
    }

    impl GatedSource {
        fn new(answer: bool) -> Self {
            Self {
                gate: Notify::new(),
                answer,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BillingSource for GatedSource {
        async fn outstanding_bill(&self, _key: BillKey) -> BillingResult<bool> {
            self.gate.notified().await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    /// Source that counts calls and replays a fixed sequence of answers.
    struct SequenceSource {
        calls: AtomicUsize,
        answers: Vec<bool>,
    }

    impl SequenceSource {
        fn new(answers: Vec<bool>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                answers,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BillingSource for SequenceSource {
        async fn outstanding_bill(&self, _key: BillKey) -> BillingResult<bool> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(*self.answers.get(index).unwrap_or(&false))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl BillingSource for FailingSource {
        async fn outstanding_bill(&self, _key: BillKey) -> BillingResult<bool> {
            Err(BillingError::Unavailable("billing service down".into()))
        }
    }

    #[tokio::test]
    async fn publishes_loading_then_settles() {
        let source = Arc::new(GatedSource::new(true));
        let resolver = BillStatusResolver::new(source.clone());
        let k = key();

        let mut rx = resolver.subscribe(k).await;
        assert_eq!(*rx.borrow(), BillStatus::loading());
        assert!(rx.borrow().blocks_dispensing());

        source.gate.notify_one();
        rx.changed().await.expect("channel open");
        assert_eq!(*rx.borrow(), BillStatus::resolved(true));
        assert!(rx.borrow().blocks_dispensing());
    }

    #[tokio::test]
    async fn deduplicates_lookups_per_key() {
        let source = Arc::new(SequenceSource::new(vec![false]));
        let resolver = BillStatusResolver::new(source.clone());
        let k = key();

        let mut rx = resolver.subscribe(k).await;
        if rx.borrow_and_update().is_loading {
            rx.changed().await.expect("channel open");
        }

        let second = resolver.subscribe(k).await;
        assert_eq!(*second.borrow(), BillStatus::resolved(false));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn lookup_failure_fails_open() {
        let resolver = BillStatusResolver::new(Arc::new(FailingSource));
        let k = key();

        let mut rx = resolver.subscribe(k).await;
        while rx.borrow_and_update().is_loading {
            rx.changed().await.expect("channel open");
        }
        let status = *rx.borrow();
        assert!(!status.should_pay_bill);
        assert!(!status.blocks_dispensing());
    }

    #[tokio::test]
    async fn refresh_requeries_and_publishes_new_answer() {
        let source = Arc::new(SequenceSource::new(vec![true, false]));
        let resolver = BillStatusResolver::new(source.clone());
        let k = key();

        let mut rx = resolver.subscribe(k).await;
        while rx.borrow_and_update().is_loading {
            rx.changed().await.expect("channel open");
        }
        assert!(rx.borrow().should_pay_bill);

        resolver.refresh(k).await;
        while rx.borrow_and_update().is_loading {
            rx.changed().await.expect("channel open");
        }
        assert!(!rx.borrow().should_pay_bill);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn refresh_aborts_the_parked_fetch() {
        let source = Arc::new(GatedSource::new(true));
        let resolver = BillStatusResolver::new(source.clone());
        let k = key();

        let mut rx = resolver.subscribe(k).await;
        // Let the first fetch reach the gate before superseding it.
        tokio::task::yield_now().await;
        resolver.refresh(k).await;

        source.gate.notify_one();
        while rx.borrow_and_update().is_loading {
            rx.changed().await.expect("channel open");
        }

        // Only the replacement fetch got through the gate.
        assert_eq!(*rx.borrow(), BillStatus::resolved(true));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_closes_channel_and_resubscribe_refetches() {
        let source = Arc::new(SequenceSource::new(vec![true, true]));
        let resolver = BillStatusResolver::new(source.clone());
        let k = key();

        let mut rx = resolver.subscribe(k).await;
        while rx.borrow_and_update().is_loading {
            rx.changed().await.expect("channel open");
        }

        resolver.invalidate(k).await;
        rx.changed().await.expect_err("channel should close");

        let mut rx = resolver.subscribe(k).await;
        while rx.borrow_and_update().is_loading {
            rx.changed().await.expect("channel open");
        }
        assert!(rx.borrow().should_pay_bill);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn completion_from_an_evicted_lifetime_is_discarded() {
        let source = Arc::new(GatedSource::new(true));
        let resolver = BillStatusResolver::new(source.clone());
        let k = key();

        // First lifetime for the key is evicted while its fetch is still
        // pending; the fetch ran under generation 0.
        let _evicted = resolver.subscribe(k).await;
        resolver.invalidate(k).await;

        let mut rx = resolver.subscribe(k).await;

        // The evicted lifetime's fetch completes late and tries to publish
        // under the generation it was spawned with.
        {
            let mut state = resolver.state.lock().await;
            let applied = apply_completion(&mut state.entries, k, 0, BillStatus::resolved(true));
            assert!(!applied);
            // Discarding must leave the successor's entry untouched.
            let entry = state.entries.get(&k).expect("successor entry");
            assert!(entry.task.is_some());
        }
        assert_eq!(*rx.borrow_and_update(), BillStatus::loading());

        // The successor's own fetch still settles.
        source.gate.notify_one();
        rx.changed().await.expect("channel open");
        assert_eq!(*rx.borrow(), BillStatus::resolved(true));
    }

    #[tokio::test]
    async fn stale_completion_is_discarded() {
        let (tx, rx) = watch::channel(BillStatus::loading());
        let mut entries = HashMap::new();
        let k = key();
        entries.insert(
            k,
            Entry {
                tx,
                generation: 1,
                task: None,
            },
        );

        // A response from generation 0 arrives after a refresh moved the
        // entry to generation 1.
        let applied = apply_completion(&mut entries, k, 0, BillStatus::resolved(true));
        assert!(!applied);
        assert_eq!(*rx.borrow(), BillStatus::loading());

        let applied = apply_completion(&mut entries, k, 1, BillStatus::resolved(false));
        assert!(applied);
        assert_eq!(*rx.borrow(), BillStatus::resolved(false));
    }

    #[tokio::test]
    async fn completion_for_removed_entry_is_discarded() {
        let mut entries: HashMap<BillKey, Entry> = HashMap::new();
        let applied = apply_completion(&mut entries, key(), 0, BillStatus::resolved(true));
        assert!(!applied);
    }
}
