use futures_util::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::EngineConfig;
use crate::domain::console::{ConsoleAction, ConsoleStore, SelectionError};
use crate::domain::selection::PruneReport;
use crate::metrics::Metrics;
use crate::services::{CredentialStore, MutationGateway, OrderQueries, PurchaseReceipt, ServiceError};

use super::commands::{MutationPayload, MutationRequest, OptimisticPatch, WorkflowIntent};
use super::errors::WorkflowError;
use super::state::{Completed, SubmitOutcome, TargetKey, WorkflowKind, WorkflowPhase};
use super::validation::{validate, Validated};

// ============================================================================
// Mutation Workflow Controller
// ============================================================================
//
// Orchestrates: Intent -> Validation -> one network mutation -> commit/rollback
//
// - At most one in-flight mutation per (kind, target); extra submits are no-ops
// - Success clears the batch selection, keeps optimistic patches, refetches
// - Failure keeps selection and request, rolls optimistic patches back
// - Neither lock is held across a network call
//
// Everything after the gate runs in a spawned task. Dropping the `submit`
// future (dialog closed, timeout) neither aborts the request nor strands the
// slot; a late success is still committed. A panicking gateway is caught and
// handled like any other failure.
//
// ============================================================================

type SlotKey = (WorkflowKind, TargetKey);

struct Slot {
    phase: WorkflowPhase,
    entered_at: Instant,
    last_error: Option<WorkflowError>,
    retained: Option<MutationRequest>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            entered_at: Instant::now(),
            last_error: None,
            retained: None,
        }
    }
}

struct Inner {
    store: Arc<Mutex<ConsoleStore>>,
    queries: Arc<dyn OrderQueries>,
    gateway: Arc<dyn MutationGateway>,
    credentials: Arc<dyn CredentialStore>,
    config: EngineConfig,
    metrics: Arc<Metrics>,
    slots: Mutex<HashMap<SlotKey, Slot>>,
}

#[derive(Clone)]
pub struct WorkflowController {
    inner: Arc<Inner>,
}

impl WorkflowController {
    pub fn new(
        store: Arc<Mutex<ConsoleStore>>,
        queries: Arc<dyn OrderQueries>,
        gateway: Arc<dyn MutationGateway>,
        credentials: Arc<dyn CredentialStore>,
        config: EngineConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                queries,
                gateway,
                credentials,
                config,
                metrics,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> Arc<Mutex<ConsoleStore>> {
        self.inner.store.clone()
    }

    /// Forward a selection action to the console store
    pub async fn dispatch(&self, action: ConsoleAction) -> Result<(), SelectionError> {
        self.inner.store.lock().await.dispatch(action)
    }

    /// Fetch the current page and hand it to the list synchronizer
    pub async fn refresh(&self) -> Result<PruneReport, ServiceError> {
        self.inner.refresh().await
    }

    pub async fn submit(&self, intent: WorkflowIntent) -> Result<SubmitOutcome, WorkflowError> {
        let key = (intent.kind(), intent.target());
        let workflow = key.0.as_str();

        // === Idle -> Validating (single-flight gate) ===
        {
            let mut slots = self.inner.slots.lock().await;
            let slot = slots.entry(key).or_default();
            if slot.phase.is_busy() {
                tracing::debug!(
                    workflow,
                    target = %key.1,
                    phase = ?slot.phase,
                    "Ignoring submit while mutation is in flight"
                );
                self.inner.metrics.record_duplicate_submission(workflow);
                return Ok(SubmitOutcome::AlreadyInFlight);
            }
            transition(slot, key, WorkflowPhase::Validating);
        }

        // No await between the gate and the spawn: once the slot is busy the
        // task owns it, whether or not this future is still polled.
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move { inner.run(key, intent).await });

        match handle.await {
            Ok(result) => result,
            Err(join_error) => {
                let error = WorkflowError::Aborted(join_error.to_string());
                self.inner.reject(key, &error).await;
                Err(error)
            }
        }
    }

    /// Current phase. A Succeeded slot reads as Idle once the display delay passed.
    pub async fn phase(&self, kind: WorkflowKind, target: TargetKey) -> WorkflowPhase {
        let mut slots = self.inner.slots.lock().await;
        let Some(slot) = slots.get_mut(&(kind, target)) else {
            return WorkflowPhase::Idle;
        };

        if slot.phase == WorkflowPhase::Succeeded
            && slot.entered_at.elapsed() >= self.inner.config.success_display_delay
        {
            transition(slot, (kind, target), WorkflowPhase::Idle);
        }
        let phase = slot.phase;
        prune_settled(&mut slots, (kind, target));
        phase
    }

    /// Dialog closed: a Succeeded slot goes back to Idle
    pub async fn acknowledge(&self, kind: WorkflowKind, target: TargetKey) {
        let mut slots = self.inner.slots.lock().await;
        if let Some(slot) = slots.get_mut(&(kind, target)) {
            if slot.phase == WorkflowPhase::Succeeded {
                transition(slot, (kind, target), WorkflowPhase::Idle);
            }
            slot.last_error = None;
        }
        prune_settled(&mut slots, (kind, target));
    }

    pub async fn last_error(&self, kind: WorkflowKind, target: TargetKey) -> Option<WorkflowError> {
        let slots = self.inner.slots.lock().await;
        slots.get(&(kind, target)).and_then(|slot| slot.last_error.clone())
    }

    /// Request kept after a failed submission, for correction and retry
    pub async fn retained_request(&self, kind: WorkflowKind, target: TargetKey) -> Option<MutationRequest> {
        let slots = self.inner.slots.lock().await;
        slots.get(&(kind, target)).and_then(|slot| slot.retained.clone())
    }
}

fn transition(slot: &mut Slot, key: SlotKey, to: WorkflowPhase) {
    tracing::debug!(
        workflow = key.0.as_str(),
        target = %key.1,
        from = ?slot.phase,
        to = ?to,
        "Workflow transition"
    );
    slot.phase = to;
    slot.entered_at = Instant::now();
}

/// Drop an Idle slot that carries nothing worth reporting
fn prune_settled(slots: &mut HashMap<SlotKey, Slot>, key: SlotKey) {
    let settled = slots.get(&key).is_some_and(|slot| {
        slot.phase == WorkflowPhase::Idle && slot.last_error.is_none() && slot.retained.is_none()
    });
    if settled {
        slots.remove(&key);
    }
}

impl Inner {
    async fn run(&self, key: SlotKey, intent: WorkflowIntent) -> Result<SubmitOutcome, WorkflowError> {
        let workflow = key.0.as_str();

        // === Validation + optimistic patch, under one store lock ===
        let validated = {
            let mut store = self.store.lock().await;
            let result = validate(&intent, &store, &self.config, self.credentials.token());

            if let Ok(Validated { patch: Some(patch), .. }) = &result {
                if let Err(error) = store.dispatch(patch.apply.clone()) {
                    tracing::warn!(error = %error, "Optimistic patch could not be applied");
                }
            }
            result
        };

        let validated = match validated {
            Ok(validated) => validated,
            Err(error) => {
                self.reject(key, &error).await;
                if matches!(error, WorkflowError::StaleReference(_)) {
                    self.refresh_logged().await;
                }
                return Err(error);
            }
        };

        // === Validating -> Submitting ===
        let request = MutationRequest::new(key.0, key.1, validated.payload.clone()).with_phase(WorkflowPhase::Submitting);
        {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(key).or_default();
            transition(slot, key, WorkflowPhase::Submitting);
        }
        self.metrics.record_submitted(workflow);

        tracing::info!(
            request_id = %request.request_id,
            workflow,
            target = %key.1,
            "Submitting mutation"
        );

        self.execute(key, request, validated).await.map(SubmitOutcome::Completed)
    }

    async fn execute(&self, key: SlotKey, request: MutationRequest, validated: Validated) -> Result<Completed, WorkflowError> {
        let workflow = key.0.as_str();
        let started = Instant::now();
        let result = match AssertUnwindSafe(self.call_gateway(&validated)).catch_unwind().await {
            Ok(result) => result.map_err(|error| {
                if matches!(error, ServiceError::Unauthorized) {
                    self.credentials.discard();
                }
                WorkflowError::from(error)
            }),
            Err(_) => Err(WorkflowError::Aborted("gateway panicked".to_string())),
        };
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(receipt) => {
                // === Submitting -> Succeeded ===
                {
                    let mut store = self.store.lock().await;
                    if let MutationPayload::Purchase(_) = &validated.payload {
                        if let TargetKey::Order { order_id } = key.1 {
                            if let Err(error) = store.dispatch(ConsoleAction::Clear { order_id }) {
                                tracing::warn!(error = %error, "Selection could not be cleared after success");
                            }
                        }
                    }
                    store.mark_stale();
                }
                {
                    let mut slots = self.slots.lock().await;
                    let slot = slots.entry(key).or_default();
                    transition(slot, key, WorkflowPhase::Succeeded);
                    slot.last_error = None;
                    slot.retained = None;
                }
                self.metrics.record_outcome(workflow, elapsed, None);

                tracing::info!(
                    request_id = %request.request_id,
                    workflow,
                    target = %key.1,
                    elapsed_ms = (elapsed * 1000.0) as u64,
                    "✅ Mutation accepted"
                );

                let refetched = self.refresh_logged().await;

                Ok(Completed {
                    request: request.with_phase(WorkflowPhase::Succeeded),
                    receipt,
                    refetched,
                })
            }
            Err(error) => {
                // === Submitting -> Failed -> Idle ===
                if let Some(OptimisticPatch { rollback, .. }) = &validated.patch {
                    if let Err(error) = self.store.lock().await.dispatch(rollback.clone()) {
                        tracing::warn!(error = %error, "Optimistic rollback target vanished");
                    }
                }

                {
                    let mut slots = self.slots.lock().await;
                    let slot = slots.entry(key).or_default();
                    transition(slot, key, WorkflowPhase::Failed);
                    slot.last_error = Some(error.clone());
                    slot.retained = Some(request.clone().with_phase(WorkflowPhase::Failed));
                    transition(slot, key, WorkflowPhase::Idle);
                }
                self.metrics.record_outcome(workflow, elapsed, Some(error.reason()));

                tracing::warn!(
                    request_id = %request.request_id,
                    workflow,
                    target = %key.1,
                    reason = error.reason(),
                    error = %error,
                    "Mutation failed"
                );

                if matches!(error, WorkflowError::StaleReference(_)) {
                    self.refresh_logged().await;
                }

                Err(error)
            }
        }
    }

    async fn call_gateway(&self, validated: &Validated) -> Result<Option<PurchaseReceipt>, ServiceError> {
        let token = validated.token.as_ref();
        let missing = || ServiceError::Unauthorized;

        match &validated.payload {
            MutationPayload::Purchase(request) => {
                let receipt = self
                    .gateway
                    .create_purchase(request, token.ok_or_else(missing)?)
                    .await?;
                Ok(Some(receipt))
            }
            MutationPayload::Cancel { order_id, link_id } => {
                self.gateway
                    .cancel_link(*order_id, *link_id, token.ok_or_else(missing)?)
                    .await?;
                Ok(None)
            }
            MutationPayload::BuyLater { order_id, link_id } => {
                self.gateway
                    .mark_buy_later(*order_id, *link_id, token.ok_or_else(missing)?)
                    .await?;
                Ok(None)
            }
            MutationPayload::Pin { order_id, pinned } => {
                self.gateway.set_pinned(*order_id, *pinned).await?;
                Ok(None)
            }
            MutationPayload::Shipment(update) => {
                self.gateway
                    .update_shipment(update, token.ok_or_else(missing)?)
                    .await?;
                Ok(None)
            }
        }
    }

    /// Validation-stage failure: back to Idle with the reason recorded
    async fn reject(&self, key: SlotKey, error: &WorkflowError) {
        {
            let mut slots = self.slots.lock().await;
            let slot = slots.entry(key).or_default();
            transition(slot, key, WorkflowPhase::Idle);
            slot.last_error = Some(error.clone());
        }

        let rule = match error {
            WorkflowError::Validation(validation) => validation.rule(),
            other => other.reason(),
        };
        self.metrics.record_validation_rejection(key.0.as_str(), rule);

        tracing::info!(
            workflow = key.0.as_str(),
            target = %key.1,
            rule,
            "Submit rejected before reaching the server"
        );
    }

    async fn refresh(&self) -> Result<PruneReport, ServiceError> {
        let query = self.store.lock().await.query().clone();
        let page = self.queries.fetch_orders(&query).await?;

        let mut store = self.store.lock().await;
        if store.query() != &query {
            // The user moved to another page meanwhile; that fetch wins
            tracing::debug!("Discarding refetch for outdated query");
            return Ok(PruneReport::default());
        }

        if let Err(error) = store.dispatch(ConsoleAction::ReplacePage(page)) {
            tracing::warn!(error = %error, "Refetched page was not applied");
        }
        Ok(store.last_prune().clone())
    }

    async fn refresh_logged(&self) -> bool {
        match self.refresh().await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(error = %error, "Refetch after mutation failed, page left stale");
                false
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
