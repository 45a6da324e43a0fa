//! SessionEngine - the walk-session lifecycle state machine.
//!
//! Owns the active-session state, the step subscription, and the
//! elapsed-time ticker, and orchestrates the backend session calls. The
//! engine is the single writer of session state; the UI polls
//! [`SessionEngine::snapshot`] and drives transitions through the six
//! operations below.
//!
//! States: `Idle → Starting → Active ⇄ ActivePaused → Saving`, with every
//! terminal transition returning to `Idle`. The two transitional states make
//! the in-flight guards first-class: a second `start()` while the permission
//! prompt is open observes `Starting` and becomes a no-op, and every
//! operation arriving while a save's network call is in flight observes
//! `Saving` and becomes a no-op, so a session is never persisted twice and
//! nothing reopens the subscription mid-save.
//!
//! Two generation counters keep detached work honest:
//! - `epoch` changes whenever the subscription/ticker pair is torn down or
//!   reopened; sensor callbacks and ticker closures from an old epoch are
//!   ignored, so a stale subscription can never race a fresh one.
//! - `session_seq` changes when a session lifetime begins or is saved away;
//!   the background placeholder create only applies its id while the
//!   session that spawned it is still the current one.

use crate::backend::{HttpSessionBackend, SessionBackend};
use crate::clock::{Clock, SystemClock};
use crate::error::MindFfiError;
use crate::identity::get_or_init_device_id;
use crate::sensor::{PermissionStatus, StepListener, StepSource};
use crate::storage::StorageConfig;
use crate::ticker::{ThreadTicker, Ticker, TickerHandle};
use crate::types::{Answer, SaveOutcome, SessionSnapshot, WalkSummary};
use mindsteps_backend_protocol::{CreateSessionRequest, UpdateSessionRequest};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use tracing::{debug, warn};

/// User-facing (Swedish) message for stop/save without an open session.
const NO_ACTIVE_SESSION: &str = "Ingen aktiv session";

/// Failure starting a session. Everything else the engine reports is a
/// structured result value rather than an error.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum StartError {
    #[error("Steg-behörighet nekad")]
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Starting,
    Active,
    ActivePaused,
    /// A save's network call is in flight; the state lock is released but
    /// every transition is blocked. `paused` remembers the phase to restore
    /// when the save fails.
    Saving { paused: bool },
}

struct Inner {
    phase: Phase,
    /// Cumulative step count for this session.
    steps: u32,
    /// Steps accumulated before the current subscription opened.
    base_steps: u32,
    /// Frozen while paused; refreshed by the ticker while active.
    elapsed_sec: u64,
    /// Effective start of the current unpaused interval, ms since epoch.
    start_time_ms: Option<u64>,
    session_id: Option<String>,
    /// Subscription/ticker generation; see module docs.
    epoch: u64,
    /// Session-lifetime generation; see module docs.
    session_seq: u64,
    sensor_open: bool,
    ticker_handle: Option<Box<dyn TickerHandle>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            phase: Phase::Idle,
            steps: 0,
            base_steps: 0,
            elapsed_sec: 0,
            start_time_ms: None,
            session_id: None,
            epoch: 0,
            session_seq: 0,
            sensor_open: false,
            ticker_handle: None,
        }
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coerces a raw sensor count into a step count. Non-finite and negative
/// values become 0.
fn sanitize_steps(raw: f64) -> u32 {
    if !raw.is_finite() || raw < 0.0 {
        return 0;
    }
    if raw >= u32::MAX as f64 {
        return u32::MAX;
    }
    raw as u32
}

/// Forwards sensor updates into the engine state. Holds only a weak
/// reference so a dangling subscription cannot keep the engine alive.
struct StepRelay {
    inner: Weak<Mutex<Inner>>,
    epoch: u64,
}

impl StepListener for StepRelay {
    fn on_step_count(&self, steps_since_start: f64) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = lock_inner(&inner);
        if state.epoch != self.epoch || state.phase != Phase::Active {
            return;
        }
        state.steps = state.base_steps.saturating_add(sanitize_steps(steps_since_start));
    }
}

/// The engine behind the during-walk screen.
///
/// Synchronous by design: `start()` blocks only on the permission prompt,
/// everything else is an immediate state transition. Backend work runs on
/// detached threads and re-synchronizes through the generation counters.
#[derive(uniffi::Object)]
pub struct SessionEngine {
    inner: Arc<Mutex<Inner>>,
    step_source: Arc<dyn StepSource>,
    backend: Arc<dyn SessionBackend>,
    clock: Arc<dyn Clock>,
    ticker: Arc<dyn Ticker>,
    device_id: String,
}

impl SessionEngine {
    /// Creates an engine from explicit collaborators.
    ///
    /// Used by tests and by hosts that manage their own wiring. Not exposed
    /// to FFI - use `new()` for external clients.
    pub fn with_parts(
        step_source: Arc<dyn StepSource>,
        backend: Arc<dyn SessionBackend>,
        clock: Arc<dyn Clock>,
        ticker: Arc<dyn Ticker>,
        device_id: String,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            step_source,
            backend,
            clock,
            ticker,
            device_id,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    /// Elapsed seconds right now; the frozen value outside `Active`.
    fn live_elapsed(&self, state: &Inner) -> u64 {
        match (state.phase, state.start_time_ms) {
            (Phase::Active, Some(start)) => self.clock.now_ms().saturating_sub(start) / 1000,
            _ => state.elapsed_sec,
        }
    }

    /// Opens a fresh subscription + ticker pair under a new epoch.
    ///
    /// Caller holds the state lock; `start_updates` must not call the
    /// listener synchronously (see the `StepSource` contract).
    fn open_resources(&self, state: &mut Inner) {
        state.epoch += 1;
        let epoch = state.epoch;

        let relay = Arc::new(StepRelay {
            inner: Arc::downgrade(&self.inner),
            epoch,
        });
        self.step_source.start_updates(relay);
        state.sensor_open = true;

        let weak = Arc::downgrade(&self.inner);
        let clock = Arc::clone(&self.clock);
        let on_tick = move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            // Skip the refresh when an operation holds the lock; teardown
            // joins the ticker thread, so blocking here could deadlock.
            let Ok(mut state) = inner.try_lock() else {
                return;
            };
            if state.epoch != epoch || state.phase != Phase::Active {
                return;
            }
            if let Some(start) = state.start_time_ms {
                state.elapsed_sec = clock.now_ms().saturating_sub(start) / 1000;
            }
        };
        state.ticker_handle = Some(self.ticker.start(Box::new(on_tick)));
    }

    /// Tears down the subscription/ticker pair and invalidates their epoch.
    fn close_resources(&self, state: &mut Inner) {
        state.epoch += 1;
        if state.sensor_open {
            self.step_source.stop_updates();
            state.sensor_open = false;
        }
        if let Some(mut handle) = state.ticker_handle.take() {
            handle.stop();
        }
    }

    fn now_rfc3339(&self) -> String {
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.clock.now_ms() as i64)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339())
    }

    /// Fires the optimistic placeholder create so a backend identity exists
    /// to update at save time. Failure is tolerated: the session continues
    /// locally and the save falls back to a create.
    fn spawn_placeholder_create(&self, session_seq: u64) {
        let backend = Arc::clone(&self.backend);
        let weak = Arc::downgrade(&self.inner);
        let request = CreateSessionRequest {
            device_id: self.device_id.clone(),
            steps: 0,
            // Zero-valued record; 1 is the minimum persisted duration.
            time: 1,
            answer: Answer::default().as_wire().to_string(),
            date: self.now_rfc3339(),
            reflection: None,
        };
        thread::spawn(move || match backend.create(&request) {
            Ok(record) => {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let mut state = lock_inner(&inner);
                if state.session_seq != session_seq {
                    debug!(id = %record.id, "placeholder create resolved for an ended session");
                    return;
                }
                state.session_id = Some(record.id);
            }
            Err(err) => warn!("placeholder session create failed: {err}"),
        });
    }
}

#[uniffi::export]
impl SessionEngine {
    /// Creates an engine with production wiring: persisted device identity
    /// under `~/.mindsteps`, HTTP backend at `base_url` (the
    /// `MINDSTEPS_API_URL` environment variable wins when set), system
    /// clock, 1-second ticker. The platform shell supplies the step sensor.
    #[uniffi::constructor]
    pub fn new(base_url: String, step_source: Arc<dyn StepSource>) -> Result<Self, MindFfiError> {
        let storage = StorageConfig::default();
        let device_id = get_or_init_device_id(&storage).map_err(MindFfiError::from)?;
        let backend = HttpSessionBackend::new(HttpSessionBackend::resolve_base_url(base_url))
            .map_err(|e| MindFfiError::from(e.to_string()))?;
        Ok(Self::with_parts(
            step_source,
            Arc::new(backend),
            Arc::new(SystemClock),
            Arc::new(ThreadTicker::default()),
            device_id,
        ))
    }

    /// The stable per-installation identifier this engine scopes sessions to.
    pub fn device_id(&self) -> String {
        self.device_id.clone()
    }

    /// Opens a walk session.
    ///
    /// No-op when a session is already open or another `start()` is still
    /// waiting on the permission prompt. Fails with `PermissionDenied`
    /// without leaving any subscription or ticker running. The placeholder
    /// create is not awaited: `session_id` fills in asynchronously.
    pub fn start(&self) -> Result<(), StartError> {
        {
            let mut state = self.lock();
            if state.phase != Phase::Idle {
                debug!(phase = ?state.phase, "start ignored");
                return Ok(());
            }
            state.phase = Phase::Starting;
        }

        // The permission prompt can take arbitrarily long; the lock is not
        // held, so snapshot() keeps working meanwhile.
        let permission = self.step_source.request_permission();
        if permission != PermissionStatus::Granted {
            let mut state = self.lock();
            state.phase = Phase::Idle;
            return Err(StartError::PermissionDenied);
        }

        let session_seq;
        {
            let mut state = self.lock();
            state.session_seq += 1;
            session_seq = state.session_seq;
            state.steps = 0;
            state.base_steps = 0;
            state.elapsed_sec = 0;
            state.start_time_ms = Some(self.clock.now_ms());
            state.session_id = None;
            self.open_resources(&mut state);
            state.phase = Phase::Active;
        }

        self.spawn_placeholder_create(session_seq);
        Ok(())
    }

    /// Suspends the timer and step stream, freezing both counters.
    /// No-op unless active and unpaused.
    pub fn pause(&self) {
        let mut state = self.lock();
        if state.phase != Phase::Active {
            return;
        }
        state.elapsed_sec = self.live_elapsed(&state);
        self.close_resources(&mut state);
        state.phase = Phase::ActivePaused;
    }

    /// Resumes a paused session. The effective start time is moved so the
    /// paused stretch is excluded; steps accumulated so far become the base
    /// for the fresh subscription. No-op unless paused.
    pub fn resume(&self) {
        let mut state = self.lock();
        if state.phase != Phase::ActivePaused {
            return;
        }
        let now = self.clock.now_ms();
        state.start_time_ms = Some(now.saturating_sub(state.elapsed_sec * 1000));
        state.base_steps = state.steps;
        self.open_resources(&mut state);
        state.phase = Phase::Active;
    }

    /// Zeroes steps and elapsed time and restarts the session from now,
    /// unpaused. No-op when idle.
    pub fn reset(&self) {
        let mut state = self.lock();
        if !matches!(state.phase, Phase::Active | Phase::ActivePaused) {
            return;
        }
        self.close_resources(&mut state);
        state.steps = 0;
        state.base_steps = 0;
        state.elapsed_sec = 0;
        state.start_time_ms = Some(self.clock.now_ms());
        self.open_resources(&mut state);
        state.phase = Phase::Active;
    }

    /// Closes the session and persists it: `update` on the placeholder when
    /// its id is known, `create` as the fallback. Never raises; a failed
    /// save keeps the session and its counters so the caller can retry.
    /// While the network call is in flight the engine sits in a transitional
    /// phase and every other operation (including a second save) is a no-op.
    pub fn stop_and_save(&self, answer: Answer) -> SaveOutcome {
        let (steps, duration_sec, session_id, was_paused);
        {
            let mut state = self.lock();
            if !matches!(state.phase, Phase::Active | Phase::ActivePaused)
                || state.start_time_ms.is_none()
            {
                return SaveOutcome::failed(NO_ACTIVE_SESSION);
            }
            was_paused = state.phase == Phase::ActivePaused;
            // Freeze before the network call; a paused session keeps the
            // value frozen at pause(), excluding time spent paused.
            state.elapsed_sec = self.live_elapsed(&state);
            self.close_resources(&mut state);
            // Saving blocks every transition while the lock is released
            // below, so exactly one save runs and nothing reopens the
            // subscription or ticker until the outcome is known.
            state.phase = Phase::Saving { paused: was_paused };
            steps = state.steps;
            duration_sec = state.elapsed_sec.max(1);
            session_id = state.session_id.clone();
        }

        let date = self.now_rfc3339();
        let result = match &session_id {
            Some(id) => self
                .backend
                .update(
                    id,
                    &UpdateSessionRequest {
                        steps: Some(steps),
                        time: Some(duration_sec),
                        answer: Some(answer.as_wire().to_string()),
                        date: Some(date),
                        reflection: None,
                    },
                )
                .map(|_| ()),
            None => self
                .backend
                .create(&CreateSessionRequest {
                    device_id: self.device_id.clone(),
                    steps,
                    time: duration_sec,
                    answer: answer.as_wire().to_string(),
                    date,
                    reflection: None,
                })
                .map(|_| ()),
        };

        match result {
            Ok(()) => {
                let mut state = self.lock();
                // Invalidates a placeholder create still in flight.
                state.session_seq += 1;
                state.phase = Phase::Idle;
                state.steps = 0;
                state.base_steps = 0;
                state.elapsed_sec = 0;
                state.start_time_ms = None;
                state.session_id = None;
                SaveOutcome::saved()
            }
            Err(err) => {
                warn!(backend = self.backend.name(), "session save failed: {err}");
                let mut state = self.lock();
                state.phase = if was_paused {
                    Phase::ActivePaused
                } else {
                    Phase::Active
                };
                SaveOutcome::failed(err.to_string())
            }
        }
    }

    /// Closes the session locally and returns its summary, without touching
    /// the backend. Steps and the placeholder id survive so a review screen
    /// can still persist them explicitly. `None` when no session is open.
    pub fn finish(&self) -> Option<WalkSummary> {
        let mut state = self.lock();
        if !matches!(state.phase, Phase::Active | Phase::ActivePaused)
            || state.start_time_ms.is_none()
        {
            return None;
        }
        state.elapsed_sec = self.live_elapsed(&state);
        self.close_resources(&mut state);
        let summary = WalkSummary {
            steps: state.steps,
            duration_sec: state.elapsed_sec.max(1),
        };
        state.phase = Phase::Idle;
        state.start_time_ms = None;
        Some(summary)
    }

    /// Current session state for the UI.
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            active: matches!(
                state.phase,
                Phase::Active | Phase::ActivePaused | Phase::Saving { .. }
            ),
            paused: matches!(
                state.phase,
                Phase::ActivePaused | Phase::Saving { paused: true }
            ),
            steps: state.steps,
            elapsed_sec: self.live_elapsed(&state),
            start_time_ms: state.start_time_ms,
            device_id: self.device_id.clone(),
            session_id: state.session_id.clone(),
        }
    }
}

impl Drop for SessionEngine {
    /// Shutdown releases the subscription and ticker unconditionally, even
    /// when no explicit stop was called.
    fn drop(&mut self) {
        let mut state = self.lock();
        self.close_resources(&mut state);
    }
}
