//! Step sensor boundary.
//!
//! The pedometer is hardware owned by the platform shell: the Swift/Kotlin
//! side implements [`StepSource`] over CMPedometer / the Android step
//! counter and hands it to the engine at construction. Rust test doubles
//! implement the same traits.

use std::sync::Arc;

/// Outcome of the one-time step-sensor permission request.
///
/// Anything but `Granted` keeps a session from starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Receiver for step-count updates. Implemented by the engine.
#[uniffi::export(with_foreign)]
pub trait StepListener: Send + Sync {
    /// Called on each sensor update with the count of steps taken since
    /// `start_updates`. The count is monotonically increasing for the
    /// lifetime of one subscription; update frequency is decided by the
    /// hardware/OS.
    fn on_step_count(&self, steps_since_start: f64);
}

/// A step-counting sensor that can be subscribed and unsubscribed.
///
/// Contract for implementors:
/// - `request_permission` blocks until the user answered the system prompt
///   (or immediately returns the remembered status).
/// - `start_updates` must not invoke the listener synchronously; the first
///   count arrives later from the sensor callback.
/// - `stop_updates` detaches the current listener and is a no-op when no
///   subscription is open.
#[uniffi::export(with_foreign)]
pub trait StepSource: Send + Sync {
    fn request_permission(&self) -> PermissionStatus;
    fn start_updates(&self, listener: Arc<dyn StepListener>);
    fn stop_updates(&self);
}
