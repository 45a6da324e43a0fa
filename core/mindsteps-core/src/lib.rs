//! # mindsteps-core
//!
//! Core library for MindSteps, providing the walk-session logic shared by
//! all clients (iOS, Android, any future desktop shell).
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients can wrap with async if needed.
//! - **Engine-owned state**: The active walk session has exactly one writer,
//!   [`SessionEngine`]; the UI polls [`SessionEngine::snapshot`].
//! - **Thin platform seams**: The step sensor is implemented by the platform
//!   shell behind the [`StepSource`] trait; the backend is a remote REST
//!   collaborator behind [`SessionBackend`].
//! - **FFI-ready**: UniFFI annotations enable Swift and Kotlin bindings.
//!   Prefer additive public API changes; removing or renaming breaks FFI clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mindsteps_core::SessionEngine;
//!
//! let engine = SessionEngine::new("https://api.example.com".into(), step_source)?;
//! engine.start()?;
//! let snapshot = engine.snapshot();
//! let outcome = engine.stop_and_save(Answer::Bra);
//! ```

// UniFFI scaffolding for Swift/Kotlin bindings
uniffi::setup_scaffolding!();

// Public modules
pub mod backend;
pub mod clock;
pub mod engine;
pub mod error;
pub mod history;
pub mod identity;
pub mod sensor;
pub mod storage;
pub mod ticker;
pub mod types;

// Re-export commonly used items at crate root
pub use backend::{BackendError, HttpSessionBackend, SessionBackend};
pub use clock::{Clock, SystemClock};
pub use engine::{SessionEngine, StartError};
pub use error::{MindError, MindFfiError, Result};
pub use history::{load_history, Mood, WalkEntry};
pub use identity::get_or_init_device_id;
pub use sensor::{PermissionStatus, StepListener, StepSource};
pub use storage::StorageConfig;
pub use ticker::{ThreadTicker, Ticker, TickerHandle};
pub use types::{Answer, SaveOutcome, SessionSnapshot, WalkSummary};
