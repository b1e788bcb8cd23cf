//! Runtime state machine for Dedalus stories.
//!
//! The [`Engine`] owns a compiled story and executes player interactions
//! against it: page turns, paragraph reveals, object actions with
//! combination partners, inventory mutation, one-level undo, and
//! save/restore. Everything the player sees flows through an injected
//! [`Presentation`] adapter, and author scripts run inside an injected
//! [`ScriptSandbox`] with the [`PublicStory`] facade as their whole
//! world, so the engine itself stays headless and deterministic.

/// The presentation adapter seam.
pub mod adapter;
/// The runtime state machine.
pub mod engine;
/// Engine error types.
pub mod error;
/// The script-facing story facade and public state.
pub mod public;
/// The publish/subscribe channel for model-change events.
pub mod pubsub;
/// The script sandbox seam.
pub mod sandbox;
/// Undo and save/restore snapshots.
pub mod snapshot;

/// Re-export the adapter seam.
pub use adapter::{NullPresentation, Presentation};
/// Re-export the engine.
pub use engine::{ActionOutcome, Engine};
/// Re-export error types.
pub use error::{EngineError, EngineResult};
/// Re-export the facade types.
pub use public::{Directive, PublicState, PublicStory};
/// Re-export the message center.
pub use pubsub::{INVENTORY_CHANGED, INVENTORY_CHANNEL, MessageCenter};
/// Re-export the sandbox seam.
pub use sandbox::{DedScript, ScriptSandbox};
/// Re-export snapshot types.
pub use snapshot::{MODEL_KEY, PUBLIC_KEY, Snapshot, merge_values};
