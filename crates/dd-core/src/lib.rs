//! Core types for Dedalus: story documents, the runtime story model, and
//! content trees.
//!
//! This crate defines the data the compiler pipeline produces and the
//! runtime mutates. It is independent of any parser — a [`StoryDocument`]
//! can be built programmatically, and a [`StoryModel`] can be deserialized
//! straight from a snapshot.

/// Inline content nodes and cross-reference links.
pub mod content;
/// The structured document tree produced by parsing.
pub mod document;
/// The runtime story model owned by the engine.
pub mod model;

/// Re-export content types.
pub use content::{Content, Inline, LinkRef};
/// Re-export document tree types.
pub use document::{
    ActionNode, CombinationNode, EntityKind, HookKind, ObjectNode, PageNode, ParagraphNode,
    StoryDocument,
};
/// Re-export story model types.
pub use model::{ActionDef, Combination, Counters, Hooks, Page, Paragraph, StoryModel, StoryObject};

/// Reserved id of the introductory page. Its content is shown once at
/// startup and turning to it never changes the current page.
pub const INTRO_PAGE: &str = "intro";

/// Title used when a story does not declare one.
pub const DEFAULT_TITLE: &str = "A Dedalus Story";
