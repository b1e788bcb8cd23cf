//! Sandboxed script interpreter for Dedalus stories.
//!
//! Author scripts — when-predicates, lifecycle hooks, and init scripts —
//! run in a tiny interpreted language whose entire world is the
//! [`StoryApi`] trait. The host decides what the trait exposes; scripts
//! have no other capability. A typical predicate:
//!
//! ```text
//! !story.isInInventory('lamp') && story.getNumPagesTurned() > 2
//! ```
//!
//! and a typical hook body:
//!
//! ```text
//! story.visits += 1
//! if (story.currentPageIs('cellar')) { story.showParagraph('chill') }
//! ```

/// The capability surface exposed to scripts, and script values.
pub mod api;
/// The script AST.
pub mod ast;
/// Script error types.
pub mod error;
/// The tree-walking evaluator.
pub mod eval;
/// The script lexer.
pub mod lexer;
/// The script parser.
pub mod parser;

pub use api::{StoryApi, Value};
pub use error::ScriptError;
pub use eval::{eval_predicate, run_script};
