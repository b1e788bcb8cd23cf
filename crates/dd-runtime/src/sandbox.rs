//! The script sandbox seam.
//!
//! Author scripts only ever see the [`StoryApi`] capability surface; the
//! engine is generic over the sandbox so tests can substitute recording
//! or failing implementations.

use dd_script::{ScriptError, StoryApi};

/// Executes author scripts against a story binding.
pub trait ScriptSandbox {
    /// Run a script body (init script or lifecycle hook) for its effects.
    fn run(&self, source: &str, story: &mut dyn StoryApi) -> Result<(), ScriptError>;

    /// Evaluate a when-predicate to a boolean.
    fn eval_predicate(&self, source: &str, story: &mut dyn StoryApi) -> Result<bool, ScriptError>;
}

/// The default sandbox, backed by the dd-script interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DedScript;

impl ScriptSandbox for DedScript {
    fn run(&self, source: &str, story: &mut dyn StoryApi) -> Result<(), ScriptError> {
        dd_script::run_script(source, story)
    }

    fn eval_predicate(&self, source: &str, story: &mut dyn StoryApi) -> Result<bool, ScriptError> {
        dd_script::eval_predicate(source, story)
    }
}
