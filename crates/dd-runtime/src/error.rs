use dd_dsl::Diagnostic;
use dd_script::ScriptError;

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// The first error diagnostic's message, for the compile-failure display.
fn first_error(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .find(|d| d.is_error())
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Errors surfaced by the runtime state machine.
///
/// Scoped lookups that legitimately miss (an object not on the current
/// page) return `Option`, not an error; these variants cover operations
/// that were explicitly requested against a target that must exist.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The story source did not compile. Carries the full diagnostic list
    /// so a frontend can render it against the source.
    #[error("story failed to compile: {}", first_error(.0))]
    Compile(Vec<Diagnostic>),

    /// A turn was requested to a page that does not exist.
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// An interaction was requested with an object that is not visible in
    /// the current scope.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// A paragraph reveal was requested for an unknown id.
    #[error("paragraph not found: {0}")]
    ParagraphNotFound(String),

    /// The object exists but has no action with the requested id.
    #[error("object `{object}` has no action `{action}`")]
    ActionNotFound {
        /// The object that was interacted with.
        object: String,
        /// The requested action id.
        action: String,
    },

    /// A combination was resolved or cancelled with nothing pending.
    #[error("no combination action is in progress")]
    NoCombinationInProgress,

    /// A combination action cannot resolve against its own object.
    #[error("`{0}` cannot be combined with itself")]
    CombinationWithSelf(String),

    /// An author script (hook, init script, or when-predicate) faulted.
    /// Script faults always propagate; they indicate story bugs.
    #[error("script fault: {0}")]
    Script(#[from] ScriptError),

    /// Scripts kept requesting navigation past the per-operation budget,
    /// which means a hook loop (a page-turn hook turning pages, say).
    #[error("scripts requested more than {0} navigation steps in one operation")]
    DirectiveOverflow(usize),

    /// A snapshot could not be serialized or deserialized.
    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}
