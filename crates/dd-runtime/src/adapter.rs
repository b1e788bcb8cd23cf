//! The presentation seam.
//!
//! The engine is headless: everything the player sees goes through a
//! [`Presentation`] implementation injected at construction. All methods
//! have no-op defaults so tests and tools can run with a null adapter.

use dd_core::Content;

/// The contract a presentation layer implements for the engine.
pub trait Presentation {
    /// Render printed content. `is_page_turn` distinguishes a page
    /// replacement from appended content. Returning `false` tells a
    /// stacked adapter that the default append/replace handling was
    /// suppressed in favour of a custom effect.
    fn render_print(&mut self, content: &Content, is_page_turn: bool) -> bool {
        let _ = (content, is_page_turn);
        true
    }

    /// Capture a visual snapshot right before state is saved for undo.
    fn capture_undo_snapshot(&mut self) {}

    /// Restore the visual state captured by the last undo snapshot.
    fn restore_from_undo_snapshot(&mut self) {}

    /// Persist the two serialized snapshot blobs (public story state and
    /// internal story state).
    fn persist_snapshot(&mut self, public_json: &str, model_json: &str) {
        let _ = (public_json, model_json);
    }

    /// True if both persisted blobs exist.
    fn has_persisted_snapshot(&self) -> bool {
        false
    }

    /// Read back the persisted blobs in the same order they were given
    /// to [`Presentation::persist_snapshot`].
    fn load_persisted_snapshot(&mut self) -> Option<(String, String)> {
        None
    }

    /// Enable or disable a rendered link by its id (assigned from the
    /// dotted link-target suffix). Disabling keeps the link inspectable
    /// but not actionable; enabling restores it.
    fn set_link_enabled(&mut self, id: &str, enabled: bool) {
        let _ = (id, enabled);
    }

    /// Irreversibly strip interactivity from everything rendered so far,
    /// including the inventory display. Content stays visible.
    fn end_game(&mut self) {}
}

/// A presentation that does nothing. Useful for tests and for tooling
/// that only needs the state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {}
