//! The public story facade handed to author scripts.

use std::collections::HashMap;

use dd_core::StoryModel;
use dd_script::{StoryApi, Value};
use serde::{Deserialize, Serialize};

use crate::pubsub::{INVENTORY_CHANGED, INVENTORY_CHANNEL, MessageCenter};

/// The player-visible story state that exists outside the model: the
/// author's script variables. Snapshotted alongside the model for undo
/// and save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicState {
    /// Author variables, `story.<name>`.
    pub vars: HashMap<String, Value>,
}

/// A navigation or presentation request issued by a script.
///
/// Scripts run in the middle of engine operations, so their requests are
/// queued and drained once the current operation completes instead of
/// re-entering the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Turn to a page.
    TurnTo(String),
    /// Show a paragraph.
    ShowParagraph(String),
    /// Disable a rendered link.
    Disable(String),
    /// Re-enable a rendered link.
    Enable(String),
    /// End the story.
    EndGame,
}

/// The capability-restricted view over the running story that scripts
/// operate on.
///
/// A fresh facade is built for every script invocation, borrowing the
/// engine's state for the duration of the call: scripts can never retain
/// a handle across a reset or restore.
pub struct PublicStory<'a> {
    model: &'a mut StoryModel,
    state: &'a mut PublicState,
    events: &'a mut MessageCenter,
    directives: &'a mut Vec<Directive>,
}

impl<'a> PublicStory<'a> {
    /// Bind a facade over the engine's state.
    pub fn new(
        model: &'a mut StoryModel,
        state: &'a mut PublicState,
        events: &'a mut MessageCenter,
        directives: &'a mut Vec<Directive>,
    ) -> Self {
        Self {
            model,
            state,
            events,
            directives,
        }
    }
}

impl StoryApi for PublicStory<'_> {
    fn current_page_is(&self, id: &str) -> bool {
        self.model.current_page == id
    }

    fn is_in_inventory(&self, id: &str) -> bool {
        self.model.is_in_inventory(id)
    }

    fn num_total_actions(&self) -> i64 {
        i64::from(self.model.counters.total_actions)
    }

    fn num_actions_performed_in_page(&self) -> i64 {
        i64::from(self.model.counters.actions_performed_in_page)
    }

    fn num_pages_turned(&self) -> i64 {
        i64::from(self.model.counters.pages_turned)
    }

    fn num_paragraphs_shown(&self) -> i64 {
        i64::from(self.model.counters.paragraphs_shown)
    }

    fn num_paragraphs_shown_in_page(&self) -> i64 {
        i64::from(self.model.counters.paragraphs_shown_in_page)
    }

    fn get_var(&self, name: &str) -> Value {
        self.state.vars.get(name).cloned().unwrap_or(Value::Null)
    }

    fn set_var(&mut self, name: &str, value: Value) {
        self.state.vars.insert(name.to_string(), value);
    }

    fn put_in_inventory(&mut self, id: &str) {
        self.model.put_in_inventory(id);
        self.events.publish(INVENTORY_CHANNEL, INVENTORY_CHANGED);
    }

    fn remove_from_inventory(&mut self, id: &str) {
        self.model.remove_from_inventory(id);
        self.events.publish(INVENTORY_CHANNEL, INVENTORY_CHANGED);
    }

    fn turn_to(&mut self, id: &str) {
        self.directives.push(Directive::TurnTo(id.to_string()));
    }

    fn show_paragraph(&mut self, id: &str) {
        self.directives.push(Directive::ShowParagraph(id.to_string()));
    }

    fn disable(&mut self, id: &str) {
        self.directives.push(Directive::Disable(id.to_string()));
    }

    fn enable(&mut self, id: &str) {
        self.directives.push(Directive::Enable(id.to_string()));
    }

    fn end_game(&mut self) {
        self.directives.push(Directive::EndGame);
    }
}
