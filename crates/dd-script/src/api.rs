use serde::{Deserialize, Serialize};
use std::fmt;

/// A script value.
///
/// Serialized untagged so that author variables land in snapshots as
/// plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absent value; reading a variable that was never set yields it.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A string.
    Str(String),
}

impl Value {
    /// The value's type name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// The capability surface scripts run against.
///
/// Everything a script can observe or do goes through this trait; the
/// host passes a fresh binding for every script invocation, so scripts
/// can never retain a stale handle across a reset or restore.
///
/// Navigation requests (`turn_to`, `show_paragraph`, and the
/// link-enablement and end-game calls) are requests, not immediate
/// actions: the host is free to defer them until the current operation
/// completes.
pub trait StoryApi {
    /// True if the current page has the given id.
    fn current_page_is(&self, id: &str) -> bool;
    /// True if the object is currently carried.
    fn is_in_inventory(&self, id: &str) -> bool;
    /// Prints of any kind since the story started.
    fn num_total_actions(&self) -> i64;
    /// Prints of any kind since the last page turn.
    fn num_actions_performed_in_page(&self) -> i64;
    /// Pages turned since the story started.
    fn num_pages_turned(&self) -> i64;
    /// Paragraphs shown since the story started.
    fn num_paragraphs_shown(&self) -> i64;
    /// Paragraphs shown since the last page turn.
    fn num_paragraphs_shown_in_page(&self) -> i64;
    /// Read an author variable; [`Value::Null`] if never set.
    fn get_var(&self, name: &str) -> Value;
    /// Write an author variable.
    fn set_var(&mut self, name: &str, value: Value);
    /// Add an object to the inventory.
    fn put_in_inventory(&mut self, id: &str);
    /// Remove an object from the inventory.
    fn remove_from_inventory(&mut self, id: &str);
    /// Request a turn to the given page.
    fn turn_to(&mut self, id: &str);
    /// Request that a paragraph be shown.
    fn show_paragraph(&mut self, id: &str);
    /// Request that a rendered link be disabled.
    fn disable(&mut self, id: &str);
    /// Request that a previously disabled link be re-enabled.
    fn enable(&mut self, id: &str);
    /// Request that the story end.
    fn end_game(&mut self);
}
