use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::content::Content;
use crate::document::{EntityKind, HookKind};

/// A combination clause on a runtime action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    /// Id of the partner object.
    pub partner: String,
    /// Content printed when the action resolves against the partner.
    pub content: Content,
}

/// A runtime action: id, availability predicate, content, combinations.
///
/// The predicate is kept as script source and evaluated by the sandbox at
/// query time; `None` means the action is always active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Action id, shown as the menu entry.
    pub id: String,
    /// Availability predicate source; `None` means always active.
    pub when: Option<String>,
    /// Default content.
    pub content: Content,
    /// Combination clauses in authoring order.
    pub combinations: Vec<Combination>,
}

impl ActionDef {
    /// True if this action needs a second target to resolve.
    pub fn has_combinations(&self) -> bool {
        !self.combinations.is_empty()
    }

    /// The partner-specific content for `partner`, if a clause exists.
    pub fn combination(&self, partner: &str) -> Option<&Content> {
        self.combinations
            .iter()
            .find(|c| c.partner == partner)
            .map(|c| &c.content)
    }
}

/// A runtime object or character with its actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryObject {
    /// Entity id.
    pub id: String,
    /// Object or character.
    pub kind: EntityKind,
    /// Name shown in the inventory display.
    pub inventory_name: Option<String>,
    /// Optional class for presentation hooks.
    pub class: Option<String>,
    /// Actions in authoring order.
    pub actions: Vec<ActionDef>,
}

impl StoryObject {
    /// Look up an action by id.
    pub fn action(&self, id: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.id == id)
    }
}

/// An addressable content fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Paragraph id.
    pub id: String,
    /// Optional class for presentation hooks.
    pub class: Option<String>,
    /// Paragraph body.
    pub content: Content,
}

/// A runtime page with its page-scoped children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page id.
    pub id: String,
    /// Optional class list.
    pub class: Option<String>,
    /// True if this page carries the first-page marker.
    pub is_first: bool,
    /// Page body.
    pub content: Content,
    /// Objects visible only while this page is current.
    pub objects: HashMap<String, StoryObject>,
    /// Paragraphs visible only while this page is current.
    pub paragraphs: HashMap<String, Paragraph>,
}

/// The six lifecycle hook bodies. An empty string means the hook was not
/// declared and is skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hooks {
    /// Runs before every print.
    pub before_every_thing: String,
    /// Runs before every page turn.
    pub before_every_page_turn: String,
    /// Runs before every paragraph shown.
    pub before_every_paragraph_shown: String,
    /// Runs after every print.
    pub after_every_thing: String,
    /// Runs after every page turn.
    pub after_every_page_turn: String,
    /// Runs after every paragraph shown.
    pub after_every_paragraph_shown: String,
}

impl Hooks {
    /// The body for `kind` (empty if the hook was not declared).
    pub fn body(&self, kind: HookKind) -> &str {
        match kind {
            HookKind::BeforeEveryThing => &self.before_every_thing,
            HookKind::BeforeEveryPageTurn => &self.before_every_page_turn,
            HookKind::BeforeEveryParagraphShown => &self.before_every_paragraph_shown,
            HookKind::AfterEveryThing => &self.after_every_thing,
            HookKind::AfterEveryPageTurn => &self.after_every_page_turn,
            HookKind::AfterEveryParagraphShown => &self.after_every_paragraph_shown,
        }
    }

    /// Set the body for `kind`.
    pub fn set_body(&mut self, kind: HookKind, body: impl Into<String>) {
        let slot = match kind {
            HookKind::BeforeEveryThing => &mut self.before_every_thing,
            HookKind::BeforeEveryPageTurn => &mut self.before_every_page_turn,
            HookKind::BeforeEveryParagraphShown => &mut self.before_every_paragraph_shown,
            HookKind::AfterEveryThing => &mut self.after_every_thing,
            HookKind::AfterEveryPageTurn => &mut self.after_every_page_turn,
            HookKind::AfterEveryParagraphShown => &mut self.after_every_paragraph_shown,
        };
        *slot = body.into();
    }
}

/// Progress counters maintained by the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Paragraphs shown since the story started.
    pub paragraphs_shown: u32,
    /// Pages turned since the story started.
    pub pages_turned: u32,
    /// Paragraphs shown since the last page turn.
    pub paragraphs_shown_in_page: u32,
    /// Prints of any kind since the story started.
    pub total_actions: u32,
    /// Prints of any kind since the last page turn.
    pub actions_performed_in_page: u32,
}

impl Counters {
    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Counters::default();
    }
}

/// The runtime story state, owned exclusively by the engine.
///
/// Built by the loader, mutated by every print/turn/show/inventory
/// operation, and replaced wholesale on undo, restore, and reset. Contains
/// no function-valued fields, so snapshots are plain structural copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryModel {
    /// Id of the current page (empty until the loader resolves the first
    /// page).
    pub current_page: String,
    /// Story title.
    pub title: String,
    /// Introductory content shown once at startup.
    pub intro: Content,
    /// Carried object ids, ordered, duplicate-free.
    pub inventory: Vec<String>,
    /// All pages by id.
    pub pages: HashMap<String, Page>,
    /// Top-level paragraphs by id.
    pub paragraphs: HashMap<String, Paragraph>,
    /// Top-level objects and characters by id.
    pub objects: HashMap<String, StoryObject>,
    /// Initialization script body.
    pub initialization: String,
    /// Lifecycle hook bodies.
    pub hooks: Hooks,
    /// Progress counters.
    pub counters: Counters,
    /// True while a combination action awaits its second target.
    pub combination_action_in_progress: bool,
}

impl StoryModel {
    /// Look up a page by id.
    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.get(id)
    }

    /// The current page, if the id resolves.
    pub fn current(&self) -> Option<&Page> {
        self.pages.get(&self.current_page)
    }

    /// Look up an object, preferring one scoped to the current page over a
    /// top-level one of the same id.
    pub fn object(&self, id: &str) -> Option<&StoryObject> {
        self.current()
            .and_then(|page| page.objects.get(id))
            .or_else(|| self.objects.get(id))
    }

    /// Look up a paragraph, preferring one scoped to the current page over
    /// a top-level one of the same id.
    pub fn paragraph(&self, id: &str) -> Option<&Paragraph> {
        self.current()
            .and_then(|page| page.paragraphs.get(id))
            .or_else(|| self.paragraphs.get(id))
    }

    /// Id of the page carrying the first-page marker.
    pub fn first_page_id(&self) -> Option<&str> {
        self.pages
            .values()
            .find(|p| p.is_first)
            .map(|p| p.id.as_str())
    }

    /// True if `id` is currently carried.
    pub fn is_in_inventory(&self, id: &str) -> bool {
        self.inventory.iter().any(|item| item == id)
    }

    /// Add `id` to the inventory. Any existing occurrence is removed
    /// first, so picking an item up again moves it to the end.
    pub fn put_in_inventory(&mut self, id: &str) {
        self.remove_from_inventory(id);
        self.inventory.push(id.to_string());
    }

    /// Remove `id` from the inventory, if present.
    pub fn remove_from_inventory(&mut self, id: &str) {
        self.inventory.retain(|item| item != id);
    }
}
