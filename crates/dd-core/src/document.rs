use serde::{Deserialize, Serialize};

use crate::content::Content;

/// Whether an interactable entity is an object or a character.
///
/// The two behave identically at runtime; the distinction exists so that
/// authors and presentation layers can treat them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// An inanimate object.
    Object,
    /// A character.
    Character,
}

/// The six lifecycle hooks that run around runtime operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Runs before every print, of any kind.
    BeforeEveryThing,
    /// Runs before every page turn.
    BeforeEveryPageTurn,
    /// Runs before every paragraph is shown.
    BeforeEveryParagraphShown,
    /// Runs after every print, of any kind.
    AfterEveryThing,
    /// Runs after every page turn.
    AfterEveryPageTurn,
    /// Runs after every paragraph is shown.
    AfterEveryParagraphShown,
}

impl HookKind {
    /// All hook kinds, in declaration order.
    pub const ALL: [HookKind; 6] = [
        HookKind::BeforeEveryThing,
        HookKind::BeforeEveryPageTurn,
        HookKind::BeforeEveryParagraphShown,
        HookKind::AfterEveryThing,
        HookKind::AfterEveryPageTurn,
        HookKind::AfterEveryParagraphShown,
    ];

    /// The markup tag (and dedlee keyword) naming this hook.
    pub fn tag_name(self) -> &'static str {
        match self {
            HookKind::BeforeEveryThing => "beforeEveryThing",
            HookKind::BeforeEveryPageTurn => "beforeEveryPageTurn",
            HookKind::BeforeEveryParagraphShown => "beforeEveryParagraphShown",
            HookKind::AfterEveryThing => "afterEveryThing",
            HookKind::AfterEveryPageTurn => "afterEveryPageTurn",
            HookKind::AfterEveryParagraphShown => "afterEveryParagraphShown",
        }
    }

    /// Parse a markup tag name back into a hook kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag_name() == tag)
    }
}

/// A combination clause: alternative action content used when the action
/// is resolved against a specific partner object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationNode {
    /// Id of the partner object this clause applies to.
    pub partner: String,
    /// Content printed when the action resolves against the partner.
    pub content: Content,
}

/// A named action an object or character exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
    /// Action id, shown as the menu entry.
    pub id: String,
    /// Predicate source gating availability; `None` means always active.
    pub when: Option<String>,
    /// Content printed when the action runs without a combination.
    pub content: Content,
    /// Combination clauses, one per partner object.
    pub combinations: Vec<CombinationNode>,
}

/// An object or character declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectNode {
    /// Object or character.
    pub kind: EntityKind,
    /// Entity id.
    pub id: String,
    /// Name shown in the inventory display, if the entity can be carried.
    pub inventory_name: Option<String>,
    /// Optional class for presentation hooks.
    pub class: Option<String>,
    /// Actions in authoring order.
    pub actions: Vec<ActionNode>,
}

/// An addressable content fragment shown without changing the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphNode {
    /// Paragraph id.
    pub id: String,
    /// Optional class for presentation hooks.
    pub class: Option<String>,
    /// Paragraph body.
    pub content: Content,
}

/// A navigable page and its page-scoped children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    /// Page id.
    pub id: String,
    /// Optional class list (space separated, as authored).
    pub class: Option<String>,
    /// Page body, after child elements are extracted.
    pub content: Content,
    /// Objects and characters visible only while this page is current.
    pub objects: Vec<ObjectNode>,
    /// Paragraphs visible only while this page is current.
    pub paragraphs: Vec<ParagraphNode>,
}

impl PageNode {
    /// True if the class list contains `name`.
    pub fn has_class(&self, name: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == name))
    }

    /// True if this page carries the first-page marker.
    pub fn is_first(&self) -> bool {
        self.has_class("first")
    }
}

/// The structured document tree a story parses into.
///
/// Produced by the markup parser (from hand-authored markup or from
/// dedlee output); consumed by the loader, which extracts the runtime
/// [`StoryModel`](crate::model::StoryModel) from it. The tree itself is
/// transient — the runtime keeps the original source text instead, so the
/// pipeline can be re-run on reset and restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryDocument {
    /// Story title, if declared.
    pub title: Option<String>,
    /// Initialization script body, run once at startup.
    pub init_script: Option<String>,
    /// Lifecycle hook bodies, indexed parallel to [`HookKind::ALL`].
    pub hooks: [Option<String>; 6],
    /// Top-level objects and characters.
    pub objects: Vec<ObjectNode>,
    /// Top-level paragraphs.
    pub paragraphs: Vec<ParagraphNode>,
    /// Pages.
    pub pages: Vec<PageNode>,
}

impl StoryDocument {
    /// The body of a lifecycle hook, if declared.
    pub fn hook(&self, kind: HookKind) -> Option<&str> {
        let index = HookKind::ALL.iter().position(|k| *k == kind)?;
        self.hooks[index].as_deref()
    }

    /// Set the body of a lifecycle hook.
    pub fn set_hook(&mut self, kind: HookKind, body: impl Into<String>) {
        if let Some(index) = HookKind::ALL.iter().position(|k| *k == kind) {
            self.hooks[index] = Some(body.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_tags_round_trip() {
        for kind in HookKind::ALL {
            assert_eq!(HookKind::from_tag(kind.tag_name()), Some(kind));
        }
        assert_eq!(HookKind::from_tag("beforeNothing"), None);
    }

    #[test]
    fn hooks_set_and_get() {
        let mut doc = StoryDocument::default();
        assert_eq!(doc.hook(HookKind::AfterEveryPageTurn), None);

        doc.set_hook(HookKind::AfterEveryPageTurn, "story.pageFlag = true");
        assert_eq!(
            doc.hook(HookKind::AfterEveryPageTurn),
            Some("story.pageFlag = true")
        );
        assert_eq!(doc.hook(HookKind::BeforeEveryPageTurn), None);
    }

    #[test]
    fn first_page_marker_is_a_class() {
        let page = PageNode {
            id: "start".into(),
            class: Some("first dark".into()),
            content: Content::new(),
            objects: vec![],
            paragraphs: vec![],
        };
        assert!(page.is_first());
        assert!(page.has_class("dark"));
        assert!(!page.has_class("firs"));
    }
}
