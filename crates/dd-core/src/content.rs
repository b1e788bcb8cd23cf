use serde::{Deserialize, Serialize};

/// A cross-reference produced by a turn/interact/show link.
///
/// The optional `id` and `class` come from the dotted suffix of the link
/// target (`[[page.linkId.linkClass]]…`): they make an individual link
/// addressable (for disable/enable) and styleable independently of the
/// entity it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    /// Id of the page, object, or paragraph the link points at.
    pub target: String,
    /// Text presented to the player.
    pub label: String,
    /// Optional element id, distinct from the target id.
    pub id: Option<String>,
    /// Optional class for presentation hooks.
    pub class: Option<String>,
}

impl LinkRef {
    /// Create a plain reference with no id/class suffix.
    pub fn new(target: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            label: label.into(),
            id: None,
            class: None,
        }
    }
}

/// One node of renderable content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inline {
    /// Plain narrative text.
    Text(String),
    /// A link that turns to another page.
    Turn(LinkRef),
    /// A link that opens the interaction menu for an object or character.
    Interact(LinkRef),
    /// A link that reveals a paragraph in place.
    Show(LinkRef),
}

/// An ordered sequence of inline nodes: the body of a page, paragraph,
/// action, or combination clause.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content(pub Vec<Inline>);

impl Content {
    /// Create empty content.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content consisting of a single text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self(vec![Inline::Text(text.into())])
    }

    /// True if there are no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a text node, merging with a trailing text node if present.
    pub fn push_text(&mut self, text: impl AsRef<str>) {
        if let Some(Inline::Text(last)) = self.0.last_mut() {
            last.push_str(text.as_ref());
        } else {
            self.0.push(Inline::Text(text.as_ref().to_string()));
        }
    }

    /// Append an inline node.
    pub fn push(&mut self, node: Inline) {
        self.0.push(node);
    }

    /// Iterate over the inline nodes.
    pub fn iter(&self) -> std::slice::Iter<'_, Inline> {
        self.0.iter()
    }

    /// All human-visible text: text nodes and link labels, concatenated.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.0 {
            match node {
                Inline::Text(t) => out.push_str(t),
                Inline::Turn(l) | Inline::Interact(l) | Inline::Show(l) => out.push_str(&l.label),
            }
        }
        out
    }

    /// Targets of every interact link, in order of appearance.
    pub fn interact_targets(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter_map(|node| match node {
                Inline::Interact(l) => Some(l.target.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Content {
    type Item = &'a Inline;
    type IntoIter = std::slice::Iter<'a, Inline>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
