//! Terminal presentation for played stories.
//!
//! Rendering is line-oriented: printed content goes straight to stdout,
//! and every link in it gets a number the player types to activate it. A
//! page turn clears the numbering and starts over; appended content keeps
//! counting. The adapter also owns the on-disk save store and the visual
//! side of undo (the link list travels with the state snapshot).

use std::collections::HashSet;

use colored::Colorize;

use dd_core::content::{Content, Inline, LinkRef};
use dd_runtime::Presentation;

use crate::store::SaveStore;

/// What activating a link does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Turn to a page.
    Turn,
    /// Open an object's action menu.
    Interact,
    /// Reveal a paragraph.
    Show,
}

/// A link in the current display, addressable by its number.
#[derive(Debug, Clone)]
pub struct VisibleLink {
    pub kind: LinkKind,
    pub target: String,
    pub label: String,
    /// Explicit element id from the dotted link suffix, if any.
    pub id: Option<String>,
}

/// The terminal adapter behind the play loop.
pub struct TerminalPresentation {
    links: Vec<VisibleLink>,
    undo_links: Vec<VisibleLink>,
    disabled: HashSet<String>,
    ended: bool,
    store: SaveStore,
}

impl TerminalPresentation {
    pub fn new(store: SaveStore) -> Self {
        Self {
            links: Vec::new(),
            undo_links: Vec::new(),
            disabled: HashSet::new(),
            ended: false,
            store,
        }
    }

    /// The link shown with `number`, counted from 1.
    pub fn link(&self, number: usize) -> Option<&VisibleLink> {
        number.checked_sub(1).and_then(|i| self.links.get(i))
    }

    /// True if the link still reacts to activation. After the story ends
    /// nothing does; before that, only links disabled by id are inert.
    pub fn is_enabled(&self, link: &VisibleLink) -> bool {
        if self.ended {
            return false;
        }
        link.id.as_ref().is_none_or(|id| !self.disabled.contains(id))
    }

    fn render_link(&mut self, kind: LinkKind, link: &LinkRef) {
        // Inert links keep their text but lose the number.
        let inert = self.ended
            || link
                .id
                .as_ref()
                .is_some_and(|id| self.disabled.contains(id));
        if inert {
            print!("{}", link.label);
            return;
        }

        self.links.push(VisibleLink {
            kind,
            target: link.target.clone(),
            label: link.label.clone(),
            id: link.id.clone(),
        });
        let number = self.links.len();

        let label = match kind {
            LinkKind::Turn => link.label.cyan(),
            LinkKind::Interact => link.label.yellow(),
            LinkKind::Show => link.label.green(),
        };
        print!("{}{}", label.underline(), format!("[{number}]").dimmed());
    }
}

impl Presentation for TerminalPresentation {
    fn render_print(&mut self, content: &Content, is_page_turn: bool) -> bool {
        if is_page_turn {
            self.links.clear();
            println!();
            println!("{}", "─".repeat(60).dimmed());
        }

        for node in content {
            match node {
                Inline::Text(text) => print!("{text}"),
                Inline::Turn(link) => self.render_link(LinkKind::Turn, link),
                Inline::Interact(link) => self.render_link(LinkKind::Interact, link),
                Inline::Show(link) => self.render_link(LinkKind::Show, link),
            }
        }
        println!();
        true
    }

    fn capture_undo_snapshot(&mut self) {
        self.undo_links = self.links.clone();
    }

    fn restore_from_undo_snapshot(&mut self) {
        self.links = self.undo_links.clone();
    }

    fn persist_snapshot(&mut self, public_json: &str, model_json: &str) {
        if let Err(e) = self.store.write(public_json, model_json) {
            eprintln!("save failed: {e}");
        }
    }

    fn has_persisted_snapshot(&self) -> bool {
        self.store.exists()
    }

    fn load_persisted_snapshot(&mut self) -> Option<(String, String)> {
        self.store.read()
    }

    fn set_link_enabled(&mut self, id: &str, enabled: bool) {
        if enabled {
            self.disabled.remove(id);
        } else {
            self.disabled.insert(id.to_string());
        }
    }

    fn end_game(&mut self) {
        self.ended = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dd_core::content::LinkRef;
    use tempfile::TempDir;

    fn presentation(dir: &TempDir) -> TerminalPresentation {
        TerminalPresentation::new(SaveStore::new(dir.path().join("t.save.json")))
    }

    fn sample_content() -> Content {
        let mut content = Content::new();
        content.push_text("Go ");
        content.push(Inline::Turn(LinkRef::new("cellar", "down")));
        content.push_text(" or sniff ");
        content.push(Inline::Show(LinkRef::new("smell", "the air")));
        content
    }

    #[test]
    fn links_are_numbered_in_render_order() {
        let dir = TempDir::new().unwrap();
        let mut p = presentation(&dir);
        p.render_print(&sample_content(), true);

        assert_eq!(p.link(1).unwrap().target, "cellar");
        assert_eq!(p.link(1).unwrap().kind, LinkKind::Turn);
        assert_eq!(p.link(2).unwrap().target, "smell");
        assert!(p.link(3).is_none());
        assert!(p.link(0).is_none());
    }

    #[test]
    fn page_turn_restarts_numbering_but_append_continues() {
        let dir = TempDir::new().unwrap();
        let mut p = presentation(&dir);
        p.render_print(&sample_content(), true);
        p.render_print(&sample_content(), false);
        assert_eq!(p.links.len(), 4);

        p.render_print(&sample_content(), true);
        assert_eq!(p.links.len(), 2);
    }

    #[test]
    fn disable_by_id_makes_a_link_inert() {
        let dir = TempDir::new().unwrap();
        let mut p = presentation(&dir);
        let mut content = Content::new();
        let mut link = LinkRef::new("cellar", "down");
        link.id = Some("cellarLink".into());
        content.push(Inline::Turn(link));
        p.render_print(&content, true);

        let shown = p.link(1).unwrap().clone();
        assert!(p.is_enabled(&shown));

        p.set_link_enabled("cellarLink", false);
        assert!(!p.is_enabled(&shown));

        p.set_link_enabled("cellarLink", true);
        assert!(p.is_enabled(&shown));
    }

    #[test]
    fn end_game_disables_everything() {
        let dir = TempDir::new().unwrap();
        let mut p = presentation(&dir);
        p.render_print(&sample_content(), true);

        p.end_game();
        let shown = p.link(1).unwrap().clone();
        assert!(!p.is_enabled(&shown));
        // Content stays inspectable.
        assert_eq!(p.link(1).unwrap().label, "down");
    }

    #[test]
    fn undo_snapshot_restores_the_link_list() {
        let dir = TempDir::new().unwrap();
        let mut p = presentation(&dir);
        p.render_print(&sample_content(), true);
        p.capture_undo_snapshot();

        let mut more = Content::new();
        more.push(Inline::Interact(LinkRef::new("lamp", "the lamp")));
        p.render_print(&more, false);
        assert_eq!(p.links.len(), 3);

        p.restore_from_undo_snapshot();
        assert_eq!(p.links.len(), 2);
    }

    #[test]
    fn snapshots_persist_through_the_store() {
        let dir = TempDir::new().unwrap();
        let mut p = presentation(&dir);

        assert!(!p.has_persisted_snapshot());
        p.persist_snapshot("{}", "{}");
        assert!(p.has_persisted_snapshot());
        assert_eq!(
            p.load_persisted_snapshot(),
            Some(("{}".to_string(), "{}".to_string()))
        );
    }
}
