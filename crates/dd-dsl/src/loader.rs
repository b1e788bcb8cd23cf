//! The story loader: walks a parsed [`StoryDocument`] and builds the
//! runtime [`StoryModel`].
//!
//! Loading borrows the document and never consumes it, so the pipeline
//! can be re-run as often as needed — the runtime re-parses the preserved
//! source on every reset and restore.

use std::collections::HashMap;

use dd_core::document::{HookKind, ObjectNode, PageNode, ParagraphNode, StoryDocument};
use dd_core::model::{ActionDef, Combination, Page, Paragraph, StoryModel, StoryObject};
use dd_core::{DEFAULT_TITLE, INTRO_PAGE};

use crate::diagnostics::Diagnostic;

/// Build a [`StoryModel`] from a document.
///
/// Always returns a model; problems are reported as diagnostics. A
/// missing first page is an error (the model is left without a current
/// page); duplicate ids within a scope are warnings, with the last
/// definition winning.
pub fn load(doc: &StoryDocument) -> (StoryModel, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let mut model = StoryModel {
        title: doc
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        initialization: doc.init_script.clone().unwrap_or_default(),
        ..Default::default()
    };

    for kind in HookKind::ALL {
        if let Some(body) = doc.hook(kind) {
            model.hooks.set_body(kind, body);
        }
    }

    model.objects = collect_objects(&doc.objects, "top level", &mut diagnostics);
    model.paragraphs = collect_paragraphs(&doc.paragraphs, "top level", &mut diagnostics);

    for page_node in &doc.pages {
        let page = load_page(page_node, &mut diagnostics);
        if model.pages.insert(page_node.id.clone(), page).is_some() {
            diagnostics.push(Diagnostic::warning(
                0..0,
                format!(
                    "duplicate page id `{}` (the last definition wins)",
                    page_node.id
                ),
            ));
        }
    }

    if let Some(intro) = model.pages.get(INTRO_PAGE) {
        model.intro = intro.content.clone();
    }

    let mut first_pages = doc.pages.iter().filter(|p| p.is_first());
    match first_pages.next() {
        Some(first) => {
            model.current_page = first.id.clone();
            if first_pages.next().is_some() {
                diagnostics.push(Diagnostic::warning(
                    0..0,
                    "more than one page is marked as first (the first one wins)",
                ));
            }
        }
        None => diagnostics.push(Diagnostic::error(0..0, "no page is marked as first")),
    }

    (model, diagnostics)
}

fn load_page(node: &PageNode, diagnostics: &mut Vec<Diagnostic>) -> Page {
    let scope = format!("page `{}`", node.id);
    Page {
        id: node.id.clone(),
        class: node.class.clone(),
        is_first: node.is_first(),
        content: node.content.clone(),
        objects: collect_objects(&node.objects, &scope, diagnostics),
        paragraphs: collect_paragraphs(&node.paragraphs, &scope, diagnostics),
    }
}

fn collect_objects(
    nodes: &[ObjectNode],
    scope: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> HashMap<String, StoryObject> {
    let mut objects = HashMap::new();
    for node in nodes {
        let object = StoryObject {
            id: node.id.clone(),
            kind: node.kind,
            inventory_name: node.inventory_name.clone(),
            class: node.class.clone(),
            actions: node
                .actions
                .iter()
                .map(|action| ActionDef {
                    id: action.id.clone(),
                    when: action.when.clone(),
                    content: action.content.clone(),
                    combinations: action
                        .combinations
                        .iter()
                        .map(|combo| Combination {
                            partner: combo.partner.clone(),
                            content: combo.content.clone(),
                        })
                        .collect(),
                })
                .collect(),
        };
        if objects.insert(node.id.clone(), object).is_some() {
            diagnostics.push(Diagnostic::warning(
                0..0,
                format!(
                    "duplicate object id `{}` at {scope} (the last definition wins)",
                    node.id
                ),
            ));
        }
    }
    objects
}

fn collect_paragraphs(
    nodes: &[ParagraphNode],
    scope: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> HashMap<String, Paragraph> {
    let mut paragraphs = HashMap::new();
    for node in nodes {
        let paragraph = Paragraph {
            id: node.id.clone(),
            class: node.class.clone(),
            content: node.content.clone(),
        };
        if paragraphs.insert(node.id.clone(), paragraph).is_some() {
            diagnostics.push(Diagnostic::warning(
                0..0,
                format!(
                    "duplicate paragraph id `{}` at {scope} (the last definition wins)",
                    node.id
                ),
            ));
        }
    }
    paragraphs
}
