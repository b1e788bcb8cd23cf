//! Link substitution: rewrites the three bracket-delimited link notations
//! found in text content into structured cross-reference nodes.
//!
//! Three independent global passes run in a fixed order — turn links,
//! interact links, show links — over every page, paragraph, action, and
//! combination body. Matching is non-greedy: the target ends at the first
//! middle delimiter and the label at the first closing delimiter, so
//! several links can share a line. An unterminated notation is left as
//! plain text.

use dd_core::content::{Content, Inline, LinkRef};
use dd_core::document::StoryDocument;

/// One of the three link notations.
struct Notation {
    open: &'static str,
    mid: &'static str,
    close: &'static str,
    make: fn(LinkRef) -> Inline,
}

const NOTATIONS: [Notation; 3] = [
    // [[TARGET]]LABEL[[]]
    Notation {
        open: "[[",
        mid: "]]",
        close: "[[]]",
        make: Inline::Turn,
    },
    // {[TARGET]}LABEL{[]}
    Notation {
        open: "{[",
        mid: "]}",
        close: "{[]}",
        make: Inline::Interact,
    },
    // ((TARGET))LABEL(())
    Notation {
        open: "((",
        mid: "))",
        close: "(())",
        make: Inline::Show,
    },
];

/// Rewrite link notations in every text body of the document.
pub fn substitute_links(doc: &mut StoryDocument) {
    for notation in &NOTATIONS {
        for page in &mut doc.pages {
            substitute_content(&mut page.content, notation);
            for object in &mut page.objects {
                substitute_object(object, notation);
            }
            for paragraph in &mut page.paragraphs {
                substitute_content(&mut paragraph.content, notation);
            }
        }
        for object in &mut doc.objects {
            substitute_object(object, notation);
        }
        for paragraph in &mut doc.paragraphs {
            substitute_content(&mut paragraph.content, notation);
        }
    }
}

fn substitute_object(object: &mut dd_core::document::ObjectNode, notation: &Notation) {
    for action in &mut object.actions {
        substitute_content(&mut action.content, notation);
        for combination in &mut action.combinations {
            substitute_content(&mut combination.content, notation);
        }
    }
}

fn substitute_content(content: &mut Content, notation: &Notation) {
    let mut out = Content::new();
    for node in std::mem::take(&mut content.0) {
        match node {
            Inline::Text(text) => substitute_text(&text, notation, &mut out),
            other => out.push(other),
        }
    }
    *content = out;
}

fn substitute_text(text: &str, notation: &Notation, out: &mut Content) {
    let mut rest = text;
    loop {
        let Some(open_at) = rest.find(notation.open) else {
            break;
        };
        let target_start = open_at + notation.open.len();
        let Some(mid_offset) = rest[target_start..].find(notation.mid) else {
            break;
        };
        let target = &rest[target_start..target_start + mid_offset];
        let label_start = target_start + mid_offset + notation.mid.len();
        let Some(close_offset) = rest[label_start..].find(notation.close) else {
            break;
        };
        let label = &rest[label_start..label_start + close_offset];

        if open_at > 0 {
            out.push_text(&rest[..open_at]);
        }
        out.push((notation.make)(parse_target(target, label)));
        rest = &rest[label_start + close_offset + notation.close.len()..];
    }
    if !rest.is_empty() {
        out.push_text(rest);
    }
}

/// Split a dotted link target into target, explicit link id, and class.
fn parse_target(target: &str, label: &str) -> LinkRef {
    let mut segments = target.splitn(3, '.');
    let target = segments.next().unwrap_or_default();
    let id = segments.next().filter(|s| !s.is_empty());
    let class = segments.next().filter(|s| !s.is_empty());
    LinkRef {
        target: target.to_string(),
        label: label.to_string(),
        id: id.map(str::to_string),
        class: class.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dd_core::document::PageNode;

    fn substitute(text: &str) -> Content {
        let mut doc = StoryDocument {
            pages: vec![PageNode {
                id: "p".into(),
                class: None,
                content: Content::text(text),
                objects: vec![],
                paragraphs: vec![],
            }],
            ..Default::default()
        };
        substitute_links(&mut doc);
        doc.pages.remove(0).content
    }

    #[test]
    fn show_reference_from_notation() {
        let content = substitute("((firstParagraph))go(())");
        assert_eq!(
            content.0,
            vec![Inline::Show(LinkRef::new("firstParagraph", "go"))]
        );
    }

    #[test]
    fn turn_reference_with_surrounding_text() {
        let content = substitute("Go [[cellar]]down the stairs[[]] now.");
        assert_eq!(
            content.0,
            vec![
                Inline::Text("Go ".into()),
                Inline::Turn(LinkRef::new("cellar", "down the stairs")),
                Inline::Text(" now.".into()),
            ]
        );
    }

    #[test]
    fn interact_reference() {
        let content = substitute("A {[lamp]}brass lamp{[]} sits here.");
        assert_eq!(
            content.0[1],
            Inline::Interact(LinkRef::new("lamp", "brass lamp"))
        );
    }

    #[test]
    fn multiple_links_on_one_line_match_non_greedily() {
        let content = substitute("[[a]]one[[]] and [[b]]two[[]]");
        let links: Vec<_> = content
            .iter()
            .filter_map(|n| match n {
                Inline::Turn(l) => Some((l.target.as_str(), l.label.as_str())),
                _ => None,
            })
            .collect();
        assert_eq!(links, vec![("a", "one"), ("b", "two")]);
    }

    #[test]
    fn dotted_target_yields_id_and_class() {
        let content = substitute("{[secondObject.withId.withClass]}second object{[]}");
        match &content.0[0] {
            Inline::Interact(link) => {
                assert_eq!(link.target, "secondObject");
                assert_eq!(link.id.as_deref(), Some("withId"));
                assert_eq!(link.class.as_deref(), Some("withClass"));
            }
            other => panic!("expected interact link, got {other:?}"),
        }
    }

    #[test]
    fn dotted_target_with_id_only() {
        let content = substitute("[[cellar.down1]]down[[]]");
        match &content.0[0] {
            Inline::Turn(link) => {
                assert_eq!(link.target, "cellar");
                assert_eq!(link.id.as_deref(), Some("down1"));
                assert_eq!(link.class, None);
            }
            other => panic!("expected turn link, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_notation_stays_text() {
        let content = substitute("[[cellar]]no closing marker");
        assert_eq!(
            content.0,
            vec![Inline::Text("[[cellar]]no closing marker".into())]
        );
    }

    #[test]
    fn mixed_notations_in_one_body() {
        let content = substitute("[[p2]]turn[[]] {[o1]}poke{[]} ((g1))peek(())");
        assert!(matches!(content.0[0], Inline::Turn(_)));
        assert!(matches!(content.0[2], Inline::Interact(_)));
        assert!(matches!(content.0[4], Inline::Show(_)));
    }

    #[test]
    fn action_and_combination_bodies_are_substituted() {
        use dd_core::document::{ActionNode, CombinationNode, EntityKind, ObjectNode};

        let mut doc = StoryDocument {
            objects: vec![ObjectNode {
                kind: EntityKind::Object,
                id: "key".into(),
                inventory_name: None,
                class: None,
                actions: vec![ActionNode {
                    id: "Use".into(),
                    when: None,
                    content: Content::text("See ((hint))the hint(())."),
                    combinations: vec![CombinationNode {
                        partner: "door".into(),
                        content: Content::text("Turn [[hall]]back[[]]."),
                    }],
                }],
            }],
            ..Default::default()
        };
        substitute_links(&mut doc);

        let action = &doc.objects[0].actions[0];
        assert!(matches!(action.content.0[1], Inline::Show(_)));
        assert!(matches!(action.combinations[0].content.0[1], Inline::Turn(_)));
    }
}
