use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use dd_core::content::{Content, Inline, LinkRef};
use dd_core::document::{
    ActionNode, CombinationNode, EntityKind, HookKind, ObjectNode, PageNode, ParagraphNode,
    StoryDocument,
};

use crate::lexer::Token;

type Span = SimpleSpan;

/// Parse error with source span.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Byte range of the error in the markup text.
    pub span: std::ops::Range<usize>,
    /// Human-readable message.
    pub message: String,
}

/// A top-level element of a story document.
enum TopItem {
    Title(String),
    Init(String),
    Hook(HookKind, String),
    Object(ObjectNode),
    Page(PageNode),
    Paragraph(ParagraphNode),
}

/// A direct child of a `<page>` element.
enum PageChild {
    Object(ObjectNode),
    Paragraph(ParagraphNode),
    Inline(Inline),
}

/// A direct child of an `<action>` element.
enum ActionItem {
    When(String),
    With(CombinationNode),
    Inline(Inline),
}

/// A `<turn>`, `<interact>`, or `<show>` element wrapping a plain label.
fn link_parser<'a, I>(
    tag_name: &'static str,
    target_attr: &'static str,
) -> impl Parser<'a, I, LinkRef, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let open = select! { Token::Open(ref t) if t.name.as_str() == tag_name => t.clone() };
    let close = select! { Token::Close(ref n) if n.as_str() == tag_name => () };
    let label = select! { Token::Text(t) => t };

    open.then(label.repeated().collect::<Vec<String>>())
        .then_ignore(close)
        .try_map(move |(tag, label_parts), span| {
            let target = tag.attr(target_attr).ok_or_else(|| {
                Rich::custom(
                    span,
                    format!("<{tag_name}> requires a `{target_attr}` attribute"),
                )
            })?;
            Ok(LinkRef {
                target: target.to_string(),
                label: label_parts.concat(),
                id: tag.attr_opt("id"),
                class: tag.attr_opt("class"),
            })
        })
        .labelled(tag_name)
}

/// Build the full document parser.
///
/// Sub-parsers are defined inline so chumsky can infer the generic input
/// type. Unknown tags and stray non-blank text at the top level are parse
/// errors: malformed markup fails at load time rather than being silently
/// skipped.
fn document_parser<'a, I>() -> impl Parser<'a, I, StoryDocument, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = Span>,
{
    let text = select! { Token::Text(t) => t }.labelled("text");

    // Whitespace-only text, skipped between structural elements.
    let ws = select! { Token::Text(ref t) if t.trim().is_empty() => () };
    let ws0 = ws.repeated().to(());

    // Raw body of script-carrying tags, kept verbatim for the sandbox.
    let raw_body = text
        .repeated()
        .collect::<Vec<String>>()
        .map(|parts| parts.concat());

    // -- Inline content --

    let inline = choice((
        link_parser("turn", "to").map(Inline::Turn),
        link_parser("interact", "with").map(Inline::Interact),
        link_parser("show", "paragraph").map(Inline::Show),
        text.map(Inline::Text),
    ));

    let content = inline
        .clone()
        .repeated()
        .collect::<Vec<Inline>>()
        .map(|nodes| {
            let mut content = Content::new();
            for node in nodes {
                match node {
                    Inline::Text(t) => content.push_text(t),
                    other => content.push(other),
                }
            }
            content
        });

    // -- Action clauses --

    let when = {
        let open = select! { Token::Open(ref t) if t.name.as_str() == "when" => () };
        let close = select! { Token::Close(ref n) if n.as_str() == "when" => () };
        open.ignore_then(raw_body.clone())
            .then_ignore(close)
            .map(|body| body.trim().to_string())
            .labelled("when clause")
    };

    let with = {
        let open = select! { Token::Open(ref t) if t.name.as_str() == "with" => t.clone() };
        let close = select! { Token::Close(ref n) if n.as_str() == "with" => () };
        open.then(content.clone())
            .then_ignore(close)
            .try_map(|(tag, content), span| {
                let partner = tag
                    .attr("id")
                    .ok_or_else(|| Rich::custom(span, "<with> requires an `id` attribute"))?;
                Ok(CombinationNode {
                    partner: partner.to_string(),
                    content,
                })
            })
            .labelled("with clause")
    };

    let action = {
        let open = select! { Token::Open(ref t) if t.name.as_str() == "action" => t.clone() };
        let close = select! { Token::Close(ref n) if n.as_str() == "action" => () };
        let item = choice((
            when.map(ActionItem::When),
            with.map(ActionItem::With),
            inline.clone().map(ActionItem::Inline),
        ));
        open.then(item.repeated().collect::<Vec<ActionItem>>())
            .then_ignore(close)
            .try_map(|(tag, items), span| {
                let id = tag
                    .attr("id")
                    .ok_or_else(|| Rich::custom(span, "<action> requires an `id` attribute"))?;
                let mut when = None;
                let mut combinations = Vec::new();
                let mut content = Content::new();
                for item in items {
                    match item {
                        ActionItem::When(expr) => when = Some(expr),
                        ActionItem::With(combo) => combinations.push(combo),
                        ActionItem::Inline(Inline::Text(t)) => content.push_text(t),
                        ActionItem::Inline(node) => content.push(node),
                    }
                }
                Ok(ActionNode {
                    id: id.to_string(),
                    when,
                    content,
                    combinations,
                })
            })
            .labelled("action")
    };

    // -- Objects and characters --

    let entity = {
        let open = select! {
            Token::Open(ref t) if t.name.as_str() == "obj" || t.name.as_str() == "character" => t.clone()
        };
        let close = select! { Token::Close(name) => name };
        open.then_ignore(ws0.clone())
            .then(
                action
                    .then_ignore(ws0.clone())
                    .repeated()
                    .collect::<Vec<ActionNode>>(),
            )
            .then(close)
            .try_map(|((tag, actions), close_name), span| {
                if close_name != tag.name {
                    return Err(Rich::custom(
                        span,
                        format!("expected </{}>, found </{close_name}>", tag.name),
                    ));
                }
                let id = tag.attr("id").ok_or_else(|| {
                    Rich::custom(span, format!("<{}> requires an `id` attribute", tag.name))
                })?;
                let kind = if tag.name == "character" {
                    EntityKind::Character
                } else {
                    EntityKind::Object
                };
                Ok(ObjectNode {
                    kind,
                    id: id.to_string(),
                    inventory_name: tag.attr_opt("inventoryName"),
                    class: tag.attr_opt("class"),
                    actions,
                })
            })
            .labelled("object")
    };

    // -- Paragraphs and pages --

    let paragraph = {
        let open = select! { Token::Open(ref t) if t.name.as_str() == "paragraph" => t.clone() };
        let close = select! { Token::Close(ref n) if n.as_str() == "paragraph" => () };
        open.then(content.clone())
            .then_ignore(close)
            .try_map(|(tag, content), span| {
                let id = tag
                    .attr("id")
                    .ok_or_else(|| Rich::custom(span, "<paragraph> requires an `id` attribute"))?;
                Ok(ParagraphNode {
                    id: id.to_string(),
                    class: tag.attr_opt("class"),
                    content,
                })
            })
            .labelled("paragraph")
    };

    let page = {
        let open = select! { Token::Open(ref t) if t.name.as_str() == "page" => t.clone() };
        let close = select! { Token::Close(ref n) if n.as_str() == "page" => () };
        let child = choice((
            entity.clone().map(PageChild::Object),
            paragraph.clone().map(PageChild::Paragraph),
            inline.clone().map(PageChild::Inline),
        ));
        open.then(child.repeated().collect::<Vec<PageChild>>())
            .then_ignore(close)
            .try_map(|(tag, children), span| {
                let id = tag
                    .attr("id")
                    .ok_or_else(|| Rich::custom(span, "<page> requires an `id` attribute"))?;
                let mut content = Content::new();
                let mut objects = Vec::new();
                let mut paragraphs = Vec::new();
                for child in children {
                    match child {
                        PageChild::Object(o) => objects.push(o),
                        PageChild::Paragraph(p) => paragraphs.push(p),
                        PageChild::Inline(Inline::Text(t)) => content.push_text(t),
                        PageChild::Inline(node) => content.push(node),
                    }
                }
                Ok(PageNode {
                    id: id.to_string(),
                    class: tag.attr_opt("class"),
                    content,
                    objects,
                    paragraphs,
                })
            })
            .labelled("page")
    };

    // -- Title and script-carrying tags --

    let title = {
        let open = select! { Token::Open(ref t) if t.name.as_str() == "title" => () };
        let close = select! { Token::Close(ref n) if n.as_str() == "title" => () };
        open.ignore_then(raw_body.clone())
            .then_ignore(close)
            .map(|body| TopItem::Title(body.trim().to_string()))
            .labelled("title")
    };

    let script = {
        let open = select! {
            Token::Open(ref t) if t.name.as_str() == "initscript" || HookKind::from_tag(&t.name).is_some() => t.name.clone()
        };
        let close = select! { Token::Close(name) => name };
        open.then(raw_body)
            .then(close)
            .try_map(|((name, body), close_name), span| {
                if close_name != name {
                    return Err(Rich::custom(
                        span,
                        format!("expected </{name}>, found </{close_name}>"),
                    ));
                }
                Ok(match HookKind::from_tag(&name) {
                    Some(kind) => TopItem::Hook(kind, body),
                    // The open guard only admits hook tags and initscript.
                    None => TopItem::Init(body),
                })
            })
            .labelled("script tag")
    };

    let top_item = choice((
        title,
        script,
        entity.map(TopItem::Object),
        page.map(TopItem::Page),
        paragraph.map(TopItem::Paragraph),
    ));

    ws0.clone()
        .ignore_then(
            top_item
                .then_ignore(ws0)
                .repeated()
                .collect::<Vec<TopItem>>(),
        )
        .then_ignore(end())
        .map(|items| {
            let mut doc = StoryDocument::default();
            for item in items {
                match item {
                    TopItem::Title(t) => doc.title = Some(t),
                    TopItem::Init(body) => doc.init_script = Some(body),
                    TopItem::Hook(kind, body) => doc.set_hook(kind, body),
                    TopItem::Object(o) => doc.objects.push(o),
                    TopItem::Page(p) => doc.pages.push(p),
                    TopItem::Paragraph(p) => doc.paragraphs.push(p),
                }
            }
            doc
        })
}

/// Parse a lexed token stream into a [`StoryDocument`].
pub fn parse(tokens: &[(Token, std::ops::Range<usize>)]) -> Result<StoryDocument, Vec<ParseError>> {
    let token_iter = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), Span::from(span.clone())));

    let len = tokens.last().map_or(0, |(_, s)| s.end);
    let eoi: Span = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let (output, errors) = document_parser().parse(stream).into_output_errors();

    if errors.is_empty() {
        if let Some(doc) = output {
            return Ok(doc);
        }
    }

    let mut errors: Vec<ParseError> = errors
        .into_iter()
        .map(|e| {
            let span = e.span();
            ParseError {
                span: span.into_range(),
                message: e.to_string(),
            }
        })
        .collect();
    if errors.is_empty() {
        errors.push(ParseError {
            span: 0..0,
            message: "failed to parse story markup".to_string(),
        });
    }
    Err(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_str(source: &str) -> StoryDocument {
        let (tokens, lex_errors) = lex(source);
        assert!(lex_errors.is_empty(), "lex errors: {lex_errors:?}");
        parse(&tokens).expect("parse failed")
    }

    #[test]
    fn parse_title_and_page() {
        let doc = parse_str(
            "<title>The Vault</title>\n<page id=\"start\" class=\"first\">\nYou are in a vault.\n</page>",
        );
        assert_eq!(doc.title.as_deref(), Some("The Vault"));
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].is_first());
        assert!(doc.pages[0].content.plain_text().contains("vault"));
    }

    #[test]
    fn parse_links_inside_page() {
        let doc = parse_str(
            "<page id=\"start\">Go to the <turn to=\"cellar\">cellar</turn> or look at the <interact with=\"lamp\">lamp</interact>.</page>",
        );
        let content = &doc.pages[0].content;
        let links: Vec<_> = content
            .iter()
            .filter(|n| !matches!(n, Inline::Text(_)))
            .collect();
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0],
            &Inline::Turn(LinkRef::new("cellar", "cellar")),
        );
        assert_eq!(
            links[1],
            &Inline::Interact(LinkRef::new("lamp", "lamp")),
        );
    }

    #[test]
    fn parse_link_with_explicit_id_and_class() {
        let doc = parse_str(
            "<page id=\"p\"><show paragraph=\"aside\" id=\"aside1\" class=\"subtle\">more</show></page>",
        );
        match &doc.pages[0].content.0[0] {
            Inline::Show(link) => {
                assert_eq!(link.target, "aside");
                assert_eq!(link.id.as_deref(), Some("aside1"));
                assert_eq!(link.class.as_deref(), Some("subtle"));
            }
            other => panic!("expected show link, got {other:?}"),
        }
    }

    #[test]
    fn parse_object_with_actions() {
        let doc = parse_str(
            r#"<obj id="lamp" inventoryName="Brass lamp">
    <action id="Examine">
        A battered brass lamp.
    </action>
    <action id="Take">
        <when>!story.isInInventory('lamp')</when>
        You pick it up.
    </action>
</obj>"#,
        );
        assert_eq!(doc.objects.len(), 1);
        let obj = &doc.objects[0];
        assert_eq!(obj.kind, EntityKind::Object);
        assert_eq!(obj.inventory_name.as_deref(), Some("Brass lamp"));
        assert_eq!(obj.actions.len(), 2);
        assert_eq!(obj.actions[0].when, None);
        assert_eq!(
            obj.actions[1].when.as_deref(),
            Some("!story.isInInventory('lamp')")
        );
    }

    #[test]
    fn parse_combination_clauses() {
        let doc = parse_str(
            r#"<obj id="key">
    <action id="Use">
        Nothing happens.
        <with id="door">The door creaks open.</with>
    </action>
</obj>"#,
        );
        let action = &doc.objects[0].actions[0];
        assert_eq!(action.combinations.len(), 1);
        assert_eq!(action.combinations[0].partner, "door");
        assert!(action.content.plain_text().contains("Nothing happens."));
    }

    #[test]
    fn parse_character_keeps_kind() {
        let doc = parse_str("<character id=\"smith\"><action id=\"Talk\">Hello.</action></character>");
        assert_eq!(doc.objects[0].kind, EntityKind::Character);
    }

    #[test]
    fn parse_page_scoped_children() {
        let doc = parse_str(
            r#"<page id="cellar">
It is dark.
<obj id="rat"><action id="Chase">It flees.</action></obj>
<paragraph id="smell">It smells of mould.</paragraph>
</page>"#,
        );
        let page = &doc.pages[0];
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.paragraphs.len(), 1);
        assert!(page.content.plain_text().contains("It is dark."));
        assert!(!page.content.plain_text().contains("mould"));
    }

    #[test]
    fn parse_init_script_and_hooks() {
        let doc = parse_str(
            "<initscript>story.seen = 0</initscript>\n<afterEveryPageTurn>story.seen += 1</afterEveryPageTurn>",
        );
        assert_eq!(doc.init_script.as_deref(), Some("story.seen = 0"));
        assert_eq!(
            doc.hook(HookKind::AfterEveryPageTurn),
            Some("story.seen += 1")
        );
    }

    #[test]
    fn mismatched_close_tag_is_an_error() {
        let (tokens, _) = lex("<obj id=\"lamp\"></page>");
        let errors = parse(&tokens).unwrap_err();
        assert!(errors[0].message.contains("expected </obj>"));
    }

    #[test]
    fn missing_id_is_an_error() {
        let (tokens, _) = lex("<page class=\"first\">hi</page>");
        let errors = parse(&tokens).unwrap_err();
        assert!(errors[0].message.contains("`id` attribute"));
    }

    #[test]
    fn unknown_top_level_tag_fails_fast() {
        let (tokens, _) = lex("<pge id=\"typo\">hi</pge>");
        assert!(parse(&tokens).is_err());
    }

    #[test]
    fn stray_top_level_text_fails_fast() {
        let (tokens, _) = lex("just some prose with no enclosing element");
        assert!(parse(&tokens).is_err());
    }
}
