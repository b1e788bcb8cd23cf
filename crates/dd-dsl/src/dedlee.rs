//! The dedlee authoring syntax: a terse, indentation-based format lowered
//! into the structured story markup.
//!
//! Lowering is a two-step process: [`normalize`] strips comments and blank
//! lines and left-aligns the source, then [`compile_to_markup`] runs an
//! indentation-scoped recursive descent over the normalized lines, driven
//! by an ordered rule table. Rule order is load-bearing: specific rules
//! (object, action, when, page…) must be tried before the plain-text
//! fallback, and the context-sensitive rules (action, when, with) only
//! apply inside the right enclosing block.

/// One normalized source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Residual indentation width after left-alignment, in characters.
    pub indent: usize,
    /// The line text, including its residual indentation, right-trimmed.
    pub text: String,
}

/// Width of the leading whitespace of `line`, in characters.
fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Normalize dedlee source: split into lines, drop blank lines and `#`
/// comments, right-trim, and left-shift everything by the minimum
/// indentation so relative nesting is preserved.
///
/// Normalizing is idempotent and an empty input yields an empty sequence.
pub fn normalize(source: &str) -> Vec<Line> {
    let kept: Vec<&str> = source
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .collect();

    let min_indent = kept.iter().map(|line| indentation(line)).min().unwrap_or(0);

    kept.into_iter()
        .map(|line| {
            let text: String = line.chars().skip(min_indent).collect();
            let text = text.trim_end().to_string();
            Line {
                indent: indentation(&text),
                text,
            }
        })
        .collect()
}

/// The block kinds the rule table can produce. Context-sensitive rules
/// check the kind of their enclosing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Root,
    Title,
    Script,
    Object,
    Character,
    Action,
    When,
    With,
    Page,
    Paragraph,
    Text,
}

/// Matching context for one line.
struct MatchCtx<'a> {
    /// The candidate line, with residual indentation.
    line: &'a str,
    /// Kind of the enclosing block.
    parent: RuleKind,
    /// Absolute index into the normalized line sequence.
    absolute: usize,
    /// Line index within the enclosing block.
    relative: usize,
}

/// One lowering rule. `single_line` rules emit their open text only;
/// block rules recurse into the indented lines that follow and then emit
/// the matching close tag.
struct Rule {
    kind: RuleKind,
    single_line: bool,
    matches: fn(&MatchCtx<'_>) -> bool,
    open: fn(&str) -> String,
    close: fn(&str) -> String,
}

/// The seven script-carrying keywords.
const SCRIPT_KEYWORDS: [&str; 7] = [
    "initscript",
    "beforeEveryThing",
    "beforeEveryPageTurn",
    "beforeEveryParagraphShown",
    "afterEveryThing",
    "afterEveryPageTurn",
    "afterEveryParagraphShown",
];

/// Rules in match priority order. First match wins.
const RULES: [Rule; 10] = [
    // The very first line of the source is the story title. Guarded by
    // the absolute line counter, not the block-relative one.
    Rule {
        kind: RuleKind::Title,
        single_line: true,
        matches: |ctx| ctx.absolute == 0,
        open: |line| format!("<title>{}</title>", line.trim()),
        close: |_| String::new(),
    },
    Rule {
        kind: RuleKind::Script,
        single_line: false,
        matches: |ctx| SCRIPT_KEYWORDS.contains(&ctx.line.trim()),
        open: |line| format!("<{}>", line.trim()),
        close: |line| format!("</{}>", line.trim()),
    },
    Rule {
        kind: RuleKind::Object,
        single_line: false,
        matches: |ctx| ctx.line.trim_start().starts_with("o."),
        open: |line| entity_open(line, "obj"),
        close: |_| "</obj>".to_string(),
    },
    Rule {
        kind: RuleKind::Character,
        single_line: false,
        matches: |ctx| ctx.line.trim_start().starts_with("c."),
        open: |line| entity_open(line, "character"),
        close: |_| "</character>".to_string(),
    },
    // A quoted line directly inside an object or character block opens an
    // action named by the unquoted text.
    Rule {
        kind: RuleKind::Action,
        single_line: false,
        matches: |ctx| {
            matches!(ctx.parent, RuleKind::Object | RuleKind::Character)
                && ctx.line.trim_start().starts_with('"')
        },
        open: |line| format!("<action id=\"{}\">", line.trim().replace('"', "")),
        close: |_| "</action>".to_string(),
    },
    // A `when` guard is only recognized as the first line of an action.
    Rule {
        kind: RuleKind::When,
        single_line: true,
        matches: |ctx| {
            ctx.parent == RuleKind::Action
                && ctx.relative == 0
                && ctx.line.trim_start().starts_with("when ")
        },
        open: |line| {
            let trimmed = line.trim_start();
            let expr = trimmed.strip_prefix("when ").unwrap_or(trimmed).trim();
            format!("<when>{expr}</when>")
        },
        close: |_| String::new(),
    },
    Rule {
        kind: RuleKind::With,
        single_line: false,
        matches: |ctx| ctx.parent == RuleKind::Action && ctx.line.trim_start().starts_with("with."),
        open: |line| {
            let partner = dotted_segment(line, 1).unwrap_or_default();
            format!("<with id=\"{partner}\">")
        },
        close: |_| "</with>".to_string(),
    },
    Rule {
        kind: RuleKind::Page,
        single_line: false,
        matches: |ctx| ctx.line.trim_start().starts_with("p."),
        open: |line| id_class_open(line, "page"),
        close: |_| "</page>".to_string(),
    },
    Rule {
        kind: RuleKind::Paragraph,
        single_line: false,
        matches: |ctx| ctx.line.trim_start().starts_with("pg."),
        open: |line| id_class_open(line, "paragraph"),
        close: |_| "</paragraph>".to_string(),
    },
    // Everything else passes through as text. The residual indentation is
    // block structure, not content, so it is stripped here.
    Rule {
        kind: RuleKind::Text,
        single_line: true,
        matches: |_| true,
        open: |line| line.trim_start().to_string(),
        close: |_| String::new(),
    },
];

/// The `index`-th dot-separated segment of a line, empty segments
/// skipped and whitespace trimmed.
fn dotted_segment(line: &str, index: usize) -> Option<String> {
    line.trim()
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .nth(index)
        .map(str::to_string)
}

/// Lower `o.ID["Inventory Name"][.class]` / `c.ID…` into an entity open
/// tag. The inventory name is the first quoted substring, stripped before
/// the line is tokenized by `.`.
fn entity_open(line: &str, tag: &str) -> String {
    let mut line = line.trim().to_string();
    let mut inventory_name = None;

    if let Some(start) = line.find('"') {
        if let Some(len) = line[start + 1..].find('"') {
            inventory_name = Some(line[start + 1..start + 1 + len].to_string());
            line.replace_range(start..start + len + 2, "");
        }
    }

    let id = dotted_segment(&line, 1).unwrap_or_default();
    let class = dotted_segment(&line, 2);

    let mut out = format!("<{tag} id=\"{id}\"");
    if let Some(name) = inventory_name {
        out.push_str(&format!(" inventoryName=\"{name}\""));
    }
    if let Some(class) = class {
        out.push_str(&format!(" class=\"{class}\""));
    }
    out.push('>');
    out
}

/// Lower `p.ID[.class]` / `pg.ID[.class]` into a page or paragraph open
/// tag.
fn id_class_open(line: &str, tag: &str) -> String {
    let id = dotted_segment(line, 1).unwrap_or_default();
    let mut out = format!("<{tag} id=\"{id}\"");
    if let Some(class) = dotted_segment(line, 2) {
        out.push_str(&format!(" class=\"{class}\""));
    }
    out.push('>');
    out
}

struct BlockCompiler {
    lines: Vec<Line>,
    cursor: usize,
    out: String,
}

impl BlockCompiler {
    /// Parse one block. The block's baseline is the indentation of its
    /// first line; the block ends at the first line indented less than
    /// the baseline. A nested block must sit strictly deeper than its
    /// header line, so a header immediately followed by a sibling opens
    /// and closes an empty block.
    fn parse_block(&mut self, parent: RuleKind, parent_indent: Option<usize>) {
        let baseline = match self.lines.get(self.cursor) {
            Some(line) => line.indent,
            None => return,
        };
        if let Some(parent_indent) = parent_indent {
            if baseline <= parent_indent {
                return;
            }
        }

        let mut relative = 0usize;
        while let Some(line) = self.lines.get(self.cursor).cloned() {
            if line.indent < baseline {
                break;
            }

            let ctx = MatchCtx {
                line: &line.text,
                parent,
                absolute: self.cursor,
                relative,
            };
            // The text rule matches anything, so a rule always exists.
            let rule = match RULES.iter().find(|rule| (rule.matches)(&ctx)) {
                Some(rule) => rule,
                None => break,
            };

            self.out.push_str(&(rule.open)(&line.text));
            self.out.push('\n');
            self.cursor += 1;

            if !rule.single_line {
                self.parse_block(rule.kind, Some(line.indent));
                self.out.push_str(&(rule.close)(&line.text));
                self.out.push('\n');
            }

            relative += 1;
        }
    }
}

/// Lower dedlee source into structured story markup.
pub fn compile_to_markup(source: &str) -> String {
    let mut compiler = BlockCompiler {
        lines: normalize(source),
        cursor: 0,
        out: String::new(),
    };
    compiler.parse_block(RuleKind::Root, None);
    compiler.out
}
