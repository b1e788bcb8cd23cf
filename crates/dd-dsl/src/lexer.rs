use logos::Logos;
use std::fmt;

/// An open tag with its parsed attributes, e.g.
/// `<obj id="lamp" inventoryName="Brass lamp">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Attributes in source order.
    pub attrs: Vec<(String, String)>,
}

impl Tag {
    /// The value of attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The value of attribute `name` as an owned option, empty values
    /// treated as absent.
    pub fn attr_opt(&self, name: &str) -> Option<String> {
        self.attr(name)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// True if the space-separated `class` attribute contains `class_name`.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }
}

/// Token type for the structured story markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An opening tag with attributes.
    Open(Tag),
    /// A closing tag, holding the tag name.
    Close(String),
    /// A run of text between tags. Adjacent runs are merged.
    Text(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open(tag) => write!(f, "<{}>", tag.name),
            Token::Close(name) => write!(f, "</{name}>"),
            Token::Text(_) => write!(f, "text"),
        }
    }
}

/// Raw logos tokens. Converted to owned [`Token`]s (with attributes
/// parsed) after lexing.
#[derive(Logos, Debug)]
enum RawToken {
    #[regex(r"</[A-Za-z][A-Za-z0-9_-]*>")]
    CloseTag,

    #[regex(r"<[A-Za-z][^>]*>")]
    OpenTag,

    #[regex(r"[^<]+")]
    Text,

    // A `<` that does not begin a tag (e.g. a comparison in a script
    // body) is plain text.
    #[token("<")]
    StrayAngle,
}

/// A lexer error with source location.
#[derive(Debug, Clone)]
pub struct LexError {
    /// Byte range of the erroneous input.
    pub span: std::ops::Range<usize>,
    /// Human-readable description.
    pub message: String,
}

/// Lex markup into `(Token, Span)` pairs.
///
/// Lexing continues past errors so the parser can still report on the
/// rest of the input.
pub fn lex(source: &str) -> (Vec<(Token, std::ops::Range<usize>)>, Vec<LexError>) {
    let mut tokens: Vec<(Token, std::ops::Range<usize>)> = Vec::new();
    let mut errors = Vec::new();
    let mut lexer = RawToken::lexer(source);

    let mut push_text = |tokens: &mut Vec<(Token, std::ops::Range<usize>)>,
                         text: &str,
                         span: std::ops::Range<usize>| {
        if let Some((Token::Text(prev), prev_span)) = tokens.last_mut() {
            prev.push_str(text);
            prev_span.end = span.end;
        } else {
            tokens.push((Token::Text(text.to_string()), span));
        }
    };

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(RawToken::CloseTag) => {
                let slice = lexer.slice();
                let name = slice[2..slice.len() - 1].to_string();
                tokens.push((Token::Close(name), span));
            }
            Ok(RawToken::OpenTag) => {
                let slice = lexer.slice();
                match parse_tag(&slice[1..slice.len() - 1]) {
                    Ok(tag) => tokens.push((Token::Open(tag), span)),
                    Err(message) => errors.push(LexError { span, message }),
                }
            }
            Ok(RawToken::Text) => push_text(&mut tokens, lexer.slice(), span),
            Ok(RawToken::StrayAngle) => push_text(&mut tokens, "<", span),
            Err(()) => {
                errors.push(LexError {
                    span: span.clone(),
                    message: format!("unexpected character: {:?}", &source[span.clone()]),
                });
            }
        }
    }

    (tokens, errors)
}

/// Parse the inside of an open tag (`name attr="value" …`).
fn parse_tag(inner: &str) -> Result<Tag, String> {
    let inner = inner.trim();
    let (name, mut rest) = match inner.find(char::is_whitespace) {
        Some(split) => (&inner[..split], inner[split..].trim_start()),
        None => (inner, ""),
    };

    let mut attrs = Vec::new();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| format!("malformed attribute in <{name}>: expected `=`"))?;
        let key = rest[..eq].trim();
        let after_eq = rest[eq + 1..].trim_start();
        if !after_eq.starts_with('"') {
            return Err(format!(
                "malformed attribute `{key}` in <{name}>: value must be double-quoted"
            ));
        }
        let value_rest = &after_eq[1..];
        let end = value_rest
            .find('"')
            .ok_or_else(|| format!("unterminated attribute value for `{key}` in <{name}>"))?;
        attrs.push((key.to_string(), value_rest[..end].to_string()));
        rest = value_rest[end + 1..].trim_start();
    }

    Ok(Tag {
        name: name.to_string(),
        attrs,
    })
}
