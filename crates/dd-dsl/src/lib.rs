//! Story compiler for Dedalus.
//!
//! Two input formats feed one pipeline: structured markup is lexed and
//! parsed into a [`StoryDocument`](dd_core::StoryDocument); the terser
//! dedlee authoring syntax is first lowered into that markup by an
//! indentation-based block compiler. Bracket link notations are then
//! rewritten into structured cross references, and the loader extracts
//! the runtime [`StoryModel`](dd_core::StoryModel).

/// The dedlee block compiler and indentation normalizer.
pub mod dedlee;
/// Compile diagnostics and their ariadne rendering.
pub mod diagnostics;
/// The markup lexer.
pub mod lexer;
/// The link substitution pass.
pub mod links;
/// The loader from document tree to story model.
pub mod loader;
/// The markup parser.
pub mod parser;

use std::path::Path;

use dd_core::{StoryDocument, StoryModel};

pub use diagnostics::{Diagnostic, Severity, render_diagnostics};

/// The two supported authoring formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryFormat {
    /// Structured markup (`.ded`).
    Markup,
    /// The terse indentation-based syntax (`.dedlee`).
    Dedlee,
}

impl StoryFormat {
    /// Choose a format from a file extension; markup is the default.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("dedlee") | Some("dd") => StoryFormat::Dedlee,
            _ => StoryFormat::Markup,
        }
    }
}

/// Result of compiling story source.
pub struct CompileResult {
    /// The loaded story model (may be partial if errors occurred).
    pub model: StoryModel,
    /// The document tree the model was extracted from.
    pub document: StoryDocument,
    /// Errors and warnings produced along the pipeline.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    /// True if any diagnostic has error severity.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Compile story source in either format into a model.
///
/// The pipeline never panics on bad input: all problems surface as
/// diagnostics, and `has_errors()` tells the caller whether the model is
/// usable.
pub fn compile_source(source: &str, format: StoryFormat) -> CompileResult {
    let lowered;
    let markup: &str = match format {
        StoryFormat::Markup => source,
        StoryFormat::Dedlee => {
            lowered = dedlee::compile_to_markup(source);
            lowered.as_str()
        }
    };

    let (tokens, lex_errors) = lexer::lex(markup);
    let mut diagnostics: Vec<Diagnostic> = lex_errors
        .into_iter()
        .map(|e| Diagnostic::error(e.span, e.message))
        .collect();

    let mut document = match parser::parse(&tokens) {
        Ok(document) => document,
        Err(parse_errors) => {
            diagnostics.extend(
                parse_errors
                    .into_iter()
                    .map(|e| Diagnostic::error(e.span, e.message)),
            );
            return CompileResult {
                model: StoryModel::default(),
                document: StoryDocument::default(),
                diagnostics,
            };
        }
    };

    links::substitute_links(&mut document);

    let (model, load_diagnostics) = loader::load(&document);
    diagnostics.extend(load_diagnostics);

    CompileResult {
        model,
        document,
        diagnostics,
    }
}

/// Compile a story file, choosing the format from its extension.
pub fn compile_file(path: &Path) -> CompileResult {
    match std::fs::read_to_string(path) {
        Ok(source) => compile_source(&source, StoryFormat::from_path(path)),
        Err(e) => CompileResult {
            model: StoryModel::default(),
            document: StoryDocument::default(),
            diagnostics: vec![Diagnostic::error(
                0..0,
                format!("cannot read {}: {e}", path.display()),
            )],
        },
    }
}
