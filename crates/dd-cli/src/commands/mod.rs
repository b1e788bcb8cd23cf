pub mod build;
pub mod check;
pub mod play;

use std::path::Path;

use dd_dsl::{CompileResult, Severity, StoryFormat, render_diagnostics};

/// Read and compile a story file, printing diagnostics to stderr.
/// Returns the source, its format, and the compile result if there were
/// no errors.
fn compile_story(path: &Path) -> Result<(String, StoryFormat, CompileResult), String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let format = StoryFormat::from_path(path);
    let result = dd_dsl::compile_source(&source, format);

    // Diagnostic spans refer to the markup the parser saw; for a dedlee
    // story that is the lowered markup, not the source file.
    match format {
        StoryFormat::Markup => print_diagnostics(&source, path, &result),
        StoryFormat::Dedlee => {
            let lowered = dd_dsl::dedlee::compile_to_markup(&source);
            print_diagnostics(&lowered, path, &result);
        }
    }

    if result.has_errors() {
        Err("compilation failed with errors".into())
    } else {
        Ok((source, format, result))
    }
}

/// Print diagnostics to stderr using ariadne, with a count line.
fn print_diagnostics(source: &str, path: &Path, result: &CompileResult) {
    if result.diagnostics.is_empty() {
        return;
    }

    let filename = path.display().to_string();
    let rendered = render_diagnostics(source, &filename, &result.diagnostics);
    eprint!("{rendered}");

    let errors = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = result
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    } else if warnings > 0 {
        eprintln!(
            "  {} warning{}",
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    }
}
