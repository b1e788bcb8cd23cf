use std::fs;
use std::path::Path;

use dd_dsl::StoryFormat;

pub fn run(story: &Path, output: Option<&Path>) -> Result<(), String> {
    if StoryFormat::from_path(story) != StoryFormat::Dedlee {
        return Err(format!(
            "{} is not a dedlee story (.dedlee or .dd)",
            story.display()
        ));
    }

    let source = fs::read_to_string(story)
        .map_err(|e| format!("cannot read {}: {e}", story.display()))?;
    let markup = dd_dsl::dedlee::compile_to_markup(&source);

    // Make sure the lowering actually compiles before handing it out.
    let result = dd_dsl::compile_source(&markup, StoryFormat::Markup);
    super::print_diagnostics(&markup, story, &result);
    if result.has_errors() {
        return Err("compilation failed with errors".into());
    }

    match output {
        Some(path) => {
            fs::write(path, &markup)
                .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{markup}"),
    }

    Ok(())
}
