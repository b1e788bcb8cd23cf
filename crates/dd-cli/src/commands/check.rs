use std::path::Path;

pub fn run(story: &Path) -> Result<(), String> {
    let (_, _, result) = super::compile_story(story)?;
    let model = &result.model;

    // Counts include page-scoped entities.
    let objects = model.objects.len()
        + model
            .pages
            .values()
            .map(|p| p.objects.len())
            .sum::<usize>();
    let paragraphs = model.paragraphs.len()
        + model
            .pages
            .values()
            .map(|p| p.paragraphs.len())
            .sum::<usize>();

    println!("  All checks passed for '{}'.", model.title);
    println!(
        "  {} pages, {} objects, {} paragraphs",
        model.pages.len(),
        objects,
        paragraphs,
    );

    Ok(())
}
