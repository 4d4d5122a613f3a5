use std::path::Path;

use vc_engine::validate_story;

pub fn run(path: &Path) -> Result<(), String> {
    let doc = super::read_json(path)?;
    let report = validate_story(&doc);

    if !report.ok {
        for error in &report.errors {
            eprintln!("  {error}");
        }
        let count = report.errors.len();
        return Err(format!(
            "{count} error{} in {}",
            if count == 1 { "" } else { "s" },
            path.display()
        ));
    }

    let title = doc["meta"]["title"].as_str().unwrap_or_default();
    let nodes = doc["nodes"].as_object().map_or(0, |nodes| nodes.len());
    println!("  Story '{title}' is valid.");
    println!("  {nodes} node{}", if nodes == 1 { "" } else { "s" });
    Ok(())
}
