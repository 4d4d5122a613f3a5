use std::path::Path;

use colored::Colorize;
use vc_engine::{lint_story, validate_story};

pub fn run(path: &Path) -> Result<(), String> {
    let doc = super::read_json(path)?;

    let report = validate_story(&doc);
    if !report.ok {
        for error in &report.errors {
            eprintln!("  {} {error}", "error:".red().bold());
        }
        return Err(format!("{} failed validation", path.display()));
    }

    let issues = lint_story(&doc);
    if issues.is_empty() {
        println!("  No issues found.");
        return Ok(());
    }

    for issue in &issues {
        let level = if issue.is_error {
            "error".red().bold()
        } else {
            "warning".yellow().bold()
        };
        println!("  {level}: {}: {}", issue.location.dimmed(), issue.message);
    }

    let errors = issues.iter().filter(|i| i.is_error).count();
    let warnings = issues.len() - errors;
    println!();
    println!(
        "  {errors} error{}, {warnings} warning{}",
        if errors == 1 { "" } else { "s" },
        if warnings == 1 { "" } else { "s" },
    );

    if errors > 0 {
        Err("lint found errors".into())
    } else {
        Ok(())
    }
}
