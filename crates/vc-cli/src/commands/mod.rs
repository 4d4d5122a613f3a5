pub mod choose;
pub mod lint;
pub mod new;
pub mod sanitize;
pub mod show;
pub mod validate;

use std::path::Path;

use serde_json::Value;
use tracing::debug;
use vc_engine::{EngineError, GameState, Story};

/// Read a file and parse it as JSON.
fn read_json(path: &Path) -> Result<Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: malformed JSON: {e}", path.display()))
}

/// Load and validate a story. Validation errors go to stderr, one per line.
fn load_story(path: &Path) -> Result<Story, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    match vc_engine::load_story(&text) {
        Ok(story) => Ok(story),
        Err(EngineError::InvalidStory(report)) => {
            for error in &report.errors {
                eprintln!("  {error}");
            }
            Err(format!(
                "{} is not a valid story ({} error{})",
                path.display(),
                report.errors.len(),
                if report.errors.len() == 1 { "" } else { "s" },
            ))
        }
        Err(e) => Err(format!("{}: {e}", path.display())),
    }
}

/// Load a save and check it belongs to `story`.
fn load_save(path: &Path, story: &Story) -> Result<GameState, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let state = GameState::from_json(&text).map_err(|e| format!("{}: {e}", path.display()))?;
    if !state.is_for_story(story) {
        return Err(format!(
            "save is for story '{}', not '{}'",
            state.story_id, story.meta.id
        ));
    }
    Ok(state)
}

/// Write a save to `output`, or to stdout when no path is given.
fn write_save(state: &GameState, output: Option<&Path>) -> Result<(), String> {
    let json = state
        .to_json_pretty()
        .map_err(|e| format!("cannot serialize save: {e}"))?;
    if let Some(path) = output {
        std::fs::write(path, format!("{json}\n"))
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        debug!(path = %path.display(), node = %state.node_id, "save written");
        println!("  Saved to {}", path.display());
    } else {
        println!("{json}");
    }
    Ok(())
}
