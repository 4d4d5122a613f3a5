use std::collections::BTreeSet;
use std::path::Path;

use vc_engine::sanitize_state_for_story;

pub fn run(story_path: &Path, save_path: &Path, output: Option<&Path>) -> Result<(), String> {
    let story = super::load_story(story_path)?;
    let state = super::load_save(save_path, &story)?;

    let cleaned = sanitize_state_for_story(&story, &state);
    let dropped: BTreeSet<&str> = state
        .inventory
        .owned_ids()
        .filter(|id| !cleaned.inventory.owns(id))
        .collect();
    for id in &dropped {
        eprintln!("  dropped unknown item '{id}'");
    }

    super::write_save(&cleaned, output)
}
