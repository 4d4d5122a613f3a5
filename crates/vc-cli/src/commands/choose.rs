use std::path::Path;

use tracing::debug;

pub fn run(
    story_path: &Path,
    save_path: &Path,
    index: usize,
    output: Option<&Path>,
) -> Result<(), String> {
    let story = super::load_story(story_path)?;
    let state = super::load_save(save_path, &story)?;

    let next = vc_engine::choose(&story, &state, index).map_err(|e| e.to_string())?;
    debug!(from = %state.node_id, to = %next.node_id, index, "choice taken");

    if let Some(message) = next.last_equip_error() {
        eprintln!("  {message}");
    }
    super::write_save(&next, output)
}
