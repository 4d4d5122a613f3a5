use std::path::Path;

use vc_engine::create_new_game_state;

pub fn run(story_path: &Path, output: Option<&Path>) -> Result<(), String> {
    let story = super::load_story(story_path)?;
    let state = create_new_game_state(&story);
    super::write_save(&state, output)
}
