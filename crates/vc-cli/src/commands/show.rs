use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use vc_engine::{GameState, Story, choice_views, get_current_node};

pub fn run(story_path: &Path, save_path: &Path) -> Result<(), String> {
    let story = super::load_story(story_path)?;
    let state = super::load_save(save_path, &story)?;

    println!("  {} [{}]", story.meta.title.bold(), state.node_id.dimmed());
    println!();

    match get_current_node(&story, &state) {
        Some(node) => {
            for line in node.text.lines() {
                println!("  {}", line.trim());
            }
            println!();
            print_choices(&story, &state);
        }
        None => {
            println!("  {}", "This node does not exist in the story.".red());
            println!();
        }
    }

    print_sheet(&story, &state);
    Ok(())
}

fn print_choices(story: &Story, state: &GameState) {
    let views = choice_views(story, state);
    if views.is_empty() {
        println!("  {}", "The End.".italic());
        println!();
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Choice", "Status"]);
    for (index, view) in views.iter().enumerate() {
        let status = match &view.reason {
            Some(reason) => format!("locked: {reason}"),
            None => "available".to_string(),
        };
        table.add_row(vec![index.to_string(), view.text.clone(), status]);
    }
    println!("{table}");
    println!();
}

fn print_sheet(story: &Story, state: &GameState) {
    let stats: Vec<String> = state
        .stats
        .iter()
        .map(|(key, value)| format!("{key} {value}"))
        .collect();
    println!("  stats:      {}", stats.join(", "));

    for resource in state.resources.values() {
        let line = resource.to_string();
        if resource.is_empty() {
            println!("  {}", line.red());
        } else if resource.is_full() {
            println!("  {}", line.green());
        } else {
            println!("  {line}");
        }
    }

    let inventory = &state.inventory;
    for slot in vc_engine::Slot::ALL {
        let name = inventory
            .slot(slot)
            .map(|id| item_name(story, id).to_string())
            .unwrap_or_else(|| "—".to_string());
        println!("  {:<11} {name}", format!("{slot}:"));
    }
    if !inventory.items.is_empty() {
        let names: Vec<&str> = inventory.items.iter().map(|id| item_name(story, id)).collect();
        println!("  gear:       {}", names.join(", "));
    }
    if !inventory.consumables.is_empty() {
        println!("  supplies:   {}", inventory.consumables.join(", "));
    }

    let flags: Vec<&str> = state
        .flags
        .iter()
        .filter(|(key, value)| key.as_str() != vc_engine::LAST_EQUIP_ERROR_FLAG && value.is_truthy())
        .map(|(key, _)| key.as_str())
        .collect();
    if !flags.is_empty() {
        println!("  flags:      {}", flags.join(", "));
    }

    if let Some(message) = state.last_equip_error() {
        println!();
        println!("  {}", message.yellow());
    }
}

fn item_name<'a>(story: &'a Story, id: &'a str) -> &'a str {
    story.item(id).map_or(id, |def| def.display_name(id))
}
