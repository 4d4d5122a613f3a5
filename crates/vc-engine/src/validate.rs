//! Structural validation and strict linting of story documents.
//!
//! [`validate_story`] is the gate a document must pass before a run can
//! start. It works on raw JSON so it can report shape problems that typed
//! decoding would collapse into a single error, and it accumulates every
//! problem instead of stopping at the first.
//!
//! [`lint_story`] goes further and inspects requirement and effect contents,
//! which the engine otherwise accepts or silently skips.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::effect::Effect;
use crate::inventory::Slot;
use crate::requirement::Requirement;
use crate::state::{STORY_SCHEMA_VERSION, Stats};
use crate::story::Story;

/// The outcome of structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when `errors` is empty.
    pub ok: bool,
    /// Every problem found, in document order.
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            ok: errors.is_empty(),
            errors,
        }
    }
}

/// Structurally check a story document.
///
/// Never fails; problems are collected into the report. Requirement and
/// effect contents are only shape-checked here.
pub fn validate_story(story: &Value) -> ValidationReport {
    let mut errors = Vec::new();

    if !story.is_object() {
        errors.push("Story must be an object.".to_string());
    }
    let schema = story.get("schemaVersion").and_then(Value::as_f64);
    if schema != Some(f64::from(STORY_SCHEMA_VERSION)) {
        errors.push(format!("schemaVersion must be {STORY_SCHEMA_VERSION}."));
    }
    let meta = story.get("meta");
    if non_empty_str(meta.and_then(|m| m.get("id"))).is_none() {
        errors.push("meta.id must be a string.".to_string());
    }
    if non_empty_str(meta.and_then(|m| m.get("title"))).is_none() {
        errors.push("meta.title must be a string.".to_string());
    }
    let start = non_empty_str(story.get("start"));
    if start.is_none() {
        errors.push("start must be a string node id.".to_string());
    }

    match story.get("nodes").and_then(Value::as_object) {
        Some(nodes) => {
            if let Some(start) = start.filter(|s| !nodes.contains_key(*s)) {
                errors.push(format!("start node '{start}' not found in nodes."));
            }
            for (node_id, node) in nodes {
                validate_node(node_id, node, nodes, &mut errors);
            }
        }
        None => errors.push("nodes must be an object keyed by node id.".to_string()),
    }

    match present(story.get("items")) {
        None => {}
        Some(Value::Object(items)) => {
            for (id, def) in items {
                validate_item(id, def, &mut errors);
            }
        }
        Some(_) => errors.push("items must be an object keyed by item id (or omitted).".to_string()),
    }

    if present(story.get("resources")).is_some_and(|r| !r.is_object()) {
        errors.push("resources must be an object keyed by resource key (or omitted).".to_string());
    }
    if present(story.get("loadout")).is_some_and(|l| !l.is_object()) {
        errors.push("loadout must be an object (or omitted).".to_string());
    }

    ValidationReport::from_errors(errors)
}

fn validate_node(node_id: &str, node: &Value, nodes: &Map<String, Value>, errors: &mut Vec<String>) {
    if !node.is_object() {
        errors.push(format!("Node '{node_id}' must be an object."));
        return;
    }
    if !node.get("text").is_some_and(Value::is_string) {
        errors.push(format!("Node '{node_id}'.text must be a string."));
    }

    let choices = match present(node.get("choices")) {
        None => return,
        Some(Value::Array(choices)) => choices,
        Some(_) => {
            errors.push(format!("Node '{node_id}'.choices must be an array."));
            return;
        }
    };

    for (idx, choice) in choices.iter().enumerate() {
        let at = format!("Node '{node_id}' choice[{idx}]");
        if !choice.is_object() {
            errors.push(format!("{at} must be an object."));
            continue;
        }
        if !choice.get("text").is_some_and(Value::is_string) {
            errors.push(format!("{at}.text must be a string."));
        }
        match choice.get("to").and_then(Value::as_str) {
            Some(to) if !nodes.contains_key(to) => {
                errors.push(format!("{at} points to missing node '{to}'."));
            }
            Some(_) => {}
            None => errors.push(format!("{at}.to must be a string node id.")),
        }
        if present(choice.get("require")).is_some_and(|r| !r.is_object()) {
            errors.push(format!("{at}.require must be an object."));
        }
        if present(choice.get("effects")).is_some_and(|e| !e.is_array()) {
            errors.push(format!("{at}.effects must be an array."));
        }
    }
}

fn validate_item(id: &str, def: &Value, errors: &mut Vec<String>) {
    if !def.is_object() {
        errors.push(format!("items['{id}'] must be an object."));
        return;
    }
    match present(def.get("allowedSlots")) {
        None => {}
        Some(Value::Array(slots)) => {
            for slot in slots {
                if slot.as_str().and_then(Slot::parse).is_none() {
                    errors.push(format!(
                        "items['{id}'].allowedSlots contains invalid slot '{}'.",
                        display_value(slot)
                    ));
                }
            }
        }
        Some(_) => errors.push(format!("items['{id}'].allowedSlots must be an array (if present).")),
    }
    for hook in ["onEquip", "onUnequip"] {
        if present(def.get(hook)).is_some_and(|h| !h.is_array()) {
            errors.push(format!("items['{id}'].{hook} must be an array (if present)."));
        }
    }
}

/// Treat JSON `null` like an absent field.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A problem found by [`lint_story`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Where in the document the issue is (e.g. `node 'intro' choice[0]`).
    pub location: String,
    /// A human-readable description of the issue.
    pub message: String,
    /// Errors stop the document from decoding; warnings describe input the
    /// engine will ignore at runtime.
    pub is_error: bool,
}

impl ValidationIssue {
    fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            is_error: true,
        }
    }

    fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
            is_error: false,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = if self.is_error { "error" } else { "warning" };
        write!(f, "{level}: {}: {}", self.location, self.message)
    }
}

/// Strictly lint the contents of a story document.
///
/// Run this after [`validate_story`]; it assumes the overall shape is sound
/// and looks for authoring mistakes the engine would otherwise ignore:
/// unknown effect ops, malformed payloads, unknown stats, equips that can
/// never succeed, and loadout entries that will be dropped. Linting never
/// changes how the engine behaves.
pub fn lint_story(story: &Value) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let typed = match Story::from_value(story.clone()) {
        Ok(typed) => Some(typed),
        Err(err) => {
            issues.push(ValidationIssue::error(
                "story",
                format!("document does not decode: {err}"),
            ));
            None
        }
    };
    let linter = Linter {
        story: typed.as_ref(),
        declared_resources: story
            .get("resources")
            .and_then(Value::as_object)
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default(),
    };

    if let Some(nodes) = story.get("nodes").and_then(Value::as_object) {
        for (node_id, node) in nodes {
            let Some(choices) = node.get("choices").and_then(Value::as_array) else {
                continue;
            };
            for (idx, choice) in choices.iter().enumerate() {
                let at = format!("node '{node_id}' choice[{idx}]");
                if let Some(require) = present(choice.get("require")) {
                    linter.require(&at, require, &mut issues);
                }
                if let Some(effects) = choice.get("effects").and_then(Value::as_array) {
                    linter.effects(&at, effects, &mut issues);
                }
            }
        }
    }

    if let Some(items) = story.get("items").and_then(Value::as_object) {
        for (id, def) in items {
            for hook in ["onEquip", "onUnequip"] {
                if let Some(effects) = def.get(hook).and_then(Value::as_array) {
                    linter.effects(&format!("item '{id}' {hook}"), effects, &mut issues);
                }
            }
        }
    }

    if let Some(loadout) = story.get("loadout").and_then(Value::as_object) {
        linter.loadout(loadout, &mut issues);
    }

    issues
}

struct Linter<'a> {
    story: Option<&'a Story>,
    declared_resources: BTreeSet<String>,
}

impl Linter<'_> {
    fn catalog_has(&self, id: &str) -> Option<bool> {
        let story = self.story?;
        story.has_catalog().then(|| story.item(id).is_some())
    }

    fn require(&self, at: &str, require: &Value, issues: &mut Vec<ValidationIssue>) {
        let location = format!("{at} require");
        let requirement: Requirement = match serde_json::from_value(require.clone()) {
            Ok(r) => r,
            Err(err) => {
                issues.push(ValidationIssue::error(location, format!("malformed require: {err}")));
                return;
            }
        };
        for key in ["statGte", "resourceGte", "resourceLte"] {
            match present(require.get(key)) {
                None => {}
                Some(Value::Object(bounds)) => {
                    for (name, bound) in bounds.iter().filter(|(_, b)| !b.is_number()) {
                        issues.push(ValidationIssue::warning(
                            &location,
                            format!("{key}.{name} is not a number ({bound}) and is ignored"),
                        ));
                    }
                }
                Some(other) => issues.push(ValidationIssue::warning(
                    &location,
                    format!("{key} is not an object ({other}) and is ignored"),
                )),
            }
        }
        for key in ["hasFlag", "hasItem", "hasConsumable"] {
            match present(require.get(key)) {
                None => {}
                Some(Value::Array(ids)) => {
                    for id in ids.iter().filter(|id| !id.is_string()) {
                        issues.push(ValidationIssue::warning(
                            &location,
                            format!("{key} entry {id} is not a string and is ignored"),
                        ));
                    }
                }
                Some(other) => issues.push(ValidationIssue::warning(
                    &location,
                    format!("{key} is not a list ({other}) and is ignored"),
                )),
            }
        }
        for key in requirement.stat_gte.keys() {
            if Stats::KEYS.contains(&key.as_str()) {
                continue;
            }
            issues.push(ValidationIssue::warning(
                &location,
                format!("unknown stat '{key}' always reads as 0"),
            ));
        }
        let resources = requirement
            .resource_gte
            .keys()
            .chain(requirement.resource_lte.keys());
        for key in resources {
            if !self.declared_resources.contains(key) {
                issues.push(ValidationIssue::warning(
                    &location,
                    format!("resource '{key}' is not declared and reads as 0 until an effect creates it"),
                ));
            }
        }
        for id in &requirement.has_item {
            if self.catalog_has(id) == Some(false) {
                issues.push(ValidationIssue::warning(
                    &location,
                    format!("item '{id}' is not in the item catalog"),
                ));
            }
        }
    }

    fn effects(&self, at: &str, effects: &[Value], issues: &mut Vec<ValidationIssue>) {
        for (idx, raw) in effects.iter().enumerate() {
            let location = format!("{at} effect[{idx}]");
            let Some(op) = raw.get("op").and_then(Value::as_str) else {
                issues.push(ValidationIssue::warning(location, "effect has no op and is ignored"));
                continue;
            };
            if !Effect::OPS.contains(&op) {
                issues.push(ValidationIssue::warning(
                    location,
                    format!("unknown op '{op}' is ignored"),
                ));
                continue;
            }
            let effect: Effect = match serde_json::from_value(raw.clone()) {
                Ok(effect) => effect,
                Err(err) => {
                    issues.push(ValidationIssue::warning(
                        location,
                        format!("malformed '{op}' payload is ignored: {err}"),
                    ));
                    continue;
                }
            };
            self.effect(&location, &effect, issues);
        }
    }

    fn effect(&self, location: &str, effect: &Effect, issues: &mut Vec<ValidationIssue>) {
        match effect {
            Effect::StatAdd { key, .. } if !Stats::KEYS.contains(&key.as_str()) => {
                issues.push(ValidationIssue::warning(
                    location,
                    format!("unknown stat '{key}' is ignored"),
                ));
            }
            Effect::GiveItem { id } if self.catalog_has(id) == Some(false) => {
                issues.push(ValidationIssue::warning(
                    location,
                    format!("item '{id}' is not in the item catalog and cannot be equipped"),
                ));
            }
            Effect::Equip { slot, id } => {
                if let Some(Err(err)) = self.story.map(|s| s.check_slot(id, *slot)) {
                    issues.push(ValidationIssue::warning(
                        location,
                        format!("equip can never succeed: {err}"),
                    ));
                }
            }
            _ => {}
        }
    }

    fn loadout(&self, loadout: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) {
        for list in ["items", "consumables"] {
            let Some(entries) = present(loadout.get(list)) else {
                continue;
            };
            let location = format!("loadout {list}");
            match entries.as_array() {
                Some(entries) => {
                    for entry in entries.iter().filter(|e| !e.is_string()) {
                        issues.push(ValidationIssue::warning(
                            &location,
                            format!("non-string entry {entry} is dropped"),
                        ));
                    }
                }
                None => issues.push(ValidationIssue::warning(location, "not an array; ignored")),
            }
        }

        if let Some(equip) = loadout.get("equip").and_then(Value::as_object) {
            for (slot_key, id) in equip {
                let location = format!("loadout equip.{slot_key}");
                let Some(slot) = Slot::parse(slot_key) else {
                    issues.push(ValidationIssue::warning(location, "unknown slot is ignored"));
                    continue;
                };
                let Some(id) = id.as_str() else {
                    issues.push(ValidationIssue::warning(location, "item id must be a string"));
                    continue;
                };
                if let Some(Err(err)) = self.story.map(|s| s.check_slot(id, slot)) {
                    issues.push(ValidationIssue::warning(
                        location,
                        format!("starting equipment is dropped: {err}"),
                    ));
                }
            }
        }

        if let Some(overrides) = loadout.get("resources").and_then(Value::as_object) {
            for key in overrides.keys() {
                if !self.declared_resources.contains(key) {
                    issues.push(ValidationIssue::warning(
                        "loadout resources",
                        format!("override for undeclared resource '{key}' is ignored"),
                    ));
                }
            }
        }
    }
}
