//! Schema upgrade: turn a raw snapshot into a consistent [`Design`].
//!
//! Snapshots come from local storage written by older versions, from the
//! remote service, and from documents that had components removed without
//! their loose references being repaired. Everything here is lenient: the
//! only hard failure is a value that is not a design at all.

use crate::document::{Design, Id};
use crate::{EditorError, EditorResult};
use designer_library::Registry;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

/// Deserialize and normalize a raw snapshot
pub fn upgrade_design(raw: Value, registry: &Registry) -> EditorResult<Design> {
    if !raw.is_object() {
        return Err(EditorError::SchemaUpgrade(format!(
            "expected a design object, got {}",
            kind_of(&raw)
        )));
    }

    let mut design: Design =
        serde_json::from_value(raw).map_err(|e| EditorError::SchemaUpgrade(e.to_string()))?;

    let repairs = normalize(&mut design, registry);
    if repairs > 0 {
        tracing::info!(design = %design.name, repairs, "upgraded design");
    }
    Ok(design)
}

/// Repair structural problems in place; returns the number of repairs
pub fn normalize(design: &mut Design, registry: &Registry) -> usize {
    let mut repairs = 0;

    repairs += fix_keys(design);
    repairs += fix_screen_order(design);
    repairs += drop_dangling(design);
    repairs += enforce_single_parent(design);
    repairs += clear_missing_slots(design, registry);

    let floor = design.max_id().map_or(1, |max| max + 1);
    if design.next_id < floor {
        tracing::debug!(from = design.next_id, to = floor, "raised nextId");
        design.next_id = floor;
        repairs += 1;
    }

    repairs
}

/// Map keys are authoritative for ids
fn fix_keys(design: &mut Design) -> usize {
    let mut repairs = 0;
    for (key, screen) in design.screens.iter_mut() {
        if screen.id != *key {
            screen.id = *key;
            repairs += 1;
        }
    }
    for (key, component) in design.components.iter_mut() {
        if component.id != *key {
            component.id = *key;
            repairs += 1;
        }
    }
    repairs
}

fn fix_screen_order(design: &mut Design) -> usize {
    let mut seen = HashSet::new();
    let order: Vec<Id> = design
        .screen_order
        .iter()
        .copied()
        .filter(|id| design.screens.contains_key(id) && seen.insert(*id))
        .chain(
            design
                .screens
                .keys()
                .copied()
                .filter(|id| !design.screen_order.contains(id)),
        )
        .collect();

    if order == design.screen_order {
        return 0;
    }
    tracing::debug!(from = ?design.screen_order, to = ?order, "repaired screenOrder");
    design.screen_order = order;
    1
}

fn drop_dangling(design: &mut Design) -> usize {
    let known: HashSet<Id> = design.components.keys().copied().collect();
    let mut repairs = 0;

    for screen in design.screens.values_mut() {
        if let Some(root) = screen.root {
            if !known.contains(&root) {
                screen.root = None;
                repairs += 1;
            }
        }
    }

    for component in design.components.values_mut() {
        let id = component.id;
        for list in [&mut component.children, &mut component.prop_components]
            .into_iter()
            .flatten()
        {
            let before = list.len();
            list.retain(|target| *target != id && known.contains(target));
            repairs += before - list.len();
        }
    }

    repairs
}

/// Each component keeps only its first owner, scanning owners by id
fn enforce_single_parent(design: &mut Design) -> usize {
    let owners: BTreeSet<Id> = design
        .screens
        .keys()
        .chain(design.components.keys())
        .copied()
        .collect();

    let mut claimed = HashSet::new();
    let mut repairs = 0;

    for owner in owners {
        if let Some(screen) = design.screens.get_mut(&owner) {
            if let Some(root) = screen.root {
                if !claimed.insert(root) {
                    screen.root = None;
                    repairs += 1;
                }
            }
        } else if let Some(component) = design.components.get_mut(&owner) {
            for list in [&mut component.children, &mut component.prop_components]
                .into_iter()
                .flatten()
            {
                let before = list.len();
                list.retain(|target| claimed.insert(*target));
                repairs += before - list.len();
            }
        }
    }

    repairs
}

/// Component-valued props whose component no longer exists
fn clear_missing_slots(design: &mut Design, registry: &Registry) -> usize {
    let known: HashSet<Id> = design.components.keys().copied().collect();
    let mut repairs = 0;

    for component in design.components.values_mut() {
        let Some(component_type) = registry.component_type(&component.type_name) else {
            continue;
        };
        for (name, _) in component_type.component_properties() {
            let missing = component
                .props
                .get(name)
                .and_then(Value::as_u64)
                .is_some_and(|target| !known.contains(&target));
            if missing {
                component.props.remove(name);
                repairs += 1;
            }
        }
    }

    repairs
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
