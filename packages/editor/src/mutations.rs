//! # Design Mutations
//!
//! Structural editing operations on the live design, built on the
//! copy-on-write primitives of [`DesignSession`].
//!
//! ## Semantics
//!
//! ### Validation
//! - Every operation checks its ids, types and placement before touching
//!   the design; a rejected operation changes nothing and notifies no one
//! - Each operation is one batch: one history entry, one wildcard
//!   notification, one save
//!
//! ### Add
//! - Props start from the type's defaults, caller props win
//! - Component-valued properties materialize as coupled prop components,
//!   allocated after their owner
//! - Placement is exactly one of within, before, after or containing
//!
//! ### Remove
//! - Prop components, then children, then the component itself
//! - Structural references (`children`, `propComponents`, screen `root`)
//!   to removed ids are scrubbed; other references are left for the schema
//!   upgrade to clean up

use crate::document::{Component, Design, Id, Props, Screen};
use crate::session::DesignSession;
use crate::subscriptions::Update;
use crate::{EditorError, EditorResult};
use designer_library::Registry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;

/// Nesting limit for component templates that contain templates
const MAX_TEMPLATE_DEPTH: usize = 8;

/// Fields set directly on a component rather than in a property bucket
const CORE_PROPERTIES: [&str; 3] = ["hide", "name", "text"];

/// Screen fields owned by the structure
const PROTECTED_SCREEN_FIELDS: [&str; 2] = ["id", "root"];

/// Design fields owned by the structure
const PROTECTED_DESIGN_FIELDS: [&str; 4] = ["screens", "components", "screenOrder", "nextId"];

/// Where a new component is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Last child of this component; or root of this screen if it has none
    Within(Id),
    /// Sibling immediately before this component
    Before(Id),
    /// Sibling immediately after this component
    After(Id),
    /// New parent of this component, taking its place
    Containing(Id),
}

/// Options for [`DesignSession::add_component`]
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentOptions {
    pub placement: Placement,
    /// Overrides applied on top of the type's default props
    pub props: Props,
}

impl ComponentOptions {
    pub fn within(id: Id) -> Self {
        Placement::Within(id).into()
    }

    pub fn before(id: Id) -> Self {
        Placement::Before(id).into()
    }

    pub fn after(id: Id) -> Self {
        Placement::After(id).into()
    }

    pub fn containing(id: Id) -> Self {
        Placement::Containing(id).into()
    }

    pub fn with_props(mut self, props: Value) -> Self {
        if let Value::Object(props) = props {
            self.props = props;
        }
        self
    }
}

impl From<Placement> for ComponentOptions {
    fn from(placement: Placement) -> Self {
        Self {
            placement,
            props: Props::new(),
        }
    }
}

/// Destination of [`DesignSession::move_component`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    After(Id),
    Into(Id),
}

/// A component to create, with the prop components it owns
#[derive(Debug)]
struct Blueprint {
    type_name: String,
    props: Props,
    slots: Vec<(String, Blueprint)>,
}

impl Blueprint {
    fn resolve(registry: &Registry, type_name: &str, overrides: Props, depth: usize) -> EditorResult<Self> {
        if depth > MAX_TEMPLATE_DEPTH {
            return Err(EditorError::Precondition(format!(
                "component templates nest more than {MAX_TEMPLATE_DEPTH} deep at {type_name}"
            )));
        }
        let component_type = registry
            .component_type(type_name)
            .ok_or_else(|| EditorError::UnknownType(type_name.to_string()))?;

        let mut props = component_type.default_props.clone();
        props.extend(overrides);

        let slots = component_type
            .component_properties()
            .map(|(name, template)| {
                Self::resolve(registry, &template.type_name, template.props.clone(), depth + 1)
                    .map(|blueprint| (name.to_string(), blueprint))
            })
            .collect::<EditorResult<_>>()?;

        Ok(Self {
            type_name: type_name.to_string(),
            props,
            slots,
        })
    }
}

/// Where to route a `set_property` write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Core,
    Props,
    DesignProps,
}

impl DesignSession {
    /// Append a new screen with a free name and a path derived from it
    pub fn add_screen(&mut self) -> EditorResult<Screen> {
        let design = self.document()?;
        let existing: Vec<String> = design
            .screens
            .values()
            .map(|screen| screen.name.clone().unwrap_or_default())
            .collect();
        let name = generate_name("Screen", &existing);
        let path = slugify(&name);

        self.batch(|session| {
            let id = session.allocate_id()?;
            let screen = Screen::new(id, name, path);

            let design = session.document_mut()?;
            design.screens.insert(id, screen.clone());
            design.screen_order.push(id);
            session.commit();

            tracing::debug!(id, name = ?screen.name, "added screen");
            Ok(screen)
        })
    }

    /// Remove a screen together with its component tree
    pub fn remove_screen(&mut self, id: Id) -> EditorResult<()> {
        let root = self
            .document()?
            .screen(id)
            .ok_or_else(|| EditorError::missing("screen", id))?
            .root;

        self.batch(|session| {
            if let Some(root) = root {
                if session.document()?.components.contains_key(&root) {
                    session.remove_component(root)?;
                }
            }

            let design = session.document_mut()?;
            design.screens.remove(&id);
            design.screen_order.retain(|screen| *screen != id);
            session.notify_entity(id, &Update::Removed(id));
            session.commit();

            tracing::debug!(id, "removed screen");
            Ok(())
        })
    }

    /// Create a component of `type_name` and attach it per the placement.
    ///
    /// Returns the component as stored, including its prop components.
    pub fn add_component(
        &mut self,
        type_name: &str,
        options: impl Into<ComponentOptions>,
    ) -> EditorResult<Component> {
        let ComponentOptions { placement, props } = options.into();

        let blueprint = Blueprint::resolve(self.registry(), type_name, props, 0)?;
        check_placement(self.document()?, placement)?;

        self.batch(|session| {
            let id = session.instantiate(&blueprint, None)?;

            match placement {
                Placement::Within(target) => {
                    if session.document()?.components.contains_key(&target) {
                        session.update_component(target, |parent| {
                            parent.children.get_or_insert_with(Vec::new).push(id);
                            Ok(())
                        })?;
                    } else {
                        session.update_screen(target, |screen| {
                            screen.root = Some(id);
                            Ok(())
                        })?;
                    }
                }
                Placement::Before(sibling) | Placement::After(sibling) => {
                    let offset = usize::from(matches!(placement, Placement::After(_)));
                    let parent = session
                        .document()?
                        .parent_of(sibling)
                        .ok_or_else(|| EditorError::missing("parent of component", sibling))?;
                    session.update_component(parent, |parent| {
                        let children = parent.children.get_or_insert_with(Vec::new);
                        let index = children
                            .iter()
                            .position(|child| *child == sibling)
                            .ok_or_else(|| EditorError::missing("sibling", sibling))?;
                        children.insert(index + offset, id);
                        Ok(())
                    })?;
                }
                Placement::Containing(existing) => {
                    let owner = session
                        .document()?
                        .parent_of(existing)
                        .ok_or_else(|| EditorError::missing("owner of component", existing))?;
                    if session.document()?.screens.contains_key(&owner) {
                        session.update_screen(owner, |screen| {
                            screen.root = Some(id);
                            Ok(())
                        })?;
                    } else {
                        session.update_component(owner, |owner| {
                            let slot = owner
                                .children
                                .iter_mut()
                                .flatten()
                                .find(|child| **child == existing)
                                .ok_or_else(|| EditorError::missing("child", existing))?;
                            *slot = id;
                            Ok(())
                        })?;
                    }
                    session.update_component(id, |wrapper| {
                        wrapper.children = Some(vec![existing]);
                        Ok(())
                    })?;
                }
            }

            tracing::debug!(id, type_name, ?placement, "added component");
            session
                .document()?
                .component(id)
                .cloned()
                .ok_or_else(|| EditorError::missing("component", id))
        })
    }

    /// Create a component and its prop components, unattached
    fn instantiate(&mut self, blueprint: &Blueprint, slot: Option<&str>) -> EditorResult<Id> {
        let id = self.allocate_id()?;
        let mut component = Component::new(id, blueprint.type_name.clone(), blueprint.props.clone());
        if let Some(slot) = slot {
            component.name = Some(slot.to_string());
            component.coupled = Some(true);
        }

        for (name, child) in &blueprint.slots {
            let child_id = self.instantiate(child, Some(name))?;
            component
                .prop_components
                .get_or_insert_with(Vec::new)
                .push(child_id);
            component.props.insert(name.clone(), json!(child_id));
        }

        self.document_mut()?.components.insert(id, component);
        self.commit();
        Ok(id)
    }

    /// Delete a component, its prop components and its children
    pub fn remove_component(&mut self, id: Id) -> EditorResult<()> {
        let design = self.document()?;
        if !design.components.contains_key(&id) {
            return Err(EditorError::missing("component", id));
        }

        let mut doomed = Vec::new();
        collect_subtree(design, id, &mut HashSet::new(), &mut doomed);
        let removed: HashSet<Id> = doomed.iter().copied().collect();

        let owners: Vec<Id> = design
            .components
            .values()
            .filter(|c| !removed.contains(&c.id))
            .filter(|c| c.children().iter().chain(c.prop_components()).any(|x| removed.contains(x)))
            .map(|c| c.id)
            .collect();
        let screens: Vec<Id> = design
            .screens
            .values()
            .filter(|s| s.root.is_some_and(|root| removed.contains(&root)))
            .map(|s| s.id)
            .collect();

        self.batch(|session| {
            for screen in screens {
                session.update_screen(screen, |screen| {
                    screen.root = None;
                    Ok(())
                })?;
            }
            for owner in owners {
                session.update_component(owner, |owner| {
                    for target in &removed {
                        owner.forget_child(*target);
                    }
                    Ok(())
                })?;
            }

            for target in &doomed {
                session.document_mut()?.components.remove(target);
                session.notify_entity(*target, &Update::Removed(*target));
            }
            session.commit();

            tracing::debug!(id, removed = doomed.len(), "removed component");
            Ok(())
        })
    }

    /// Set or, with `None`, delete a component property.
    ///
    /// `hide`, `name` and `text` live on the component itself; names the
    /// type declares as properties go to `props`, declared design
    /// properties to `designProps`. Anything else is rejected.
    pub fn set_property(&mut self, id: Id, name: &str, value: Option<Value>) -> EditorResult<()> {
        let design = self.document()?;
        let component = design
            .component(id)
            .ok_or_else(|| EditorError::missing("component", id))?;

        let component_type = self.component_type(&component.type_name);
        let bucket = if CORE_PROPERTIES.contains(&name) {
            Bucket::Core
        } else if component_type.is_some_and(|t| t.declares_property(name)) {
            Bucket::Props
        } else if component_type.is_some_and(|t| t.declares_design_property(name)) {
            Bucket::DesignProps
        } else {
            return Err(EditorError::UnknownProperty {
                target: design.name_of(id),
                name: name.to_string(),
            });
        };

        self.update_component(id, |component| {
            match bucket {
                Bucket::Core => set_core_property(component, name, value)?,
                Bucket::Props => set_or_remove(&mut component.props, name, value),
                Bucket::DesignProps => {
                    set_or_remove(component.design_props.get_or_insert_with(Props::new), name, value)
                }
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Set or delete a screen field
    pub fn set_screen_property(&mut self, id: Id, name: &str, value: Option<Value>) -> EditorResult<()> {
        if PROTECTED_SCREEN_FIELDS.contains(&name) {
            return Err(EditorError::ProtectedProperty(name.to_string()));
        }
        self.update_screen(id, |screen| set_field(screen, name, value))?;
        Ok(())
    }

    /// Set or delete a design field; changing `theme` reloads the theme
    pub fn set_design_property(&mut self, name: &str, value: Option<Value>) -> EditorResult<()> {
        if PROTECTED_DESIGN_FIELDS.contains(&name) {
            return Err(EditorError::ProtectedProperty(name.to_string()));
        }
        self.update_design(|design| set_field(design, name, value))?;
        if name == "theme" {
            self.reload_theme();
        }
        Ok(())
    }

    /// Flip the collapsed flag of a screen or component
    pub fn toggle_collapsed(&mut self, id: Id) -> EditorResult<()> {
        let design = self.document()?;
        if design.screens.contains_key(&id) {
            self.update_screen(id, |screen| {
                screen.collapsed = Some(!screen.collapsed.unwrap_or(false));
                Ok(())
            })?;
        } else if design.components.contains_key(&id) {
            self.update_component(id, |component| {
                component.collapsed = Some(!component.collapsed.unwrap_or(false));
                Ok(())
            })?;
        } else {
            return Err(EditorError::missing("screen or component", id));
        }
        Ok(())
    }

    /// Relocate a component. Reparent vs. reorder semantics are undecided,
    /// so this always fails.
    pub fn move_component(&mut self, _id: Id, _target: MoveTarget) -> EditorResult<()> {
        Err(EditorError::Unimplemented("moveComponent"))
    }
}

/// Reject placements that cannot be carried out on `design`
fn check_placement(design: &Design, placement: Placement) -> EditorResult<()> {
    match placement {
        Placement::Within(target) => {
            if design.components.contains_key(&target) {
                return Ok(());
            }
            match design.screen(target) {
                Some(screen) if screen.root.is_none() => Ok(()),
                Some(_) => Err(EditorError::Precondition(format!(
                    "screen {target} already has a root component"
                ))),
                None => Err(EditorError::missing("component", target)),
            }
        }
        Placement::Before(sibling) | Placement::After(sibling) => {
            if !design.components.contains_key(&sibling) {
                return Err(EditorError::missing("component", sibling));
            }
            let parent = design
                .parent_of(sibling)
                .and_then(|parent| design.component(parent))
                .filter(|parent| parent.children().contains(&sibling));
            match parent {
                Some(_) => Ok(()),
                None => Err(EditorError::Precondition(format!(
                    "component {sibling} is not a child of another component"
                ))),
            }
        }
        Placement::Containing(existing) => {
            if !design.components.contains_key(&existing) {
                return Err(EditorError::missing("component", existing));
            }
            let Some(owner) = design.parent_of(existing) else {
                return Err(EditorError::Precondition(format!(
                    "component {existing} has no owner to take its place in"
                )));
            };
            match design.component(owner) {
                Some(owner) if !owner.children().contains(&existing) => {
                    Err(EditorError::Precondition(format!(
                        "prop component {existing} cannot be wrapped"
                    )))
                }
                _ => Ok(()),
            }
        }
    }
}

/// Post-order: prop components, then children, then the component
fn collect_subtree(design: &Design, id: Id, visited: &mut HashSet<Id>, out: &mut Vec<Id>) {
    if !visited.insert(id) {
        return;
    }
    let Some(component) = design.component(id) else {
        return;
    };
    for child in component.prop_components().iter().chain(component.children()) {
        collect_subtree(design, *child, visited, out);
    }
    out.push(id);
}

fn set_core_property(component: &mut Component, name: &str, value: Option<Value>) -> EditorResult<()> {
    let invalid = |expected: &str, value: &Value| EditorError::InvalidProperty {
        name: name.to_string(),
        reason: format!("expected {expected}, got {value}"),
    };

    match name {
        "hide" => {
            component.hide = value
                .map(|v| v.as_bool().ok_or_else(|| invalid("a boolean", &v)))
                .transpose()?;
        }
        "name" | "text" => {
            let value = value
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    other => Err(invalid("a string", &other)),
                })
                .transpose()?;
            if name == "name" {
                component.name = value;
            } else {
                component.text = value;
            }
        }
        _ => {
            return Err(EditorError::UnknownProperty {
                target: component.type_name.clone(),
                name: name.to_string(),
            })
        }
    }
    Ok(())
}

fn set_or_remove(bucket: &mut Props, name: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            bucket.insert(name.to_string(), value);
        }
        None => {
            bucket.remove(name);
        }
    }
}

/// Set a field by its JSON name, going through the serialized form so
/// unknown names land in the flattened `extra` map
fn set_field<T>(target: &mut T, name: &str, value: Option<Value>) -> EditorResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let Value::Object(mut fields) = serde_json::to_value(&*target)? else {
        return Err(EditorError::Precondition(format!(
            "cannot set {name:?} on a non-object value"
        )));
    };
    set_or_remove(&mut fields, name, value);

    *target = serde_json::from_value(Value::Object(fields)).map_err(|e| EditorError::InvalidProperty {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// `base` if free, else `"<base> N"` with N counting up from one past the
/// number of existing names
pub fn generate_name<S: AsRef<str>>(base: &str, existing: &[S]) -> String {
    let taken = |candidate: &str| existing.iter().any(|name| name.as_ref() == candidate);
    if !taken(base) {
        return base.to_string();
    }

    let mut suffix = existing.len();
    loop {
        suffix += 1;
        let candidate = format!("{base} {suffix}");
        if !taken(&candidate) {
            return candidate;
        }
    }
}

/// Route path for a screen name: `"My Screen!"` → `"/my-screen"`
pub fn slugify(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    format!("/{slug}")
}
