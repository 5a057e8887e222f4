//! # Document Model
//!
//! A design is a graph of screens and components addressed by numeric id.
//! Screens and components share one id space, allocated from `next_id`.
//!
//! ```text
//! Design
//!  ├─ screens:    { id → Screen { root } }
//!  ├─ screenOrder [id, ...]
//!  └─ components: { id → Component { children, propComponents } }
//! ```
//!
//! Snapshots serialize to the JSON shape the designer has always stored:
//! camelCase keys, id-keyed maps with string keys, and any fields this
//! crate does not know about carried along untouched.

use crate::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Identifier shared by screens and components
pub type Id = u64;

/// Free-form property bag
pub type Props = Map<String, Value>;

/// The whole design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub name: String,

    #[serde(default, with = "id_map")]
    pub screens: BTreeMap<Id, Screen>,

    #[serde(default)]
    pub screen_order: Vec<Id>,

    #[serde(default, with = "id_map")]
    pub components: BTreeMap<Id, Component>,

    #[serde(default)]
    pub next_id: Id,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Value>,

    /// Last save time, RFC 3339 UTC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Remote identifier of a published design
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Set when the design came from the remote service unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A routable top-level container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: Id,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Id>,

    #[serde(default)]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A typed node in the UI tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: Id,

    /// Qualified type name, `"<library>.<name>"`
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub props: Props,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_props: Option<Props>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Id>>,

    /// Components synthesized for component-valued properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prop_components: Option<Vec<Id>>,

    /// Lifecycle bound to the owning component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Component {
    pub fn new(id: Id, type_name: impl Into<String>, props: Props) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            name: None,
            props,
            design_props: None,
            children: None,
            prop_components: None,
            coupled: None,
            collapsed: None,
            hide: None,
            text: None,
            extra: Map::new(),
        }
    }

    pub fn children(&self) -> &[Id] {
        self.children.as_deref().unwrap_or_default()
    }

    pub fn prop_components(&self) -> &[Id] {
        self.prop_components.as_deref().unwrap_or_default()
    }

    pub fn is_coupled(&self) -> bool {
        self.coupled.unwrap_or(false)
    }

    /// Drop `id` from both structural lists; true if anything changed
    pub(crate) fn forget_child(&mut self, id: Id) -> bool {
        let mut changed = false;
        for list in [&mut self.children, &mut self.prop_components]
            .into_iter()
            .flatten()
        {
            let before = list.len();
            list.retain(|child| *child != id);
            changed |= list.len() != before;
        }
        changed
    }
}

impl Screen {
    pub fn new(id: Id, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            root: None,
            path: path.into(),
            collapsed: None,
            extra: Map::new(),
        }
    }
}

/// Structural invariant violations reported by [`Design::integrity_issues`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// The id is used by both a screen and a component
    IdCollision(Id),
    /// A map key disagrees with the entity's own id
    KeyMismatch { key: Id, id: Id },
    /// `owner` references `target`, which does not exist
    DanglingReference { owner: Id, target: Id },
    /// The component is reachable from more than one owner
    MultipleParents(Id),
    /// `screen_order` is not a permutation of the screen ids
    ScreenOrder,
    /// `next_id` is not above every id in use
    NextIdTooLow { next_id: Id, max_id: Id },
}

impl Design {
    /// Fresh design with one screen and its root box
    pub fn new(name: impl Into<String>) -> Self {
        let mut screen = Screen::new(1, "Screen", "/");
        screen.root = Some(2);

        let props = json!({
            "fill": "vertical",
            "overflow": "auto",
            "align": "center",
            "flex": "grow",
        });
        let root = Component::new(2, "grommet.Box", props.as_object().cloned().unwrap_or_default());

        Self {
            name: name.into(),
            screens: BTreeMap::from([(1, screen)]),
            screen_order: vec![1],
            components: BTreeMap::from([(2, root)]),
            next_id: 3,
            theme: None,
            date: None,
            id: None,
            fetched: None,
            derived_from_id: None,
            extra: Map::new(),
        }
    }

    /// Largest id in use by a screen or component
    pub fn max_id(&self) -> Option<Id> {
        let screens = self.screens.keys().next_back().copied();
        let components = self.components.keys().next_back().copied();
        screens.max(components)
    }

    /// Record that a fetched design has been edited locally
    pub(crate) fn mark_derived(&mut self) -> bool {
        if self.fetched != Some(true) {
            return false;
        }
        self.fetched = None;
        if let Some(id) = self.id.take() {
            self.derived_from_id = Some(id);
        }
        true
    }

    /// Check the structural invariants; an empty list means consistent
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for id in self.screens.keys() {
            if self.components.contains_key(id) {
                issues.push(IntegrityIssue::IdCollision(*id));
            }
        }
        for (key, screen) in &self.screens {
            if *key != screen.id {
                issues.push(IntegrityIssue::KeyMismatch { key: *key, id: screen.id });
            }
        }
        for (key, component) in &self.components {
            if *key != component.id {
                issues.push(IntegrityIssue::KeyMismatch { key: *key, id: component.id });
            }
        }

        let mut owned = BTreeSet::new();
        for (id, screen) in &self.screens {
            if let Some(root) = screen.root {
                if !self.components.contains_key(&root) {
                    issues.push(IntegrityIssue::DanglingReference { owner: *id, target: root });
                }
                if !owned.insert(root) {
                    issues.push(IntegrityIssue::MultipleParents(root));
                }
            }
        }
        for (id, component) in &self.components {
            for target in component.children().iter().chain(component.prop_components()) {
                if !self.components.contains_key(target) {
                    issues.push(IntegrityIssue::DanglingReference { owner: *id, target: *target });
                }
                if !owned.insert(*target) {
                    issues.push(IntegrityIssue::MultipleParents(*target));
                }
            }
        }

        let order: BTreeSet<Id> = self.screen_order.iter().copied().collect();
        let keys: BTreeSet<Id> = self.screens.keys().copied().collect();
        if order.len() != self.screen_order.len() || order != keys {
            issues.push(IntegrityIssue::ScreenOrder);
        }

        if let Some(max_id) = self.max_id() {
            if self.next_id <= max_id {
                issues.push(IntegrityIssue::NextIdTooLow { next_id: self.next_id, max_id });
            }
        }

        issues
    }
}

/// Holds the single live design and allocates ids from it
#[derive(Debug, Default)]
pub struct DocumentStore {
    design: Option<Design>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Design> {
        self.design.as_ref()
    }

    pub fn get_mut(&mut self) -> EditorResult<&mut Design> {
        self.design.as_mut().ok_or(EditorError::NoDesign)
    }

    /// Swap in a new live design, returning the previous one
    pub fn replace(&mut self, design: Design) -> Option<Design> {
        self.design.replace(design)
    }

    pub fn take(&mut self) -> Option<Design> {
        self.design.take()
    }

    /// Hand out `next_id` and advance it
    pub fn allocate_id(&mut self) -> EditorResult<Id> {
        let design = self.get_mut()?;
        let id = design.next_id;
        design.next_id += 1;
        tracing::debug!(id, "allocated id");
        Ok(id)
    }
}

/// Id-keyed maps travel as JSON objects, so keys are strings on the wire
mod id_map {
    use super::Id;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S, T>(map: &BTreeMap<Id, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_map(map.iter().map(|(id, value)| (id.to_string(), value)))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<Id, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let raw = BTreeMap::<String, T>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| {
                key.parse::<Id>()
                    .map(|id| (id, value))
                    .map_err(|_| D::Error::custom(format!("invalid id key {key:?}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_design_shape() {
        let design = Design::new("my design");

        assert_eq!(design.name, "my design");
        assert_eq!(design.screen_order, vec![1]);
        assert_eq!(design.next_id, 3);

        let screen = &design.screens[&1];
        assert_eq!(screen.root, Some(2));
        assert_eq!(screen.path, "/");

        let root = &design.components[&2];
        assert_eq!(root.type_name, "grommet.Box");
        assert_eq!(
            Value::Object(root.props.clone()),
            json!({ "fill": "vertical", "overflow": "auto", "align": "center", "flex": "grow" })
        );
        assert!(design.integrity_issues().is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_unknown_fields() {
        let json = json!({
            "name": "shop",
            "screens": { "1": { "id": 1, "name": "Home", "root": 2, "path": "/", "layout": "wide" } },
            "screenOrder": [1],
            "components": {
                "2": { "id": 2, "type": "grommet.Box", "props": {}, "children": [3] },
                "3": { "id": 3, "type": "grommet.Button", "props": { "label": "Buy" },
                       "designProps": { "link": { "screen": 1 } }, "hide": true }
            },
            "nextId": 4,
            "theme": "grommet",
            "data": { "products": [] },
            "derivedFromId": "abc"
        });

        let design: Design = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(design.screens[&1].extra.get("layout"), Some(&json!("wide")));
        assert_eq!(design.extra.get("data"), Some(&json!({ "products": [] })));
        assert_eq!(design.components[&3].hide, Some(true));
        assert_eq!(design.derived_from_id.as_deref(), Some("abc"));

        let back = serde_json::to_value(&design).unwrap();
        assert_eq!(back, json);

        let again: Design = serde_json::from_value(back).unwrap();
        assert_eq!(again, design);
    }

    #[test]
    fn test_non_numeric_keys_rejected() {
        let json = json!({ "name": "x", "screens": { "one": { "id": 1, "path": "/" } } });
        assert!(serde_json::from_value::<Design>(json).is_err());
    }

    #[test]
    fn test_integrity_issues_detected() {
        let mut design = Design::new("broken");
        design.components.get_mut(&2).unwrap().children = Some(vec![9]);
        design.screen_order.push(1);
        design.next_id = 2;

        let issues = design.integrity_issues();
        assert!(issues.contains(&IntegrityIssue::DanglingReference { owner: 2, target: 9 }));
        assert!(issues.contains(&IntegrityIssue::ScreenOrder));
        assert!(issues.contains(&IntegrityIssue::NextIdTooLow { next_id: 2, max_id: 2 }));
    }

    #[test]
    fn test_allocate_id_advances_counter() {
        let mut store = DocumentStore::new();
        assert!(matches!(store.allocate_id(), Err(EditorError::NoDesign)));

        store.replace(Design::new("d"));
        assert_eq!(store.allocate_id().unwrap(), 3);
        assert_eq!(store.allocate_id().unwrap(), 4);
        assert_eq!(store.get().unwrap().next_id, 5);
    }

    #[test]
    fn test_mark_derived_only_for_fetched() {
        let mut design = Design::new("d");
        assert!(!design.mark_derived());

        design.id = Some("abc".to_string());
        design.fetched = Some(true);
        assert!(design.mark_derived());
        assert_eq!(design.id, None);
        assert_eq!(design.fetched, None);
        assert_eq!(design.derived_from_id.as_deref(), Some("abc"));
    }
}
