//! Read-only structural queries over a design snapshot.
//!
//! Unknown ids are not errors here: lookups come back `None` and
//! traversals come back empty.

use crate::document::{Component, Design, Id, Screen};
use std::collections::HashSet;

impl Design {
    pub fn screen(&self, id: Id) -> Option<&Screen> {
        self.screens.get(&id)
    }

    pub fn component(&self, id: Id) -> Option<&Component> {
        self.components.get(&id)
    }

    /// The screen whose root is `id`, if any
    pub fn screen_rooted_at(&self, id: Id) -> Option<Id> {
        self.screens
            .values()
            .find(|screen| screen.root == Some(id))
            .map(|screen| screen.id)
    }

    /// Owner of `id`: a component listing it as a child or prop
    /// component, else a screen using it as root.
    pub fn parent_of(&self, id: Id) -> Option<Id> {
        self.components
            .values()
            .find(|c| c.children().contains(&id) || c.prop_components().contains(&id))
            .map(|c| c.id)
            .or_else(|| self.screen_rooted_at(id))
    }

    /// Resolve the root of `id`.
    ///
    /// - no id: the first screen's root component
    /// - a screen: its root component
    /// - a screen's root component: that screen
    /// - anything else: ascend until one of the above, or return the
    ///   topmost ancestor when it has no owner
    pub fn root_of(&self, id: Option<Id>) -> Option<Id> {
        let Some(id) = id else {
            return self
                .screen_order
                .first()
                .and_then(|screen| self.screens.get(screen))
                .and_then(|screen| screen.root);
        };

        if let Some(screen) = self.screens.get(&id) {
            return screen.root;
        }

        let mut current = id;
        // Bounded so a corrupt, cyclic document cannot hang the caller
        for _ in 0..=self.components.len() {
            if let Some(screen) = self.screen_rooted_at(current) {
                return Some(screen);
            }
            match self.parent_of(current) {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
        Some(current)
    }

    /// Flattened pre-order: each child followed by its descendants, then
    /// each prop component followed by its descendants. A screen yields its
    /// root followed by the root's descendants.
    pub fn descendants_of(&self, id: Id) -> Vec<Id> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();

        if let Some(screen) = self.screens.get(&id) {
            if let Some(root) = screen.root {
                result.push(root);
                visited.insert(root);
                self.collect_descendants(root, &mut result, &mut visited);
            }
            return result;
        }

        visited.insert(id);
        self.collect_descendants(id, &mut result, &mut visited);
        result
    }

    fn collect_descendants(&self, id: Id, result: &mut Vec<Id>, visited: &mut HashSet<Id>) {
        let Some(component) = self.components.get(&id) else {
            return;
        };
        for child in component.children().iter().chain(component.prop_components()) {
            if !visited.insert(*child) {
                continue;
            }
            result.push(*child);
            self.collect_descendants(*child, result, visited);
        }
    }

    /// Display name: explicit name, else `"<type> <id>"` / `"Screen <id>"`,
    /// else the raw id
    pub fn name_of(&self, id: Id) -> String {
        if let Some(component) = self.components.get(&id) {
            return component
                .name
                .clone()
                .unwrap_or_else(|| format!("{} {}", component.type_name, component.id));
        }
        if let Some(screen) = self.screens.get(&id) {
            return screen
                .name
                .clone()
                .unwrap_or_else(|| format!("Screen {}", screen.id));
        }
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Component;
    use serde_json::Map;

    /// Screen 1 → Box 2 → [Box 3 → [Text 5], Button 4 {propComponents: [6]}]
    fn sample() -> Design {
        let mut design = Design::new("sample");
        design.components.get_mut(&2).unwrap().children = Some(vec![3, 4]);

        let mut inner = Component::new(3, "grommet.Box", Map::new());
        inner.children = Some(vec![5]);
        let mut button = Component::new(4, "grommet.Button", Map::new());
        button.prop_components = Some(vec![6]);
        let mut text = Component::new(5, "grommet.Text", Map::new());
        text.name = Some("Title".to_string());
        let mut badge = Component::new(6, "grommet.Box", Map::new());
        badge.coupled = Some(true);

        for component in [inner, button, text, badge] {
            design.components.insert(component.id, component);
        }
        design.next_id = 7;
        design
    }

    #[test]
    fn test_parent_of() {
        let design = sample();
        assert_eq!(design.parent_of(3), Some(2));
        assert_eq!(design.parent_of(5), Some(3));
        assert_eq!(design.parent_of(6), Some(4));
        assert_eq!(design.parent_of(2), Some(1));
        assert_eq!(design.parent_of(1), None);
        assert_eq!(design.parent_of(99), None);
    }

    #[test]
    fn test_root_of() {
        let design = sample();
        assert_eq!(design.root_of(None), Some(2));
        assert_eq!(design.root_of(Some(1)), Some(2));
        assert_eq!(design.root_of(Some(2)), Some(1));
        assert_eq!(design.root_of(Some(5)), Some(1));
        assert_eq!(design.root_of(Some(6)), Some(1));
        // Orphans resolve to themselves
        assert_eq!(design.root_of(Some(99)), Some(99));
    }

    #[test]
    fn test_root_of_detached_subtree() {
        let mut design = sample();
        design.components.get_mut(&2).unwrap().children = Some(vec![4]);
        assert_eq!(design.root_of(Some(5)), Some(3));
    }

    #[test]
    fn test_descendants_pre_order() {
        let design = sample();
        assert_eq!(design.descendants_of(2), vec![3, 5, 4, 6]);
        assert_eq!(design.descendants_of(1), vec![2, 3, 5, 4, 6]);
        assert_eq!(design.descendants_of(5), Vec::<Id>::new());
        assert_eq!(design.descendants_of(99), Vec::<Id>::new());
    }

    #[test]
    fn test_descendants_children_before_prop_components() {
        let mut design = sample();
        let button = design.components.get_mut(&4).unwrap();
        button.children = Some(vec![3]);
        design.components.get_mut(&2).unwrap().children = Some(vec![4]);

        assert_eq!(design.descendants_of(4), vec![3, 5, 6]);
    }

    #[test]
    fn test_descendants_of_rootless_screen() {
        let mut design = sample();
        design.screens.get_mut(&1).unwrap().root = None;
        assert!(design.descendants_of(1).is_empty());
    }

    #[test]
    fn test_name_of() {
        let mut design = sample();
        design.screens.get_mut(&1).unwrap().name = None;

        assert_eq!(design.name_of(5), "Title");
        assert_eq!(design.name_of(3), "grommet.Box 3");
        assert_eq!(design.name_of(1), "Screen 1");
        assert_eq!(design.name_of(42), "42");
    }
}
