//! Theme resolution for the loaded design.

use serde_json::{json, Value};
use std::collections::HashMap;

/// Resolves a design's `theme` field into a theme object
pub trait ThemeLoader {
    /// `None` when the design names no theme or an unknown one
    fn load(&self, theme: Option<&Value>) -> Option<Value>;
}

/// Inline theme objects pass through; names are looked up in a table
#[derive(Debug, Clone, Default)]
pub struct StaticThemes {
    themes: HashMap<String, Value>,
}

impl StaticThemes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the stock `grommet` and `dark` themes
    pub fn builtin() -> Self {
        Self::new()
            .with_theme(
                "grommet",
                json!({
                    "name": "grommet",
                    "global": { "colors": { "brand": "#7D4CDB", "background": "#FFFFFF" } }
                }),
            )
            .with_theme(
                "dark",
                json!({
                    "name": "dark",
                    "global": { "colors": { "brand": "#6FFFB0", "background": "#111111" } }
                }),
            )
    }

    pub fn with_theme(mut self, name: impl Into<String>, theme: Value) -> Self {
        self.themes.insert(name.into(), theme);
        self
    }
}

impl ThemeLoader for StaticThemes {
    fn load(&self, theme: Option<&Value>) -> Option<Value> {
        match theme? {
            Value::String(name) => {
                let found = self.themes.get(name).cloned();
                if found.is_none() {
                    tracing::warn!(theme = %name, "unknown theme");
                }
                found
            }
            inline @ Value::Object(_) => Some(inline.clone()),
            other => {
                tracing::warn!(theme = %other, "ignoring malformed theme");
                None
            }
        }
    }
}
