//! Libraries and the registry that resolves qualified type names.

use crate::component_type::ComponentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Invalid library definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Library {0:?} is already registered")]
    Duplicate(String),

    #[error("Library name {0:?} must be non-empty and contain no '.'")]
    InvalidName(String),
}

/// A named set of component types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,

    #[serde(default)]
    pub components: BTreeMap<String, ComponentType>,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: BTreeMap::new(),
        }
    }

    pub fn with_component(mut self, name: &str, component_type: ComponentType) -> Self {
        self.components.insert(name.to_string(), component_type);
        self
    }

    /// Load a library definition from JSON
    pub fn from_json(json: &str) -> Result<Self, LibraryError> {
        let library: Library = serde_json::from_str(json)?;
        if library.name.is_empty() || library.name.contains('.') {
            return Err(LibraryError::InvalidName(library.name));
        }
        Ok(library)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentType> {
        self.components.get(name)
    }
}

/// Split `"<library>.<component>"` at the first dot
pub fn split_type_name(type_name: &str) -> Option<(&str, &str)> {
    let (library, component) = type_name.split_once('.')?;
    if library.is_empty() || component.is_empty() {
        return None;
    }
    Some((library, component))
}

/// Ordered set of libraries, looked up by name
#[derive(Debug, Clone, Default)]
pub struct Registry {
    libraries: Vec<Library>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the grommet and designer libraries
    pub fn builtin() -> Self {
        Self {
            libraries: vec![crate::grommet_library(), crate::designer_library()],
        }
    }

    pub fn register(&mut self, library: Library) -> Result<(), LibraryError> {
        if self.library(&library.name).is_some() {
            return Err(LibraryError::Duplicate(library.name));
        }
        self.libraries.push(library);
        Ok(())
    }

    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.iter().find(|l| l.name == name)
    }

    /// Resolve a qualified type name; `None` if either segment is unknown
    pub fn component_type(&self, type_name: &str) -> Option<&ComponentType> {
        let (library, component) = split_type_name(type_name)?;
        self.library(library)?.component(component)
    }
}
