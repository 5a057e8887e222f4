//! # Designer Library
//!
//! Component type registry for the designer.
//!
//! A [`Registry`] holds named [`Library`]s; each library maps a component
//! name to a [`ComponentType`] describing its default property values and its
//! declared property schemas. Types are addressed by qualified name,
//! `"<library>.<component>"`, e.g. `grommet.Box`.
//!
//! Declared properties are either plain schema values (option lists, kind
//! names, defaults) or component templates: a property whose value is itself
//! a component, synthesized when an instance of the owning type is created.

mod builtin;
mod component_type;
mod registry;

pub use builtin::{designer_library, grommet_library};
pub use component_type::{ComponentTemplate, ComponentType, PropertySpec, COMPONENT_MARKER};
pub use registry::{split_type_name, Library, LibraryError, Registry};
