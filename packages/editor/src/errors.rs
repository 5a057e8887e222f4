//! Error types for the editor

use crate::document::Id;
use designer_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No design is loaded")]
    NoDesign,

    #[error("No stored design named {0:?}")]
    UnknownDesign(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Unknown component type {0:?}")]
    UnknownType(String),

    #[error("Property {name:?} is not declared for {target}")]
    UnknownProperty { target: String, name: String },

    #[error("Invalid value for property {name:?}: {reason}")]
    InvalidProperty { name: String, reason: String },

    #[error("Property {0:?} is structural and cannot be set directly")]
    ProtectedProperty(String),

    #[error("{0} is not implemented")]
    Unimplemented(&'static str),

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Remote fetch failed with status {status}")]
    RemoteFetch { status: u16 },

    #[error("Schema upgrade failed: {0}")]
    SchemaUpgrade(String),

    #[error("Storage error: {0}")]
    Storage(#[from] CommonError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub(crate) fn missing(kind: &str, id: Id) -> Self {
        EditorError::Precondition(format!("{kind} {id} does not exist"))
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
