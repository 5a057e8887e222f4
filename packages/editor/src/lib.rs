//! # Designer Editor
//!
//! Document mutation engine for the visual designer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ library: component types by qualified name  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DesignSession                       │
//! │  - Document store + id allocation           │
//! │  - Structural queries                       │
//! │  - Copy-on-write mutations                  │
//! │  - Subscriptions and undo history           │
//! │  - Load / upgrade / autosave / remote fetch │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ common: snapshot storage                    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One live design**: the session owns it; everything else reads it
//! 2. **Copy-on-write**: an entity is cloned, changed, then swapped in
//! 3. **Validate first**: a rejected operation leaves no trace
//! 4. **One operation, one undo step**: compound edits are batched
//!
//! ## Usage
//!
//! ```rust,ignore
//! use designer_editor::{ComponentOptions, DesignSession, Topic};
//! use serde_json::json;
//!
//! let mut session = DesignSession::new();
//! session.add_design()?;
//!
//! let _watch = session.subscribe(Topic::Design, |update| println!("{update:?}"));
//!
//! let text = session.add_component("grommet.Text", ComponentOptions::within(2))?;
//! session.set_property(text.id, "text", Some(json!("Hello")))?;
//!
//! session.undo();
//! ```

mod autosave;
mod config;
mod document;
mod errors;
mod mutations;
mod persistence;
mod queries;
mod remote;
mod session;
mod subscriptions;
mod theme;
mod undo_stack;
mod upgrade;

pub use autosave::{AutoSaver, DEFAULT_AUTOSAVE_DELAY};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::{Component, Design, DocumentStore, Id, IntegrityIssue, Props, Screen};
pub use errors::{EditorError, EditorResult};
pub use mutations::{generate_name, slugify, ComponentOptions, MoveTarget, Placement};
pub use persistence::{Persistence, PersistenceWarning, DESIGNS_KEY};
pub use remote::RemoteClient;
pub use session::{DesignSession, DesignSessionBuilder, LoadRequest, LoadSource};
pub use subscriptions::{Subscription, SubscriptionHub, Topic, Update};
pub use theme::{StaticThemes, ThemeLoader};
pub use undo_stack::{HistoryState, UndoStack, DEFAULT_HISTORY_DEPTH};
pub use upgrade::{normalize, upgrade_design};

// Re-export library types for convenience
pub use designer_library::{ComponentType, Library, Registry};
