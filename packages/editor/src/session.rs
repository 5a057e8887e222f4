//! # Design Session
//!
//! The controller that owns the live design and everything that reacts to
//! it: the type registry, subscribers, undo history, autosave and the
//! remote client.
//!
//! ## Change flow
//!
//! ```text
//! mutation ─▶ document store ─▶ entity listeners
//!                    │
//!                    └─ (outermost batch closes)
//!                          ├─ provenance (fetched → derivedFromId)
//!                          ├─ history checkpoint
//!                          ├─ wildcard listeners
//!                          └─ autosave schedule
//! ```
//!
//! History is recorded before the wildcard fan-out, so a wildcard listener
//! never sees a document that undo cannot reach.

use crate::autosave::AutoSaver;
use crate::config::EditorConfig;
use crate::document::{Component, Design, DocumentStore, Id, Props, Screen};
use crate::persistence::{Persistence, PersistenceWarning};
use crate::remote::RemoteClient;
use crate::subscriptions::{Subscription, SubscriptionHub, Topic, Update};
use crate::theme::{StaticThemes, ThemeLoader};
use crate::undo_stack::{HistoryState, UndoStack, DEFAULT_HISTORY_DEPTH};
use crate::upgrade::{normalize, upgrade_design};
use crate::{EditorError, EditorResult};
use designer_common::{DirectoryStore, SnapshotStore};
use designer_library::{ComponentType, Library, Registry};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Where [`DesignSession::load`] gets its design from
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// A brand new design
    Fresh,
    /// An already constructed design
    Design(Box<Design>),
    /// A stored snapshot, by design name
    Name(String),
    /// A published design, by remote id
    Remote(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub source: LoadSource,
    /// Password for protected published designs
    pub credential: Option<String>,
}

impl LoadRequest {
    pub fn fresh() -> Self {
        LoadSource::Fresh.into()
    }

    pub fn design(design: Design) -> Self {
        LoadSource::Design(Box::new(design)).into()
    }

    pub fn name(name: impl Into<String>) -> Self {
        LoadSource::Name(name.into()).into()
    }

    pub fn remote(id: impl Into<String>) -> Self {
        LoadSource::Remote(id.into()).into()
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

impl From<LoadSource> for LoadRequest {
    fn from(source: LoadSource) -> Self {
        Self {
            source,
            credential: None,
        }
    }
}

/// Builder for [`DesignSession`]
#[derive(Default)]
pub struct DesignSessionBuilder {
    registry: Option<Registry>,
    store: Option<Arc<dyn SnapshotStore>>,
    autosave: Option<Duration>,
    remote: Option<RemoteClient>,
    themes: Option<Box<dyn ThemeLoader>>,
    history_depth: Option<usize>,
}

impl DesignSessionBuilder {
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Back the session with snapshot storage
    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Save changes after `delay` of inactivity; needs a store and a
    /// running Tokio runtime
    pub fn autosave(mut self, delay: Duration) -> Self {
        self.autosave = Some(delay);
        self
    }

    pub fn remote(mut self, client: RemoteClient) -> Self {
        self.remote = Some(client);
        self
    }

    pub fn themes(mut self, themes: impl ThemeLoader + 'static) -> Self {
        self.themes = Some(Box::new(themes));
        self
    }

    pub fn history_depth(mut self, depth: usize) -> Self {
        self.history_depth = Some(depth);
        self
    }

    pub fn build(self) -> EditorResult<DesignSession> {
        let persistence = self.store.map(Persistence::new);
        let autosaver = match (self.autosave, &persistence) {
            (Some(delay), Some(persistence)) => Some(AutoSaver::spawn(persistence.clone(), delay)?),
            (Some(_), None) => {
                return Err(EditorError::Precondition(
                    "autosave needs a snapshot store".to_string(),
                ))
            }
            (None, _) => None,
        };

        Ok(DesignSession {
            store: DocumentStore::new(),
            registry: self.registry.unwrap_or_else(Registry::builtin),
            hub: SubscriptionHub::new(),
            history: UndoStack::with_max_levels(self.history_depth.unwrap_or(DEFAULT_HISTORY_DEPTH)),
            persistence,
            autosaver,
            remote: self.remote,
            themes: self.themes.unwrap_or_else(|| Box::new(StaticThemes::builtin())),
            theme: None,
            data: Props::new(),
            imports: Props::new(),
            batch_depth: 0,
            batch_dirty: false,
        })
    }
}

/// Owns the single live design and coordinates everything around it
pub struct DesignSession {
    store: DocumentStore,
    registry: Registry,
    hub: SubscriptionHub,
    history: UndoStack,
    persistence: Option<Persistence>,
    autosaver: Option<AutoSaver>,
    remote: Option<RemoteClient>,
    themes: Box<dyn ThemeLoader>,
    theme: Option<Value>,
    data: Props,
    imports: Props,
    batch_depth: usize,
    batch_dirty: bool,
}

impl Default for DesignSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DesignSession {
    /// In-memory session with the built-in libraries and no storage
    pub fn new() -> Self {
        Self {
            store: DocumentStore::new(),
            registry: Registry::builtin(),
            hub: SubscriptionHub::new(),
            history: UndoStack::new(),
            persistence: None,
            autosaver: None,
            remote: None,
            themes: Box::new(StaticThemes::builtin()),
            theme: None,
            data: Props::new(),
            imports: Props::new(),
            batch_depth: 0,
            batch_dirty: false,
        }
    }

    pub fn builder() -> DesignSessionBuilder {
        DesignSessionBuilder::default()
    }

    /// Session backed by the configured storage directory, with autosave and
    /// the remote client when an API URL is configured
    pub fn from_config(config: &EditorConfig, cwd: impl AsRef<Path>) -> EditorResult<Self> {
        let store = DirectoryStore::new(config.storage_path(cwd));
        let mut builder = Self::builder()
            .store(Arc::new(store))
            .autosave(config.autosave_delay())
            .history_depth(config.history_depth);
        if let Some(api_url) = &config.api_url {
            builder = builder.remote(RemoteClient::new(api_url.as_str())?);
        }
        builder.build()
    }

    // ---- loading ---------------------------------------------------------

    /// Make a design live.
    ///
    /// Any pending save of the previous design is cancelled once the new one
    /// is ready to install; a failed load leaves the previous design and its
    /// pending save alone. Named snapshots that were offloaded (an `id` but
    /// no `screens`) are fetched again from the remote service.
    pub async fn load(&mut self, request: LoadRequest) -> EditorResult<&Design> {
        let LoadRequest { source, credential } = request;
        let credential = credential.as_deref();

        let design = match source {
            LoadSource::Fresh => return self.add_design(),
            LoadSource::Design(design) => {
                let mut design = *design;
                normalize(&mut design, &self.registry);
                design
            }
            LoadSource::Name(name) => {
                let stored = self
                    .persistence()?
                    .load(&name)?
                    .ok_or_else(|| EditorError::UnknownDesign(name.clone()))?;

                let offloaded_id = match stored.get("screens") {
                    None => stored.get("id").and_then(Value::as_str).map(str::to_string),
                    Some(_) => None,
                };
                let raw = match offloaded_id {
                    Some(id) => {
                        tracing::info!(design = %name, remote_id = %id, "fetching offloaded design");
                        self.remote()?.fetch(&id, credential).await?
                    }
                    None => stored,
                };
                upgrade_design(raw, &self.registry)?
            }
            LoadSource::Remote(id) => {
                let raw = self.remote()?.fetch(&id, credential).await?;
                upgrade_design(raw, &self.registry)?
            }
        };

        tracing::info!(design = %design.name, "loaded design");
        self.install(design);
        self.notify_change();
        self.store.get().ok_or(EditorError::NoDesign)
    }

    /// Create, install and publish a new default design
    pub fn add_design(&mut self) -> EditorResult<&Design> {
        let known = match &self.persistence {
            Some(persistence) => persistence.design_names()?,
            None => Vec::new(),
        };
        let design = Design::new(crate::mutations::generate_name("my design", &known));

        tracing::info!(design = %design.name, "created design");
        self.install(design);
        self.notify_change();
        self.schedule_save();
        self.store.get().ok_or(EditorError::NoDesign)
    }

    /// Drop the live design, its listeners, its history and its stored
    /// snapshot.
    ///
    /// Waits for a save already in progress before forgetting the snapshot.
    /// If storage refuses, the design stays live.
    pub async fn remove_design(&mut self) -> EditorResult<()> {
        let name = self.document()?.name.clone();

        if let Some(autosaver) = &self.autosaver {
            autosaver.settle().await;
        }
        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.forget(&name) {
                self.schedule_save();
                return Err(e);
            }
        }

        self.store.take();
        self.hub.clear();
        self.history.clear();
        self.theme = None;
        self.data.clear();
        self.imports.clear();

        tracing::info!(design = %name, "removed design");
        Ok(())
    }

    /// Switch the live design; the previous design's pending save is dropped
    fn install(&mut self, design: Design) {
        self.cancel_autosave();
        self.theme = self.themes.load(design.theme.as_ref());
        self.data = embedded_object(&design, "data");
        self.imports = embedded_object(&design, "imports");
        self.history.reset(&design);
        self.store.replace(design);
    }

    // ---- queries ---------------------------------------------------------

    pub fn design(&self) -> Option<&Design> {
        self.store.get()
    }

    pub fn screen(&self, id: Id) -> Option<&Screen> {
        self.store.get()?.screen(id)
    }

    pub fn component(&self, id: Id) -> Option<&Component> {
        self.store.get()?.component(id)
    }

    pub fn parent(&self, id: Id) -> Option<Id> {
        self.store.get()?.parent_of(id)
    }

    pub fn root(&self, id: Option<Id>) -> Option<Id> {
        self.store.get()?.root_of(id)
    }

    pub fn descendants(&self, id: Id) -> Vec<Id> {
        self.store
            .get()
            .map(|design| design.descendants_of(id))
            .unwrap_or_default()
    }

    pub fn component_type(&self, type_name: &str) -> Option<&ComponentType> {
        self.registry.component_type(type_name)
    }

    pub fn name(&self, id: Id) -> String {
        match self.store.get() {
            Some(design) => design.name_of(id),
            None => id.to_string(),
        }
    }

    pub fn theme(&self) -> Option<&Value> {
        self.theme.as_ref()
    }

    pub fn data(&self) -> &Props {
        &self.data
    }

    pub fn imports(&self) -> &Props {
        &self.imports
    }

    pub fn libraries(&self) -> &[Library] {
        self.registry.libraries()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ---- subscriptions ---------------------------------------------------

    pub fn subscribe<F>(&self, topic: impl Into<Topic>, callback: F) -> Subscription
    where
        F: FnMut(&Update<'_>) + 'static,
    {
        self.hub.subscribe(topic.into(), callback)
    }

    /// Re-publish the whole live design to every topic
    pub fn notify_change(&self) {
        if let Some(design) = self.store.get() {
            self.hub.notify_all(design);
        }
    }

    // ---- history ---------------------------------------------------------

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> HistoryState {
        self.history.state()
    }

    /// Restore the previous snapshot; false when there is none
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(design) => {
                self.restore(design);
                true
            }
            None => false,
        }
    }

    /// Restore the snapshot undone last; false when there is none
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(design) => {
                self.restore(design);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, design: Design) {
        if self.store.get().map(|d| &d.theme) != Some(&design.theme) {
            self.theme = self.themes.load(design.theme.as_ref());
        }
        self.store.replace(design);
        self.notify_change();
        self.schedule_save();
    }

    // ---- persistence -----------------------------------------------------

    pub fn persistence(&self) -> EditorResult<&Persistence> {
        self.persistence
            .as_ref()
            .ok_or_else(|| EditorError::Precondition("no snapshot store configured".to_string()))
    }

    pub fn remote(&self) -> EditorResult<&RemoteClient> {
        self.remote
            .as_ref()
            .ok_or_else(|| EditorError::Precondition("no remote service configured".to_string()))
    }

    /// Write any pending autosave now
    pub async fn flush(&self) {
        if let Some(autosaver) = &self.autosaver {
            autosaver.flush().await;
        }
    }

    /// Background save failures collected since the last call
    pub fn take_warnings(&self) -> Vec<PersistenceWarning> {
        self.autosaver
            .as_ref()
            .map(AutoSaver::take_warnings)
            .unwrap_or_default()
    }

    fn schedule_save(&self) {
        if let (Some(autosaver), Some(design)) = (&self.autosaver, self.store.get()) {
            autosaver.schedule(design);
        }
    }

    fn cancel_autosave(&self) {
        if let Some(autosaver) = &self.autosaver {
            autosaver.cancel();
        }
    }

    // ---- mutation plumbing -----------------------------------------------

    pub(crate) fn document(&self) -> EditorResult<&Design> {
        self.store.get().ok_or(EditorError::NoDesign)
    }

    pub(crate) fn document_mut(&mut self) -> EditorResult<&mut Design> {
        self.store.get_mut()
    }

    pub(crate) fn allocate_id(&mut self) -> EditorResult<Id> {
        self.store.allocate_id()
    }

    pub(crate) fn reload_theme(&mut self) {
        let theme = self.store.get().and_then(|design| design.theme.as_ref());
        self.theme = self.themes.load(theme);
    }

    pub(crate) fn notify_entity(&self, id: Id, update: &Update<'_>) {
        self.hub.notify(Topic::Entity(id), update);
    }

    /// Copy-on-write update of one component
    ///
    /// The mutator works on a clone; the clone replaces the stored
    /// component only when it returns `Ok`.
    pub fn update_component<F>(&mut self, id: Id, mutator: F) -> EditorResult<Component>
    where
        F: FnOnce(&mut Component) -> EditorResult<()>,
    {
        let design = self.store.get_mut()?;
        let mut next = design
            .components
            .get(&id)
            .cloned()
            .ok_or_else(|| EditorError::missing("component", id))?;
        mutator(&mut next)?;

        design.components.insert(id, next);
        let stored = &design.components[&id];
        self.hub.notify(Topic::Entity(id), &Update::Component(stored));
        let result = stored.clone();
        self.commit();
        Ok(result)
    }

    /// Copy-on-write update of one screen
    pub fn update_screen<F>(&mut self, id: Id, mutator: F) -> EditorResult<Screen>
    where
        F: FnOnce(&mut Screen) -> EditorResult<()>,
    {
        let design = self.store.get_mut()?;
        let mut next = design
            .screens
            .get(&id)
            .cloned()
            .ok_or_else(|| EditorError::missing("screen", id))?;
        mutator(&mut next)?;

        design.screens.insert(id, next);
        let stored = &design.screens[&id];
        self.hub.notify(Topic::Entity(id), &Update::Screen(stored));
        let result = stored.clone();
        self.commit();
        Ok(result)
    }

    /// Copy-on-write update of the whole design
    ///
    /// The mutator is trusted with the structure: it may touch `screens`
    /// and `components` directly.
    pub fn update_design<F>(&mut self, mutator: F) -> EditorResult<()>
    where
        F: FnOnce(&mut Design) -> EditorResult<()>,
    {
        let design = self.store.get_mut()?;
        let mut next = design.clone();
        mutator(&mut next)?;

        *design = next;
        self.commit();
        Ok(())
    }

    /// Run `operation` as one change: one history entry, one wildcard
    /// notification, one save
    pub(crate) fn batch<T>(
        &mut self,
        operation: impl FnOnce(&mut Self) -> EditorResult<T>,
    ) -> EditorResult<T> {
        self.batch_depth += 1;
        let result = operation(self);
        self.batch_depth -= 1;

        if self.batch_depth == 0 && std::mem::take(&mut self.batch_dirty) {
            self.finish_change();
        }
        result
    }

    /// Mark the live design as changed
    pub(crate) fn commit(&mut self) {
        if self.batch_depth > 0 {
            self.batch_dirty = true;
        } else {
            self.finish_change();
        }
    }

    fn finish_change(&mut self) {
        let Ok(design) = self.store.get_mut() else {
            return;
        };
        if design.mark_derived() {
            tracing::info!(
                design = %design.name,
                derived_from = ?design.derived_from_id,
                "edited a fetched design"
            );
        }

        let design = &*design;
        self.history.record(design);
        self.hub.notify(Topic::Design, &Update::Design(design));
        if let Some(autosaver) = &self.autosaver {
            autosaver.schedule(design);
        }
    }
}

fn embedded_object(design: &Design, key: &str) -> Props {
    match design.extra.get(key) {
        Some(Value::Object(object)) => object.clone(),
        _ => Props::new(),
    }
}
