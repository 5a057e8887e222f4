//! Load, autosave and remote fetch against real storage and a local HTTP
//! server

use axum::extract::Path;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use designer_common::{CommonError, CommonResult, DirectoryStore, MemoryStore, SnapshotStore};
use designer_editor::{
    ComponentOptions, Design, DesignSession, EditorError, LoadRequest, RemoteClient, Topic,
};
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const PASSWORD: &str = "hunter2";

async fn published(Path(id): Path<String>, headers: HeaderMap) -> Response {
    match id.as_str() {
        "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "missing" => StatusCode::NOT_FOUND.into_response(),
        "secret" => {
            // "hunter2" in base64
            let authorized = headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                == Some("Basic aHVudGVyMg==");
            if authorized {
                Json(published_design("secret")).into_response()
            } else {
                StatusCode::UNAUTHORIZED.into_response()
            }
        }
        _ => Json(published_design(&id)).into_response(),
    }
}

fn published_design(id: &str) -> serde_json::Value {
    let mut design = Design::new(format!("published {id}"));
    design.theme = Some(json!("dark"));
    serde_json::to_value(design).unwrap()
}

/// Serve published designs on an ephemeral port; returns the base URL
async fn spawn_server() -> anyhow::Result<String> {
    let app = Router::new().route("/designs/:id", get(published));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/designs/"))
}

/// Memory store whose writes take a while
#[derive(Default)]
struct SlowStore(MemoryStore);

impl SnapshotStore for SlowStore {
    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        std::thread::sleep(Duration::from_millis(100));
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> CommonResult<()> {
        self.0.remove(key)
    }
}

/// Memory store that refuses to delete anything
#[derive(Default)]
struct UndeletableStore(MemoryStore);

impl SnapshotStore for UndeletableStore {
    fn get(&self, key: &str) -> CommonResult<Option<String>> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> CommonResult<()> {
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> CommonResult<()> {
        Err(CommonError::Generic(format!("{key} is read-only")))
    }
}

fn memory_session(store: Arc<MemoryStore>, delay: Duration) -> DesignSession {
    DesignSession::builder()
        .store(store)
        .autosave(delay)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_fetch_marks_design_as_fetched() -> anyhow::Result<()> {
    let client = RemoteClient::new(spawn_server().await?)?;

    let design = client.fetch("abc", None).await?;
    assert_eq!(design["id"], "abc");
    assert_eq!(design["fetched"], true);
    assert_eq!(design["name"], "published abc");
    Ok(())
}

#[tokio::test]
async fn test_fetch_failures() -> anyhow::Result<()> {
    let client = RemoteClient::new(spawn_server().await?)?;

    assert!(matches!(
        client.fetch("secret", None).await,
        Err(EditorError::AuthenticationRequired)
    ));
    assert!(matches!(
        client.fetch("secret", Some("wrong")).await,
        Err(EditorError::AuthenticationRequired)
    ));
    assert!(matches!(
        client.fetch("broken", None).await,
        Err(EditorError::RemoteFetch { status: 500 })
    ));
    assert!(matches!(
        client.fetch("missing", None).await,
        Err(EditorError::RemoteFetch { status: 404 })
    ));

    let design = client.fetch("secret", Some(PASSWORD)).await?;
    assert_eq!(design["id"], "secret");
    Ok(())
}

#[tokio::test]
async fn test_remote_load_then_edit_records_provenance() -> anyhow::Result<()> {
    let client = RemoteClient::new(spawn_server().await?)?;
    let mut session = DesignSession::builder().remote(client).build()?;

    let design = session.load(LoadRequest::remote("abc")).await?;
    assert_eq!(design.id.as_deref(), Some("abc"));
    assert_eq!(design.fetched, Some(true));
    assert_eq!(session.theme().map(|t| t["name"].clone()), Some(json!("dark")));

    session.set_property(2, "name", Some(json!("Mine")))?;

    let design = session.design().unwrap();
    assert_eq!(design.id, None);
    assert_eq!(design.fetched, None);
    assert_eq!(design.derived_from_id.as_deref(), Some("abc"));
    Ok(())
}

#[tokio::test]
async fn test_offloaded_snapshot_is_fetched_again() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    store.set("stub", r#"{ "name": "stub", "id": "abc" }"#)?;

    let mut session = DesignSession::builder()
        .store(store)
        .remote(RemoteClient::new(spawn_server().await?)?)
        .build()?;

    let design = session.load(LoadRequest::name("stub")).await?;
    assert_eq!(design.name, "published abc");
    assert_eq!(design.screen_order, vec![1]);
    Ok(())
}

#[tokio::test]
async fn test_load_failures() {
    let mut session = DesignSession::builder()
        .store(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();

    assert!(matches!(
        session.load(LoadRequest::name("nope")).await,
        Err(EditorError::UnknownDesign(_))
    ));
    assert!(matches!(
        session.load(LoadRequest::remote("abc")).await,
        Err(EditorError::Precondition(_))
    ));
    assert!(session.design().is_none());
}

#[tokio::test]
async fn test_autosave_after_delay() {
    let store = Arc::new(MemoryStore::new());
    let mut session = memory_session(store.clone(), Duration::from_millis(20));

    session.load(LoadRequest::fresh()).await.unwrap();
    session
        .add_component("grommet.Text", ComponentOptions::within(2))
        .unwrap();
    assert!(store.get("my design").unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(150)).await;

    let persistence = session.persistence().unwrap();
    assert_eq!(persistence.design_names().unwrap(), vec!["my design"]);
    let stored = persistence.load("my design").unwrap().unwrap();
    assert_eq!(stored["nextId"], 4);
    assert!(stored["date"].is_string());
}

#[tokio::test]
async fn test_new_design_avoids_stored_names() {
    let store = Arc::new(MemoryStore::new());
    store.set("designs", r#"["my design"]"#).unwrap();
    let mut session = memory_session(store, Duration::from_secs(60));

    let design = session.add_design().unwrap();
    assert_eq!(design.name, "my design 2");
}

#[tokio::test]
async fn test_load_cancels_pending_save() {
    let store = Arc::new(MemoryStore::new());
    let mut session = memory_session(store.clone(), Duration::from_millis(50));

    session.add_design().unwrap();
    session.set_property(2, "name", Some(json!("pending"))).unwrap();

    session
        .load(LoadRequest::design(Design::new("other")))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(store.get("my design").unwrap().is_none());
    assert!(store.get("other").unwrap().is_none());
}

#[tokio::test]
async fn test_failed_load_keeps_pending_save() {
    let store = Arc::new(MemoryStore::new());
    let mut session = memory_session(store.clone(), Duration::from_millis(30));

    session.add_design().unwrap();
    session.set_property(2, "name", Some(json!("edited"))).unwrap();

    assert!(matches!(
        session.load(LoadRequest::name("typo")).await,
        Err(EditorError::UnknownDesign(_))
    ));
    assert!(matches!(
        session.load(LoadRequest::remote("abc")).await,
        Err(EditorError::Precondition(_))
    ));
    assert_eq!(session.design().map(|d| d.name.as_str()), Some("my design"));

    tokio::time::sleep(Duration::from_millis(200)).await;

    let stored = session.persistence().unwrap().load("my design").unwrap().unwrap();
    assert_eq!(stored["components"]["2"]["name"], "edited");
}

#[tokio::test]
async fn test_remove_design_outlasts_running_save() {
    let store = Arc::new(SlowStore::default());
    let mut session = DesignSession::builder()
        .store(store.clone())
        .autosave(Duration::from_millis(10))
        .build()
        .unwrap();

    session.add_design().unwrap();
    // Let the save start writing
    tokio::time::sleep(Duration::from_millis(40)).await;

    session.remove_design().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(store.get("my design").unwrap().is_none());
    assert!(session.persistence().unwrap().design_names().unwrap().is_empty());
}

#[tokio::test]
async fn test_refused_removal_keeps_design_live() {
    let mut session = DesignSession::builder()
        .store(Arc::new(UndeletableStore::default()))
        .build()
        .unwrap();
    session.add_design().unwrap();
    session.set_property(2, "name", Some(json!("kept"))).unwrap();

    let changes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&changes);
    let _watch = session.subscribe(Topic::Design, move |_| counter.set(counter.get() + 1));

    assert!(matches!(
        session.remove_design().await,
        Err(EditorError::Storage(_))
    ));

    assert_eq!(session.component(2).unwrap().name.as_deref(), Some("kept"));
    assert!(session.can_undo());
    session.set_property(2, "name", Some(json!("still here"))).unwrap();
    assert_eq!(changes.get(), 1);
}

#[tokio::test]
async fn test_reload_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let open = || {
        DesignSession::builder()
            .store(Arc::new(DirectoryStore::new(dir.path())))
            .autosave(Duration::from_secs(60))
            .build()
            .unwrap()
    };

    let mut session = open();
    session.add_design().unwrap();
    let text = session
        .add_component("grommet.Text", ComponentOptions::within(2))
        .unwrap();
    session.flush().await;
    drop(session);

    let mut session = open();
    let design = session.load(LoadRequest::name("my design")).await.unwrap();
    assert!(design.date.is_some());
    assert_eq!(design.component(2).unwrap().children(), &[text.id]);
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_remove_design_forgets_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let mut session = memory_session(store.clone(), Duration::from_secs(60));

    session.add_design().unwrap();
    session.flush().await;
    assert!(store.get("my design").unwrap().is_some());

    session.remove_design().await.unwrap();
    session.flush().await;
    assert!(store.get("my design").unwrap().is_none());
    assert!(session.persistence().unwrap().design_names().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_save_is_reported() {
    let file = tempfile::NamedTempFile::new().unwrap();
    // A regular file where the storage directory should be
    let mut session = DesignSession::builder()
        .store(Arc::new(DirectoryStore::new(file.path())))
        .autosave(Duration::from_secs(60))
        .build()
        .unwrap();

    session
        .load(LoadRequest::design(Design::new("unsaved")))
        .await
        .unwrap();
    session.set_property(2, "name", Some(json!("Edited"))).unwrap();
    session.flush().await;

    let warnings = session.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].design, "unsaved");
    assert!(session.take_warnings().is_empty());
}
