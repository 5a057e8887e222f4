pub mod delete;
pub mod edit;
pub mod fetch;
pub mod init;
pub mod list;
pub mod new;
pub mod show;

pub use delete::{delete, DeleteArgs};
pub use edit::{add, add_screen, remove, remove_screen, set, AddArgs, RemoveArgs, SetArgs};
pub use fetch::{fetch, FetchArgs};
pub use init::{init, InitArgs};
pub use list::list;
pub use new::{new, NewArgs};
pub use show::show;

use anyhow::{anyhow, Result};
use clap::Args;
use designer_editor::{DesignSession, EditorConfig, LoadRequest, Persistence};
use serde_json::Value;
use std::path::PathBuf;

/// A stored design to work on
#[derive(Debug, Args)]
pub struct DesignArgs {
    /// Name of the stored design
    pub design: String,

    /// Password for designs that have to be fetched again
    #[arg(long)]
    pub password: Option<String>,
}

/// Resolved configuration shared by every command
pub struct Context {
    cwd: PathBuf,
    config: EditorConfig,
}

impl Context {
    pub fn new(cwd: PathBuf, config: EditorConfig) -> Self {
        Self { cwd, config }
    }

    pub fn session(&self) -> Result<DesignSession> {
        Ok(DesignSession::from_config(&self.config, &self.cwd)?)
    }

    pub fn persistence(&self) -> Result<Persistence> {
        Ok(self.session()?.persistence()?.clone())
    }

    /// Session with the named design loaded
    pub async fn open(&self, args: &DesignArgs) -> Result<DesignSession> {
        let mut session = self.session()?;
        let mut request = LoadRequest::name(&args.design);
        if let Some(password) = &args.password {
            request = request.with_credential(password);
        }
        session.load(request).await?;
        Ok(session)
    }

    /// Write pending changes, failing on the first save error
    pub async fn save(&self, session: &DesignSession) -> Result<()> {
        session.flush().await;
        match session.take_warnings().into_iter().next() {
            Some(warning) => Err(anyhow!("{warning}")),
            None => Ok(()),
        }
    }
}

/// Parse a command-line value as JSON, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
