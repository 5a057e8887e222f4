use super::Context;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Name for the design; a free "my design" name when omitted
    #[arg(short, long)]
    pub name: Option<String>,
}

pub async fn new(args: NewArgs, ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;

    if let Some(name) = &args.name {
        if session.persistence()?.design_names()?.contains(name) {
            bail!("A design named {name:?} already exists");
        }
    }

    session.add_design()?;
    if let Some(name) = args.name {
        session.set_design_property("name", Some(json!(name)))?;
    }
    ctx.save(&session).await?;

    if let Some(design) = session.design() {
        println!("{} Created {}", "✓".green(), design.name.bright_white());
    }
    Ok(())
}
