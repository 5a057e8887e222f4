use super::Context;
use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use designer_editor::{Design, LoadRequest};

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Name of the stored design
    pub design: String,
}

pub async fn delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;
    if session.persistence()?.load(&args.design)?.is_none() {
        bail!("No stored design named {:?}", args.design);
    }

    // Offloaded snapshots would need a fetch to load, so stand in a blank
    // design under the same name
    session
        .load(LoadRequest::design(Design::new(args.design.as_str())))
        .await?;
    session.remove_design().await?;
    ctx.save(&session).await?;

    println!("{} Deleted {}", "✓".green(), args.design.bright_white());
    Ok(())
}
