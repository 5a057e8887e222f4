use super::Context;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use designer_editor::LoadRequest;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Identifier of the published design
    pub id: String,

    /// Password for protected designs
    #[arg(long)]
    pub password: Option<String>,
}

pub async fn fetch(args: FetchArgs, ctx: &Context) -> Result<()> {
    let mut session = ctx.session()?;

    let mut request = LoadRequest::remote(&args.id);
    if let Some(password) = &args.password {
        request = request.with_credential(password);
    }
    session.load(request).await?;
    let design = session
        .design()
        .ok_or_else(|| anyhow!("Fetched design {:?} did not load", args.id))?;
    session.persistence()?.save(design)?;

    println!(
        "{} Fetched {} as {}",
        "✓".green(),
        args.id.cyan(),
        design.name.bright_white()
    );
    Ok(())
}
