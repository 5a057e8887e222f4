use super::Context;
use anyhow::Result;
use colored::Colorize;

pub fn list(ctx: &Context) -> Result<()> {
    let persistence = ctx.persistence()?;
    let names = persistence.design_names()?;

    if names.is_empty() {
        println!("{}", "No stored designs".yellow());
        return Ok(());
    }

    for name in names {
        let date = persistence
            .load(&name)?
            .and_then(|snapshot| snapshot.get("date").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_default();
        println!("  {}  {}", name.bright_white(), date.dimmed());
    }
    Ok(())
}
