use super::{parse_value, Context, DesignArgs};
use anyhow::{anyhow, Result};
use clap::{ArgGroup, Args};
use colored::Colorize;
use designer_editor::{ComponentOptions, Id, Placement};

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("placement")
        .required(true)
        .args(["within", "before", "after", "containing"]),
))]
pub struct AddArgs {
    #[command(flatten)]
    pub target: DesignArgs,

    /// Qualified component type, e.g. grommet.Box
    pub component_type: String,

    /// Append inside this component, or set as root of this empty screen
    #[arg(long)]
    pub within: Option<Id>,

    /// Insert before this component
    #[arg(long)]
    pub before: Option<Id>,

    /// Insert after this component
    #[arg(long)]
    pub after: Option<Id>,

    /// Wrap this component
    #[arg(long)]
    pub containing: Option<Id>,

    /// Initial props as a JSON object
    #[arg(long)]
    pub props: Option<String>,
}

impl AddArgs {
    fn placement(&self) -> Option<Placement> {
        self.within
            .map(Placement::Within)
            .or(self.before.map(Placement::Before))
            .or(self.after.map(Placement::After))
            .or(self.containing.map(Placement::Containing))
    }
}

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub target: DesignArgs,

    /// Property name
    pub property: String,

    /// New value, as JSON or a plain string; clears the property when omitted
    pub value: Option<String>,

    /// Set on this component
    #[arg(long, conflicts_with = "screen")]
    pub component: Option<Id>,

    /// Set on this screen; without --component or --screen the design
    /// itself is changed
    #[arg(long)]
    pub screen: Option<Id>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub target: DesignArgs,

    /// Id of the component or screen
    pub id: Id,
}

pub async fn add(args: AddArgs, ctx: &Context) -> Result<()> {
    let placement = args
        .placement()
        .ok_or_else(|| anyhow!("One of --within, --before, --after or --containing is required"))?;
    let mut options = ComponentOptions::from(placement);
    if let Some(props) = &args.props {
        let props: serde_json::Value = serde_json::from_str(props)?;
        if !props.is_object() {
            return Err(anyhow!("--props must be a JSON object"));
        }
        options = options.with_props(props);
    }

    let mut session = ctx.open(&args.target).await?;
    let component = session.add_component(&args.component_type, options)?;
    ctx.save(&session).await?;

    println!(
        "{} Added {} {}",
        "✓".green(),
        component.type_name.cyan(),
        format!("#{}", component.id).dimmed()
    );
    Ok(())
}

pub async fn set(args: SetArgs, ctx: &Context) -> Result<()> {
    let value = args.value.as_deref().map(parse_value);

    let mut session = ctx.open(&args.target).await?;
    match (args.component, args.screen) {
        (Some(id), _) => session.set_property(id, &args.property, value)?,
        (None, Some(id)) => session.set_screen_property(id, &args.property, value)?,
        (None, None) => session.set_design_property(&args.property, value)?,
    }
    ctx.save(&session).await?;

    println!("{} Set {}", "✓".green(), args.property.bright_white());
    Ok(())
}

pub async fn remove(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let mut session = ctx.open(&args.target).await?;
    let name = session.name(args.id);
    session.remove_component(args.id)?;
    ctx.save(&session).await?;

    println!("{} Removed {}", "✓".green(), name.bright_white());
    Ok(())
}

pub async fn add_screen(args: DesignArgs, ctx: &Context) -> Result<()> {
    let mut session = ctx.open(&args).await?;
    let screen = session.add_screen()?;
    ctx.save(&session).await?;

    println!(
        "{} Added {} {}",
        "✓".green(),
        screen.name.unwrap_or_default().bright_white(),
        format!("#{}", screen.id).dimmed()
    );
    Ok(())
}

pub async fn remove_screen(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let mut session = ctx.open(&args.target).await?;
    let name = session.name(args.id);
    session.remove_screen(args.id)?;
    ctx.save(&session).await?;

    println!("{} Removed {}", "✓".green(), name.bright_white());
    Ok(())
}
