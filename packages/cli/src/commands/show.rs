use super::{Context, DesignArgs};
use anyhow::Result;
use colored::Colorize;
use designer_editor::{Design, Id};

pub async fn show(args: DesignArgs, ctx: &Context) -> Result<()> {
    let session = ctx.open(&args).await?;
    let Some(design) = session.design() else {
        return Ok(());
    };

    println!("{}", design.name.bright_white().bold());
    if let Some(derived) = &design.derived_from_id {
        println!("  derived from {}", derived.cyan());
    }

    for screen in design.screen_order.iter().filter_map(|id| design.screen(*id)) {
        println!(
            "{} {} {}",
            format!("#{}", screen.id).dimmed(),
            design.name_of(screen.id).bright_blue(),
            screen.path.dimmed()
        );
        if let Some(root) = screen.root {
            print_component(design, root, None, 1);
        }
    }
    Ok(())
}

fn print_component(design: &Design, id: Id, slot: Option<&str>, depth: usize) {
    let Some(component) = design.component(id) else {
        return;
    };
    let indent = "  ".repeat(depth);
    let label = match slot {
        Some(slot) => format!("{slot}: "),
        None => String::new(),
    };
    let hidden = if component.hide == Some(true) { " (hidden)" } else { "" };

    println!(
        "{indent}{label}{} {} {}{}",
        format!("#{id}").dimmed(),
        design.name_of(id),
        component.type_name.cyan(),
        hidden.yellow()
    );

    for prop_component in component.prop_components() {
        let slot = component
            .props
            .iter()
            .find(|(_, value)| value.as_u64() == Some(*prop_component))
            .map(|(name, _)| name.as_str());
        print_component(design, *prop_component, slot, depth + 1);
    }
    for child in component.children() {
        print_component(design, *child, None, depth + 1);
    }
}
