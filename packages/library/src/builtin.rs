//! Built-in libraries.

use crate::{ComponentTemplate, ComponentType, Library};
use serde_json::json;

fn sizes() -> serde_json::Value {
    json!(["none", "xxsmall", "xsmall", "small", "medium", "large", "xlarge"])
}

fn alignments() -> serde_json::Value {
    json!(["start", "center", "end", "baseline", "stretch"])
}

/// Layout and content components
pub fn grommet_library() -> Library {
    Library::new("grommet")
        .with_component(
            "Box",
            ComponentType::new()
                .container()
                .property("align", alignments())
                .property("background", json!("-color-"))
                .property("border", json!(false))
                .property("direction", json!(["column", "row", "row-responsive"]))
                .property("elevation", sizes())
                .property("fill", json!([true, "horizontal", "vertical"]))
                .property("flex", json!([true, false, "grow", "shrink"]))
                .property("gap", sizes())
                .property("justify", json!(["start", "center", "between", "around", "end"]))
                .property("overflow", json!(["auto", "hidden", "scroll", "visible"]))
                .property("pad", sizes())
                .property("round", sizes())
                .property("wrap", json!(false)),
        )
        .with_component(
            "Grid",
            ComponentType::new()
                .container()
                .default_prop("columns", json!("small"))
                .default_prop("gap", json!("small"))
                .property("columns", json!(["xsmall", "small", "medium", "large"]))
                .property("gap", sizes()),
        )
        .with_component(
            "Button",
            ComponentType::new()
                .default_prop("label", json!("Button"))
                .property("label", json!("string"))
                .property("primary", json!(false))
                .property("plain", json!(false))
                .property("icon", json!("-Icon-"))
                .design_property("link", json!("-link-")),
        )
        .with_component(
            "DropButton",
            ComponentType::new()
                .default_prop("label", json!("Open"))
                .property("label", json!("string"))
                .property("dropAlign", json!({ "top": "bottom" }))
                .slot(
                    "dropContent",
                    ComponentTemplate::new("grommet.Box").with_props(json!({ "pad": "medium" })),
                ),
        )
        .with_component(
            "Tip",
            ComponentType::new().container().slot(
                "content",
                ComponentTemplate::new("grommet.Box").with_props(json!({ "pad": "small" })),
            ),
        )
        .with_component(
            "Heading",
            ComponentType::new()
                .default_prop("level", json!(2))
                .property("level", json!([1, 2, 3, 4]))
                .property("margin", sizes())
                .property("size", json!(["small", "medium", "large", "xlarge"])),
        )
        .with_component(
            "Text",
            ComponentType::new()
                .property("color", json!("-color-"))
                .property("size", json!(["xsmall", "small", "medium", "large", "xlarge"]))
                .property("weight", json!(["normal", "bold"])),
        )
        .with_component(
            "Image",
            ComponentType::new()
                .property("fit", json!(["cover", "contain"]))
                .property("src", json!("string"))
                .design_property("aspectRatio", json!(["square", "wide"])),
        )
}

/// Components that only exist inside the designer
pub fn designer_library() -> Library {
    Library::new("designer")
        .with_component(
            "Reference",
            ComponentType::new().design_property("component", json!("-reference-")),
        )
        .with_component(
            "Repeater",
            ComponentType::new()
                .container()
                .default_prop("count", json!(2))
                .property("count", json!("number"))
                .design_property("dataPath", json!("string")),
        )
}
