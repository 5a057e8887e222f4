//! Component type descriptors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Prefix of the legacy string encoding of a component template,
/// e.g. `-component- grommet.Box {"pad":"medium"}`
pub const COMPONENT_MARKER: &str = "-component-";

/// A component that gets created to fill a component-valued property
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTemplate {
    /// Qualified type name of the component to create
    pub type_name: String,

    /// Props applied on top of that type's defaults
    pub props: Map<String, Value>,
}

impl ComponentTemplate {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            props: Map::new(),
        }
    }

    pub fn with_props(mut self, props: Value) -> Self {
        if let Value::Object(props) = props {
            self.props = props;
        }
        self
    }

    /// Parse the legacy `-component- <type> <json>` encoding.
    ///
    /// Returns `Ok(None)` when the string does not carry a template
    /// (no marker, or a marker without a type name).
    pub fn parse_legacy(encoded: &str) -> Result<Option<Self>, String> {
        let Some(rest) = encoded.strip_prefix(COMPONENT_MARKER) else {
            return Ok(None);
        };

        let rest = rest.trim_start();
        let (type_name, props) = match rest.split_once(' ') {
            Some((type_name, props)) => (type_name, props.trim()),
            None => (rest, ""),
        };
        if type_name.is_empty() {
            return Ok(None);
        }

        let props = if props.is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(props) {
                Ok(Value::Object(props)) => props,
                Ok(other) => {
                    return Err(format!("template props for {type_name} must be an object, got {other}"))
                }
                Err(e) => return Err(format!("template props for {type_name}: {e}")),
            }
        };

        Ok(Some(Self {
            type_name: type_name.to_string(),
            props,
        }))
    }

    /// Encode back into the legacy string form
    pub fn to_legacy(&self) -> String {
        if self.props.is_empty() {
            format!("{COMPONENT_MARKER} {}", self.type_name)
        } else {
            format!(
                "{COMPONENT_MARKER} {} {}",
                self.type_name,
                Value::Object(self.props.clone())
            )
        }
    }
}

/// Declared schema of one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum PropertySpec {
    /// Plain schema value: an option list, a kind name, a default, ...
    Value(Value),

    /// The property holds a component built from this template
    Component(ComponentTemplate),
}

impl PropertySpec {
    pub fn template(&self) -> Option<&ComponentTemplate> {
        match self {
            PropertySpec::Component(template) => Some(template),
            PropertySpec::Value(_) => None,
        }
    }
}

impl TryFrom<Value> for PropertySpec {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if let Value::String(encoded) = &value {
            if let Some(template) = ComponentTemplate::parse_legacy(encoded)? {
                return Ok(PropertySpec::Component(template));
            }
        }
        Ok(PropertySpec::Value(value))
    }
}

impl From<PropertySpec> for Value {
    fn from(spec: PropertySpec) -> Self {
        match spec {
            PropertySpec::Value(value) => value,
            PropertySpec::Component(template) => Value::String(template.to_legacy()),
        }
    }
}

/// Registry entry describing one component type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentType {
    /// Props every new instance starts with
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub default_props: Map<String, Value>,

    /// Properties stored under the instance's `props`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertySpec>,

    /// Designer-only properties stored under the instance's `designProps`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub design_properties: BTreeMap<String, PropertySpec>,

    /// Whether instances accept children
    #[serde(default)]
    pub container: bool,
}

impl ComponentType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(mut self) -> Self {
        self.container = true;
        self
    }

    pub fn default_prop(mut self, name: &str, value: Value) -> Self {
        self.default_props.insert(name.to_string(), value);
        self
    }

    pub fn property(mut self, name: &str, schema: Value) -> Self {
        self.properties
            .insert(name.to_string(), PropertySpec::Value(schema));
        self
    }

    /// Declare a component-valued property
    pub fn slot(mut self, name: &str, template: ComponentTemplate) -> Self {
        self.properties
            .insert(name.to_string(), PropertySpec::Component(template));
        self
    }

    pub fn design_property(mut self, name: &str, schema: Value) -> Self {
        self.design_properties
            .insert(name.to_string(), PropertySpec::Value(schema));
        self
    }

    /// Properties whose value is a synthesized component, in name order
    pub fn component_properties(&self) -> impl Iterator<Item = (&str, &ComponentTemplate)> {
        self.properties
            .iter()
            .filter_map(|(name, spec)| spec.template().map(|t| (name.as_str(), t)))
    }

    pub fn declares_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn declares_design_property(&self, name: &str) -> bool {
        self.design_properties.contains_key(name)
    }
}
