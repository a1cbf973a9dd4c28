//! Interlacing: merge scraped content back into a scheme tree
//!
//! The result keeps every extraction rule and adds the value extracted for
//! it, so rule and result can be inspected side by side. Content is
//! untrusted; anything malformed degrades to empty or unchanged values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::scheme::{Instructions, KVPair, ListScheme, Scheme, StringScheme};

/// How list content is spread over a list's element scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterlaceMode {
    /// Interlace the element scheme once, against the first entry only
    #[default]
    Representative,
    /// Also interlace one element scheme per entry into `ListScheme::elements`
    PerElement,
}

/// Interlace with the default single-representative list behaviour
pub fn interlace(scheme: &Scheme, content: &Value) -> Scheme {
    interlace_with_mode(scheme, content, InterlaceMode::default())
}

pub fn interlace_with_mode(scheme: &Scheme, content: &Value, mode: InterlaceMode) -> Scheme {
    tracing::debug!(kind = %scheme.kind(), ?mode, "Interlacing scraped content");
    interlace_node(scheme, Some(content), mode)
}

pub fn interlace_instructions(instructions: &Instructions, output: &Value) -> Instructions {
    Instructions {
        url: instructions.url.clone(),
        scheme: interlace(&instructions.scheme, output),
    }
}

// `None` is content that was never supplied, as opposed to an explicit null.
fn interlace_node(scheme: &Scheme, content: Option<&Value>, mode: InterlaceMode) -> Scheme {
    match scheme {
        Scheme::String(string) => Scheme::String(StringScheme {
            content: content.cloned(),
            ..string.clone()
        }),
        Scheme::List(list) => {
            let items = match content {
                Some(Value::Array(items)) => items.clone(),
                Some(other) => {
                    tracing::warn!(
                        path = list.path.as_deref().unwrap_or_default(),
                        found = json_kind(other),
                        "List content is not an array, using empty list"
                    );
                    vec![]
                }
                None => vec![],
            };

            let element_scheme = list
                .element_scheme
                .as_deref()
                .map(|element| Box::new(interlace_node(element, items.first(), mode)));

            let elements = match (mode, list.element_scheme.as_deref()) {
                (InterlaceMode::PerElement, Some(element)) => Some(
                    items
                        .iter()
                        .map(|item| interlace_node(element, Some(item), mode))
                        .collect(),
                ),
                _ => None,
            };

            Scheme::List(ListScheme {
                content: Some(items),
                element_scheme,
                elements,
                ..list.clone()
            })
        }
        Scheme::Object(obj) => {
            let mut obj = obj.clone();
            obj.fields = obj
                .fields
                .iter()
                .map(|field| KVPair {
                    key: field.key.clone(),
                    value: field.value.as_ref().map(|value| {
                        match content.and_then(|c| c.get(&field.key)).filter(|v| !v.is_null()) {
                            Some(field_content) => interlace_node(value, Some(field_content), mode),
                            None => value.clone(),
                        }
                    }),
                })
                .collect();
            Scheme::Object(obj)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
