//! Scheme model
//!
//! A `Scheme` describes how to pull one piece of data out of a DOM subtree.
//! The same tree doubles as the interlaced document: once content has been
//! merged in, every node carries both its rule and its extracted value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// Closed set of scheme variants, as written in the `type` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeKind {
    String,
    List,
    Object,
}

impl SchemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::String => "STRING",
            SchemeKind::List => "LIST",
            SchemeKind::Object => "OBJECT",
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "STRING" => Ok(SchemeKind::String),
            "LIST" => Ok(SchemeKind::List),
            "OBJECT" => Ok(SchemeKind::Object),
            other => Err(Error::InvalidSchemeKind {
                kind: other.to_string(),
            }),
        }
    }
}

/// What a string scheme reads from its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractMode {
    /// The element's inner HTML
    #[default]
    InnerHtml,
    /// A `src`-like attribute (`src`, falling back to `href`)
    Src,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Scheme {
    String(StringScheme),
    List(ListScheme),
    Object(ObjectScheme),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StringScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub mode: ExtractMode,
    /// Extracted value, only set on interlaced trees. An explicit `null`
    /// stays `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Scheme applied to each matched element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_scheme: Option<Box<Scheme>>,
    /// Extracted values, one per matched element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Value>>,
    /// One interlaced element scheme per content entry, only filled in
    /// per-element interlacing mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Scheme>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: Vec<KVPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KVPair {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Scheme>,
}

impl KVPair {
    pub fn new(key: impl Into<String>, value: Scheme) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
        }
    }
}

/// A scheme together with the page it is meant for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instructions {
    pub url: String,
    pub scheme: Scheme,
}

impl Instructions {
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if let Some(scheme) = value.get("scheme") {
            check_kinds(scheme)?;
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl Scheme {
    /// Blank scheme of the given kind, as handed out by authoring tools
    pub fn empty(kind: SchemeKind) -> Self {
        match kind {
            SchemeKind::String => Scheme::String(StringScheme::default()),
            SchemeKind::List => Scheme::List(ListScheme::default()),
            SchemeKind::Object => Scheme::Object(ObjectScheme::default()),
        }
    }

    pub fn string(path: impl Into<String>) -> Self {
        Scheme::String(StringScheme {
            path: Some(path.into()),
            ..Default::default()
        })
    }

    pub fn list(path: impl Into<String>, element_scheme: Scheme) -> Self {
        Scheme::List(ListScheme {
            path: Some(path.into()),
            element_scheme: Some(Box::new(element_scheme)),
            ..Default::default()
        })
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Scheme)>) -> Self {
        Scheme::Object(ObjectScheme {
            fields: fields
                .into_iter()
                .map(|(key, value)| KVPair::new(key, value))
                .collect(),
            ..Default::default()
        })
    }

    /// Parse a scheme, reporting unknown `type` tags anywhere in the tree
    /// as `InvalidSchemeKind`.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        check_kinds(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn kind(&self) -> SchemeKind {
        match self {
            Scheme::String(_) => SchemeKind::String,
            Scheme::List(_) => SchemeKind::List,
            Scheme::Object(_) => SchemeKind::Object,
        }
    }

    /// Structural path, `None` for objects and for blank paths
    pub fn path(&self) -> Option<&str> {
        let path = match self {
            Scheme::String(s) => s.path.as_deref(),
            Scheme::List(l) => l.path.as_deref(),
            Scheme::Object(_) => None,
        };
        non_empty(path)
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Scheme::String(s) => s.url.as_deref(),
            Scheme::List(l) => l.url.as_deref(),
            Scheme::Object(o) => o.url.as_deref(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Scheme::String(s) => s.name.as_deref(),
            Scheme::List(l) => l.name.as_deref(),
            Scheme::Object(o) => o.name.as_deref(),
        }
    }

    /// URL this subtree is scraped from: its own override resolved against
    /// the inherited one, or the inherited one unchanged.
    pub fn effective_url(&self, inherited: Option<&Url>) -> Result<Option<Url>> {
        let Some(own) = self.url().filter(|u| !u.is_empty()) else {
            return Ok(inherited.cloned());
        };

        let resolved = match inherited {
            Some(base) => base.join(own),
            None => Url::parse(own),
        };

        resolved.map(Some).map_err(|_| Error::InvalidUrl {
            url: own.to_string(),
        })
    }
}

impl ObjectScheme {
    /// Sub-scheme for `key`; the last field wins when keys repeat
    pub fn field(&self, key: &str) -> Option<&Scheme> {
        self.fields
            .iter()
            .rev()
            .find(|pair| pair.key == key)
            .and_then(|pair| pair.value.as_ref())
    }
}

// A present key always deserializes to `Some`, even when it holds null.
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Blank strings count as "no path"
pub(crate) fn non_empty(path: Option<&str>) -> Option<&str> {
    path.filter(|p| !p.is_empty())
}

fn check_kinds(value: &Value) -> Result<()> {
    let Some(obj) = value.as_object() else {
        return Ok(());
    };

    let kind = match obj.get("type") {
        Some(Value::String(tag)) => tag.parse::<SchemeKind>()?,
        Some(other) => {
            return Err(Error::InvalidSchemeKind {
                kind: other.to_string(),
            })
        }
        None => {
            return Err(Error::InvalidSchemeKind {
                kind: String::new(),
            })
        }
    };

    match kind {
        SchemeKind::String => Ok(()),
        SchemeKind::List => {
            if let Some(element) = obj.get("element_scheme").filter(|v| !v.is_null()) {
                check_kinds(element)?;
            }
            if let Some(Value::Array(elements)) = obj.get("elements") {
                elements.iter().try_for_each(check_kinds)?;
            }
            Ok(())
        }
        SchemeKind::Object => {
            if let Some(Value::Array(fields)) = obj.get("fields") {
                for field in fields {
                    if let Some(sub) = field.get("value").filter(|v| !v.is_null()) {
                        check_kinds(sub)?;
                    }
                }
            }
            Ok(())
        }
    }
}
