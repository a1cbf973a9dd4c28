//! Path relativization
//!
//! Authoring tools record absolute paths. Once a scheme is complete, every
//! path below a list is rewritten relative to that list's own path so the
//! instructions survive layout shifts above the repeating container.

use crate::scheme::{non_empty, Instructions, KVPair, ListScheme, Scheme};

const SEPARATOR: &str = " > ";

/// Rewrite element-scheme paths relative to their enclosing list.
///
/// Pure; the input is left untouched. Idempotent except for lists nested in
/// a list's element scheme, whose elements are stripped again on a second
/// pass.
pub fn relativize(scheme: &Scheme) -> Scheme {
    tracing::debug!(kind = %scheme.kind(), "Relativizing scheme paths");
    relativize_lists(scheme)
}

pub fn relativize_instructions(instructions: &Instructions) -> Instructions {
    Instructions {
        url: instructions.url.clone(),
        scheme: relativize(&instructions.scheme),
    }
}

// Top-level dispatch: nothing is relative until the first list is reached.
fn relativize_lists(scheme: &Scheme) -> Scheme {
    match scheme {
        Scheme::List(list) => match (non_empty(list.path.as_deref()), &list.element_scheme) {
            (Some(path), Some(element)) => Scheme::List(ListScheme {
                element_scheme: Some(Box::new(relative_to_parent(element, path))),
                ..list.clone()
            }),
            _ => scheme.clone(),
        },
        Scheme::Object(obj) => {
            let mut obj = obj.clone();
            obj.fields = map_fields(&obj.fields, relativize_lists);
            Scheme::Object(obj)
        }
        Scheme::String(_) => scheme.clone(),
    }
}

fn relative_to_parent(scheme: &Scheme, parent_path: &str) -> Scheme {
    match scheme {
        Scheme::String(string) => match non_empty(string.path.as_deref()) {
            Some(path) => {
                let mut string = string.clone();
                string.path = Some(make_path_relative(path, parent_path));
                Scheme::String(string)
            }
            None => scheme.clone(),
        },
        Scheme::Object(obj) => {
            let mut obj = obj.clone();
            obj.fields = map_fields(&obj.fields, |value| relative_to_parent(value, parent_path));
            Scheme::Object(obj)
        }
        Scheme::List(list) => match non_empty(list.path.as_deref()) {
            // Descendants are measured against this list's path before the
            // rewrite. On an already relative tree that path is relative too.
            Some(path) => Scheme::List(ListScheme {
                path: Some(make_path_relative(path, parent_path)),
                element_scheme: list
                    .element_scheme
                    .as_deref()
                    .map(|element| Box::new(relative_to_parent(element, path))),
                ..list.clone()
            }),
            None => scheme.clone(),
        },
    }
}

fn map_fields(fields: &[KVPair], rewrite: impl Fn(&Scheme) -> Scheme) -> Vec<KVPair> {
    fields
        .iter()
        .map(|field| KVPair {
            key: field.key.clone(),
            value: field.value.as_ref().map(&rewrite),
        })
        .collect()
}

/// Strip the leading segments `child_path` shares with `parent_path`.
///
/// The first remaining segment is reduced to its tag name, since its sibling
/// index was measured in the old, wider scope.
pub fn make_path_relative(child_path: &str, parent_path: &str) -> String {
    let parent_segments: Vec<&str> = parent_path.split('>').map(str::trim).collect();
    let child_segments: Vec<&str> = child_path.split('>').map(str::trim).collect();

    let common = parent_segments
        .iter()
        .zip(&child_segments)
        .take_while(|(parent, child)| parent == child)
        .count();

    let mut remaining: Vec<&str> = child_segments[common..].to_vec();
    if let Some(first) = remaining.first_mut() {
        let tag = tag_name(first);
        if !tag.is_empty() {
            *first = tag;
        }
    }

    let relative = remaining.join(SEPARATOR);
    tracing::trace!(child_path, parent_path, relative = %relative, "Relativized path");
    relative
}

fn tag_name(segment: &str) -> &str {
    let end = segment
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(segment.len());
    &segment[..end]
}
