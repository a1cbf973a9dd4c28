//! Scheme execution against HTML
//!
//! Runs a (relativized) scheme over a parsed document and produces the JSON
//! content that the interlacer later merges back into the scheme.
//!
//! A list's path selects its container; its element scheme is then run in
//! "many" mode inside that container, where every path selects all matches.

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result};
use crate::scheme::{ExtractMode, Instructions, KVPair, Scheme, StringScheme};

/// Execute a scheme against an HTML document
pub fn execute(scheme: &Scheme, html: &str) -> Result<Value> {
    execute_at(scheme, html, None)
}

/// Execute instructions, resolving `SRC` values against the instruction url
pub fn execute_instructions(instructions: &Instructions, html: &str) -> Result<Value> {
    let base = Url::parse(&instructions.url).ok();
    if base.is_none() {
        tracing::warn!(url = %instructions.url, "Instruction url is not absolute, SRC values stay raw");
    }
    execute_at(&instructions.scheme, html, base.as_ref())
}

fn execute_at(scheme: &Scheme, html: &str, base: Option<&Url>) -> Result<Value> {
    tracing::debug!(kind = %scheme.kind(), url = ?base.map(Url::as_str), "Executing scheme");
    let document = Html::parse_document(html);
    process(scheme, document.root_element(), base)
}

/// JSON in, JSON out. Failures come back as `{"error": "..."}`.
pub fn scrape_json(html: &str, instructions_json: &str) -> String {
    let instructions = match Instructions::from_json(instructions_json) {
        Ok(i) => i,
        Err(e) => return serde_json::json!({ "error": e.to_string() }).to_string(),
    };

    match execute_instructions(&instructions, html) {
        Ok(value) => value.to_string(),
        Err(e) => serde_json::json!({ "error": e.to_string() }).to_string(),
    }
}

fn process(scheme: &Scheme, element: ElementRef<'_>, base: Option<&Url>) -> Result<Value> {
    let url = scheme.effective_url(base)?;
    let base = url.as_ref();

    match scheme {
        Scheme::String(string) => {
            let target = select_first(element, scheme.path())?;
            Ok(read_string(target, string, base))
        }
        Scheme::List(list) => {
            let container = select_first(element, scheme.path())?;
            let values = match list.element_scheme.as_deref() {
                Some(element_scheme) => process_many(element_scheme, container, base)?,
                None => vec![],
            };
            Ok(Value::Array(values))
        }
        Scheme::Object(obj) => {
            let mut map = Map::with_capacity(obj.fields.len());
            for KVPair { key, value } in &obj.fields {
                let Some(value) = value else { continue };
                map.insert(key.clone(), process(value, element, base)?);
            }
            Ok(Value::Object(map))
        }
    }
}

fn process_many(scheme: &Scheme, element: ElementRef<'_>, base: Option<&Url>) -> Result<Vec<Value>> {
    let url = scheme.effective_url(base)?;
    let base = url.as_ref();

    match scheme {
        Scheme::String(string) => Ok(select_all(element, scheme.path())?
            .into_iter()
            .map(|target| read_string(target, string, base))
            .collect()),
        Scheme::List(list) => {
            let mut res = vec![];
            for container in select_all(element, scheme.path())? {
                let values = match list.element_scheme.as_deref() {
                    Some(element_scheme) => process_many(element_scheme, container, base)?,
                    None => vec![],
                };
                res.push(Value::Array(values));
            }
            Ok(res)
        }
        Scheme::Object(obj) => {
            let mut columns: Vec<(&str, Vec<Value>)> = Vec::with_capacity(obj.fields.len());

            for KVPair { key, value } in &obj.fields {
                let Some(value) = value else { continue };
                let values = process_many(value, element, base)?;

                if let Some((_, first)) = columns.first() {
                    if first.len() != values.len() {
                        return Err(Error::MismatchedFieldCount {
                            field: key.clone(),
                            expected: first.len(),
                            found: values.len(),
                        });
                    }
                }
                columns.push((key.as_str(), values));
            }

            let count = columns.first().map_or(0, |(_, values)| values.len());
            tracing::trace!(count, fields = columns.len(), "Zipping object fields");

            let objects = (0..count)
                .map(|i| {
                    let mut map = Map::with_capacity(columns.len());
                    for (key, values) in &columns {
                        map.insert(key.to_string(), values[i].clone());
                    }
                    Value::Object(map)
                })
                .collect();
            Ok(objects)
        }
    }
}

fn parse_path(path: &str) -> Result<Selector> {
    Selector::parse(path).map_err(|_| Error::InvalidPath {
        path: path.to_string(),
    })
}

// An absent path means the context element itself.
fn select_first<'a>(element: ElementRef<'a>, path: Option<&str>) -> Result<ElementRef<'a>> {
    let Some(path) = path else {
        return Ok(element);
    };

    let selector = parse_path(path)?;
    element.select(&selector).next().ok_or(Error::NoElementFound {
        path: path.to_string(),
    })
}

fn select_all<'a>(element: ElementRef<'a>, path: Option<&str>) -> Result<Vec<ElementRef<'a>>> {
    let Some(path) = path else {
        return Ok(vec![element]);
    };

    let selector = parse_path(path)?;
    Ok(element.select(&selector).collect())
}

fn read_string(element: ElementRef<'_>, scheme: &StringScheme, base: Option<&Url>) -> Value {
    match scheme.mode {
        ExtractMode::InnerHtml => Value::String(element.inner_html()),
        ExtractMode::Src => {
            let attr = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("href"));

            match attr {
                Some(raw) => {
                    let resolved = base
                        .and_then(|b| b.join(raw.trim()).ok())
                        .map(String::from)
                        .unwrap_or_else(|| raw.to_string());
                    Value::String(resolved)
                }
                None => Value::Null,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::ListScheme;
    use serde_json::json;

    const HTML: &str = r#"
    <html>
    <body>
        <h1>Catalog</h1>
        <ul class="products">
            <li><b>Apple</b><img src="/img/apple.png"></li>
            <li><b>Pear</b><img src="/img/pear.png"></li>
        </ul>
        <ol>
            <li><i>x</i><i>y</i></li>
            <li><i>z</i></li>
        </ol>
    </body>
    </html>
    "#;

    #[test]
    fn test_object_with_list() {
        let scheme = Scheme::object([
            ("title", Scheme::string("h1")),
            ("names", Scheme::list("ul", Scheme::string("li > b"))),
        ]);

        let value = execute(&scheme, HTML).unwrap();
        assert_eq!(value, json!({ "title": "Catalog", "names": ["Apple", "Pear"] }));
    }

    #[test]
    fn test_list_of_objects_with_src() {
        let scheme = Scheme::list(
            "ul",
            Scheme::object([
                ("name", Scheme::string("b")),
                (
                    "image",
                    Scheme::String(StringScheme {
                        path: Some("img".into()),
                        mode: ExtractMode::Src,
                        ..Default::default()
                    }),
                ),
            ]),
        );

        let instructions = Instructions {
            url: "https://shop.example/catalog".into(),
            scheme,
        };
        let value = execute_instructions(&instructions, HTML).unwrap();
        assert_eq!(
            value,
            json!([
                { "name": "Apple", "image": "https://shop.example/img/apple.png" },
                { "name": "Pear", "image": "https://shop.example/img/pear.png" }
            ])
        );
    }

    #[test]
    fn test_list_of_lists() {
        let scheme = Scheme::list("ol", Scheme::list("li", Scheme::string("i")));
        let value = execute(&scheme, HTML).unwrap();
        assert_eq!(value, json!([["x", "y"], ["z"]]));
    }

    #[test]
    fn test_pathless_string_reads_context() {
        let scheme = Scheme::list("ul > li", Scheme::String(StringScheme::default()));
        let value = execute(&scheme, HTML).unwrap();
        assert_eq!(value, json!([r#"<b>Apple</b><img src="/img/apple.png">"#]));
    }

    #[test]
    fn test_untyped_list_is_empty() {
        let scheme = Scheme::List(ListScheme {
            path: Some("ul".into()),
            ..Default::default()
        });
        assert_eq!(execute(&scheme, HTML).unwrap(), json!([]));
    }

    #[test]
    fn test_mismatched_field_count() {
        let scheme = Scheme::list(
            "ol",
            Scheme::object([("first", Scheme::string("li")), ("all", Scheme::string("i"))]),
        );
        let err = execute(&scheme, HTML).unwrap_err();
        assert!(matches!(
            err,
            Error::MismatchedFieldCount { ref field, expected: 2, found: 3 } if field == "all"
        ));
    }

    #[test]
    fn test_missing_and_invalid_paths() {
        assert!(matches!(
            execute(&Scheme::string("table"), HTML),
            Err(Error::NoElementFound { .. })
        ));
        assert!(matches!(
            execute(&Scheme::string("li["), HTML),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_scrape_json_reports_errors() {
        let ok = scrape_json(
            HTML,
            r#"{ "url": "https://shop.example", "scheme": { "type": "STRING", "path": "h1" } }"#,
        );
        assert_eq!(ok, r#""Catalog""#);

        let bad: Value = serde_json::from_str(&scrape_json(HTML, "{ nope")).unwrap();
        assert!(bad.get("error").is_some());

        let unknown: Value = serde_json::from_str(&scrape_json(
            HTML,
            r#"{ "url": "https://shop.example", "scheme": { "type": "TABLE" } }"#,
        ))
        .unwrap();
        assert!(unknown["error"].as_str().unwrap().contains("TABLE"));
    }
}
