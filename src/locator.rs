//! Structural paths for DOM elements
//!
//! Produces `tag > tag:nth-of-type(k) > ...` locators, most specific last,
//! the format stored in scheme paths.

use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};

/// Path of `element` from just below `<body>` down to the element itself.
///
/// The walk stops at the first ancestor named `body` or `html`, or at the
/// first non-element parent. Names are compared, not node identity.
///
/// A segment only carries `:nth-of-type(k)` when its parent has more than
/// one child with the same tag.
pub fn locate_path(element: ElementRef<'_>) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let tag = el.value().name().to_ascii_lowercase();
        if tag == "body" || tag == "html" {
            break;
        }

        let parent = el.parent().and_then(ElementRef::wrap);
        let mut segment = tag.clone();

        if let Some(parent) = parent {
            let same_tag: Vec<ElementRef<'_>> = parent
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|sibling| sibling.value().name().eq_ignore_ascii_case(&tag))
                .collect();

            if same_tag.len() > 1 {
                if let Some(index) = same_tag.iter().position(|sibling| sibling.id() == el.id()) {
                    segment = format!("{}:nth-of-type({})", tag, index + 1);
                }
            }
        }

        segments.push(segment);
        current = parent;
    }

    segments.reverse();
    if segments.first().map(String::as_str) == Some("html") {
        segments.remove(0);
    }

    segments.join(" > ")
}

/// Locate the first element in `document` matching a CSS selector
pub fn locate_first(document: &Html, selector: &str) -> Result<Option<String>> {
    let parsed = Selector::parse(selector).map_err(|_| Error::InvalidPath {
        path: selector.to_string(),
    })?;

    Ok(document.select(&parsed).next().map(locate_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html>
    <body>
        <div>
            <h1>Title</h1>
            <ul>
                <li>first</li>
                <li><p>second</p><img src="/a.png"></li>
                <li>third</li>
            </ul>
        </div>
        <div>
            <span>a</span>
            <p>b</p>
            <span>c</span>
        </div>
    </body>
    </html>
    "#;

    #[test]
    fn test_sibling_index_among_same_tag() {
        let document = Html::parse_document(PAGE);

        assert_eq!(
            locate_first(&document, "li p").unwrap().as_deref(),
            Some("div:nth-of-type(1) > ul > li:nth-of-type(2) > p")
        );
        assert_eq!(
            locate_first(&document, "div span:last-of-type").unwrap().as_deref(),
            Some("div:nth-of-type(2) > span:nth-of-type(2)")
        );
    }

    #[test]
    fn test_only_child_of_tag_has_no_suffix() {
        let document = Html::parse_document(PAGE);
        assert_eq!(
            locate_first(&document, "h1").unwrap().as_deref(),
            Some("div:nth-of-type(1) > h1")
        );
        assert_eq!(
            locate_first(&document, "img").unwrap().as_deref(),
            Some("div:nth-of-type(1) > ul > li:nth-of-type(2) > img")
        );
    }

    #[test]
    fn test_body_and_html_are_never_included() {
        let document = Html::parse_document("<html><body><main></main></body></html>");
        assert_eq!(locate_first(&document, "main").unwrap().as_deref(), Some("main"));
        assert_eq!(locate_first(&document, "body").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn test_walk_stops_at_nearest_body_named_ancestor() {
        let document = Html::parse_document(
            "<html><body><svg><html><text>x</text></html></svg></body></html>",
        );
        assert_eq!(locate_first(&document, "text").unwrap().as_deref(), Some("text"));
    }

    #[test]
    fn test_fragment_root() {
        let fragment = Html::parse_fragment("<section><b>x</b></section>");
        assert_eq!(
            locate_first(&fragment, "b").unwrap().as_deref(),
            Some("section > b")
        );
    }

    #[test]
    fn test_path_selects_element_back() {
        let document = Html::parse_document(PAGE);
        let path = locate_first(&document, "li p").unwrap().unwrap();

        let selector = Selector::parse(&path).unwrap();
        let found: Vec<String> = document
            .select(&selector)
            .map(|el| el.text().collect())
            .collect();
        assert_eq!(found, vec!["second".to_string()]);
    }

    #[test]
    fn test_missing_and_invalid() {
        let document = Html::parse_document(PAGE);
        assert_eq!(locate_first(&document, "table").unwrap(), None);
        assert!(matches!(
            locate_first(&document, "li["),
            Err(Error::InvalidPath { .. })
        ));
    }
}
