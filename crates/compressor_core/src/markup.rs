//! A tolerant scanner for the few HTML elements the compressor cares about.
//!
//! This is not an HTML parser. It finds `<link>`, `<style>` and `<script>`
//! elements in document order, reads their attributes, and keeps their exact
//! source text so that uncompressed output can reproduce them. Elements inside
//! `<!-- -->` comments are ignored.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(link|style|script)\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("open tag pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern is valid")
});

static CLOSE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</style\s*>").expect("close style pattern is valid"));

static CLOSE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</script\s*>").expect("close script pattern is valid"));

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

/// An element found by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name: `link`, `style` or `script`.
    pub name: String,
    /// Attributes in source order, names lowercased, values unquoted.
    /// A bare attribute has an empty value.
    pub attrs: Vec<(String, String)>,
    /// Text between the open and close tags. `None` for `<link>`.
    pub inner: Option<String>,
    /// Byte range of the whole element in the scanned document.
    pub span: Range<usize>,
    /// The element's exact source text.
    pub text: String,
}

impl Element {
    /// Returns the value of the first attribute called `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Finds every `<link>`, `<style>` and `<script>` element in `html`.
///
/// A `<style>` or `<script>` without a closing tag extends to the end of the
/// document.
pub fn scan(html: &str) -> Vec<Element> {
    let comments: Vec<Range<usize>> = COMMENT.find_iter(html).map(|m| m.range()).collect();
    let in_comment = |pos: usize| comments.iter().any(|c| c.contains(&pos));

    let mut elements = Vec::new();
    let mut pos = 0;
    while let Some(caps) = OPEN_TAG.captures_at(html, pos) {
        let whole = caps.get(0).map(|m| m.range()).unwrap_or(pos..pos);
        if whole.is_empty() {
            break;
        }
        if in_comment(whole.start) {
            pos = whole.end;
            continue;
        }

        let name = caps[1].to_ascii_lowercase();
        let attrs = parse_attrs(caps.get(2).map_or("", |m| m.as_str()));

        let (inner, end) = match name.as_str() {
            "style" => close_at(html, whole.end, &CLOSE_STYLE),
            "script" => close_at(html, whole.end, &CLOSE_SCRIPT),
            _ => (None, whole.end),
        };

        elements.push(Element {
            name,
            attrs,
            inner,
            span: whole.start..end,
            text: html[whole.start..end].to_string(),
        });
        pos = end;
    }
    elements
}

/// Returns the inner text and the element end for a tag closed by `close`.
fn close_at(html: &str, from: usize, close: &Regex) -> (Option<String>, usize) {
    match close.find_at(html, from) {
        Some(m) => (Some(html[from..m.start()].to_string()), m.end()),
        None => (Some(html[from..].to_string()), html.len()),
    }
}

/// Parses the attribute section of an open tag.
fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str())
                .to_string();
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_elements_in_order() {
        let html = r#"
<link rel="stylesheet" href="/media/css/one.css" type="text/css">
<style type="text/css">p { border:5px solid green;}</style>
<script src="/media/js/one.js" type="text/javascript"></script>
"#;
        let elems = scan(html);
        let names: Vec<&str> = elems.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["link", "style", "script"]);
        assert_eq!(elems[0].attr("href"), Some("/media/css/one.css"));
        assert_eq!(elems[1].inner.as_deref(), Some("p { border:5px solid green;}"));
        assert_eq!(
            elems[1].text,
            r#"<style type="text/css">p { border:5px solid green;}</style>"#
        );
        assert_eq!(elems[2].inner.as_deref(), Some(""));
    }

    #[test]
    fn attribute_quoting_styles() {
        let elems = scan(r#"<script type='text/javascript' src=/media/js/a.js defer></script>"#);
        let e = &elems[0];
        assert_eq!(e.attr("type"), Some("text/javascript"));
        assert_eq!(e.attr("src"), Some("/media/js/a.js"));
        assert_eq!(e.attr("defer"), Some(""));
    }

    #[test]
    fn names_are_case_insensitive() {
        let elems = scan(r#"<LINK REL="stylesheet" HREF="/media/a.css"><STYLE>a{}</STYLE>"#);
        assert_eq!(elems[0].name, "link");
        assert_eq!(elems[0].attr("rel"), Some("stylesheet"));
        assert_eq!(elems[1].inner.as_deref(), Some("a{}"));
    }

    #[test]
    fn self_closing_link() {
        let elems = scan(r#"<link rel="stylesheet" href="/media/a.css" />"#);
        assert_eq!(elems.len(), 1);
        assert_eq!(elems[0].attr("href"), Some("/media/a.css"));
        assert_eq!(elems[0].attrs.len(), 2);
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        let elems = scan(r#"<link rel="stylesheet" title="a>b" href="/media/a.css">"#);
        assert_eq!(elems[0].attr("title"), Some("a>b"));
        assert_eq!(elems[0].attr("href"), Some("/media/a.css"));
    }

    #[test]
    fn script_body_is_not_scanned() {
        let html = r#"<script>document.write("<link rel='stylesheet' href='x.css'>");</script>"#;
        let elems = scan(html);
        assert_eq!(elems.len(), 1);
        assert_eq!(elems[0].name, "script");
    }

    #[test]
    fn commented_elements_are_skipped() {
        let html = r#"<!-- <script src="/media/js/old.js"></script> --><script src="/media/js/new.js"></script>"#;
        let elems = scan(html);
        assert_eq!(elems.len(), 1);
        assert_eq!(elems[0].attr("src"), Some("/media/js/new.js"));
    }

    #[test]
    fn unterminated_style_runs_to_end() {
        let elems = scan("<style type=\"text/ccss\">\nsmall:\n  font-size:10px");
        assert_eq!(elems[0].inner.as_deref(), Some("\nsmall:\n  font-size:10px"));
    }

    #[test]
    fn other_elements_are_ignored() {
        assert!(scan("<div><p>hello</p><linker></linker></div>").is_empty());
    }
}
