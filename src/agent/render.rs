//! Splitting and cleaning model answers for display.
//!
//! Answers may start with an HTML fragment (typically a table) followed by
//! a plain-text summary.

use scraper::{ElementRef, Html, Node};

const HTML_END: &str = "</html>";

/// Attributes forced onto the first table.
const TABLE_ATTRS: [(&str, &str); 2] = [("border", "1"), ("cellpadding", "5")];

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Split an answer into `(html, summary)` at the first `</html>`.
///
/// The html part keeps the closing tag and is not trimmed; the summary is
/// trimmed. Without a closing tag the html part is empty and the whole
/// answer is the summary.
pub fn parse_llm_output(response: &str) -> (String, String) {
    match response.find(HTML_END) {
        Some(idx) => {
            let end = idx + HTML_END.len();
            (
                response[..end].to_string(),
                response[end..].trim().to_string(),
            )
        }
        None => (String::new(), response.trim().to_string()),
    }
}

/// Strip scripts, styles and comments, and give the first table a border
/// and cell padding.
///
/// The fragment is parsed and re-serialized, so the output is normalized
/// (implied `<tbody>` elements appear, an outer `<html>` wrapper is dropped).
pub fn clean_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    let mut table_seen = false;
    write_children(fragment.root_element(), &mut table_seen, &mut out);
    out
}

fn write_children(element: ElementRef<'_>, table_seen: &mut bool, out: &mut String) {
    for child in element.children() {
        if let Some(child) = ElementRef::wrap(child) {
            write_element(child, table_seen, out);
        } else if let Node::Text(text) = child.value() {
            escape_into(text, false, out);
        }
    }
}

fn write_element(element: ElementRef<'_>, table_seen: &mut bool, out: &mut String) {
    let name = element.value().name();
    if name == "script" || name == "style" {
        return;
    }

    let force_attrs = name == "table" && !*table_seen;
    if force_attrs {
        *table_seen = true;
    }

    out.push('<');
    out.push_str(name);
    for (attr, value) in element.value().attrs() {
        let value = match TABLE_ATTRS.iter().find(|(a, _)| force_attrs && *a == attr) {
            Some((_, forced)) => *forced,
            None => value,
        };
        write_attr(attr, value, out);
    }
    if force_attrs {
        for (attr, value) in TABLE_ATTRS {
            if element.value().attr(attr).is_none() {
                write_attr(attr, value, out);
            }
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }
    write_children(element, table_seen, out);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(value, true, out);
    out.push('"');
}

fn escape_into(text: &str, in_attr: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if in_attr => out.push_str("&quot;"),
            '<' if !in_attr => out.push_str("&lt;"),
            '>' if !in_attr => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}
