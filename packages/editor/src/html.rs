//! # HTML Writer
//!
//! Renders a document tree as an HTML fragment. Every element type has
//! exactly one arm in [`tag_for`], so a new type cannot be added without
//! deciding how it renders.

use crate::table::cell_attributes;
use crate::Document;
use trellis_model::{schema, Element, ElementType, Node, Text};

/// Options for HTML output
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// One block per line, indented by nesting depth
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

struct Context {
    options: HtmlOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: HtmlOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
        self.buffer.push_str(text);
        if self.options.pretty {
            self.buffer.push('\n');
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

/// How one element type renders
struct Tag {
    name: &'static str,
    class: Option<&'static str>,
    /// No closing tag and no rendered children
    empty: bool,
}

impl Tag {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            class: None,
            empty: false,
        }
    }

    fn classed(name: &'static str, class: &'static str) -> Self {
        Self {
            name,
            class: Some(class),
            empty: false,
        }
    }

    fn empty(mut self) -> Self {
        self.empty = true;
        self
    }
}

fn tag_for(kind: &ElementType) -> Tag {
    match kind {
        ElementType::Paragraph => Tag::new("p"),
        ElementType::Heading1 => Tag::new("h1"),
        ElementType::Heading2 => Tag::new("h2"),
        ElementType::Heading3 => Tag::new("h3"),
        ElementType::Heading4 => Tag::new("h4"),
        ElementType::Heading5 => Tag::new("h5"),
        ElementType::Heading6 => Tag::new("h6"),
        ElementType::UnorderedList => Tag::new("ul"),
        ElementType::OrderedList => Tag::new("ol"),
        ElementType::ListItem => Tag::new("li"),
        ElementType::Table => Tag::new("table"),
        ElementType::TableRow => Tag::new("tr"),
        ElementType::TableHeader => Tag::new("th"),
        ElementType::TableData => Tag::new("td"),
        ElementType::Blockquote => Tag::new("blockquote"),
        ElementType::Code => Tag::new("pre"),
        ElementType::CodeLine => Tag::classed("span", "code-line"),
        ElementType::Math => Tag::classed("div", "math"),
        ElementType::MathLine => Tag::classed("div", "math-line"),
        ElementType::Callout => Tag::classed("aside", "callout"),
        ElementType::Image => Tag::new("img").empty(),
        ElementType::ImageInline => Tag::classed("img", "inline").empty(),
        ElementType::YouTube => Tag::classed("iframe", "youtube"),
        ElementType::Audio => Tag::new("audio"),
        ElementType::Video => Tag::new("video"),
        ElementType::Webpage => Tag::new("iframe"),
        ElementType::PageLink => Tag::classed("a", "page-link"),
        ElementType::FormulaBlock => Tag::classed("div", "formula"),
        ElementType::FormulaInline => Tag::classed("span", "formula"),
        ElementType::Hyperlink => Tag::new("a"),
        ElementType::InputRef => Tag::classed("span", "input-ref"),
        ElementType::Popup => Tag::classed("span", "popup"),
        ElementType::CalloutInline => Tag::classed("span", "callout"),
        ElementType::Unknown(_) => Tag::new("div"),
    }
}

pub fn to_html(doc: &Document) -> String {
    to_html_with(doc, HtmlOptions::default())
}

pub fn to_html_with(doc: &Document, options: HtmlOptions) -> String {
    let mut ctx = Context::new(options);
    for node in doc.children() {
        match node {
            Node::Element(element) => write_block(&mut ctx, element),
            Node::Text(text) => ctx.add_line(&write_text(text)),
        }
    }
    ctx.buffer
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn open_tag(element: &Element) -> String {
    let tag = tag_for(&element.kind);
    let attrs = &element.attrs;
    let mut out = format!("<{}", tag.name);
    let mut push = |name: &str, value: &str| {
        out.push_str(&format!(" {}=\"{}\"", name, escape(value)));
    };

    let mut classes: Vec<String> = tag.class.map(str::to_string).into_iter().collect();
    if let ElementType::Unknown(name) = &element.kind {
        push("data-type", name);
    }
    if element.kind.is_table_cell() {
        let cell = cell_attributes(element);
        if let Some(n) = cell.col_span {
            push("colspan", &n.to_string());
        }
        if let Some(n) = cell.row_span {
            push("rowspan", &n.to_string());
        }
        classes.extend(cell.align_class);
    }
    if let Some(src) = &attrs.src {
        push("src", src);
    }
    if let Some(alt) = &attrs.alt {
        push("alt", alt);
    }
    if let Some(href) = &attrs.href {
        push("href", href);
    }
    if let Some(style) = &attrs.style {
        push("style", &format!("list-style-type: {}", style));
    }
    if let Some(border) = &attrs.border {
        classes.push(format!("border-{}", border));
    }
    if let Some(rowstyle) = &attrs.rowstyle {
        classes.push(format!("rows-{}", rowstyle));
    }
    if matches!(element.kind, ElementType::Audio | ElementType::Video) {
        out.push_str(" controls");
    }
    if !classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape(&classes.join(" "))));
    }
    out.push('>');
    out
}

fn close_tag(element: &Element) -> String {
    format!("</{}>", tag_for(&element.kind).name)
}

fn write_block(ctx: &mut Context, element: &Element) {
    let tag = tag_for(&element.kind);
    if tag.empty {
        ctx.add_line(&open_tag(element));
        return;
    }
    if element.kind == ElementType::Code {
        write_code(ctx, element);
        return;
    }

    let has_blocks = element
        .child_elements()
        .any(|child| schema::is_block(&child.kind));
    if !has_blocks {
        let inner: String = element.children.iter().map(write_inline).collect();
        ctx.add_line(&format!("{}{}{}", open_tag(element), inner, close_tag(element)));
        return;
    }

    ctx.add_line(&open_tag(element));
    ctx.indent();
    for child in &element.children {
        match child {
            Node::Element(child) => write_block(ctx, child),
            Node::Text(text) => ctx.add_line(&write_text(text)),
        }
    }
    ctx.dedent();
    ctx.add_line(&close_tag(element));
}

/// Code lines keep their line breaks whatever the pretty setting
fn write_code(ctx: &mut Context, code: &Element) {
    let language = code
        .attrs
        .language
        .as_deref()
        .map(|l| format!(" class=\"language-{}\"", escape(l)))
        .unwrap_or_default();
    let lines: Vec<String> = code
        .children
        .iter()
        .map(|line| escape(&line.text_content()))
        .collect();
    ctx.add_line(&format!("<pre><code{}>{}</code></pre>", language, lines.join("\n")));
}

fn write_inline(node: &Node) -> String {
    match node {
        Node::Text(text) => write_text(text),
        Node::Element(element) if tag_for(&element.kind).empty => open_tag(element),
        Node::Element(element) => {
            let inner: String = element.children.iter().map(write_inline).collect();
            format!("{}{}{}", open_tag(element), inner, close_tag(element))
        }
    }
}

fn write_text(text: &Text) -> String {
    let marks = &text.marks;
    let active: Vec<&str> = [
        (marks.strong, "strong"),
        (marks.em, "em"),
        (marks.underline, "u"),
        (marks.strikethrough, "s"),
        (marks.code, "code"),
        (marks.sub, "sub"),
        (marks.sup, "sup"),
        (marks.mark, "mark"),
    ]
    .into_iter()
    .filter_map(|(on, tag)| on.then_some(tag))
    .collect();
    let mut out = String::new();
    for tag in &active {
        out.push_str(&format!("<{}>", tag));
    }
    out.push_str(&escape(&text.text));
    for tag in active.iter().rev() {
        out.push_str(&format!("</{}>", tag));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(json: &str) -> String {
        to_html(&Document::from_json("t", json).unwrap())
    }

    #[test]
    fn test_paragraph_with_marks() {
        let html = render(
            r#"[{"type":"p","id":"a","children":[
                {"text":"a < b "},{"text":"bold","strong":true,"em":true}
            ]}]"#,
        );
        assert_eq!(html, "<p>a &lt; b <strong><em>bold</em></strong></p>\n");
    }

    #[test]
    fn test_nested_list_indents() {
        let html = render(
            r#"[{"type":"ul","id":"l","children":[
                {"type":"li","id":"a","children":[{"type":"p","id":"p","children":[{"text":"one"}]}]}
            ]}]"#,
        );
        assert_eq!(html, "<ul>\n  <li>\n    <p>one</p>\n  </li>\n</ul>\n");
    }

    #[test]
    fn test_spanning_cell_attributes() {
        let html = render(
            r#"[{"type":"td","id":"c","colspan":2,"align":"center","children":[{"text":"x"}]}]"#,
        );
        assert_eq!(html, "<td colspan=\"2\" class=\"text-center\">x</td>\n");
    }

    #[test]
    fn test_code_block_keeps_lines() {
        let html = render(
            r#"[{"type":"code","id":"c","language":"rust","children":[
                {"type":"code_line","id":"1","children":[{"text":"let a = 1;"}]},
                {"type":"code_line","id":"2","children":[{"text":"a < 2"}]}
            ]}]"#,
        );
        assert_eq!(html, "<pre><code class=\"language-rust\">let a = 1;\na &lt; 2</code></pre>\n");
    }
}
