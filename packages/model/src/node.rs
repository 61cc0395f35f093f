use serde::{Deserialize, Serialize};
use std::fmt;

/// Every element type the editor knows about.
///
/// Content may reference types this build predates; those deserialize into
/// `Unknown` and keep their original name so they round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    UnorderedList,
    OrderedList,
    ListItem,
    Table,
    TableRow,
    TableHeader,
    TableData,
    Blockquote,
    Code,
    CodeLine,
    Math,
    MathLine,
    Callout,
    Image,
    ImageInline,
    YouTube,
    Audio,
    Video,
    Webpage,
    PageLink,
    FormulaBlock,
    FormulaInline,
    Hyperlink,
    InputRef,
    Popup,
    CalloutInline,
    Unknown(String),
}

impl ElementType {
    pub const ALL: [ElementType; 33] = [
        ElementType::Paragraph,
        ElementType::Heading1,
        ElementType::Heading2,
        ElementType::Heading3,
        ElementType::Heading4,
        ElementType::Heading5,
        ElementType::Heading6,
        ElementType::UnorderedList,
        ElementType::OrderedList,
        ElementType::ListItem,
        ElementType::Table,
        ElementType::TableRow,
        ElementType::TableHeader,
        ElementType::TableData,
        ElementType::Blockquote,
        ElementType::Code,
        ElementType::CodeLine,
        ElementType::Math,
        ElementType::MathLine,
        ElementType::Callout,
        ElementType::Image,
        ElementType::ImageInline,
        ElementType::YouTube,
        ElementType::Audio,
        ElementType::Video,
        ElementType::Webpage,
        ElementType::PageLink,
        ElementType::FormulaBlock,
        ElementType::FormulaInline,
        ElementType::Hyperlink,
        ElementType::InputRef,
        ElementType::Popup,
        ElementType::CalloutInline,
    ];

    /// The wire name of this type (`"p"`, `"td"`, ...)
    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Paragraph => "p",
            ElementType::Heading1 => "h1",
            ElementType::Heading2 => "h2",
            ElementType::Heading3 => "h3",
            ElementType::Heading4 => "h4",
            ElementType::Heading5 => "h5",
            ElementType::Heading6 => "h6",
            ElementType::UnorderedList => "ul",
            ElementType::OrderedList => "ol",
            ElementType::ListItem => "li",
            ElementType::Table => "table",
            ElementType::TableRow => "tr",
            ElementType::TableHeader => "th",
            ElementType::TableData => "td",
            ElementType::Blockquote => "blockquote",
            ElementType::Code => "code",
            ElementType::CodeLine => "code_line",
            ElementType::Math => "math",
            ElementType::MathLine => "math_line",
            ElementType::Callout => "callout",
            ElementType::Image => "img",
            ElementType::ImageInline => "img_inline",
            ElementType::YouTube => "youtube",
            ElementType::Audio => "audio",
            ElementType::Video => "video",
            ElementType::Webpage => "iframe",
            ElementType::PageLink => "page_link",
            ElementType::FormulaBlock => "formula",
            ElementType::FormulaInline => "formula_inline",
            ElementType::Hyperlink => "a",
            ElementType::InputRef => "input_ref",
            ElementType::Popup => "popup",
            ElementType::CalloutInline => "callout_inline",
            ElementType::Unknown(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        ElementType::ALL
            .iter()
            .find(|t| t.as_str() == name)
            .cloned()
            .unwrap_or_else(|| ElementType::Unknown(name.to_string()))
    }

    pub fn is_heading(&self) -> bool {
        matches!(
            self,
            ElementType::Heading1
                | ElementType::Heading2
                | ElementType::Heading3
                | ElementType::Heading4
                | ElementType::Heading5
                | ElementType::Heading6
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ElementType::UnorderedList | ElementType::OrderedList)
    }

    pub fn is_table_cell(&self) -> bool {
        matches!(self, ElementType::TableHeader | ElementType::TableData)
    }
}

impl From<String> for ElementType {
    fn from(name: String) -> Self {
        ElementType::from_name(&name)
    }
}

impl From<ElementType> for String {
    fn from(kind: ElementType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline formatting flags carried by a text run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub strong: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub em: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub sub: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub sup: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub mark: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Strong,
    Em,
    Underline,
    Strikethrough,
    Code,
    Sub,
    Sup,
    Mark,
}

impl Marks {
    pub fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Strong => self.strong,
            Mark::Em => self.em,
            Mark::Underline => self.underline,
            Mark::Strikethrough => self.strikethrough,
            Mark::Code => self.code,
            Mark::Sub => self.sub,
            Mark::Sup => self.sup,
            Mark::Mark => self.mark,
        }
    }

    pub fn set(&mut self, mark: Mark, value: bool) {
        let slot = match mark {
            Mark::Strong => &mut self.strong,
            Mark::Em => &mut self.em,
            Mark::Underline => &mut self.underline,
            Mark::Strikethrough => &mut self.strikethrough,
            Mark::Code => &mut self.code,
            Mark::Sub => &mut self.sub,
            Mark::Sup => &mut self.sup,
            Mark::Mark => &mut self.mark,
        };
        *slot = value;
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Marks::default()
    }
}

/// Optional element attributes, flattened next to `type`/`id` on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colspan: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowspan: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    /// List marker style (`disc`, `decimal`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowstyle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A run of text with its marks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A non-text node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub kind: ElementType,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl Element {
    pub fn new(id: impl Into<String>, kind: ElementType, children: Vec<Node>) -> Self {
        Self {
            kind,
            id: id.into(),
            children,
            attrs: Attributes::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Column span, defaulting to 1 and never below it
    pub fn colspan(&self) -> usize {
        self.attrs.colspan.unwrap_or(1).max(1) as usize
    }

    /// Row span, defaulting to 1 and never below it
    pub fn rowspan(&self) -> usize {
        self.attrs.rowspan.unwrap_or(1).max(1) as usize
    }

    /// Concatenated text of every descendant run
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// A tree node: an element with children, or a leaf text run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Type of this node, `None` for text runs
    pub fn kind(&self) -> Option<&ElementType> {
        self.as_element().map(|e| &e.kind)
    }

    pub fn is_kind(&self, kind: &ElementType) -> bool {
        self.kind() == Some(kind)
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.text.clone(),
            Node::Element(element) => element.text_content(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_names_round_trip() {
        for kind in ElementType::ALL.iter() {
            assert_eq!(&ElementType::from_name(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_unknown_type_keeps_its_name() {
        let json = r#"{"type":"hologram","id":"x","children":[{"text":""}]}"#;
        let node: Node = serde_json::from_str(json).unwrap();

        assert_eq!(
            node.kind(),
            Some(&ElementType::Unknown("hologram".to_string()))
        );
        let back = serde_json::to_string(&node).unwrap();
        assert!(back.contains(r#""type":"hologram""#));
    }

    #[test]
    fn test_text_marks_serialize_flat() {
        let text = Text::marked("bold", Marks::default().with(Mark::Strong));
        let json = serde_json::to_string(&Node::Text(text)).unwrap();
        assert_eq!(json, r#"{"text":"bold","strong":true}"#);
    }

    #[test]
    fn test_cell_spans_default_and_clamp() {
        let mut cell = Element::new("c", ElementType::TableData, vec![]);
        assert_eq!(cell.colspan(), 1);
        assert_eq!(cell.rowspan(), 1);

        cell.attrs.colspan = Some(0);
        cell.attrs.rowspan = Some(3);
        assert_eq!(cell.colspan(), 1);
        assert_eq!(cell.rowspan(), 3);
    }

    #[test]
    fn test_deserialize_table_cell_attributes() {
        let json = r#"{"type":"td","id":"c1","colspan":2,"align":"center","children":[{"text":"hi"}]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let cell = node.as_element().unwrap();

        assert_eq!(cell.kind, ElementType::TableData);
        assert_eq!(cell.colspan(), 2);
        assert_eq!(cell.attrs.align.as_deref(), Some("center"));
        assert_eq!(cell.text_content(), "hi");
    }
}
