//! # Schema Registry
//!
//! Static node-type metadata: which types are void, which are blocks, which
//! may sit directly under the document root, and which child types each
//! element accepts.
//!
//! Lookups never fail. A type the running schema does not know about (see
//! [`ElementType::Unknown`]) falls back to "not void, not block, no valid
//! children".

use crate::node::ElementType;

/// A named set of element types accepted as children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSet {
    Nothing,
    TableRows,
    TableCells,
    CellContent,
    ListContent,
    ListItemContent,
    CodeLines,
    MathLines,
    Paragraphs,
    CalloutContent,
}

impl ChildSet {
    pub fn contains(&self, kind: &ElementType) -> bool {
        use ElementType::*;
        match self {
            ChildSet::Nothing => false,
            ChildSet::TableRows => matches!(kind, TableRow),
            ChildSet::TableCells => matches!(kind, TableHeader | TableData),
            ChildSet::CellContent => matches!(
                kind,
                Paragraph
                    | Heading1
                    | Heading2
                    | Heading3
                    | Heading4
                    | Heading5
                    | Heading6
                    | Image
                    | YouTube
                    | Audio
                    | UnorderedList
                    | OrderedList
                    | Math
                    | Code
                    | Blockquote
                    | FormulaBlock
            ),
            ChildSet::ListContent => matches!(kind, ListItem | UnorderedList | OrderedList),
            ChildSet::ListItemContent => matches!(
                kind,
                Paragraph
                    | Heading1
                    | Heading2
                    | Heading3
                    | Heading4
                    | Heading5
                    | Heading6
                    | Image
                    | YouTube
                    | Audio
                    | UnorderedList
                    | OrderedList
                    | Math
                    | Code
                    | Blockquote
                    | FormulaBlock
            ),
            ChildSet::CodeLines => matches!(kind, CodeLine),
            ChildSet::MathLines => matches!(kind, MathLine),
            ChildSet::Paragraphs => matches!(kind, Paragraph),
            ChildSet::CalloutContent => matches!(
                kind,
                Paragraph
                    | Heading1
                    | Heading2
                    | Heading3
                    | Heading4
                    | Heading5
                    | Heading6
                    | Image
                    | UnorderedList
                    | OrderedList
                    | Math
                    | FormulaBlock
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ChildSet::Nothing)
    }

    /// Materialize the set, in declaration order
    pub fn members(&self) -> Vec<ElementType> {
        ElementType::ALL
            .iter()
            .filter(|kind| self.contains(kind))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaEntry {
    pub is_void: bool,
    pub is_block: bool,
    pub is_top_level: bool,
    pub valid_children: ChildSet,
}

impl SchemaEntry {
    const fn new(is_void: bool, is_block: bool, is_top_level: bool, valid_children: ChildSet) -> Self {
        Self {
            is_void,
            is_block,
            is_top_level,
            valid_children,
        }
    }

    pub fn accepts(&self, child: &ElementType) -> bool {
        self.valid_children.contains(child)
    }
}

const UNKNOWN: SchemaEntry = SchemaEntry::new(false, false, false, ChildSet::Nothing);
const TEXT_BLOCK: SchemaEntry = SchemaEntry::new(false, true, true, ChildSet::Nothing);
const MEDIA: SchemaEntry = SchemaEntry::new(true, true, true, ChildSet::Nothing);
const LIST: SchemaEntry = SchemaEntry::new(false, true, true, ChildSet::ListContent);
const TABLE_CELL: SchemaEntry = SchemaEntry::new(false, true, false, ChildSet::CellContent);
const INLINE: SchemaEntry = SchemaEntry::new(false, false, false, ChildSet::Nothing);
const VOID_INLINE: SchemaEntry = SchemaEntry::new(true, false, false, ChildSet::Nothing);

/// Schema entry for a type
pub fn lookup(kind: &ElementType) -> SchemaEntry {
    use ElementType::*;
    match kind {
        Paragraph => TEXT_BLOCK,
        Heading1 | Heading2 | Heading3 | Heading4 | Heading5 | Heading6 => TEXT_BLOCK,
        UnorderedList | OrderedList => LIST,
        ListItem => SchemaEntry::new(false, true, false, ChildSet::ListItemContent),
        Table => SchemaEntry::new(false, true, true, ChildSet::TableRows),
        TableRow => SchemaEntry::new(false, true, false, ChildSet::TableCells),
        TableHeader | TableData => TABLE_CELL,
        Blockquote => SchemaEntry::new(false, true, true, ChildSet::Paragraphs),
        Code => SchemaEntry::new(false, true, true, ChildSet::CodeLines),
        CodeLine => SchemaEntry::new(false, true, false, ChildSet::Nothing),
        Math => SchemaEntry::new(false, true, true, ChildSet::MathLines),
        MathLine => SchemaEntry::new(false, true, false, ChildSet::Nothing),
        Callout => SchemaEntry::new(false, true, true, ChildSet::CalloutContent),
        Image | YouTube | Audio | Video | Webpage | PageLink | FormulaBlock => MEDIA,
        ImageInline | InputRef | FormulaInline => VOID_INLINE,
        Hyperlink | Popup | CalloutInline => INLINE,
        Unknown(_) => UNKNOWN,
    }
}

/// Schema entry for a wire type name
pub fn lookup_name(name: &str) -> SchemaEntry {
    lookup(&ElementType::from_name(name))
}

pub fn is_block(kind: &ElementType) -> bool {
    lookup(kind).is_block
}

pub fn is_void(kind: &ElementType) -> bool {
    lookup(kind).is_void
}

pub fn is_inline(kind: &ElementType) -> bool {
    !lookup(kind).is_block
}

/// The child a container gets when it ends up empty.
///
/// `None` means the container has no meaningful empty state and is removed
/// instead, or (for text blocks and inlines) holds an empty text run.
pub fn default_child(kind: &ElementType) -> Option<ElementType> {
    use ElementType::*;
    match kind {
        ListItem | TableHeader | TableData | Blockquote | Callout => Some(Paragraph),
        Code => Some(CodeLine),
        Math => Some(MathLine),
        _ => None,
    }
}

/// Containers whose only sensible children are elements, and which are
/// dropped once they have none.
pub fn requires_element_children(kind: &ElementType) -> bool {
    use ElementType::*;
    matches!(kind, UnorderedList | OrderedList | Table | TableRow)
}

/// Block containers that wrap loose text/inline content into a paragraph.
pub fn wraps_inline_content(kind: &ElementType) -> bool {
    default_child(kind) == Some(ElementType::Paragraph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_falls_back() {
        let entry = lookup_name("not-a-real-type");
        assert!(!entry.is_void);
        assert!(!entry.is_block);
        assert!(!entry.is_top_level);
        assert!(entry.valid_children.is_empty());
    }

    #[test]
    fn test_table_structure() {
        assert!(lookup(&ElementType::Table).accepts(&ElementType::TableRow));
        assert!(!lookup(&ElementType::Table).accepts(&ElementType::TableData));
        assert!(lookup(&ElementType::TableRow).accepts(&ElementType::TableHeader));
        assert!(lookup(&ElementType::TableData).accepts(&ElementType::Paragraph));
        assert!(!lookup(&ElementType::TableRow).is_top_level);
    }

    #[test]
    fn test_lists_nest() {
        let list = lookup(&ElementType::UnorderedList);
        assert!(list.accepts(&ElementType::ListItem));
        assert!(list.accepts(&ElementType::OrderedList));
        assert!(!list.accepts(&ElementType::Paragraph));

        let item = lookup(&ElementType::ListItem);
        assert!(item.accepts(&ElementType::Paragraph));
        assert!(item.accepts(&ElementType::UnorderedList));
        assert!(!item.is_top_level);
    }

    #[test]
    fn test_media_is_void_top_level_block() {
        for kind in [ElementType::Image, ElementType::YouTube, ElementType::Webpage] {
            let entry = lookup(&kind);
            assert!(entry.is_void && entry.is_block && entry.is_top_level);
        }
        assert!(is_inline(&ElementType::Hyperlink));
        assert!(is_void(&ElementType::InputRef));
    }

    #[test]
    fn test_members_lists_declared_children() {
        assert_eq!(
            ChildSet::TableCells.members(),
            vec![ElementType::TableHeader, ElementType::TableData]
        );
    }
}
