//! Property-based tests for tree integrity
//!
//! Random edits drive the session; after every step the document must
//! satisfy the schema invariants:
//! - every block is accepted by its parent, or sits at the root as top-level
//! - the root ends with a paragraph
//! - every table row has the same effective width

use proptest::prelude::*;
use serde_json::{json, Value};
use trellis_editor::handlers::{handle_key, Key, KeyEvent};
use trellis_editor::model::{Element, ElementType, Path, Point, Range};
use trellis_editor::table::{self, effective_columns, TableCommand};
use trellis_editor::{validator, Document, EditSession, NormalizerContext};

fn para(text: &str) -> Value {
    json!({"type": "p", "children": [{"text": text}]})
}

fn item(text: &str) -> Value {
    json!({"type": "li", "children": [para(text)]})
}

fn grid_table(rows: usize, cols: usize) -> Value {
    let rows: Vec<Value> = (0..rows)
        .map(|r| {
            let cells: Vec<Value> = (0..cols)
                .map(|c| json!({"type": "td", "children": [para(&format!("{}{}", r, c))]}))
                .collect();
            json!({"type": "tr", "children": cells})
        })
        .collect();
    json!({"type": "table", "children": rows})
}

fn mixed_document() -> EditSession {
    let nodes = json!([
        {"type": "h1", "children": [{"text": "Heading"}]},
        para("intro text"),
        {"type": "ul", "children": [
            item("first"),
            item("second"),
            {"type": "ul", "children": [item("nested")]},
            item(""),
        ]},
        {"type": "blockquote", "children": [para("quoted"), para("")]},
        grid_table(2, 2),
        para("")
    ]);
    let doc = Document::from_json("props", &nodes.to_string()).unwrap();
    EditSession::new("props", doc)
}

fn schema_errors(s: &EditSession) -> Vec<validator::Violation> {
    validator::errors(&s.document, &NormalizerContext::default())
}

fn all_tables(s: &EditSession) -> Vec<&Element> {
    s.document
        .paths()
        .iter()
        .filter_map(|p| s.document.element(p))
        .filter(|e| e.kind == ElementType::Table)
        .collect()
}

fn is_rectangular(table: &Element) -> bool {
    let widths = effective_columns(table);
    widths.windows(2).all(|w| w[0] == w[1])
}

fn cell_paths(s: &EditSession) -> Vec<Path> {
    s.document
        .paths()
        .into_iter()
        .filter(|p| s.document.element(p).map_or(false, |e| e.kind.is_table_cell()))
        .collect()
}

#[derive(Debug, Clone)]
enum KeyPress {
    Enter,
    ShiftEnter,
    Tab,
    ShiftTab,
    Bold,
}

impl KeyPress {
    fn event(&self) -> KeyEvent {
        match self {
            KeyPress::Enter => KeyEvent::enter(),
            KeyPress::ShiftEnter => KeyEvent::enter().with_shift(),
            KeyPress::Tab => KeyEvent::tab(),
            KeyPress::ShiftTab => KeyEvent::tab().with_shift(),
            KeyPress::Bold => KeyEvent::new(Key::Char('b')).with_mod(),
        }
    }
}

fn key_strategy() -> impl Strategy<Value = KeyPress> {
    prop_oneof![
        3 => Just(KeyPress::Enter),
        1 => Just(KeyPress::ShiftEnter),
        2 => Just(KeyPress::Tab),
        2 => Just(KeyPress::ShiftTab),
        1 => Just(KeyPress::Bold),
    ]
}

fn command_strategy() -> impl Strategy<Value = TableCommand> {
    prop_oneof![
        Just(TableCommand::ExpandRight),
        Just(TableCommand::ExpandDown),
        Just(TableCommand::Split),
        Just(TableCommand::InsertRowBefore),
        Just(TableCommand::InsertRowAfter),
        Just(TableCommand::InsertColumnBefore),
        Just(TableCommand::InsertColumnAfter),
        Just(TableCommand::DeleteRow),
        Just(TableCommand::DeleteColumn),
        Just(TableCommand::ToggleHeader),
    ]
}

/// Put the caret somewhere inside the document, picked by two seeds
fn place_caret(s: &mut EditSession, text_seed: usize, offset_seed: usize) {
    let texts: Vec<(Path, usize)> = s
        .document
        .texts()
        .into_iter()
        .map(|(path, text)| (path, text.len()))
        .collect();
    if texts.is_empty() {
        return;
    }
    let (path, len) = texts[text_seed % texts.len()].clone();
    let offset = offset_seed % (len + 1);
    s.select(Range::collapsed(Point::new(path, offset))).unwrap();
}

proptest! {
    #[test]
    fn test_key_presses_keep_schema_closure(
        steps in prop::collection::vec((key_strategy(), any::<usize>(), any::<usize>()), 1..12)
    ) {
        let mut s = mixed_document();
        s.normalize_all();
        prop_assert!(schema_errors(&s).is_empty(), "{:?}", schema_errors(&s));

        for (key, text_seed, offset_seed) in steps {
            place_caret(&mut s, text_seed, offset_seed);
            let mut event = key.event();
            handle_key(&mut s, &mut event);

            let errors = schema_errors(&s);
            prop_assert!(errors.is_empty(), "after {:?}: {:?}", key, errors);
            let last = s.document.children().last().and_then(|n| n.kind().cloned());
            prop_assert_eq!(last, Some(ElementType::Paragraph));
        }
    }

    #[test]
    fn test_table_commands_keep_rectangular_grid(
        steps in prop::collection::vec((command_strategy(), any::<usize>()), 1..10),
        rows in 1usize..4,
        cols in 1usize..4,
    ) {
        let nodes = json!([grid_table(rows, cols), para("")]);
        let mut s = EditSession::new("grid", Document::from_json("grid", &nodes.to_string()).unwrap());

        for (command, seed) in steps {
            let cells = cell_paths(&s);
            if cells.is_empty() {
                break;
            }
            let cell = &cells[seed % cells.len()];
            if !command.can_apply(&s.document, cell) {
                continue;
            }
            command.apply(&mut s, cell).unwrap();

            for table in all_tables(&s) {
                prop_assert!(is_rectangular(table), "after {:?}: {:?}", command, effective_columns(table));
            }
            let errors = schema_errors(&s);
            prop_assert!(errors.is_empty(), "after {:?}: {:?}", command, errors);
        }
    }

    #[test]
    fn test_merge_then_split_restores_cell_count(
        rows in 2usize..5,
        cols in 2usize..5,
        seed in any::<usize>(),
        down in any::<bool>(),
    ) {
        let nodes = json!([grid_table(rows, cols), para("")]);
        let mut s = EditSession::new("grid", Document::from_json("grid", &nodes.to_string()).unwrap());
        let before = cell_paths(&s).len();
        let cells = cell_paths(&s);
        let cell = cells[seed % cells.len()].clone();

        let merged = if down && table::can_expand_down(&s.document, &cell) {
            table::expand_cell_down(&mut s, &cell).unwrap();
            true
        } else if !down && table::can_expand_right(&s.document, &cell) {
            table::expand_cell_right(&mut s, &cell).unwrap();
            true
        } else {
            false
        };

        if merged {
            prop_assert_eq!(cell_paths(&s).len(), before - 1);
            let text = s.document.node(&cell).unwrap().text_content();
            table::split_cell(&mut s, &cell).unwrap();
            prop_assert_eq!(cell_paths(&s).len(), before);
            // The merged content stays in the split cell
            prop_assert_eq!(s.document.node(&cell).unwrap().text_content(), text);
            prop_assert!(is_rectangular(all_tables(&s)[0]));
        }
    }

    #[test]
    fn test_enter_on_empty_last_item_leaves_list(
        texts in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        let mut items: Vec<Value> = texts.iter().map(|t| item(t)).collect();
        items.push(item(""));
        let nodes = json!([{"type": "ol", "children": items}, para("tail")]);
        let mut s = EditSession::new("list", Document::from_json("list", &nodes.to_string()).unwrap());

        let last = Path::new(vec![0, texts.len(), 0, 0]);
        s.select(Range::collapsed(Point::new(last, 0))).unwrap();
        let mut event = KeyEvent::enter();
        handle_key(&mut s, &mut event);

        prop_assert!(event.default_prevented);
        let list = s.document.element(&Path::new(vec![0])).unwrap();
        prop_assert_eq!(list.children.len(), texts.len());
        prop_assert_eq!(s.document.children().len(), 3);
        prop_assert!(s.document.children()[1].is_kind(&ElementType::Paragraph));
        prop_assert_eq!(s.document.children()[1].text_content(), "");
        prop_assert_eq!(s.document.children()[2].text_content(), "tail");
    }
}
