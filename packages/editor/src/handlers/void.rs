use super::{KeyEvent, KeyHandler};
use crate::{EditSession, MutationError};
use trellis_model::{builders, schema};

/// Enter on a void block adds an empty paragraph after it, since a void
/// node cannot hold the caret itself
#[derive(Debug)]
pub struct VoidHandler;

impl KeyHandler for VoidHandler {
    fn name(&self) -> &'static str {
        "void"
    }

    fn on_key_down(&self, session: &mut EditSession, event: &mut KeyEvent) -> Result<(), MutationError> {
        if !event.is_enter() {
            return Ok(());
        }
        let Some(anchor) = session.selection().map(|r| r.anchor.path.clone()) else {
            return Ok(());
        };
        let Some((block, element)) = session.document.nearest_block(&anchor) else {
            return Ok(());
        };
        if !schema::is_void(&element.kind) {
            return Ok(());
        }

        event.prevent_default();
        let para = builders::p(session.document.ids_mut(), "");
        let at = block.next();
        session.without_normalizing(|s| {
            s.insert_node(&at, para)?;
            s.select_start(&at)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use trellis_model::{ElementType, Path, Point, Range};

    #[test]
    fn test_enter_on_image_adds_paragraph_after() {
        let doc = Document::from_json(
            "t",
            r#"[{"type":"img","id":"i","src":"a.png","children":[{"text":""}]},
                {"type":"p","id":"t","children":[{"text":"after"}]}]"#,
        )
        .unwrap();
        let mut s = EditSession::new("t", doc);
        s.select(Range::collapsed(Point::new(vec![0, 0], 0))).unwrap();

        let mut event = KeyEvent::enter();
        VoidHandler.on_key_down(&mut s, &mut event).unwrap();

        assert!(event.default_prevented);
        let inserted = s.document.element(&Path::new(vec![1])).unwrap();
        assert_eq!(inserted.kind, ElementType::Paragraph);
        assert_eq!(inserted.text_content(), "");
        assert_eq!(s.selection().unwrap().anchor.path, Path::new(vec![1, 0]));
    }
}
