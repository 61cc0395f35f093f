use super::{KeyEvent, KeyHandler};
use crate::{EditSession, MutationError};
use tracing::debug;
use trellis_model::{builders, ElementType};

/// Enter at the end of a heading continues in a plain paragraph instead of
/// a second heading. An empty paragraph already following the heading is
/// reused.
#[derive(Debug)]
pub struct HeadingHandler;

impl KeyHandler for HeadingHandler {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn on_key_down(&self, session: &mut EditSession, event: &mut KeyEvent) -> Result<(), MutationError> {
        if !event.is_enter() || event.shift {
            return Ok(());
        }
        let Some(anchor) = session
            .selection()
            .filter(|r| r.is_collapsed())
            .map(|r| r.anchor.clone())
        else {
            return Ok(());
        };
        let doc = &session.document;
        let Some((heading, _)) = doc.nearest_block(&anchor.path).filter(|(_, e)| e.kind.is_heading()) else {
            return Ok(());
        };
        if doc.end(&heading).as_ref() != Some(&anchor) {
            return Ok(());
        }

        let next = heading.next();
        let reusable = doc
            .element(&next)
            .map_or(false, |e| e.kind == ElementType::Paragraph && e.text_content().is_empty());

        event.prevent_default();
        if reusable {
            debug!(heading = %heading, "select paragraph after heading");
            return session.select_start(&next);
        }

        debug!(heading = %heading, "insert paragraph after heading");
        let para = builders::p(session.document.ids_mut(), "");
        session.without_normalizing(|s| {
            s.insert_node(&next, para)?;
            s.select_start(&next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use trellis_model::{Path, Point, Range};

    #[test]
    fn test_enter_mid_heading_falls_through() {
        let doc = Document::from_json("t", r#"[{"type":"h2","id":"h","children":[{"text":"Title"}]}]"#).unwrap();
        let mut s = EditSession::new("t", doc);
        s.select(Range::collapsed(Point::new(vec![0, 0], 2))).unwrap();

        let mut event = KeyEvent::enter();
        HeadingHandler.on_key_down(&mut s, &mut event).unwrap();
        assert!(!event.default_prevented);
    }

    #[test]
    fn test_reuses_following_empty_paragraph() {
        let doc = Document::from_json(
            "t",
            r#"[{"type":"h1","id":"h","children":[{"text":"Title"}]},
                {"type":"p","id":"p","children":[{"text":""}]}]"#,
        )
        .unwrap();
        let mut s = EditSession::new("t", doc);
        s.select(Range::collapsed(Point::new(vec![0, 0], 5))).unwrap();

        let mut event = KeyEvent::enter();
        HeadingHandler.on_key_down(&mut s, &mut event).unwrap();

        assert!(event.default_prevented);
        assert_eq!(s.document.children().len(), 2);
        assert_eq!(s.selection().unwrap().anchor.path, Path::new(vec![1, 0]));
    }
}
