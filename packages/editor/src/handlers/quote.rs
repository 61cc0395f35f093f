use super::{KeyEvent, KeyHandler};
use crate::{EditSession, MutationError};
use tracing::debug;
use trellis_model::{builders, ElementType};

/// Enter on an empty last paragraph of a blockquote leaves the quote.
///
/// The empty paragraph is dropped from the quote and a fresh one follows
/// it; a quote that held nothing else goes away entirely.
#[derive(Debug)]
pub struct QuoteHandler;

impl KeyHandler for QuoteHandler {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn on_key_down(&self, session: &mut EditSession, event: &mut KeyEvent) -> Result<(), MutationError> {
        if !event.is_enter() || event.shift {
            return Ok(());
        }
        let Some(selection) = session.selection().filter(|r| r.is_collapsed()) else {
            return Ok(());
        };
        let anchor = selection.anchor.clone();
        let doc = &session.document;

        let Some((para, element)) = doc.nearest_block(&anchor.path) else {
            return Ok(());
        };
        if element.kind != ElementType::Paragraph || !element.text_content().is_empty() {
            return Ok(());
        }
        let Some(quote) = para.parent().filter(|q| !q.is_root()) else {
            return Ok(());
        };
        let Some(siblings) = doc
            .element(&quote)
            .filter(|q| q.kind == ElementType::Blockquote)
            .map(|q| q.children.len())
        else {
            return Ok(());
        };
        if para.last() != Some(siblings - 1) || doc.end(&para).as_ref() != Some(&anchor) {
            return Ok(());
        }

        event.prevent_default();
        debug!(quote = %quote, "leave blockquote");
        let fresh = builders::p(session.document.ids_mut(), "");

        session.without_normalizing(|s| {
            let at = if siblings == 1 {
                s.remove_node(&quote)?;
                quote.clone()
            } else {
                s.remove_node(&para)?;
                quote.next()
            };
            s.insert_node(&at, fresh)?;
            s.select_start(&at)
        })
    }
}
