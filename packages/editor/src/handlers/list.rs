use super::{Key, KeyEvent, KeyHandler};
use crate::lists;
use crate::{EditSession, MutationError};

/// Tab indents, Shift+Tab outdents, Enter splits or terminates list items.
/// Shift+Enter inside a list is left to the default break.
#[derive(Debug)]
pub struct ListHandler;

impl KeyHandler for ListHandler {
    fn name(&self) -> &'static str {
        "list"
    }

    fn on_key_down(&self, session: &mut EditSession, event: &mut KeyEvent) -> Result<(), MutationError> {
        if !lists::is_inside_list(&session.document) {
            return Ok(());
        }
        let handled = match (&event.key, event.shift) {
            (Key::Tab, true) => lists::outdent(session)?,
            (Key::Tab, false) => lists::indent(session)?,
            (Key::Enter, false) => lists::enter(session)?,
            _ => false,
        };
        if handled {
            event.prevent_default();
        }
        Ok(())
    }
}
