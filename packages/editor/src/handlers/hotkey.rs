use super::{Key, KeyEvent, KeyHandler};
use crate::{EditSession, MutationError};
use tracing::debug;
use trellis_model::Mark;

/// `Mod+b`, `Mod+i`, `Mod+u` and ``Mod+` `` toggle marks
#[derive(Debug)]
pub struct HotkeyHandler;

fn mark_for(event: &KeyEvent) -> Option<Mark> {
    if !event.mod_key || event.shift {
        return None;
    }
    match event.key {
        Key::Char('b') => Some(Mark::Strong),
        Key::Char('i') => Some(Mark::Em),
        Key::Char('u') => Some(Mark::Underline),
        Key::Char('`') => Some(Mark::Code),
        _ => None,
    }
}

impl KeyHandler for HotkeyHandler {
    fn name(&self) -> &'static str {
        "hotkey"
    }

    fn on_key_down(&self, session: &mut EditSession, event: &mut KeyEvent) -> Result<(), MutationError> {
        let Some(mark) = mark_for(event) else {
            return Ok(());
        };
        event.prevent_default();
        debug!(?mark, "toggle mark");
        session.toggle_mark(mark)
    }
}
