//! # Key Handlers
//!
//! Key presses run through a fixed chain of handlers before the session's
//! default behavior:
//!
//! 1. [`VoidHandler`]: Enter on a void block
//! 2. [`ListHandler`]: Tab / Shift+Tab / Enter inside lists
//! 3. [`QuoteHandler`]: Enter on an empty trailing quote paragraph
//! 4. [`HeadingHandler`]: Enter at the end of a heading
//! 5. [`HotkeyHandler`]: mark shortcuts
//!
//! A handler that takes over a key calls [`KeyEvent::prevent_default`], and
//! the chain stops there. Handler failures are logged and swallowed so a
//! broken edit step never escapes to the host.

mod heading;
mod hotkey;
mod list;
mod quote;
mod void;

pub use heading::HeadingHandler;
pub use hotkey::HotkeyHandler;
pub use list::ListHandler;
pub use quote::QuoteHandler;
pub use void::VoidHandler;

use crate::{EditSession, MutationError};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Enter,
    Tab,
    Backspace,
    Char(char),
}

/// A key press as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub shift: bool,
    /// Ctrl, or Cmd on macOS
    #[serde(default)]
    pub mod_key: bool,
    #[serde(default)]
    pub default_prevented: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            mod_key: false,
            default_prevented: false,
        }
    }

    pub fn enter() -> Self {
        Self::new(Key::Enter)
    }

    pub fn tab() -> Self {
        Self::new(Key::Tab)
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_mod(mut self) -> Self {
        self.mod_key = true;
        self
    }

    pub fn is_enter(&self) -> bool {
        self.key == Key::Enter
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// One link in the key handling chain
pub trait KeyHandler: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Inspect the key press and act on it, calling
    /// [`KeyEvent::prevent_default`] when it was handled
    fn on_key_down(&self, session: &mut EditSession, event: &mut KeyEvent) -> Result<(), MutationError>;
}

/// Ordered handler chain
#[derive(Debug)]
pub struct KeyHandlerChain {
    handlers: Vec<Box<dyn KeyHandler>>,
}

impl Default for KeyHandlerChain {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyHandlerChain {
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(VoidHandler),
                Box::new(ListHandler),
                Box::new(QuoteHandler),
                Box::new(HeadingHandler),
                Box::new(HotkeyHandler),
            ],
        }
    }

    /// Run handlers in order until one prevents the default
    pub fn on_key_down(&self, session: &mut EditSession, event: &mut KeyEvent) {
        for handler in &self.handlers {
            if event.default_prevented {
                break;
            }
            if let Err(e) = handler.on_key_down(session, event) {
                error!(handler = handler.name(), error = %e, "key handler failed");
            }
        }
    }
}

/// Run the default handler chain over `event`
pub fn on_key_down(session: &mut EditSession, event: &mut KeyEvent) {
    KeyHandlerChain::new().on_key_down(session, event);
}

/// Full key processing: the handler chain, then Enter's default break
/// unless a handler took over
pub fn handle_key(session: &mut EditSession, event: &mut KeyEvent) {
    on_key_down(session, event);
    if event.default_prevented || !event.is_enter() {
        return;
    }
    if let Err(e) = session.insert_break() {
        error!(error = %e, "default enter failed");
    }
}
