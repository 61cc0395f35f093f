//! # Trellis Editor
//!
//! Document-tree integrity engine for a rich-text authoring surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ key handlers: void → list → quote →         │
//! │               heading → hotkey              │
//! │ table commands: merge / split / rows / cols │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EditSession: composite transforms           │
//! │  - wrap / unwrap / lift / split / break     │
//! │  - deferred normalization batches           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Document: primitive mutations               │
//! │  - path / selection transformation          │
//! │  - normalization queue                      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ normalizer: one repair per node, to fixpoint│
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the only state**: lists, tables and selections are
//!    re-derived from it on every operation
//! 2. **Paths are ephemeral**: never keep one across a mutation
//! 3. **Every edit ends normalized**: `mutation → normalize → next mutation`
//! 4. **Failures stay local**: normalizer and handler errors are logged and
//!    the step is abandoned
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trellis_editor::{handlers, Document, EditSession};
//!
//! let doc = Document::load("lesson.json".into())?;
//! let mut session = EditSession::new("session-1", doc);
//! session.normalize_all();
//!
//! let mut event = handlers::KeyEvent::enter();
//! handlers::handle_key(&mut session, &mut event);
//!
//! session.document.save()?;
//! ```

mod document;
mod errors;
pub mod handlers;
pub mod html;
pub mod lists;
pub mod mutations;
pub mod normalizer;
mod session;
pub mod table;
mod transforms;
pub mod validator;

pub use document::Document;
pub use errors::EditorError;
pub use mutations::{Mutation, MutationError, NodeUpdate};
pub use normalizer::NormalizerContext;
pub use session::EditSession;
pub use validator::{validate, Violation, ViolationLevel};

// Re-export the model for convenience
pub use trellis_model as model;
