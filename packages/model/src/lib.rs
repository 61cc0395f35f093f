//! # Trellis Model
//!
//! The document tree the editor operates on.
//!
//! - [`node`]: elements, text runs, marks and attributes
//! - [`schema`]: per-type nesting rules (void / block / top-level / valid children)
//! - [`path`]: ephemeral tree addresses, caret points and ranges
//! - [`builders`]: constructors for nodes the editor inserts itself
//! - [`visitor`]: read-only and in-place tree walks

pub mod builders;
pub mod id_generator;
pub mod node;
pub mod path;
pub mod schema;
pub mod visitor;

pub use id_generator::IdGenerator;
pub use node::{Attributes, Element, ElementType, Mark, Marks, Node, Text};
pub use path::{Affinity, Path, Point, Range};
pub use schema::{lookup, ChildSet, SchemaEntry};
pub use visitor::{to_simple_text, TextCollector, Visitor, VisitorMut};
