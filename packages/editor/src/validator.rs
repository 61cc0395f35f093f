//! # Schema Validator
//!
//! Read-only counterpart of the normalizer: reports every node that the
//! normalizer would repair, without touching the document.

use crate::normalizer::{diagnose, NormalizerContext, Rule};
use crate::Document;
use serde::{Deserialize, Serialize};
use trellis_model::Path;

/// Severity of a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationLevel {
    /// The tree breaks a schema invariant
    Error,
    /// The tree is valid but not in normalized form
    Warning,
}

impl ViolationLevel {
    fn of(rule: Rule) -> Self {
        match rule {
            Rule::RestrictedElement
            | Rule::TrailingParagraph
            | Rule::InvalidChild
            | Rule::NotTopLevel
            | Rule::TableRowLength => ViolationLevel::Error,
            Rule::BlockSpacing | Rule::EmptyContainer | Rule::LooseInline | Rule::AdjacentText => {
                ViolationLevel::Warning
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub level: ViolationLevel,
    pub rule: Rule,
    pub path: Path,
    pub message: String,

    /// What the normalizer would do about it
    pub suggestion: Option<String>,
}

/// Check every node, root first, in document order
pub fn validate(doc: &Document, context: &NormalizerContext) -> Vec<Violation> {
    doc.paths()
        .into_iter()
        .filter_map(|path| {
            let repair = diagnose(doc, context, &path)?;
            Some(Violation {
                level: ViolationLevel::of(repair.rule),
                rule: repair.rule,
                message: message(doc, repair.rule, &path),
                suggestion: Some(repair.describe()),
                path,
            })
        })
        .collect()
}

/// Only the violations that break schema invariants
pub fn errors(doc: &Document, context: &NormalizerContext) -> Vec<Violation> {
    validate(doc, context)
        .into_iter()
        .filter(|v| v.level == ViolationLevel::Error)
        .collect()
}

fn message(doc: &Document, rule: Rule, path: &Path) -> String {
    let kind = doc
        .node(path)
        .and_then(|n| n.kind())
        .map_or_else(|| "document".to_string(), |k| k.to_string());
    match rule {
        Rule::RestrictedElement => format!("`{}` is not allowed in this context", kind),
        Rule::TrailingParagraph => "document does not end with a paragraph".to_string(),
        Rule::InvalidChild => format!("`{}` is not a valid child of its parent", kind),
        Rule::NotTopLevel => format!("`{}` may not sit at the document root", kind),
        Rule::BlockSpacing => format!("`{}` needs an empty paragraph before the next block", kind),
        Rule::TableRowLength => "table rows have different effective widths".to_string(),
        Rule::EmptyContainer => format!("`{}` has no children", kind),
        Rule::LooseInline => format!("`{}` holds inline content outside a paragraph", kind),
        Rule::AdjacentText => format!("`{}` has adjacent text runs that should merge", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(json: &str) -> Vec<Violation> {
        let doc = Document::from_json("t", json).unwrap();
        validate(&doc, &NormalizerContext::default())
    }

    #[test]
    fn test_normalized_document_is_clean() {
        let violations = check(
            r#"[{"type":"h1","id":"h","children":[{"text":"Title"}]},
                {"type":"p","id":"p","children":[{"text":"body"}]}]"#,
        );
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_missing_trailing_paragraph() {
        let violations = check(r#"[{"type":"h1","id":"h","children":[{"text":"Title"}]}]"#);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, Rule::TrailingParagraph);
        assert!(violations[0].path.is_root());
    }

    #[test]
    fn test_short_table_row() {
        let violations = check(
            r#"[{"type":"table","id":"t","children":[
                {"type":"tr","id":"r0","children":[
                    {"type":"td","id":"a","children":[{"type":"p","id":"pa","children":[{"text":""}]}]}
                ]},
                {"type":"tr","id":"r1","children":[
                    {"type":"td","id":"b","colspan":2,"children":[{"type":"p","id":"pb","children":[{"text":""}]}]}
                ]}
            ]},{"type":"p","id":"end","children":[{"text":""}]}]"#,
        );
        let rules: Vec<_> = violations.iter().map(|v| v.rule).collect();
        assert_eq!(rules, vec![Rule::TableRowLength]);
        assert_eq!(violations[0].level, ViolationLevel::Error);
    }

    #[test]
    fn test_restricted_element_respects_allow_list() {
        let json = r#"[{"type":"p","id":"p","children":[
            {"text":""},{"type":"input_ref","id":"i","children":[{"text":""}]},{"text":""}
        ]}]"#;
        let doc = Document::from_json("t", json).unwrap();

        let strict = errors(&doc, &NormalizerContext::default());
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].rule, Rule::RestrictedElement);

        let allowing = NormalizerContext::allowing([trellis_model::ElementType::InputRef]);
        assert!(errors(&doc, &allowing).is_empty());
    }
}
