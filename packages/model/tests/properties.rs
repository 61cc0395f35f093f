//! Property-based tests for addressing and the schema registry

use proptest::prelude::*;
use trellis_model::{schema, ElementType, Path, Point, Range};

fn path_strategy() -> impl Strategy<Value = Path> {
    prop::collection::vec(0usize..6, 0..5).prop_map(Path::new)
}

fn point_strategy() -> impl Strategy<Value = Point> {
    (path_strategy(), 0usize..20).prop_map(|(path, offset)| Point::new(path, offset))
}

fn kind_strategy() -> impl Strategy<Value = ElementType> {
    (0..ElementType::ALL.len()).prop_map(|i| ElementType::ALL[i].clone())
}

proptest! {
    #[test]
    fn test_ancestors_sort_before_descendants(a in path_strategy(), b in path_strategy()) {
        if a.is_ancestor_of(&b) {
            prop_assert!(a < b);
            prop_assert!(!b.is_ancestor_of(&a));
        }
        for ancestor in b.ancestors() {
            prop_assert!(ancestor.is_ancestor_of(&b));
        }
    }

    #[test]
    fn test_ends_before_implies_document_order(a in path_strategy(), b in path_strategy()) {
        if a.ends_before(&b) {
            prop_assert!(a < b);
            prop_assert!(!a.contains(&b));
        }
    }

    #[test]
    fn test_common_prefix_contains_both(a in path_strategy(), b in path_strategy()) {
        let common = a.common(&b);
        prop_assert!(common.contains(&a));
        prop_assert!(common.contains(&b));
    }

    #[test]
    fn test_previous_undoes_next(path in path_strategy()) {
        if !path.is_root() {
            prop_assert_eq!(path.next().previous(), Some(path.clone()));
            prop_assert_eq!(path.next().parent(), path.parent());
        }
    }

    #[test]
    fn test_range_start_never_after_end(anchor in point_strategy(), focus in point_strategy()) {
        let range = Range::new(anchor, focus);
        prop_assert!(range.start() <= range.end());
        prop_assert_eq!(range.is_collapsed(), range.start() == range.end());
    }

    #[test]
    fn test_default_child_is_accepted(kind in kind_strategy()) {
        if let Some(child) = schema::default_child(&kind) {
            prop_assert!(schema::lookup(&kind).accepts(&child), "{} rejects {}", kind, child);
        }
    }

    #[test]
    fn test_type_names_are_stable(kind in kind_strategy()) {
        prop_assert_eq!(ElementType::from_name(kind.as_str()), kind.clone());
        prop_assert!(!matches!(kind, ElementType::Unknown(_)));
    }

    #[test]
    fn test_unknown_names_accept_nothing(name in "[a-z]{12,16}") {
        let kind = ElementType::from_name(&name);
        prop_assert_eq!(&kind, &ElementType::Unknown(name.clone()));
        prop_assert!(!schema::is_block(&kind));
        prop_assert!(!schema::is_void(&kind));
        for other in ElementType::ALL.iter() {
            prop_assert!(!schema::lookup(&kind).accepts(other));
        }
    }
}
