use crate::node::{Element, Node, Text};
use crate::path::Path;

/// Visitor pattern for traversing a document tree immutably
///
/// Default implementations walk the entire tree in document order, handing
/// each node the path it currently sits at. Override specific visit_*
/// methods to act on nodes.
pub trait Visitor: Sized {
    fn visit_children(&mut self, children: &[Node], parent: &Path) {
        walk_children(self, children, parent);
    }

    fn visit_element(&mut self, element: &Element, path: &Path) {
        walk_element(self, element, path);
    }

    fn visit_text(&mut self, _text: &Text, _path: &Path) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor pattern for transforming nodes in place
///
/// Use this only for whole-tree passes that do not change tree shape (ids,
/// attribute cleanup). Shape changes go through mutations so paths and
/// selections stay consistent.
pub trait VisitorMut: Sized {
    fn visit_children_mut(&mut self, children: &mut [Node]) {
        walk_children_mut(self, children);
    }

    fn visit_element_mut(&mut self, element: &mut Element) {
        walk_element_mut(self, element);
    }

    fn visit_text_mut(&mut self, _text: &mut Text) {
        // Leaf node, no children to walk
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, children: &[Node], parent: &Path) {
    for (index, child) in children.iter().enumerate() {
        let path = parent.child(index);
        match child {
            Node::Element(element) => visitor.visit_element(element, &path),
            Node::Text(text) => visitor.visit_text(text, &path),
        }
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &Element, path: &Path) {
    visitor.visit_children(&element.children, path);
}

pub fn walk_children_mut<V: VisitorMut>(visitor: &mut V, children: &mut [Node]) {
    for child in children {
        match child {
            Node::Element(element) => visitor.visit_element_mut(element),
            Node::Text(text) => visitor.visit_text_mut(text),
        }
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut Element) {
    visitor.visit_children_mut(&mut element.children);
}

/// Collects every text run with its path, in document order
#[derive(Default)]
pub struct TextCollector<'a> {
    pub texts: Vec<(Path, &'a Text)>,
}

impl<'a> TextCollector<'a> {
    pub fn collect(children: &'a [Node], parent: &Path) -> Vec<(Path, &'a Text)> {
        let mut collector = TextCollector::default();
        collector.walk(children, parent);
        collector.texts
    }

    // The trait methods cannot carry the `'a` borrow, so this walks by hand.
    fn walk(&mut self, children: &'a [Node], parent: &Path) {
        for (index, child) in children.iter().enumerate() {
            let path = parent.child(index);
            match child {
                Node::Element(element) => self.walk(&element.children, &path),
                Node::Text(text) => self.texts.push((path, text)),
            }
        }
    }
}

/// Flattens a subtree to plain text
pub fn to_simple_text(nodes: &[Node]) -> String {
    struct Flatten(String);

    impl Visitor for Flatten {
        fn visit_text(&mut self, text: &Text, _path: &Path) {
            self.0.push_str(&text.text);
        }
    }

    let mut flatten = Flatten(String::new());
    flatten.visit_children(nodes, &Path::root());
    flatten.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ElementType;

    fn sample() -> Vec<Node> {
        vec![
            Element::new("a", ElementType::Paragraph, vec![Node::text("Hello ")]).into(),
            Element::new(
                "b",
                ElementType::UnorderedList,
                vec![Element::new(
                    "c",
                    ElementType::ListItem,
                    vec![Element::new("d", ElementType::Paragraph, vec![Node::text("World")]).into()],
                )
                .into()],
            )
            .into(),
        ]
    }

    #[test]
    fn test_text_collector_paths() {
        let nodes = sample();
        let texts = TextCollector::collect(&nodes, &Path::root());

        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].0, Path::new(vec![0, 0]));
        assert_eq!(texts[1].0, Path::new(vec![1, 0, 0, 0]));
        assert_eq!(texts[1].1.text, "World");
    }

    #[test]
    fn test_to_simple_text() {
        assert_eq!(to_simple_text(&sample()), "Hello World");
    }

    #[test]
    fn test_visitor_sees_element_paths() {
        struct Ids(Vec<(String, Path)>);
        impl Visitor for Ids {
            fn visit_element(&mut self, element: &Element, path: &Path) {
                self.0.push((element.id.clone(), path.clone()));
                walk_element(self, element, path);
            }
        }

        let mut ids = Ids(Vec::new());
        ids.visit_children(&sample(), &Path::root());
        assert_eq!(ids.0[2], ("c".to_string(), Path::new(vec![1, 0])));
    }
}
