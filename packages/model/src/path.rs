//! # Tree addressing
//!
//! A [`Path`] is the walk of child indexes from the document root to a node.
//! Paths shift whenever a sibling before them (or an ancestor) is inserted,
//! removed, split or merged, so they are ephemeral views: re-derive them at
//! the start of each operation and never keep one across mutations.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<usize>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(indexes: impl Into<Vec<usize>>) -> Self {
        Path(indexes.into())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Index of this node within its parent
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indexes = self.0.clone();
        indexes.push(index);
        Path(indexes)
    }

    /// Path of the following sibling (which may not exist)
    pub fn next(&self) -> Path {
        let mut indexes = self.0.clone();
        if let Some(last) = indexes.last_mut() {
            *last += 1;
        }
        Path(indexes)
    }

    pub fn previous(&self) -> Option<Path> {
        match self.0.last() {
            Some(&last) if last > 0 => {
                let mut indexes = self.0.clone();
                *indexes.last_mut()? = last - 1;
                Some(Path(indexes))
            }
            _ => None,
        }
    }

    /// Same path with the index at `depth` replaced
    pub fn with_index(&self, depth: usize, index: usize) -> Path {
        let mut indexes = self.0.clone();
        if depth < indexes.len() {
            indexes[depth] = index;
        }
        Path(indexes)
    }

    pub fn concat(&self, rest: &[usize]) -> Path {
        let mut indexes = self.0.clone();
        indexes.extend_from_slice(rest);
        Path(indexes)
    }

    /// Every ancestor from the root down, excluding the path itself
    pub fn ancestors(&self) -> Vec<Path> {
        (0..self.0.len()).map(|i| Path(self.0[..i].to_vec())).collect()
    }

    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// True when `self` is a strict ancestor of `other` or equal to it
    pub fn contains(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// True when `self` ends before `other` at `self`'s own depth: the two
    /// share `self`'s parent prefix and `self`'s last index is smaller.
    pub fn ends_before(&self, other: &Path) -> bool {
        let Some(i) = self.0.len().checked_sub(1) else {
            return false;
        };
        if other.0.len() <= i {
            return false;
        }
        self.0[..i] == other.0[..i] && self.0[i] < other.0[i]
    }

    pub fn is_sibling(&self, other: &Path) -> bool {
        self.0.len() == other.0.len()
            && !self.0.is_empty()
            && self.0[..self.0.len() - 1] == other.0[..other.0.len() - 1]
            && self != other
    }

    /// Longest shared prefix
    pub fn common(&self, other: &Path) -> Path {
        Path(
            self.0
                .iter()
                .zip(other.0.iter())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| *a)
                .collect(),
        )
    }
}

impl From<Vec<usize>> for Path {
    fn from(indexes: Vec<usize>) -> Self {
        Path(indexes)
    }
}

impl From<&[usize]> for Path {
    fn from(indexes: &[usize]) -> Self {
        Path(indexes.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", index)?;
        }
        write!(f, "]")
    }
}

/// Which way a point leans when an edit lands exactly on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Forward,
    Backward,
}

/// A caret position: a text run's path plus a byte offset into its text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

/// An anchor/focus pair; collapsed when both are equal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_backward(&self) -> bool {
        self.focus < self.anchor
    }

    /// The earlier of the two points
    pub fn start(&self) -> &Point {
        if self.is_backward() {
            &self.focus
        } else {
            &self.anchor
        }
    }

    /// The later of the two points
    pub fn end(&self) -> &Point {
        if self.is_backward() {
            &self.anchor
        } else {
            &self.focus
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_next_previous() {
        let path = Path::new(vec![1, 2, 3]);
        assert_eq!(path.parent(), Some(Path::new(vec![1, 2])));
        assert_eq!(path.next(), Path::new(vec![1, 2, 4]));
        assert_eq!(path.previous(), Some(Path::new(vec![1, 2, 2])));
        assert_eq!(Path::new(vec![0]).previous(), None);
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_ancestry() {
        let a = Path::new(vec![1]);
        let b = Path::new(vec![1, 0, 2]);
        assert!(a.is_ancestor_of(&b));
        assert!(!b.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(a.contains(&a));
        assert_eq!(
            b.ancestors(),
            vec![Path::root(), Path::new(vec![1]), Path::new(vec![1, 0])]
        );
    }

    #[test]
    fn test_ends_before() {
        assert!(Path::new(vec![0]).ends_before(&Path::new(vec![1, 4])));
        assert!(Path::new(vec![2, 0]).ends_before(&Path::new(vec![2, 1])));
        assert!(!Path::new(vec![2, 1]).ends_before(&Path::new(vec![2, 1, 0])));
        assert!(!Path::new(vec![3]).ends_before(&Path::new(vec![1])));
    }

    #[test]
    fn test_siblings_and_common() {
        assert!(Path::new(vec![0, 1]).is_sibling(&Path::new(vec![0, 3])));
        assert!(!Path::new(vec![0, 1]).is_sibling(&Path::new(vec![1, 1])));
        assert_eq!(
            Path::new(vec![0, 1, 2]).common(&Path::new(vec![0, 1, 5, 0])),
            Path::new(vec![0, 1])
        );
    }

    #[test]
    fn test_range_orders_points() {
        let a = Point::new(vec![0, 0], 3);
        let b = Point::new(vec![1, 0], 0);
        let range = Range::new(b.clone(), a.clone());
        assert!(range.is_backward());
        assert_eq!(range.start(), &a);
        assert_eq!(range.end(), &b);
        assert!(Range::collapsed(a).is_collapsed());
    }
}
