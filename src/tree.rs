//! Nested string-keyed message tree.
//! Backs the translator cache: check, read and insert leaves by key
//! path, merge imported leaves, and convert to/from the JSON shape the
//! persistence boundary exchanges.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// A node in the tree: a message leaf or a nested branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Branch(BTreeMap<String, Node>),
}

/// Root of a message tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    root: BTreeMap<String, Node>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn clear(&mut self) {
        self.root.clear();
    }

    /// True only if the full path resolves to a present node.
    /// An empty path never exists.
    pub fn exists(&self, path: &[&str]) -> bool {
        self.node(path).is_some()
    }

    /// Leaf message at `path`. None if the path is empty, any segment is
    /// missing, or the node there is a branch.
    pub fn get(&self, path: &[&str]) -> Option<&str> {
        match self.node(path) {
            Some(Node::Leaf(message)) => Some(message),
            _ => None,
        }
    }

    fn node(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(*first)?;
        for key in rest {
            match current {
                Node::Branch(children) => current = children.get(*key)?,
                Node::Leaf(_) => return None,
            }
        }
        Some(current)
    }

    /// Set the leaf at `path`, creating intermediate branches as needed.
    /// A leaf sitting in the middle of the path is replaced by a branch.
    /// An empty path stores nothing and returns false.
    pub fn insert(&mut self, path: &[&str], message: impl Into<String>) -> bool {
        let Some((last, intermediate)) = path.split_last() else {
            return false;
        };
        let mut current = &mut self.root;
        for key in intermediate {
            let entry = current
                .entry((*key).to_string())
                .or_insert_with(|| Node::Branch(BTreeMap::new()));
            if let Node::Leaf(_) = entry {
                *entry = Node::Branch(BTreeMap::new());
            }
            let Node::Branch(children) = entry else {
                return false;
            };
            current = children;
        }
        current.insert((*last).to_string(), Node::Leaf(message.into()));
        true
    }

    /// Merge every string leaf of `incoming` into the tree, overwriting
    /// leaves at the same path and leaving unrelated entries intact.
    /// Values that are neither objects nor strings are skipped.
    pub fn merge_value(&mut self, incoming: &Value) {
        let mut path = Vec::new();
        self.merge_walk(&mut path, incoming);
    }

    fn merge_walk(&mut self, path: &mut Vec<String>, value: &Value) {
        match value {
            Value::Object(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    self.merge_walk(path, child);
                    path.pop();
                }
            }
            Value::String(message) if !path.is_empty() => {
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                self.insert(&segments, message.clone());
            }
            _ => {}
        }
    }

    /// Tree built from the JSON shape produced by [`Tree::to_value`].
    pub fn from_value(incoming: &Value) -> Self {
        let mut tree = Self::new();
        tree.merge_value(incoming);
        tree
    }

    /// JSON export shape: branches become objects, leaves strings.
    pub fn to_value(&self) -> Value {
        fn branch(children: &BTreeMap<String, Node>) -> Value {
            let mut out = Map::new();
            for (key, node) in children {
                let value = match node {
                    Node::Leaf(message) => Value::String(message.clone()),
                    Node::Branch(children) => branch(children),
                };
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
        branch(&self.root)
    }
}
