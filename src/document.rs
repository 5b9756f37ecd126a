//! The settings document: a typed tree of groups and scalar leaves.
//!
//! Both the compiled-in default document and the persisted document use this
//! shape. Key paths are dotted (`"application.theme"`); each segment names a
//! group except the last, which names a leaf.
//!
//! Leaves the settings schema never produces (floats, arrays, datetimes) are
//! still representable so that keys written by newer versions or by hand
//! survive a load/save round trip untouched.

use std::collections::BTreeMap;
use std::fmt;

use toml::Table;

use crate::error::DeskfigError;

/// A leaf value in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Arrays, datetimes and anything else carried through verbatim.
    Other(toml::Value),
}

/// One entry of a document: a leaf or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Scalar),
    Group(Document),
}

/// An ordered tree of named nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: BTreeMap<String, Node>,
}

impl Scalar {
    pub fn to_toml(&self) -> toml::Value {
        match self {
            Scalar::Boolean(b) => toml::Value::Boolean(*b),
            Scalar::Integer(i) => toml::Value::Integer(*i),
            Scalar::Float(f) => toml::Value::Float(*f),
            Scalar::String(s) => toml::Value::String(s.clone()),
            Scalar::Other(v) => v.clone(),
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Boolean(_) => "boolean",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
            Scalar::Other(v) => v.type_str(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::String(s) => write!(f, "{s}"),
            Scalar::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Boolean(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl Node {
    pub fn leaf(value: impl Into<Scalar>) -> Self {
        Node::Leaf(value.into())
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Leaf(s) => Some(s),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Document> {
        match self {
            Node::Group(d) => Some(d),
            Node::Leaf(_) => None,
        }
    }

    fn from_toml(value: toml::Value) -> Self {
        match value {
            toml::Value::Table(t) => Node::Group(Document::from_toml(t)),
            toml::Value::Boolean(b) => Node::Leaf(Scalar::Boolean(b)),
            toml::Value::Integer(i) => Node::Leaf(Scalar::Integer(i)),
            toml::Value::Float(f) => Node::Leaf(Scalar::Float(f)),
            toml::Value::String(s) => Node::Leaf(Scalar::String(s)),
            other => Node::Leaf(Scalar::Other(other)),
        }
    }

    fn to_toml(&self) -> toml::Value {
        match self {
            Node::Leaf(s) => s.to_toml(),
            Node::Group(d) => toml::Value::Table(d.to_toml()),
        }
    }
}

/// Split a dotted key path, rejecting empty segments.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, DeskfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(DeskfigError::InvalidKeyPath(path.to_string()));
    }
    Ok(segments)
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text into a document.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let table: Table = toml::from_str(content)?;
        Ok(Self::from_toml(table))
    }

    pub fn from_toml(table: Table) -> Self {
        let entries = table
            .into_iter()
            .map(|(k, v)| (k, Node::from_toml(v)))
            .collect();
        Self { entries }
    }

    pub fn to_toml(&self) -> Table {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_toml()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.entries.iter()
    }

    pub fn insert(&mut self, key: impl Into<String>, node: Node) -> Option<Node> {
        self.entries.insert(key.into(), node)
    }

    pub(crate) fn take_entry(&mut self, key: &str) -> Option<Node> {
        self.entries.remove(key)
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, Node)> {
        self.entries.into_iter()
    }

    /// Look up a node by dotted key path.
    pub fn get(&self, path: &str) -> Option<&Node> {
        let (parents, leaf) = match path.rsplit_once('.') {
            Some((p, l)) => (Some(p), l),
            None => (None, path),
        };

        let mut current = self;
        if let Some(parents) = parents {
            for segment in parents.split('.') {
                current = current.entries.get(segment)?.as_group()?;
            }
        }
        current.entries.get(leaf)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Node> {
        let (parents, leaf) = match path.rsplit_once('.') {
            Some((p, l)) => (Some(p), l),
            None => (None, path),
        };

        let mut current = self;
        if let Some(parents) = parents {
            for segment in parents.split('.') {
                current = match current.entries.get_mut(segment)? {
                    Node::Group(doc) => doc,
                    Node::Leaf(_) => return None,
                };
            }
        }
        current.entries.get_mut(leaf)
    }

    pub fn get_scalar(&self, path: &str) -> Option<&Scalar> {
        self.get(path)?.as_scalar()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set a node at a dotted key path, creating intermediate groups.
    ///
    /// A leaf sitting where an intermediate group is needed is replaced.
    pub fn set(&mut self, path: &str, node: Node) -> Result<(), DeskfigError> {
        let segments = split_path(path)?;
        self.set_segments(&segments, node);
        Ok(())
    }

    fn set_segments(&mut self, segments: &[&str], node: Node) {
        match segments {
            [] => {}
            [leaf] => {
                self.entries.insert(leaf.to_string(), node);
            }
            [head, rest @ ..] => {
                let mut child = match self.entries.remove(*head) {
                    Some(Node::Group(doc)) => doc,
                    _ => Document::new(),
                };
                child.set_segments(rest, node);
                self.entries.insert(head.to_string(), Node::Group(child));
            }
        }
    }

    /// Remove the node at a dotted key path. Empty parent groups are kept.
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        match path.rsplit_once('.') {
            Some((parents, leaf)) => match self.get_mut(parents)? {
                Node::Group(doc) => doc.entries.remove(leaf),
                Node::Leaf(_) => None,
            },
            None => self.entries.remove(path),
        }
    }

    /// All leaves as `(dotted_path, scalar)`, depth-first in key order.
    pub fn leaves(&self) -> Vec<(String, &Scalar)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Scalar)>) {
        for (key, node) in &self.entries {
            let dotted = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match node {
                Node::Leaf(s) => out.push((dotted, s)),
                Node::Group(doc) => doc.collect_leaves(&dotted, out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(toml_str: &str) -> Document {
        Document::parse(toml_str).unwrap()
    }

    #[test]
    fn get_top_level_and_nested() {
        let d = doc("name = \"x\"\n[application]\ntheme = \"dark\"\n");
        assert_eq!(d.get_scalar("name"), Some(&Scalar::from("x")));
        assert_eq!(d.get_scalar("application.theme"), Some(&Scalar::from("dark")));
        assert!(d.get("application.missing").is_none());
        assert!(d.get("missing.theme").is_none());
    }

    #[test]
    fn get_through_leaf_is_none() {
        let d = doc("application = 3\n");
        assert!(d.get("application.theme").is_none());
    }

    #[test]
    fn set_creates_intermediate_groups() {
        let mut d = Document::new();
        d.set("a.b.c", Node::leaf(42i64)).unwrap();
        assert_eq!(d.get_scalar("a.b.c"), Some(&Scalar::Integer(42)));
        assert!(d.get("a.b").unwrap().as_group().is_some());
    }

    #[test]
    fn set_replaces_leaf_in_the_way() {
        let mut d = doc("window = 5\n");
        d.set("window.width", Node::leaf(700i64)).unwrap();
        assert_eq!(d.get_scalar("window.width"), Some(&Scalar::Integer(700)));
    }

    #[test]
    fn set_into_existing_group_keeps_siblings() {
        let mut d = doc("[window]\nwidth = 1\nheight = 2\n[window.extra]\nx = true\n");
        d.set("window.width", Node::leaf(5i64)).unwrap();
        assert_eq!(d.get_scalar("window.width"), Some(&Scalar::Integer(5)));
        assert_eq!(d.get_scalar("window.height"), Some(&Scalar::Integer(2)));
        assert_eq!(d.get_scalar("window.extra.x"), Some(&Scalar::Boolean(true)));
    }

    #[test]
    fn set_rejects_empty_segments() {
        let mut d = Document::new();
        assert!(matches!(
            d.set("a..b", Node::leaf(true)),
            Err(DeskfigError::InvalidKeyPath(_))
        ));
        assert!(matches!(
            d.set("", Node::leaf(true)),
            Err(DeskfigError::InvalidKeyPath(_))
        ));
    }

    #[test]
    fn remove_nested_leaf() {
        let mut d = doc("[window]\nwidth = 1\nheight = 2\n");
        let removed = d.remove("window.width");
        assert_eq!(removed, Some(Node::leaf(1i64)));
        assert!(d.get("window.width").is_none());
        assert!(d.get("window.height").is_some());
        assert!(d.remove("window.width").is_none());
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut d = doc("[window]\nwidth = 1\n");
        *d.get_mut("window.width").unwrap() = Node::leaf(900i64);
        assert_eq!(d.get_scalar("window.width"), Some(&Scalar::Integer(900)));
        assert!(d.get_mut("window.width.deeper").is_none());
    }

    #[test]
    fn leaves_are_depth_first_with_dotted_paths() {
        let d = doc("z = 1\n[a]\nx = true\n[a.b]\ny = \"s\"\n");
        let paths: Vec<String> = d.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a.b.y", "a.x", "z"]);
    }

    #[test]
    fn unsupported_values_survive_toml_round_trip() {
        let d = doc("tags = [\"a\", \"b\"]\nratio = 0.5\n");
        assert!(matches!(d.get_scalar("tags"), Some(Scalar::Other(_))));
        assert_eq!(d.get_scalar("ratio"), Some(&Scalar::Float(0.5)));

        let table = d.to_toml();
        assert_eq!(table["tags"].as_array().unwrap().len(), 2);
        assert_eq!(Document::from_toml(table), d);
    }

    #[test]
    fn scalar_display() {
        assert_eq!(Scalar::from(true).to_string(), "true");
        assert_eq!(Scalar::from(7i64).to_string(), "7");
        assert_eq!(Scalar::from("dark").to_string(), "dark");
    }
}
