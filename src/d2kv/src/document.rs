//! KV document tree
//!
//! Nodes keep source order and duplicates. Name lookups are ASCII
//! case-insensitive, matching how the game resolves script keys.

use serde::{Deserialize, Serialize};

/// A parsed KV file: usually a single root node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub roots: Vec<Node>,
}

/// A named node holding text or children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub value: Value,
}

/// Node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Children(Vec<Node>),
}

impl Document {
    /// First root node
    pub fn root(&self) -> Option<&Node> {
        self.roots.first()
    }

    /// Children of the first root, or nothing for an empty or text-only root
    pub fn root_children(&self) -> &[Node] {
        self.root().map(Node::children).unwrap_or(&[])
    }
}

impl Node {
    /// Leaf node
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Text(value.into()),
        }
    }

    /// Branch node
    pub fn branch(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            value: Value::Children(children),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.value, Value::Children(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            Value::Text(s) => Some(s),
            Value::Children(_) => None,
        }
    }

    /// Child nodes; empty for leaves
    pub fn children(&self) -> &[Node] {
        match &self.value {
            Value::Children(c) => c,
            Value::Text(_) => &[],
        }
    }

    /// First child with a matching name
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Text of the first child with a matching name
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Node::as_text)
    }

    /// Integer value of a leaf
    pub fn parse_i64(&self) -> Option<i64> {
        self.as_text()?.trim().parse().ok()
    }

    /// Float value of a leaf
    ///
    /// Rust float parsing is locale-independent, so "1.5" is always one and a
    /// half regardless of the host culture.
    pub fn parse_f64(&self) -> Option<f64> {
        self.as_text()?.trim().parse().ok()
    }

    /// Boolean value of a leaf: `1`/`0`/`true`/`false`
    pub fn parse_bool(&self) -> Option<bool> {
        let text = self.as_text()?.trim();
        if text == "1" || text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text == "0" || text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero() -> Node {
        Node::branch(
            "npc_dota_hero_axe",
            vec![
                Node::text("HeroID", "2"),
                Node::text("Ability1", "axe_berserkers_call"),
                Node::text("ability1", "duplicate_lowercase"),
                Node::text("ArmorPhysical", "-1.5"),
                Node::text("IsCustom", "1"),
                Node::branch("Facets", vec![]),
            ],
        )
    }

    #[test]
    fn test_child_lookup_is_case_insensitive_first_match() {
        let node = hero();
        assert_eq!(node.child_text("heroid"), Some("2"));
        assert_eq!(node.child_text("ABILITY1"), Some("axe_berserkers_call"));
        assert!(node.child("Missing").is_none());
    }

    #[test]
    fn test_scalar_coercion() {
        let node = hero();
        assert_eq!(node.child("HeroID").and_then(Node::parse_i64), Some(2));
        assert_eq!(
            node.child("ArmorPhysical").and_then(Node::parse_f64),
            Some(-1.5)
        );
        assert_eq!(node.child("IsCustom").and_then(Node::parse_bool), Some(true));
        assert_eq!(node.child("Ability1").and_then(Node::parse_bool), None);
        assert_eq!(node.child("Facets").and_then(Node::parse_i64), None);
    }

    #[test]
    fn test_leaf_has_no_children() {
        let leaf = Node::text("a", "b");
        assert!(leaf.children().is_empty());
        assert!(!leaf.is_branch());
        assert!(hero().is_branch());
    }

    #[test]
    fn test_root_children() {
        let doc = Document {
            roots: vec![Node::branch("DOTAHeroes", vec![hero()])],
        };
        assert_eq!(doc.root_children().len(), 1);
        assert!(Document::default().root_children().is_empty());
    }

    #[test]
    fn test_value_serialization() {
        let node = Node::branch("root", vec![Node::text("k", "v")]);
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"name":"root","value":[{"name":"k","value":"v"}]}"#);
    }
}
