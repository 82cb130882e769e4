//! Nodes, links and property values
//!
//! Mirrors the document layout of a node in the store: camelCase fields,
//! properties as an ordered map, relationships as lists of named
//! collections.

use crate::ids::NodeId;
use crate::inheritance::{InheritanceRule, InheritanceType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the default collection bucket
pub const MAIN_COLLECTION: &str = "main";

/// Field holding the collections of a node's specializations
pub const SPECIALIZATIONS: &str = "specializations";

/// Field holding the collections of a node's generalizations
pub const GENERALIZATIONS: &str = "generalizations";

/// Node type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Concept,
    Activity,
    Actor,
    Process,
    #[serde(alias = "evaluationDimension")]
    Evaluation,
    Role,
    Incentive,
    Reward,
    Group,
    Context,
}

impl NodeType {
    /// Wire tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Activity => "activity",
            Self::Actor => "actor",
            Self::Process => "process",
            Self::Evaluation => "evaluation",
            Self::Role => "role",
            Self::Incentive => "incentive",
            Self::Reward => "reward",
            Self::Group => "group",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge to another node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Target node
    pub id: NodeId,

    /// Edge label for typed relationships
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Edge type for typed relationships
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

impl Link {
    /// Plain specialization/generalization edge
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            link_type: None,
        }
    }

    /// Typed relationship edge
    #[inline]
    #[must_use]
    pub fn typed(id: impl Into<NodeId>, link_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            link_type: Some(link_type.into()),
        }
    }
}

/// Named, ordered bucket of links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub collection_name: String,
    #[serde(default)]
    pub nodes: Vec<Link>,
}

impl Collection {
    /// Create collection from link targets
    #[must_use]
    pub fn new<I, T>(name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        Self {
            collection_name: name.into(),
            nodes: ids.into_iter().map(Link::new).collect(),
        }
    }

    /// Create the default `main` collection
    #[must_use]
    pub fn main<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NodeId>,
    {
        Self::new(MAIN_COLLECTION, ids)
    }

    /// Target ids in order
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|link| &link.id)
    }

    /// Whether the collection links to `id`
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|link| link.id == id)
    }
}

/// All link targets across a collection list, first occurrence only
#[must_use]
pub fn collection_ids(collections: &[Collection]) -> Vec<&NodeId> {
    let mut out: Vec<&NodeId> = Vec::new();
    for id in collections.iter().flat_map(Collection::ids) {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Value of a property
///
/// Untagged on the wire. An empty JSON array deserializes as an empty
/// collection list; use the declared [`PropertyType`] to tell an empty
/// string-array apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Relationship-valued property
    Collections(Vec<Collection>),
    /// `string-array`
    TextList(Vec<String>),
    /// `string`
    Text(String),
    /// `number`
    Number(f64),
}

impl PropertyValue {
    /// Whether the value is a collection list
    #[inline]
    #[must_use]
    pub fn is_collections(&self) -> bool {
        matches!(self, Self::Collections(_))
    }

    /// Collections, if relationship-valued
    #[inline]
    #[must_use]
    pub fn as_collections(&self) -> Option<&[Collection]> {
        match self {
            Self::Collections(c) => Some(c),
            _ => None,
        }
    }

    /// Text, if a string value
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<Collection>> for PropertyValue {
    fn from(c: Vec<Collection>) -> Self {
        Self::Collections(c)
    }
}

/// Declared type of a property
///
/// Relationship properties are typed by the node type of their targets
/// (e.g. `activity`), so the tag set is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    String,
    StringArray,
    Number,
    SelectString,
    /// Relationship to nodes of the named type
    Nodes(String),
}

impl PropertyType {
    /// Scalar (non-relationship) type
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Nodes(_))
    }

    /// Wire tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::StringArray => "string-array",
            Self::Number => "number",
            Self::SelectString => "select-string",
            Self::Nodes(tag) => tag,
        }
    }
}

impl From<String> for PropertyType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "string" => Self::String,
            "string-array" => Self::StringArray,
            "number" => Self::Number,
            "select-string" => Self::SelectString,
            _ => Self::Nodes(tag),
        }
    }
}

impl From<&str> for PropertyType {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<PropertyType> for String {
    fn from(t: PropertyType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the ontology graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    #[serde(default)]
    pub deleted: bool,
    pub node_type: NodeType,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
    #[serde(default)]
    pub property_type: IndexMap<String, PropertyType>,
    #[serde(default)]
    pub inheritance: IndexMap<String, InheritanceRule>,
    #[serde(default)]
    pub specializations: Vec<Collection>,
    #[serde(default)]
    pub generalizations: Vec<Collection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub contributors_by_property: IndexMap<String, Vec<String>>,
}

impl Node {
    /// Create an empty live node
    #[must_use]
    pub fn new(id: impl Into<NodeId>, title: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            deleted: false,
            node_type,
            properties: IndexMap::new(),
            property_type: IndexMap::new(),
            inheritance: IndexMap::new(),
            specializations: Vec::new(),
            generalizations: Vec::new(),
            contributors: Vec::new(),
            contributors_by_property: IndexMap::new(),
        }
    }

    /// Add a locally owned property
    #[must_use]
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        property_type: impl Into<PropertyType>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        let name = name.into();
        self.properties.insert(name.clone(), value.into());
        self.property_type.insert(name.clone(), property_type.into());
        self.inheritance
            .entry(name)
            .or_insert_with(InheritanceRule::owned);
        self
    }

    /// Set the inheritance rule of a property
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, rule: InheritanceRule) -> Self {
        self.inheritance.insert(name.into(), rule);
        self
    }

    /// Point a property at an inheritance source
    #[must_use]
    pub fn inheriting(self, name: impl Into<String>, source: impl Into<NodeId>) -> Self {
        self.with_rule(name, InheritanceRule::inherited_from(source))
    }

    /// Direct generalizations, deduplicated, in link order
    #[must_use]
    pub fn generalization_ids(&self) -> Vec<&NodeId> {
        collection_ids(&self.generalizations)
    }

    /// Direct specializations, deduplicated, in link order
    #[must_use]
    pub fn specialization_ids(&self) -> Vec<&NodeId> {
        collection_ids(&self.specializations)
    }

    /// Whether the property is present locally (owned or read-through copy)
    #[inline]
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Inheritance rule for a property
    #[inline]
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&InheritanceRule> {
        self.inheritance.get(name)
    }

    /// Current inheritance source for a property, if inherited
    #[inline]
    #[must_use]
    pub fn inheritance_ref(&self, name: &str) -> Option<&NodeId> {
        self.rule(name).and_then(|r| r.source.as_ref())
    }

    /// Whether the property is marked `neverInherit`
    #[inline]
    #[must_use]
    pub fn never_inherits(&self, name: &str) -> bool {
        self.rule(name)
            .is_some_and(|r| r.inheritance_type == InheritanceType::NeverInherit)
    }

    /// Whether the property is relationship-valued
    ///
    /// Decided by the declared type when present, by the value otherwise.
    #[must_use]
    pub fn is_relationship(&self, name: &str) -> bool {
        match self.property_type.get(name) {
            Some(t) => !t.is_scalar(),
            None => self
                .properties
                .get(name)
                .is_some_and(PropertyValue::is_collections),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn property_value_untagged_variants() {
        let text: PropertyValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, PropertyValue::Text("hello".into()));

        let number: PropertyValue = serde_json::from_str("100").unwrap();
        assert_eq!(number, PropertyValue::Number(100.0));

        let list: PropertyValue = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(list, PropertyValue::TextList(vec!["a".into(), "b".into()]));

        let collections: PropertyValue = serde_json::from_str(
            r#"[{ "collectionName": "main", "nodes": [{ "id": "n1" }] }]"#,
        )
        .unwrap();
        assert_eq!(
            collections,
            PropertyValue::Collections(vec![Collection::main(["n1"])])
        );
    }

    #[test]
    fn property_type_open_tag_set() {
        assert_eq!(PropertyType::from("string"), PropertyType::String);
        assert_eq!(PropertyType::from("string-array"), PropertyType::StringArray);
        assert_eq!(
            PropertyType::from("activity"),
            PropertyType::Nodes("activity".into())
        );
        assert!(!PropertyType::from("actor").is_scalar());

        let json = serde_json::to_string(&PropertyType::StringArray).unwrap();
        assert_eq!(json, "\"string-array\"");
    }

    #[test]
    fn node_type_accepts_legacy_evaluation_tag() {
        let t: NodeType = serde_json::from_str("\"evaluationDimension\"").unwrap();
        assert_eq!(t, NodeType::Evaluation);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"evaluation\"");
    }

    #[test]
    fn link_ids_are_deduplicated() {
        let node = Node {
            generalizations: vec![
                Collection::main(["a", "b"]),
                Collection::new("other", ["b", "c"]),
            ],
            ..Node::new("n", "N", NodeType::Concept)
        };
        let ids: Vec<&str> = node.generalization_ids().iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn relationship_detection() {
        let node = Node::new("n", "N", NodeType::Activity)
            .with_property("description", "string", "text")
            .with_property("parts", "activity", vec![Collection::main(["p"])]);

        assert!(!node.is_relationship("description"));
        assert!(node.is_relationship("parts"));
        assert!(!node.is_relationship("missing"));
    }

    #[test]
    fn typed_link_serializes_type_field() {
        let link = Link::typed("n1", "isPartOf");
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["type"], "isPartOf");
        assert!(json.get("label").is_none());
    }
}
