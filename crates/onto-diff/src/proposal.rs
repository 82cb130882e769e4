//! Proposed node edits
//!
//! Improvements reference related nodes by title rather than id, grouped in
//! the same named collections as the live node.

use indexmap::IndexMap;
use onto_model::{
    Collection, Node, NodeGraph, NodeType, PropertyValue, GENERALIZATIONS, SPECIALIZATIONS,
};
use serde::{Deserialize, Serialize};

/// Named bucket of node titles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleCollection {
    #[serde(alias = "collection")]
    pub collection_name: String,
    #[serde(default)]
    pub nodes: Vec<String>,
}

impl TitleCollection {
    /// Create collection from titles
    #[must_use]
    pub fn new<I, T>(name: impl Into<String>, titles: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            collection_name: name.into(),
            nodes: titles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Value of one property in an improvement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProposedValue {
    /// Relationship value with nodes named by title
    TitleCollections(Vec<TitleCollection>),
    TextList(Vec<String>),
    Text(String),
    Number(f64),
    /// Explicit `null`: the property is to be removed
    Cleared,
}

impl ProposedValue {
    /// Whether the value is a non-empty list of title collections
    ///
    /// An empty JSON array parses as title collections; it only counts as a
    /// relationship value when the live side is one.
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::TitleCollections(c) if !c.is_empty())
    }

    /// Whether the proposal asks for the property to be removed
    #[inline]
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        matches!(self, Self::Cleared)
    }

    /// Scalar form, if the value is not a relationship
    #[must_use]
    pub fn to_scalar(&self) -> Option<PropertyValue> {
        match self {
            Self::TitleCollections(c) if c.is_empty() => Some(PropertyValue::TextList(Vec::new())),
            Self::TitleCollections(_) => None,
            Self::TextList(items) => Some(PropertyValue::TextList(items.clone())),
            Self::Text(text) => Some(PropertyValue::Text(text.clone())),
            Self::Number(n) => Some(PropertyValue::Number(*n)),
            Self::Cleared => None,
        }
    }

    /// Render a live value for proposal, naming linked nodes by title
    ///
    /// Links to unknown nodes are dropped, as are empty `main` buckets.
    #[must_use]
    pub fn from_value(value: &PropertyValue, graph: &NodeGraph) -> Self {
        match value {
            PropertyValue::Collections(collections) => {
                Self::TitleCollections(title_collections(collections, graph))
            }
            PropertyValue::TextList(items) => Self::TextList(items.clone()),
            PropertyValue::Text(text) => Self::Text(text.clone()),
            PropertyValue::Number(n) => Self::Number(*n),
        }
    }
}

impl From<&str> for ProposedValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<TitleCollection>> for ProposedValue {
    fn from(c: Vec<TitleCollection>) -> Self {
        Self::TitleCollections(c)
    }
}

fn title_collections(collections: &[Collection], graph: &NodeGraph) -> Vec<TitleCollection> {
    collections
        .iter()
        .map(|c| {
            TitleCollection::new(
                c.collection_name.clone(),
                c.ids().filter_map(|id| graph.title_of(id.as_str())),
            )
        })
        .filter(|c| c.collection_name != onto_model::MAIN_COLLECTION || !c.nodes.is_empty())
        .collect()
}

/// Proposed property values keyed by property name
pub type ProposedProperties = IndexMap<String, ProposedValue>;

/// Key under which a proposal carries the node title
pub const TITLE: &str = "title";

const DESCRIPTION: &str = "description";

/// Live side of a comparison
///
/// Title and description come first, then the non-empty link lists taken
/// from the node's own fields, then the remaining properties in document
/// order. Entries in `properties` shadowing the title or a link list are
/// ignored.
#[must_use]
pub fn comparable_properties(node: &Node) -> IndexMap<String, PropertyValue> {
    let mut live = IndexMap::with_capacity(node.properties.len() + 3);
    live.insert(TITLE.to_string(), PropertyValue::Text(node.title.clone()));
    if let Some(description) = node.properties.get(DESCRIPTION) {
        live.insert(DESCRIPTION.to_string(), description.clone());
    }
    for (name, links) in [
        (SPECIALIZATIONS, &node.specializations),
        (GENERALIZATIONS, &node.generalizations),
    ] {
        if links.iter().any(|c| !c.nodes.is_empty()) {
            live.insert(name.to_string(), PropertyValue::Collections(links.clone()));
        }
    }
    for (name, value) in &node.properties {
        if !live.contains_key(name) && name != SPECIALIZATIONS && name != GENERALIZATIONS {
            live.insert(name.clone(), value.clone());
        }
    }
    live
}

/// A suggested edit awaiting review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    #[serde(default, alias = "old_title")]
    pub old_title: Option<String>,
    #[serde(default, alias = "new_title")]
    pub new_title: Option<String>,
    #[serde(default)]
    pub node_type: Option<NodeType>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub properties: ProposedProperties,
}

impl Improvement {
    /// Proposal that restates a node exactly as it is
    #[must_use]
    pub fn from_node(node: &Node, graph: &NodeGraph) -> Self {
        Self {
            old_title: Some(node.title.clone()),
            new_title: Some(node.title.clone()),
            node_type: Some(node.node_type),
            reasoning: String::new(),
            properties: comparable_properties(node)
                .iter()
                .map(|(name, value)| (name.clone(), ProposedValue::from_value(value, graph)))
                .collect(),
        }
    }

    /// Properties to compare, with `new_title` standing in for a missing
    /// `title` entry
    #[must_use]
    pub fn proposed_properties(&self) -> ProposedProperties {
        let mut properties = self.properties.clone();
        if let Some(title) = &self.new_title {
            if !properties.contains_key(TITLE) {
                properties.insert(TITLE.to_string(), ProposedValue::Text(title.clone()));
            }
        }
        properties
    }

    /// Whether the property is explicitly cleared
    #[inline]
    #[must_use]
    pub fn clears(&self, property: &str) -> bool {
        self.properties.get(property).is_some_and(ProposedValue::is_cleared)
    }

    /// With a proposed value
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<ProposedValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// With reasoning
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }
}
