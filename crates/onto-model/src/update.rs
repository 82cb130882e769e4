//! Field-level node mutations
//!
//! Planners never mutate nodes directly; they emit [`NodeUpdate`]s which a
//! store commits and which can be replayed onto a snapshot.

use crate::ids::NodeId;
use crate::inheritance::InheritanceRule;
use crate::node::{Collection, Node, PropertyType, PropertyValue};
use serde::{Deserialize, Serialize};

/// One field mutation on a node document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FieldUpdate {
    /// `inheritance.<property>.ref`
    SetInheritanceRef {
        property: String,
        source: Option<NodeId>,
    },
    /// `inheritance.<property>`
    SetInheritance {
        property: String,
        rule: InheritanceRule,
    },
    /// `title`
    SetTitle { title: String },
    /// `properties.<property>`
    SetProperty {
        property: String,
        value: PropertyValue,
    },
    /// `propertyType.<property>`
    SetPropertyType {
        property: String,
        property_type: PropertyType,
    },
    /// Delete the property with its type and inheritance entries
    RemoveProperty { property: String },
    /// Union `username` into `contributors` (and per-property contributors)
    AddContributor {
        username: String,
        property: Option<String>,
    },
    /// `specializations`
    SetSpecializations { collections: Vec<Collection> },
    /// `generalizations`
    SetGeneralizations { collections: Vec<Collection> },
}

impl FieldUpdate {
    /// Property the update touches, if any
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::SetInheritanceRef { property, .. }
            | Self::SetInheritance { property, .. }
            | Self::SetProperty { property, .. }
            | Self::SetPropertyType { property, .. }
            | Self::RemoveProperty { property } => Some(property),
            Self::AddContributor { property, .. } => property.as_deref(),
            Self::SetTitle { .. }
            | Self::SetSpecializations { .. }
            | Self::SetGeneralizations { .. } => None,
        }
    }
}

/// All field updates for one node document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub node_id: NodeId,
    pub fields: Vec<FieldUpdate>,
}

impl NodeUpdate {
    /// Empty update for a node
    #[inline]
    #[must_use]
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field update
    #[inline]
    #[must_use]
    pub fn with(mut self, field: FieldUpdate) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a field update in place
    #[inline]
    pub fn push(&mut self, field: FieldUpdate) {
        self.fields.push(field);
    }

    /// Whether no fields are set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Node {
    /// Apply one field update
    pub fn apply(&mut self, field: &FieldUpdate) {
        match field {
            FieldUpdate::SetInheritanceRef { property, source } => {
                self.inheritance.entry(property.clone()).or_default().source = source.clone();
            }
            FieldUpdate::SetInheritance { property, rule } => {
                self.inheritance.insert(property.clone(), rule.clone());
            }
            FieldUpdate::SetTitle { title } => {
                self.title.clone_from(title);
            }
            FieldUpdate::SetProperty { property, value } => {
                self.properties.insert(property.clone(), value.clone());
            }
            FieldUpdate::SetPropertyType {
                property,
                property_type,
            } => {
                self.property_type
                    .insert(property.clone(), property_type.clone());
            }
            FieldUpdate::RemoveProperty { property } => {
                self.properties.shift_remove(property);
                self.property_type.shift_remove(property);
                self.inheritance.shift_remove(property);
            }
            FieldUpdate::AddContributor { username, property } => {
                if !self.contributors.contains(username) {
                    self.contributors.push(username.clone());
                }
                if let Some(property) = property {
                    let by_property = self
                        .contributors_by_property
                        .entry(property.clone())
                        .or_default();
                    if !by_property.contains(username) {
                        by_property.push(username.clone());
                    }
                }
            }
            FieldUpdate::SetSpecializations { collections } => {
                self.specializations.clone_from(collections);
            }
            FieldUpdate::SetGeneralizations { collections } => {
                self.generalizations.clone_from(collections);
            }
        }
    }

    /// Apply every field of an update
    pub fn apply_update(&mut self, update: &NodeUpdate) {
        for field in &update.fields {
            self.apply(field);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inheritance::InheritanceType;
    use crate::node::NodeType;

    #[test]
    fn set_ref_creates_missing_rule() {
        let mut node = Node::new("n", "N", NodeType::Concept);
        node.apply(&FieldUpdate::SetInheritanceRef {
            property: "description".into(),
            source: Some("g".into()),
        });
        assert_eq!(node.inheritance_ref("description").map(NodeId::as_str), Some("g"));
        assert_eq!(
            node.rule("description").unwrap().inheritance_type,
            InheritanceType::InheritUnlessAlreadyOverRidden
        );
    }

    #[test]
    fn remove_property_clears_all_entries() {
        let mut node =
            Node::new("n", "N", NodeType::Concept).with_property("color", "string", "red");
        node.apply(&FieldUpdate::RemoveProperty {
            property: "color".into(),
        });
        assert!(!node.has_property("color"));
        assert!(node.property_type.is_empty());
        assert!(node.inheritance.is_empty());
    }

    #[test]
    fn add_contributor_is_a_set_union() {
        let mut node = Node::new("n", "N", NodeType::Concept);
        let field = FieldUpdate::AddContributor {
            username: "ada".into(),
            property: Some("title".into()),
        };
        node.apply(&field);
        node.apply(&field);
        assert_eq!(node.contributors, vec!["ada".to_string()]);
        assert_eq!(node.contributors_by_property["title"], vec!["ada".to_string()]);
    }

    #[test]
    fn link_lists_are_replaced_wholesale() {
        let mut node = Node::new("n", "N", NodeType::Concept);
        node.apply(&FieldUpdate::SetGeneralizations {
            collections: vec![Collection::main(["g1", "g2"])],
        });
        node.apply(&FieldUpdate::SetGeneralizations {
            collections: vec![Collection::main(["g2"])],
        });
        assert_eq!(node.generalization_ids(), vec![&NodeId::from("g2")]);
        assert!(node.specializations.is_empty());
    }

    #[test]
    fn update_wire_format_is_tagged() {
        let update = NodeUpdate::new("n").with(FieldUpdate::RemoveProperty {
            property: "x".into(),
        });
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["nodeId"], "n");
        assert_eq!(json["fields"][0]["op"], "removeProperty");
    }

    #[test]
    fn variant_fields_are_camel_case() {
        let field = FieldUpdate::SetPropertyType {
            property: "severity".into(),
            property_type: "number".into(),
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["op"], "setPropertyType");
        assert_eq!(json["propertyType"], "number");
        assert!(json.get("property_type").is_none());

        let parsed: FieldUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, field);
    }
}
