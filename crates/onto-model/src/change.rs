//! Change-log entries

use crate::ids::{ChangeLogId, NodeId};
use crate::node::{Node, PropertyValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of mutation recorded in the change log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    #[serde(rename = "change text")]
    ChangeText,
    #[serde(rename = "sort elements")]
    SortElements,
    #[serde(rename = "remove element")]
    RemoveElement,
    #[serde(rename = "add element")]
    AddElement,
    #[serde(rename = "add elements")]
    AddElements,
    #[serde(rename = "remove elements")]
    RemoveElements,
    #[serde(rename = "modify elements")]
    ModifyElements,
    #[serde(rename = "add property")]
    AddProperty,
    #[serde(rename = "remove property")]
    RemoveProperty,
    #[serde(rename = "edit property")]
    EditProperty,
    #[serde(rename = "delete node")]
    DeleteNode,
    #[serde(rename = "add node")]
    AddNode,
    #[serde(rename = "add collection")]
    AddCollection,
    #[serde(rename = "delete collection")]
    DeleteCollection,
    #[serde(rename = "edit collection")]
    EditCollection,
    #[serde(rename = "add images")]
    AddImages,
    #[serde(rename = "remove images")]
    RemoveImages,
    #[serde(rename = "sort collections")]
    SortCollections,
    #[serde(rename = "change select-string")]
    ChangeSelectString,
    /// Any tag this version does not know
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl ChangeType {
    /// Wire tag
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChangeText => "change text",
            Self::SortElements => "sort elements",
            Self::RemoveElement => "remove element",
            Self::AddElement => "add element",
            Self::AddElements => "add elements",
            Self::RemoveElements => "remove elements",
            Self::ModifyElements => "modify elements",
            Self::AddProperty => "add property",
            Self::RemoveProperty => "remove property",
            Self::EditProperty => "edit property",
            Self::DeleteNode => "delete node",
            Self::AddNode => "add node",
            Self::AddCollection => "add collection",
            Self::DeleteCollection => "delete collection",
            Self::EditCollection => "edit collection",
            Self::AddImages => "add images",
            Self::RemoveImages => "remove images",
            Self::SortCollections => "sort collections",
            Self::ChangeSelectString => "change select-string",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra context for relationship and property changes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_property: Option<String>,
}

impl ChangeDetails {
    /// Details naming a newly added property
    #[must_use]
    pub fn added_property(name: impl Into<String>) -> Self {
        Self {
            added_property: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Immutable record of a single mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ChangeLogId>,
    pub node_id: NodeId,
    #[serde(default)]
    pub modified_by: String,
    #[serde(default)]
    pub modified_property: Option<String>,
    pub change_type: ChangeType,
    #[serde(default)]
    pub previous_value: Option<PropertyValue>,
    #[serde(default)]
    pub new_value: Option<PropertyValue>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub full_node: Option<Box<Node>>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_details: Option<ChangeDetails>,
}

impl NodeChange {
    /// Create entry stamped now
    #[must_use]
    pub fn new(
        node_id: impl Into<NodeId>,
        modified_by: impl Into<String>,
        change_type: ChangeType,
    ) -> Self {
        Self {
            id: None,
            node_id: node_id.into(),
            modified_by: modified_by.into(),
            modified_property: None,
            change_type,
            previous_value: None,
            new_value: None,
            modified_at: Utc::now(),
            full_node: None,
            reasoning: String::new(),
            change_details: None,
        }
    }

    /// With the modified property
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.modified_property = Some(property.into());
        self
    }

    /// With previous and new values
    #[must_use]
    pub fn with_values(
        mut self,
        previous: Option<PropertyValue>,
        new: Option<PropertyValue>,
    ) -> Self {
        self.previous_value = previous;
        self.new_value = new;
        self
    }

    /// With free-text reasoning
    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// With a snapshot of the node after the change
    #[must_use]
    pub fn with_full_node(mut self, node: Node) -> Self {
        self.full_node = Some(Box::new(node));
        self
    }

    /// With change details
    #[must_use]
    pub fn with_details(mut self, details: ChangeDetails) -> Self {
        self.change_details = Some(details);
        self
    }

    /// With explicit timestamp
    #[must_use]
    pub fn at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = modified_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_type_wire_tags() {
        let t: ChangeType = serde_json::from_str("\"add collection\"").unwrap();
        assert_eq!(t, ChangeType::AddCollection);
        assert_eq!(
            serde_json::to_string(&ChangeType::ChangeSelectString).unwrap(),
            "\"change select-string\""
        );
    }

    #[test]
    fn unrecognized_change_type_is_unknown() {
        let t: ChangeType = serde_json::from_str("\"unknown type\"").unwrap();
        assert_eq!(t, ChangeType::Unknown);
    }

    #[test]
    fn change_entry_from_store_json() {
        let json = r#"{
            "nodeId": "n1",
            "modifiedBy": "user1",
            "modifiedProperty": "description",
            "changeType": "add property",
            "modifiedAt": "2024-05-01T10:00:00Z",
            "fullNode": null,
            "changeDetails": { "addedProperty": "newProperty" }
        }"#;
        let change: NodeChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.change_type, ChangeType::AddProperty);
        assert_eq!(
            change.change_details.unwrap().added_property.as_deref(),
            Some("newProperty")
        );
        assert!(change.previous_value.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let change = NodeChange::new("n1", "user1", ChangeType::ChangeText)
            .with_property("title")
            .with_values(Some("Old".into()), Some("New".into()))
            .with_reasoning("typo");
        assert_eq!(change.modified_property.as_deref(), Some("title"));
        assert_eq!(change.new_value, Some(PropertyValue::Text("New".into())));
        assert_eq!(change.reasoning, "typo");
    }
}
