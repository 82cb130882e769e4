//! Turning accepted diffs into change-log entries

use crate::comparator::PropertyDiff;
use crate::proposal::TITLE;
use onto_model::{
    ChangeDetails, ChangeType, Collection, FieldUpdate, Node, NodeChange, NodeUpdate,
    PropertyValue, GENERALIZATIONS, SPECIALIZATIONS,
};

/// Change type recorded for an accepted diff
#[must_use]
pub fn change_type_of(diff: &PropertyDiff) -> ChangeType {
    if diff.is_relationship() {
        return ChangeType::ModifyElements;
    }
    match (&diff.previous_value, &diff.new_value) {
        (None, Some(_)) => ChangeType::AddProperty,
        (Some(_), None) => ChangeType::RemoveProperty,
        _ => ChangeType::ChangeText,
    }
}

fn link_list(value: Option<&PropertyValue>) -> Vec<Collection> {
    value
        .and_then(PropertyValue::as_collections)
        .map(<[Collection]>::to_vec)
        .unwrap_or_default()
}

/// Field updates that write accepted diffs onto the node
///
/// Title and link-list diffs write the node's own fields; a cleared title
/// is ignored.
#[must_use]
pub fn update_from_diffs(node: &Node, diffs: &[PropertyDiff]) -> NodeUpdate {
    let mut update = NodeUpdate::new(node.id.clone());
    for diff in diffs {
        let field = match (diff.modified_property.as_str(), &diff.new_value) {
            (TITLE, Some(PropertyValue::Text(title))) => FieldUpdate::SetTitle {
                title: title.clone(),
            },
            (TITLE, _) => continue,
            (SPECIALIZATIONS, value) => FieldUpdate::SetSpecializations {
                collections: link_list(value.as_ref()),
            },
            (GENERALIZATIONS, value) => FieldUpdate::SetGeneralizations {
                collections: link_list(value.as_ref()),
            },
            (property, Some(value)) => FieldUpdate::SetProperty {
                property: property.to_string(),
                value: value.clone(),
            },
            (property, None) => FieldUpdate::RemoveProperty {
                property: property.to_string(),
            },
        };
        update.push(field);
    }
    update
}

/// One change-log entry per accepted diff
///
/// Every entry carries a snapshot of the node with all diffs applied.
#[must_use]
pub fn changes_from_diffs(
    node: &Node,
    diffs: &[PropertyDiff],
    actor: &str,
    reasoning: &str,
) -> Vec<NodeChange> {
    let mut accepted = node.clone();
    accepted.apply_update(&update_from_diffs(node, diffs));

    diffs
        .iter()
        .map(|diff| {
            let change_type = change_type_of(diff);
            let change = NodeChange::new(node.id.clone(), actor, change_type)
                .with_property(diff.modified_property.clone())
                .with_values(diff.previous_value.clone(), diff.new_value.clone())
                .with_reasoning(reasoning)
                .with_full_node(accepted.clone());
            if change_type == ChangeType::AddProperty {
                change.with_details(ChangeDetails::added_property(diff.modified_property.clone()))
            } else {
                change
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::change_description;
    use onto_model::{Collection, NodeType, PropertyValue};
    use pretty_assertions::assert_eq;

    fn diff(property: &str, previous: Option<PropertyValue>, new: Option<PropertyValue>) -> PropertyDiff {
        PropertyDiff {
            modified_property: property.into(),
            previous_value: previous,
            new_value: new,
        }
    }

    #[test]
    fn each_diff_kind_maps_to_its_change_type() {
        let node = Node::new("n1", "Destroy", NodeType::Activity)
            .with_property("description", "string", "old")
            .with_property("notes", "string", "drop me");
        let diffs = vec![
            diff("description", Some("old".into()), Some("new".into())),
            diff("color", None, Some("red".into())),
            diff("notes", Some("drop me".into()), None),
            diff(
                "parts",
                Some(vec![Collection::main(["a"])].into()),
                Some(vec![Collection::main(["b"])].into()),
            ),
        ];

        let changes = changes_from_diffs(&node, &diffs, "alice", "clearer wording");
        let described: Vec<_> = changes.iter().map(|c| change_description(c, "Alice")).collect();
        assert_eq!(
            described,
            vec![
                "Updated \"description\" in:",
                "Added \"color\" in:",
                "Removed \"notes\" in:",
                "Modified the elements in:",
            ]
        );
        assert!(changes.iter().all(|c| c.modified_by == "alice" && c.reasoning == "clearer wording"));
    }

    #[test]
    fn snapshot_has_every_diff_applied() {
        let node = Node::new("n1", "Destroy", NodeType::Activity)
            .with_property("description", "string", "old")
            .with_property("notes", "string", "drop me");
        let diffs = vec![
            diff("description", Some("old".into()), Some("new".into())),
            diff("notes", Some("drop me".into()), None),
        ];
        let changes = changes_from_diffs(&node, &diffs, "alice", "");
        let snapshot = changes[0].full_node.as_deref().unwrap();
        assert_eq!(snapshot.properties["description"], PropertyValue::from("new"));
        assert!(!snapshot.has_property("notes"));
        assert_eq!(changes[0].full_node, changes[1].full_node);
    }

    #[test]
    fn link_list_diffs_write_link_fields() {
        let mut node = Node::new("n1", "Destroy", NodeType::Activity);
        node.specializations = vec![Collection::new("Destroy what?", ["n4"])];
        let grown = vec![Collection::new("Destroy what?", ["n4", "n6"])];
        let diffs = vec![
            diff(
                "specializations",
                Some(node.specializations.clone().into()),
                Some(grown.clone().into()),
            ),
            diff("title", Some("Destroy".into()), Some("Obliterate".into())),
        ];

        let changes = changes_from_diffs(&node, &diffs, "alice", "");
        let snapshot = changes[0].full_node.as_deref().unwrap();
        assert_eq!(snapshot.specializations, grown);
        assert_eq!(snapshot.title, "Obliterate");
        assert!(!snapshot.has_property("specializations"));
        assert!(!snapshot.has_property("title"));
        assert_eq!(changes[0].change_type, ChangeType::ModifyElements);
    }

    #[test]
    fn no_diffs_no_changes() {
        let node = Node::new("n1", "Destroy", NodeType::Activity);
        assert!(changes_from_diffs(&node, &[], "alice", "").is_empty());
        assert!(update_from_diffs(&node, &[]).is_empty());
    }
}
