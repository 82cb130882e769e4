//! Human-readable change-log phrases
//!
//! Phrases are meant to be framed by the caller with the actor and node
//! title, e.g. `"<actor> Updated \"description\" in: <title>"`.

use onto_model::{ChangeType, NodeChange};

/// Phrase describing a change-log entry
///
/// The actor's full name is accepted so call sites can pass the rendered
/// actor alongside the entry; it never appears in the phrase.
#[must_use]
pub fn change_description(change: &NodeChange, _modified_by_full_name: &str) -> String {
    let property = change.modified_property.as_deref().unwrap_or_default();

    match change.change_type {
        ChangeType::ChangeText => format!("Updated \"{property}\" in:"),
        ChangeType::AddCollection => "Added a new collection in:".to_string(),
        ChangeType::DeleteCollection => "Deleted a collection in:".to_string(),
        ChangeType::EditCollection => "Renamed a collection in:".to_string(),
        ChangeType::SortElements => format!("Sorted elements under \"{property}\" in:"),
        ChangeType::RemoveElement => format!("Removed a {} in:", element_name(property, true)),
        ChangeType::AddElement => format!("Added a new {} Under:", element_name(property, false)),
        ChangeType::AddElements => format!("Added \"{property}\" Under:"),
        ChangeType::RemoveElements => format!("Removed \"{property}\" Under:"),
        ChangeType::ModifyElements => "Modified the elements in:".to_string(),
        ChangeType::AddProperty => {
            let added = change
                .change_details
                .as_ref()
                .and_then(|d| d.added_property.as_deref())
                .unwrap_or_default();
            format!("Added \"{added}\" in:")
        }
        ChangeType::RemoveProperty => format!("Removed \"{property}\" in:"),
        ChangeType::DeleteNode => "Deleted the node:".to_string(),
        ChangeType::AddNode => "Added a new node titled:".to_string(),
        ChangeType::AddImages => "Added new \"Image\" in:".to_string(),
        ChangeType::RemoveImages => "Removed \"Image\" in:".to_string(),
        ChangeType::EditProperty => "Changed the name of a property in:".to_string(),
        ChangeType::ChangeSelectString => "Updated Most Efficiently Performed By in:".to_string(),
        ChangeType::SortCollections => "Reordered collections in:".to_string(),
        ChangeType::Unknown => "Made an unknown change to:".to_string(),
    }
}

fn element_name(property: &str, parts: bool) -> String {
    match property {
        "specializations" => "Specialization".to_string(),
        "generalizations" => "Generalization".to_string(),
        "parts" if parts => "Part".to_string(),
        other => capitalize(other),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onto_model::ChangeDetails;
    use pretty_assertions::assert_eq;

    fn describe(change_type: ChangeType, property: Option<&str>) -> String {
        let mut change = NodeChange::new("n1", "alice", change_type);
        change.modified_property = property.map(str::to_string);
        change_description(&change, "Alice Smith")
    }

    #[test]
    fn fixed_phrases() {
        let cases = [
            (ChangeType::ChangeText, Some("description"), "Updated \"description\" in:"),
            (ChangeType::AddCollection, None, "Added a new collection in:"),
            (ChangeType::DeleteCollection, None, "Deleted a collection in:"),
            (ChangeType::AddElement, Some("specializations"), "Added a new Specialization Under:"),
            (ChangeType::AddElement, Some("generalizations"), "Added a new Generalization Under:"),
            (ChangeType::AddNode, None, "Added a new node titled:"),
            (ChangeType::RemoveProperty, Some("size"), "Removed \"size\" in:"),
            (ChangeType::ModifyElements, Some("parts"), "Modified the elements in:"),
            (ChangeType::Unknown, Some("x"), "Made an unknown change to:"),
        ];
        for (change_type, property, expected) in cases {
            assert_eq!(describe(change_type, property), expected, "{change_type}");
        }
    }

    #[test]
    fn add_property_names_the_added_property() {
        let change = NodeChange::new("n1", "alice", ChangeType::AddProperty)
            .with_property("ignored")
            .with_details(ChangeDetails::added_property("color"));
        assert_eq!(change_description(&change, ""), "Added \"color\" in:");
    }

    #[test]
    fn element_phrases_capitalize_other_properties() {
        assert_eq!(describe(ChangeType::RemoveElement, Some("parts")), "Removed a Part in:");
        assert_eq!(describe(ChangeType::RemoveElement, Some("isPartOf")), "Removed a IsPartOf in:");
        assert_eq!(describe(ChangeType::AddElement, Some("parts")), "Added a new Parts Under:");
        assert_eq!(describe(ChangeType::SortElements, Some("parts")), "Sorted elements under \"parts\" in:");
        assert_eq!(describe(ChangeType::SortCollections, None), "Reordered collections in:");
    }

    #[test]
    fn unknown_wire_tag_renders_unknown_phrase() {
        let change: NodeChange = serde_json::from_str(
            r#"{"nodeId": "n1", "modifiedBy": "bob", "changeType": "rename universe"}"#,
        )
        .unwrap();
        assert_eq!(change_description(&change, "Bob"), "Made an unknown change to:");
    }

    #[test]
    fn actor_name_never_appears() {
        let text = describe(ChangeType::ChangeText, Some("title"));
        assert!(!text.contains("Alice"));
    }
}
