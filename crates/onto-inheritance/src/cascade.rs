//! Cascade planner
//!
//! Every structural edit reduces to explicit changes on one root node plus a
//! set of per-property rules evaluated against each live descendant of the
//! root. The walk is pure; the result is a list of [`NodeUpdate`]s,
//! descendants in depth-first pre-order, then the root. The root goes last
//! because every rule is derived from its current state: if a commit fails
//! part way, planning again from the same root yields the remaining work.

use onto_model::{FieldUpdate, Node, NodeGraph, NodeId, NodeUpdate, PropertyType, PropertyValue};

/// Per-property decision applied to descendants
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeRule {
    /// Move `ref` from any of `from` to `to`
    Repoint {
        property: String,
        from: Vec<NodeId>,
        to: NodeId,
    },
    /// Drop the property where `ref` is any of `from`
    Remove { property: String, from: Vec<NodeId> },
    /// Inherit the property from `source` where it is absent
    Adopt {
        property: String,
        source: NodeId,
        property_type: Option<PropertyType>,
        value: PropertyValue,
    },
}

impl CascadeRule {
    /// Property the rule governs
    #[inline]
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Repoint { property, .. }
            | Self::Remove { property, .. }
            | Self::Adopt { property, .. } => property,
        }
    }

    /// Field updates the rule produces on `node`
    #[must_use]
    pub fn fields_for(&self, node: &Node) -> Vec<FieldUpdate> {
        match self {
            Self::Repoint { property, from, to } => match node.inheritance_ref(property) {
                Some(current) if current != to && from.contains(current) => {
                    vec![FieldUpdate::SetInheritanceRef {
                        property: property.clone(),
                        source: Some(to.clone()),
                    }]
                }
                _ => Vec::new(),
            },
            Self::Remove { property, from } => match node.inheritance_ref(property) {
                Some(current) if from.contains(current) => {
                    vec![FieldUpdate::RemoveProperty {
                        property: property.clone(),
                    }]
                }
                _ => Vec::new(),
            },
            Self::Adopt {
                property,
                source,
                property_type,
                value,
            } => {
                if !can_adopt(node, property) {
                    return Vec::new();
                }
                adopt_fields(property, source, property_type.as_ref(), value)
            }
        }
    }
}

/// Whether `node` has neither a value nor a source for `property` and may
/// inherit it
#[must_use]
pub fn can_adopt(node: &Node, property: &str) -> bool {
    !node.has_property(property)
        && node.inheritance_ref(property).is_none()
        && !node.never_inherits(property)
}

/// Field updates that make a node inherit `property` from `source`
///
/// An existing rule keeps its inheritance type.
#[must_use]
pub fn adopt_fields(
    property: &str,
    source: &NodeId,
    property_type: Option<&PropertyType>,
    value: &PropertyValue,
) -> Vec<FieldUpdate> {
    let mut fields = vec![
        FieldUpdate::SetInheritanceRef {
            property: property.to_owned(),
            source: Some(source.clone()),
        },
        FieldUpdate::SetProperty {
            property: property.to_owned(),
            value: value.clone(),
        },
    ];
    if let Some(property_type) = property_type {
        fields.push(FieldUpdate::SetPropertyType {
            property: property.to_owned(),
            property_type: property_type.clone(),
        });
    }
    fields
}

/// Builder for one cascade over a snapshot
#[derive(Debug)]
pub struct Cascade<'g> {
    graph: &'g NodeGraph,
    root: NodeUpdate,
    rules: Vec<CascadeRule>,
}

impl<'g> Cascade<'g> {
    /// Create cascade rooted at `root`
    #[must_use]
    pub fn new(graph: &'g NodeGraph, root: &NodeId) -> Self {
        Self {
            graph,
            root: NodeUpdate::new(root.clone()),
            rules: Vec::new(),
        }
    }

    /// Explicit change on the root node
    #[must_use]
    pub fn with_root(mut self, field: FieldUpdate) -> Self {
        self.root.push(field);
        self
    }

    /// Explicit changes on the root node
    #[must_use]
    pub fn with_root_fields(mut self, fields: impl IntoIterator<Item = FieldUpdate>) -> Self {
        self.root.fields.extend(fields);
        self
    }

    /// Rule evaluated against every live descendant
    #[must_use]
    pub fn with_rule(mut self, rule: CascadeRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Whether the cascade changes nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.rules.is_empty()
    }

    /// Walk the snapshot and produce the updates
    #[must_use]
    pub fn plan(self) -> Vec<NodeUpdate> {
        let root_id = self.root.node_id.clone();
        let mut updates = Vec::new();
        if !self.rules.is_empty() {
            for id in self.graph.descendants(root_id.as_str()) {
                let Some(node) = self.graph.live(id.as_str()) else {
                    continue;
                };
                let mut update = NodeUpdate::new(id);
                for rule in &self.rules {
                    update.fields.extend(rule.fields_for(node));
                }
                if !update.is_empty() {
                    updates.push(update);
                }
            }
        }
        if !self.root.is_empty() {
            updates.push(self.root);
        }
        tracing::debug!(root = %root_id, rules = self.rules.len(), updates = updates.len(), "planned cascade");
        updates
    }
}
