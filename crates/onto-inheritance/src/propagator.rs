//! Property propagation for newly added generalization links
//!
//! When a specialization gains generalizations it picks up every property it
//! does not already have locally. Each picked-up property is attributed to
//! the generalization's effective source, so long inheritance chains keep a
//! single owner.

use crate::error::PropagationError;
use indexmap::IndexMap;
use onto_model::{Link, Node, NodeGraph, NodeId, PropertyType, PropertyValue};
use serde::Serialize;

/// Property a specialization should newly inherit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProperty {
    pub property_name: String,
    pub property_type: Option<PropertyType>,
    pub property_value: PropertyValue,
}

/// New properties grouped by the node that owns their value
pub type NewProperties = IndexMap<NodeId, Vec<NewProperty>>;

/// Computes inherited properties over a snapshot
#[derive(Debug, Clone, Copy)]
pub struct PropertyPropagator<'g> {
    graph: &'g NodeGraph,
}

impl<'g> PropertyPropagator<'g> {
    /// Create propagator over a snapshot
    #[inline]
    #[must_use]
    pub fn new(graph: &'g NodeGraph) -> Self {
        Self { graph }
    }

    /// Properties `specialization` should newly inherit through `added`
    ///
    /// Never fails: internal errors are logged and yield an empty map.
    #[must_use]
    pub fn get_new_added_properties(
        &self,
        added: &[Link],
        specialization: Option<&Node>,
    ) -> NewProperties {
        match self.try_new_added_properties(added, specialization) {
            Ok(properties) => properties,
            Err(e) => {
                tracing::error!(error = %e, "property propagation failed, nothing inherited");
                NewProperties::new()
            }
        }
    }

    /// Fallible form of [`Self::get_new_added_properties`]
    ///
    /// Links to missing or deleted nodes are skipped. A property offered by
    /// several links is attributed to the first.
    ///
    /// # Errors
    /// Returns error if a link names the specialization itself or one of its
    /// descendants.
    pub fn try_new_added_properties(
        &self,
        added: &[Link],
        specialization: Option<&Node>,
    ) -> Result<NewProperties, PropagationError> {
        let mut out = NewProperties::new();
        let Some(specialization) = specialization else {
            return Ok(out);
        };

        for link in added {
            if link.id == specialization.id {
                return Err(PropagationError::SelfLink(link.id.clone()));
            }
            if self
                .graph
                .is_descendant(specialization.id.as_str(), link.id.as_str())
            {
                return Err(PropagationError::CyclicLink {
                    generalization: link.id.clone(),
                    specialization: specialization.id.clone(),
                });
            }
            let Some(generalization) = self.graph.live(link.id.as_str()) else {
                tracing::debug!(link = %link.id, "added generalization missing or deleted, skipped");
                continue;
            };

            for (name, value) in &generalization.properties {
                if specialization.has_property(name) || already_offered(&out, name) {
                    continue;
                }
                let source = generalization
                    .inheritance_ref(name)
                    .cloned()
                    .unwrap_or_else(|| generalization.id.clone());
                out.entry(source).or_default().push(NewProperty {
                    property_name: name.clone(),
                    property_type: generalization.property_type.get(name).cloned(),
                    property_value: value.clone(),
                });
            }
        }
        Ok(out)
    }
}

fn already_offered(out: &NewProperties, name: &str) -> bool {
    out.values()
        .flatten()
        .any(|p| p.property_name == name)
}
