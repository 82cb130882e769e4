//! Pure inheritance plans over a snapshot
//!
//! Each structural edit becomes a [`Cascade`]: explicit fields on the edited
//! node and rules for its descendants. Nothing here touches a store.

use crate::cascade::{adopt_fields, can_adopt, Cascade, CascadeRule};
use crate::error::InheritanceError;
use crate::propagator::PropertyPropagator;
use onto_model::{FieldUpdate, Link, Node, NodeGraph, NodeId, NodeUpdate, PropertyValue};
use serde::Serialize;

/// Longest title shown untruncated in the source selector
const MAX_TITLE_CHARS: usize = 25;
/// Characters kept when a title is truncated
const TRUNCATED_TITLE_CHARS: usize = 22;

/// Generalization offered as an inheritance source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneralizationOption {
    pub id: NodeId,
    pub title: String,
}

impl GeneralizationOption {
    /// Display title, truncated with `...` past 25 characters
    #[must_use]
    pub fn short_title(&self) -> String {
        if self.title.chars().count() > MAX_TITLE_CHARS {
            let head: String = self.title.chars().take(TRUNCATED_TITLE_CHARS).collect();
            format!("{head}...")
        } else {
            self.title.clone()
        }
    }
}

/// Plans inheritance edits against one snapshot
#[derive(Debug, Clone, Copy)]
pub struct InheritancePlanner<'g> {
    graph: &'g NodeGraph,
}

impl<'g> InheritancePlanner<'g> {
    /// Create planner over a snapshot
    #[inline]
    #[must_use]
    pub fn new(graph: &'g NodeGraph) -> Self {
        Self { graph }
    }

    fn node(&self, id: &NodeId) -> Result<&'g Node, InheritanceError> {
        self.graph
            .live(id.as_str())
            .ok_or_else(|| InheritanceError::NodeNotFound(id.clone()))
    }

    /// Repoint `property` of `node_id` to `new_generalization`
    ///
    /// Live descendants whose ref is the old source, or the node itself, move
    /// along. Empty when the ref already matches or the property is
    /// `neverInherit`.
    ///
    /// # Errors
    /// Returns error if the node is missing or deleted
    pub fn change_inheritance(
        &self,
        node_id: &NodeId,
        property: &str,
        new_generalization: &NodeId,
    ) -> Result<Vec<NodeUpdate>, InheritanceError> {
        let node = self.node(node_id)?;
        if node.never_inherits(property) {
            tracing::debug!(node = %node_id, property, "neverInherit property, repoint ignored");
            return Ok(Vec::new());
        }
        let old = node.inheritance_ref(property);
        if old == Some(new_generalization) {
            return Ok(Vec::new());
        }

        let mut from = vec![node.id.clone()];
        from.extend(old.cloned());
        Ok(Cascade::new(self.graph, node_id)
            .with_root(FieldUpdate::SetInheritanceRef {
                property: property.to_owned(),
                source: Some(new_generalization.clone()),
            })
            .with_rule(CascadeRule::Repoint {
                property: property.to_owned(),
                from,
                to: new_generalization.clone(),
            })
            .plan())
    }

    /// Overwrite an inherited value locally, making the node its owner
    ///
    /// Descendants that read the value through the node's old source now
    /// read it through the node.
    ///
    /// # Errors
    /// Returns error if the node is missing or deleted
    pub fn break_inheritance(
        &self,
        node_id: &NodeId,
        property: &str,
        value: PropertyValue,
    ) -> Result<Vec<NodeUpdate>, InheritanceError> {
        let node = self.node(node_id)?;
        let previous = node.inheritance_ref(property).cloned();

        let mut cascade = Cascade::new(self.graph, node_id);
        if previous.is_some() || node.rule(property).is_none() {
            cascade = cascade.with_root(FieldUpdate::SetInheritanceRef {
                property: property.to_owned(),
                source: None,
            });
        }
        cascade = cascade.with_root(FieldUpdate::SetProperty {
            property: property.to_owned(),
            value,
        });
        if let Some(previous) = previous {
            cascade = cascade.with_rule(CascadeRule::Repoint {
                property: property.to_owned(),
                from: vec![previous],
                to: node.id.clone(),
            });
        }
        Ok(cascade.plan())
    }

    /// Reconcile inheritance after `unlinked` was removed from the
    /// specialization's generalizations
    ///
    /// Properties inherited through the unlinked node are repointed to the
    /// first remaining generalization that has them, or removed. Properties
    /// of the first remaining generalization that the specialization lacks
    /// are adopted. No-op when no generalization remains.
    ///
    /// # Errors
    /// Returns error if the specialization is missing or deleted
    pub fn unlink_generalization(
        &self,
        specialization_id: &NodeId,
        unlinked: &NodeId,
    ) -> Result<Vec<NodeUpdate>, InheritanceError> {
        let spec = self.node(specialization_id)?;
        let remaining: Vec<&Node> = spec
            .generalization_ids()
            .into_iter()
            .filter(|id| *id != unlinked)
            .filter_map(|id| self.graph.live(id.as_str()))
            .collect();
        let Some(next) = remaining.first() else {
            tracing::info!(node = %specialization_id, "no generalization left, inheritance kept");
            return Ok(Vec::new());
        };
        let unlinked_node = self.graph.get(unlinked.as_str());

        let mut cascade = Cascade::new(self.graph, specialization_id);
        for (property, rule) in &spec.inheritance {
            let Some(current) = &rule.source else {
                continue;
            };
            let through_unlinked = current == unlinked
                || unlinked_node.and_then(|n| n.inheritance_ref(property)) == Some(current);
            if !through_unlinked {
                continue;
            }

            let replacement = remaining
                .iter()
                .find(|g| g.has_property(property))
                .and_then(|g| self.graph.effective_source(g.id.as_str(), property));
            match replacement {
                Some(source) if source == *current => {}
                Some(source) => {
                    cascade = cascade
                        .with_root(FieldUpdate::SetInheritanceRef {
                            property: property.clone(),
                            source: Some(source.clone()),
                        })
                        .with_rule(CascadeRule::Repoint {
                            property: property.clone(),
                            from: vec![current.clone()],
                            to: source,
                        });
                }
                None => {
                    cascade = cascade
                        .with_root(FieldUpdate::RemoveProperty {
                            property: property.clone(),
                        })
                        .with_rule(CascadeRule::Remove {
                            property: property.clone(),
                            from: vec![current.clone()],
                        });
                }
            }
        }

        for (property, value) in &next.properties {
            if !can_adopt(spec, property) {
                continue;
            }
            let source = next
                .inheritance_ref(property)
                .cloned()
                .unwrap_or_else(|| next.id.clone());
            let property_type = next.property_type.get(property).cloned();
            cascade = cascade
                .with_root_fields(adopt_fields(
                    property,
                    &source,
                    property_type.as_ref(),
                    value,
                ))
                .with_rule(CascadeRule::Adopt {
                    property: property.clone(),
                    source,
                    property_type,
                    value: value.clone(),
                });
        }
        Ok(cascade.plan())
    }

    /// Adopt the properties newly reachable through `added` generalizations
    ///
    /// # Errors
    /// Returns error if the specialization is missing or deleted
    pub fn link_generalizations(
        &self,
        specialization_id: &NodeId,
        added: &[Link],
    ) -> Result<Vec<NodeUpdate>, InheritanceError> {
        let spec = self.node(specialization_id)?;
        let new_properties =
            PropertyPropagator::new(self.graph).get_new_added_properties(added, Some(spec));

        let mut cascade = Cascade::new(self.graph, specialization_id);
        for (source, properties) in new_properties {
            for property in properties {
                if spec.never_inherits(&property.property_name) {
                    continue;
                }
                cascade = cascade
                    .with_root_fields(adopt_fields(
                        &property.property_name,
                        &source,
                        property.property_type.as_ref(),
                        &property.property_value,
                    ))
                    .with_rule(CascadeRule::Adopt {
                        property: property.property_name,
                        source: source.clone(),
                        property_type: property.property_type,
                        value: property.property_value,
                    });
            }
        }
        Ok(cascade.plan())
    }

    /// Generalizations to offer as sources for `property`
    ///
    /// `None` when no selector should be shown: the node is missing, the
    /// property is `neverInherit`, there are fewer than two candidates, the
    /// property is owned locally, or its ref matches no candidate.
    #[must_use]
    pub fn displayable_generalizations(
        &self,
        node_id: &NodeId,
        property: &str,
    ) -> Option<Vec<GeneralizationOption>> {
        let node = self.graph.live(node_id.as_str())?;
        if node.never_inherits(property) {
            return None;
        }
        let candidates: Vec<&Node> = node
            .generalization_ids()
            .into_iter()
            .filter_map(|id| self.graph.live(id.as_str()))
            .collect();
        if candidates.len() <= 1 {
            return None;
        }
        let current = node.inheritance_ref(property)?;
        let matches = candidates
            .iter()
            .any(|c| c.id == *current || c.inheritance_ref(property) == Some(current));
        if !matches {
            return None;
        }
        Some(
            candidates
                .into_iter()
                .map(|c| GeneralizationOption {
                    id: c.id.clone(),
                    title: c.title.clone(),
                })
                .collect(),
        )
    }

    /// Whether deleting the node would leave a specialization without any
    /// generalization
    #[must_use]
    pub fn would_orphan_specializations(&self, node_id: &NodeId) -> bool {
        let Some(node) = self.graph.live(node_id.as_str()) else {
            return false;
        };
        node.specialization_ids()
            .into_iter()
            .filter_map(|id| self.graph.live(id.as_str()))
            .any(|spec| spec.generalization_ids().len() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onto_model::{InheritanceRule, NodeType, PropertyType};
    use pretty_assertions::assert_eq;

    fn node(id: &str) -> Node {
        Node::new(id, id.to_uppercase(), NodeType::Activity)
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    /// g1 and g2 both own description; n inherits from g1; n -> c1 -> c2
    /// inherit from g1 too, c3 (under n) overrides.
    fn diamond() -> NodeGraph {
        let mut graph = NodeGraph::from_nodes([
            node("g1").with_property("description", "string", "from g1"),
            node("g2").with_property("description", "string", "from g2"),
            node("n").inheriting("description", "g1"),
            node("c1").inheriting("description", "g1"),
            node("c2").inheriting("description", "g1"),
            node("c3").with_property("description", "string", "own"),
        ]);
        graph.link("g1", "n", "main").unwrap();
        graph.link("g2", "n", "main").unwrap();
        graph.link("n", "c1", "main").unwrap();
        graph.link("c1", "c2", "main").unwrap();
        graph.link("n", "c3", "main").unwrap();
        graph
    }

    #[test]
    fn change_inheritance_repoints_node_and_dependents() {
        let graph = diamond();
        let plan = InheritancePlanner::new(&graph)
            .change_inheritance(&id("n"), "description", &id("g2"))
            .unwrap();
        let next = graph.with_updates(&plan);

        for n in ["n", "c1", "c2"] {
            assert_eq!(
                next.get(n).unwrap().inheritance_ref("description"),
                Some(&id("g2")),
                "{n}"
            );
        }
        assert_eq!(next.get("c3").unwrap().inheritance_ref("description"), None);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn change_inheritance_no_ops() {
        let graph = diamond();
        let planner = InheritancePlanner::new(&graph);
        assert!(planner
            .change_inheritance(&id("n"), "description", &id("g1"))
            .unwrap()
            .is_empty());

        let mut graph = diamond();
        graph.insert(node("n").with_rule("description", InheritanceRule::never()));
        let planner = InheritancePlanner::new(&graph);
        assert!(planner
            .change_inheritance(&id("n"), "description", &id("g2"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn change_inheritance_on_owner_moves_readers() {
        let graph = diamond();
        let plan = InheritancePlanner::new(&graph)
            .change_inheritance(&id("g1"), "description", &id("g2"))
            .unwrap();
        let next = graph.with_updates(&plan);
        assert_eq!(
            next.get("g1").unwrap().inheritance_ref("description"),
            Some(&id("g2"))
        );
        assert_eq!(
            next.get("c2").unwrap().inheritance_ref("description"),
            Some(&id("g2"))
        );
    }

    #[test]
    fn change_inheritance_missing_node() {
        let graph = diamond();
        let err = InheritancePlanner::new(&graph)
            .change_inheritance(&id("ghost"), "description", &id("g2"))
            .unwrap_err();
        assert!(matches!(err, InheritanceError::NodeNotFound(n) if n == "ghost"));
    }

    #[test]
    fn break_inheritance_makes_node_owner() {
        let graph = diamond();
        let plan = InheritancePlanner::new(&graph)
            .break_inheritance(&id("n"), "description", "mine".into())
            .unwrap();
        let next = graph.with_updates(&plan);

        let n = next.get("n").unwrap();
        assert_eq!(n.inheritance_ref("description"), None);
        assert_eq!(n.properties["description"], PropertyValue::from("mine"));
        assert_eq!(
            next.get("c2").unwrap().inheritance_ref("description"),
            Some(&id("n"))
        );
        assert_eq!(
            next.resolve_value("c2", "description"),
            Some(&PropertyValue::from("mine"))
        );
    }

    #[test]
    fn unlink_repoints_to_remaining_generalization() {
        let mut graph = diamond();
        graph.unlink("g1", "n").unwrap();
        let plan = InheritancePlanner::new(&graph)
            .unlink_generalization(&id("n"), &id("g1"))
            .unwrap();
        let next = graph.with_updates(&plan);
        for n in ["n", "c1", "c2"] {
            assert_eq!(
                next.get(n).unwrap().inheritance_ref("description"),
                Some(&id("g2"))
            );
        }
    }

    #[test]
    fn unlink_removes_when_no_remaining_source() {
        let mut graph = diamond();
        graph.insert(
            node("g1")
                .with_property("description", "string", "from g1")
                .with_property("notes", "string", "only g1"),
        );
        graph.link("g1", "n", "main").unwrap();
        graph.insert(
            graph
                .get("n")
                .unwrap()
                .clone()
                .with_property("notes", "string", "only g1")
                .inheriting("notes", "g1"),
        );
        graph.unlink("g1", "n").unwrap();

        let plan = InheritancePlanner::new(&graph)
            .unlink_generalization(&id("n"), &id("g1"))
            .unwrap();
        let next = graph.with_updates(&plan);
        assert!(!next.get("n").unwrap().has_property("notes"));
        assert!(!next.get("n").unwrap().inheritance.contains_key("notes"));
    }

    #[test]
    fn unlink_adopts_from_first_remaining() {
        let mut graph = diamond();
        graph.insert(
            node("g2")
                .with_property("description", "string", "from g2")
                .with_property("size", PropertyType::Number, 4.0),
        );
        graph.unlink("g1", "n").unwrap();

        let plan = InheritancePlanner::new(&graph)
            .unlink_generalization(&id("n"), &id("g1"))
            .unwrap();
        let next = graph.with_updates(&plan);
        for n in ["n", "c1", "c2", "c3"] {
            let node = next.get(n).unwrap();
            assert_eq!(node.inheritance_ref("size"), Some(&id("g2")), "{n}");
            assert_eq!(node.properties["size"], PropertyValue::Number(4.0));
        }
    }

    #[test]
    fn unlink_without_remaining_generalization_is_noop() {
        let mut graph = diamond();
        graph.unlink("g1", "n").unwrap();
        graph.unlink("g2", "n").unwrap();
        let plan = InheritancePlanner::new(&graph)
            .unlink_generalization(&id("n"), &id("g1"))
            .unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn link_adopts_down_the_subtree() {
        let mut graph = diamond();
        graph.insert(node("extra").with_property("size", PropertyType::Number, 9.0));
        graph.link("extra", "n", "main").unwrap();

        let plan = InheritancePlanner::new(&graph)
            .link_generalizations(&id("n"), &[Link::new("extra")])
            .unwrap();
        let next = graph.with_updates(&plan);
        for n in ["n", "c1", "c2", "c3"] {
            assert_eq!(
                next.get(n).unwrap().inheritance_ref("size"),
                Some(&id("extra")),
                "{n}"
            );
        }
        assert_eq!(
            next.get("n").unwrap().property_type["size"],
            PropertyType::Number
        );
    }

    #[test]
    fn displayable_generalizations_rules() {
        let graph = diamond();
        let planner = InheritancePlanner::new(&graph);
        let options = planner
            .displayable_generalizations(&id("n"), "description")
            .unwrap();
        let ids: Vec<_> = options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2"]);

        // single generalization
        assert!(planner
            .displayable_generalizations(&id("c1"), "description")
            .is_none());
        // owned locally
        assert!(planner
            .displayable_generalizations(&id("g1"), "description")
            .is_none());
    }

    #[test]
    fn displayable_generalizations_hidden_on_mismatch() {
        let mut graph = diamond();
        graph.insert(
            graph
                .get("n")
                .unwrap()
                .clone()
                .inheriting("description", "elsewhere"),
        );
        assert!(InheritancePlanner::new(&graph)
            .displayable_generalizations(&id("n"), "description")
            .is_none());
    }

    #[test]
    fn short_title_truncates_long_titles() {
        let option = GeneralizationOption {
            id: id("x"),
            title: "Destroy a physical object forever".into(),
        };
        assert_eq!(option.short_title(), "Destroy a physical obj...");

        let exact = GeneralizationOption {
            id: id("y"),
            title: "a".repeat(25),
        };
        assert_eq!(exact.short_title(), "a".repeat(25));
    }

    #[test]
    fn orphan_check() {
        let graph = diamond();
        let planner = InheritancePlanner::new(&graph);
        // c1 has only n
        assert!(planner.would_orphan_specializations(&id("n")));
        // n also has g2
        assert!(!planner.would_orphan_specializations(&id("g1")));
    }
}
