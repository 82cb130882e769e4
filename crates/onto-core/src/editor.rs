//! Ontology editor facade
//!
//! Ties the inheritance resolver, the change comparator and the change
//! recorder to a single store. Structural edits are validated against a
//! snapshot, committed through the resolver's batch writer, then recorded.

use crate::config::EditorConfig;
use crate::error::EditorError;
use onto_diff::{
    change_description, changes_from_diffs, comparable_properties, ChangeComparator,
    ChangeRecorder, Improvement, PropertyDiff, TITLE,
};
use onto_inheritance::{
    CascadeOutcome, GeneralizationOption, InheritanceError, InheritancePlanner, InheritanceResolver,
};
use onto_model::{
    collection_ids, ChangeLogId, ChangeType, Collection, FieldUpdate, Link, ModelError, Node,
    NodeChange, NodeGraph, NodeId, NodeUpdate, PropertyValue, GENERALIZATIONS, MAIN_COLLECTION,
    SPECIALIZATIONS,
};
use onto_store::{CachedTitleLookup, ChangeLogSink, ContributorSink, DocumentStore, TitleLookup};
use serde::Serialize;
use std::sync::Arc;

/// Everything the editor needs from its backing store
pub trait OntologyStore: DocumentStore + TitleLookup + ChangeLogSink + ContributorSink {}

impl<T: DocumentStore + TitleLookup + ChangeLogSink + ContributorSink + ?Sized> OntologyStore for T {}

/// Result of a consistency check over a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub nodes: usize,
    /// A node on a specialization cycle, if any
    pub cycle_through: Option<NodeId>,
    /// `(node, property)` pairs whose inheritance ref is invalid
    pub violations: Vec<(NodeId, String)>,
}

impl CheckReport {
    /// Build the report for a snapshot
    #[must_use]
    pub fn of(graph: &NodeGraph) -> Self {
        Self {
            nodes: graph.live_nodes().count(),
            cycle_through: match graph.check_acyclic() {
                Ok(()) => None,
                Err(ModelError::CyclicSnapshot(id)) => Some(id),
                Err(e) => {
                    tracing::warn!(error = %e, "unexpected acyclicity check failure");
                    None
                }
            },
            violations: graph.inheritance_violations(),
        }
    }

    /// Whether the snapshot is consistent
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.cycle_through.is_none() && self.violations.is_empty()
    }
}

/// Outcome of a structural or property edit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    /// Committed cascade, edited nodes last
    pub cascade: CascadeOutcome,
    /// Change-log entries written
    pub changes: Vec<ChangeLogId>,
}

/// Outcome of accepting an improvement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedImprovement {
    /// Differences applied
    pub diffs: Vec<PropertyDiff>,
    /// Properties left out of the improvement, kept as they were
    pub skipped: Vec<String>,
    pub commits: usize,
    pub nodes_updated: usize,
    pub changes: Vec<ChangeLogId>,
}

/// Inheritance-aware editor over one store
pub struct OntologyEditor<S: OntologyStore + 'static> {
    store: Arc<S>,
    config: EditorConfig,
    resolver: InheritanceResolver<S>,
    comparator: ChangeComparator<CachedTitleLookup<Arc<S>>>,
    recorder: ChangeRecorder<Arc<S>, Arc<S>>,
}

impl<S: OntologyStore + 'static> std::fmt::Debug for OntologyEditor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OntologyEditor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: OntologyStore + 'static> OntologyEditor<S> {
    /// Create editor over a store
    #[must_use]
    pub fn new(store: Arc<S>, config: EditorConfig) -> Self {
        let resolver = InheritanceResolver::new(Arc::clone(&store))
            .with_max_batch_mutations(config.store.max_batch_mutations);
        let titles = CachedTitleLookup::from_config(Arc::clone(&store), &config.store);
        let recorder = ChangeRecorder::new(Arc::clone(&store), Arc::clone(&store))
            .with_system_users(config.system_users.iter().cloned());
        Self {
            comparator: ChangeComparator::new(titles),
            store,
            config,
            resolver,
            recorder,
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Underlying inheritance resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &InheritanceResolver<S> {
        &self.resolver
    }

    async fn live_node(&self, id: &NodeId) -> Result<Node, EditorError> {
        match self.store.get(id).await? {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(EditorError::NodeNotFound(id.clone())),
        }
    }

    /// Check the stored graph for cycles and invalid inheritance refs
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be read
    pub async fn check(&self) -> Result<CheckReport, EditorError> {
        let graph = self.store.snapshot().await?;
        Ok(CheckReport::of(&graph))
    }

    /// Repoint a property to another generalization
    ///
    /// # Errors
    /// Returns error if the node is missing or a commit fails
    pub async fn change_inheritance(
        &self,
        node_id: &NodeId,
        property: &str,
        new_generalization: &NodeId,
    ) -> Result<CascadeOutcome, EditorError> {
        Ok(self
            .resolver
            .change_inheritance(node_id, property, new_generalization)
            .await?)
    }

    /// Set a property locally, breaking its inheritance, and log the edit
    ///
    /// # Errors
    /// Returns error if the node is missing or a commit fails
    pub async fn edit_property(
        &self,
        node_id: &NodeId,
        property: &str,
        value: PropertyValue,
        actor: &str,
    ) -> Result<EditOutcome, EditorError> {
        let before = self.live_node(node_id).await?;
        let cascade = self
            .resolver
            .break_inheritance(node_id, property, value.clone())
            .await?;
        let after = self.live_node(node_id).await?;
        let change = NodeChange::new(node_id.clone(), actor, ChangeType::ChangeText)
            .with_property(property)
            .with_values(before.properties.get(property).cloned(), Some(value))
            .with_full_node(after);
        let changes = self.recorder.record_all([change]).await;
        Ok(EditOutcome { cascade, changes })
    }

    /// Add a specialization edge and propagate newly reachable properties
    ///
    /// # Errors
    /// Returns error if either node is missing, the edge would close a
    /// cycle, or a commit fails
    pub async fn link(
        &self,
        generalization: &NodeId,
        specialization: &NodeId,
        collection: &str,
        actor: &str,
    ) -> Result<EditOutcome, EditorError> {
        let mut graph = self.store.snapshot().await?;
        let previous = specializations_value(&graph, generalization);
        let edits = [EdgeEdit::Link {
            generalization: generalization.clone(),
            specialization: specialization.clone(),
            collection: collection.to_string(),
        }];
        apply_edges(&mut graph, &edits)?;

        let plan = plan_edges(&mut graph, &edits, None)?;
        let cascade = self.resolver.commit(plan).await?;
        tracing::info!(%generalization, %specialization, collection, nodes = cascade.nodes_updated(), "linked");

        let change = self
            .edge_change(generalization, ChangeType::AddElement, previous, actor)
            .await?;
        let changes = self.recorder.record_all([change]).await;
        Ok(EditOutcome { cascade, changes })
    }

    /// Remove a specialization edge and reconcile inheritance
    ///
    /// # Errors
    /// Returns error if either node is missing or a commit fails
    pub async fn unlink(
        &self,
        generalization: &NodeId,
        specialization: &NodeId,
        actor: &str,
    ) -> Result<EditOutcome, EditorError> {
        let mut graph = self.store.snapshot().await?;
        let previous = specializations_value(&graph, generalization);
        let edits = [EdgeEdit::Unlink {
            generalization: generalization.clone(),
            specialization: specialization.clone(),
        }];
        apply_edges(&mut graph, &edits)?;

        let plan = plan_edges(&mut graph, &edits, None)?;
        let cascade = self.resolver.commit(plan).await?;
        tracing::info!(%generalization, %specialization, nodes = cascade.nodes_updated(), "unlinked");

        let change = self
            .edge_change(generalization, ChangeType::RemoveElement, previous, actor)
            .await?;
        let changes = self.recorder.record_all([change]).await;
        Ok(EditOutcome { cascade, changes })
    }

    /// Replace one link list of a node, linking and unlinking the nodes on
    /// the other side so both directions stay in step
    async fn relink(
        &self,
        node_id: &NodeId,
        property: &str,
        target: Vec<Collection>,
    ) -> Result<CascadeOutcome, EditorError> {
        let mut graph = self.store.snapshot().await?;
        let node = graph
            .live(node_id.as_str())
            .ok_or_else(|| EditorError::NodeNotFound(node_id.clone()))?;
        let edits = relink_edits(node, property, &target);
        apply_edges(&mut graph, &edits)?;
        if let Some(node) = graph.get_mut(node_id.as_str()) {
            node.apply(&link_list_field(property, target));
        }

        let plan = plan_edges(&mut graph, &edits, Some(node_id))?;
        let cascade = self.resolver.commit(plan).await?;
        tracing::info!(node = %node_id, property, edges = edits.len(), nodes = cascade.nodes_updated(), "relinked");
        Ok(cascade)
    }

    async fn retitle(&self, node: &Node, title: &str) -> Result<CascadeOutcome, EditorError> {
        let update = NodeUpdate::new(node.id.clone()).with(FieldUpdate::SetTitle {
            title: title.to_string(),
        });
        let cascade = self.resolver.commit(vec![update]).await?;
        self.comparator.lookup().invalidate(&node.title).await;
        Ok(cascade)
    }

    async fn edge_change(
        &self,
        generalization: &NodeId,
        change_type: ChangeType,
        previous: Option<PropertyValue>,
        actor: &str,
    ) -> Result<NodeChange, EditorError> {
        let after = self.live_node(generalization).await?;
        let new = Some(PropertyValue::Collections(after.specializations.clone()));
        Ok(NodeChange::new(generalization.clone(), actor, change_type)
            .with_property(SPECIALIZATIONS)
            .with_values(previous, new)
            .with_full_node(after))
    }

    /// Candidates for the inheritance-source selector, if one is needed
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be read
    pub async fn displayable_generalizations(
        &self,
        node_id: &NodeId,
        property: &str,
    ) -> Result<Option<Vec<GeneralizationOption>>, EditorError> {
        Ok(self
            .resolver
            .resolve_displayable_generalizations(node_id, property)
            .await?)
    }

    /// Whether deleting a node would leave a specialization without a
    /// generalization
    ///
    /// # Errors
    /// Returns error if the snapshot cannot be read
    pub async fn would_orphan_specializations(&self, node_id: &NodeId) -> Result<bool, EditorError> {
        Ok(self.resolver.would_orphan_specializations(node_id).await?)
    }

    /// Differences between a stored node and an improvement
    ///
    /// Link lists are compared from the node's own fields. Properties the
    /// improvement leaves out are reported with no new value.
    ///
    /// # Errors
    /// Returns error if the node is missing or a title lookup fails
    pub async fn compare(
        &self,
        node_id: &NodeId,
        improvement: &Improvement,
    ) -> Result<Vec<PropertyDiff>, EditorError> {
        let node = self.live_node(node_id).await?;
        self.diff_node(&node, improvement).await
    }

    async fn diff_node(
        &self,
        node: &Node,
        improvement: &Improvement,
    ) -> Result<Vec<PropertyDiff>, EditorError> {
        let proposed = improvement.proposed_properties();
        let mut live = comparable_properties(node);
        if !proposed.contains_key(TITLE) {
            live.shift_remove(TITLE);
        }
        Ok(self.comparator.compare_properties(&live, &proposed, None).await?)
    }

    /// Apply an improvement and log one change per applied difference
    ///
    /// Set values break inheritance on the node. Link-list differences add
    /// and remove edges on both sides and propagate inheritance like
    /// [`link`](Self::link) and [`unlink`](Self::unlink). A property is only
    /// removed when the improvement clears it with `null`; properties it
    /// leaves out are kept and listed as skipped.
    ///
    /// # Errors
    /// Returns error if the node is missing, a title lookup fails, an edge
    /// is rejected, or a commit fails. Properties written before a failure
    /// stay written.
    pub async fn accept_improvement(
        &self,
        node_id: &NodeId,
        improvement: &Improvement,
        actor: &str,
    ) -> Result<AcceptedImprovement, EditorError> {
        let node = self.live_node(node_id).await?;
        let diffs = self.diff_node(&node, improvement).await?;

        let mut accepted = AcceptedImprovement::default();
        for diff in diffs {
            let property = diff.modified_property.as_str();
            if diff.new_value.is_none() && !improvement.clears(property) {
                tracing::debug!(node = %node_id, property, "left out of the improvement, kept");
                accepted.skipped.push(diff.modified_property.clone());
                continue;
            }
            let outcome = match (property, &diff.new_value) {
                (TITLE, Some(PropertyValue::Text(title))) => self.retitle(&node, title).await?,
                (TITLE, _) => {
                    tracing::warn!(node = %node_id, "title cannot be cleared");
                    accepted.skipped.push(diff.modified_property.clone());
                    continue;
                }
                (SPECIALIZATIONS | GENERALIZATIONS, value) => {
                    let target = value
                        .as_ref()
                        .and_then(PropertyValue::as_collections)
                        .map(<[Collection]>::to_vec)
                        .unwrap_or_default();
                    self.relink(node_id, property, target).await?
                }
                (_, Some(value)) => {
                    self.resolver
                        .break_inheritance(node_id, property, value.clone())
                        .await?
                }
                (_, None) => {
                    let removal = NodeUpdate::new(node_id.clone()).with(FieldUpdate::RemoveProperty {
                        property: property.to_string(),
                    });
                    self.resolver.commit(vec![removal]).await?
                }
            };
            accepted.commits += outcome.commits;
            accepted.nodes_updated += outcome.nodes_updated();
            accepted.diffs.push(diff);
        }

        let changes = changes_from_diffs(&node, &accepted.diffs, actor, &improvement.reasoning);
        accepted.changes = self.recorder.record_all(changes).await;
        tracing::info!(node = %node_id, diffs = accepted.diffs.len(), skipped = accepted.skipped.len(), commits = accepted.commits, "improvement accepted");
        Ok(accepted)
    }

    /// Phrase for a change-log entry
    #[must_use]
    pub fn describe(&self, change: &NodeChange) -> String {
        change_description(change, &change.modified_by)
    }
}

fn specializations_value(graph: &NodeGraph, id: &NodeId) -> Option<PropertyValue> {
    graph
        .get(id.as_str())
        .map(|n| PropertyValue::Collections(n.specializations.clone()))
}

/// One specialization edge to add or remove
#[derive(Debug, Clone, PartialEq)]
enum EdgeEdit {
    Link {
        generalization: NodeId,
        specialization: NodeId,
        collection: String,
    },
    Unlink {
        generalization: NodeId,
        specialization: NodeId,
    },
}

impl EdgeEdit {
    fn endpoints(&self) -> [&NodeId; 2] {
        match self {
            Self::Link {
                generalization,
                specialization,
                ..
            }
            | Self::Unlink {
                generalization,
                specialization,
            } => [generalization, specialization],
        }
    }

    fn apply(&self, graph: &mut NodeGraph) -> Result<(), ModelError> {
        match self {
            Self::Link {
                generalization,
                specialization,
                collection,
            } => graph.link(generalization.as_str(), specialization.as_str(), collection),
            Self::Unlink {
                generalization,
                specialization,
            } => graph.unlink(generalization.as_str(), specialization.as_str()),
        }
    }

    /// Inheritance writes for the edit, against a graph that already has it
    fn plan(&self, graph: &NodeGraph) -> Result<Vec<NodeUpdate>, InheritanceError> {
        let planner = InheritancePlanner::new(graph);
        match self {
            Self::Link {
                generalization,
                specialization,
                ..
            } => planner.link_generalizations(specialization, &[Link::new(generalization.clone())]),
            Self::Unlink {
                generalization,
                specialization,
            } => planner.unlink_generalization(specialization, generalization),
        }
    }
}

/// Edges that turn `node`'s `property` link list into `target`
///
/// Removals come first. Generalizations gained this way are filed under
/// [`MAIN_COLLECTION`] on the other side.
fn relink_edits(node: &Node, property: &str, target: &[Collection]) -> Vec<EdgeEdit> {
    let downward = property == SPECIALIZATIONS;
    let current = if downward {
        &node.specializations
    } else {
        &node.generalizations
    };
    let before = collection_ids(current);
    let after = collection_ids(target);
    let ends = |other: &NodeId| {
        if downward {
            (node.id.clone(), other.clone())
        } else {
            (other.clone(), node.id.clone())
        }
    };

    let mut edits = Vec::new();
    for id in before.iter().filter(|id| !after.contains(*id)) {
        let (generalization, specialization) = ends(id);
        edits.push(EdgeEdit::Unlink {
            generalization,
            specialization,
        });
    }
    let mut added: Vec<&NodeId> = Vec::new();
    for collection in target {
        for id in collection.ids() {
            if before.contains(&id) || added.contains(&id) {
                continue;
            }
            added.push(id);
            let (generalization, specialization) = ends(id);
            let collection = if downward {
                collection.collection_name.clone()
            } else {
                MAIN_COLLECTION.to_string()
            };
            edits.push(EdgeEdit::Link {
                generalization,
                specialization,
                collection,
            });
        }
    }
    edits
}

fn link_list_field(property: &str, collections: Vec<Collection>) -> FieldUpdate {
    if property == SPECIALIZATIONS {
        FieldUpdate::SetSpecializations { collections }
    } else {
        FieldUpdate::SetGeneralizations { collections }
    }
}

fn apply_edges(graph: &mut NodeGraph, edits: &[EdgeEdit]) -> Result<(), ModelError> {
    edits.iter().try_for_each(|edit| edit.apply(graph))
}

/// Writes for edges already applied to `graph`
///
/// Link lists of `pinned` and of every edge endpoint come first, as they
/// stand in `graph`, then each edge's inheritance plan in order. `graph`
/// ends in the planned state.
fn plan_edges(
    graph: &mut NodeGraph,
    edits: &[EdgeEdit],
    pinned: Option<&NodeId>,
) -> Result<Vec<NodeUpdate>, EditorError> {
    let mut touched: Vec<&NodeId> = pinned.into_iter().collect();
    for id in edits.iter().flat_map(EdgeEdit::endpoints) {
        if !touched.contains(&id) {
            touched.push(id);
        }
    }

    let mut plan: Vec<NodeUpdate> = touched
        .iter()
        .filter_map(|id| {
            graph.get(id.as_str()).map(|node| {
                NodeUpdate::new((*id).clone())
                    .with(FieldUpdate::SetSpecializations {
                        collections: node.specializations.clone(),
                    })
                    .with(FieldUpdate::SetGeneralizations {
                        collections: node.generalizations.clone(),
                    })
            })
        })
        .collect();
    for edit in edits {
        let step = edit.plan(graph)?;
        graph.apply(&step);
        plan.extend(step);
    }
    Ok(plan)
}
