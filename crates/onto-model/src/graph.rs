//! Immutable graph snapshot
//!
//! Provides [`NodeGraph`], an arena of nodes keyed by id. Walks are pure and
//! guard against cycles with an explicit path set: reaching a node that is
//! already on the current path is logged and not followed. Reaching a node a
//! second time through another branch (multiple inheritance) is silently
//! skipped.

use crate::error::ModelError;
use crate::ids::NodeId;
use crate::node::{Collection, Link, Node, PropertyValue, MAIN_COLLECTION};
use crate::update::NodeUpdate;
use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Walk direction over specialization edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Towards specializations
    Down,
    /// Towards generalizations
    Up,
}

/// Snapshot of the node collection, keyed by id in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeGraph {
    nodes: IndexMap<NodeId, Node>,
}

impl NodeGraph {
    /// Create empty snapshot
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build snapshot from nodes
    #[must_use]
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    /// Insert or replace a node
    pub fn insert(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Node by id, including soft-deleted nodes
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable node by id
    #[inline]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Node by id, skipping soft-deleted nodes
    #[inline]
    #[must_use]
    pub fn live(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id).filter(|n| !n.deleted)
    }

    /// Title of a live node
    #[inline]
    #[must_use]
    pub fn title_of(&self, id: &str) -> Option<&str> {
        self.live(id).map(|n| n.title.as_str())
    }

    /// Number of nodes, including soft-deleted ones
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Live nodes in insertion order
    pub fn live_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| !n.deleted)
    }

    /// Live nodes reachable through specializations, depth-first pre-order
    ///
    /// The start node is not included.
    #[must_use]
    pub fn descendants(&self, root: &str) -> Vec<NodeId> {
        self.walk(root, Direction::Down)
    }

    /// Live nodes reachable through generalizations, depth-first pre-order
    #[must_use]
    pub fn ancestors(&self, root: &str) -> Vec<NodeId> {
        self.walk(root, Direction::Up)
    }

    /// Whether `candidate` is reachable from `ancestor` through specializations
    #[must_use]
    pub fn is_descendant(&self, ancestor: &str, candidate: &str) -> bool {
        self.descendants(ancestor).iter().any(|id| id == candidate)
    }

    fn walk(&self, root: &str, direction: Direction) -> Vec<NodeId> {
        let mut order = Vec::new();
        let Some(node) = self.live(root) else {
            return order;
        };
        let mut visited: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = Vec::new();
        visited.insert(node.id.as_str());
        path.push(node.id.as_str());
        self.walk_from(node, direction, &mut visited, &mut path, &mut order);
        order
    }

    fn walk_from<'a>(
        &'a self,
        node: &'a Node,
        direction: Direction,
        visited: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<NodeId>,
    ) {
        let next = match direction {
            Direction::Down => node.specialization_ids(),
            Direction::Up => node.generalization_ids(),
        };
        for id in next {
            if path.contains(&id.as_str()) {
                tracing::warn!(from = %node.id, to = %id, "cycle in specialization links, not followed");
                continue;
            }
            if !visited.insert(id.as_str()) {
                continue;
            }
            let Some(child) = self.live(id.as_str()) else {
                tracing::debug!(from = %node.id, to = %id, "skipping missing or deleted node");
                continue;
            };
            order.push(child.id.clone());
            path.push(child.id.as_str());
            self.walk_from(child, direction, visited, path, order);
            path.pop();
        }
    }

    /// Node that owns the value of `property` for `id`
    ///
    /// The inheritance `ref` when set, otherwise the node itself.
    #[must_use]
    pub fn effective_source(&self, id: &str, property: &str) -> Option<NodeId> {
        let node = self.live(id)?;
        Some(
            node.inheritance_ref(property)
                .cloned()
                .unwrap_or_else(|| node.id.clone()),
        )
    }

    /// Value of `property` as seen by `id`, read through inheritance refs
    ///
    /// Falls back to the last reachable node's local copy when a ref chain is
    /// broken or cyclic.
    #[must_use]
    pub fn resolve_value(&self, id: &str, property: &str) -> Option<&PropertyValue> {
        let mut current = self.live(id)?;
        let mut seen: HashSet<&str> = HashSet::new();
        loop {
            if !seen.insert(current.id.as_str()) {
                tracing::warn!(node = %id, property, "inheritance refs form a cycle");
                return current.properties.get(property);
            }
            match current.inheritance_ref(property) {
                Some(source) if *source != current.id => match self.live(source.as_str()) {
                    Some(next) => current = next,
                    None => {
                        tracing::warn!(node = %current.id, %source, property, "inheritance ref points at missing node");
                        return current.properties.get(property);
                    }
                },
                _ => return current.properties.get(property),
            }
        }
    }

    /// Add a specialization edge
    ///
    /// The specialization is added to `collection` on the generalization and
    /// to the `main` generalizations bucket on the specialization.
    ///
    /// # Errors
    /// Returns error if either node is missing, the edge is a self-loop, or
    /// it would close a cycle.
    pub fn link(
        &mut self,
        generalization: &str,
        specialization: &str,
        collection: &str,
    ) -> Result<(), ModelError> {
        if generalization == specialization {
            return Err(ModelError::SelfLoop(generalization.into()));
        }
        for id in [generalization, specialization] {
            if self.live(id).is_none() {
                return Err(ModelError::NodeNotFound(id.into()));
            }
        }
        if self.is_descendant(specialization, generalization) {
            return Err(ModelError::CycleDetected {
                generalization: generalization.into(),
                specialization: specialization.into(),
            });
        }

        let gen_id = NodeId::from(generalization);
        let spec_id = NodeId::from(specialization);
        if let Some(node) = self.nodes.get_mut(generalization) {
            push_link(&mut node.specializations, collection, &spec_id);
        }
        if let Some(node) = self.nodes.get_mut(specialization) {
            push_link(&mut node.generalizations, MAIN_COLLECTION, &gen_id);
        }
        Ok(())
    }

    /// Remove a specialization edge in both directions
    ///
    /// # Errors
    /// Returns error if either node is missing
    pub fn unlink(&mut self, generalization: &str, specialization: &str) -> Result<(), ModelError> {
        for id in [generalization, specialization] {
            if self.get(id).is_none() {
                return Err(ModelError::NodeNotFound(id.into()));
            }
        }
        if let Some(node) = self.nodes.get_mut(generalization) {
            remove_link(&mut node.specializations, specialization);
        }
        if let Some(node) = self.nodes.get_mut(specialization) {
            remove_link(&mut node.generalizations, generalization);
        }
        Ok(())
    }

    /// Verify the live specialization graph has no cycle
    ///
    /// # Errors
    /// Returns the id of a node on a cycle
    pub fn check_acyclic(&self) -> Result<(), ModelError> {
        let mut graph: DiGraph<&NodeId, ()> = DiGraph::new();
        let mut index = HashMap::new();
        for node in self.live_nodes() {
            index.insert(node.id.as_str(), graph.add_node(&node.id));
        }
        for node in self.live_nodes() {
            let from = index[node.id.as_str()];
            for child in node.specialization_ids() {
                if let Some(&to) = index.get(child.as_str()) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| ModelError::CyclicSnapshot(graph[cycle.node_id()].clone()))
    }

    /// Inheritance refs that break the snapshot invariants
    ///
    /// A ref must name a live ancestor that has the property, and
    /// `neverInherit` properties must not carry a ref.
    #[must_use]
    pub fn inheritance_violations(&self) -> Vec<(NodeId, String)> {
        let mut out = Vec::new();
        for node in self.live_nodes() {
            let mut ancestors: Option<Vec<NodeId>> = None;
            for (property, rule) in &node.inheritance {
                let Some(source) = &rule.source else {
                    continue;
                };
                if !rule.inheritance_type.can_inherit() {
                    out.push((node.id.clone(), property.clone()));
                    continue;
                }
                let ancestors = ancestors.get_or_insert_with(|| self.ancestors(node.id.as_str()));
                let valid = ancestors.contains(source)
                    && self.live(source.as_str()).is_some_and(|s| s.has_property(property));
                if !valid {
                    out.push((node.id.clone(), property.clone()));
                }
            }
        }
        out
    }

    /// Apply updates in place
    ///
    /// Updates for unknown nodes are ignored.
    pub fn apply(&mut self, updates: &[NodeUpdate]) {
        for update in updates {
            match self.nodes.get_mut(update.node_id.as_str()) {
                Some(node) => node.apply_update(update),
                None => tracing::debug!(node = %update.node_id, "update for unknown node ignored"),
            }
        }
    }

    /// Next snapshot with updates applied
    #[must_use]
    pub fn with_updates(mut self, updates: &[NodeUpdate]) -> Self {
        self.apply(updates);
        self
    }
}

impl FromIterator<Node> for NodeGraph {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self::from_nodes(iter)
    }
}

fn push_link(collections: &mut Vec<Collection>, bucket: &str, id: &NodeId) {
    if collections.iter().any(|c| c.contains(id.as_str())) {
        return;
    }
    match collections.iter_mut().find(|c| c.collection_name == bucket) {
        Some(c) => c.nodes.push(Link::new(id.clone())),
        None => collections.push(Collection {
            collection_name: bucket.to_string(),
            nodes: vec![Link::new(id.clone())],
        }),
    }
}

fn remove_link(collections: &mut [Collection], id: &str) {
    for c in collections {
        c.nodes.retain(|link| link.id != id);
    }
}
