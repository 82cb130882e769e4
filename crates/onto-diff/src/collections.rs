//! Marked diffs of collection lists
//!
//! Used to render relationship changes: every link and collection of the
//! merged view carries whether it was added or removed, and whether the
//! change is really a move.

use indexmap::{IndexMap, IndexSet};
use onto_model::{Collection, Link, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Side of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeMark {
    Added,
    Removed,
}

/// Qualifier of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// The element moved rather than appearing or disappearing
    Sort,
}

/// Link in a merged collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedLink {
    #[serde(flatten)]
    pub link: Link,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeMark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeKind>,
}

impl MarkedLink {
    fn new(link: Link, change: Option<ChangeMark>, moved: bool) -> Self {
        Self {
            link,
            change,
            change_type: moved.then_some(ChangeKind::Sort),
        }
    }

    /// Whether the link was moved between collections
    #[inline]
    #[must_use]
    pub fn is_move(&self) -> bool {
        self.change_type == Some(ChangeKind::Sort)
    }
}

/// Collection in a merged collection list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedCollection {
    pub collection_name: String,
    pub nodes: Vec<MarkedLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeMark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeKind>,
}

impl MarkedCollection {
    fn unmarked(collection: &Collection) -> Self {
        Self {
            collection_name: collection.collection_name.clone(),
            nodes: collection
                .nodes
                .iter()
                .map(|l| MarkedLink::new(l.clone(), None, false))
                .collect(),
            change: None,
            change_type: None,
        }
    }

    fn marked(collection: &Collection, change: ChangeMark, moved: bool) -> Self {
        Self {
            change: Some(change),
            change_type: moved.then_some(ChangeKind::Sort),
            ..Self::unmarked(collection)
        }
    }
}

/// Merge two collection lists link by link
///
/// Collections appear old names first, then new ones. Within a collection,
/// links follow the new order with removed links last. A link that left
/// for (or arrived from) another collection is flagged as a move.
#[must_use]
pub fn diff_collections(old: &[Collection], new: &[Collection]) -> Vec<MarkedCollection> {
    let old_by_name: HashMap<&str, &Collection> =
        old.iter().map(|c| (c.collection_name.as_str(), c)).collect();
    let new_by_name: HashMap<&str, &Collection> =
        new.iter().map(|c| (c.collection_name.as_str(), c)).collect();
    let names: IndexSet<&str> = old
        .iter()
        .chain(new)
        .map(|c| c.collection_name.as_str())
        .collect();
    let old_home = home_collections(old);
    let new_home = home_collections(new);

    names
        .into_iter()
        .map(|name| {
            let old_col = old_by_name.get(name).copied();
            let new_col = new_by_name.get(name).copied();
            let old_links = links_by_id(old_col);
            let new_links = links_by_id(new_col);

            let ids: IndexSet<&NodeId> = old_links.keys().chain(new_links.keys()).copied().collect();
            let mut nodes: Vec<(Option<usize>, MarkedLink)> = ids
                .into_iter()
                .filter_map(|id| {
                    let position = new_links.get_index_of(id);
                    let link = new_links.get(id).or_else(|| old_links.get(id))?;
                    let elsewhere = |home: &HashMap<&NodeId, &str>| {
                        home.get(id).is_some_and(|other| *other != name)
                    };
                    let (change, moved) = match (old_links.contains_key(id), position.is_some()) {
                        (false, true) => (Some(ChangeMark::Added), elsewhere(&old_home)),
                        (true, false) => (Some(ChangeMark::Removed), elsewhere(&new_home)),
                        _ => (None, false),
                    };
                    Some((position, MarkedLink::new((*link).clone(), change, moved)))
                })
                .collect();
            if new_col.is_some() {
                nodes.sort_by_key(|(position, _)| position.map_or((1, 0), |p| (0, p)));
            }

            MarkedCollection {
                collection_name: name.to_string(),
                nodes: nodes.into_iter().map(|(_, link)| link).collect(),
                change: match (old_col, new_col) {
                    (None, Some(_)) => Some(ChangeMark::Added),
                    (Some(_), None) => Some(ChangeMark::Removed),
                    _ => None,
                },
                change_type: None,
            }
        })
        .collect()
}

/// Reorder-aware diff of whole collections
///
/// Collections on the longest common subsequence of names are stable. A
/// collection off that subsequence shows up twice when it still exists: as
/// added at its new position and removed at its old one, both flagged as a
/// move. Removed entries are spliced back in at their old index.
#[must_use]
pub fn diff_sorted_collections(old: &[Collection], new: &[Collection]) -> Vec<MarkedCollection> {
    let stable = lcs_names(old, new);
    let old_names: IndexSet<&str> = old.iter().map(|c| c.collection_name.as_str()).collect();
    let new_names: IndexSet<&str> = new.iter().map(|c| c.collection_name.as_str()).collect();

    let mut result: Vec<MarkedCollection> = new
        .iter()
        .map(|c| {
            let name = c.collection_name.as_str();
            if stable.contains(name) {
                MarkedCollection::unmarked(c)
            } else {
                MarkedCollection::marked(c, ChangeMark::Added, old_names.contains(name))
            }
        })
        .collect();

    let mut displaced: Vec<(usize, MarkedCollection)> = old
        .iter()
        .enumerate()
        .filter(|(_, c)| !stable.contains(c.collection_name.as_str()))
        .map(|(index, c)| {
            let moved = new_names.contains(c.collection_name.as_str());
            (index, MarkedCollection::marked(c, ChangeMark::Removed, moved))
        })
        .collect();
    displaced.sort_by(|a, b| b.0.cmp(&a.0));
    for (index, collection) in displaced {
        let at = index.min(result.len());
        result.insert(at, collection);
    }
    result
}

/// Collection each link target lives in; last occurrence wins
fn home_collections(collections: &[Collection]) -> HashMap<&NodeId, &str> {
    collections
        .iter()
        .flat_map(|c| c.ids().map(move |id| (id, c.collection_name.as_str())))
        .collect()
}

fn links_by_id(collection: Option<&Collection>) -> IndexMap<&NodeId, &Link> {
    collection
        .map(|c| c.nodes.iter().map(|l| (&l.id, l)).collect())
        .unwrap_or_default()
}

fn lcs_names<'a>(old: &'a [Collection], new: &[Collection]) -> IndexSet<&'a str> {
    let (m, n) = (old.len(), new.len());
    let mut dp = vec![vec![0_usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if old[i - 1].collection_name == new[j - 1].collection_name {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut names = IndexSet::new();
    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if old[i - 1].collection_name == new[j - 1].collection_name {
            names.insert(old[i - 1].collection_name.as_str());
            i -= 1;
            j -= 1;
        } else if dp[i - 1][j] > dp[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    names
}
