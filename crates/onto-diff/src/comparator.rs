//! Property comparison between a live node and an improvement

use crate::collections::{diff_collections, diff_sorted_collections, MarkedCollection};
use crate::error::DiffError;
use crate::proposal::{ProposedProperties, ProposedValue, TitleCollection};
use indexmap::IndexMap;
use onto_model::{Collection, Link, NodeId, PropertyValue};
use onto_store::TitleLookup;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Difference of one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDiff {
    pub modified_property: String,
    pub previous_value: Option<PropertyValue>,
    pub new_value: Option<PropertyValue>,
}

impl PropertyDiff {
    /// Whether either side is a collection list
    #[inline]
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.previous_value
            .as_ref()
            .is_some_and(PropertyValue::is_collections)
            || self
                .new_value
                .as_ref()
                .is_some_and(PropertyValue::is_collections)
    }

    /// Link-by-link merge of a relationship diff, `None` for scalars
    #[must_use]
    pub fn marked_links(&self) -> Option<Vec<MarkedCollection>> {
        self.is_relationship().then(|| {
            diff_collections(
                collections_of(self.previous_value.as_ref()),
                collections_of(self.new_value.as_ref()),
            )
        })
    }

    /// Collection-level merge, when collections were added, dropped or
    /// reordered
    #[must_use]
    pub fn marked_order(&self) -> Option<Vec<MarkedCollection>> {
        let old = collections_of(self.previous_value.as_ref());
        let new = collections_of(self.new_value.as_ref());
        let names = |c: &[Collection]| c.iter().map(|c| c.collection_name.clone()).collect::<Vec<_>>();
        (self.is_relationship() && names(old) != names(new))
            .then(|| diff_sorted_collections(old, new))
    }
}

fn collections_of(value: Option<&PropertyValue>) -> &[Collection] {
    value.and_then(PropertyValue::as_collections).unwrap_or_default()
}

/// Compares live properties against proposed ones
#[derive(Debug, Clone)]
pub struct ChangeComparator<L> {
    lookup: L,
}

impl<L: TitleLookup> ChangeComparator<L> {
    /// Create comparator resolving titles through `lookup`
    #[inline]
    #[must_use]
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Title lookup in use
    #[inline]
    #[must_use]
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Per-property differences, in live order then proposal-only order
    ///
    /// Relationship titles come from `original` when it carries the
    /// property, else from `proposed`. Unresolved titles are dropped.
    ///
    /// # Errors
    /// Returns error if a title lookup fails
    pub async fn compare_properties(
        &self,
        live: &IndexMap<String, PropertyValue>,
        proposed: &ProposedProperties,
        original: Option<&ProposedProperties>,
    ) -> Result<Vec<PropertyDiff>, DiffError> {
        let mut diffs = Vec::new();
        if live.is_empty() {
            return Ok(diffs);
        }

        let keys = live
            .keys()
            .chain(proposed.keys().filter(|k| !live.contains_key(*k)));
        for key in keys {
            let previous = live.get(key);
            let next = proposed.get(key);
            let relationship = previous.is_some_and(PropertyValue::is_collections)
                || next.is_some_and(ProposedValue::is_relationship);

            let diff = if relationship {
                let titles = original.and_then(|o| o.get(key)).or(next);
                self.compare_relationship(key, previous, titles).await?
            } else {
                compare_scalar(key, previous, next)
            };
            if let Some(diff) = diff {
                diffs.push(diff);
            }
        }
        tracing::debug!(properties = live.len(), diffs = diffs.len(), "compared properties");
        Ok(diffs)
    }

    async fn compare_relationship(
        &self,
        key: &str,
        previous: Option<&PropertyValue>,
        proposed: Option<&ProposedValue>,
    ) -> Result<Option<PropertyDiff>, DiffError> {
        let new_value = match proposed {
            Some(ProposedValue::TitleCollections(collections)) => {
                Some(PropertyValue::Collections(self.resolve(collections).await?))
            }
            Some(other) => other.to_scalar(),
            None => None,
        };

        let changed = match (previous, &new_value) {
            (Some(PropertyValue::Collections(old)), Some(PropertyValue::Collections(new))) => {
                id_sets(old) != id_sets(new)
            }
            (old, new) => old != new.as_ref(),
        };
        Ok(changed.then(|| PropertyDiff {
            modified_property: key.to_string(),
            previous_value: previous.cloned(),
            new_value,
        }))
    }

    async fn resolve(&self, collections: &[TitleCollection]) -> Result<Vec<Collection>, DiffError> {
        let mut resolved = Vec::with_capacity(collections.len());
        for collection in collections {
            let mut nodes = Vec::with_capacity(collection.nodes.len());
            for title in &collection.nodes {
                let id = self
                    .lookup
                    .node_id_by_title(title)
                    .await
                    .map_err(|source| DiffError::Lookup {
                        title: title.clone(),
                        source,
                    })?;
                match id {
                    Some(id) => nodes.push(Link::new(id)),
                    None => tracing::debug!(title = %title, "unresolved title dropped"),
                }
            }
            resolved.push(Collection {
                collection_name: collection.collection_name.clone(),
                nodes,
            });
        }
        Ok(resolved)
    }
}

fn compare_scalar(
    key: &str,
    previous: Option<&PropertyValue>,
    proposed: Option<&ProposedValue>,
) -> Option<PropertyDiff> {
    let new_value = proposed.and_then(ProposedValue::to_scalar);
    (previous != new_value.as_ref()).then(|| PropertyDiff {
        modified_property: key.to_string(),
        previous_value: previous.cloned(),
        new_value,
    })
}

/// Id set per collection name; an empty bucket equals an absent one
fn id_sets(collections: &[Collection]) -> BTreeMap<&str, BTreeSet<&NodeId>> {
    let mut sets: BTreeMap<&str, BTreeSet<&NodeId>> = BTreeMap::new();
    for collection in collections {
        sets.entry(collection.collection_name.as_str())
            .or_default()
            .extend(collection.ids());
    }
    sets.retain(|_, ids| !ids.is_empty());
    sets
}
