//! Inheritance rules
//!
//! A property is either owned by a node (`ref` is null) or read through
//! from the ancestor named by `ref`.

use crate::ids::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a property flows down specialization trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InheritanceType {
    /// Never inherited; the node always owns its value
    NeverInherit,
    /// Always follows the generalization, even over local edits
    AlwaysInherit,
    /// Inherited until the node overrides it locally
    #[default]
    InheritUnlessAlreadyOverRidden,
    /// Inherited once a reviewer accepts the upstream change
    InheritAfterReview,
}

impl InheritanceType {
    /// Whether a property with this rule may carry a `ref`
    #[inline]
    #[must_use]
    pub fn can_inherit(self) -> bool {
        !matches!(self, Self::NeverInherit)
    }
}

/// Inheritance entry of one property
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceRule {
    /// Ancestor currently supplying the value; `None` when owned locally
    #[serde(rename = "ref", default)]
    pub source: Option<NodeId>,

    #[serde(default)]
    pub inheritance_type: InheritanceType,
}

impl InheritanceRule {
    /// Locally owned, inheritable by descendants
    #[inline]
    #[must_use]
    pub fn owned() -> Self {
        Self::default()
    }

    /// Read through from `source`
    #[inline]
    #[must_use]
    pub fn inherited_from(source: impl Into<NodeId>) -> Self {
        Self {
            source: Some(source.into()),
            inheritance_type: InheritanceType::InheritUnlessAlreadyOverRidden,
        }
    }

    /// Owned and never inherited
    #[inline]
    #[must_use]
    pub fn never() -> Self {
        Self {
            source: None,
            inheritance_type: InheritanceType::NeverInherit,
        }
    }

    /// Same rule with another inheritance type
    #[inline]
    #[must_use]
    pub fn with_type(mut self, inheritance_type: InheritanceType) -> Self {
        self.inheritance_type = inheritance_type;
        self
    }

    /// Whether the value is read through from an ancestor
    #[inline]
    #[must_use]
    pub fn is_inherited(&self) -> bool {
        self.source.is_some()
    }
}

/// Inheritance map for a node created from `template`
///
/// Properties the template owns are pointed at the template; `isPartOf` is
/// never inherited this way and stays owned.
#[must_use]
pub fn generate_inheritance(
    inheritance: &IndexMap<String, InheritanceRule>,
    template: &NodeId,
) -> IndexMap<String, InheritanceRule> {
    inheritance
        .iter()
        .map(|(property, rule)| {
            let mut rule = rule.clone();
            if rule.source.is_none() && property != "isPartOf" {
                rule.source = Some(template.clone());
            }
            (property.clone(), rule)
        })
        .collect()
}
