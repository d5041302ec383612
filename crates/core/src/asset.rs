//! Assets claimed during one scheduling tick.

use std::collections::HashSet;

use crate::Element;

/// Set of asset identifiers already claimed this tick.
///
/// Built fresh by the caller for every tick and threaded through the plan
/// tree; never retained between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyAssets {
    assets: HashSet<String>,
}

impl DirtyAssets {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `asset` has been claimed.
    pub fn contains(&self, asset: &str) -> bool {
        self.assets.contains(asset)
    }

    /// Claim an asset. Returns false if it was already dirty.
    pub fn claim(&mut self, asset: impl Into<String>) -> bool {
        self.assets.insert(asset.into())
    }

    /// Whether the element's asset is claimed. Elements without an asset
    /// are never blocked.
    pub fn blocks<E: Element + ?Sized>(&self, element: &E) -> bool {
        element.asset().is_some_and(|asset| self.contains(asset))
    }

    /// Number of claimed assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether nothing has been claimed.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterate over claimed assets.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for DirtyAssets {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            assets: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for DirtyAssets {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.assets.extend(iter.into_iter().map(Into::into));
    }
}
