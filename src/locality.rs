//! Locality (chapter) filter selection.
//!
//! The persisted record stores the filter as a plain string where the
//! sentinel `"all"` means "no filter". In memory the sentinel is lifted into
//! [`LocalityFilter::All`] so callers never compare against magic strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire value meaning "every locality".
pub const ALL_LOCALITIES: &str = "all";

/// The active locality filter applied across feeds.
///
/// Any id is accepted, including ids that match no known locality. Such a
/// filter is valid and simply matches nothing downstream.
///
/// # Examples
///
/// ```
/// use session_store::LocalityFilter;
///
/// let filter = LocalityFilter::from("boulder");
/// assert!(filter.matches("boulder"));
/// assert!(!filter.matches("denver"));
/// assert!(LocalityFilter::All.matches("denver"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LocalityFilter {
    /// No filter: every locality is shown.
    #[default]
    All,
    /// Only items belonging to this locality id are shown.
    Only(String),
}

impl LocalityFilter {
    /// Returns the selected locality id, or `None` when unfiltered.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(id) => Some(id),
        }
    }

    /// Returns `true` if an item in `locality_id` passes this filter.
    pub fn matches(&self, locality_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => id == locality_id,
        }
    }

    /// Lazily keep only the items whose locality passes this filter.
    ///
    /// # Arguments
    ///
    /// * `items` - The items to filter (posts, events, groups, ...).
    /// * `locality_of` - Extracts the locality id of an item.
    pub fn filter<'a, T, I, F>(&'a self, items: I, locality_of: F) -> impl Iterator<Item = T> + 'a
    where
        T: 'a,
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
        F: Fn(&T) -> &str,
        F: 'a,
    {
        items
            .into_iter()
            .filter(move |item| self.matches(locality_of(item)))
    }
}

impl From<String> for LocalityFilter {
    fn from(id: String) -> Self {
        if id == ALL_LOCALITIES {
            Self::All
        } else {
            Self::Only(id)
        }
    }
}

impl From<&str> for LocalityFilter {
    fn from(id: &str) -> Self {
        Self::from(id.to_owned())
    }
}

impl From<LocalityFilter> for String {
    fn from(filter: LocalityFilter) -> Self {
        match filter {
            LocalityFilter::All => ALL_LOCALITIES.to_owned(),
            LocalityFilter::Only(id) => id,
        }
    }
}

impl fmt::Display for LocalityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id().unwrap_or(ALL_LOCALITIES))
    }
}
