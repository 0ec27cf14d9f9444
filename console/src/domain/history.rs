//! Current-entry selection for append-only address and kin histories.

use serde::Serialize;

use super::records::{Address, CurrentMarker, Kin};

/// Entry that may carry a current marker.
pub trait HistoryEntry {
    /// Marker as sent by the API.
    fn current_marker(&self) -> CurrentMarker;
}

impl HistoryEntry for Address {
    fn current_marker(&self) -> CurrentMarker {
        self.is_current
    }
}

impl HistoryEntry for Kin {
    fn current_marker(&self) -> CurrentMarker {
        self.is_current
    }
}

/// History split into the current entry and the older ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySplit<T> {
    /// Entry shown as current.
    pub current: Option<T>,
    /// Remaining entries, in API order.
    pub history: Vec<T>,
}

impl<T> Default for HistorySplit<T> {
    fn default() -> Self {
        Self {
            current: None,
            history: Vec::new(),
        }
    }
}

impl<T: HistoryEntry> HistorySplit<T> {
    /// Split `entries` by the current-entry rule.
    ///
    /// When any entry carries a marker key, even a null one, the first entry
    /// marked `true` is current and entries marked `false` form the history;
    /// other entries are dropped. Without marker keys the first entry is
    /// current and the rest are history.
    ///
    /// # Examples
    /// ```
    /// use care_console::domain::HistorySplit;
    /// use care_console::domain::records::{Address, CurrentMarker};
    ///
    /// let old = Address { is_current: CurrentMarker::Former, ..Address::default() };
    /// let new = Address { is_current: CurrentMarker::Current, ..Address::default() };
    /// let split = HistorySplit::from_entries(vec![old.clone(), new.clone()]);
    /// assert_eq!(split.current, Some(new));
    /// assert_eq!(split.history, vec![old]);
    /// ```
    #[must_use]
    pub fn from_entries(entries: Vec<T>) -> Self {
        let marked = entries.iter().any(|entry| !entry.current_marker().is_absent());
        if !marked {
            let mut iter = entries.into_iter();
            return Self {
                current: iter.next(),
                history: iter.collect(),
            };
        }

        let mut current = None;
        let mut history = Vec::new();
        for entry in entries {
            match entry.current_marker() {
                CurrentMarker::Current if current.is_none() => current = Some(entry),
                CurrentMarker::Former => history.push(entry),
                _ => {}
            }
        }
        Self { current, history }
    }
}
