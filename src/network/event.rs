use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::errors::{NetworkError, NetworkResult};

/// A (possibly partial) assignment of states to nodes.
///
/// Events are used both as evidence for a query and as keys of a node's
/// conditional probability table. Equality, ordering and hashing all go
/// through the canonical string `name1 = state1, name2 = state2`, which is
/// rebuilt after every mutation. Names are kept sorted, so two events holding
/// the same pairs are equal whatever order they were set in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Event {
    observations: BTreeMap<String, String>,
    repr: String,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or overwrites) the state of a node.
    pub fn set(&mut self, name: &str, state: &str) {
        self.observations.insert(name.to_string(), state.to_string());
        self.regenerate();
    }

    /// Removes a node from the event. Removing an absent node is a no-op.
    pub fn remove(&mut self, name: &str) {
        self.observations.remove(name);
        self.regenerate();
    }

    pub fn clear(&mut self) {
        self.observations.clear();
        self.regenerate();
    }

    pub fn has(&self, name: &str) -> bool {
        self.observations.contains_key(name)
    }

    pub fn has_state(&self, name: &str, state: &str) -> bool {
        self.observations.get(name).is_some_and(|s| s == state)
    }

    /// Returns the state set for `name`.
    pub fn get_state(&self, name: &str) -> NetworkResult<&str> {
        self.observations
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| NetworkError::UnknownVariable {
                name: name.to_string(),
            })
    }

    /// True when every pair in `other` is also present in `self`.
    pub fn is_consistent_with(&self, other: &Event) -> bool {
        other
            .observations
            .iter()
            .all(|(name, state)| self.has_state(name, state))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.observations
            .iter()
            .map(|(name, state)| (name.as_str(), state.as_str()))
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.repr
    }

    fn regenerate(&mut self) {
        self.repr = self
            .observations
            .iter()
            .map(|(name, state)| format!("{} = {}", name, state))
            .collect::<Vec<_>>()
            .join(", ");
    }
}

impl From<BTreeMap<String, String>> for Event {
    fn from(observations: BTreeMap<String, String>) -> Self {
        let mut event = Event {
            observations,
            repr: String::new(),
        };
        event.regenerate();
        event
    }
}

impl From<Event> for BTreeMap<String, String> {
    fn from(event: Event) -> Self {
        event.observations
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Event {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let observations: BTreeMap<String, String> = iter
            .into_iter()
            .map(|(name, state)| (name.into(), state.into()))
            .collect();
        Event::from(observations)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.repr.cmp(&other.repr)
    }
}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.repr.hash(state);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}
