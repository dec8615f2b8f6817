use log::trace;
use rand::Rng;
use std::collections::BTreeMap;

use super::errors::{NetworkError, NetworkResult};
use super::event::Event;
use super::naming::NameFactory;
use super::net::Net;

/// Handle to a node inside the [`Net`] that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Outcome of one odometer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combination {
    /// Moved to the next combination.
    Advanced,
    /// The node's own state wrapped back to its first state, so every
    /// combination has been visited.
    WrappedAll,
}

/// A discrete random variable.
///
/// States keep their insertion order, which fixes both the enumeration order
/// of [`Node::next_combination`] and the order in which the samplers
/// accumulate probability mass. Parents and children are handles into the
/// owning network and are wired by [`Net::add_child`] / [`Net::add_parent`].
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    states: Vec<String>,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) children: Vec<NodeId>,
    probabilities: BTreeMap<Event, f64>,
}

impl Node {
    pub fn new(name: &str) -> Self {
        Node {
            name: name.to_string(),
            states: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            probabilities: BTreeMap::new(),
        }
    }

    /// Creates a node, falling back to the factory's `NodeN` name.
    pub fn from_factory(names: &mut NameFactory, name: Option<&str>) -> Self {
        Node::new(&names.node_name(name))
    }

    pub fn with_states(name: &str, states: &[&str]) -> Self {
        let mut node = Node::new(name);
        for state in states {
            node.add_state(state);
        }
        node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn probabilities(&self) -> &BTreeMap<Event, f64> {
        &self.probabilities
    }

    pub fn probability(&self, event: &Event) -> Option<f64> {
        self.probabilities.get(event).copied()
    }

    /// Appends a state. Duplicates are not checked.
    pub fn add_state(&mut self, state: &str) {
        self.states.push(state.to_string());
    }

    /// Stores `probability` for `event`, replacing any previous entry.
    ///
    /// The table is never normalized; callers supply every state's value.
    pub fn set_probability(&mut self, event: Event, probability: f64) {
        trace!("{}: P({}) = {}", self.name, event, probability);
        self.probabilities.insert(event, probability);
    }

    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }

    /// True when every parent has a state in `evidence`.
    pub fn can_be_evaluated(&self, net: &Net, evidence: &Event) -> bool {
        self.parents
            .iter()
            .all(|parent| evidence.has(net.node(*parent).name()))
    }

    /// Number of distinct parent-and-self combinations.
    pub fn combination_count(&self, net: &Net) -> usize {
        self.parents
            .iter()
            .map(|parent| net.node(*parent).states.len())
            .product::<usize>()
            * self.states.len()
    }

    /// The combination every parent and this node start from: each at its
    /// first state.
    pub fn first_combination(&self, net: &Net) -> NetworkResult<Event> {
        let mut event = Event::new();
        for parent in self.parents.iter().map(|id| net.node(*id)) {
            event.set(&parent.name, parent.first_state()?);
        }
        event.set(&self.name, self.first_state()?);
        Ok(event)
    }

    /// Advances `event` to the next combination of parent and own states.
    ///
    /// Works like an odometer: the last-added parent turns fastest, a parent
    /// wrapping past its final state carries into the parent added before
    /// it, and a carry out of every parent turns this node's own state. A
    /// node without parents just turns its own state.
    pub fn next_combination(&self, net: &Net, event: &mut Event) -> NetworkResult<Combination> {
        let mut carry = true;
        for parent in self.parents.iter().rev().map(|id| net.node(*id)) {
            carry = parent.advance_state(event)?;
            if !carry {
                break;
            }
        }

        if !carry {
            return Ok(Combination::Advanced);
        }
        if self.advance_state(event)? {
            Ok(Combination::WrappedAll)
        } else {
            Ok(Combination::Advanced)
        }
    }

    /// Probability of `state` given the states `evidence` holds for every
    /// parent.
    ///
    /// Table entries are kept when they pin this node to `state` and agree
    /// with the evidence on each parent; their probabilities are summed, so
    /// entries keyed by extra ancestors collapse into the marginal.
    pub fn evaluate_marginal(&self, net: &Net, state: &str, evidence: &Event) -> NetworkResult<f64> {
        let mut parent_states = Vec::with_capacity(self.parents.len());
        for parent in self.parents.iter().map(|id| net.node(*id)) {
            let parent_state = evidence.get_state(&parent.name).map_err(|_| {
                NetworkError::MarginalUnavailable {
                    node: self.name.clone(),
                    parent: parent.name.clone(),
                }
            })?;
            parent_states.push((parent.name.as_str(), parent_state));
        }

        Ok(self
            .probabilities
            .iter()
            .filter(|(key, _)| key.has_state(&self.name, state))
            .filter(|(key, _)| {
                parent_states
                    .iter()
                    .all(|(parent, parent_state)| key.has_state(parent, parent_state))
            })
            .map(|(_, probability)| probability)
            .sum())
    }

    /// Unnormalized full-conditional score of `state` given this node's
    /// Markov blanket.
    ///
    /// `event` must hold a state for every parent, every child, and every
    /// child's other parents. It is not modified.
    pub fn evaluate_markov_blanket(&self, net: &Net, state: &str, event: &Event) -> NetworkResult<f64> {
        if self.state_index(state).is_none() {
            return Err(NetworkError::InvalidStateInAssignment {
                node: self.name.clone(),
                state: state.to_string(),
            });
        }

        let mut working = event.clone();
        working.set(&self.name, state);

        let mut score = self.evaluate_marginal(net, state, &working)?;
        for child in self.children.iter().map(|id| net.node(*id)) {
            let child_state = working.get_state(&child.name)?;
            score *= child.evaluate_marginal(net, child_state, &working)?;
        }
        Ok(score)
    }

    /// Draws a state from this node's marginal given the parents in `event`.
    pub fn get_random_state(&self, net: &Net, event: &Event, rng: &mut impl Rng) -> NetworkResult<String> {
        let weights = self
            .states
            .iter()
            .map(|state| self.evaluate_marginal(net, state, event))
            .collect::<NetworkResult<Vec<f64>>>()?;
        self.pick_state(&weights, rng.r#gen::<f64>())
    }

    /// Draws a state from the normalized Markov-blanket scores.
    pub fn get_random_state_with_markov_blanket(
        &self,
        net: &Net,
        event: &Event,
        rng: &mut impl Rng,
    ) -> NetworkResult<String> {
        let scores = self
            .states
            .iter()
            .map(|state| self.evaluate_markov_blanket(net, state, event))
            .collect::<NetworkResult<Vec<f64>>>()?;

        let magnitude: f64 = scores.iter().sum();
        if magnitude <= 0.0 || !magnitude.is_finite() {
            return Err(NetworkError::ZeroProbabilityMass {
                node: self.name.clone(),
            });
        }
        let normalized: Vec<f64> = scores.iter().map(|score| score / magnitude).collect();
        self.pick_state(&normalized, rng.r#gen::<f64>())
    }

    /// Inverse-CDF pick over `weights`, which line up with `self.states`.
    ///
    /// A draw left above the final cumulative sum by rounding selects the
    /// last state.
    pub(crate) fn pick_state(&self, weights: &[f64], draw: f64) -> NetworkResult<String> {
        let last = self.states.last().ok_or_else(|| NetworkError::StatelessVariable {
            node: self.name.clone(),
        })?;

        let mut cumulative = 0.0;
        for (state, weight) in self.states.iter().zip(weights) {
            cumulative += weight;
            if draw < cumulative {
                return Ok(state.clone());
            }
        }
        Ok(last.clone())
    }

    pub(crate) fn first_state(&self) -> NetworkResult<&str> {
        self.states
            .first()
            .map(String::as_str)
            .ok_or_else(|| NetworkError::StatelessVariable {
                node: self.name.clone(),
            })
    }

    /// Moves this node's state in `event` one step forward, returning `true`
    /// when it wrapped back to the first state.
    fn advance_state(&self, event: &mut Event) -> NetworkResult<bool> {
        if self.states.is_empty() {
            return Err(NetworkError::StatelessVariable {
                node: self.name.clone(),
            });
        }

        let current = event.get_state(&self.name)?;
        let index = self
            .state_index(current)
            .ok_or_else(|| NetworkError::InvalidStateInAssignment {
                node: self.name.clone(),
                state: current.to_string(),
            })?;

        let (next, wrapped) = match self.states.get(index + 1) {
            Some(next) => (next, false),
            None => (&self.states[0], true),
        };
        event.set(&self.name, next);
        Ok(wrapped)
    }
}
