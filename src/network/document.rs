use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::config::InferenceConfig;
use super::errors::NetworkResult;
use super::event::Event;
use super::net::Net;
use super::node::Node;

/// Serializable description of a whole network.
///
/// ```json
/// {
///   "title": "Grass Wetness Belief Net",
///   "nodes": [
///     { "name": "Cloudy", "states": ["T", "F"], "parents": [],
///       "probabilities": [ { "event": { "Cloudy": "T" }, "probability": 0.5 } ] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetDocument {
    pub title: String,
    #[serde(default)]
    pub config: InferenceConfig,
    #[serde(default, skip_serializing_if = "Event::is_empty")]
    pub evidence: Event,
    pub nodes: Vec<NodeDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    pub states: Vec<String>,
    /// Parent names, in the order the parents were added.
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub probabilities: Vec<ProbabilityEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityEntry {
    pub event: Event,
    pub probability: f64,
}

impl NetDocument {
    pub fn from_net(net: &Net) -> Self {
        let nodes = net
            .nodes()
            .map(|(_, node)| NodeDocument {
                name: node.name().to_string(),
                states: node.states().to_vec(),
                parents: node
                    .parents()
                    .iter()
                    .map(|parent| net.node(*parent).name().to_string())
                    .collect(),
                probabilities: node
                    .probabilities()
                    .iter()
                    .map(|(event, probability)| ProbabilityEntry {
                        event: event.clone(),
                        probability: *probability,
                    })
                    .collect(),
            })
            .collect();

        NetDocument {
            title: net.title().to_string(),
            config: net.config().clone(),
            evidence: net.evidence().clone(),
            nodes,
        }
    }

    /// Builds the network. Fails on duplicate node names and on parents that
    /// name no node in the document.
    pub fn into_net(self) -> NetworkResult<Net> {
        let mut net = Net::new(&self.title).with_config(self.config);

        let mut wiring = Vec::with_capacity(self.nodes.len());
        for document in self.nodes {
            let mut node = Node::new(&document.name);
            for state in &document.states {
                node.add_state(state);
            }
            for entry in document.probabilities {
                node.set_probability(entry.event, entry.probability);
            }
            let id = net.add_node(node)?;
            wiring.push((id, document.parents));
        }

        for (child, parents) in wiring {
            for parent in parents {
                let parent = net.node_id(&parent)?;
                net.add_parent(child, parent);
            }
        }

        if !self.evidence.is_empty() {
            net.set_evidence(self.evidence);
        }
        Ok(net)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse network document")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize network document")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading network document from {}", path.display());
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read network document {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        info!("Saving network document {} to {}", self.title, path.display());
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write network document {}", path.display()))
    }
}
