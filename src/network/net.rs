use log::{debug, info, warn};
use std::collections::{HashMap, VecDeque};

use super::config::InferenceConfig;
use super::errors::{NetworkError, NetworkResult};
use super::event::Event;
use super::naming::NameFactory;
use super::node::{Node, NodeId};

/// A Bayesian network: the owner of every node, plus the evidence the next
/// query is conditioned on.
///
/// Nodes live in an arena and refer to each other through [`NodeId`]
/// handles, so a node never outlives or aliases the network it belongs to.
#[derive(Debug, Clone)]
pub struct Net {
    title: String,
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    evidence: Event,
    config: InferenceConfig,
}

impl Net {
    pub fn new(title: &str) -> Self {
        Net {
            title: title.to_string(),
            nodes: Vec::new(),
            index: HashMap::new(),
            evidence: Event::new(),
            config: InferenceConfig::default(),
        }
    }

    /// Creates a network, falling back to the factory's `NetN` title.
    pub fn from_factory(names: &mut NameFactory, title: Option<&str>) -> Self {
        Net::new(&names.net_title(title))
    }

    pub fn with_config(mut self, config: InferenceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: InferenceConfig) {
        self.config = config;
    }

    /// Takes ownership of `node` and returns its handle.
    ///
    /// Edges are per-network, so any the node carried are dropped; wire them
    /// with [`Net::add_child`] or [`Net::add_parent`].
    pub fn add_node(&mut self, mut node: Node) -> NetworkResult<NodeId> {
        if self.index.contains_key(node.name()) {
            return Err(NetworkError::DuplicateNode {
                name: node.name().to_string(),
            });
        }
        node.parents.clear();
        node.children.clear();

        let id = NodeId(self.nodes.len());
        debug!("{}: adding node {} as #{}", self.title, node.name(), id.index());
        self.index.insert(node.name().to_string(), id);
        self.nodes.push(node);
        Ok(id)
    }

    /// Makes `child` a child of `parent`. A self-loop is ignored.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child {
            return;
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parents.push(parent);
    }

    /// Makes `parent` a parent of `child`. A self-loop is ignored.
    pub fn add_parent(&mut self, child: NodeId, parent: NodeId) {
        self.add_child(parent, child);
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different network.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different network.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn node_id(&self, name: &str) -> NetworkResult<NodeId> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::NodeNotFound {
                name: name.to_string(),
            })
    }

    pub fn node_by_name(&self, name: &str) -> NetworkResult<&Node> {
        self.node_id(name).map(|id| self.node(id))
    }

    /// Nodes in the order they were added.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Replaces the evidence wholesale.
    pub fn set_evidence(&mut self, evidence: Event) {
        info!("{}: evidence set to [{}]", self.title, evidence);
        self.evidence = evidence;
    }

    pub fn evidence(&self) -> &Event {
        &self.evidence
    }

    /// Populates a node's table by walking its combinations.
    ///
    /// `start` gets the first probability, and each following value goes to
    /// the next combination [`Node::next_combination`] produces. Filling
    /// stops early if the enumeration comes back around to `start`. Returns
    /// the combination the last value was stored under.
    pub fn fill_table(&mut self, id: NodeId, start: &Event, probabilities: &[f64]) -> NetworkResult<Event> {
        let mut event = start.clone();
        let mut last = start.clone();
        for (position, probability) in probabilities.iter().enumerate() {
            if position > 0 {
                self.node(id).next_combination(self, &mut event)?;
                if event == *start {
                    warn!(
                        "{}: {} values given for {} combinations of {}",
                        self.title,
                        probabilities.len(),
                        position,
                        self.node(id).name()
                    );
                    break;
                }
            }
            self.nodes[id.0].set_probability(event.clone(), *probability);
            last = event.clone();
        }
        Ok(last)
    }

    /// Nodes ordered so that every parent comes before its children. Ties
    /// keep insertion order.
    pub fn topological_order(&self) -> NetworkResult<Vec<NodeId>> {
        let mut pending: Vec<usize> = self.nodes.iter().map(|node| node.parents.len()).collect();
        let mut ready: VecDeque<NodeId> = self
            .nodes()
            .filter(|(_, node)| node.parents.is_empty())
            .map(|(id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for child in &self.nodes[id.0].children {
                pending[child.0] -= 1;
                if pending[child.0] == 0 {
                    ready.push_back(*child);
                }
            }
        }

        if order.len() < self.nodes.len() {
            return Err(NetworkError::CyclicNetwork {
                title: self.title.clone(),
            });
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boolean(name: &str) -> Node {
        Node::with_states(name, &["T", "F"])
    }

    #[test]
    fn test_add_node_rejects_duplicate_names() {
        let mut net = Net::new("dupes");
        net.add_node(boolean("A")).unwrap();
        assert_eq!(
            net.add_node(boolean("A")),
            Err(NetworkError::DuplicateNode {
                name: "A".to_string()
            })
        );
        assert_eq!(net.len(), 1);
    }

    #[test]
    fn test_edges_are_wired_both_ways() {
        let mut net = Net::new("edges");
        let a = net.add_node(boolean("A")).unwrap();
        let b = net.add_node(boolean("B")).unwrap();
        let c = net.add_node(boolean("C")).unwrap();
        net.add_child(a, b);
        net.add_parent(c, b);
        net.add_child(a, a);

        assert_eq!(net.node(a).children(), &[b]);
        assert!(net.node(a).parents().is_empty());
        assert_eq!(net.node(b).parents(), &[a]);
        assert_eq!(net.node(b).children(), &[c]);
        assert_eq!(net.node(c).parents(), &[b]);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut net = Net::new("lookup");
        let a = net.add_node(boolean("A")).unwrap();
        assert_eq!(net.node_id("A").unwrap(), a);
        assert_eq!(net.node_by_name("A").unwrap().name(), "A");
        assert_eq!(
            net.node_id("Z"),
            Err(NetworkError::NodeNotFound {
                name: "Z".to_string()
            })
        );
    }

    #[test]
    fn test_from_factory_titles() {
        let mut names = NameFactory::new();
        assert_eq!(Net::from_factory(&mut names, None).title(), "Net1");
        assert_eq!(Net::from_factory(&mut names, Some("Grass")).title(), "Grass");
        assert_eq!(Net::from_factory(&mut names, None).title(), "Net2");
    }

    #[test]
    fn test_fill_table_walks_the_odometer() {
        let mut net = Net::new("fill");
        let a = net.add_node(boolean("A")).unwrap();
        let b = net.add_node(boolean("B")).unwrap();
        net.add_child(a, b);

        let start = net.node(b).first_combination(&net).unwrap();
        let last = net.fill_table(b, &start, &[0.9, 0.2, 0.1, 0.8]).unwrap();
        assert_eq!(last.as_str(), "A = F, B = F");

        let table = net.node(b);
        assert_eq!(table.probability(&Event::from_iter([("A", "T"), ("B", "T")])), Some(0.9));
        assert_eq!(table.probability(&Event::from_iter([("A", "F"), ("B", "T")])), Some(0.2));
        assert_eq!(table.probability(&Event::from_iter([("A", "T"), ("B", "F")])), Some(0.1));
        assert_eq!(table.probability(&Event::from_iter([("A", "F"), ("B", "F")])), Some(0.8));
    }

    #[test]
    fn test_fill_table_stops_after_a_full_cycle() {
        let mut net = Net::new("overflow");
        let a = net.add_node(boolean("A")).unwrap();
        let start = Event::from_iter([("A", "T")]);
        let last = net.fill_table(a, &start, &[0.4, 0.6, 0.99]).unwrap();
        assert_eq!(last.as_str(), "A = F");
        assert_eq!(net.node(a).probability(&start), Some(0.4));
        assert_eq!(net.node(a).probabilities().len(), 2);
    }

    #[test]
    fn test_topological_order() {
        let mut net = Net::new("order");
        let wet = net.add_node(boolean("Wet")).unwrap();
        let rain = net.add_node(boolean("Rain")).unwrap();
        let cloudy = net.add_node(boolean("Cloudy")).unwrap();
        net.add_child(cloudy, rain);
        net.add_child(rain, wet);

        assert_eq!(net.topological_order().unwrap(), vec![cloudy, rain, wet]);
    }

    #[test]
    fn test_topological_order_detects_cycles() {
        let mut net = Net::new("loop");
        let a = net.add_node(boolean("A")).unwrap();
        let b = net.add_node(boolean("B")).unwrap();
        net.add_child(a, b);
        net.add_child(b, a);
        assert_eq!(
            net.topological_order(),
            Err(NetworkError::CyclicNetwork {
                title: "loop".to_string()
            })
        );
    }

    #[test]
    fn test_add_node_drops_foreign_edges() {
        let mut first = Net::new("first");
        let a = first.add_node(boolean("A")).unwrap();
        let b = first.add_node(boolean("B")).unwrap();
        first.add_child(a, b);

        let mut second = Net::new("second");
        let copied = second.add_node(first.node(b).clone()).unwrap();
        assert!(second.node(copied).parents().is_empty());
    }
}
