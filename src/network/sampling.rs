use log::{debug, info, trace, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

use super::config::InferenceMode;
use super::errors::{NetworkError, NetworkResult};
use super::event::Event;
use super::net::Net;
use super::node::NodeId;

/// Posterior distribution over a node's states.
pub type StateProbabilities = BTreeMap<String, f64>;

/// Weighted counts of the states a queried node took across samples.
#[derive(Debug, Default)]
struct Tally {
    weights: BTreeMap<String, f64>,
    total: f64,
}

impl Tally {
    fn add(&mut self, state: &str, weight: f64) {
        *self.weights.entry(state.to_string()).or_insert(0.0) += weight;
        self.total += weight;
    }

    /// Normalizes over `states`. Every declared state appears, at zero when
    /// it was never sampled.
    fn normalize(&self, states: &[String]) -> StateProbabilities {
        states
            .iter()
            .map(|state| {
                let weight = self.weights.get(state).copied().unwrap_or(0.0);
                let probability = if self.total > 0.0 { weight / self.total } else { 0.0 };
                (state.clone(), probability)
            })
            .collect()
    }
}

impl Net {
    /// Approximates the posterior of `name` given the current evidence.
    ///
    /// The random source is seeded from [`InferenceConfig::seed`] when set,
    /// so seeded queries are reproducible.
    ///
    /// [`InferenceConfig::seed`]: super::config::InferenceConfig::seed
    pub fn query_node(&self, name: &str) -> NetworkResult<StateProbabilities> {
        let mut rng = match self.config().seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.query_node_with_rng(name, &mut rng)
    }

    /// Same as [`Net::query_node`] with a caller-supplied random source.
    pub fn query_node_with_rng(&self, name: &str, rng: &mut impl Rng) -> NetworkResult<StateProbabilities> {
        let target = self.node_id(name)?;
        let config = self.config();
        if config.samples == 0 {
            return Err(NetworkError::NoSamplesRequested);
        }
        info!(
            "{}: querying {} given [{}] ({}, {} samples)",
            self.title(),
            name,
            self.evidence(),
            config.mode,
            config.samples
        );

        let tally = match config.mode {
            InferenceMode::MarkovChainMonteCarlo => self.markov_chain_tally(target, rng)?,
            InferenceMode::RejectionSampling => self.rejection_tally(target, rng)?,
            InferenceMode::LikelihoodWeighting => self.likelihood_tally(target, rng)?,
        };

        let result = tally.normalize(self.node(target).states());
        debug!("{}: posterior of {} = {:?}", self.title(), name, result);
        Ok(result)
    }

    /// Gibbs sampling: every non-evidence node is redrawn from its Markov
    /// blanket once per sweep, and each tallied sweep counts the target's
    /// state once.
    fn markov_chain_tally(&self, target: NodeId, rng: &mut impl Rng) -> NetworkResult<Tally> {
        let config = self.config();
        let mut event = self.initial_state(rng)?;
        let free: Vec<NodeId> = self
            .nodes()
            .filter(|(_, node)| !self.evidence().has(node.name()))
            .map(|(id, _)| id)
            .collect();
        trace!("{}: chain starts at [{}]", self.title(), event);

        for _ in 0..config.burn_in {
            self.gibbs_sweep(&free, &mut event, rng)?;
        }

        let target_name = self.node(target).name();
        let mut tally = Tally::default();
        for _ in 0..config.samples {
            self.gibbs_sweep(&free, &mut event, rng)?;
            tally.add(event.get_state(target_name)?, 1.0);
        }
        Ok(tally)
    }

    fn gibbs_sweep(&self, free: &[NodeId], event: &mut Event, rng: &mut impl Rng) -> NetworkResult<()> {
        for id in free {
            let node = self.node(*id);
            let state = node.get_random_state_with_markov_blanket(self, event, rng)?;
            event.set(node.name(), &state);
        }
        Ok(())
    }

    /// Where the chain starts: a draw with positive joint probability under
    /// the evidence, so every Markov-blanket score of the current state is
    /// positive and the sweeps keep it that way.
    ///
    /// Draws are repeated up to `max_rejection_factor` times.
    fn initial_state(&self, rng: &mut impl Rng) -> NetworkResult<Event> {
        let attempts = self.config().max_rejection_factor.max(1);
        for attempt in 1..=attempts {
            let event = self.clamped_draw(rng)?;
            if self.joint_probability(&event)? > 0.0 {
                debug!("{}: chain start found on draw {}", self.title(), attempt);
                return Ok(event);
            }
            trace!("{}: start [{}] is impossible, redrawing", self.title(), event);
        }
        warn!(
            "{}: no start state consistent with [{}] after {} draws",
            self.title(),
            self.evidence(),
            attempts
        );
        Err(NetworkError::NoAcceptedSamples { attempts })
    }

    /// Product of every node's probability of its state in a complete
    /// `event`.
    fn joint_probability(&self, event: &Event) -> NetworkResult<f64> {
        let mut joint = 1.0;
        for (_, node) in self.nodes() {
            joint *= node.evaluate_marginal(self, event.get_state(node.name())?, event)?;
            if joint <= 0.0 {
                break;
            }
        }
        Ok(joint)
    }

    /// Evidence plus an ancestral draw for every other node.
    ///
    /// Nodes are drawn once all their parents have a state. Nodes that never
    /// get there (a cycle) start at their first state and are left to the
    /// Markov-blanket sweeps.
    fn clamped_draw(&self, rng: &mut impl Rng) -> NetworkResult<Event> {
        let mut event = self.evidence().clone();
        loop {
            let mut progressed = false;
            let mut waiting = false;
            for (_, node) in self.nodes() {
                if event.has(node.name()) {
                    continue;
                }
                if node.can_be_evaluated(self, &event) {
                    let state = node.get_random_state(self, &event, rng)?;
                    event.set(node.name(), &state);
                    progressed = true;
                } else {
                    waiting = true;
                }
            }
            if !waiting {
                return Ok(event);
            }
            if !progressed {
                break;
            }
        }

        for (_, node) in self.nodes() {
            if !event.has(node.name()) {
                debug!("{}: {} has no ancestral order, starting at first state", self.title(), node.name());
                let state = node.first_state()?;
                event.set(node.name(), state);
            }
        }
        Ok(event)
    }

    /// A complete draw in topological order. Nodes already set in `event`
    /// are kept as they are.
    fn ancestral_sample(&self, order: &[NodeId], mut event: Event, rng: &mut impl Rng) -> NetworkResult<Event> {
        for id in order {
            let node = self.node(*id);
            if event.has(node.name()) {
                continue;
            }
            let state = node.get_random_state(self, &event, rng)?;
            event.set(node.name(), &state);
        }
        Ok(event)
    }

    fn rejection_tally(&self, target: NodeId, rng: &mut impl Rng) -> NetworkResult<Tally> {
        let config = self.config();
        let order = self.topological_order()?;
        let target_name = self.node(target).name();
        let max_attempts = config.samples.saturating_mul(config.max_rejection_factor);

        let mut tally = Tally::default();
        let mut accepted = 0;
        let mut attempts = 0;
        while accepted < config.samples && attempts < max_attempts {
            attempts += 1;
            let sample = self.ancestral_sample(&order, Event::new(), rng)?;
            if sample.is_consistent_with(self.evidence()) {
                tally.add(sample.get_state(target_name)?, 1.0);
                accepted += 1;
            }
        }

        if accepted == 0 {
            return Err(NetworkError::NoAcceptedSamples { attempts });
        }
        if accepted < config.samples {
            warn!(
                "{}: only {} of {} samples accepted after {} attempts",
                self.title(),
                accepted,
                config.samples,
                attempts
            );
        }
        debug!("{}: accepted {} of {} prior samples", self.title(), accepted, attempts);
        Ok(tally)
    }

    fn likelihood_tally(&self, target: NodeId, rng: &mut impl Rng) -> NetworkResult<Tally> {
        let config = self.config();
        let order = self.topological_order()?;
        let target_name = self.node(target).name();
        let observed: Vec<NodeId> = order
            .iter()
            .copied()
            .filter(|id| self.evidence().has(self.node(*id).name()))
            .collect();

        let mut tally = Tally::default();
        for _ in 0..config.samples {
            let sample = self.ancestral_sample(&order, self.evidence().clone(), rng)?;
            let mut weight = 1.0;
            for id in &observed {
                let node = self.node(*id);
                weight *= node.evaluate_marginal(self, sample.get_state(node.name())?, &sample)?;
            }
            tally.add(sample.get_state(target_name)?, weight);
        }

        if tally.total <= 0.0 {
            return Err(NetworkError::ZeroProbabilityMass {
                node: target_name.to_string(),
            });
        }
        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::config::InferenceConfig;
    use crate::network::node::Node;

    /// A -> B, P(A=T) = 0.3, P(B=T|A=T) = 0.9, P(B=T|A=F) = 0.2.
    fn chain(config: InferenceConfig) -> Net {
        let mut net = Net::new("chain").with_config(config);
        let a = net.add_node(Node::with_states("A", &["T", "F"])).unwrap();
        let b = net.add_node(Node::with_states("B", &["T", "F"])).unwrap();
        net.add_child(a, b);
        let start = net.node(a).first_combination(&net).unwrap();
        net.fill_table(a, &start, &[0.3, 0.7]).unwrap();
        let start = net.node(b).first_combination(&net).unwrap();
        net.fill_table(b, &start, &[0.9, 0.2, 0.1, 0.8]).unwrap();
        net
    }

    #[test]
    fn test_tally_keeps_unsampled_states() {
        let mut tally = Tally::default();
        tally.add("a", 3.0);
        tally.add("b", 1.0);
        let states = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let result = tally.normalize(&states);
        assert_eq!(result["a"], 0.75);
        assert_eq!(result["b"], 0.25);
        assert_eq!(result["c"], 0.0);
    }

    #[test]
    fn test_diagnostic_query_in_every_mode() {
        // P(A=T | B=T) = 0.27 / 0.41
        let expected = 0.27 / 0.41;
        for mode in [
            InferenceMode::MarkovChainMonteCarlo,
            InferenceMode::RejectionSampling,
            InferenceMode::LikelihoodWeighting,
        ] {
            let config = InferenceConfig::default()
                .with_mode(mode)
                .with_samples(20_000)
                .with_seed(3);
            let mut net = chain(config);
            net.set_evidence(Event::from_iter([("B", "T")]));
            let result = net.query_node("A").unwrap();
            assert!(
                (result["T"] - expected).abs() < 0.03,
                "{mode}: P(A=T|B=T) = {}",
                result["T"]
            );
            assert!((result["T"] + result["F"] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeded_queries_repeat() {
        let config = InferenceConfig::default().with_seed(99);
        let mut net = chain(config);
        net.set_evidence(Event::from_iter([("B", "F")]));
        assert_eq!(net.query_node("A").unwrap(), net.query_node("A").unwrap());
    }

    #[test]
    fn test_query_of_evidence_node_is_certain() {
        let mut net = chain(InferenceConfig::default().with_seed(5).with_samples(200));
        net.set_evidence(Event::from_iter([("A", "F")]));
        let result = net.query_node("A").unwrap();
        assert_eq!(result["F"], 1.0);
        assert_eq!(result["T"], 0.0);
    }

    #[test]
    fn test_query_unknown_node() {
        let net = chain(InferenceConfig::default());
        assert_eq!(
            net.query_node("Z"),
            Err(NetworkError::NodeNotFound {
                name: "Z".to_string()
            })
        );
    }

    #[test]
    fn test_rejection_with_impossible_evidence() {
        let config = InferenceConfig {
            mode: InferenceMode::RejectionSampling,
            samples: 10,
            max_rejection_factor: 5,
            seed: Some(1),
            ..InferenceConfig::default()
        };
        let mut net = chain(config);
        net.set_evidence(Event::from_iter([("B", "never")]));
        assert_eq!(
            net.query_node("A"),
            Err(NetworkError::NoAcceptedSamples { attempts: 50 })
        );
    }

    /// A, B ~ 0.5 and C = A AND B.
    fn and_gate(config: InferenceConfig) -> Net {
        let mut net = Net::new("and").with_config(config);
        let a = net.add_node(Node::with_states("A", &["T", "F"])).unwrap();
        let b = net.add_node(Node::with_states("B", &["T", "F"])).unwrap();
        let c = net.add_node(Node::with_states("C", &["T", "F"])).unwrap();
        net.add_child(a, c);
        net.add_child(b, c);
        for id in [a, b] {
            let start = net.node(id).first_combination(&net).unwrap();
            net.fill_table(id, &start, &[0.5, 0.5]).unwrap();
        }
        let start = net.node(c).first_combination(&net).unwrap();
        net.fill_table(c, &start, &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
            .unwrap();
        net
    }

    #[test]
    fn test_chain_start_agrees_with_deterministic_evidence() {
        for seed in 0..20 {
            let mut net = and_gate(InferenceConfig::default().with_seed(seed).with_samples(50));
            net.set_evidence(Event::from_iter([("C", "T")]));

            let start = net.initial_state(&mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
            assert_eq!(start.as_str(), "A = T, B = T, C = T");
            assert_eq!(net.joint_probability(&start).unwrap(), 0.25);
        }
    }

    #[test]
    fn test_joint_probability_of_impossible_draw() {
        let net = and_gate(InferenceConfig::default());
        let event = Event::from_iter([("A", "F"), ("B", "T"), ("C", "T")]);
        assert_eq!(net.joint_probability(&event).unwrap(), 0.0);
    }

    #[test]
    fn test_markov_chain_with_impossible_evidence() {
        let config = InferenceConfig {
            max_rejection_factor: 7,
            seed: Some(2),
            ..InferenceConfig::default()
        };
        let mut net = chain(config);
        net.set_evidence(Event::from_iter([("B", "never")]));
        assert_eq!(
            net.query_node("A"),
            Err(NetworkError::NoAcceptedSamples { attempts: 7 })
        );
    }

    #[test]
    fn test_zero_samples_is_rejected_in_every_mode() {
        for mode in [
            InferenceMode::MarkovChainMonteCarlo,
            InferenceMode::RejectionSampling,
            InferenceMode::LikelihoodWeighting,
        ] {
            let net = chain(InferenceConfig::default().with_mode(mode).with_samples(0));
            assert_eq!(net.query_node("A"), Err(NetworkError::NoSamplesRequested));
        }
    }

    #[test]
    fn test_cyclic_network_needs_markov_chain() {
        let mut net = Net::new("loop").with_config(
            InferenceConfig::default()
                .with_mode(InferenceMode::LikelihoodWeighting)
                .with_seed(1),
        );
        let a = net.add_node(Node::with_states("A", &["T", "F"])).unwrap();
        let b = net.add_node(Node::with_states("B", &["T", "F"])).unwrap();
        net.add_child(a, b);
        net.add_child(b, a);
        assert!(matches!(
            net.query_node("A"),
            Err(NetworkError::CyclicNetwork { .. })
        ));
    }
}
