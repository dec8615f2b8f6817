use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of samples a query draws unless configured otherwise.
pub const DEFAULT_SAMPLES: usize = 1000;

/// How [`Net::query_node`](super::net::Net::query_node) approximates the
/// posterior.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
pub enum InferenceMode {
    /// Gibbs sampling over each node's Markov blanket.
    #[default]
    #[serde(rename = "mcmc")]
    #[value(name = "mcmc")]
    MarkovChainMonteCarlo,

    /// Prior samples that disagree with the evidence are thrown away.
    #[serde(rename = "rejection")]
    #[value(name = "rejection")]
    RejectionSampling,

    /// Evidence is clamped and each sample weighted by its likelihood.
    #[serde(rename = "likelihood")]
    #[value(name = "likelihood")]
    LikelihoodWeighting,
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InferenceMode::MarkovChainMonteCarlo => "mcmc",
            InferenceMode::RejectionSampling => "rejection",
            InferenceMode::LikelihoodWeighting => "likelihood",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub mode: InferenceMode,

    /// Tallied samples per query.
    pub samples: usize,

    /// Gibbs sweeps discarded before tallying starts (MCMC only).
    pub burn_in: usize,

    /// Seed for the query's random source; `None` draws one from the OS.
    pub seed: Option<u64>,

    /// Rejection sampling gives up after `samples * max_rejection_factor`
    /// attempts.
    pub max_rejection_factor: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            mode: InferenceMode::default(),
            samples: DEFAULT_SAMPLES,
            burn_in: 100,
            seed: None,
            max_rejection_factor: 100,
        }
    }
}

impl InferenceConfig {
    pub fn with_mode(mut self, mode: InferenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
