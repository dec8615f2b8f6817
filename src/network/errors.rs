/// Failures raised by the inference core.
///
/// None of these are retried internally. Each one means the network or the
/// query is malformed, and the operation that raised it is abandoned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("Unknown variable '{name}' in event")]
    UnknownVariable { name: String },

    #[error("Event contains invalid state '{state}' for node '{node}'")]
    InvalidStateInAssignment { node: String, state: String },

    #[error("Encountered stateless node '{node}'")]
    StatelessVariable { node: String },

    #[error("Marginal of '{node}' cannot be evaluated: parent '{parent}' has no state in evidence")]
    MarginalUnavailable { node: String, parent: String },

    #[error("Node '{name}' not found in network")]
    NodeNotFound { name: String },

    #[error("Node '{name}' already exists in network")]
    DuplicateNode { name: String },

    #[error("Network '{title}' contains a cycle")]
    CyclicNetwork { title: String },

    #[error("States of '{node}' have zero total probability mass")]
    ZeroProbabilityMass { node: String },

    #[error("No sample out of {attempts} agreed with the evidence")]
    NoAcceptedSamples { attempts: usize },

    #[error("A query needs at least one sample")]
    NoSamplesRequested,
}

pub type NetworkResult<T> = Result<T, NetworkError>;
