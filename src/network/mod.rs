pub mod config;
pub mod document;
pub mod errors;
pub mod event;
pub mod naming;
pub mod net;
pub mod node;
pub mod sampling;

// Re-export the types most callers need
pub use config::{InferenceConfig, InferenceMode};
pub use document::NetDocument;
pub use errors::{NetworkError, NetworkResult};
pub use event::Event;
pub use naming::NameFactory;
pub use net::Net;
pub use node::{Combination, Node, NodeId};
pub use sampling::StateProbabilities;
