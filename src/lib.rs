pub mod common;
pub mod network;
pub mod scenarios;
pub mod storage;

pub use network::{Event, Net, NetDocument, NetworkError, Node};
pub use storage::NetworkStore;
