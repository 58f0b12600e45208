//! High-level components: the CAN transport layer with its chunk protocol,
//! and the node that drives it.
pub mod node;
pub mod transport;
