pub mod activation_store;
pub mod router;

pub use activation_store::ActivationStore;
pub use router::{InboundMessage, MessageRouter, RouteDecision};
