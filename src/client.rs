mod negotiator;

pub use negotiator::{NegotiationError, SubscriptionNegotiator};
