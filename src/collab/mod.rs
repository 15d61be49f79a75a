//! External collaborators
//!
//! Touched only at their interface boundary: the rules engine and NLU
//! fallback over HTTP, and the transaction event transport over NATS.

mod events;
mod rules;

pub use events::{EventPublisher, TransactionEvent};
pub use rules::{parse_rule, CollabError, ParseOutcome, RuleForwarder};
