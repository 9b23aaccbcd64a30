//! Aggregate trait: command handling and event folding.

use serde::{Serialize, de::DeserializeOwned};

/// A piece of state that is only ever changed by folding domain events.
///
/// The implementing type itself serves as the state.
///
/// # Associated Types
///
/// - `Command`: the set of intents this state accepts.
/// - `DomainEvent`: the set of changes this state can undergo.
/// - `Error`: command rejection error.
///
/// # Contract
///
/// - [`handle`](Aggregate::handle) must be a pure decision function: no I/O, no side effects.
///   It inspects the current state and returns the events describing the change.
/// - [`apply`](Aggregate::apply) must be a pure, total function. It takes ownership of
///   the current state and a reference to a domain event, returning the next state.
pub trait Aggregate:
    Default + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Default key under which the state record is persisted.
    const RECORD_KEY: &'static str;

    /// The set of commands this aggregate can handle.
    type Command: Send + 'static;

    /// The set of events this aggregate can produce and apply.
    type DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone + 'static;

    /// Command rejection error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decide which events a command produces against the current state.
    ///
    /// Returns `Ok(vec![])` if the command is a no-op.
    fn handle(&self, cmd: Self::Command) -> Result<Vec<Self::DomainEvent>, Self::Error>;

    /// Apply a single event to produce the next state.
    fn apply(self, event: &Self::DomainEvent) -> Self;
}

/// Fold a sequence of events into `state`.
pub fn apply_all<'e, A, I>(state: A, events: I) -> A
where
    A: Aggregate,
    I: IntoIterator<Item = &'e A::DomainEvent>,
{
    events.into_iter().fold(state, |state, event| state.apply(event))
}
