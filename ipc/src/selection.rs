//! Message selections
//!
//! A selection is a predicate over messages. Managers use them as dispatch
//! filters: while a filter is installed, every message it selects stays in
//! the inbox.

use crate::{Message, MessageType};
use core_types::{Address, ComponentId, ManagerId};

/// A predicate over messages
pub trait MessageSelection {
    /// Checks if `message` belongs to this selection
    fn is_member(&self, message: &Message) -> bool;
}

/// Selects every message of one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSelection(pub MessageType);

impl MessageSelection for TypeSelection {
    fn is_member(&self, message: &Message) -> bool {
        message.message_type == self.0
    }
}

/// Selects messages addressed to a manager, or to one component within it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationSelection {
    pub manager: ManagerId,
    pub component: Option<ComponentId>,
}

impl MessageSelection for DestinationSelection {
    fn is_member(&self, message: &Message) -> bool {
        message
            .destination
            .map_or(false, |dst| dst.matches_peer(self.manager, self.component))
    }
}

/// Selects everything except messages addressed to one address
///
/// Installed while a caller waits for a reply on a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptDestination(pub Address);

impl MessageSelection for ExceptDestination {
    fn is_member(&self, message: &Message) -> bool {
        message.destination != Some(self.0)
    }
}

/// Selection backed by a closure
pub struct FnSelection<F>(pub F)
where
    F: Fn(&Message) -> bool;

impl<F> MessageSelection for FnSelection<F>
where
    F: Fn(&Message) -> bool,
{
    fn is_member(&self, message: &Message) -> bool {
        (self.0)(message)
    }
}
