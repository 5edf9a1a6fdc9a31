//! Deterministic fault injection for the simulated network
//!
//! Lets tests lose or slow down messages in transit between managers.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: No randomness; a plan always affects the same messages
//! - **Composable**: Several faults can be combined in one plan
//! - **Test-focused**: Not intended for production use
//!
//! ## Example
//!
//! ```
//! use sim_platform::fault_injection::{FaultPlan, MessageFault};
//! use core_types::{Duration, ManagerId};
//!
//! let plan = FaultPlan::new()
//!     .with_message_fault(MessageFault::DropToManager { manager: ManagerId::new(2), count: 1 })
//!     .with_message_fault(MessageFault::Delay { duration: Duration::from_millis(100) });
//! assert_eq!(plan.message_faults().len(), 2);
//! ```

use core_types::{Duration, ManagerId};
use ipc::{Message, MessageType};
use std::collections::HashMap;

/// A fault to inject into cross-manager delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFault {
    /// Drop the next N messages to any manager
    DropNext { count: usize },

    /// Drop the next N messages to one manager
    DropToManager { manager: ManagerId, count: usize },

    /// Drop every message of a type
    DropMatching { message_type: MessageType },

    /// Delay the next message by a duration
    Delay { duration: Duration },
}

/// A plan describing all faults to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    message_faults: Vec<MessageFault>,
}

impl FaultPlan {
    /// Creates a new empty fault plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a message fault to the plan
    pub fn with_message_fault(mut self, fault: MessageFault) -> Self {
        self.message_faults.push(fault);
        self
    }

    pub fn message_faults(&self) -> &[MessageFault] {
        &self.message_faults
    }
}

/// Applies a [`FaultPlan`] to messages as they cross the network
#[derive(Debug, Default)]
pub struct FaultInjector {
    drop_next_count: usize,
    drop_to_manager: HashMap<ManagerId, usize>,
    drop_types: Vec<MessageType>,
    pending_delays: Vec<Duration>,
    dropped: usize,
}

impl FaultInjector {
    /// Creates a new fault injector with the given plan
    pub fn new(plan: FaultPlan) -> Self {
        let mut injector = Self::default();
        for fault in plan.message_faults {
            match fault {
                MessageFault::DropNext { count } => injector.drop_next_count += count,
                MessageFault::DropToManager { manager, count } => {
                    *injector.drop_to_manager.entry(manager).or_default() += count;
                }
                MessageFault::DropMatching { message_type } => {
                    injector.drop_types.push(message_type)
                }
                MessageFault::Delay { duration } => injector.pending_delays.push(duration),
            }
        }
        // Delays are consumed from the back.
        injector.pending_delays.reverse();
        injector
    }

    /// Checks if a message should be lost, consuming one-shot faults
    pub fn should_drop(&mut self, message: &Message) -> bool {
        let drop = self.take_drop(message);
        if drop {
            self.dropped += 1;
        }
        drop
    }

    fn take_drop(&mut self, message: &Message) -> bool {
        if self.drop_next_count > 0 {
            self.drop_next_count -= 1;
            return true;
        }

        if let Some(manager) = message.destination.map(|destination| destination.manager) {
            if let Some(count) = self.drop_to_manager.get_mut(&manager) {
                if *count > 0 {
                    *count -= 1;
                    return true;
                }
            }
        }

        self.drop_types.contains(&message.message_type)
    }

    /// Returns the delay to add to the next delivered message, if any
    pub fn take_delay(&mut self) -> Option<Duration> {
        self.pending_delays.pop()
    }

    /// Number of messages lost so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}
