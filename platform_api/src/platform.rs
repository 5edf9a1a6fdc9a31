//! Platform collaborator contract

use crate::MessagingError;
use core_types::{Address, ComponentType, ManagerId};
use ipc::Message;

/// Options for [`Platform::process_events`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProcessFlags(u32);

impl ProcessFlags {
    pub const NONE: ProcessFlags = ProcessFlags(0);

    /// Hand pending inter-manager messages to the calling manager
    pub const PROCESS_IPC_MESSAGES: ProcessFlags = ProcessFlags(1);

    pub const fn contains(&self, other: ProcessFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// The collaborator that carries messages between managers
///
/// A manager hands every message whose destination lives on another
/// manager to its platform, and asks it where new components should run.
/// How delivery happens (queue, pipe, socket) is the platform's business;
/// it only has to end up calling `ComponentManager::receive` on the
/// destination manager, on that manager's own thread.
///
/// Implementations:
/// - [`LocalPlatform`]: one manager, nothing to forward
/// - `sim_platform::SimPlatform`: several managers in one thread (testing)
pub trait Platform {
    /// Transports a message whose destination is on another manager
    fn send_message(&mut self, message: Message) -> Result<(), MessagingError>;

    /// Decides which manager hosts a new component of `component_type`
    ///
    /// The initial manager forwards the request to the returned manager.
    fn request_peer(
        &mut self,
        requester: Address,
        component_type: &ComponentType,
    ) -> Result<ManagerId, MessagingError>;

    /// Called after a component was created in response to a peer request
    fn on_component_created(&mut self, address: Address);

    /// Lets the platform service its own event sources
    ///
    /// Called while a manager waits inside a synchronous exchange. With
    /// `PROCESS_IPC_MESSAGES` the platform returns the messages that have
    /// arrived for the calling manager; the manager receives them.
    fn process_events(&mut self, _flags: ProcessFlags) -> Result<Vec<Message>, MessagingError> {
        Ok(Vec::new())
    }
}

/// Platform for a single manager
///
/// Places every component on the requesting manager and refuses to carry
/// messages anywhere else.
#[derive(Debug, Default)]
pub struct LocalPlatform {
    created: Vec<Address>,
}

impl LocalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Components created through peer requests, in creation order
    pub fn created_components(&self) -> &[Address] {
        &self.created
    }
}

impl Platform for LocalPlatform {
    fn send_message(&mut self, _message: Message) -> Result<(), MessagingError> {
        Err(MessagingError::NoRoute)
    }

    fn request_peer(
        &mut self,
        requester: Address,
        _component_type: &ComponentType,
    ) -> Result<ManagerId, MessagingError> {
        Ok(requester.manager)
    }

    fn on_component_created(&mut self, address: Address) {
        self.created.push(address);
    }
}
