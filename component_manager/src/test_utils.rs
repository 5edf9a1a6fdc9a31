//! Test utilities for messaging tests
//!
//! Listeners that record, fail or echo, a registry with a couple of stock
//! component types, and constructors for managers running on a manual clock.

use crate::messenger::{Listener, ListenerHandle, Messenger};
use crate::registry::ComponentRegistry;
use crate::{ComponentManager, ManagerConfig};
use core_types::{Address, ChannelId, ComponentId, ComponentType, ManagerId};
use ipc::{Message, MessageType, SendFlags};
use platform_api::{LocalPlatform, ManualClock, MessagingError, Platform, ProcessFlags};
use std::cell::RefCell;
use std::rc::Rc;

/// Component type with no behaviour of its own
pub const TEST_COMPONENT: &str = "test";

/// Component type whose root channel echoes every domain message
pub const ECHO_COMPONENT: &str = "echo";

/// Listener that keeps a copy of everything it receives
#[derive(Debug, Default)]
pub struct RecordingListener {
    messages: Vec<Message>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder plus the handle to register it with
    ///
    /// Keep the first value alive for as long as the recording matters.
    pub fn handle() -> (Rc<RefCell<RecordingListener>>, ListenerHandle) {
        let recorder = Rc::new(RefCell::new(RecordingListener::new()));
        let handle: ListenerHandle = recorder.clone();
        (recorder, handle)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn count(&self) -> usize {
        self.messages.len()
    }

    /// Number of received messages of one type
    pub fn count_of(&self, message_type: &MessageType) -> usize {
        self.messages
            .iter()
            .filter(|message| &message.message_type == message_type)
            .count()
    }

    pub fn types(&self) -> Vec<MessageType> {
        self.messages
            .iter()
            .map(|message| message.message_type.clone())
            .collect()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Listener for RecordingListener {
    fn on_message(
        &mut self,
        message: &Message,
        _manager: &mut ComponentManager,
    ) -> Result<(), MessagingError> {
        self.messages.push(message.clone());
        Ok(())
    }
}

/// Listener that rejects every message
#[derive(Debug)]
pub struct FailingListener {
    reason: String,
    calls: usize,
}

impl FailingListener {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Listener for FailingListener {
    fn on_message(
        &mut self,
        _message: &Message,
        _manager: &mut ComponentManager,
    ) -> Result<(), MessagingError> {
        self.calls += 1;
        Err(MessagingError::Handler(self.reason.clone()))
    }
}

/// Listener that answers every domain message on the channel it arrived at
#[derive(Debug, Default)]
pub struct EchoListener;

impl Listener for EchoListener {
    fn on_message(
        &mut self,
        message: &Message,
        manager: &mut ComponentManager,
    ) -> Result<(), MessagingError> {
        let (MessageType::Domain(_), Some(channel)) = (&message.message_type, message.destination)
        else {
            return Ok(());
        };
        let reply = Message::new(message.message_type.clone(), message.payload.clone());
        manager
            .channel(channel)?
            .reply_to(message, reply, SendFlags::NONE)
    }
}

/// Factory for [`ECHO_COMPONENT`]: echoes on the root channel
pub fn echo_factory(manager: &mut ComponentManager, component: Address) -> Result<(), MessagingError> {
    let echo = Rc::new(RefCell::new(EchoListener));
    let handle: ListenerHandle = echo.clone();

    let mut created = manager.component(component)?;
    created.retain(echo)?;
    if let Some(root) = created.root_channel()? {
        manager.channel(root)?.add_listener_with(&handle, true)?;
    }
    Ok(())
}

/// Registry with [`TEST_COMPONENT`] and [`ECHO_COMPONENT`]
pub fn test_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    let noop = |_: &mut ComponentManager, _: Address| -> Result<(), MessagingError> { Ok(()) };
    // Fresh registry: neither registration can collide.
    let _ = registry.register(TEST_COMPONENT, noop);
    let _ = registry.register(ECHO_COMPONENT, echo_factory);
    registry
}

/// Manager `id` on `platform`, using the test registry and a manual clock
///
/// The manager is its own initial manager.
pub fn manager_with(
    id: ManagerId,
    platform: impl Platform + 'static,
) -> (ComponentManager, ManualClock) {
    let clock = ManualClock::new();
    let config = ManagerConfig::new(id).with_initial_manager(id);
    let manager = ComponentManager::new(config, Box::new(platform))
        .with_clock(Rc::new(clock.clone()))
        .with_registry(test_registry());
    (manager, clock)
}

/// Stand-alone manager on a [`LocalPlatform`]
pub fn local_manager(id: ManagerId) -> (ComponentManager, ManualClock) {
    manager_with(id, LocalPlatform::new())
}

/// Creates a connected client/server channel pair on `manager`
///
/// The server channel echoes. Both live in a fresh [`TEST_COMPONENT`].
pub fn echo_pair(manager: &mut ComponentManager) -> Result<(Address, Address), MessagingError> {
    let component = manager.create_component(TEST_COMPONENT)?;
    let echo = Rc::new(RefCell::new(EchoListener));
    let handle: ListenerHandle = echo.clone();

    let mut owner = manager.component(component)?;
    owner.retain(echo)?;
    let server = owner.create_channel(None, Some(&handle))?;
    let client = owner.create_channel(Some(server), None)?;

    manager.channel(client)?.connect()?;
    manager.run_until_idle();
    Ok((client, server))
}

/// Platform pretending to be a remote manager that echoes every domain message
///
/// Replies come back through `process_events`, the way a real transport
/// delivers while a manager waits in an exchange.
#[derive(Debug, Default)]
pub struct EchoPeerPlatform {
    replies: Vec<Message>,
    sent: Vec<Message>,
}

impl EchoPeerPlatform {
    /// The remote channel the peer answers as
    pub const PEER: Address = Address::channel(ManagerId::new(99), ComponentId::FIRST, ChannelId::ROOT);

    pub fn new() -> Self {
        Self::default()
    }

    /// Everything handed to the platform so far
    pub fn sent(&self) -> &[Message] {
        &self.sent
    }
}

impl Platform for EchoPeerPlatform {
    fn send_message(&mut self, message: Message) -> Result<(), MessagingError> {
        if let MessageType::Domain(_) = message.message_type {
            let reply = Message::new(message.message_type.clone(), message.payload.clone());
            self.replies.push(message.mirror_into(reply));
        }
        self.sent.push(message);
        Ok(())
    }

    fn request_peer(
        &mut self,
        requester: Address,
        _component_type: &ComponentType,
    ) -> Result<ManagerId, MessagingError> {
        Ok(requester.manager)
    }

    fn on_component_created(&mut self, _address: Address) {}

    fn process_events(&mut self, flags: ProcessFlags) -> Result<Vec<Message>, MessagingError> {
        if flags.contains(ProcessFlags::PROCESS_IPC_MESSAGES) {
            Ok(std::mem::take(&mut self.replies))
        } else {
            Ok(Vec::new())
        }
    }
}
