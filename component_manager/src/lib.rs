//! # Component Manager
//!
//! One manager per thread. It owns the components living on that thread,
//! queues the messages addressed to them and dispatches one message at a
//! time to the right component, channel or listener.
//!
//! ## Philosophy
//!
//! - **Run to completion**: a message is fully handled before the next one starts
//! - **No ambient state**: listeners get the dispatching manager passed in
//! - **Peers are plain addresses**: cross-manager delivery is the platform's job
//! - **Teardown is symmetric**: whichever end goes first, the other end is told
//!
//! ## Scheduling
//!
//! The host drives the manager with [`ComponentManager::run_slice`], which
//! dispatches ready messages for a bounded time and reports when the next
//! one becomes ready. Dispatch filters hold selected messages back, which is
//! how [`ComponentManager::exchange`] waits for a reply without running
//! unrelated work.

pub mod channel;
pub mod component;
pub mod config;
pub mod exchange;
pub mod inbox;
pub mod messenger;
pub mod registry;
pub mod store;
pub mod test_utils;

pub use channel::{Channel, ChannelRef, ChannelState};
pub use component::{Component, ComponentRef};
pub use config::ManagerConfig;
pub use inbox::{FilterId, Inbox, InboxError, NextWakeup};
pub use messenger::{fan_out, listener_fn, FnListener, Listener, ListenerHandle, ListenerList, Messenger};
pub use registry::{ComponentFactory, ComponentRegistry, RegistryError};
pub use store::ValueStore;

use core_types::{Address, AddressKind, ComponentId, ComponentType, Duration, Instant, ManagerId};
use inbox::FilterSet;
use ipc::{
    Message, MessagePayload, MessageSelection, MessageType, PeerGone, RequestComponent, SendFlags,
};
use platform_api::{Clock, MessagingError, Platform, SystemClock};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::{debug, error, trace, warn};

/// Counters describing what a manager has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Messages dispatched to local components, channels or listeners
    pub messages_dispatched: u64,
    /// Messages handed to the platform for another manager
    pub messages_forwarded: u64,
    /// Messages for vanished endpoints answered with a disconnect-notify
    pub messages_bounced: u64,
    pub components_created: u64,
    pub components_destroyed: u64,
}

/// Owner and dispatcher of the components on one thread
pub struct ComponentManager {
    config: ManagerConfig,
    platform: Box<dyn Platform>,
    clock: Rc<dyn Clock>,
    registry: ComponentRegistry,
    components: BTreeMap<ComponentId, Component>,
    next_component_id: ComponentId,
    inbox: Inbox,
    filters: FilterSet,
    listeners: ListenerList,
    values: ValueStore,
    /// Managers this one has exchanged messages with
    known_peers: BTreeSet<ManagerId>,
    stats: ManagerStats,
    shut_down: bool,
}

impl ComponentManager {
    /// Creates a manager running on the system clock
    pub fn new(config: ManagerConfig, platform: Box<dyn Platform>) -> Self {
        debug!(manager = %config.manager_id, initial = %config.initial_manager, "manager created");
        Self {
            inbox: Inbox::with_capacity(config.inbox_capacity),
            config,
            platform,
            clock: Rc::new(SystemClock::new()),
            registry: ComponentRegistry::new(),
            components: BTreeMap::new(),
            next_component_id: ComponentId::FIRST,
            filters: FilterSet::new(),
            listeners: ListenerList::new(),
            values: ValueStore::new(),
            known_peers: BTreeSet::new(),
            stats: ManagerStats::default(),
            shut_down: false,
        }
    }

    /// Replaces the clock (tests use a `ManualClock`)
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the component registry
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn id(&self) -> ManagerId {
        self.config.manager_id
    }

    /// Address of this manager
    pub fn address(&self) -> Address {
        Address::manager(self.id())
    }

    pub fn initial_manager(&self) -> ManagerId {
        self.config.initial_manager
    }

    /// Checks if this manager places requested components
    pub fn is_initial(&self) -> bool {
        self.config.is_initial()
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        self.clock.clone()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn platform_mut(&mut self) -> &mut dyn Platform {
        self.platform.as_mut()
    }

    /// Managers this one has exchanged messages with
    pub fn known_peers(&self) -> impl Iterator<Item = ManagerId> + '_ {
        self.known_peers.iter().copied()
    }

    /// Number of queued messages, including delayed and filtered ones
    pub fn pending_messages(&self) -> usize {
        self.inbox.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Addresses of all live components, in id order
    pub fn component_addresses(&self) -> Vec<Address> {
        self.components.values().map(Component::address).collect()
    }

    pub fn get_component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    pub(crate) fn get_component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(&id)
    }

    /// Looks up a local channel
    pub fn get_channel(&self, address: Address) -> Option<&Channel> {
        if address.manager != self.id() || !address.is_channel() {
            return None;
        }
        self.components.get(&address.component)?.channel(address.channel)
    }

    pub(crate) fn get_channel_mut(&mut self, address: Address) -> Option<&mut Channel> {
        if address.manager != self.id() || !address.is_channel() {
            return None;
        }
        self.components
            .get_mut(&address.component)?
            .channel_mut(address.channel)
    }

    /// Borrows a local component
    pub fn component(&mut self, address: Address) -> Result<ComponentRef<'_>, MessagingError> {
        if address.manager != self.id()
            || address.is_manager()
            || !self.components.contains_key(&address.component)
        {
            return Err(MessagingError::NotFound(format!("component {}", address)));
        }
        Ok(ComponentRef::new(self, address.component_address()))
    }

    /// Borrows a local channel
    pub fn channel(&mut self, address: Address) -> Result<ChannelRef<'_>, MessagingError> {
        if self.get_channel(address).is_none() {
            return Err(MessagingError::NotFound(format!("channel {}", address)));
        }
        Ok(ChannelRef::new(self, address))
    }

    /// Hands out the next component id; `u32::MAX` is never issued
    fn allocate_component_id(&mut self) -> Result<ComponentId, MessagingError> {
        let id = self.next_component_id;
        match id.checked_next() {
            Some(next) => {
                self.next_component_id = next;
                Ok(id)
            }
            None => {
                error!(manager = %self.id(), "component ids exhausted");
                Err(MessagingError::AddressSpaceExhausted(format!(
                    "component ids of {}",
                    self.id()
                )))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_next_component_id(&mut self, id: ComponentId) {
        self.next_component_id = id;
    }

    fn insert_component(&mut self, component: Component) {
        self.stats.components_created += 1;
        debug!(
            component = %component.address(),
            component_type = %component.component_type(),
            "component created"
        );
        self.components.insert(component.id(), component);
    }

    /// Creates a component directly, without a root channel
    ///
    /// Used to bootstrap the first components of a program. Components
    /// created this way live until destroyed explicitly or until shutdown.
    pub fn create_component(
        &mut self,
        component_type: impl Into<ComponentType>,
    ) -> Result<Address, MessagingError> {
        let component_type = component_type.into();
        let factory = self.registry.lookup(&component_type)?;
        let id = self.allocate_component_id()?;
        let address = Address::component(self.id(), id);
        self.insert_component(Component::new(address, component_type));

        if let Err(err) = factory.instantiate(self, address) {
            warn!(component = %address, error = %err, "component instantiation failed");
            if self.components.contains_key(&id) {
                self.destroy_component(id)?;
            }
            return Err(err);
        }
        Ok(address)
    }

    /// Creates a component in answer to a placed request
    ///
    /// The component's root channel is connected to the requester before
    /// the factory runs, so the factory may already send on it.
    fn create_requested_component(
        &mut self,
        request: &RequestComponent,
    ) -> Result<Address, MessagingError> {
        let factory = self.registry.lookup(&request.component_type)?;
        let id = self.allocate_component_id()?;
        let address = Address::component(self.id(), id);

        let mut component = Component::new(address, request.component_type.clone());
        let root = component.register_channel(Channel::with_destination(request.requester), true)?;
        self.insert_component(component);

        let result = self
            .send(Message::connect_notify(root, request.requester), SendFlags::NONE)
            .and_then(|()| factory.instantiate(self, address));
        if let Err(err) = result {
            warn!(component = %address, error = %err, "requested component failed to start");
            if self.components.contains_key(&id) {
                self.destroy_component(id)?;
            }
            return Err(err);
        }

        self.platform.on_component_created(address);
        Ok(address)
    }

    /// Destroys a component
    ///
    /// Every connected channel tells its peer; objects retained by the
    /// component are released.
    pub fn destroy_component(&mut self, id: ComponentId) -> Result<(), MessagingError> {
        let component = self.components.remove(&id).ok_or_else(|| {
            MessagingError::NotFound(format!("component {}", Address::component(self.id(), id)))
        })?;
        let address = component.address();
        self.stats.components_destroyed += 1;

        let notices = component.teardown();
        debug!(component = %address, notices = notices.len(), "component destroyed");
        for notice in notices {
            self.send_notice(Some(notice));
        }
        Ok(())
    }

    /// Destroys a channel, notifying a connected peer
    ///
    /// Destroying a root channel destroys its component.
    pub fn destroy_channel(&mut self, address: Address) -> Result<(), MessagingError> {
        if self.get_channel(address).is_none() {
            return Err(MessagingError::NotFound(format!("channel {}", address)));
        }
        if address.is_root_channel() {
            return self.destroy_component(address.component);
        }

        let mut channel = self
            .components
            .get_mut(&address.component)
            .ok_or_else(|| MessagingError::NotFound(format!("channel {}", address)))?
            .deregister_channel(address.channel)?;
        let notice = channel.teardown();
        debug!(channel = %address, "channel destroyed");
        self.send_notice(notice);
        Ok(())
    }

    /// Sends an infrastructure notice, logging instead of failing
    pub(crate) fn send_notice(&mut self, notice: Option<Message>) {
        if let Some(notice) = notice {
            let destination = notice.destination;
            if let Err(err) = self.send(notice, SendFlags::NONE) {
                warn!(manager = %self.id(), ?destination, error = %err, "notice not delivered");
            }
        }
    }

    fn remember_peer(&mut self, manager: ManagerId) {
        if manager != self.id() {
            self.known_peers.insert(manager);
        }
    }

    /// Sends a message
    ///
    /// The manager is stamped as source if none is set. Local destinations
    /// go to the inbox, others to the platform.
    pub fn send(&mut self, mut message: Message, _flags: SendFlags) -> Result<(), MessagingError> {
        if message.source.is_none() {
            message.source = Some(self.address());
        }
        match message.destination {
            Some(destination) if destination.manager != self.id() => {
                self.remember_peer(destination.manager);
                self.forward(message)
            }
            _ => self.receive(message),
        }
    }

    fn forward(&mut self, message: Message) -> Result<(), MessagingError> {
        trace!(
            manager = %self.id(),
            id = %message.id,
            message_type = %message.message_type,
            destination = ?message.destination,
            "forwarding message"
        );
        self.stats.messages_forwarded += 1;
        self.platform.send_message(message)
    }

    /// Accepts a message into this manager
    ///
    /// Messages for this manager are queued, due after their delay; messages
    /// for another manager are relayed through the platform.
    pub fn receive(&mut self, message: Message) -> Result<(), MessagingError> {
        let Some(destination) = message.destination else {
            warn!(manager = %self.id(), id = %message.id, "discarding message without destination");
            return Err(MessagingError::NoDestination);
        };
        if destination.manager != self.id() {
            return self.forward(message);
        }
        if let Some(source) = message.source {
            self.remember_peer(source.manager);
        }

        trace!(
            manager = %self.id(),
            id = %message.id,
            message_type = %message.message_type,
            %destination,
            "message queued"
        );
        let now = self.clock.now();
        self.inbox.push(message, now).map_err(|err| {
            warn!(manager = %self.id(), %destination, "inbox full");
            MessagingError::from(err)
        })
    }

    /// Dispatches one message synchronously
    pub fn process(&mut self, message: Message) -> Result<(), MessagingError> {
        let destination = message.destination.ok_or(MessagingError::NoDestination)?;
        if destination.manager != self.id() {
            return self.send(message, SendFlags::NONE);
        }

        self.stats.messages_dispatched += 1;
        trace!(
            manager = %self.id(),
            id = %message.id,
            message_type = %message.message_type,
            %destination,
            "dispatching"
        );
        match destination.kind() {
            AddressKind::Manager => self.process_manager_message(message),
            AddressKind::Component => {
                self.process_component_message(destination.component, message)
            }
            AddressKind::Channel => self.process_channel_message(destination, message),
        }
    }

    /// Answers a message for a vanished endpoint with a disconnect-notify
    ///
    /// Disconnect notices are never bounced, so two dead ends cannot ping-pong.
    fn bounce(&mut self, message: &Message) {
        let (Some(source), Some(destination)) = (message.source, message.destination) else {
            return;
        };
        if message.message_type == MessageType::DisconnectNotify || source.is_manager() {
            trace!(%destination, "dropping message for vanished endpoint");
            return;
        }
        debug!(%destination, %source, "endpoint vanished; disconnecting sender");
        self.stats.messages_bounced += 1;
        self.send_notice(Some(Message::disconnect_notify(destination, source)));
    }

    pub(crate) fn process_component_message(
        &mut self,
        id: ComponentId,
        message: Message,
    ) -> Result<(), MessagingError> {
        let Some(component) = self.components.get_mut(&id) else {
            self.bounce(&message);
            return Ok(());
        };
        let listeners = component.listeners_mut().snapshot();
        fan_out(&listeners, &message, self)
    }

    pub(crate) fn process_channel_message(
        &mut self,
        address: Address,
        message: Message,
    ) -> Result<(), MessagingError> {
        let Some(channel) = self.get_channel_mut(address) else {
            self.bounce(&message);
            return Ok(());
        };

        match message.message_type {
            MessageType::ConnectNotify => {
                let from = message.source.ok_or_else(|| {
                    MessagingError::InvalidState("connect-notify without source".to_string())
                })?;
                let notice = channel.accept_connect(from);
                let listeners = channel.listeners_mut().snapshot();
                debug!(channel = %address, peer = %from, "channel connected by peer");
                self.send_notice(notice);
                fan_out(&listeners, &message, self)
            }
            MessageType::PendingNotify => {
                let accepted = message
                    .source
                    .map_or(false, |from| channel.accept_pending(from));
                if accepted {
                    debug!(channel = %address, manager = ?message.source, "request pending");
                } else {
                    trace!(channel = %address, "pending-notify ignored");
                }
                Ok(())
            }
            MessageType::DisconnectNotify => {
                let accepted = message
                    .source
                    .map_or(false, |from| channel.accept_disconnect(from));
                if !accepted {
                    debug!(channel = %address, source = ?message.source, "stale disconnect-notify ignored");
                    return Ok(());
                }
                let is_root = channel.is_root();
                let listeners = channel.listeners_mut().snapshot();
                debug!(channel = %address, "channel disconnected by peer");

                let result = fan_out(&listeners, &message, self);
                if is_root && self.components.contains_key(&address.component) {
                    self.destroy_component(address.component)?;
                }
                result
            }
            _ => {
                let listeners = channel.listeners_mut().snapshot();
                let result = fan_out(&listeners, &message, self);
                if let Err(err) = &result {
                    self.report_failure(address, &message, err);
                }
                result
            }
        }
    }

    /// Tells the sender of `message` that handling it failed
    fn report_failure(&mut self, channel: Address, message: &Message, err: &MessagingError) {
        if message.message_type == MessageType::StatusReport {
            return;
        }
        let Some(source) = message.source else {
            return;
        };
        if !self
            .get_channel(channel)
            .map_or(false, Channel::is_directed)
        {
            return;
        }

        match Message::status_report(err.status_code(), err.to_string(), message) {
            Ok(report) => {
                let report = report.with_source(channel).with_destination(source);
                self.send_notice(Some(report));
            }
            Err(err) => warn!(%channel, error = %err, "failed to encode status report"),
        }
    }

    fn process_manager_message(&mut self, message: Message) -> Result<(), MessagingError> {
        match message.message_type {
            MessageType::RequestComponent => self.handle_component_request(message),
            MessageType::PeerGone => {
                let body: PeerGone = message.decode()?;
                self.handle_peer_gone(body.manager)
            }
            _ => {
                let listeners = self.listeners.snapshot();
                fan_out(&listeners, &message, self)
            }
        }
    }

    fn handle_component_request(&mut self, message: Message) -> Result<(), MessagingError> {
        let mut request: RequestComponent = message.decode()?;
        if request.placed {
            return self.complete_request(&request, &message);
        }

        if !self.is_initial() {
            let initial = Address::manager(self.initial_manager());
            debug!(manager = %self.id(), component_type = %request.component_type, "forwarding request to initial manager");
            return self.send(message.with_destination(initial), SendFlags::NONE);
        }

        let target = match self
            .platform
            .request_peer(request.requester, &request.component_type)
        {
            Ok(target) => target,
            Err(err) => {
                self.refuse_request(&request, &message, &err);
                return Ok(());
            }
        };
        debug!(
            component_type = %request.component_type,
            requester = %request.requester,
            %target,
            "component placed"
        );
        if target == self.id() {
            return self.complete_request(&request, &message);
        }

        request.placed = true;
        let placed = Message::new(MessageType::RequestComponent, MessagePayload::new(&request)?)
            .with_source(request.requester)
            .with_destination(Address::manager(target));
        self.send(placed, SendFlags::NONE)?;
        self.send(
            Message::pending_notify(Address::manager(target), request.requester),
            SendFlags::NONE,
        )
    }

    fn complete_request(
        &mut self,
        request: &RequestComponent,
        message: &Message,
    ) -> Result<(), MessagingError> {
        if let Err(err) = self.create_requested_component(request) {
            self.refuse_request(request, message, &err);
        }
        Ok(())
    }

    /// Answers an unsatisfiable request with a status report to the requester
    fn refuse_request(&mut self, request: &RequestComponent, message: &Message, err: &MessagingError) {
        warn!(
            component_type = %request.component_type,
            requester = %request.requester,
            error = %err,
            "component request refused"
        );
        match Message::status_report(err.status_code(), err.to_string(), message) {
            Ok(report) => {
                let report = report
                    .with_source(self.address())
                    .with_destination(request.requester);
                self.send_notice(Some(report));
            }
            Err(err) => warn!(error = %err, "failed to encode status report"),
        }
    }

    /// Reacts to the death of another manager
    ///
    /// Every local channel directed at the dead manager gets a disconnect
    /// notice queued. The initial manager also tells every other known peer.
    /// A notice that cannot be queued does not stop the others; the first
    /// such error is returned once the peer is forgotten.
    pub fn handle_peer_gone(&mut self, dead: ManagerId) -> Result<(), MessagingError> {
        if dead == self.id() {
            return Err(MessagingError::InvalidState(
                "a manager cannot outlive itself".to_string(),
            ));
        }
        debug!(manager = %self.id(), %dead, "peer gone");

        let notices: Vec<Message> = self
            .components
            .values()
            .flat_map(|component| component.disconnect_peer(dead, None))
            .collect();
        let mut first_error = None;
        for notice in notices {
            let destination = notice.destination;
            if let Err(err) = self.receive(notice) {
                warn!(manager = %self.id(), ?destination, error = %err, "disconnect notice not queued");
                first_error.get_or_insert(err);
            }
        }

        self.known_peers.remove(&dead);
        if self.is_initial() {
            let peers: Vec<ManagerId> = self.known_peers.iter().copied().collect();
            for peer in peers {
                let broadcast = Message::peer_gone(dead)?.with_destination(Address::manager(peer));
                self.send_notice(Some(broadcast));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Adds a listener for messages addressed to the manager itself
    pub fn add_listener(&mut self, listener: &ListenerHandle) -> bool {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, listener: &ListenerHandle) -> bool {
        self.listeners.remove(listener)
    }

    /// Installs a dispatch filter; selected messages stay queued
    pub fn add_message_filter(&mut self, selection: Box<dyn MessageSelection>) -> FilterId {
        self.filters.add(selection)
    }

    pub fn remove_message_filter(&mut self, id: FilterId) -> bool {
        self.filters.remove(id)
    }

    pub fn has_message_filter(&self, id: FilterId) -> bool {
        self.filters.contains(id)
    }

    /// When the next unfiltered message becomes ready
    pub fn next_wakeup(&self) -> NextWakeup {
        self.inbox.next_wakeup(self.clock.now(), &self.filters)
    }

    /// Dispatches ready messages for up to `deadline_ms` milliseconds
    ///
    /// With a zero deadline at most one message is dispatched. Dispatch
    /// errors are logged, not returned: the sender has already moved on.
    pub fn run_slice(&mut self, deadline_ms: u64) -> NextWakeup {
        let deadline = self.clock.now() + Duration::from_millis(deadline_ms);
        let mut dispatched = 0usize;

        loop {
            let now = self.clock.now();
            let Some(message) = self.inbox.take_ready(now, &self.filters) else {
                break;
            };
            let id = message.id;
            let message_type = message.message_type.clone();
            if let Err(err) = self.process(message) {
                debug!(manager = %self.id(), %id, %message_type, error = %err, "dispatch failed");
            }
            dispatched += 1;

            if deadline_ms == 0
                || self
                    .config
                    .max_slice_messages
                    .map_or(false, |max| dispatched >= max)
                || self.clock.now() >= deadline
            {
                break;
            }
        }

        self.next_wakeup()
    }

    /// Dispatches until nothing is ready right now
    ///
    /// Does not wait for delayed messages. Returns the number dispatched.
    pub fn run_until_idle(&mut self) -> usize {
        const MAX_DISPATCHES: usize = 100_000;

        let mut dispatched = 0;
        while dispatched < MAX_DISPATCHES && self.next_wakeup().is_immediate() {
            self.run_slice(0);
            dispatched += 1;
        }
        dispatched
    }

    /// Stores a named value for the lifetime of this manager
    pub fn store_value<T: Any>(&mut self, key: impl Into<String>, value: T) -> bool {
        self.values.store(key, value)
    }

    pub fn load_value<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.load(key)
    }

    pub fn load_value_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.load_mut(key)
    }

    pub fn remove_value(&mut self, key: &str) -> bool {
        self.values.remove(key)
    }

    /// Destroys every component and drops queued messages and stored values
    ///
    /// Runs automatically on drop; calling it twice is harmless.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        let ids: Vec<ComponentId> = self.components.keys().copied().collect();
        for id in ids {
            if let Err(err) = self.destroy_component(id) {
                trace!(component = %id, error = %err, "already destroyed");
            }
        }
        let discarded = self.inbox.clear();
        self.values.clear();
        debug!(manager = %self.id(), discarded, "manager shut down");
    }
}

impl Drop for ComponentManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Messenger for ComponentManager {
    fn address(&self) -> Option<Address> {
        Some(ComponentManager::address(self))
    }

    fn send(&mut self, message: Message, flags: SendFlags) -> Result<(), MessagingError> {
        ComponentManager::send(self, message, flags)
    }

    fn process(&mut self, message: Message) -> Result<(), MessagingError> {
        ComponentManager::process(self, message)
    }

    fn add_listener(&mut self, listener: &ListenerHandle) -> Result<(), MessagingError> {
        ComponentManager::add_listener(self, listener);
        Ok(())
    }

    fn remove_listener(&mut self, listener: &ListenerHandle) -> bool {
        ComponentManager::remove_listener(self, listener)
    }
}
