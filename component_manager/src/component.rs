//! Components: owners of channels
//!
//! A component is a container of channels living on one manager. Requested
//! components own a root channel connected to whoever asked for them; when
//! that connection goes away, so does the component.

use crate::channel::Channel;
use crate::messenger::{ListenerHandle, ListenerList, Messenger};
use crate::ComponentManager;
use core_types::{Address, ChannelId, ComponentId, ComponentType, ManagerId};
use ipc::{Message, SendFlags};
use platform_api::MessagingError;
use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, error, warn};

/// A component and its channels
pub struct Component {
    address: Address,
    component_type: ComponentType,
    next_channel_id: ChannelId,
    channels: BTreeMap<ChannelId, Channel>,
    listeners: ListenerList,
    /// Objects kept alive for as long as the component exists
    retained: Vec<Rc<dyn Any>>,
}

impl Component {
    pub(crate) fn new(address: Address, component_type: ComponentType) -> Self {
        Self {
            address,
            component_type,
            next_channel_id: ChannelId::FIRST_DYNAMIC,
            channels: BTreeMap::new(),
            listeners: ListenerList::new(),
            retained: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn id(&self) -> ComponentId {
        self.address.component
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.component_type
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub(crate) fn channel_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.get_mut(&id)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Addresses of all registered channels, in id order
    pub fn channel_addresses(&self) -> Vec<Address> {
        self.channels
            .keys()
            .map(|id| self.address.with_channel(*id))
            .collect()
    }

    pub fn has_root_channel(&self) -> bool {
        self.channels.contains_key(&ChannelId::ROOT)
    }

    pub fn listeners(&self) -> &ListenerList {
        &self.listeners
    }

    pub(crate) fn listeners_mut(&mut self) -> &mut ListenerList {
        &mut self.listeners
    }

    #[cfg(test)]
    pub(crate) fn set_next_channel_id(&mut self, id: ChannelId) {
        self.next_channel_id = id;
    }

    /// Hands out the next channel id
    ///
    /// The counter stops one short of `u32::MAX`: exhaustion is reported when
    /// the next id would have no successor.
    fn allocate_channel_id(&mut self) -> Result<ChannelId, MessagingError> {
        let id = self.next_channel_id;
        match id.checked_next() {
            Some(next) => {
                self.next_channel_id = next;
                Ok(id)
            }
            None => {
                error!(component = %self.address, "channel ids exhausted");
                Err(MessagingError::AddressSpaceExhausted(format!(
                    "channel ids of component {}",
                    self.address
                )))
            }
        }
    }

    /// Registers `channel`, assigning its address
    ///
    /// The root channel always gets [`ChannelId::ROOT`]; other channels get
    /// fresh ids that are never reused.
    pub(crate) fn register_channel(
        &mut self,
        mut channel: Channel,
        is_root: bool,
    ) -> Result<Address, MessagingError> {
        if channel.address().is_some() {
            return Err(MessagingError::InvalidState(
                "channel is already registered".to_string(),
            ));
        }
        let id = if is_root {
            if self.has_root_channel() {
                return Err(MessagingError::InvalidState(format!(
                    "component {} already has a root channel",
                    self.address
                )));
            }
            ChannelId::ROOT
        } else {
            self.allocate_channel_id()?
        };

        let address = self.address.with_channel(id);
        channel.register(address, is_root)?;
        self.channels.insert(id, channel);
        Ok(address)
    }

    /// Removes a channel without notifying anyone
    pub(crate) fn deregister_channel(&mut self, id: ChannelId) -> Result<Channel, MessagingError> {
        self.channels
            .remove(&id)
            .ok_or_else(|| MessagingError::NotFound(format!("channel {}", self.address.with_channel(id))))
    }

    /// Disconnect notices for every channel directed at `manager` (and `component`)
    ///
    /// Each notice pretends to come from the lost peer, so processing it takes
    /// the normal disconnect path.
    pub(crate) fn disconnect_peer(
        &self,
        manager: ManagerId,
        component: Option<ComponentId>,
    ) -> Vec<Message> {
        self.channels
            .values()
            .filter_map(|channel| {
                let destination = channel.destination()?;
                let own = channel.address()?;
                destination
                    .matches_peer(manager, component)
                    .then(|| Message::disconnect_notify(destination, own))
            })
            .collect()
    }

    pub(crate) fn retain(&mut self, value: Rc<dyn Any>) {
        self.retained.push(value);
    }

    /// Tears down every channel, returning the notices owed to connected peers
    ///
    /// Retained objects are released.
    pub(crate) fn teardown(mut self) -> Vec<Message> {
        let notices = self
            .channels
            .values_mut()
            .filter_map(Channel::teardown)
            .collect();
        self.retained.clear();
        notices
    }
}

/// A component borrowed together with its manager
///
/// Obtained from [`ComponentManager::component`].
pub struct ComponentRef<'a> {
    manager: &'a mut ComponentManager,
    address: Address,
}

impl<'a> ComponentRef<'a> {
    pub(crate) fn new(manager: &'a mut ComponentManager, address: Address) -> Self {
        Self { manager, address }
    }

    fn get(&self) -> Result<&Component, MessagingError> {
        self.manager
            .get_component(self.address.component)
            .ok_or_else(|| MessagingError::NotFound(format!("component {}", self.address)))
    }

    fn get_mut(&mut self) -> Result<&mut Component, MessagingError> {
        let address = self.address;
        self.manager
            .get_component_mut(address.component)
            .ok_or_else(|| MessagingError::NotFound(format!("component {}", address)))
    }

    /// The manager this component lives on
    pub fn manager(&mut self) -> &mut ComponentManager {
        self.manager
    }

    pub fn component_type(&self) -> Result<ComponentType, MessagingError> {
        Ok(self.get()?.component_type().clone())
    }

    pub fn channel_count(&self) -> Result<usize, MessagingError> {
        Ok(self.get()?.channel_count())
    }

    /// Address of the root channel, for requested components
    pub fn root_channel(&self) -> Result<Option<Address>, MessagingError> {
        let component = self.get()?;
        Ok(component
            .has_root_channel()
            .then(|| self.address.with_channel(ChannelId::ROOT)))
    }

    /// Registers a pre-built channel
    pub fn register_channel(
        &mut self,
        channel: Channel,
        is_root: bool,
    ) -> Result<Address, MessagingError> {
        let address = self.get_mut()?.register_channel(channel, is_root)?;
        debug!(channel = %address, is_root, "channel registered");
        Ok(address)
    }

    /// Creates and registers a channel, optionally directed and listened to
    pub fn create_channel(
        &mut self,
        destination: Option<Address>,
        listener: Option<&ListenerHandle>,
    ) -> Result<Address, MessagingError> {
        let mut channel = match destination {
            Some(destination) => Channel::with_destination(destination),
            None => Channel::new(),
        };
        if let Some(listener) = listener {
            channel.listeners_mut().add(listener);
        }
        self.register_channel(channel, false)
    }

    /// Removes a channel without notifying its peer
    pub fn deregister_channel(&mut self, channel: ChannelId) -> Result<Channel, MessagingError> {
        let removed = self.get_mut()?.deregister_channel(channel)?;
        debug!(channel = %self.address.with_channel(channel), "channel deregistered");
        Ok(removed)
    }

    /// Destroys a channel, notifying a connected peer
    pub fn destroy_channel(&mut self, channel: ChannelId) -> Result<(), MessagingError> {
        self.manager
            .destroy_channel(self.address.with_channel(channel))
    }

    /// Asks for a new component of `component_type`
    ///
    /// Creates a fresh channel and sends the request to this component's
    /// manager. The channel gets connected to the new component's root
    /// channel once the component exists, possibly on another manager.
    pub fn request_component(
        &mut self,
        component_type: impl Into<ComponentType>,
        listener: Option<&ListenerHandle>,
    ) -> Result<Address, MessagingError> {
        let component_type = component_type.into();
        let channel = self.create_channel(None, listener)?;
        let request = Message::request_component(
            channel,
            component_type.clone(),
            self.address.manager_address(),
        )?;

        if let Err(err) = self.manager.send(request, SendFlags::NONE) {
            if let Err(cleanup) = self.manager.destroy_channel(channel) {
                warn!(requester = %channel, error = %cleanup, "request channel not cleaned up");
            }
            return Err(err);
        }
        debug!(requester = %channel, %component_type, "component requested");
        Ok(channel)
    }

    /// Queues disconnect notices for every channel directed at a lost peer
    ///
    /// `component` narrows the peer to one component on `manager`. Returns
    /// the number of channels affected.
    pub fn disconnect_peer(
        &mut self,
        manager: ManagerId,
        component: Option<ComponentId>,
    ) -> Result<usize, MessagingError> {
        let notices = self.get()?.disconnect_peer(manager, component);
        let count = notices.len();
        let mut first_error = None;
        for notice in notices {
            if let Err(err) = self.manager.receive(notice) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(count), Err)
    }

    /// Keeps `value` alive until the component is destroyed
    ///
    /// Listeners are held weakly by channels; retaining them here ties their
    /// lifetime to the component.
    pub fn retain<T: Any>(&mut self, value: Rc<T>) -> Result<(), MessagingError> {
        self.get_mut()?.retain(value);
        Ok(())
    }

    /// Destroys the component and all its channels
    pub fn destroy(self) -> Result<(), MessagingError> {
        self.manager.destroy_component(self.address.component)
    }
}

impl Messenger for ComponentRef<'_> {
    fn address(&self) -> Option<Address> {
        Some(self.address)
    }

    fn send(&mut self, mut message: Message, flags: SendFlags) -> Result<(), MessagingError> {
        if message.source.is_none() {
            message.source = Some(self.address);
        }
        self.manager.send(message, flags)
    }

    fn process(&mut self, message: Message) -> Result<(), MessagingError> {
        self.manager
            .process_component_message(self.address.component, message)
    }

    fn add_listener(&mut self, listener: &ListenerHandle) -> Result<(), MessagingError> {
        self.get_mut()?.listeners_mut().add(listener);
        Ok(())
    }

    fn remove_listener(&mut self, listener: &ListenerHandle) -> bool {
        self.get_mut()
            .map(|component| component.listeners_mut().remove(listener))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelState;
    use ipc::MessageType;

    fn component() -> Component {
        Component::new(
            Address::component(ManagerId::INITIAL, ComponentId::FIRST),
            ComponentType::from("test"),
        )
    }

    fn peer(manager: u32, component: u32) -> Address {
        Address::channel(
            ManagerId::new(manager),
            ComponentId::new(component),
            ChannelId::ROOT,
        )
    }

    #[test]
    fn test_channel_ids_start_after_root() {
        let mut component = component();
        let first = component.register_channel(Channel::new(), false).unwrap();
        let second = component.register_channel(Channel::new(), false).unwrap();
        assert_eq!(first.channel, ChannelId::FIRST_DYNAMIC);
        assert_eq!(second.channel, ChannelId::new(3));
        assert_eq!(component.channel_count(), 2);
    }

    #[test]
    fn test_channel_ids_are_not_reused() {
        let mut component = component();
        let first = component.register_channel(Channel::new(), false).unwrap();
        component.deregister_channel(first.channel).unwrap();
        let second = component.register_channel(Channel::new(), false).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_single_root_channel() {
        let mut component = component();
        let root = component
            .register_channel(Channel::with_destination(peer(1, 1)), true)
            .unwrap();
        assert_eq!(root.channel, ChannelId::ROOT);
        assert_eq!(
            component.channel(ChannelId::ROOT).unwrap().state(),
            ChannelState::Connected
        );

        let again = component.register_channel(Channel::with_destination(peer(1, 2)), true);
        assert!(matches!(again, Err(MessagingError::InvalidState(_))));
    }

    #[test]
    fn test_registered_channel_cannot_register_again() {
        let mut channel = Channel::new();
        channel
            .set_address(Address::channel(ManagerId::INITIAL, ComponentId::new(7), ChannelId::new(9)))
            .unwrap();
        assert!(matches!(
            component().register_channel(channel, false),
            Err(MessagingError::InvalidState(_))
        ));
    }

    #[test]
    fn test_channel_id_exhaustion() {
        let mut component = component();
        component.set_next_channel_id(ChannelId::new(u32::MAX - 1));
        let last = component.register_channel(Channel::new(), false).unwrap();
        assert_eq!(last.channel, ChannelId::new(u32::MAX - 1));
        assert!(matches!(
            component.register_channel(Channel::new(), false),
            Err(MessagingError::AddressSpaceExhausted(_))
        ));
    }

    #[test]
    fn test_deregister_unknown_channel() {
        assert!(matches!(
            component().deregister_channel(ChannelId::new(42)),
            Err(MessagingError::NotFound(_))
        ));
    }

    #[test]
    fn test_disconnect_peer_selects_matching_channels() {
        let mut component = component();
        let a = component
            .register_channel(Channel::with_destination(peer(1, 1)), false)
            .unwrap();
        let b = component
            .register_channel(Channel::with_destination(peer(1, 2)), false)
            .unwrap();
        component
            .register_channel(Channel::with_destination(peer(2, 1)), false)
            .unwrap();
        component.register_channel(Channel::new(), false).unwrap();

        let whole_manager = component.disconnect_peer(ManagerId::new(1), None);
        let targets: Vec<_> = whole_manager.iter().map(|m| m.destination).collect();
        assert_eq!(targets, vec![Some(a), Some(b)]);
        assert!(whole_manager
            .iter()
            .all(|m| m.message_type == MessageType::DisconnectNotify));

        let one = component.disconnect_peer(ManagerId::new(1), Some(ComponentId::new(2)));
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].source, Some(peer(1, 2)));
    }

    #[test]
    fn test_teardown_notifies_connected_peers_only() {
        let mut component = component();
        component
            .register_channel(Channel::with_destination(peer(1, 1)), true)
            .unwrap();
        component
            .register_channel(Channel::with_destination(peer(1, 2)), false)
            .unwrap();

        let notices = component.teardown();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].destination, Some(peer(1, 1)));
    }

    #[test]
    fn test_retained_values_released_on_teardown() {
        let mut component = component();
        let value = Rc::new(5u32);
        component.retain(value.clone());
        assert_eq!(Rc::strong_count(&value), 2);
        component.teardown();
        assert_eq!(Rc::strong_count(&value), 1);
    }
}
