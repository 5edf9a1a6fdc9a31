//! Channels: the point-to-point endpoints components talk through.
//!
//! A channel moves through four states:
//!
//! ```text
//! Uninitialized -> Undirected <-> Directed <-> Connected
//! ```
//!
//! Registration with a component assigns the address and promotes the
//! channel out of `Uninitialized`. Directing sets the peer, connecting tells
//! the peer, and either side tearing down tells the other. Peers that learn
//! of a disconnect never echo one back.
//!
//! The pure transitions live on [`Channel`]; [`ChannelRef`] ties a channel to
//! the manager that owns it so transitions can send their notifications.

use crate::messenger::{ListenerHandle, ListenerList, Messenger};
use crate::ComponentManager;
use core_types::Address;
use ipc::{Message, SendFlags};
use platform_api::MessagingError;
use tracing::debug;

/// Lifecycle state of a channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelState {
    /// Not yet registered; has no address
    #[default]
    Uninitialized = 0,
    /// Registered, no destination
    Undirected = 1,
    /// Has a destination; the peer may not know about us yet
    Directed = 2,
    /// Both ends know about each other
    Connected = 3,
}

/// A messaging endpoint owned by a component
#[derive(Default)]
pub struct Channel {
    address: Option<Address>,
    destination: Option<Address>,
    state: ChannelState,
    is_root: bool,
    listeners: ListenerList,
}

impl Channel {
    /// Creates an unregistered channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unregistered channel that will be directed once registered
    pub fn with_destination(destination: Address) -> Self {
        Self {
            destination: Some(destination),
            ..Self::default()
        }
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn destination(&self) -> Option<Address> {
        self.destination
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Checks if this is its component's root channel
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Checks if sends would be accepted
    pub fn is_directed(&self) -> bool {
        self.state >= ChannelState::Directed
    }

    pub fn is_connected(&self) -> bool {
        self.state == ChannelState::Connected
    }

    pub fn listeners(&self) -> &ListenerList {
        &self.listeners
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerList {
        &mut self.listeners
    }

    /// Assigns the address; allowed exactly once, before registration
    pub fn set_address(&mut self, address: Address) -> Result<(), MessagingError> {
        if self.state != ChannelState::Uninitialized || self.address.is_some() {
            return Err(MessagingError::InvalidState(
                "channel address already assigned".to_string(),
            ));
        }
        self.address = Some(address);
        Ok(())
    }

    /// Completes registration under `address`
    ///
    /// Promotes to `Undirected`, then `Directed` if a destination was set
    /// beforehand. Root channels go straight to `Connected`.
    pub(crate) fn register(&mut self, address: Address, is_root: bool) -> Result<(), MessagingError> {
        if is_root && self.destination.is_none() {
            return Err(MessagingError::InvalidState(
                "root channel needs a destination".to_string(),
            ));
        }
        self.set_address(address)?;
        self.is_root = is_root;
        self.state = ChannelState::Undirected;
        if self.destination.is_some() {
            self.state = ChannelState::Directed;
        }
        if is_root {
            self.state = ChannelState::Connected;
        }
        Ok(())
    }

    /// Points the channel at `destination`
    ///
    /// Re-directing a connected channel elsewhere drops the old connection;
    /// the returned disconnect-notify must be sent to the old peer.
    pub fn direct(&mut self, destination: Address) -> Option<Message> {
        match self.state {
            ChannelState::Uninitialized => {
                self.destination = Some(destination);
                None
            }
            ChannelState::Connected if self.destination == Some(destination) => None,
            _ => {
                let notice = self.demote(true);
                self.destination = Some(destination);
                self.state = ChannelState::Directed;
                notice
            }
        }
    }

    /// Clears the destination
    ///
    /// Returns the disconnect-notify for the peer if the channel was connected.
    pub fn undirect(&mut self) -> Option<Message> {
        self.demote(true)
    }

    /// Drops to `Undirected` (or stays `Uninitialized`) and forgets the peer
    fn demote(&mut self, notify_peer: bool) -> Option<Message> {
        let notice = match (self.state, self.address, self.destination) {
            (ChannelState::Connected, Some(address), Some(peer)) if notify_peer => {
                Some(Message::disconnect_notify(address, peer))
            }
            _ => None,
        };
        if self.state > ChannelState::Undirected {
            self.state = ChannelState::Undirected;
        }
        self.destination = None;
        notice
    }

    /// Marks the channel connected and returns the connect-notify for the peer
    ///
    /// The destination must be another channel.
    pub fn connect(&mut self) -> Result<Message, MessagingError> {
        let (address, destination) = match (self.state, self.address, self.destination) {
            (ChannelState::Uninitialized, _, _) => {
                return Err(MessagingError::InvalidState(
                    "channel is not registered".to_string(),
                ))
            }
            (ChannelState::Undirected, _, _) => return Err(MessagingError::NoRoute),
            (_, Some(address), Some(destination)) => (address, destination),
            _ => return Err(MessagingError::NoRoute),
        };
        if !destination.is_channel() {
            return Err(MessagingError::InvalidState(format!(
                "cannot connect to non-channel address {}",
                destination
            )));
        }
        self.state = ChannelState::Connected;
        Ok(Message::connect_notify(address, destination))
    }

    /// Accepts a peer's connect-notify: redirect to `from` and connect
    ///
    /// Returns a disconnect-notify for a previous, different peer.
    pub(crate) fn accept_connect(&mut self, from: Address) -> Option<Message> {
        let notice = self.direct(from);
        self.state = ChannelState::Connected;
        notice
    }

    /// Accepts a pending-notify naming the manager that will answer
    ///
    /// Only an undirected channel takes the provisional destination; one that
    /// is already directed or connected keeps what it has.
    pub(crate) fn accept_pending(&mut self, from: Address) -> bool {
        if self.state != ChannelState::Undirected {
            return false;
        }
        self.destination = Some(from);
        self.state = ChannelState::Directed;
        true
    }

    /// Accepts a peer's disconnect-notify
    ///
    /// Returns false for a stale notice from someone who is no longer the
    /// destination. Never produces a notice of its own.
    pub(crate) fn accept_disconnect(&mut self, from: Address) -> bool {
        if self.destination != Some(from) {
            return false;
        }
        self.demote(false);
        true
    }

    /// Stamps an outgoing message with this channel's endpoints
    pub fn prepare_send(&self, mut message: Message) -> Result<Message, MessagingError> {
        match self.state {
            ChannelState::Uninitialized => Err(MessagingError::InvalidState(
                "channel is not registered".to_string(),
            )),
            ChannelState::Undirected => Err(MessagingError::NoRoute),
            ChannelState::Directed | ChannelState::Connected => {
                message.source = self.address;
                message.destination = self.destination;
                Ok(message)
            }
        }
    }

    /// Tears the channel down, returning the notice owed to a connected peer
    pub(crate) fn teardown(&mut self) -> Option<Message> {
        let notice = self.demote(true);
        self.state = ChannelState::Uninitialized;
        notice
    }
}

/// A channel borrowed together with the manager that owns it
///
/// Obtained from [`ComponentManager::channel`].
pub struct ChannelRef<'a> {
    manager: &'a mut ComponentManager,
    address: Address,
}

impl<'a> ChannelRef<'a> {
    pub(crate) fn new(manager: &'a mut ComponentManager, address: Address) -> Self {
        Self { manager, address }
    }

    fn get(&self) -> Result<&Channel, MessagingError> {
        self.manager
            .get_channel(self.address)
            .ok_or_else(|| MessagingError::NotFound(format!("channel {}", self.address)))
    }

    fn get_mut(&mut self) -> Result<&mut Channel, MessagingError> {
        let address = self.address;
        self.manager
            .get_channel_mut(address)
            .ok_or_else(|| MessagingError::NotFound(format!("channel {}", address)))
    }

    pub fn state(&self) -> Result<ChannelState, MessagingError> {
        Ok(self.get()?.state())
    }

    pub fn destination(&self) -> Result<Option<Address>, MessagingError> {
        Ok(self.get()?.destination())
    }

    /// The manager this channel lives on
    pub fn manager(&mut self) -> &mut ComponentManager {
        self.manager
    }

    /// Points the channel at `destination`, telling a previous peer it is dropped
    ///
    /// A root channel belongs to whoever requested its component and cannot
    /// be pointed elsewhere.
    pub fn direct(&mut self, destination: Address) -> Result<(), MessagingError> {
        if self.address.is_root_channel() && self.destination()? != Some(destination) {
            return Err(MessagingError::InvalidState(format!(
                "root channel {} cannot be redirected",
                self.address
            )));
        }
        let notice = self.get_mut()?.direct(destination);
        debug!(channel = %self.address, %destination, "channel directed");
        self.manager.send_notice(notice);
        Ok(())
    }

    /// Clears the destination, telling a connected peer
    ///
    /// Undirecting a root channel destroys its component.
    pub fn undirect(&mut self) -> Result<(), MessagingError> {
        if self.address.is_root_channel() {
            self.get()?;
            return self.manager.destroy_component(self.address.component);
        }
        let notice = self.get_mut()?.undirect();
        debug!(channel = %self.address, "channel undirected");
        self.manager.send_notice(notice);
        Ok(())
    }

    /// Connects to the current destination and notifies it
    pub fn connect(&mut self) -> Result<(), MessagingError> {
        let notice = self.get_mut()?.connect()?;
        debug!(channel = %self.address, peer = ?notice.destination, "channel connected");
        self.manager.send(notice, SendFlags::NONE)
    }

    /// Adds a listener
    ///
    /// Unless `silent`, a listener joining an already connected channel is
    /// immediately handed a connect-notify from the peer, so it never misses
    /// the connection.
    pub fn add_listener_with(
        &mut self,
        listener: &ListenerHandle,
        silent: bool,
    ) -> Result<(), MessagingError> {
        let address = self.address;
        let channel = self.get_mut()?;
        if !channel.listeners_mut().add(listener) {
            return Ok(());
        }
        let peer = match channel.destination() {
            Some(peer) if channel.is_connected() && !silent => peer,
            _ => return Ok(()),
        };

        let notice = Message::connect_notify(peer, address);
        let mut listener = listener.try_borrow_mut().map_err(|_| {
            MessagingError::InvalidState("listener is already handling a message".to_string())
        })?;
        listener.on_message(&notice, self.manager)
    }

    /// Destroys the channel, notifying a connected peer
    pub fn destroy(self) -> Result<(), MessagingError> {
        self.manager.destroy_channel(self.address)
    }
}

impl Messenger for ChannelRef<'_> {
    fn address(&self) -> Option<Address> {
        Some(self.address)
    }

    fn send(&mut self, message: Message, flags: SendFlags) -> Result<(), MessagingError> {
        let message = self.get()?.prepare_send(message)?;
        self.manager.send(message, flags)
    }

    fn process(&mut self, message: Message) -> Result<(), MessagingError> {
        self.manager.process_channel_message(self.address, message)
    }

    fn add_listener(&mut self, listener: &ListenerHandle) -> Result<(), MessagingError> {
        self.add_listener_with(listener, false)
    }

    fn remove_listener(&mut self, listener: &ListenerHandle) -> bool {
        self.get_mut()
            .map(|channel| channel.listeners_mut().remove(listener))
            .unwrap_or(false)
    }
}
