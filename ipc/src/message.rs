//! Message types and envelope structure

use core_types::{Address, Duration};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a message
///
/// Used to correlate replies with requests and to follow a message through
/// the logs of several managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a message ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg({})", self.0)
    }
}

/// Type tag of a message
///
/// The infrastructure variants drive the channel handshake and the
/// component request protocol. Everything else is `Domain` and opaque to
/// the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// The sender has connected its channel to the receiving channel
    ConnectNotify,
    /// A remote manager will complete the handshake later
    PendingNotify,
    /// The sender has disconnected, or the destination no longer exists
    DisconnectNotify,
    /// Ask a manager to create a component of some type
    RequestComponent,
    /// A listener failed to process a message sent by the receiver
    StatusReport,
    /// A manager has died; disconnect everything addressed to it
    PeerGone,
    /// Domain-defined message, e.g. `"plugin.evaluate"`
    Domain(String),
}

impl MessageType {
    /// Creates a domain message type
    pub fn domain(name: impl Into<String>) -> Self {
        MessageType::Domain(name.into())
    }

    /// Checks if this is one of the closed set of infrastructure types
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, MessageType::Domain(_))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::ConnectNotify => write!(f, "connect-notify"),
            MessageType::PendingNotify => write!(f, "pending-notify"),
            MessageType::DisconnectNotify => write!(f, "disconnect-notify"),
            MessageType::RequestComponent => write!(f, "request-component"),
            MessageType::StatusReport => write!(f, "status-report"),
            MessageType::PeerGone => write!(f, "peer-gone"),
            MessageType::Domain(name) => f.write_str(name),
        }
    }
}

/// Type-erased message payload
///
/// Payloads are JSON bytes. They stay serialised inside a manager too, so a
/// message can cross a thread or process boundary without any conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    data: Vec<u8>,
}

impl MessagePayload {
    /// Creates a new payload from serializable data
    pub fn new<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_vec(data)?;
        Ok(Self { data: json })
    }

    /// Creates an empty payload (signals carry no body)
    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }

    /// Deserializes the payload into a specific type
    pub fn deserialize<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Options for a send operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SendFlags(u32);

impl SendFlags {
    pub const NONE: SendFlags = SendFlags(0);

    /// Report a missing message as `OutOfMemory` instead of `NullArgument`
    ///
    /// For call sites whose message construction may have failed to allocate.
    pub const OOM_IF_NULL: SendFlags = SendFlags(1);

    pub const fn contains(&self, other: SendFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: SendFlags) -> SendFlags {
        SendFlags(self.0 | other.0)
    }
}

/// An addressed message
///
/// Handing a message to a send operation moves it into the messaging
/// infrastructure; the sender cannot touch it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message
    pub id: MessageId,
    /// Sender; stamped by the first messenger that sends it if unset
    pub source: Option<Address>,
    /// Receiver; messages without one are discarded on receipt
    pub destination: Option<Address>,
    /// Type tag
    pub message_type: MessageType,
    /// Id of the message this one replies to
    pub correlation_id: Option<MessageId>,
    /// Delivery delay, applied by the receiving manager's inbox
    pub delay: Duration,
    /// Serialized payload (type-erased)
    pub payload: MessagePayload,
}

impl Message {
    /// Creates an unaddressed message
    pub fn new(message_type: MessageType, payload: MessagePayload) -> Self {
        Self {
            id: MessageId::new(),
            source: None,
            destination: None,
            message_type,
            correlation_id: None,
            delay: Duration::ZERO,
            payload,
        }
    }

    /// Creates a message without payload
    pub fn signal(message_type: MessageType) -> Self {
        Self::new(message_type, MessagePayload::empty())
    }

    /// Creates a domain message with a serialized body
    pub fn domain<T: Serialize>(
        name: impl Into<String>,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            MessageType::domain(name),
            MessagePayload::new(body)?,
        ))
    }

    pub fn with_source(mut self, source: Address) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_destination(mut self, destination: Address) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Sets the correlation ID (for replies)
    pub fn with_correlation(mut self, correlation_id: MessageId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Delays delivery by `delay` after arrival at the destination manager
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Checks if this message replies to another one
    pub fn is_reply(&self) -> bool {
        self.correlation_id.is_some()
    }

    /// Deserializes the payload
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        self.payload.deserialize()
    }

    /// Turns `reply` into a reply to this message: swapped endpoints, correlated id
    pub fn mirror_into(&self, mut reply: Message) -> Message {
        reply.source = self.destination;
        reply.destination = self.source;
        reply.correlation_id = Some(self.id);
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{ChannelId, ComponentId, ManagerId};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestPayload {
        value: i32,
    }

    fn addr(component: u32, channel: u32) -> Address {
        Address::channel(
            ManagerId::INITIAL,
            ComponentId::new(component),
            ChannelId::new(channel),
        )
    }

    #[test]
    fn test_message_id_creation() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_message_type_infrastructure() {
        assert!(MessageType::ConnectNotify.is_infrastructure());
        assert!(MessageType::PeerGone.is_infrastructure());
        assert!(!MessageType::domain("plugin.evaluate").is_infrastructure());
        assert_eq!(format!("{}", MessageType::domain("a.b")), "a.b");
        assert_eq!(format!("{}", MessageType::DisconnectNotify), "disconnect-notify");
    }

    #[test]
    fn test_domain_message_payload() {
        let msg = Message::domain("test.value", &TestPayload { value: 42 }).unwrap();
        assert_eq!(msg.message_type, MessageType::domain("test.value"));
        assert_eq!(msg.decode::<TestPayload>().unwrap(), TestPayload { value: 42 });
        assert!(msg.source.is_none());
        assert!(msg.destination.is_none());
        assert!(msg.delay.is_zero());
    }

    #[test]
    fn test_signal_has_empty_payload() {
        let msg = Message::signal(MessageType::ConnectNotify);
        assert!(msg.payload.is_empty());
    }

    #[test]
    fn test_mirror_into_swaps_endpoints() {
        let original = Message::signal(MessageType::domain("ping"))
            .with_source(addr(1, 2))
            .with_destination(addr(3, 4));
        let reply = original.mirror_into(Message::signal(MessageType::domain("pong")));

        assert_eq!(reply.source, Some(addr(3, 4)));
        assert_eq!(reply.destination, Some(addr(1, 2)));
        assert_eq!(reply.correlation_id, Some(original.id));
        assert!(reply.is_reply());
    }

    #[test]
    fn test_send_flags() {
        assert!(!SendFlags::NONE.contains(SendFlags::OOM_IF_NULL));
        assert!(SendFlags::OOM_IF_NULL.contains(SendFlags::OOM_IF_NULL));
        assert!(SendFlags::NONE.union(SendFlags::OOM_IF_NULL).contains(SendFlags::OOM_IF_NULL));
        assert_eq!(SendFlags::default(), SendFlags::NONE);
    }

    #[test]
    fn test_message_serializes_for_transport() {
        let msg = Message::domain("test.value", &TestPayload { value: 7 })
            .unwrap()
            .with_source(addr(1, 2))
            .with_destination(addr(3, 4))
            .with_delay(Duration::from_millis(5));
        let bytes = serde_json::to_vec(&msg).unwrap();
        let back: Message = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, msg);
    }
}
