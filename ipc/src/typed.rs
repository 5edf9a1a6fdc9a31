//! Typed infrastructure messages.
//!
//! Payload schemas and constructors for the closed set of message types the
//! core itself sends: the channel handshake, component requests, status
//! reports and peer-death broadcasts.

use crate::{Message, MessagePayload, MessageType};
use core_types::{Address, ComponentType, ManagerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a request-component message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestComponent {
    /// Type of component to create
    pub component_type: ComponentType,
    /// Channel that will be connected to the new component's root channel
    pub requester: Address,
    /// Set once the initial manager has decided where the component goes
    pub placed: bool,
}

/// Machine-readable failure code carried by status reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    OutOfMemory,
    NullArgument,
    InvalidState,
    NoRoute,
    NotFound,
    AddressSpaceExhausted,
    NoDestination,
    Timeout,
    Handler,
    Platform,
    Codec,
    Config,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Body of a status-report message
///
/// Sent back to the source of a message that a listener failed to
/// process, so a remote caller without a shared call stack sees the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub code: StatusCode,
    /// Human-readable error text
    pub detail: String,
    /// Type of the message that failed
    pub failed_type: MessageType,
}

/// Body of a peer-gone broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerGone {
    pub manager: ManagerId,
}

fn infrastructure<T: Serialize>(
    message_type: MessageType,
    body: &T,
) -> Result<Message, serde_json::Error> {
    Ok(Message::new(message_type, MessagePayload::new(body)?))
}

impl Message {
    /// `from` has connected to `to`
    pub fn connect_notify(from: Address, to: Address) -> Message {
        Message::signal(MessageType::ConnectNotify)
            .with_source(from)
            .with_destination(to)
    }

    /// `manager` will complete the handshake started by `to`
    pub fn pending_notify(manager: Address, to: Address) -> Message {
        Message::signal(MessageType::PendingNotify)
            .with_source(manager)
            .with_destination(to)
    }

    /// `from` is gone or has disconnected from `to`
    pub fn disconnect_notify(from: Address, to: Address) -> Message {
        Message::signal(MessageType::DisconnectNotify)
            .with_source(from)
            .with_destination(to)
    }

    /// Request for a component of `component_type`, answered at `requester`
    pub fn request_component(
        requester: Address,
        component_type: ComponentType,
        destination: Address,
    ) -> Result<Message, serde_json::Error> {
        let body = RequestComponent {
            component_type,
            requester,
            placed: false,
        };
        Ok(infrastructure(MessageType::RequestComponent, &body)?
            .with_source(requester)
            .with_destination(destination))
    }

    /// Report that `failed` could not be processed
    pub fn status_report(
        code: StatusCode,
        detail: impl Into<String>,
        failed: &Message,
    ) -> Result<Message, serde_json::Error> {
        let body = StatusReport {
            code,
            detail: detail.into(),
            failed_type: failed.message_type.clone(),
        };
        Ok(infrastructure(MessageType::StatusReport, &body)?.with_correlation(failed.id))
    }

    /// Broadcast that `manager` has died
    pub fn peer_gone(manager: ManagerId) -> Result<Message, serde_json::Error> {
        infrastructure(MessageType::PeerGone, &PeerGone { manager })
    }
}
