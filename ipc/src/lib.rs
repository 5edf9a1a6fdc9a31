//! # Inter-Component Messaging (IPC)
//!
//! This crate defines the messages that travel between components.
//!
//! ## Philosophy
//!
//! - **Messages, not shared memory**: components only ever exchange messages
//! - **Addressed**: every message names its source and destination [`core_types::Address`]
//! - **Owned in flight**: sending moves the message; the sender cannot touch it again
//! - **Opaque bodies**: the core interprets only its own infrastructure types
//!
//! ## Architecture
//!
//! A [`Message`] carries:
//! - Source and destination addresses
//! - A [`MessageType`] tag (infrastructure or domain-defined)
//! - A correlation id for replies
//! - An optional delivery delay
//! - A serialized [`MessagePayload`]
//!
//! Infrastructure payloads live in [`typed`]; dispatch filters in [`selection`].

pub mod message;
pub mod selection;
pub mod typed;

pub use message::{Message, MessageId, MessagePayload, MessageType, SendFlags};
pub use selection::{
    DestinationSelection, ExceptDestination, FnSelection, MessageSelection, TypeSelection,
};
pub use typed::{PeerGone, RequestComponent, StatusCode, StatusReport};
