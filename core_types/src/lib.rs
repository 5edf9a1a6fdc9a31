//! # Core Types
//!
//! Fundamental value types shared by every crate of the messaging core.
//!
//! ## Philosophy
//!
//! - **Addresses are values**: copied, compared structurally, never mutated in flight
//! - **Typed identifiers**: manager, component and channel ids cannot be confused
//! - **Explicit time**: virtual instants and durations, never an ambient wall clock
//!
//! ## Key Types
//!
//! - [`Address`]: the `(manager, component, channel)` triple
//! - [`ManagerId`], [`ComponentId`], [`ChannelId`]: the triple's parts
//! - [`ComponentType`]: domain-defined component type tag
//! - [`Instant`], [`Duration`]: nanosecond virtual time

pub mod address;
pub mod ids;
pub mod time;

pub use address::{Address, AddressKind};
pub use ids::{ChannelId, ComponentId, ComponentType, ManagerId};
pub use time::{Duration, Instant};
