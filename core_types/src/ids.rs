//! Identifiers for addressable entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a component manager
///
/// One manager runs per thread or process. Manager `0` is the well-known
/// initial manager that places new components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ManagerId(u32);

impl ManagerId {
    /// The well-known initial manager
    pub const INITIAL: ManagerId = ManagerId(0);

    /// Creates a manager ID from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Checks if this is the initial manager
    pub const fn is_initial(&self) -> bool {
        self.0 == Self::INITIAL.0
    }
}

impl Default for ManagerId {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Manager({})", self.0)
    }
}

/// Identifier of a component within its manager
///
/// `ComponentId::NONE` is the structural sentinel used in manager addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Sentinel: the address denotes a manager
    pub const NONE: ComponentId = ComponentId(0);

    /// First id handed out by a manager
    pub const FIRST: ComponentId = ComponentId(1);

    /// Creates a component ID from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Checks if this is the sentinel value
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Returns the following id, or `None` on overflow
    ///
    /// Allocators only hand out an id whose successor exists, so `u32::MAX`
    /// itself is never issued.
    pub fn checked_next(&self) -> Option<ComponentId> {
        self.0.checked_add(1).map(ComponentId)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// Identifier of a channel within its component
///
/// `ChannelId::NONE` marks component addresses and `ChannelId::ROOT` is
/// reserved for the channel that controls the component's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChannelId(u32);

impl ChannelId {
    /// Sentinel: the address denotes a component
    pub const NONE: ChannelId = ChannelId(0);

    /// Reserved id of the root channel
    pub const ROOT: ChannelId = ChannelId(1);

    /// First id handed out by a component's counter
    pub const FIRST_DYNAMIC: ChannelId = ChannelId(2);

    /// Creates a channel ID from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Checks if this is the sentinel value
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Checks if this is the reserved root id
    pub const fn is_root(&self) -> bool {
        self.0 == Self::ROOT.0
    }

    /// Returns the following id, or `None` on overflow
    ///
    /// Allocators only hand out an id whose successor exists, so `u32::MAX`
    /// itself is never issued.
    pub fn checked_next(&self) -> Option<ChannelId> {
        self.0.checked_add(1).map(ChannelId)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({})", self.0)
    }
}

/// Type tag of a component
///
/// Component types are domain-defined names such as `"plugin.host"`.
/// The messaging core never interprets them beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentType(String);

impl ComponentType {
    /// Creates a component type from a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the type name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ComponentType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ComponentType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
