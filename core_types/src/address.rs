//! Two-level addressing scheme
//!
//! An address is the triple `(manager, component, channel)`. A zero
//! component id denotes a manager, a zero channel id denotes a component,
//! anything else denotes a channel.

use crate::ids::{ChannelId, ComponentId, ManagerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an address refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressKind {
    Manager,
    Component,
    Channel,
}

/// Address of a manager, a component or a channel
///
/// Addresses are plain values: copied freely, compared structurally and
/// never mutated once placed in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    pub manager: ManagerId,
    pub component: ComponentId,
    pub channel: ChannelId,
}

impl Address {
    /// Creates an address from its three parts
    pub const fn new(manager: ManagerId, component: ComponentId, channel: ChannelId) -> Self {
        Self {
            manager,
            component,
            channel,
        }
    }

    /// Address of a manager
    pub const fn manager(manager: ManagerId) -> Self {
        Self::new(manager, ComponentId::NONE, ChannelId::NONE)
    }

    /// Address of a component
    pub const fn component(manager: ManagerId, component: ComponentId) -> Self {
        Self::new(manager, component, ChannelId::NONE)
    }

    /// Address of a channel
    pub const fn channel(manager: ManagerId, component: ComponentId, channel: ChannelId) -> Self {
        Self::new(manager, component, channel)
    }

    /// Returns what this address denotes
    pub fn kind(&self) -> AddressKind {
        if self.component.is_none() {
            AddressKind::Manager
        } else if self.channel.is_none() {
            AddressKind::Component
        } else {
            AddressKind::Channel
        }
    }

    pub fn is_manager(&self) -> bool {
        self.kind() == AddressKind::Manager
    }

    pub fn is_component(&self) -> bool {
        self.kind() == AddressKind::Component
    }

    pub fn is_channel(&self) -> bool {
        self.kind() == AddressKind::Channel
    }

    /// Checks if this is the reserved root channel of a component
    pub fn is_root_channel(&self) -> bool {
        self.is_channel() && self.channel.is_root()
    }

    /// Returns the address of the manager hosting this entity
    pub fn manager_address(&self) -> Address {
        Address::manager(self.manager)
    }

    /// Returns the address of the component owning this entity
    ///
    /// For a manager address this is the manager address itself.
    pub fn component_address(&self) -> Address {
        Address::component(self.manager, self.component)
    }

    /// Returns the address of a sibling channel in the same component
    pub fn with_channel(&self, channel: ChannelId) -> Address {
        Address::channel(self.manager, self.component, channel)
    }

    /// Checks if this address lives on `manager` and, when given, in `component`
    pub fn matches_peer(&self, manager: ManagerId, component: Option<ComponentId>) -> bool {
        self.manager == manager && component.map_or(true, |c| self.component == c)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.manager.as_u32(),
            self.component.as_u32(),
            self.channel.as_u32()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_address_kinds() {
        let m = ManagerId::new(1);
        let c = ComponentId::new(4);

        assert_eq!(Address::manager(m).kind(), AddressKind::Manager);
        assert_eq!(Address::component(m, c).kind(), AddressKind::Component);
        assert_eq!(
            Address::channel(m, c, ChannelId::new(7)).kind(),
            AddressKind::Channel
        );
    }

    #[test]
    fn test_zero_component_wins_over_channel() {
        // A zero component always denotes the manager, whatever the channel says.
        let addr = Address::new(ManagerId::new(1), ComponentId::NONE, ChannelId::new(9));
        assert!(addr.is_manager());
    }

    #[test]
    fn test_root_channel() {
        let root = Address::channel(ManagerId::INITIAL, ComponentId::FIRST, ChannelId::ROOT);
        assert!(root.is_root_channel());
        assert!(!root.component_address().is_root_channel());
    }

    #[test]
    fn test_parent_addresses() {
        let addr = Address::channel(ManagerId::new(2), ComponentId::new(3), ChannelId::new(4));
        assert_eq!(addr.manager_address(), Address::manager(ManagerId::new(2)));
        assert_eq!(
            addr.component_address(),
            Address::component(ManagerId::new(2), ComponentId::new(3))
        );
        assert_eq!(
            addr.with_channel(ChannelId::ROOT),
            Address::channel(ManagerId::new(2), ComponentId::new(3), ChannelId::ROOT)
        );
    }

    #[test]
    fn test_matches_peer() {
        let addr = Address::channel(ManagerId::new(2), ComponentId::new(3), ChannelId::new(4));
        assert!(addr.matches_peer(ManagerId::new(2), None));
        assert!(addr.matches_peer(ManagerId::new(2), Some(ComponentId::new(3))));
        assert!(!addr.matches_peer(ManagerId::new(2), Some(ComponentId::new(5))));
        assert!(!addr.matches_peer(ManagerId::new(1), None));
    }

    #[test]
    fn test_display() {
        let addr = Address::channel(ManagerId::new(1), ComponentId::new(2), ChannelId::new(3));
        assert_eq!(format!("{}", addr), "1:2:3");
    }

    #[test]
    fn test_serde_roundtrip() {
        let addr = Address::channel(ManagerId::new(1), ComponentId::new(2), ChannelId::new(3));
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }

    proptest! {
        #[test]
        fn prop_kind_is_structural(m in 0u32..8, c in 0u32..8, ch in 0u32..8) {
            let addr = Address::new(ManagerId::new(m), ComponentId::new(c), ChannelId::new(ch));
            let expected = if c == 0 {
                AddressKind::Manager
            } else if ch == 0 {
                AddressKind::Component
            } else {
                AddressKind::Channel
            };
            prop_assert_eq!(addr.kind(), expected);
            prop_assert!(addr.component_address().kind() != AddressKind::Channel);
            prop_assert!(addr.manager_address().is_manager());
        }

        #[test]
        fn prop_equality_is_structural(a in (0u32..4, 0u32..4, 0u32..4), b in (0u32..4, 0u32..4, 0u32..4)) {
            let x = Address::new(ManagerId::new(a.0), ComponentId::new(a.1), ChannelId::new(a.2));
            let y = Address::new(ManagerId::new(b.0), ComponentId::new(b.1), ChannelId::new(b.2));
            prop_assert_eq!(x == y, a == b);
        }
    }
}
