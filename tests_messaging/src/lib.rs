//! Messaging Test Utilities
//!
//! Shared setup for the cross-manager integration tests.
//!
//! ## Test Philosophy
//!
//! - **Both ends agree**: after every scenario, connected channels point at each other
//! - **Deterministic delivery**: all traffic crosses a `SimNetwork` on a manual clock
//! - **Faults are planned**: losses and reorderings come from a `FaultPlan`
//! - **Nothing lingers**: torn-down endpoints leave no queued or bounced traffic

use component_manager::test_utils::{test_registry, TEST_COMPONENT};
use component_manager::{ComponentManager, ListenerHandle, ManagerConfig};
use core_types::{Address, ManagerId};
use platform_api::MessagingError;
use sim_platform::SimNetwork;
use tracing_subscriber::EnvFilter;

/// Installs a log subscriber honouring `RUST_LOG`, once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Network whose managers know the stock test component types
pub fn test_network() -> SimNetwork {
    init_tracing();
    SimNetwork::new().with_registry(test_registry())
}

/// Creates managers `0..count` on `network`; manager 0 is the initial one
pub fn spawn_managers(network: &SimNetwork, count: u32) -> Vec<ComponentManager> {
    (0..count)
        .map(|id| network.manager(ManagerConfig::new(ManagerId::new(id))))
        .collect()
}

/// Bootstraps a component on `manager` and requests `component_type` from it
///
/// Returns the requesting channel.
pub fn request_from(
    manager: &mut ComponentManager,
    component_type: &str,
    listener: Option<&ListenerHandle>,
) -> Result<Address, MessagingError> {
    let owner = manager.create_component(TEST_COMPONENT)?;
    manager
        .component(owner)?
        .request_component(component_type, listener)
}

/// Asserts that two channels are connected to each other
pub fn assert_connected(managers: &[ComponentManager], a: Address, b: Address) {
    let find = |address: Address| {
        managers
            .iter()
            .find_map(|manager| manager.get_channel(address))
            .unwrap_or_else(|| panic!("channel {} not found", address))
    };
    let (left, right) = (find(a), find(b));
    assert!(left.is_connected(), "{} is not connected", a);
    assert!(right.is_connected(), "{} is not connected", b);
    assert_eq!(left.destination(), Some(b));
    assert_eq!(right.destination(), Some(a));
}
