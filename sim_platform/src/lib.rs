//! # Simulated Platform
//!
//! An in-process network connecting several component managers on one
//! thread.
//!
//! ## Purpose
//!
//! The simulated network allows testing cross-manager behaviour without
//! threads or sockets:
//! - Runs under `cargo test`
//! - Deterministic (one shared manual clock, explicit delivery steps)
//! - Inspectable (queues, placements and created components are visible)
//!
//! ## Philosophy
//!
//! **The network is just another collaborator.** Managers talk to it through
//! the same `Platform` trait a real transport implements, so what passes
//! here exercises the real protocol code.
//!
//! Messages a manager hands to its [`SimPlatform`] sit in the destination
//! manager's queue until the test calls [`SimNetwork::deliver`] (or
//! [`SimNetwork::run_until_idle`]), or until the destination drains its own
//! queue through `Platform::process_events`.

pub mod fault_injection;

use component_manager::{ComponentManager, ComponentRegistry, ManagerConfig};
use core_types::{Address, ComponentType, Duration, ManagerId};
use fault_injection::{FaultInjector, FaultPlan};
use ipc::Message;
use platform_api::{ManualClock, MessagingError, Platform, ProcessFlags};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, trace};

/// Shared network state
#[derive(Default)]
struct NetworkState {
    /// Messages in transit, per destination manager
    queues: BTreeMap<ManagerId, VecDeque<Message>>,
    /// Where components of a type are created
    placements: HashMap<ComponentType, ManagerId>,
    /// Components created in answer to requests, in creation order
    created: Vec<Address>,
    dead: BTreeSet<ManagerId>,
    faults: FaultInjector,
}

/// A simulated network of component managers
///
/// Clones share the same network.
#[derive(Clone, Default)]
pub struct SimNetwork {
    state: Rc<RefCell<NetworkState>>,
    clock: ManualClock,
    registry: ComponentRegistry,
}

impl SimNetwork {
    /// Creates an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the registry every manager built by [`SimNetwork::manager`] starts with
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Installs a fault plan for messages crossing the network
    pub fn with_fault_plan(self, plan: FaultPlan) -> Self {
        self.state.borrow_mut().faults = FaultInjector::new(plan);
        self
    }

    /// The clock shared by every manager on this network
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Advances simulated time
    pub fn advance(&self, duration: Duration) {
        self.clock.advance(duration);
    }

    /// Places future components of `component_type` on `manager`
    pub fn place(&self, component_type: impl Into<ComponentType>, manager: ManagerId) {
        self.state
            .borrow_mut()
            .placements
            .insert(component_type.into(), manager);
    }

    /// Creates the platform for manager `id`, joining it to the network
    pub fn platform_for(&self, id: ManagerId) -> SimPlatform {
        self.state.borrow_mut().queues.entry(id).or_default();
        SimPlatform {
            id,
            state: self.state.clone(),
        }
    }

    /// Builds a manager wired to this network and its clock
    pub fn manager(&self, config: ManagerConfig) -> ComponentManager {
        let platform = self.platform_for(config.manager_id);
        ComponentManager::new(config, Box::new(platform))
            .with_clock(Rc::new(self.clock.clone()))
            .with_registry(self.registry.clone())
    }

    /// Number of messages waiting for `manager`
    pub fn queued(&self, manager: ManagerId) -> usize {
        self.state
            .borrow()
            .queues
            .get(&manager)
            .map_or(0, VecDeque::len)
    }

    /// Components created on request so far, in creation order
    pub fn created(&self) -> Vec<Address> {
        self.state.borrow().created.clone()
    }

    /// Number of messages lost to injected faults
    pub fn dropped(&self) -> usize {
        self.state.borrow().faults.dropped()
    }

    pub fn is_dead(&self, manager: ManagerId) -> bool {
        self.state.borrow().dead.contains(&manager)
    }

    /// Kills a manager
    ///
    /// Its queued traffic is discarded and future traffic to it is lost. The
    /// initial manager is told through a peer-gone message, as a real
    /// transport would on losing a connection.
    pub fn kill(&self, manager: ManagerId) -> Result<(), MessagingError> {
        let mut state = self.state.borrow_mut();
        state.dead.insert(manager);
        let discarded = state.queues.remove(&manager).map_or(0, |queue| queue.len());
        debug!(%manager, discarded, "manager killed");

        if manager != ManagerId::INITIAL {
            let notice = Message::peer_gone(manager)?
                .with_destination(Address::manager(ManagerId::INITIAL));
            if let Some(queue) = state.queues.get_mut(&ManagerId::INITIAL) {
                queue.push_back(notice);
            }
        }
        Ok(())
    }

    /// Hands queued messages to the managers they are addressed to
    ///
    /// Messages for managers not in `managers` stay queued. Returns the
    /// number of messages delivered.
    pub fn deliver(&self, managers: &mut [ComponentManager]) -> usize {
        let mut delivered = 0;
        for manager in managers.iter_mut() {
            let inbound = take_queue(&self.state, manager.id());
            for message in inbound {
                delivered += 1;
                if let Err(err) = manager.receive(message) {
                    debug!(manager = %manager.id(), error = %err, "delivery refused");
                }
            }
        }
        delivered
    }

    /// Alternates delivery and dispatch until nothing is left to do
    ///
    /// Delayed messages are not waited for. Returns the number of messages
    /// dispatched.
    pub fn run_until_idle(&self, managers: &mut [ComponentManager]) -> usize {
        const MAX_ROUNDS: usize = 10_000;

        let mut dispatched = 0;
        for _ in 0..MAX_ROUNDS {
            let delivered = self.deliver(managers);
            let round: usize = managers
                .iter_mut()
                .map(ComponentManager::run_until_idle)
                .sum();
            dispatched += round;
            if delivered == 0 && round == 0 {
                break;
            }
        }
        dispatched
    }
}

fn take_queue(state: &Rc<RefCell<NetworkState>>, manager: ManagerId) -> Vec<Message> {
    state
        .borrow_mut()
        .queues
        .get_mut(&manager)
        .map(|queue| queue.drain(..).collect())
        .unwrap_or_default()
}

/// One manager's connection to a [`SimNetwork`]
pub struct SimPlatform {
    id: ManagerId,
    state: Rc<RefCell<NetworkState>>,
}

impl SimPlatform {
    pub fn id(&self) -> ManagerId {
        self.id
    }
}

impl Platform for SimPlatform {
    fn send_message(&mut self, mut message: Message) -> Result<(), MessagingError> {
        let destination = message.destination.ok_or(MessagingError::NoDestination)?;
        let target = destination.manager;
        let mut state = self.state.borrow_mut();

        if state.dead.contains(&target) {
            trace!(from = %self.id, to = %target, id = %message.id, "message to dead manager lost");
            return Ok(());
        }
        if !state.queues.contains_key(&target) {
            return Err(MessagingError::NoRoute);
        }
        if state.faults.should_drop(&message) {
            debug!(from = %self.id, to = %target, id = %message.id, "message dropped by fault plan");
            return Ok(());
        }
        if let Some(delay) = state.faults.take_delay() {
            message.delay = message.delay + delay;
        }

        trace!(from = %self.id, to = %target, id = %message.id, "message in transit");
        if let Some(queue) = state.queues.get_mut(&target) {
            queue.push_back(message);
        }
        Ok(())
    }

    fn request_peer(
        &mut self,
        requester: Address,
        component_type: &ComponentType,
    ) -> Result<ManagerId, MessagingError> {
        let state = self.state.borrow();
        let target = state
            .placements
            .get(component_type)
            .copied()
            .unwrap_or(requester.manager);
        if state.dead.contains(&target) || !state.queues.contains_key(&target) {
            return Err(MessagingError::Platform(format!(
                "cannot place {} on unreachable manager {}",
                component_type, target
            )));
        }
        Ok(target)
    }

    fn on_component_created(&mut self, address: Address) {
        self.state.borrow_mut().created.push(address);
    }

    fn process_events(&mut self, flags: ProcessFlags) -> Result<Vec<Message>, MessagingError> {
        if !flags.contains(ProcessFlags::PROCESS_IPC_MESSAGES) {
            return Ok(Vec::new());
        }
        Ok(take_queue(&self.state, self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use component_manager::test_utils::{test_registry, RecordingListener, TEST_COMPONENT};
    use component_manager::Messenger;
    use core_types::{ChannelId, ComponentId};
    use fault_injection::MessageFault;
    use ipc::{MessageType, SendFlags};

    fn network() -> SimNetwork {
        SimNetwork::new().with_registry(test_registry())
    }

    fn config(id: u32) -> ManagerConfig {
        ManagerConfig::new(ManagerId::new(id))
    }

    fn ping() -> Message {
        Message::domain("ping", &1u32).unwrap()
    }

    #[test]
    fn test_message_crosses_managers() {
        let network = network();
        let mut managers = vec![network.manager(config(0)), network.manager(config(1))];
        let (recorder, handle) = RecordingListener::handle();
        managers[1].add_listener(&handle);

        let target = managers[1].address();
        managers[0]
            .send(Message::signal(MessageType::domain("hello")).with_destination(target), SendFlags::NONE)
            .unwrap();
        assert_eq!(network.queued(ManagerId::new(1)), 1);

        network.run_until_idle(&mut managers);
        assert_eq!(recorder.borrow().count(), 1);
        assert_eq!(
            recorder.borrow().last().unwrap().source,
            Some(Address::manager(ManagerId::INITIAL))
        );
    }

    #[test]
    fn test_unknown_manager_has_no_route() {
        let network = network();
        let mut platform = network.platform_for(ManagerId::INITIAL);
        let message = ping().with_destination(Address::manager(ManagerId::new(7)));
        assert_eq!(platform.send_message(message), Err(MessagingError::NoRoute));
        assert_eq!(
            platform.send_message(ping()),
            Err(MessagingError::NoDestination)
        );
    }

    #[test]
    fn test_process_events_drains_own_queue() {
        let network = network();
        let mut sender = network.platform_for(ManagerId::INITIAL);
        let mut receiver = network.platform_for(ManagerId::new(1));
        sender
            .send_message(ping().with_destination(Address::manager(ManagerId::new(1))))
            .unwrap();

        assert!(receiver.process_events(ProcessFlags::NONE).unwrap().is_empty());
        assert_eq!(
            receiver
                .process_events(ProcessFlags::PROCESS_IPC_MESSAGES)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(network.queued(ManagerId::new(1)), 0);
    }

    #[test]
    fn test_placement_defaults_to_requester() {
        let network = network();
        network.platform_for(ManagerId::new(2));
        let mut platform = network.platform_for(ManagerId::INITIAL);
        let requester = Address::channel(ManagerId::INITIAL, ComponentId::FIRST, ChannelId::new(2));

        assert_eq!(
            platform.request_peer(requester, &ComponentType::from("worker")),
            Ok(ManagerId::INITIAL)
        );
        network.place("worker", ManagerId::new(2));
        assert_eq!(
            platform.request_peer(requester, &ComponentType::from("worker")),
            Ok(ManagerId::new(2))
        );

        network.kill(ManagerId::new(2)).unwrap();
        assert!(matches!(
            platform.request_peer(requester, &ComponentType::from("worker")),
            Err(MessagingError::Platform(_))
        ));
    }

    #[test]
    fn test_kill_discards_traffic_and_notifies_initial() {
        let network = network();
        let mut managers = vec![network.manager(config(0)), network.manager(config(1))];
        let target = managers[1].address();
        managers[0]
            .send(Message::signal(MessageType::domain("hello")).with_destination(target), SendFlags::NONE)
            .unwrap();

        network.kill(ManagerId::new(1)).unwrap();
        assert!(network.is_dead(ManagerId::new(1)));
        assert_eq!(network.queued(ManagerId::new(1)), 0);
        assert_eq!(network.queued(ManagerId::INITIAL), 1);

        managers[0]
            .send(Message::signal(MessageType::domain("again")).with_destination(target), SendFlags::NONE)
            .unwrap();
        assert_eq!(network.queued(ManagerId::new(1)), 0);
    }

    #[test]
    fn test_fault_plan_drops_in_transit() {
        let network = network().with_fault_plan(
            FaultPlan::new().with_message_fault(MessageFault::DropToManager {
                manager: ManagerId::new(1),
                count: 1,
            }),
        );
        let mut managers = vec![network.manager(config(0)), network.manager(config(1))];
        let (recorder, handle) = RecordingListener::handle();
        managers[1].add_listener(&handle);

        let target = managers[1].address();
        for _ in 0..2 {
            managers[0]
                .send(ping().with_destination(target), SendFlags::NONE)
                .unwrap();
        }
        network.run_until_idle(&mut managers);

        assert_eq!(network.dropped(), 1);
        assert_eq!(recorder.borrow().count(), 1);
    }

    #[test]
    fn test_fault_plan_delays_in_transit() {
        let network = network().with_fault_plan(FaultPlan::new().with_message_fault(
            MessageFault::Delay {
                duration: Duration::from_millis(50),
            },
        ));
        let mut managers = vec![network.manager(config(0)), network.manager(config(1))];
        let (recorder, handle) = RecordingListener::handle();
        managers[1].add_listener(&handle);

        let target = managers[1].address();
        managers[0]
            .send(ping().with_destination(target), SendFlags::NONE)
            .unwrap();
        network.run_until_idle(&mut managers);
        assert_eq!(recorder.borrow().count(), 0);

        network.advance(Duration::from_millis(50));
        network.run_until_idle(&mut managers);
        assert_eq!(recorder.borrow().count(), 1);
    }

    #[test]
    fn test_requested_component_logged() {
        let network = network();
        network.place(component_manager::test_utils::ECHO_COMPONENT, ManagerId::new(1));
        let mut managers = vec![network.manager(config(0)), network.manager(config(1))];

        let owner = managers[0].create_component(TEST_COMPONENT).unwrap();
        let requester = managers[0]
            .component(owner)
            .unwrap()
            .request_component(component_manager::test_utils::ECHO_COMPONENT, None)
            .unwrap();
        network.run_until_idle(&mut managers);

        let root = Address::channel(ManagerId::new(1), ComponentId::FIRST, ChannelId::ROOT);
        assert_eq!(network.created(), vec![root.component_address()]);
        assert_eq!(
            managers[0].get_channel(requester).unwrap().destination(),
            Some(root)
        );

        managers[0]
            .channel(requester)
            .unwrap()
            .send(ping(), SendFlags::NONE)
            .unwrap();
        assert_eq!(network.run_until_idle(&mut managers), 2);
    }
}
