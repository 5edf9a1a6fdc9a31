//! Send/receive/listen contract shared by every addressable entity
//!
//! Listeners are referenced, never owned: a messenger keeps weak handles
//! and silently forgets listeners whose owner has dropped them. Fan-out
//! works on a snapshot of strong handles, so a listener may add or remove
//! listeners, or destroy the very channel or component delivering to it,
//! without invalidating the iteration.

use crate::ComponentManager;
use core_types::Address;
use ipc::{Message, SendFlags};
use platform_api::MessagingError;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Receives messages delivered to a channel, component or manager
pub trait Listener {
    /// Handles one message
    ///
    /// `manager` is the manager currently dispatching; it is the only way
    /// to reach the rest of the system from inside a listener.
    fn on_message(
        &mut self,
        message: &Message,
        manager: &mut ComponentManager,
    ) -> Result<(), MessagingError>;
}

/// Shared handle to a listener
pub type ListenerHandle = Rc<RefCell<dyn Listener>>;

/// Listener backed by a closure
pub struct FnListener<F>(pub F)
where
    F: FnMut(&Message, &mut ComponentManager) -> Result<(), MessagingError>;

impl<F> Listener for FnListener<F>
where
    F: FnMut(&Message, &mut ComponentManager) -> Result<(), MessagingError>,
{
    fn on_message(
        &mut self,
        message: &Message,
        manager: &mut ComponentManager,
    ) -> Result<(), MessagingError> {
        (self.0)(message, manager)
    }
}

/// Wraps a closure in a listener handle
pub fn listener_fn<F>(f: F) -> ListenerHandle
where
    F: FnMut(&Message, &mut ComponentManager) -> Result<(), MessagingError> + 'static,
{
    Rc::new(RefCell::new(FnListener(f)))
}

/// Registration-ordered list of weakly held listeners
#[derive(Default)]
pub struct ListenerList {
    entries: Vec<Weak<RefCell<dyn Listener>>>,
}

impl ListenerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener; returns false if it was already registered
    pub fn add(&mut self, listener: &ListenerHandle) -> bool {
        if self.contains(listener) {
            return false;
        }
        self.entries.push(Rc::downgrade(listener));
        true
    }

    /// Removes a listener; returns false if it was not registered
    pub fn remove(&mut self, listener: &ListenerHandle) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !std::ptr::addr_eq(entry.as_ptr(), Rc::as_ptr(listener)));
        self.entries.len() != before
    }

    pub fn contains(&self, listener: &ListenerHandle) -> bool {
        self.entries
            .iter()
            .any(|entry| std::ptr::addr_eq(entry.as_ptr(), Rc::as_ptr(listener)))
    }

    /// Number of listeners still alive
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Strong handles to every live listener, in registration order
    ///
    /// Dead entries are pruned on the way.
    pub fn snapshot(&mut self) -> Vec<ListenerHandle> {
        self.entries.retain(|entry| entry.strong_count() > 0);
        self.entries.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Delivers `message` to every listener in `listeners`
///
/// Every listener sees the message even if an earlier one fails; the first
/// error is returned. A listener that is already handling a message further
/// up the stack is reported busy and skipped.
pub fn fan_out(
    listeners: &[ListenerHandle],
    message: &Message,
    manager: &mut ComponentManager,
) -> Result<(), MessagingError> {
    let mut first_error = None;

    for listener in listeners {
        let result = match listener.try_borrow_mut() {
            Ok(mut listener) => listener.on_message(message, manager),
            Err(_) => Err(MessagingError::InvalidState(
                "listener is already handling a message".to_string(),
            )),
        };

        if let Err(err) = result {
            first_error.get_or_insert(err);
        }
    }

    first_error.map_or(Ok(()), Err)
}

/// Something that can send, process and be listened to
///
/// Implemented by channel and component handles and by the manager itself.
/// Sending always consumes the message: ownership passes to the messaging
/// infrastructure, which either delivers or discards it.
pub trait Messenger {
    /// Address of this messenger, if it has one yet
    fn address(&self) -> Option<Address>;

    /// Sends a message, stamping this messenger as source where appropriate
    fn send(&mut self, message: Message, flags: SendFlags) -> Result<(), MessagingError>;

    /// Sends a message that may have failed to materialise
    fn send_opt(
        &mut self,
        message: Option<Message>,
        flags: SendFlags,
    ) -> Result<(), MessagingError> {
        match message {
            Some(message) => self.send(message, flags),
            None => Err(MessagingError::missing_message(flags)),
        }
    }

    /// Sends `reply` back along the path `original` came
    fn reply_to(
        &mut self,
        original: &Message,
        reply: Message,
        flags: SendFlags,
    ) -> Result<(), MessagingError> {
        self.send(original.mirror_into(reply), flags)
    }

    /// Handles an inbound message addressed to this messenger
    fn process(&mut self, message: Message) -> Result<(), MessagingError>;

    fn add_listener(&mut self, listener: &ListenerHandle) -> Result<(), MessagingError>;

    fn remove_listener(&mut self, listener: &ListenerHandle) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{local_manager, FailingListener, RecordingListener};
    use core_types::ManagerId;
    use ipc::MessageType;

    #[test]
    fn test_listener_list_add_remove() {
        let (recorder, handle) = RecordingListener::handle();
        let mut list = ListenerList::new();

        assert!(list.add(&handle));
        assert!(!list.add(&handle));
        assert_eq!(list.len(), 1);
        assert!(list.contains(&handle));

        assert!(list.remove(&handle));
        assert!(!list.remove(&handle));
        assert!(list.is_empty());
        drop(recorder);
    }

    #[test]
    fn test_listener_list_forgets_dropped_listeners() {
        let mut list = ListenerList::new();
        {
            let (_recorder, handle) = RecordingListener::handle();
            list.add(&handle);
            assert_eq!(list.len(), 1);
        }
        assert_eq!(list.len(), 0);
        assert!(list.snapshot().is_empty());
    }

    #[test]
    fn test_fan_out_reaches_every_listener_and_keeps_first_error() {
        let (mut manager, _clock) = local_manager(ManagerId::INITIAL);
        let (first, first_handle) = RecordingListener::handle();
        let failing_a: ListenerHandle = Rc::new(RefCell::new(FailingListener::new("a")));
        let failing_b: ListenerHandle = Rc::new(RefCell::new(FailingListener::new("b")));
        let (last, last_handle) = RecordingListener::handle();

        let listeners = vec![first_handle, failing_a, failing_b, last_handle];
        let message = Message::signal(MessageType::domain("test"));
        let result = fan_out(&listeners, &message, &mut manager);

        assert_eq!(result, Err(MessagingError::Handler("a".to_string())));
        assert_eq!(first.borrow().count(), 1);
        assert_eq!(last.borrow().count(), 1);
    }

    #[test]
    fn test_fan_out_skips_busy_listener() {
        let (mut manager, _clock) = local_manager(ManagerId::INITIAL);
        let (recorder, handle) = RecordingListener::handle();
        let _guard = recorder.borrow_mut();

        let result = fan_out(
            &[handle],
            &Message::signal(MessageType::domain("test")),
            &mut manager,
        );
        assert!(matches!(result, Err(MessagingError::InvalidState(_))));
    }

    #[test]
    fn test_listener_fn() {
        let (mut manager, _clock) = local_manager(ManagerId::INITIAL);
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        let handle = listener_fn(move |_, _| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        fan_out(
            &[handle],
            &Message::signal(MessageType::domain("test")),
            &mut manager,
        )
        .unwrap();
        assert_eq!(*seen.borrow(), 1);
    }
}
