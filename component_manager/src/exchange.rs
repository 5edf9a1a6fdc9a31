//! Synchronous request/response on a channel
//!
//! `exchange` sends a message and keeps the manager running until a reply
//! arrives on the sending channel. While it waits, a dispatch filter holds
//! back every message addressed anywhere else, so unrelated components do
//! not run underneath the caller. The peer therefore has to live on another
//! manager; replies come in through `Platform::process_events`.

use crate::messenger::{Listener, ListenerHandle, Messenger};
use crate::{ComponentManager, NextWakeup};
use core_types::{Address, Duration};
use ipc::{ExceptDestination, Message, MessageType, SendFlags};
use platform_api::{MessagingError, ProcessFlags};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Catches the first reply delivered to the waiting channel
#[derive(Default)]
struct ReplySlot {
    reply: Option<Message>,
}

impl Listener for ReplySlot {
    fn on_message(
        &mut self,
        message: &Message,
        _manager: &mut ComponentManager,
    ) -> Result<(), MessagingError> {
        let handshake = matches!(
            message.message_type,
            MessageType::ConnectNotify | MessageType::PendingNotify
        );
        if self.reply.is_none() && !handshake {
            self.reply = Some(message.clone());
        }
        Ok(())
    }
}

impl ComponentManager {
    /// Sends `message` on `channel` and waits for the reply
    ///
    /// Only messages addressed to `channel` are dispatched until the reply
    /// arrives or `timeout` passes. A disconnect-notify on the channel ends
    /// the wait with [`MessagingError::NoRoute`]. The reply is also delivered
    /// to the channel's regular listeners.
    pub fn exchange(
        &mut self,
        channel: Address,
        message: Message,
        timeout: Duration,
    ) -> Result<Message, MessagingError> {
        let slot = Rc::new(RefCell::new(ReplySlot::default()));
        let catcher: ListenerHandle = slot.clone();

        {
            let mut waiting = self.channel(channel)?;
            waiting.add_listener_with(&catcher, true)?;
            if let Err(err) = waiting.send(message, SendFlags::NONE) {
                waiting.remove_listener(&catcher);
                return Err(err);
            }
        }

        let filter = self.add_message_filter(Box::new(ExceptDestination(channel)));
        let deadline = self.clock.now() + timeout;
        debug!(%channel, timeout_ms = timeout.as_millis(), "waiting for reply");

        let outcome = loop {
            if let Some(reply) = slot.borrow_mut().reply.take() {
                break Ok(reply);
            }
            let now = self.clock.now();
            if now >= deadline {
                break Err(MessagingError::Timeout);
            }
            match self.platform.process_events(ProcessFlags::PROCESS_IPC_MESSAGES) {
                Ok(inbound) => {
                    for message in inbound {
                        if let Err(err) = self.receive(message) {
                            warn!(%channel, error = %err, "inbound message dropped");
                        }
                    }
                }
                Err(err) => break Err(err),
            }

            let wakeup = self.run_slice(0);
            if slot.borrow().reply.is_some() {
                continue;
            }
            let remaining = deadline.duration_since(self.clock.now());
            match wakeup {
                NextWakeup::After(delay) if delay.is_zero() => {}
                NextWakeup::After(delay) => self.clock.idle(delay.min(remaining)),
                NextWakeup::Infinite => self.clock.idle(remaining),
            }
        };

        self.remove_message_filter(filter);
        if let Ok(mut waiting) = self.channel(channel) {
            waiting.remove_listener(&catcher);
        }

        match outcome {
            Ok(reply) if reply.message_type == MessageType::DisconnectNotify => {
                debug!(%channel, "peer disconnected during exchange");
                Err(MessagingError::NoRoute)
            }
            other => other,
        }
    }
}
