//! Message Router: routes inbound envelopes to registered handlers.
//!
//! The registry holds at most one handler per message type (registering a
//! type again replaces the previous handler) plus an ordered list of global
//! handlers that see every envelope. For each envelope the type handler runs
//! first, then the global handlers in registration order.
//!
//! Handlers are isolated from each other: an `Err` return or a panic in one
//! handler is logged and the remaining handlers still run.

use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::MsgType;
use crate::infrastructure::dto::Envelope;
use crate::infrastructure::error::ProtocolError;

/// Error returned by a handler. Logged, never propagated.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub type HandlerResult = Result<(), HandlerError>;

/// A message callback.
pub type Handler = Arc<dyn Fn(&Envelope) -> HandlerResult + Send + Sync>;

/// Identifies a registered global handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
struct Registry {
    typed: HashMap<MsgType, Handler>,
    global: Vec<(HandlerId, Handler)>,
    next_id: u64,
}

/// Handler registry and dispatcher.
#[derive(Default)]
pub struct MessageRouter {
    registry: Mutex<Registry>,
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.lock();
        f.debug_struct("MessageRouter")
            .field("typed", &registry.typed.keys().collect::<Vec<_>>())
            .field("global", &registry.global.len())
            .finish()
    }
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the handler for `msg_type`, replacing any previous one.
    pub fn register_handler<F>(&self, msg_type: MsgType, handler: F)
    where
        F: Fn(&Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        if self.lock().typed.insert(msg_type, Arc::new(handler)).is_some() {
            tracing::debug!(%msg_type, "replaced message handler");
        }
    }

    /// Remove the handler for `msg_type`. No-op when none is registered.
    pub fn unregister_handler(&self, msg_type: MsgType) {
        self.lock().typed.remove(&msg_type);
    }

    /// Append a handler that sees every envelope.
    pub fn register_global_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = HandlerId(registry.next_id);
        registry.next_id += 1;
        registry.global.push((id, Arc::new(handler)));
        id
    }

    /// Remove one global handler. Returns whether it was registered.
    pub fn unregister_global_handler(&self, id: HandlerId) -> bool {
        let mut registry = self.lock();
        let before = registry.global.len();
        registry.global.retain(|(handler_id, _)| *handler_id != id);
        registry.global.len() != before
    }

    pub fn unregister_all_global_handlers(&self) {
        self.lock().global.clear();
    }

    /// Remove every handler.
    pub fn clear(&self) {
        let mut registry = self.lock();
        registry.typed.clear();
        registry.global.clear();
    }

    /// Type handlers plus global handlers currently registered.
    pub fn handler_count(&self) -> usize {
        let registry = self.lock();
        registry.typed.len() + registry.global.len()
    }

    pub fn has_handler(&self, msg_type: MsgType) -> bool {
        self.lock().typed.contains_key(&msg_type)
    }

    /// Parse a raw frame and deliver it.
    ///
    /// Returns the number of handlers invoked.
    ///
    /// # Errors
    ///
    /// Returns the `ProtocolError` of a malformed frame; no handler runs.
    pub fn dispatch(&self, raw: &str) -> Result<usize, ProtocolError> {
        let envelope = Envelope::parse(raw)?;
        Ok(self.deliver(&envelope))
    }

    /// Invoke the type handler, then every global handler, with `envelope`.
    ///
    /// Handlers run on a snapshot of the registry with the lock released, so
    /// they may register or unregister handlers themselves.
    pub fn deliver(&self, envelope: &Envelope) -> usize {
        let (typed, global) = {
            let registry = self.lock();
            let typed = registry.typed.get(&envelope.msg_type).cloned();
            let global: Vec<Handler> = registry
                .global
                .iter()
                .map(|(_, handler)| handler.clone())
                .collect();
            (typed, global)
        };

        let mut invoked = 0;
        if let Some(handler) = typed {
            invoke("type", &handler, envelope);
            invoked += 1;
        }
        for handler in &global {
            invoke("global", handler, envelope);
            invoked += 1;
        }
        invoked
    }
}

fn invoke(kind: &'static str, handler: &Handler, envelope: &Envelope) {
    match catch_unwind(AssertUnwindSafe(|| handler(envelope))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(kind, msg_type = %envelope.msg_type, error = %e, "message handler failed");
        }
        Err(panic) => {
            tracing::error!(
                kind,
                msg_type = %envelope.msg_type,
                panic = %panic_message(panic.as_ref()),
                "message handler panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    }
}
