//! Client layer: the Connection Manager and the Message Router.

pub mod config;
pub mod connection;
pub mod events;
pub mod heartbeat;
pub mod pending;
pub mod reconnect;
pub mod router;
pub mod task;

pub use config::ClientConfig;
pub use connection::Connection;
pub use events::ConnectionEvent;
pub use heartbeat::Heartbeat;
pub use pending::{PendingRequests, PendingTicket};
pub use reconnect::ReconnectPolicy;
pub use router::{Handler, HandlerError, HandlerId, HandlerResult, MessageRouter};
pub use task::TaskGuard;
