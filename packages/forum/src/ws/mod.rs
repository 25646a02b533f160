//! Live-connection hub
//!
//! One WebSocket per signed-in user. Tracks who is connected, routes inbound
//! frames, and fans out presence, private messages, typing indicators and new
//! posts to the right connections.

mod connection;
pub(crate) mod dispatch;
#[cfg(test)]
pub(crate) mod fakes;
mod handler;
mod hub;
mod posts;
mod presence;
mod protocol;
mod registry;
mod relay;
mod store;
mod typing;

pub use handler::handle_socket;
pub use hub::Hub;
pub use store::IdentityResolver;

#[cfg(test)]
pub(crate) use connection::ConnectionHandle;
#[cfg(test)]
pub(crate) use protocol::ServerEvent;
