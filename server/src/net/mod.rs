pub mod connection;
pub mod event;
pub mod handler;
pub mod listener;

pub use connection::{ConnectionId, PlayerHandle};
pub use handler::ConnectionTimeouts;
pub use listener::{accept_loop, create_tcp_listener};
