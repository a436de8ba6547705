pub mod codec;
pub mod messages;

pub use codec::{LineReader, LineWriter, is_timeout, split};
pub use messages::{ClientCommand, ServerMessage};
