pub mod mask;
pub mod session;

pub use session::{GameSession, GuessOutcome, MAX_ERRORS, SessionId, SessionOutcome, SessionState};
