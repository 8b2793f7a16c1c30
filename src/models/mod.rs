pub mod session;

pub use session::{CollectOutcome, MediaItem, MediaKind, Session, SessionState, TimeoutAction};
