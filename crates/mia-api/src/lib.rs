mod clock;
mod service;
mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use service::{ConsentService, ConsentServiceOptions};
pub use store::{check_session_write, MemoryScriptStore, ScriptStore};
