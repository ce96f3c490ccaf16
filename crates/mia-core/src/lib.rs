pub mod error;
pub mod session;
pub mod types;
pub mod value;

pub use error::{ConsentError, ScriptError, ValidationError};
pub use session::*;
pub use types::*;
pub use value::*;
