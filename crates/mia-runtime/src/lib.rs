mod projector;
mod resolver;
mod traversal;
mod validator;

pub use projector::project;
pub use resolver::resolve;
pub use traversal::{advance, auto_advance, bootstrap, destination, Advance, Walk};
pub use validator::{validate, Answer, ValidatedResponse, DEFAULT_SUBMIT_LABEL};
