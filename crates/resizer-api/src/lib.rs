//! resizer-api: Wire types shared by the resize worker
//!
//! Contains the `ResizeRequest` payload, its validation rules, and the
//! message-bus subjects the worker listens and reports on.

pub mod error;
pub mod request;
pub mod subjects;
pub mod validation;

pub use error::{ParseError, ValidationError};
pub use request::ResizeRequest;
pub use validation::ValidationRules;
