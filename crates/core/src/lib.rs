//! Swann smart plug provisioning protocol
//!
//! This crate describes the frames exchanged with the plug while it runs its
//! private access point: outgoing commands, incoming responses and the error
//! type shared by the whole workspace. It does not perform any I/O.

// Linter configuration
#![warn(unsafe_code, clippy::pedantic, clippy::use_self)]
// Too many false positives.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

pub use crate::{
    errors::{Error, Result},
    message::Message,
    request::{Request, RequestType},
    response::{Response, ResponseType},
};

pub mod errors;
pub mod message;
pub mod request;
pub mod response;
