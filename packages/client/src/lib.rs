//! Client of the gateway's TCP RPC transport.
//!
//! Frames carry a 4 byte big endian length followed by a JSON
//! [`protocol::Request`] or [`protocol::Response`].

mod client;
mod error;
pub mod protocol;

pub use client::Client;
pub use error::{Error, Result};
pub use services::{
    ErrorKind,
    types::{BackendType, DaReference, Submission},
};
