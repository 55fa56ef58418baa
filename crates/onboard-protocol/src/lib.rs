//! # onboard-protocol
//!
//! Bridge message types and codec.
//!
//! This crate defines the JSON request and response bodies of the
//! onboarding bridge's HTTP API.

pub mod codec;
pub mod messages;

pub use codec::{decode_connect_request, decode_connect_saved_request, encode_response, CodecError};
pub use messages::*;
