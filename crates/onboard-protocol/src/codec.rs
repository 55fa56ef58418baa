//! JSON codec for bridge messages.
//!
//! The bridge exchanges JSON bodies over HTTP. This module provides encoding
//! and decoding utilities for those bodies.

use crate::messages::{BridgeResponse, ConnectRequest, ConnectSavedRequest};
use thiserror::Error;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON (de)serialization failed.
    #[error("Failed to process message: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// The request body was empty.
    #[error("Empty message body")]
    EmptyBody,
}

/// Encode a bridge response to a JSON string.
pub fn encode_response(msg: &BridgeResponse) -> Result<String, CodecError> {
    serde_json::to_string(msg).map_err(CodecError::from)
}

/// Decode a connect request body.
pub fn decode_connect_request(text: &str) -> Result<ConnectRequest, CodecError> {
    if text.trim().is_empty() {
        return Err(CodecError::EmptyBody);
    }
    serde_json::from_str(text).map_err(CodecError::from)
}

/// Decode a connect-saved request body.
pub fn decode_connect_saved_request(text: &str) -> Result<ConnectSavedRequest, CodecError> {
    if text.trim().is_empty() {
        return Err(CodecError::EmptyBody);
    }
    serde_json::from_str(text).map_err(CodecError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{GatewayResponse, SavedListResponse};

    #[test]
    fn test_encode_gateway() {
        let msg = BridgeResponse::Gateway(GatewayResponse {
            gateway: "192.168.4.1".to_string(),
            fallback: true,
        });
        let json = encode_response(&msg).unwrap();

        assert_eq!(json, r#"{"gateway":"192.168.4.1","fallback":true}"#);
    }

    #[test]
    fn test_encode_saved_list() {
        let msg = BridgeResponse::SavedList(SavedListResponse {
            ssids: vec!["HomeNet".to_string(), "DeviceAP".to_string()],
        });
        let json = encode_response(&msg).unwrap();

        assert_eq!(json, r#"{"ssids":["HomeNet","DeviceAP"]}"#);
    }

    #[test]
    fn test_decode_connect() {
        let req = decode_connect_request(r#"{"ssid":"DeviceAP","password":""}"#).unwrap();

        assert_eq!(req.ssid, "DeviceAP");
        assert_eq!(req.password.as_deref(), Some(""));
    }

    #[test]
    fn test_decode_connect_saved() {
        let req = decode_connect_saved_request(r#"{"ssid":"HomeNet"}"#).unwrap();
        assert_eq!(req.ssid, "HomeNet");
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode_connect_request("  "),
            Err(CodecError::EmptyBody)
        ));
        assert!(matches!(
            decode_connect_request(r#"{"password":"x"}"#),
            Err(CodecError::SerdeError(_))
        ));
        assert!(matches!(
            decode_connect_request(r#"{"ssid":"a","strategy":"carrierPigeon"}"#),
            Err(CodecError::SerdeError(_))
        ));
        assert!(matches!(
            decode_connect_saved_request(""),
            Err(CodecError::EmptyBody)
        ));
    }
}
