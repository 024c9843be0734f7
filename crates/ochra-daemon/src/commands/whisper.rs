//! Whisper & Handle Management command handlers (Section 21.5).

use std::sync::Arc;

use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Register a handle (@username).
pub async fn register_handle(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let handle = params
        .get("handle")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("handle required"))?;

    // Validate handle format
    if handle.len() < 3 || handle.len() > 32 {
        return Err(RpcError {
            code: -32081,
            message: "HANDLE_INVALID".to_string(),
            data: Some(serde_json::json!({"detail": "handle must be 3-32 characters"})),
        });
    }

    // Would: check availability via DHT, register, publish descriptor
    Ok(serde_json::json!({
        "handle": handle,
        "registered_at": 0,
    }))
}

/// Deprecate current handle with optional successor.
pub async fn deprecate_handle(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _successor = params.get("successor_handle").and_then(|v| v.as_str());
    Ok(serde_json::json!({"deprecated": true}))
}

/// Get own handle info.
pub async fn get_my_handle(_state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!(null))
}

/// Resolve a handle to a descriptor.
pub async fn resolve_handle(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _handle = params
        .get("handle")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("handle required"))?;

    // Would: query DHT for handle descriptor
    Ok(serde_json::json!({
        "status": "not_found",
    }))
}

/// Check handle availability.
pub async fn check_handle_availability(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _handle = params
        .get("handle")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("handle required"))?;

    Ok(serde_json::json!(true))
}

/// Change handle.
pub async fn change_handle(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let new_handle = params
        .get("new_handle")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("new_handle required"))?;

    Ok(serde_json::json!({
        "handle": new_handle,
        "registered_at": 0,
    }))
}

/// Start a Whisper session.
pub async fn start_whisper(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _target = params
        .get("target")
        .ok_or_else(|| RpcError::invalid_params("target required"))?;

    // Would: establish Sphinx circuit, perform rendezvous, create session
    let mut session_id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut session_id);

    Ok(serde_json::json!({
        "session_id": hex::encode(session_id),
    }))
}

/// Send a Whisper message.
pub async fn send_whisper(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;
    let body = params
        .get("body")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("body required"))?;

    // Check message length (max 500 Unicode scalar values)
    if body.chars().count() > 500 {
        return Err(RpcError {
            code: -32087,
            message: "MESSAGE_TOO_LONG".to_string(),
            data: None,
        });
    }

    // Would: encrypt with Double Ratchet, wrap in Sphinx packet, send
    Ok(serde_json::json!({"sent": true}))
}

/// Send Seeds via Whisper session.
pub async fn send_whisper_seeds(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;
    let _amount = params
        .get("amount_seeds")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params("amount_seeds required"))?;

    let tx_hash = [0u8; 32]; // Placeholder
    Ok(serde_json::json!({
        "tx_hash": hex::encode(tx_hash),
    }))
}

/// Reveal identity in a Whisper session.
pub async fn reveal_identity(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;
    Ok(serde_json::json!({"revealed": true}))
}

/// Close a Whisper session.
pub async fn close_whisper(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;

    // Would: zeroize all session keys and message state
    Ok(serde_json::json!({"closed": true}))
}

/// Block a Whisper counterparty.
pub async fn block_whisper(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;
    Ok(serde_json::json!({"blocked": true}))
}

/// Get active Whisper sessions.
pub async fn get_active_whispers(_state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!([]))
}

/// Get throttle status for a Whisper session.
pub async fn get_whisper_throttle_status(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;

    Ok(serde_json::json!({
        "current_tier": "free",
        "messages_remaining": 10,
        "relay_cost": 0,
    }))
}

/// Send typing indicator.
pub async fn send_typing_indicator(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;
    Ok(serde_json::json!({"sent": true}))
}

/// Send read acknowledgment.
pub async fn send_read_ack(_state: &Arc<DaemonState>, params: &Value) -> Result {
    let _session_id = params
        .get("session_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("session_id required"))?;
    let _up_to_sequence = params
        .get("up_to_sequence")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params("up_to_sequence required"))?;
    Ok(serde_json::json!({"sent": true}))
}
