//! Messenger command handlers: the JSON-RPC surface over [`ochra_messenger::engine::Engine`].
//!
//! Every handler here is a thin translation layer between JSON params and a
//! task submitted to the engine — no business logic lives in this module,
//! matching Section 2.1's crate layout ("daemon command handlers now submit
//! tasks to an `ochra-messenger::Engine` instead of containing business
//! logic inline").

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use ochra_messenger::fingerprint::Fingerprint;
use ochra_messenger::handlers::ProfileUpdate;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn fingerprint_param(params: &Value, key: &str) -> std::result::Result<Fingerprint, RpcError> {
    let raw = params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))?;
    Fingerprint::parse(raw).map_err(RpcError::messenger_error)
}

fn string_param<'a>(params: &'a Value, key: &str) -> std::result::Result<&'a str, RpcError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))
}

/// Submit a task and await its completion, flattening the queue-submission
/// error, the task's own `oneshot` channel, and its `Result<T>` outcome
/// into a single JSON-RPC response.
async fn await_task<T: Serialize>(
    submitted: ochra_messenger::Result<(u64, tokio::sync::oneshot::Receiver<ochra_messenger::Result<T>>)>,
) -> Result {
    let (_, rx) = submitted.map_err(RpcError::messenger_error)?;
    let outcome = rx
        .await
        .map_err(|_| RpcError::internal_error("messenger task dropped before completion"))?;
    let value = outcome.map_err(RpcError::messenger_error)?;
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&e.to_string()))
}

// ---------------------------------------------------------------------
// Identity lifecycle
// ---------------------------------------------------------------------

pub async fn create_identity(state: &Arc<DaemonState>, params: &Value) -> Result {
    let password = params.get("password").and_then(|v| v.as_str());
    let fp = state.messenger.create_identity(password).map_err(RpcError::messenger_error)?;
    Ok(serde_json::json!({"fingerprint": fp.to_hex()}))
}

pub async fn list_identities(state: &Arc<DaemonState>) -> Result {
    let identities = state.messenger.list_identities().await.map_err(RpcError::messenger_error)?;
    let hexes: Vec<String> = identities.iter().map(Fingerprint::to_hex).collect();
    Ok(serde_json::json!({"identities": hexes}))
}

pub async fn load_identity(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    let password = params.get("password").and_then(|v| v.as_str());
    state.messenger.load_identity(fp, password).await.map_err(RpcError::messenger_error)?;
    Ok(serde_json::json!({"loaded": true}))
}

pub async fn unload_identity(state: &Arc<DaemonState>) -> Result {
    state.messenger.unload_identity().await.map_err(RpcError::messenger_error)?;
    Ok(serde_json::json!({"unloaded": true}))
}

pub async fn delete_identity(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    state.messenger.delete_identity(fp).await.map_err(RpcError::messenger_error)?;
    Ok(serde_json::json!({"deleted": true}))
}

pub async fn change_password(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    let old = params.get("old_password").and_then(|v| v.as_str());
    let new = params.get("new_password").and_then(|v| v.as_str());
    state.messenger.change_password(fp, old, new).map_err(RpcError::messenger_error)?;
    Ok(serde_json::json!({"changed": true}))
}

// ---------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------

pub async fn get_contacts(state: &Arc<DaemonState>) -> Result {
    await_task(state.messenger.get_contacts().await).await
}

pub async fn add_contact(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    let notes = params.get("notes").and_then(|v| v.as_str()).map(str::to_string);
    await_task(state.messenger.add_contact(fp, notes).await).await
}

pub async fn remove_contact(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.remove_contact(fp).await).await
}

pub async fn block_user(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.block_user(fp).await).await
}

pub async fn unblock_user(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.unblock_user(fp).await).await
}

pub async fn get_blocked_users(state: &Arc<DaemonState>) -> Result {
    await_task(state.messenger.get_blocked_users().await).await
}

pub async fn send_contact_request(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    let message = params.get("message").and_then(|v| v.as_str()).map(str::to_string);
    await_task(state.messenger.send_contact_request(fp, message).await).await
}

pub async fn get_contact_requests(state: &Arc<DaemonState>) -> Result {
    await_task(state.messenger.get_contact_requests().await).await
}

pub async fn approve_contact_request(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.approve_contact_request(fp).await).await
}

pub async fn deny_contact_request(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.deny_contact_request(fp).await).await
}

// ---------------------------------------------------------------------
// Profile / name
// ---------------------------------------------------------------------

pub async fn get_display_name(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.get_display_name(fp).await).await
}

pub async fn get_avatar(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.get_avatar(fp).await).await
}

pub async fn lookup_name(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name = string_param(params, "name")?.to_string();
    await_task(state.messenger.lookup_name(name).await).await
}

pub async fn get_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.get_profile(fp).await).await
}

pub async fn lookup_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.lookup_profile(fp).await).await
}

pub async fn get_registered_name(state: &Arc<DaemonState>) -> Result {
    await_task(state.messenger.get_registered_name().await).await
}

pub async fn register_name(state: &Arc<DaemonState>, params: &Value) -> Result {
    let name = string_param(params, "name")?.to_string();
    await_task(state.messenger.register_name(name).await).await
}

pub async fn update_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let update = ProfileUpdate {
        display_name: params.get("display_name").and_then(|v| v.as_str()).map(str::to_string),
        bio: params.get("bio").and_then(|v| v.as_str()).map(str::to_string),
        avatar_b64: params.get("avatar_b64").and_then(|v| v.as_str()).map(str::to_string),
        wallets: None,
        socials: None,
    };
    await_task(state.messenger.update_profile(update).await).await
}

// ---------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------

pub async fn send_message(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    let text = string_param(params, "message")?;
    let slot_id = state
        .messenger
        .send_message(fp, text.as_bytes().to_vec())
        .await
        .map_err(RpcError::messenger_error)?;
    Ok(serde_json::json!({"queued": true, "slot_id": slot_id}))
}

pub async fn get_conversation(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.get_conversation(fp).await).await
}

pub async fn check_offline_messages(state: &Arc<DaemonState>, params: &Value) -> Result {
    let fp = fingerprint_param(params, "fingerprint")?;
    await_task(state.messenger.check_offline_messages(fp).await).await
}

pub async fn sync_contacts_to_dht(state: &Arc<DaemonState>) -> Result {
    await_task(state.messenger.sync_contacts_to_dht().await).await
}

pub async fn sync_contacts_from_dht(state: &Arc<DaemonState>) -> Result {
    await_task(state.messenger.sync_contacts_from_dht().await).await
}
