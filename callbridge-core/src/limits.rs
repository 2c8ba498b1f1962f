use crate::error::RpcError;

/// Upper bound on a serialized argument or result blob. One process-wide
/// constant shared by the sender-side and receiver-side checks, so an
/// unbounded result cannot sneak past a legitimately small request.
pub const MAX_RPC_MESSAGE_SIZE: usize = 1 << 20;

/// Fails with `MessageTooLarge` unless `len` is strictly below the limit.
///
/// `label` names the blob being checked ("request" or "response") so the
/// client-visible message says which direction blew the budget.
pub fn ensure_within_limit(label: &str, len: usize) -> Result<(), RpcError> {
    if len < MAX_RPC_MESSAGE_SIZE {
        Ok(())
    } else {
        Err(RpcError::message_too_large(format!(
            "serialized RPC {} is too large: {} bytes (limit {})",
            label, len, MAX_RPC_MESSAGE_SIZE
        )))
    }
}
