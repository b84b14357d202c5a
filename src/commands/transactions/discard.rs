use crate::{commands::CommandError, resp::RespValue, transaction::TransactionState};

/// Handles DISCARD: drops the queued commands and leaves the transaction.
pub fn discard(transaction: &mut TransactionState) -> Result<RespValue, CommandError> {
    transaction.discard()?;

    Ok(RespValue::ok())
}
