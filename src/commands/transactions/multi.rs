use crate::{commands::CommandError, resp::RespValue, transaction::TransactionState};

/// Handles MULTI: starts queueing commands for this connection.
pub fn multi(transaction: &mut TransactionState) -> Result<RespValue, CommandError> {
    transaction.begin()?;

    Ok(RespValue::ok())
}
