use crate::commands::{CommandError, CommandHandler};

/// Per-connection MULTI/EXEC state.
#[derive(Debug, Default, PartialEq)]
pub enum TransactionState {
    #[default]
    Inactive,
    Queueing {
        queue: Vec<CommandHandler>,
        /// Set when a command was rejected while queueing; EXEC then aborts.
        tainted: bool,
    },
}

impl TransactionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_queueing(&self) -> bool {
        matches!(self, Self::Queueing { .. })
    }

    /// MULTI. A nested MULTI is an error but leaves the open transaction intact.
    pub fn begin(&mut self) -> Result<(), CommandError> {
        if self.is_queueing() {
            return Err(CommandError::NestedMulti);
        }

        *self = Self::Queueing {
            queue: Vec::new(),
            tainted: false,
        };

        Ok(())
    }

    pub fn enqueue(&mut self, command: CommandHandler) {
        if let Self::Queueing { queue, .. } = self {
            queue.push(command);
        }
    }

    pub fn taint(&mut self) {
        if let Self::Queueing { tainted, .. } = self {
            *tainted = true;
        }
    }

    /// DISCARD. Returns how many commands were dropped.
    pub fn discard(&mut self) -> Result<usize, CommandError> {
        match std::mem::take(self) {
            Self::Inactive => Err(CommandError::DiscardWithoutMulti),
            Self::Queueing { queue, .. } => Ok(queue.len()),
        }
    }

    /// EXEC. Hands back the queued commands and resets to inactive, also when
    /// the transaction was tainted.
    pub fn commit(&mut self) -> Result<Vec<CommandHandler>, CommandError> {
        match std::mem::take(self) {
            Self::Inactive => Err(CommandError::ExecWithoutMulti),
            Self::Queueing { tainted: true, .. } => Err(CommandError::ExecAborted),
            Self::Queueing { queue, .. } => Ok(queue),
        }
    }
}
