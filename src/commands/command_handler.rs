use bytes::Bytes;

use crate::{
    commands::{
        CommandError,
        command_table::{CommandKind, CommandSpec, lookup},
        command_utils::uppercase,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// What a dispatched command asks the connection to write back.
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Response(RespValue),
    /// Several replies for one request, e.g. SUBSCRIBE with many channels.
    Responses(Vec<RespValue>),
    /// Write the reply, then close the connection.
    Quit(RespValue),
}

/// A request resolved against the command table, with its arity checked.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// Upper-cased command name.
    pub name: String,
    /// Arguments after the command name.
    pub arguments: Vec<Bytes>,
    pub spec: &'static CommandSpec,
}

impl PartialEq for CommandHandler {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arguments == other.arguments
    }
}

impl CommandHandler {
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let mut elements = input.into_arguments()?;
        let argument_count = elements.len();
        let raw_name = elements.remove(0);
        let name = uppercase(&raw_name);

        let Some(spec) = lookup(&name) else {
            return Err(CommandError::UnknownCommand(
                String::from_utf8_lossy(&raw_name).to_string(),
            ));
        };

        if !spec.accepts_arity(argument_count) {
            return Err(CommandError::WrongNumberOfArguments(name.to_lowercase()));
        }

        Ok(Self {
            name,
            arguments: elements,
            spec,
        })
    }

    /// The command as sent, name first.
    pub fn to_parts(&self) -> Vec<Bytes> {
        let mut parts = Vec::with_capacity(self.arguments.len() + 1);
        parts.push(Bytes::copy_from_slice(self.name.as_bytes()));
        parts.extend(self.arguments.iter().cloned());
        parts
    }

    /// Runs a keyspace command against an already locked store. Writes that
    /// changed the keyspace are published on the mutation feed.
    ///
    /// Only valid for [`CommandKind::Store`] commands.
    pub fn execute_on_store(&self, store: &mut KeyValueStore) -> Result<RespValue, CommandError> {
        let CommandKind::Store(handler) = self.spec.kind else {
            return Err(CommandError::UnknownCommand(self.name.clone()));
        };

        let changes_before = store.changes();
        let response = handler(store, self.arguments.clone())?;

        if self.spec.flags.write && store.changes() != changes_before {
            store.record_mutation(self.to_parts());
        }

        Ok(response)
    }
}
