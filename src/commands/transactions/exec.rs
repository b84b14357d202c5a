use tracing::debug;

use crate::{
    blocking::{ClientId, ListSide},
    commands::{
        CommandError, CommandHandler, blpop::pop_immediately, command_table::BlockingCommand,
        command_table::CommandKind, config_get::config_get, ping::ping, pub_sub::publish,
        xread::read_immediately,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::ServerContext,
};

async fn run_queued_command(
    context: &ServerContext,
    store: &mut KeyValueStore,
    command: CommandHandler,
) -> Result<RespValue, CommandError> {
    let kind = command.spec.kind;

    match kind {
        CommandKind::Store(_) => command.execute_on_store(store),
        CommandKind::Stateless(handler) => handler(command.arguments),
        CommandKind::Blocking(BlockingCommand::Blpop) => {
            pop_immediately(store, command.arguments, ListSide::Left)
        }
        CommandKind::Blocking(BlockingCommand::Brpop) => {
            pop_immediately(store, command.arguments, ListSide::Right)
        }
        CommandKind::Blocking(BlockingCommand::Xread) => read_immediately(store, command.arguments),
        CommandKind::Ping => ping(command.arguments, false),
        CommandKind::ConfigGet => config_get(&context.config, command.arguments),
        CommandKind::Publish => {
            let hub = context.pub_sub.lock().await;
            Ok(publish(&hub, command.arguments))
        }
        CommandKind::Quit => Ok(RespValue::ok()),
        CommandKind::Multi
        | CommandKind::Exec
        | CommandKind::Discard
        | CommandKind::Subscribe
        | CommandKind::Unsubscribe => Err(CommandError::NotAllowedInTransaction(command.name)),
    }
}

/// Runs the queued commands of a transaction in order, holding the store lock
/// for the whole batch so no other client observes a partial transaction.
///
/// A failing command puts its error in the reply array and execution carries
/// on with the next one; nothing is rolled back. Clients blocked on keys the
/// transaction made ready are served once, after the last command.
pub async fn run_transaction_commands(
    client_id: ClientId,
    context: &ServerContext,
    commands: Vec<CommandHandler>,
) -> RespValue {
    let mut store_guard = context.store.lock().await;
    let mut responses = Vec::with_capacity(commands.len());

    for command in commands {
        let response = run_queued_command(context, &mut store_guard, command)
            .await
            .unwrap_or_else(|error| error.as_resp());
        responses.push(response);
    }

    store_guard.serve_blocked_clients();
    drop(store_guard);

    debug!(client_id, replies = responses.len(), "transaction executed");

    RespValue::Array(responses)
}
