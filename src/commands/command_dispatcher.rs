use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    blocking::{ClientId, ListSide},
    commands::{
        CommandError, CommandHandler, CommandResult,
        blpop::blocking_pop,
        command_table::{BlockingCommand, CommandKind},
        config_get::config_get,
        ping::ping,
        pub_sub::{publish, subscribe, unsubscribe},
        transactions::{discard, multi, run_transaction_commands},
        xread::xread,
    },
    resp::RespValue,
    state::ServerContext,
    transaction::TransactionState,
};

/// The per-connection dispatcher responsible for routing Redis commands.
///
/// It owns the connection's transaction state and subscription count, and
/// decides for every request whether it is rejected, queued or executed.
/// Pub/sub messages for this connection are pushed to `outbound`, the same
/// channel the connection writes its replies from.
pub struct CommandDispatcher {
    client_id: ClientId,
    context: ServerContext,
    outbound: mpsc::Sender<RespValue>,
    transaction: TransactionState,
    subscriptions: usize,
}

impl CommandDispatcher {
    pub fn new(client_id: ClientId, context: ServerContext, outbound: mpsc::Sender<RespValue>) -> Self {
        Self {
            client_id,
            context,
            outbound,
            transaction: TransactionState::new(),
            subscriptions: 0,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscriptions > 0
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_queueing()
    }

    /// Dispatches one decoded request and produces what must be written back.
    ///
    /// Errors never escape: they become RESP error replies and the
    /// connection stays open.
    ///
    /// # Flow
    ///
    /// 1. The request is resolved against the command table. Unknown
    ///    commands and arity violations fail here and taint an open
    ///    transaction.
    /// 2. A subscribed connection only accepts SUBSCRIBE, UNSUBSCRIBE, PING
    ///    and QUIT.
    /// 3. Inside MULTI every command except MULTI, EXEC and DISCARD is
    ///    queued and answered with `QUEUED`; commands that cannot run in a
    ///    transaction taint it instead.
    /// 4. Everything else is executed right away.
    pub async fn dispatch(&mut self, input: RespValue) -> CommandResult {
        match self.try_dispatch(input).await {
            Ok(result) => result,
            Err(error) => {
                debug!(client_id = self.client_id, %error, "command failed");
                CommandResult::Response(error.as_resp())
            }
        }
    }

    async fn try_dispatch(&mut self, input: RespValue) -> Result<CommandResult, CommandError> {
        let command = CommandHandler::new(input).inspect_err(|_| self.transaction.taint())?;

        debug!(
            client_id = self.client_id,
            command = %command.name,
            arguments = command.arguments.len(),
            "command received"
        );

        if self.is_subscribed() && !command.spec.flags.allowed_while_subscribed {
            return Err(CommandError::NotAllowedWhileSubscribed(
                command.name.to_lowercase(),
            ));
        }

        let controls_transaction = matches!(
            command.spec.kind,
            CommandKind::Multi | CommandKind::Exec | CommandKind::Discard
        );

        if self.transaction.is_queueing() && !controls_transaction {
            if command.spec.flags.no_multi {
                self.transaction.taint();
                return Err(CommandError::NotAllowedInTransaction(command.name));
            }

            self.transaction.enqueue(command);
            return Ok(CommandResult::Response(RespValue::SimpleString(
                "QUEUED".to_string(),
            )));
        }

        self.execute(command).await
    }

    async fn execute(&mut self, command: CommandHandler) -> Result<CommandResult, CommandError> {
        let kind = command.spec.kind;

        let response = match kind {
            CommandKind::Stateless(handler) => handler(command.arguments)?,
            CommandKind::Store(_) => {
                let mut store_guard = self.context.store.lock().await;
                let response = command.execute_on_store(&mut store_guard);
                store_guard.serve_blocked_clients();
                response?
            }
            CommandKind::Blocking(blocking_command) => {
                let store = &self.context.store;
                match blocking_command {
                    BlockingCommand::Blpop => {
                        blocking_pop(self.client_id, store, command.arguments, ListSide::Left).await?
                    }
                    BlockingCommand::Brpop => {
                        blocking_pop(self.client_id, store, command.arguments, ListSide::Right)
                            .await?
                    }
                    BlockingCommand::Xread => xread(self.client_id, store, command.arguments).await?,
                }
            }
            CommandKind::Ping => ping(command.arguments, self.is_subscribed())?,
            CommandKind::Quit => return Ok(CommandResult::Quit(RespValue::ok())),
            CommandKind::Multi => multi(&mut self.transaction)?,
            CommandKind::Exec => {
                let commands = self.transaction.commit()?;
                run_transaction_commands(self.client_id, &self.context, commands).await
            }
            CommandKind::Discard => discard(&mut self.transaction)?,
            CommandKind::Subscribe => {
                let mut hub = self.context.pub_sub.lock().await;
                let replies = subscribe(self.client_id, &mut hub, &self.outbound, command.arguments);
                self.subscriptions = hub.subscription_count(self.client_id);
                return Ok(CommandResult::Responses(replies));
            }
            CommandKind::Unsubscribe => {
                let mut hub = self.context.pub_sub.lock().await;
                let replies = unsubscribe(self.client_id, &mut hub, command.arguments);
                self.subscriptions = hub.subscription_count(self.client_id);
                return Ok(CommandResult::Responses(replies));
            }
            CommandKind::Publish => {
                let hub = self.context.pub_sub.lock().await;
                publish(&hub, command.arguments)
            }
            CommandKind::ConfigGet => config_get(&self.context.config, command.arguments)?,
        };

        Ok(CommandResult::Response(response))
    }

    /// Connection teardown: drops blocked registrations, subscriptions and
    /// any open transaction.
    pub async fn close(&mut self) {
        let cancelled = self
            .context
            .store
            .lock()
            .await
            .blocking_mut()
            .cancel_client(self.client_id);

        let channels = self
            .context
            .pub_sub
            .lock()
            .await
            .unsubscribe_all(self.client_id);

        self.subscriptions = 0;
        self.transaction = TransactionState::Inactive;

        debug!(
            client_id = self.client_id,
            cancelled_waiters = cancelled,
            channels = channels.len(),
            "client state released"
        );
    }
}
