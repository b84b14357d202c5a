mod blpop;
mod command_dispatcher;
mod command_error;
mod command_handler;
mod command_table;
mod command_utils;
mod config_get;
mod del;
mod echo;
mod expire;
mod get;
mod incr;
mod keys;
mod lindex;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod pub_sub;
mod rpush_and_lpush;
mod set;
mod stream_utils;
mod transactions;
mod type_command;
mod xadd;
mod xrange;
mod xread;
mod zadd;
mod zrange;
mod zrank;
mod zrem;

pub use command_dispatcher::CommandDispatcher;
pub use command_error::CommandError;
pub use command_handler::{CommandHandler, CommandResult};
pub use command_table::{
    BlockingCommand, CommandFlags, CommandKind, CommandSpec, StatelessHandler, StoreHandler, lookup,
};
