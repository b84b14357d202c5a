use std::{collections::HashMap, sync::LazyLock};

use bytes::Bytes;

use crate::{
    commands::{
        CommandError, del, echo, expire, get, incr, keys, lindex, llen, lpop, lrange,
        rpush_and_lpush, set, type_command, xadd, xrange, zadd, zrange, zrank, zrem,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

/// Handler for commands that only touch the keyspace. Runs with the store lock held.
pub type StoreHandler = fn(&mut KeyValueStore, Vec<Bytes>) -> Result<RespValue, CommandError>;

/// Handler for commands that need no shared state at all.
pub type StatelessHandler = fn(Vec<Bytes>) -> Result<RespValue, CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingCommand {
    Blpop,
    Brpop,
    Xread,
}

/// How the dispatcher routes a command.
#[derive(Debug, Clone, Copy)]
pub enum CommandKind {
    Stateless(StatelessHandler),
    Store(StoreHandler),
    Blocking(BlockingCommand),
    Ping,
    Quit,
    Multi,
    Exec,
    Discard,
    Subscribe,
    Unsubscribe,
    Publish,
    ConfigGet,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandFlags {
    /// Successful runs are published on the mutation feed.
    pub write: bool,
    /// Queuing the command inside MULTI aborts the transaction.
    pub no_multi: bool,
    pub allowed_while_subscribed: bool,
}

const READ: CommandFlags = CommandFlags {
    write: false,
    no_multi: false,
    allowed_while_subscribed: false,
};

const WRITE: CommandFlags = CommandFlags {
    write: true,
    ..READ
};

const SUBSCRIBED: CommandFlags = CommandFlags {
    allowed_while_subscribed: true,
    ..READ
};

const SUBSCRIBED_NO_MULTI: CommandFlags = CommandFlags {
    no_multi: true,
    allowed_while_subscribed: true,
    ..READ
};

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Redis convention, counting the command name: a positive arity is
    /// exact, a negative one is a minimum.
    pub arity: i32,
    /// Upper bound for commands with a minimum arity, counting the name.
    pub max_arity: Option<usize>,
    pub kind: CommandKind,
    pub flags: CommandFlags,
}

impl CommandSpec {
    const fn new(name: &'static str, arity: i32, kind: CommandKind, flags: CommandFlags) -> Self {
        Self {
            name,
            arity,
            max_arity: None,
            kind,
            flags,
        }
    }

    const fn at_most(self, max_arity: usize) -> Self {
        Self {
            max_arity: Some(max_arity),
            ..self
        }
    }

    pub fn accepts_arity(&self, argument_count: usize) -> bool {
        let within_maximum = self.max_arity.is_none_or(|max_arity| argument_count <= max_arity);
        let argument_count = argument_count as i64;
        let arity = self.arity as i64;

        if arity >= 0 {
            argument_count == arity
        } else {
            argument_count >= -arity && within_maximum
        }
    }
}

static COMMAND_TABLE: LazyLock<HashMap<&'static str, CommandSpec>> = LazyLock::new(|| {
    use CommandKind::*;

    [
        CommandSpec::new("PING", -1, Ping, SUBSCRIBED).at_most(2),
        CommandSpec::new("ECHO", 2, Stateless(echo::echo), READ),
        CommandSpec::new("QUIT", -1, Quit, SUBSCRIBED).at_most(1),
        CommandSpec::new("DEL", -2, Store(del::del), WRITE),
        CommandSpec::new("EXISTS", -2, Store(del::exists), READ),
        CommandSpec::new("TYPE", 2, Store(type_command::type_command), READ),
        CommandSpec::new("KEYS", 2, Store(keys::keys), READ),
        CommandSpec::new("DBSIZE", 1, Store(keys::dbsize), READ),
        CommandSpec::new("EXPIRE", 3, Store(expire::expire), WRITE),
        CommandSpec::new("PEXPIRE", 3, Store(expire::pexpire), WRITE),
        CommandSpec::new("TTL", 2, Store(expire::ttl), READ),
        CommandSpec::new("PTTL", 2, Store(expire::pttl), READ),
        CommandSpec::new("PERSIST", 2, Store(expire::persist), WRITE),
        CommandSpec::new("GET", 2, Store(get::get), READ),
        CommandSpec::new("SET", -3, Store(set::set), WRITE).at_most(6),
        CommandSpec::new("INCR", 2, Store(incr::incr), WRITE),
        CommandSpec::new("INCRBY", 3, Store(incr::incrby), WRITE),
        CommandSpec::new("LPUSH", -3, Store(rpush_and_lpush::lpush), WRITE),
        CommandSpec::new("RPUSH", -3, Store(rpush_and_lpush::rpush), WRITE),
        CommandSpec::new("LPOP", -2, Store(lpop::lpop), WRITE).at_most(3),
        CommandSpec::new("RPOP", -2, Store(lpop::rpop), WRITE).at_most(3),
        CommandSpec::new("LRANGE", 4, Store(lrange::lrange), READ),
        CommandSpec::new("LLEN", 2, Store(llen::llen), READ),
        CommandSpec::new("LINDEX", 3, Store(lindex::lindex), READ),
        CommandSpec::new("BLPOP", -3, Blocking(BlockingCommand::Blpop), READ),
        CommandSpec::new("BRPOP", -3, Blocking(BlockingCommand::Brpop), READ),
        CommandSpec::new("XADD", -5, Store(xadd::xadd), WRITE),
        CommandSpec::new("XRANGE", -4, Store(xrange::xrange), READ).at_most(6),
        CommandSpec::new("XLEN", 2, Store(xrange::xlen), READ),
        CommandSpec::new("XREAD", -4, Blocking(BlockingCommand::Xread), READ),
        CommandSpec::new("ZADD", -4, Store(zadd::zadd), WRITE),
        CommandSpec::new("ZRANK", 3, Store(zrank::zrank), READ),
        CommandSpec::new("ZRANGE", -4, Store(zrange::zrange), READ).at_most(5),
        CommandSpec::new("ZRANGEBYSCORE", -4, Store(zrange::zrangebyscore), READ).at_most(5),
        CommandSpec::new("ZSCORE", 3, Store(zrank::zscore), READ),
        CommandSpec::new("ZREM", -3, Store(zrem::zrem), WRITE),
        CommandSpec::new("ZCARD", 2, Store(zrank::zcard), READ),
        CommandSpec::new("MULTI", 1, Multi, READ),
        CommandSpec::new("EXEC", 1, Exec, READ),
        CommandSpec::new("DISCARD", 1, Discard, READ),
        CommandSpec::new("SUBSCRIBE", -2, Subscribe, SUBSCRIBED_NO_MULTI),
        CommandSpec::new("UNSUBSCRIBE", -1, Unsubscribe, SUBSCRIBED_NO_MULTI),
        CommandSpec::new("PUBLISH", 3, Publish, READ),
        CommandSpec::new("CONFIG", -3, ConfigGet, READ),
    ]
    .into_iter()
    .map(|spec| (spec.name, spec))
    .collect()
});

/// Looks up an upper-cased command name.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_TABLE.get(name)
}
