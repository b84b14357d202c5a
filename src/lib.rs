//! A Redis-compatible in-memory server.
//!
//! Clients speak RESP2 over TCP. The keyspace holds strings, lists, streams
//! and sorted sets with optional expiry, and the server supports:
//!
//! - Key operations (DEL, EXISTS, TYPE, KEYS, EXPIRE, TTL, PERSIST, DBSIZE)
//! - String operations (GET, SET, INCR, INCRBY)
//! - List operations (LPUSH, RPUSH, LPOP, RPOP, LRANGE, LLEN, LINDEX)
//! - Stream operations (XADD, XRANGE, XLEN, XREAD)
//! - Sorted set operations (ZADD, ZRANK, ZRANGE, ZRANGEBYSCORE, ZSCORE, ZREM, ZCARD)
//! - Blocking reads (BLPOP, BRPOP, XREAD BLOCK)
//! - Transactions (MULTI, EXEC, DISCARD)
//! - Publish/subscribe (SUBSCRIBE, UNSUBSCRIBE, PUBLISH)
//!
//! Every connection runs on its own Tokio task; the keyspace and the
//! pub/sub hub are shared behind async mutexes.

pub mod blocking;
pub mod commands;
pub mod connection;
pub mod input;
pub mod key_value_store;
pub mod pubsub;
pub mod resp;
pub mod server;
pub mod state;
pub mod transaction;
