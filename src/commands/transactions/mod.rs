mod discard;
mod exec;
mod multi;

pub use discard::discard;
pub use exec::run_transaction_commands;
pub use multi::multi;
