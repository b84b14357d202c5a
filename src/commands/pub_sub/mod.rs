mod publish;
mod subscribe;

pub use publish::publish;
pub use subscribe::{subscribe, unsubscribe};
