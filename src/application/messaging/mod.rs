//! Message handling - Event-driven message processing

pub mod linked_cache;
pub mod listener;
pub mod parser;
pub mod waiter;

pub use linked_cache::LinkedCache;
pub use listener::Listener;
pub use parser::MessageParser;
pub use waiter::EventWaiter;
