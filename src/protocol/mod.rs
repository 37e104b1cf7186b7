//! The line-oriented command protocol a driver uses to operate a render page.

pub mod dispatch;
pub mod message;
pub mod transport;

pub use dispatch::Dispatcher;
pub use message::{Ack, Command, Envelope};
pub use transport::{ServeStats, serve};
