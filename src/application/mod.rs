//! 应用层：事件编排

pub mod relay;

pub use relay::{RelayHandler, RelaySettings};
