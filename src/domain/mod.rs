//! 领域层
//!
//! 用户、入站事件与补全请求/回复

pub mod message;
pub mod user;

pub use message::*;
pub use user::*;
