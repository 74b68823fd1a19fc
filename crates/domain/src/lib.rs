//! 社交平台核心领域模型
//!
//! 包含用户、私信、通知、举报等核心实体，以及页面在线状态和实时事件。

pub mod entities;
pub mod errors;
pub mod events;
pub mod presence;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use presence::{Presence, MESSAGES_PAGE};
pub use value_objects::*;
