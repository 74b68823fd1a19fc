//! 领域事件定义
//!
//! 包含推送到实时通道的事件类型

pub mod realtime_event;

// 重新导出事件类型
pub use realtime_event::*;
