//! 领域实体定义
//!
//! 包含系统的核心实体：用户、私信、通知、举报、登录记录与会话。

pub mod login_event;
pub mod message;
pub mod notification;
pub mod report;
pub mod session;
pub mod user;

// 重新导出核心实体
pub use login_event::{ClientInfo, LoginEvent};
pub use message::DirectMessage;
pub use notification::{notification_kinds, NewNotification, Notification};
pub use report::{Report, ReportStatus};
pub use session::{Session, SessionToken};
pub use user::{User, UserPublic};
