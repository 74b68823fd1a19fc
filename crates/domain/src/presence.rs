//! 页面级在线状态
//!
//! 记录用户当前正在浏览的逻辑页面，用于判断新消息是否需要生成通知。

use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// 私信页面的保留标识
pub const MESSAGES_PAGE: &str = "messages";

/// 客户端最近一次上报的页面
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// 小写的自由格式页面标签，未知时为空串
    pub page: String,
    /// 私信页面中正在查看的联系人
    pub active_contact_id: Option<UserId>,
}

impl Presence {
    pub fn new(page: impl Into<String>, active_contact_id: Option<UserId>) -> Self {
        Self {
            page: page.into(),
            active_contact_id,
        }
    }

    /// 与 [`MESSAGES_PAGE`] 做大小写不敏感的精确比较
    pub fn is_messages_page(&self) -> bool {
        self.page.eq_ignore_ascii_case(MESSAGES_PAGE)
    }

    /// 是否上报过任意页面
    pub fn is_online(&self) -> bool {
        !self.page.is_empty()
    }
}
