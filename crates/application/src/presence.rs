//! 页面级在线状态追踪器
//!
//! 纯内存、进程级的状态，重启即丢失；一把互斥锁保护整张表。
//! 每次页面切换才会调用一次，粗粒度锁的竞争可以接受。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use domain::{Presence, UserId};

#[derive(Debug, Default)]
pub struct PresenceTracker {
    entries: Mutex<HashMap<UserId, Presence>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<UserId, Presence>> {
        // 持锁期间不会 panic，中毒后的数据仍然一致
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 无条件覆盖用户当前所在页面，不校验 `page`
    pub fn set_presence(
        &self,
        user_id: UserId,
        page: impl Into<String>,
        active_contact_id: Option<UserId>,
    ) {
        let presence = Presence::new(page, active_contact_id);
        tracing::debug!(user_id = %user_id, page = %presence.page, "更新页面在线状态");
        self.entries().insert(user_id, presence);
    }

    /// 删除记录；不存在时什么也不做
    pub fn clear_presence(&self, user_id: UserId) {
        if self.entries().remove(&user_id).is_some() {
            tracing::debug!(user_id = %user_id, "清除页面在线状态");
        }
    }

    /// 未知用户返回默认值（`page` 为空）
    pub fn get_presence(&self, user_id: UserId) -> Presence {
        self.entries().get(&user_id).cloned().unwrap_or_default()
    }

    pub fn is_on_messages_page(&self, user_id: UserId) -> bool {
        self.get_presence(user_id).is_messages_page()
    }

    pub fn tracked_users(&self) -> usize {
        self.entries().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn unknown_user_gets_default_presence() {
        let tracker = PresenceTracker::new();
        let presence = tracker.get_presence(UserId::generate());
        assert_eq!(presence, Presence::default());
        assert_eq!(presence.page, "");
    }

    #[test]
    fn set_presence_overwrites_previous_entry() {
        let tracker = PresenceTracker::new();
        let user = UserId::generate();
        let contact = UserId::generate();

        tracker.set_presence(user, "messages", Some(contact));
        assert!(tracker.is_on_messages_page(user));
        assert_eq!(tracker.get_presence(user).active_contact_id, Some(contact));

        tracker.set_presence(user, "profile", None);
        assert!(!tracker.is_on_messages_page(user));
        assert_eq!(tracker.get_presence(user).active_contact_id, None);
        assert_eq!(tracker.tracked_users(), 1);
    }

    #[test]
    fn messages_page_check_ignores_case() {
        let tracker = PresenceTracker::new();
        let user = UserId::generate();
        tracker.set_presence(user, "MeSsAgEs", None);
        assert!(tracker.is_on_messages_page(user));
    }

    #[test]
    fn clear_presence_is_idempotent() {
        let tracker = PresenceTracker::new();
        let user = UserId::generate();

        tracker.clear_presence(user);
        tracker.set_presence(user, "messages", None);
        tracker.clear_presence(user);
        tracker.clear_presence(user);

        assert!(!tracker.is_on_messages_page(user));
        assert_eq!(tracker.tracked_users(), 0);
    }

    #[test]
    fn concurrent_updates_keep_one_entry_per_user() {
        let tracker = Arc::new(PresenceTracker::new());
        let users: Vec<UserId> = (0..8).map(|_| UserId::generate()).collect();

        let handles: Vec<_> = users
            .iter()
            .copied()
            .map(|user| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let page = if i % 2 == 0 { "feed" } else { "messages" };
                        tracker.set_presence(user, page, None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.tracked_users(), users.len());
        // 最后一次写入是 i = 99
        assert!(users.iter().all(|user| tracker.is_on_messages_page(*user)));
    }
}
