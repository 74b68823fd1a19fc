//! 单条长连接的事件订阅
//!
//! 状态机：先发出 `ready`，之后循环从用户队列取事件。
//! - 非管理员连接遇到 `admin_only` 事件时直接丢弃并继续取下一条
//! - 有积压时逐条立即返回，不做节流
//! - 队列为空时等待 push 唤醒；距上次 keepalive 满一个间隔仍无事件则发出 `keepalive`
//!
//! 投递是尽力而为、至多一次：事件一旦被取出，连接随后断开就会丢失。

use std::sync::Arc;
use std::time::Duration;

use domain::{RealtimeEvent, UserId};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::event_queue::EventQueueService;

// 间隔过大导致 Instant 溢出时，退化为实际上不会到达的截止时间
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

pub struct EventSubscription {
    queues: Arc<EventQueueService>,
    wakeup: Arc<Notify>,
    user_id: UserId,
    is_admin: bool,
    keepalive_interval: Duration,
    last_keepalive: Instant,
    ready_sent: bool,
}

impl EventSubscription {
    pub fn new(
        queues: Arc<EventQueueService>,
        user_id: UserId,
        is_admin: bool,
        keepalive_interval: Duration,
    ) -> Self {
        let wakeup = queues.register(user_id);
        Self {
            queues,
            wakeup,
            user_id,
            is_admin,
            keepalive_interval,
            last_keepalive: Instant::now(),
            ready_sent: false,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// 取出下一条本连接可见的事件，丢弃无权查看的管理员事件
    fn take_visible(&self) -> Option<RealtimeEvent> {
        while let Some(event) = self.queues.pop(self.user_id) {
            if event.visible_to(self.is_admin) {
                return Some(event);
            }
            tracing::trace!(
                user_id = %self.user_id,
                kind = %event.kind,
                "丢弃非管理员连接上的管理员事件"
            );
        }
        None
    }

    /// 等待下一条要发给客户端的事件。该 future 可以在任意 await 点被安全丢弃。
    pub async fn next_event(&mut self) -> RealtimeEvent {
        if !self.ready_sent {
            self.ready_sent = true;
            self.last_keepalive = Instant::now();
            return RealtimeEvent::ready();
        }

        let wakeup = Arc::clone(&self.wakeup);
        loop {
            // 先登记等待再检查队列，避免漏掉两者之间的 push
            let notified = wakeup.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(event) = self.take_visible() {
                return event;
            }

            let deadline = self
                .last_keepalive
                .checked_add(self.keepalive_interval)
                .unwrap_or_else(|| Instant::now() + FAR_FUTURE);
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => {
                    self.last_keepalive = Instant::now();
                    return RealtimeEvent::keepalive();
                }
            }
        }
    }
}
