//! 按用户划分的内存事件队列
//!
//! 每个用户一条 FIFO 队列，首次 push / pop / register 时惰性创建，之后不会删除。
//! 每条队列附带一个 [`Notify`]，push 之后立即唤醒正在等待该用户事件的连接。

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use domain::{EventKind, RealtimeEvent, UserId};
use serde_json::Value as JsonValue;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct UserQueue {
    events: VecDeque<RealtimeEvent>,
    wakeup: Arc<Notify>,
}

#[derive(Debug, Default)]
pub struct EventQueueService {
    queues: Mutex<HashMap<UserId, UserQueue>>,
    /// 单用户积压上限，`None` 表示不限
    max_pending: Option<usize>,
}

impl EventQueueService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 超过上限时丢弃最旧的事件
    pub fn with_max_pending(max_pending: Option<usize>) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            max_pending,
        }
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<UserId, UserQueue>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enqueue(&self, queue: &mut UserQueue, user_id: UserId, event: RealtimeEvent) {
        if let Some(limit) = self.max_pending {
            while queue.events.len() >= limit.max(1) {
                if let Some(dropped) = queue.events.pop_front() {
                    tracing::warn!(
                        user_id = %user_id,
                        kind = %dropped.kind,
                        limit,
                        "事件队列已满，丢弃最旧的事件"
                    );
                }
            }
        }
        queue.events.push_back(event);
    }

    /// 追加到用户队列尾部，从不阻塞
    pub fn push(&self, user_id: UserId, kind: EventKind, payload: JsonValue) {
        self.push_event(user_id, RealtimeEvent::new(kind, payload));
    }

    pub fn push_event(&self, user_id: UserId, event: RealtimeEvent) {
        let wakeup = {
            let mut queues = self.queues();
            let queue = queues.entry(user_id).or_default();
            self.enqueue(queue, user_id, event);
            Arc::clone(&queue.wakeup)
        };
        wakeup.notify_waiters();
    }

    /// 带 `admin_only` 标记追加到当前存在的每一条队列，返回送达的队列数。
    /// 这是广播而不是定向发送，权限过滤由消费端负责。
    pub fn push_admin(&self, kind: EventKind, payload: JsonValue) -> usize {
        let wakeups: Vec<Arc<Notify>> = {
            let mut queues = self.queues();
            let user_ids: Vec<UserId> = queues.keys().copied().collect();
            user_ids
                .into_iter()
                .filter_map(|user_id| {
                    let queue = queues.get_mut(&user_id)?;
                    self.enqueue(queue, user_id, RealtimeEvent::admin(kind, payload.clone()));
                    Some(Arc::clone(&queue.wakeup))
                })
                .collect()
        };
        for wakeup in &wakeups {
            wakeup.notify_waiters();
        }
        wakeups.len()
    }

    /// 取出最旧的事件，没有时立即返回 `None`
    pub fn pop(&self, user_id: UserId) -> Option<RealtimeEvent> {
        self.queues().entry(user_id).or_default().events.pop_front()
    }

    /// 确保用户队列存在并返回其唤醒句柄
    pub fn register(&self, user_id: UserId) -> Arc<Notify> {
        Arc::clone(&self.queues().entry(user_id).or_default().wakeup)
    }

    pub fn pending(&self, user_id: UserId) -> usize {
        self.queues()
            .get(&user_id)
            .map(|queue| queue.events.len())
            .unwrap_or(0)
    }

    pub fn queue_count(&self) -> usize {
        self.queues().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn pop_on_empty_queue_returns_none_and_creates_queue() {
        let service = EventQueueService::new();
        let user = UserId::generate();
        assert!(service.pop(user).is_none());
        assert_eq!(service.queue_count(), 1);
    }

    #[test]
    fn events_are_popped_in_push_order() {
        let service = EventQueueService::new();
        let user = UserId::generate();
        for i in 0..5 {
            service.push(user, EventKind::MessageNew, json!({ "seq": i }));
        }

        let seqs: Vec<i64> = std::iter::from_fn(|| service.pop(user))
            .map(|event| event.payload["seq"].as_i64().unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn queues_are_isolated_per_user() {
        let service = EventQueueService::new();
        let alice = UserId::generate();
        let bob = UserId::generate();

        service.push(alice, EventKind::MessageNew, json!({ "to": "alice" }));
        assert!(service.pop(bob).is_none());
        assert_eq!(service.pop(alice).unwrap().payload["to"], "alice");
    }

    #[test]
    fn push_admin_reaches_every_existing_queue_only() {
        let service = EventQueueService::new();
        let known: Vec<UserId> = (0..3).map(|_| UserId::generate()).collect();
        for user in &known {
            service.register(*user);
        }

        let reached = service.push_admin(EventKind::ReportNew, json!({ "id": 1 }));
        assert_eq!(reached, 3);

        for user in &known {
            let event = service.pop(*user).unwrap();
            assert!(event.admin_only);
            assert_eq!(event.kind, EventKind::ReportNew);
        }

        let newcomer = UserId::generate();
        assert!(service.pop(newcomer).is_none());
    }

    #[test]
    fn bounded_queue_drops_oldest() {
        let service = EventQueueService::with_max_pending(Some(2));
        let user = UserId::generate();
        for i in 0..4 {
            service.push(user, EventKind::MessageNew, json!({ "seq": i }));
        }
        assert_eq!(service.pending(user), 2);
        assert_eq!(service.pop(user).unwrap().payload["seq"], 2);
        assert_eq!(service.pop(user).unwrap().payload["seq"], 3);
    }

    #[test]
    fn concurrent_pushes_keep_per_producer_order() {
        let service = Arc::new(EventQueueService::new());
        let user = UserId::generate();

        let handles: Vec<_> = (0..4)
            .map(|producer| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    for seq in 0..250 {
                        service.push(
                            user,
                            EventKind::MessageNew,
                            json!({ "producer": producer, "seq": seq }),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut last_seen = [-1i64; 4];
        let mut total = 0;
        while let Some(event) = service.pop(user) {
            let producer = event.payload["producer"].as_u64().unwrap() as usize;
            let seq = event.payload["seq"].as_i64().unwrap();
            assert!(seq > last_seen[producer], "同一来源的事件必须保持顺序");
            last_seen[producer] = seq;
            total += 1;
        }
        assert_eq!(total, 1000);
    }

    #[tokio::test]
    async fn push_wakes_registered_waiter() {
        let service = Arc::new(EventQueueService::new());
        let user = UserId::generate();
        let wakeup = service.register(user);

        let notified = wakeup.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        service.push(user, EventKind::MessageNew, json!({}));

        tokio::time::timeout(Duration::from_secs(1), notified)
            .await
            .expect("push 之后应当立即唤醒");
    }
}
