//! 时间来源
//!
//! 停用期限、会话和登录记录的时间都从这里取，测试里换成可手动推进的时钟。

use domain::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// 墙上时钟（UTC）
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

/// 只在调用 [`ManualClock::advance`] 时前进
#[cfg(test)]
pub struct ManualClock {
    now: std::sync::Mutex<Timestamp>,
}

#[cfg(test)]
impl ManualClock {
    pub fn starting_now() -> Self {
        Self {
            now: std::sync::Mutex::new(chrono::Utc::now()),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}
