//! Per-connection sliding-window message limiter.
//!
//! Every attempt is recorded before the check, so rejected messages still
//! count toward the window.  State lives only as long as the connection.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use nomi_domain::config::MessageRateLimit;

use crate::chat::hub::ConnId;

pub struct RateLimiter {
    max_messages: usize,
    window: Duration,
    attempts: Mutex<HashMap<ConnId, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(cfg: &MessageRateLimit) -> Self {
        Self {
            max_messages: cfg.max_messages,
            window: Duration::from_millis(cfg.window_ms),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt and report whether it is within the limit.
    pub fn check(&self, conn: ConnId) -> bool {
        self.check_at(conn, Instant::now())
    }

    pub fn check_at(&self, conn: ConnId, now: Instant) -> bool {
        let mut attempts = self.attempts.lock();
        let recent = attempts.entry(conn).or_default();
        while let Some(&oldest) = recent.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                recent.pop_front();
            } else {
                break;
            }
        }
        recent.push_back(now);
        recent.len() <= self.max_messages
    }

    /// Drop all state for a closed connection.
    pub fn forget(&self, conn: ConnId) {
        self.attempts.lock().remove(&conn);
    }

    pub fn tracked_connections(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn limiter() -> RateLimiter {
        RateLimiter::new(&MessageRateLimit::default())
    }

    #[test]
    fn seventh_message_in_window_is_rejected() {
        let rl = limiter();
        let conn = Uuid::new_v4();
        let start = Instant::now();
        for i in 0..6 {
            assert!(rl.check_at(conn, start + Duration::from_millis(i * 100)), "msg {i}");
        }
        assert!(!rl.check_at(conn, start + Duration::from_millis(700)));
    }

    #[test]
    fn window_slides() {
        let rl = limiter();
        let conn = Uuid::new_v4();
        let start = Instant::now();
        for _ in 0..6 {
            assert!(rl.check_at(conn, start));
        }
        assert!(!rl.check_at(conn, start + Duration::from_millis(4_999)));
        // The six attempts at `start` have aged out; the one at 4 999 ms has not.
        assert!(rl.check_at(conn, start + Duration::from_millis(5_000)));
    }

    #[test]
    fn rejected_attempts_extend_the_block() {
        let rl = limiter();
        let conn = Uuid::new_v4();
        let start = Instant::now();
        for _ in 0..6 {
            rl.check_at(conn, start);
        }
        // Hammering at 4s keeps six fresh attempts inside the next window.
        for _ in 0..6 {
            assert!(!rl.check_at(conn, start + Duration::from_millis(4_000)));
        }
        assert!(!rl.check_at(conn, start + Duration::from_millis(6_000)));
    }

    #[test]
    fn connections_are_independent_and_forgettable() {
        let rl = limiter();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Instant::now();
        for _ in 0..7 {
            rl.check_at(a, now);
        }
        assert!(rl.check_at(b, now));
        rl.forget(a);
        assert!(rl.check_at(a, now));
        assert_eq!(rl.tracked_connections(), 2);
    }
}
