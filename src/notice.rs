//! Transient user-facing notices.
//!
//! Every action on the dashboard or profile page ends in at most one notice.
//! A notice stays visible for the board's TTL (5 seconds by default) and is
//! then auto-dismissed. Posting replaces whatever was showing.

use std::time::{Duration, Instant};

use serde::Serialize;

pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub posted_at: Instant,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[derive(Debug, Clone)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Option<Notice>,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(NOTICE_TTL)
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn post_at(&mut self, level: NoticeLevel, message: impl Into<String>, now: Instant) {
        let message = message.into();
        match level {
            NoticeLevel::Success => tracing::info!(notice = %message, "notice posted"),
            NoticeLevel::Error => tracing::warn!(notice = %message, "error notice posted"),
        }
        self.current = Some(Notice {
            level,
            message,
            posted_at: now,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.post_at(NoticeLevel::Success, message, Instant::now());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.post_at(NoticeLevel::Error, message, Instant::now());
    }

    /// The notice visible at `now`, if it has not outlived the TTL.
    pub fn current_at(&self, now: Instant) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.posted_at) < self.ttl)
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current_at(Instant::now())
    }

    /// Most recent notice regardless of age.
    pub fn last(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    /// Drops the notice once it has expired. Returns true if one was dropped.
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.current.is_some() && self.current_at(now).is_none() {
            self.current = None;
            return true;
        }
        false
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_visible_for_five_seconds() {
        let mut board = NoticeBoard::default();
        let t0 = Instant::now();
        board.post_at(NoticeLevel::Success, "Token revoked successfully", t0);

        let shown = board.current_at(t0 + Duration::from_millis(4_999)).unwrap();
        assert_eq!(shown.message, "Token revoked successfully");
        assert!(board.current_at(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_expire_clears_only_stale_notice() {
        let mut board = NoticeBoard::new(Duration::from_secs(2));
        let t0 = Instant::now();
        board.post_at(NoticeLevel::Error, "Failed to load tokens", t0);

        assert!(!board.expire(t0 + Duration::from_secs(1)));
        assert!(board.last().is_some());
        assert!(board.expire(t0 + Duration::from_secs(3)));
        assert!(board.last().is_none());
        assert!(!board.expire(t0 + Duration::from_secs(4)));
    }

    #[test]
    fn test_new_notice_replaces_old() {
        let mut board = NoticeBoard::default();
        let t0 = Instant::now();
        board.post_at(NoticeLevel::Error, "first", t0);
        board.post_at(NoticeLevel::Success, "second", t0 + Duration::from_secs(1));

        let n = board.current_at(t0 + Duration::from_secs(5)).unwrap();
        assert_eq!(n.message, "second");
        assert!(!n.is_error());
    }

    #[test]
    fn test_dismiss() {
        let mut board = NoticeBoard::default();
        board.error("boom");
        assert!(board.current().unwrap().is_error());
        board.dismiss();
        assert!(board.current().is_none());
    }
}
