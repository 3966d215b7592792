//! Transient success and error notices.

use chrono::{DateTime, Duration, Utc};

/// How long a notice stays visible, in seconds.
pub const NOTICE_LIFETIME_SECS: i64 = 5;

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A message shown to the user until it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// The current success and error notice. A new notice of either kind
/// replaces the previous one of the same kind.
#[derive(Debug, Clone, Default)]
pub struct Notices {
    success: Option<Notice>,
    error: Option<Notice>,
}

impl Notices {
    fn post(kind: NoticeKind, message: impl Into<String>, now: DateTime<Utc>) -> Notice {
        Notice {
            kind,
            message: message.into(),
            expires_at: now + Duration::seconds(NOTICE_LIFETIME_SECS),
        }
    }

    /// Show a success notice.
    pub fn success(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.success = Some(Self::post(NoticeKind::Success, message, now));
    }

    /// Show an error notice.
    pub fn error(&mut self, message: impl Into<String>, now: DateTime<Utc>) {
        self.error = Some(Self::post(NoticeKind::Error, message, now));
    }

    /// Drop expired notices and return the ones still visible, errors first.
    pub fn active(&mut self, now: DateTime<Utc>) -> Vec<Notice> {
        for slot in [&mut self.error, &mut self.success] {
            if slot.as_ref().is_some_and(|n| n.expires_at <= now) {
                *slot = None;
            }
        }
        self.error.iter().chain(self.success.iter()).cloned().collect()
    }

    /// Dismiss every notice.
    pub fn clear(&mut self) {
        self.success = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_expire_after_lifetime() {
        let now = Utc::now();
        let mut notices = Notices::default();
        notices.success("Spot booked successfully!", now);
        notices.error("No slots available", now);
        assert_eq!(notices.active(now).len(), 2);
        assert_eq!(notices.active(now)[0].kind, NoticeKind::Error);

        assert_eq!(notices.active(now + Duration::seconds(4)).len(), 2);
        assert!(notices.active(now + Duration::seconds(NOTICE_LIFETIME_SECS)).is_empty());
    }

    #[test]
    fn test_newer_notice_replaces_older() {
        let now = Utc::now();
        let mut notices = Notices::default();
        notices.success("first", now);
        notices.success("second", now);
        let active = notices.active(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "second");
    }

    #[test]
    fn test_clear() {
        let now = Utc::now();
        let mut notices = Notices::default();
        notices.error("oops", now);
        notices.clear();
        assert!(notices.active(now).is_empty());
    }
}
