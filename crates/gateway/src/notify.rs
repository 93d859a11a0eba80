//! User-facing side effects of failed requests
//!
//! The gateway never prints or navigates on its own. It reports through two
//! small traits so the embedding application decides what "show a notice" and
//! "go back to the entry screen" mean.

use tracing::{info, warn};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// Shows notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Ends the current view and returns the user to the entry route.
pub trait Navigator: Send + Sync {
    fn redirect_to_entry(&self);
}

/// Default notifier: notices become log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(text = %notice.message, "notice"),
            NoticeLevel::Error => warn!(text = %notice.message, "notice"),
        }
    }
}

/// Default navigator: records the forced navigation in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect_to_entry(&self) {
        warn!(route = session::ENTRY_PATH, "session ended, returning to entry route");
    }
}
