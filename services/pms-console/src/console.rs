//! Terminal renditions of the gateway's side channels
//!
//! Notices go to stderr so stdout stays clean JSON. A forced navigation
//! cannot move a terminal anywhere; it raises a flag the command loop turns
//! into the re-login hint and a non-zero exit.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use gateway::{Navigator, Notice, NoticeLevel, Notifier};
use tracing::debug;

/// Prints notices and remembers the error texts already shown, so the
/// final error report does not repeat one.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    shown: Mutex<Vec<String>>,
}

impl ConsoleNotifier {
    pub fn has_shown(&self, message: &str) -> bool {
        self.shown
            .lock()
            .is_ok_and(|shown| shown.iter().any(|m| m == message))
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Info => "",
            NoticeLevel::Error => "error: ",
        };
        // stderr going away must not turn a notice into a failure
        let _ = writeln!(std::io::stderr(), "{prefix}{}", notice.message);
        if notice.level == NoticeLevel::Error
            && let Ok(mut shown) = self.shown.lock()
        {
            shown.push(notice.message);
        }
    }
}

#[derive(Debug, Default)]
pub struct ConsoleNavigator {
    redirected: AtomicBool,
}

impl ConsoleNavigator {
    /// Whether the session was ended during this run.
    pub fn redirected(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }
}

impl Navigator for ConsoleNavigator {
    fn redirect_to_entry(&self) {
        if !self.redirected.swap(true, Ordering::SeqCst) {
            debug!(route = session::ENTRY_PATH, "session ended");
        }
    }
}
