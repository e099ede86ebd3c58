//! # EchoBuffer: recent diagnostic lines
//!
//! Keeps the last `capacity` `echo` events as display-ready lines
//! (`"[HH:MM:SS] text"`, local time). The dashboard this feeds showed five lines, so
//! that is the default.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pickvisor::{EchoBuffer, Subscribe};
//!
//! let echo = Arc::new(EchoBuffer::default());
//! let as_sub: Arc<dyn Subscribe> = echo.clone();
//! assert!(echo.lines().is_empty());
//! # let _ = as_sub;
//! ```

use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::core::HistoryBuffer;
use crate::events::{Channel, Event};
use crate::subscribers::Subscribe;

/// Default number of retained lines.
pub const DEFAULT_ECHO_LINES: usize = 5;

/// Subscriber retaining the most recent echo lines.
pub struct EchoBuffer {
    lines: Mutex<HistoryBuffer<String>>,
}

impl EchoBuffer {
    /// Keeps at most `capacity` lines.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(HistoryBuffer::new(capacity)),
        }
    }

    /// Retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().to_vec()
    }

    fn push(&self, at: SystemTime, text: &str) {
        self.lines.lock().push(line(at, text));
    }
}

impl Default for EchoBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_ECHO_LINES)
    }
}

fn line(at: SystemTime, text: &str) -> String {
    let local = DateTime::<Local>::from(at);
    format!("{} {text}", local.format("[%H:%M:%S]"))
}

#[async_trait]
impl Subscribe for EchoBuffer {
    async fn on_event(&self, event: &Event) {
        if let Some(text) = event.text() {
            self.push(event.at, text);
        }
    }

    fn name(&self) -> &'static str {
        "EchoBuffer"
    }

    fn accepts(&self, channel: Channel) -> bool {
        channel == Channel::Echo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_line_uses_local_clock() {
        let local = Local.with_ymd_and_hms(2024, 3, 1, 13, 5, 9).single().unwrap();
        let at = SystemTime::from(local);
        assert_eq!(line(at, "held"), "[13:05:09] held");

        let now = SystemTime::now();
        let stamp = DateTime::<Local>::from(now);
        let rendered = line(now, "x");
        assert_eq!(&rendered[1..3], format!("{:02}", stamp.hour()));
        assert!(rendered.starts_with('[') && rendered.ends_with("] x"));
    }

    #[tokio::test]
    async fn test_keeps_last_lines() {
        let buf = EchoBuffer::new(2);
        for text in ["a", "b", "c"] {
            buf.on_event(&Event::echo(text)).await;
        }
        buf.on_event(&Event::check(1.0)).await;

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("] b"));
        assert!(lines[1].ends_with("] c"));
        assert!(!buf.accepts(Channel::Check));
    }
}
