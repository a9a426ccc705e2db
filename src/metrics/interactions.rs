//! User-interaction tracking.
//!
//! Counts activity by kind and splits it into sessions: a gap of at least
//! the configured timeout (60 s by default) between two recorded activities
//! ends the running session at its last activity and opens a new one.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kinds of user activity that are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Click,
    KeyPress,
    Scroll,
    FormSubmission,
    TextSelection,
    Input,
}

impl FromStr for InteractionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(Self::Click),
            "key_press" | "keydown" => Ok(Self::KeyPress),
            "scroll" => Ok(Self::Scroll),
            "form_submission" | "submit" => Ok(Self::FormSubmission),
            "text_selection" | "selectionchange" => Ok(Self::TextSelection),
            "input" => Ok(Self::Input),
            other => anyhow::bail!("unknown interaction kind: {other}"),
        }
    }
}

/// A contiguous span of activity. `end_time` is `None` while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub start_time: i64,
    pub end_time: Option<i64>,
}

/// Activity counters plus the session list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionTracker {
    pub clicks: u64,
    pub key_presses: u64,
    pub scroll_events: u64,
    pub form_submissions: u64,
    pub text_selections: u64,
    pub input_events: u64,
    pub last_activity: i64,
    pub sessions: Vec<Session>,
    #[serde(skip)]
    timeout_ms: i64,
}

impl InteractionTracker {
    /// Start tracking at `now` with one open session.
    pub fn new(now: i64, timeout_ms: i64) -> Self {
        Self {
            clicks: 0,
            key_presses: 0,
            scroll_events: 0,
            form_submissions: 0,
            text_selections: 0,
            input_events: 0,
            last_activity: now,
            sessions: vec![Session {
                start_time: now,
                end_time: None,
            }],
            timeout_ms,
        }
    }

    /// Count one activity of `kind` at `now`.
    pub fn record(&mut self, kind: InteractionKind, now: i64) {
        match kind {
            InteractionKind::Click => self.clicks += 1,
            InteractionKind::KeyPress => self.key_presses += 1,
            InteractionKind::Scroll => self.scroll_events += 1,
            InteractionKind::FormSubmission => self.form_submissions += 1,
            InteractionKind::TextSelection => self.text_selections += 1,
            InteractionKind::Input => self.input_events += 1,
        }

        let previous = self.last_activity;
        self.last_activity = now;

        if now - previous >= self.timeout_ms {
            self.close_current(previous);
            self.sessions.push(Session {
                start_time: now,
                end_time: None,
            });
        }
    }

    /// Close the open session if nothing happened for the timeout.
    /// Returns whether a session was closed.
    pub fn sweep(&mut self, now: i64) -> bool {
        if now - self.last_activity >= self.timeout_ms {
            return self.close_current(self.last_activity);
        }
        false
    }

    /// Open a fresh session at `now` if the latest one is closed.
    pub fn resume(&mut self, now: i64) {
        if self.current_open().is_none() {
            self.last_activity = now;
            self.sessions.push(Session {
                start_time: now,
                end_time: None,
            });
        }
    }

    /// Close the open session at `at`. Returns whether one was open.
    pub fn close_current(&mut self, at: i64) -> bool {
        match self.sessions.last_mut() {
            Some(session) if session.end_time.is_none() => {
                session.end_time = Some(at);
                true
            }
            _ => false,
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.end_time.is_none()).count()
    }

    fn current_open(&self) -> Option<&Session> {
        self.sessions.last().filter(|s| s.end_time.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    #[test]
    fn close_events_stay_in_one_session() {
        let mut tracker = InteractionTracker::new(0, MINUTE);
        tracker.record(InteractionKind::Click, 10_000);
        tracker.record(InteractionKind::KeyPress, 69_000);
        assert_eq!(tracker.sessions.len(), 1);
        assert_eq!(tracker.clicks, 1);
        assert_eq!(tracker.key_presses, 1);
    }

    #[test]
    fn long_gap_closes_session_at_last_activity() {
        let mut tracker = InteractionTracker::new(0, MINUTE);
        tracker.record(InteractionKind::Click, 5_000);
        tracker.record(InteractionKind::Scroll, 5_000 + MINUTE);

        assert_eq!(tracker.sessions.len(), 2);
        assert_eq!(tracker.sessions[0].end_time, Some(5_000));
        assert_eq!(tracker.sessions[1].start_time, 5_000 + MINUTE);
        assert_eq!(tracker.sessions[1].end_time, None);
        assert_eq!(tracker.active_sessions(), 1);
    }

    #[test]
    fn sweep_closes_idle_session_once() {
        let mut tracker = InteractionTracker::new(0, MINUTE);
        tracker.record(InteractionKind::Input, 1_000);
        assert!(!tracker.sweep(30_000));
        assert!(tracker.sweep(90_000));
        assert_eq!(tracker.sessions[0].end_time, Some(1_000));
        assert!(!tracker.sweep(120_000));

        tracker.record(InteractionKind::Click, 130_000);
        assert_eq!(tracker.sessions.len(), 2);
        assert_eq!(tracker.sessions[0].end_time, Some(1_000));
    }

    #[test]
    fn parses_dom_event_names() {
        assert_eq!("keydown".parse::<InteractionKind>().unwrap(), InteractionKind::KeyPress);
        assert_eq!(
            "selectionchange".parse::<InteractionKind>().unwrap(),
            InteractionKind::TextSelection
        );
        assert!("hover".parse::<InteractionKind>().is_err());
    }

    #[test]
    fn serializes_camel_case_counters() {
        let tracker = InteractionTracker::new(0, MINUTE);
        let json = serde_json::to_value(&tracker).unwrap();
        assert_eq!(json["keyPresses"], 0);
        assert_eq!(json["sessions"][0]["startTime"], 0);
        assert!(json.get("timeoutMs").is_none());
    }
}
