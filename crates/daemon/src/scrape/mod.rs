// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal scraper: drive the interactive TUI to a rendered `/status`
//! view and harvest the raw bytes.
//!
//! The scrape is an explicit state machine:
//!
//! ```text
//! starting → waiting_ready → status_sent → draining → exiting
//! ```
//!
//! - starting: answer the TUI's cursor-position handshake immediately and
//!   every 250 ms for 2 s.
//! - waiting_ready: readiness needles on the ANSI-stripped stream, or 10 s
//!   after first activity.
//! - on readiness `/status\r` is written exactly once.
//! - status_sent: a 1200 ms idle timer (reset per read) races an 8 s hard
//!   cap; the first to fire writes `/exit\r`.
//! - exiting: drain until EOF. The child is killed on every exit path.
//!
//! Prompt auto-answers fire on the lowercased, ANSI-stripped rolling tail;
//! matching survives needles split across reads.

pub mod needles;
pub mod pty;

pub use pty::{NativePty, Pty, PtyError};

use needles::{text_contains, RollingTail};
use std::time::Duration;
use tokio::time::Instant;

/// Scrape terminal dimensions.
pub const PTY_ROWS: u16 = 40;
pub const PTY_COLS: u16 = 120;

/// Cursor-position report the TUI's startup handshake expects.
pub const CPR_REPLY: &[u8] = b"\x1b[1;1R";

/// Needles that mean the TUI is ready for input.
const READY_NEEDLES: [&str; 3] = ["openai codex", "to get started", "/status"];

/// Timer configuration, overridable in tests.
#[derive(Debug, Clone)]
pub struct ScrapeTimings {
    pub cpr_period: Duration,
    pub cpr_window: Duration,
    pub ready_timeout: Duration,
    pub idle_timeout: Duration,
    pub hard_timeout: Duration,
    pub drain_timeout: Duration,
}

impl Default for ScrapeTimings {
    fn default() -> Self {
        Self {
            cpr_period: Duration::from_millis(250),
            cpr_window: Duration::from_secs(2),
            ready_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_millis(1200),
            hard_timeout: Duration::from_secs(8),
            drain_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WaitingReady,
    StatusSent,
    Exiting,
}

/// One prompt auto-answer rule.
struct AutoAnswer {
    matcher: fn(&str) -> bool,
    reply: &'static [u8],
    one_shot: bool,
    cooldown: Duration,
    fired: bool,
    last_fired: Option<Instant>,
}

impl AutoAnswer {
    fn try_fire(&mut self, text: &str, now: Instant) -> Option<&'static [u8]> {
        if self.one_shot && self.fired {
            return None;
        }
        if let Some(last) = self.last_fired {
            if now.duration_since(last) < self.cooldown {
                return None;
            }
        }
        if !(self.matcher)(text) {
            return None;
        }
        self.fired = true;
        self.last_fired = Some(now);
        Some(self.reply)
    }
}

fn folder_trust(text: &str) -> bool {
    text.contains("allow") && text.contains("to work in this folder")
}

fn approval_mode(text: &str) -> bool {
    text.contains("ask me to approve")
}

fn press_enter(text: &str) -> bool {
    text.contains("press enter to continue") || text.contains("press enter to confirm")
}

fn try_new_model(text: &str) -> bool {
    text.contains("try new model")
}

fn default_answers() -> Vec<AutoAnswer> {
    let answer = |matcher: fn(&str) -> bool,
                  reply: &'static [u8],
                  one_shot: bool,
                  cooldown_ms: u64| AutoAnswer {
        matcher,
        reply,
        one_shot,
        cooldown: Duration::from_millis(cooldown_ms),
        fired: false,
        last_fired: None,
    };
    vec![
        answer(folder_trust, b"2\r", true, 0),
        answer(approval_mode, b"2\r", true, 0),
        answer(press_enter, b"\r", false, 500),
        answer(try_new_model, b"\r", false, 500),
    ]
}

/// Streaming detector for raw escape-sequence queries (CPR).
struct CprDetector {
    overlap: Vec<u8>,
}

impl CprDetector {
    const QUERIES: [&'static [u8]; 2] = [b"\x1b[6n", b"\x1b[?6n"];

    fn new() -> Self {
        Self { overlap: Vec::new() }
    }

    /// True when a query completes in this chunk (counting each occurrence
    /// once even when split across reads).
    fn saw_query(&mut self, chunk: &[u8]) -> bool {
        let mut window = std::mem::take(&mut self.overlap);
        let consumed = window.len();
        window.extend_from_slice(chunk);

        let max_len = Self::QUERIES.iter().map(|q| q.len()).max().unwrap_or(0);
        let mut found = false;
        for query in Self::QUERIES {
            if let Some(pos) = window
                .windows(query.len())
                .position(|w| w == query)
            {
                // Only count matches ending in the new chunk.
                if pos + query.len() > consumed {
                    found = true;
                }
            }
        }

        let keep_from = window.len().saturating_sub(max_len - 1);
        self.overlap = window[keep_from..].to_vec();
        found
    }
}

/// Drive one scrape session to completion and return the captured bytes.
///
/// The PTY's child is killed before returning, on every path.
pub async fn scrape_session(pty: &mut dyn Pty, timings: &ScrapeTimings) -> Vec<u8> {
    let result = run_state_machine(pty, timings).await;
    pty.kill();
    result
}

async fn run_state_machine(pty: &mut dyn Pty, timings: &ScrapeTimings) -> Vec<u8> {
    let started = Instant::now();
    let mut captured: Vec<u8> = Vec::new();
    let mut tail = RollingTail::default();
    let mut answers = default_answers();
    let mut cpr = CprDetector::new();
    let mut phase = Phase::WaitingReady;

    // Startup handshake: reply immediately, then on a short period.
    let _ = pty.write(CPR_REPLY);
    let cpr_until = started + timings.cpr_window;
    let mut cpr_next = started + timings.cpr_period;

    let mut first_activity: Option<Instant> = None;
    let mut ready_deadline = started + timings.ready_timeout;
    let mut idle_deadline = Instant::now() + Duration::from_secs(3600);
    let mut hard_deadline = idle_deadline;
    let mut drain_deadline = idle_deadline;

    loop {
        let now = Instant::now();
        let mut next = now + Duration::from_secs(3600);
        if now < cpr_until {
            next = next.min(cpr_next);
        }
        match phase {
            Phase::WaitingReady => next = next.min(ready_deadline),
            Phase::StatusSent => next = next.min(idle_deadline).min(hard_deadline),
            Phase::Exiting => next = next.min(drain_deadline),
        }

        tokio::select! {
            chunk = pty.read_chunk() => {
                let Some(chunk) = chunk else { break };
                let now = Instant::now();
                captured.extend_from_slice(&chunk);

                if cpr.saw_query(&chunk) {
                    let _ = pty.write(CPR_REPLY);
                }

                let window = tail.absorb(&chunk);
                let text = crate::probe::parse::strip_ansi(&window).to_lowercase();
                for answer in &mut answers {
                    if let Some(reply) = answer.try_fire(&text, now) {
                        let _ = pty.write(reply);
                    }
                }

                match phase {
                    Phase::WaitingReady => {
                        if first_activity.is_none() {
                            first_activity = Some(now);
                            ready_deadline = now + timings.ready_timeout;
                        }
                        if READY_NEEDLES.iter().any(|n| text_contains(&window, n)) {
                            let _ = pty.write(b"/status\r");
                            phase = Phase::StatusSent;
                            idle_deadline = now + timings.idle_timeout;
                            hard_deadline = now + timings.hard_timeout;
                        }
                    }
                    Phase::StatusSent => {
                        idle_deadline = now + timings.idle_timeout;
                    }
                    Phase::Exiting => {}
                }
            }
            _ = tokio::time::sleep_until(next) => {
                let now = Instant::now();
                if now < cpr_until && now >= cpr_next {
                    let _ = pty.write(CPR_REPLY);
                    cpr_next = now + timings.cpr_period;
                }
                match phase {
                    Phase::WaitingReady if now >= ready_deadline => {
                        // The TUI never announced itself; assume it is ready.
                        let _ = pty.write(b"/status\r");
                        phase = Phase::StatusSent;
                        idle_deadline = now + timings.idle_timeout;
                        hard_deadline = now + timings.hard_timeout;
                    }
                    Phase::StatusSent if now >= idle_deadline || now >= hard_deadline => {
                        let _ = pty.write(b"/exit\r");
                        phase = Phase::Exiting;
                        drain_deadline = now + timings.drain_timeout;
                    }
                    Phase::Exiting if now >= drain_deadline => break,
                    _ => {}
                }
            }
        }
    }

    captured
}

/// Scrape a command on a freshly opened 40×120 PTY.
pub async fn scrape_command(argv: &[String]) -> Result<Vec<u8>, PtyError> {
    let mut pty = NativePty::spawn(argv, PTY_ROWS, PTY_COLS)?;
    Ok(scrape_session(&mut pty, &ScrapeTimings::default()).await)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
