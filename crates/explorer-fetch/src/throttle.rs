//! Leading+trailing throttle for the point-query slot.
//!
//! Pointer movement fires bursts of triggers; the contract is one dispatch
//! on the leading edge of a burst and at most one more on the trailing
//! edge, so the final pointer position is never silently dropped while
//! intermediate positions are. The state machine is explicit and driven by
//! caller-supplied instants, which makes it deterministic under tokio's
//! paused test clock.

use tokio::time::{Duration, Instant};

/// What the caller should do with the trigger it just offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Dispatch now; a window is open until the given instant.
    FireLeading { window_end: Instant },
    /// Within an open window; the trigger is coalesced into the trailing
    /// edge.
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Armed {
        window_end: Instant,
        trailing_buffered: bool,
    },
}

/// Throttle state machine, one per throttled slot.
#[derive(Debug)]
pub struct Throttle {
    window: Duration,
    state: State,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: State::Idle,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Offer a trigger at `now`.
    pub fn offer(&mut self, now: Instant) -> Decision {
        match self.state {
            State::Armed { window_end, .. } if now < window_end => {
                self.state = State::Armed {
                    window_end,
                    trailing_buffered: true,
                };
                Decision::Buffered
            }
            // Idle, or the window elapsed before the trailing driver ran;
            // either way this trigger opens a fresh window and fires.
            _ => {
                let window_end = now + self.window;
                self.state = State::Armed {
                    window_end,
                    trailing_buffered: false,
                };
                Decision::FireLeading { window_end }
            }
        }
    }

    /// Called by the trailing driver once the window has elapsed.
    ///
    /// Fires the buffered trailing call if there is one, opening a new
    /// window (the trailing fire counts as an invocation); otherwise the
    /// machine returns to idle.
    pub fn take_trailing(&mut self, now: Instant) -> Option<Instant> {
        match self.state {
            State::Armed {
                window_end,
                trailing_buffered,
            } if now >= window_end => {
                if trailing_buffered {
                    let next_end = now + self.window;
                    self.state = State::Armed {
                        window_end: next_end,
                        trailing_buffered: false,
                    };
                    Some(next_end)
                } else {
                    self.state = State::Idle;
                    None
                }
            }
            _ => None,
        }
    }

    /// Teardown: drop any buffered trailing call.
    pub fn cancel(&mut self) {
        self.state = State::Idle;
    }
}
