//! Current slide position, as reported by the location fragment.
//!
//! Presentations encode the visible slide in the fragment as `#/{h}/{v}`.
//! The tracker re-reads the fragment whenever the host signals a navigation
//! and only publishes positions that differ from the last one.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the host should defer before re-reading the fragment after a
/// navigation signal. Zero means "next tick".
pub const SETTLE_DELAY: Duration = Duration::from_millis(0);

/// Horizontal and vertical slide coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct SlidePosition {
    pub h: u32,
    pub v: u32,
}

impl SlidePosition {
    pub fn new(h: u32, v: u32) -> Self {
        Self { h, v }
    }

    /// Fragment that navigates to this position.
    pub fn to_fragment(self) -> String {
        format!("#/{}/{}", self.h, self.v)
    }
}

/// Parse a location fragment like `#/3/1`.
///
/// Missing or non-numeric segments read as 0. Segments after the vertical
/// index (fragment steps) are ignored.
pub fn parse_fragment(fragment: &str) -> SlidePosition {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    let mut parts = path.split('/');
    let h = parts.next().map(parse_leading_int).unwrap_or(0);
    let v = parts.next().map(parse_leading_int).unwrap_or(0);
    SlidePosition { h, v }
}

/// Parse leading ASCII digits, stopping at the first non-digit.
fn parse_leading_int(segment: &str) -> u32 {
    let digits: String = segment
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Host events that may change the current slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSignal {
    /// Navigation API `navigatesuccess`.
    NavigateSuccess,
    /// `hashchange`.
    HashChange,
    /// `popstate`.
    PopState,
}

impl NavigationSignal {
    /// DOM event name of the signal.
    pub fn event_name(self) -> &'static str {
        match self {
            NavigationSignal::NavigateSuccess => "navigatesuccess",
            NavigationSignal::HashChange => "hashchange",
            NavigationSignal::PopState => "popstate",
        }
    }

    /// Signal for a DOM event name.
    pub fn from_event_name(name: &str) -> Result<Self> {
        match name {
            "navigatesuccess" => Ok(NavigationSignal::NavigateSuccess),
            "hashchange" => Ok(NavigationSignal::HashChange),
            "popstate" => Ok(NavigationSignal::PopState),
            other => Err(Error::InvalidInput(format!(
                "Unknown navigation event '{}'",
                other
            ))),
        }
    }

    /// Signals to subscribe to, depending on whether the host exposes the
    /// Navigation API.
    pub fn subscriptions(navigation_api_available: bool) -> &'static [NavigationSignal] {
        if navigation_api_available {
            &[NavigationSignal::NavigateSuccess]
        } else {
            &[NavigationSignal::HashChange, NavigationSignal::PopState]
        }
    }
}

type Listener = Box<dyn FnMut(SlidePosition)>;

/// Tracks the current position and notifies listeners on change.
pub struct NavigationTracker {
    current: SlidePosition,
    listeners: Vec<Listener>,
}

impl NavigationTracker {
    /// Start tracking from the fragment at load time.
    pub fn new(initial_fragment: &str) -> Self {
        Self {
            current: parse_fragment(initial_fragment),
            listeners: Vec::new(),
        }
    }

    /// The last published position.
    pub fn current(&self) -> SlidePosition {
        self.current
    }

    /// Register a listener for position changes.
    pub fn subscribe(&mut self, listener: impl FnMut(SlidePosition) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Handle a navigation signal after the fragment has settled.
    ///
    /// Returns the new position if it changed (and listeners were notified).
    pub fn handle(&mut self, signal: NavigationSignal, fragment: &str) -> Option<SlidePosition> {
        let next = parse_fragment(fragment);
        if next == self.current {
            log::debug!("{:?} left position unchanged at {:?}", signal, next);
            return None;
        }

        log::debug!("{:?} moved position {:?} -> {:?}", signal, self.current, next);
        self.current = next;
        for listener in &mut self.listeners {
            listener(next);
        }
        Some(next)
    }
}

impl std::fmt::Debug for NavigationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationTracker")
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
