// Scroll-triggered auto-loading as an explicit state machine. A new search
// arms the trigger; a page that comes back empty exhausts it, and nothing
// short of a fresh search re-arms it. The fixed delay between reaching the
// bottom and firing the load dampens momentum scrolling; it is not a
// single-in-flight guarantee, so overlapping loads can still be scheduled.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    /// No search has armed the trigger yet.
    Disarmed,
    /// Armed, waiting for the viewport to reach the bottom.
    Idle,
    /// A load has been scheduled and its delay is running.
    Pending,
    /// A page returned zero records; auto-loading is disabled.
    Exhausted,
}

pub struct ScrollTrigger {
    state: ScrollState,
    delay: Duration,
}

impl ScrollTrigger {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: ScrollState::Disarmed,
            delay,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re-)install the trigger. Called on every new search, including after
    /// exhaustion.
    pub fn arm(&mut self) {
        self.state = ScrollState::Idle;
    }

    /// Disable auto-loading for the rest of the session.
    pub fn exhaust(&mut self) {
        self.state = ScrollState::Exhausted;
    }

    /// Feed a scroll event. Returns true when a load should be scheduled
    /// after `delay`. Scrolling again while a load is already pending
    /// schedules another one.
    pub fn on_scroll(&mut self, viewport_bottom: f64, document_height: f64) -> bool {
        if !reaches_bottom(viewport_bottom, document_height) {
            return false;
        }
        match self.state {
            ScrollState::Idle | ScrollState::Pending => {
                self.state = ScrollState::Pending;
                true
            }
            ScrollState::Disarmed | ScrollState::Exhausted => false,
        }
    }

    /// A scheduled load is about to run. Returns false when the trigger was
    /// disarmed or exhausted in the meantime and the load must be dropped.
    pub fn begin_load(&mut self) -> bool {
        match self.state {
            ScrollState::Pending => {
                self.state = ScrollState::Idle;
                true
            }
            // An earlier overlapping load already consumed the pending state.
            ScrollState::Idle => true,
            ScrollState::Disarmed | ScrollState::Exhausted => false,
        }
    }
}

/// The viewport's bottom edge has reached the document's bottom edge.
pub fn reaches_bottom(viewport_bottom: f64, document_height: f64) -> bool {
    viewport_bottom >= document_height
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger() -> ScrollTrigger {
        ScrollTrigger::new(Duration::from_millis(1000))
    }

    #[test]
    fn disarmed_ignores_scrolls() {
        let mut t = trigger();
        assert_eq!(t.state(), ScrollState::Disarmed);
        assert!(!t.on_scroll(800.0, 800.0));
        assert!(!t.begin_load());
    }

    #[test]
    fn armed_schedules_only_at_bottom() {
        let mut t = trigger();
        t.arm();
        assert!(!t.on_scroll(700.0, 800.0));
        assert_eq!(t.state(), ScrollState::Idle);
        assert!(t.on_scroll(800.0, 800.0));
        assert_eq!(t.state(), ScrollState::Pending);
    }

    #[test]
    fn pending_allows_overlapping_schedules() {
        let mut t = trigger();
        t.arm();
        assert!(t.on_scroll(900.0, 800.0));
        assert!(t.on_scroll(900.0, 800.0));
        assert_eq!(t.state(), ScrollState::Pending);
    }

    #[test]
    fn begin_load_returns_to_idle() {
        let mut t = trigger();
        t.arm();
        assert!(t.on_scroll(800.0, 800.0));
        assert!(t.begin_load());
        assert_eq!(t.state(), ScrollState::Idle);
        // The second of two overlapping loads still runs.
        assert!(t.begin_load());
    }

    #[test]
    fn exhausted_drops_scrolls_and_pending_loads() {
        let mut t = trigger();
        t.arm();
        assert!(t.on_scroll(800.0, 800.0));
        t.exhaust();
        assert!(!t.begin_load());
        assert!(!t.on_scroll(900.0, 800.0));
        assert_eq!(t.state(), ScrollState::Exhausted);
    }

    #[test]
    fn fresh_search_rearms_after_exhaustion() {
        let mut t = trigger();
        t.arm();
        t.exhaust();
        t.arm();
        assert_eq!(t.state(), ScrollState::Idle);
        assert!(t.on_scroll(800.0, 800.0));
    }

    #[test]
    fn bottom_edge_is_inclusive() {
        assert!(reaches_bottom(800.0, 800.0));
        assert!(reaches_bottom(800.5, 800.0));
        assert!(!reaches_bottom(799.9, 800.0));
    }
}
