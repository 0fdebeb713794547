use parking_lot::Mutex;

pub const SWIPE_THRESHOLD: f32 = 10.0;
pub const SWIPE_WINDOW_MS: u64 = 2000;

const ACTION_DOWN: i32 = 0;
const ACTION_MOVE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Other(i32),
}

impl From<i32> for TouchAction {
    fn from(masked: i32) -> Self {
        match masked {
            ACTION_DOWN => TouchAction::Down,
            ACTION_MOVE => TouchAction::Move,
            other => TouchAction::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub raw_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    TrackingDown,
    ConfirmedDownwardSwipe,
}

struct GestureState<W> {
    phase: GesturePhase,
    generation: u64,
    start_y: f32,
    swipe_time: u64,
    has_toggled: bool,
    candidate: Option<W>,
}

impl<W> GestureState<W> {
    fn new() -> Self {
        Self {
            phase: GesturePhase::Idle,
            generation: 0,
            start_y: 0.0,
            swipe_time: 0,
            has_toggled: false,
            candidate: None,
        }
    }
}

/// What a notification click should do, decided from the current gesture.
#[derive(Debug)]
pub enum ActionClaim<W> {
    PassThrough,
    Suppress {
        /// Present only for the first claim of a gesture.
        toggle: Option<Option<W>>,
    },
}

/// Classifies heads-up touches as downward swipes, one gesture at a time.
pub struct SwipeGestureTracker<W> {
    state: Mutex<GestureState<W>>,
}

impl<W> Default for SwipeGestureTracker<W> {
    fn default() -> Self {
        Self {
            state: Mutex::new(GestureState::new()),
        }
    }
}

impl<W: Clone> SwipeGestureTracker<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GesturePhase {
        self.state.lock().phase
    }

    /// Feed one intercepted touch event.
    ///
    /// Returns the gesture generation when this event confirmed a downward
    /// swipe, so the caller can attach the touched row afterwards.
    pub fn on_touch(&self, event: TouchEvent, intercepting: bool, now: u64) -> Option<u64> {
        let mut state = self.state.lock();

        match event.action {
            TouchAction::Down => {
                let generation = state.generation.wrapping_add(1);
                *state = GestureState::new();
                state.generation = generation;
                state.start_y = event.raw_y;
                state.phase = GesturePhase::TrackingDown;
                None
            }
            TouchAction::Move if state.phase == GesturePhase::TrackingDown && intercepting => {
                if event.raw_y - state.start_y > SWIPE_THRESHOLD {
                    state.phase = GesturePhase::ConfirmedDownwardSwipe;
                    state.swipe_time = now;
                    Some(state.generation)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Associate the row under the finger with a confirmed gesture.
    pub fn attach_candidate(&self, generation: u64, row: W) {
        let mut state = self.state.lock();

        if state.generation == generation && state.phase == GesturePhase::ConfirmedDownwardSwipe {
            state.candidate = Some(row);
        }
    }

    pub fn claim_action(&self, now: u64) -> ActionClaim<W> {
        let mut state = self.state.lock();

        let recent = state.phase == GesturePhase::ConfirmedDownwardSwipe
            && now.saturating_sub(state.swipe_time) < SWIPE_WINDOW_MS;

        if !recent {
            return ActionClaim::PassThrough;
        }

        if state.has_toggled {
            return ActionClaim::Suppress { toggle: None };
        }

        state.has_toggled = true;

        ActionClaim::Suppress {
            toggle: Some(state.candidate.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn down(y: f32) -> TouchEvent {
        TouchEvent {
            action: TouchAction::Down,
            raw_y: y,
        }
    }

    fn moved(y: f32) -> TouchEvent {
        TouchEvent {
            action: TouchAction::Move,
            raw_y: y,
        }
    }

    fn confirmed_at(tracker: &SwipeGestureTracker<u32>, t: u64) -> u64 {
        tracker.on_touch(down(100.0), false, t);
        tracker.on_touch(moved(111.0), true, t).unwrap()
    }

    #[test]
    fn classifies_downward_swipe_past_threshold() {
        let tracker = SwipeGestureTracker::<u32>::new();

        tracker.on_touch(down(100.0), false, 0);
        assert_eq!(tracker.phase(), GesturePhase::TrackingDown);

        assert_eq!(tracker.on_touch(moved(110.0), true, 5), None);
        assert_eq!(tracker.phase(), GesturePhase::TrackingDown);

        assert!(tracker.on_touch(moved(110.5), true, 6).is_some());
        assert_eq!(tracker.phase(), GesturePhase::ConfirmedDownwardSwipe);
    }

    #[test]
    fn ignores_moves_the_host_does_not_intercept() {
        let tracker = SwipeGestureTracker::<u32>::new();

        tracker.on_touch(down(0.0), false, 0);
        assert_eq!(tracker.on_touch(moved(300.0), false, 1), None);
        assert_eq!(tracker.phase(), GesturePhase::TrackingDown);
    }

    #[test]
    fn upward_swipe_never_confirms() {
        let tracker = SwipeGestureTracker::<u32>::new();

        tracker.on_touch(down(300.0), false, 0);
        assert_eq!(tracker.on_touch(moved(100.0), true, 1), None);
    }

    #[test]
    fn click_inside_window_toggles_once() {
        let tracker = SwipeGestureTracker::<u32>::new();
        let generation = confirmed_at(&tracker, 1_000);
        tracker.attach_candidate(generation, 42);

        match tracker.claim_action(1_000 + 1999) {
            ActionClaim::Suppress { toggle: Some(candidate) } => assert_eq!(candidate, Some(42)),
            other => panic!("unexpected claim: {other:?}"),
        }

        assert!(matches!(
            tracker.claim_action(1_000 + 1999),
            ActionClaim::Suppress { toggle: None }
        ));
    }

    #[test]
    fn click_after_window_passes_through() {
        let tracker = SwipeGestureTracker::<u32>::new();
        confirmed_at(&tracker, 1_000);

        assert!(matches!(
            tracker.claim_action(1_000 + 2001),
            ActionClaim::PassThrough
        ));
    }

    #[test]
    fn click_without_swipe_passes_through() {
        let tracker = SwipeGestureTracker::<u32>::new();
        tracker.on_touch(down(0.0), false, 0);

        assert!(matches!(tracker.claim_action(1), ActionClaim::PassThrough));
    }

    #[test]
    fn new_gesture_rearms_toggle_and_drops_stale_candidate() {
        let tracker = SwipeGestureTracker::<u32>::new();
        let first = confirmed_at(&tracker, 0);
        tracker.claim_action(10);

        let second = confirmed_at(&tracker, 100);
        tracker.attach_candidate(first, 1);

        match tracker.claim_action(110) {
            ActionClaim::Suppress { toggle: Some(candidate) } => assert_eq!(candidate, None),
            other => panic!("unexpected claim: {other:?}"),
        }
        assert_ne!(first, second);
    }

    #[test]
    fn concurrent_claims_toggle_once_per_gesture() {
        let tracker = &SwipeGestureTracker::<u32>::new();
        let barrier = &Barrier::new(8);
        let generation = confirmed_at(tracker, 1_000);
        tracker.attach_candidate(generation, 7);

        let claims: Vec<_> = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(move |_| {
                    scope.spawn(move || {
                        barrier.wait();
                        tracker.claim_action(1_500)
                    })
                })
                .collect();

            workers.into_iter().map(|it| it.join().unwrap()).collect()
        });

        let toggles = claims
            .iter()
            .filter(|claim| matches!(claim, ActionClaim::Suppress { toggle: Some(Some(7)) }))
            .count();
        let suppressed = claims
            .iter()
            .filter(|claim| matches!(claim, ActionClaim::Suppress { .. }))
            .count();

        assert_eq!(toggles, 1);
        assert_eq!(suppressed, 8);
    }
}
