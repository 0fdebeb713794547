mod expansion;
mod headsup;
mod popup;
mod targets;

pub use popup::RowStrategy;
pub use targets::{HookId, HookTarget, Params, Phase, SYSTEMUI_PACKAGE, targets};

use crate::clock::Clock;
use crate::collapse::CollapseState;
use crate::gate::FeatureGate;
use crate::gesture::SwipeGestureTracker;
use crate::marker;
use crate::reflect::Host;
use anyhow::Result;
use autoexpand_common::debug_on;
use autoexpand_common::ext::ResultExt;
use log::debug;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Process-wide state shared by every hook site.
///
/// Created once when the library attaches to the host and alive until the
/// host process exits. Every field is safe to touch from any thread.
pub struct HookContext<W> {
    gate: FeatureGate,
    collapse: CollapseState<W>,
    gesture: SwipeGestureTracker<W>,
    in_set_heads_up: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl<W: Clone + Send + Sync + 'static> HookContext<W> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            gate: FeatureGate::new(Arc::clone(&clock)),
            collapse: CollapseState::new(),
            gesture: SwipeGestureTracker::new(),
            in_set_heads_up: AtomicBool::new(false),
            clock,
        }
    }

    pub fn gate(&self) -> &FeatureGate {
        &self.gate
    }

    pub fn collapse(&self) -> &CollapseState<W> {
        &self.collapse
    }

    pub fn gesture(&self) -> &SwipeGestureTracker<W> {
        &self.gesture
    }

    /// Run the body registered for `id` at `phase`.
    ///
    /// Never fails: any fault leaves the host's own behavior for this call.
    pub fn dispatch<H: Host<Weak = W> + ?Sized>(&self, host: &mut H, id: HookId, phase: Phase) {
        if debug_on!("hooks") {
            debug!("dispatch {id} ({phase})");
        }

        let res = match (id, phase) {
            (HookId::ApplicationCreate, Phase::After) => self.after_application_create(host),
            (HookId::SystemExpanded, Phase::Before) => self.before_system_expanded(host),
            (HookId::SystemChildExpanded, Phase::Before) => self.before_system_expanded(host),
            (HookId::Expandable, Phase::Before) => self.before_expandable(host),
            (HookId::OnKeyguard, Phase::Before) => self.before_on_keyguard(host),
            (HookId::VisibleType, Phase::After) => self.after_visible_type(host),
            (HookId::IntrinsicHeight, Phase::After) => self.after_intrinsic_height(host),
            (HookId::PinnedHeadsUpHeight, Phase::After) => self.after_pinned_height(host),
            (HookId::HeadsUp, Phase::Before) => self.before_heads_up(host),
            (HookId::HeadsUp, Phase::After) => self.after_heads_up(host),
            (HookId::ExpandedWhenPinned, Phase::Before) => self.before_expanded_when_pinned(host),
            (HookId::InterceptTouch, Phase::After) => self.after_intercept_touch(host),
            (HookId::NotificationClicked, Phase::Before) => self.before_notification_action(host),
            (HookId::StartNotificationIntent, Phase::Before) => {
                self.before_notification_action(host)
            }
            (HookId::BackHaptic, Phase::Before) => self.before_back_haptic(host),
            _ => Ok(()),
        };

        if let Err(err) = res {
            debug!("{id} ({phase}) kept host default: {err:?}");
        }
    }

    fn after_application_create<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        let app = host.this_object()?;
        host.bind_context(&app)?;

        marker::publish(host, self.clock.now_millis()).log_if_error();
        self.gate.refresh(host);

        Ok(())
    }
}
