use super::HookContext;
use crate::config::Feature;
use crate::gesture::{ActionClaim, TouchAction};
use crate::reflect::Host;
use crate::reflect::members::{GET_ROW, GET_TOUCHING_HEADS_UP_VIEW};
use anyhow::Result;
use autoexpand_common::ext::ResultExt;
use log::debug;
use strum_macros::Display;

const ROW_CLASS_HINT: &str = "ExpandableNotificationRow";
const ENTRY_CLASS_HINT: &str = "NotificationEntry";

/// Ways to find the banner row a suppressed click belonged to, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RowStrategy {
    RowArgument,
    EntryArgument,
    TrackedRow,
}

impl RowStrategy {
    pub const ORDER: [RowStrategy; 3] = [
        RowStrategy::RowArgument,
        RowStrategy::EntryArgument,
        RowStrategy::TrackedRow,
    ];

    fn find_argument<H: Host + ?Sized>(
        host: &mut H,
        args: &[Option<H::Object>],
        hint: &str,
    ) -> Option<usize> {
        args.iter().position(|arg| {
            arg.as_ref()
                .and_then(|arg| host.class_name(arg).ok_or_debug())
                .is_some_and(|name| name.contains(hint))
        })
    }

    fn attempt<H: Host + ?Sized>(
        self,
        host: &mut H,
        args: &mut [Option<H::Object>],
        tracked: Option<&H::Weak>,
    ) -> Option<H::Object> {
        match self {
            RowStrategy::RowArgument => {
                let index = Self::find_argument(host, args, ROW_CLASS_HINT)?;
                args[index].take()
            }
            RowStrategy::EntryArgument => {
                let index = Self::find_argument(host, args, ENTRY_CLASS_HINT)?;
                let entry = args[index].as_ref()?;
                host.call_object(entry, &GET_ROW).ok_or_debug().flatten()
            }
            RowStrategy::TrackedRow => host.upgrade(tracked?),
        }
    }

    pub fn recover<H: Host + ?Sized>(
        host: &mut H,
        mut args: Vec<Option<H::Object>>,
        tracked: Option<&H::Weak>,
    ) -> Option<H::Object> {
        Self::ORDER.into_iter().find_map(|strategy| {
            let row = strategy.attempt(host, &mut args, tracked)?;
            debug!("banner row recovered via {strategy}");
            Some(row)
        })
    }
}

impl<W: Clone + Send + Sync + 'static> HookContext<W> {
    pub(super) fn after_intercept_touch<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        if !self.gate.is_enabled(host, Feature::DisableHeadsUpPopup) {
            return Ok(());
        }

        let event = host.arg_touch(0)?;
        let intercepting = event.action == TouchAction::Move && host.result_bool()?;

        let Some(generation) = self
            .gesture
            .on_touch(event, intercepting, self.clock.now_millis())
        else {
            return Ok(());
        };

        // the touched row is optional, a click may still carry one
        let helper = host.this_object()?;
        let candidate = host
            .call_object(&helper, &GET_TOUCHING_HEADS_UP_VIEW)
            .ok_or_debug()
            .flatten()
            .and_then(|row| host.downgrade(&row).ok_or_debug());

        if let Some(row) = candidate {
            self.gesture.attach_candidate(generation, row);
        }

        Ok(())
    }

    /// `onNotificationClicked` and `startNotificationIntent` share one rule.
    pub(super) fn before_notification_action<H: Host<Weak = W> + ?Sized>(
        &self,
        host: &mut H,
    ) -> Result<()> {
        if !self.gate.is_enabled(host, Feature::DisableHeadsUpPopup) {
            return Ok(());
        }

        let ActionClaim::Suppress { toggle } = self.gesture.claim_action(self.clock.now_millis())
        else {
            return Ok(());
        };

        host.skip_original()?;

        let Some(tracked) = toggle else {
            return Ok(());
        };

        let args = host.args().ok_or_debug().unwrap_or_default();

        match RowStrategy::recover(host, args, tracked.as_ref()) {
            Some(row) => {
                self.collapse.toggle(host, &row).ok_or_warn();
            }
            None => debug!("swipe suppressed a click but no banner row was found"),
        }

        Ok(())
    }

    pub(super) fn before_back_haptic<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        if self.gate.is_enabled(host, Feature::DisableBackHaptic) {
            host.skip_original()?;
        }

        Ok(())
    }
}
