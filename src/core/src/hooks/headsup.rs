use super::HookContext;
use crate::config::Feature;
use crate::reflect::members::{EXPANDED_WHEN_PINNED, NOTIFY_HEIGHT_CHANGED};
use crate::reflect::{Arg, Host};
use anyhow::Result;
use autoexpand_common::ext::ResultExt;
use std::sync::atomic::Ordering;

impl<W: Clone + Send + Sync + 'static> HookContext<W> {
    pub(super) fn before_heads_up<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        if !host.arg_bool(0)? {
            return Ok(());
        }

        let row = host.this_object()?;

        if self.skip_row(host, &row, Feature::ExpandHeadsUp) {
            return Ok(());
        }

        // the host flips mExpandedWhenPinned while it initialises the banner
        self.in_set_heads_up.store(true, Ordering::Release);
        self.collapse.set_collapsed(host, &row, false)?;
        host.set_bool_field(&row, &EXPANDED_WHEN_PINNED, true)
            .ok_or_debug();

        Ok(())
    }

    pub(super) fn after_heads_up<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        if !host.arg_bool(0)? {
            return Ok(());
        }

        self.in_set_heads_up.store(false, Ordering::Release);

        let row = host.this_object()?;

        if self.skip_row(host, &row, Feature::ExpandHeadsUp) {
            return Ok(());
        }

        host.set_bool_field(&row, &EXPANDED_WHEN_PINNED, true)?;
        host.call_void(&row, &NOTIFY_HEIGHT_CHANGED, &[Arg::Bool(false)])
    }

    pub(super) fn before_expanded_when_pinned<H: Host<Weak = W> + ?Sized>(
        &self,
        host: &mut H,
    ) -> Result<()> {
        if self.in_set_heads_up.load(Ordering::Acquire) {
            return Ok(());
        }

        let expanded = host.arg_bool(0)?;
        let row = host.this_object()?;

        self.collapse.set_collapsed(host, &row, !expanded)
    }
}
