use super::HookContext;
use crate::config::Feature;
use crate::identity::{identity_of, identity_of_content_view};
use crate::reflect::Host;
use crate::reflect::members::{
    CONTAINING_NOTIFICATION, EXPANDED_CHILD, GET_MAX_EXPAND_HEIGHT, GET_MEASURED_HEIGHT,
    IS_HEADS_UP, PRIVATE_LAYOUT,
};
use anyhow::Result;

pub const VISIBLE_TYPE_EXPANDED: i32 = 1;
pub const VISIBLE_TYPE_HEADSUP: i32 = 2;

impl<W: Clone + Send + Sync + 'static> HookContext<W> {
    pub(super) fn skip_row<H: Host<Weak = W> + ?Sized>(&self, host: &mut H, row: &H::Object, feature: Feature) -> bool {
        let app = identity_of(host, row);
        self.gate.should_skip(host, feature, app.as_deref())
    }

    /// Heads-up row that the user has not collapsed; `None` when the
    /// override should not apply.
    fn expanded_heads_up<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<Option<H::Object>> {
        let row = host.this_object()?;

        if self.skip_row(host, &row, Feature::ExpandHeadsUp) {
            return Ok(None);
        }

        if !host.get_bool_field(&row, &IS_HEADS_UP)? || self.collapse.is_collapsed(host, &row) {
            return Ok(None);
        }

        Ok(Some(row))
    }

    /// `setSystemExpanded` and `setSystemChildExpanded` share one rule.
    pub(super) fn before_system_expanded<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        let row = host.this_object()?;
        let skip = self.skip_row(host, &row, Feature::ExpandShade);
        host.set_arg_bool(0, !skip)
    }

    pub(super) fn before_expandable<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        let row = host.this_object()?;

        if self.skip_row(host, &row, Feature::ExpandShade) {
            return Ok(());
        }

        host.set_arg_bool(0, true)
    }

    pub(super) fn before_on_keyguard<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        let row = host.this_object()?;

        if self.skip_row(host, &row, Feature::ExpandLockscreen) {
            return Ok(());
        }

        host.set_arg_bool(0, false)
    }

    pub(super) fn after_visible_type<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        let view = host.this_object()?;
        let app = identity_of_content_view(host, &view);

        if self.gate.should_skip(host, Feature::ExpandHeadsUp, app.as_deref()) {
            return Ok(());
        }

        if !host.get_bool_field(&view, &IS_HEADS_UP)? || host.result_int()? != VISIBLE_TYPE_HEADSUP {
            return Ok(());
        }

        if let Some(row) = host.get_object_field(&view, &CONTAINING_NOTIFICATION)?
            && self.collapse.is_collapsed(host, &row)
        {
            return Ok(());
        }

        if host.get_object_field(&view, &EXPANDED_CHILD)?.is_some() {
            host.set_result_int(VISIBLE_TYPE_EXPANDED)?;
        }

        Ok(())
    }

    pub(super) fn after_intrinsic_height<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        let Some(row) = self.expanded_heads_up(host)? else {
            return Ok(());
        };

        let Some(layout) = host.get_object_field(&row, &PRIVATE_LAYOUT)? else {
            return Ok(());
        };

        let Some(child) = host.get_object_field(&layout, &EXPANDED_CHILD)? else {
            return Ok(());
        };

        let expanded = host.call_int(&child, &GET_MEASURED_HEIGHT)?;

        if expanded > 0 && expanded != host.result_int()? {
            host.set_result_int(expanded)?;
        }

        Ok(())
    }

    pub(super) fn after_pinned_height<H: Host<Weak = W> + ?Sized>(&self, host: &mut H) -> Result<()> {
        let Some(row) = self.expanded_heads_up(host)? else {
            return Ok(());
        };

        let max_expand = host.call_int(&row, &GET_MAX_EXPAND_HEIGHT)?;

        if max_expand > host.result_int()? {
            host.set_result_int(max_expand)?;
        }

        Ok(())
    }
}
