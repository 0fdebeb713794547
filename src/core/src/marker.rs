use crate::reflect::SettingsStore;
use anyhow::{Context, Result};
use log::info;

pub const ACTIVE_MARKER_SETTING: &str = "autoexpand_active";

const BOOT_SKEW_MS: u64 = 60_000;

/// Record that hooks are installed in this boot cycle.
pub fn publish<S: SettingsStore + ?Sized>(store: &mut S, now: u64) -> Result<()> {
    store
        .put_global_string(ACTIVE_MARKER_SETTING, &now.to_string())
        .context("failed to write active marker")?;

    info!("active marker published: {now}");
    Ok(())
}

/// Whether a stored marker was written since the current boot started,
/// tolerating up to a minute of skew between the two clocks.
pub fn is_active(stored: Option<&str>, now: u64, elapsed_since_boot: u64) -> bool {
    let Some(marker) = stored.and_then(|it| it.trim().parse::<u64>().ok()) else {
        return false;
    };

    let boot_time = now.saturating_sub(elapsed_since_boot);
    marker >= boot_time.saturating_sub(BOOT_SKEW_MS)
}
