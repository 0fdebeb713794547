use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

pub const REFRESH_INTERVAL_MS: u64 = 2000;
pub const EXCLUDED_APPS_KEY: &str = "excluded_apps";

const NEVER: u64 = u64::MAX;

/// Boolean switches published by the companion app, named by their storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum Feature {
    #[strum(serialize = "expand_shade_enabled")]
    ExpandShade,
    #[strum(serialize = "expand_headsup_enabled")]
    ExpandHeadsUp,
    #[strum(serialize = "expand_lockscreen_enabled")]
    ExpandLockscreen,
    #[strum(serialize = "disable_back_haptic_enabled")]
    DisableBackHaptic,
    #[strum(serialize = "disable_headsup_popup_enabled")]
    DisableHeadsUpPopup,
}

impl Feature {
    pub fn key(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RowKind {
    Bool,
    StringSet,
    String,
}

/// One `(key, type, value)` row of the configuration table, as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    pub key: String,
    pub kind: String,
    pub value: String,
}

impl ConfigRow {
    pub fn new(key: impl Into<String>, kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// The companion's configuration table.
pub trait ConfigSource {
    fn fetch(&mut self) -> Result<Vec<ConfigRow>>;

    /// A source that cannot reach the table yet leaves the refresh window open.
    fn is_ready(&self) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone)]
pub struct CacheSnapshot {
    flags: HashMap<String, bool>,
    excluded: HashSet<String>,
    fetched_at: Option<u64>,
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => bail!("invalid bool value: {value:?}"),
    }
}

fn parse_string_set(value: &str) -> HashSet<String> {
    if value.is_empty() {
        return HashSet::new();
    }

    value.split('\n').map(Into::into).collect()
}

impl CacheSnapshot {
    pub fn from_rows(rows: &[ConfigRow], fetched_at: u64) -> Result<Self> {
        let mut flags = HashMap::new();
        let mut excluded = HashSet::new();

        for row in rows {
            let kind = RowKind::from_str(&row.kind)
                .with_context(|| format!("unknown row type {:?} for key {:?}", row.kind, row.key))?;

            match kind {
                RowKind::Bool => {
                    let value = parse_bool(&row.value)
                        .with_context(|| format!("malformed row for key {:?}", row.key))?;
                    flags.insert(row.key.clone(), value);
                }
                RowKind::StringSet if row.key == EXCLUDED_APPS_KEY => {
                    excluded = parse_string_set(&row.value);
                }
                RowKind::StringSet | RowKind::String => (),
            }
        }

        Ok(Self {
            flags,
            excluded,
            fetched_at: Some(fetched_at),
        })
    }

    /// Absent keys read as enabled.
    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.flags.get(feature.key()).copied().unwrap_or(true)
    }

    pub fn is_excluded(&self, app: &str) -> bool {
        self.excluded.contains(app)
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    pub fn fetched_at(&self) -> Option<u64> {
        self.fetched_at
    }
}

/// Last good snapshot of the configuration table, refreshed lazily.
pub struct ConfigCache {
    snapshot: RwLock<Arc<CacheSnapshot>>,
    last_attempt: AtomicU64,
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigCache {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::default()),
            last_attempt: AtomicU64::new(NEVER),
        }
    }

    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    // Only the caller that wins the timestamp swap performs the fetch.
    fn claim(&self, now: u64) -> bool {
        let mut last = self.last_attempt.load(Ordering::Acquire);

        loop {
            if last != NEVER && now.saturating_sub(last) < REFRESH_INTERVAL_MS {
                return false;
            }

            match self.last_attempt.compare_exchange_weak(
                last,
                now,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(current) => last = current,
            }
        }
    }

    pub fn refresh_if_stale<S: ConfigSource + ?Sized>(&self, now: u64, source: &mut S) {
        if !source.is_ready() {
            debug!("config source not ready, refresh deferred");
            return;
        }

        if !self.claim(now) {
            return;
        }

        let res = source
            .fetch()
            .and_then(|rows| CacheSnapshot::from_rows(&rows, now));

        match res {
            Ok(snapshot) => {
                let changed = {
                    let current = self.snapshot.read();
                    current.flags != snapshot.flags || current.excluded != snapshot.excluded
                };

                if changed {
                    info!(
                        "config updated: {} flags, {} excluded apps",
                        snapshot.flags.len(),
                        snapshot.excluded_count()
                    );
                } else {
                    debug!("config refreshed, unchanged");
                }

                *self.snapshot.write() = Arc::new(snapshot);
            }
            Err(err) => {
                warn!("failed to refresh config, keeping previous snapshot: {err:?}");
            }
        }
    }
}
