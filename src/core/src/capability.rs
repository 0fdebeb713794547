use crate::reflect::Member;
use anyhow::{Result, bail};
use log::warn;
use parking_lot::RwLock;
use std::collections::HashSet;

/// Remembers host members that turned out to be absent on this build.
///
/// The first failure is reported at `warn`; afterwards the member is a
/// known no-op path and lookups fail fast without touching the host.
#[derive(Default)]
pub struct MemberProbe {
    missing: RwLock<HashSet<Member>>,
}

impl MemberProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(&self, member: &Member) -> Result<()> {
        if self.missing.read().contains(member) {
            bail!("{member} is unavailable on this build");
        }
        Ok(())
    }

    pub fn mark_missing(&self, member: &Member) {
        if self.missing.write().insert(*member) {
            warn!("host member {member} not found, dependent overrides disabled");
        }
    }

    pub fn is_missing(&self, member: &Member) -> bool {
        self.missing.read().contains(member)
    }
}
