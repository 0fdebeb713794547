use crate::reflect::members::{
    EXPANDED_WHEN_PINNED, GET_INTRINSIC_HEIGHT, GET_PARENT, REQUEST_LAYOUT, SET_ACTUAL_HEIGHT,
};
use crate::reflect::{Arg, Reflect};
use anyhow::Result;
use autoexpand_common::ext::ResultExt;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Inserts between full sweeps of reclaimed rows.
const SWEEP_INTERVAL: usize = 64;

struct Slot<W> {
    row: W,
    collapsed: AtomicBool,
}

/// Per-row "collapsed" attribute the host type has no field for.
///
/// Keyed by identity hash and matched by weak reference, so an entry
/// never keeps its row alive and is dropped once the row is reclaimed.
pub struct CollapseState<W> {
    buckets: RwLock<HashMap<i32, Vec<Slot<W>>>>,
    inserts: AtomicUsize,
}

impl<W> Default for CollapseState<W> {
    fn default() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            inserts: AtomicUsize::new(0),
        }
    }
}

impl<W: Clone + Send + Sync + 'static> CollapseState<W> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup<R, T>(&self, rt: &mut R, hash: i32, row: &R::Object, f: impl FnOnce(&Slot<W>) -> T) -> Option<T>
    where
        R: Reflect<Weak = W> + ?Sized,
    {
        let buckets = self.buckets.read();
        let slot = buckets.get(&hash)?.iter().find(|slot| rt.refers_to(&slot.row, row))?;
        Some(f(slot))
    }

    /// Defaults to expanded for rows never seen before.
    pub fn is_collapsed<R>(&self, rt: &mut R, row: &R::Object) -> bool
    where
        R: Reflect<Weak = W> + ?Sized,
    {
        let Some(hash) = rt.identity_hash(row).ok_or_debug() else {
            return false;
        };

        self.lookup(rt, hash, row, |slot| slot.collapsed.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    pub fn set_collapsed<R>(&self, rt: &mut R, row: &R::Object, collapsed: bool) -> Result<()>
    where
        R: Reflect<Weak = W> + ?Sized,
    {
        let hash = rt.identity_hash(row)?;

        let stored = self.lookup(rt, hash, row, |slot| {
            slot.collapsed.store(collapsed, Ordering::Release)
        });

        if stored.is_some() {
            return Ok(());
        }

        let weak = rt.downgrade(row)?;
        let mut buckets = self.buckets.write();

        let bucket = buckets.entry(hash).or_default();
        bucket.retain(|slot| !rt.is_collected(&slot.row));

        match bucket.iter().find(|slot| rt.refers_to(&slot.row, row)) {
            Some(slot) => slot.collapsed.store(collapsed, Ordering::Release),
            None => {
                bucket.push(Slot {
                    row: weak,
                    collapsed: AtomicBool::new(collapsed),
                });

                let inserted = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;

                if inserted % SWEEP_INTERVAL == 0 {
                    Self::sweep(rt, &mut buckets);
                }
            }
        }

        Ok(())
    }

    /// Drop every reclaimed row, and the buckets left empty.
    pub fn prune<R>(&self, rt: &mut R)
    where
        R: Reflect<Weak = W> + ?Sized,
    {
        Self::sweep(rt, &mut self.buckets.write());
    }

    fn sweep<R>(rt: &mut R, buckets: &mut HashMap<i32, Vec<Slot<W>>>)
    where
        R: Reflect<Weak = W> + ?Sized,
    {
        let before = buckets.len();

        buckets.retain(|_, bucket| {
            bucket.retain(|slot| !rt.is_collected(&slot.row));
            !bucket.is_empty()
        });

        debug!("collapse table swept: {before} -> {} buckets", buckets.len());
    }

    pub fn tracked_rows(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }

    /// Flip a heads-up row between expanded and collapsed and resize it now.
    ///
    /// Returns the new collapsed state.
    pub fn toggle<R>(&self, rt: &mut R, row: &R::Object) -> Result<bool>
    where
        R: Reflect<Weak = W> + ?Sized,
    {
        let expanded = self.is_collapsed(rt, row);

        // height hooks read the side table, so it goes first
        self.set_collapsed(rt, row, !expanded)?;
        rt.set_bool_field(row, &EXPANDED_WHEN_PINNED, expanded)?;

        let height = rt.call_int(row, &GET_INTRINSIC_HEIGHT)?;

        // notifyHeightChanged alone does not resize the floating window on every build
        rt.call_void(row, &SET_ACTUAL_HEIGHT, &[Arg::Int(height)])?;
        rt.call_void(row, &REQUEST_LAYOUT, &[])?;

        if let Some(parent) = rt.call_object(row, &GET_PARENT).ok_or_debug().flatten() {
            rt.call_void(&parent, &REQUEST_LAYOUT, &[]).ok_or_debug();
        }

        debug!("heads-up toggled: expanded = {expanded}, height = {height}");

        Ok(!expanded)
    }
}
