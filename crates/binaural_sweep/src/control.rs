//! Getting control changes onto the audio thread and the azimuth back off it.
//!
//! Setting the sweep, the jump level, and the wrap mode are independent of each other, and only the latest value of
//! each matters.  So rather than a list of commands, changes are coalesced into one [ControlPatch] of optional fields.
//! The handle builds a patch locally and pushes it onto a small lock-free queue; if the queue is full the patch stays
//! local, keeps absorbing changes, and goes out on the next attempt.  The engine pops everything queued at the start of
//! each block, merges it, and applies the result, so every block sees one consistent state.
//!
//! The azimuth travels the other way through an atomic which only the audio thread writes.
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use thingbuf::{recycling::Recycle, ThingBuf};

use crate::azimuth::{AzimuthController, ControlError, JumpLevel, SweepBounds, WrapMode};
use crate::config::CONTROL_QUEUE_LEN;

/// Given two fields, return the newer one if it is set.
fn merge_opts<T>(older: Option<T>, newer: Option<T>) -> Option<T> {
    newer.or(older)
}

/// Changes to apply at the next block boundary.  Unset fields leave the current value alone.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ControlPatch {
    pub sweep: Option<SweepBounds>,
    pub jump: Option<JumpLevel>,
    pub mode: Option<WrapMode>,
}

impl ControlPatch {
    /// Merge with `newer`, so that the result has `newer`'s fields where they are set and ours elsewhere.
    pub fn merge_newer(self, newer: ControlPatch) -> ControlPatch {
        ControlPatch {
            sweep: merge_opts(self.sweep, newer.sweep),
            jump: merge_opts(self.jump, newer.jump),
            mode: merge_opts(self.mode, newer.mode),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ControlPatch::default()
    }

    pub(crate) fn apply(self, controller: &mut AzimuthController) {
        if let Some(bounds) = self.sweep {
            controller.set_bounds(bounds);
        }
        if let Some(jump) = self.jump {
            controller.set_jump(jump);
        }
        if let Some(mode) = self.mode {
            controller.set_mode(mode);
        }
    }
}

/// Queue slots are `Option` only because thingbuf needs a recycler; only `Some` is ever pushed.
#[derive(Default)]
struct EmptySlots;

impl Recycle<Option<ControlPatch>> for EmptySlots {
    fn new_element(&self) -> Option<ControlPatch> {
        None
    }

    fn recycle(&self, element: &mut Option<ControlPatch>) {
        *element = None;
    }
}

struct Shared {
    patches: ThingBuf<Option<ControlPatch>, EmptySlots>,
    azimuth: AtomicI32,
}

/// The engine's side of the channel.
pub(crate) struct ControlReceiver {
    shared: Arc<Shared>,
}

/// Changes the sweep of a running [crate::Engine] from any thread.
///
/// Changes take effect at the engine's next block boundary.  There is one handle per engine; it is `Send`, so move it
/// to whichever thread owns the controls.
pub struct ControlHandle {
    shared: Arc<Shared>,

    /// Changes not yet on the queue, because the engine has not made room for them yet.
    pending: Option<ControlPatch>,
}

pub(crate) fn control_channel(initial_azimuth: i32) -> (ControlHandle, ControlReceiver) {
    let shared = Arc::new(Shared {
        patches: ThingBuf::with_recycle(CONTROL_QUEUE_LEN, EmptySlots),
        azimuth: AtomicI32::new(initial_azimuth),
    });

    (
        ControlHandle {
            shared: shared.clone(),
            pending: None,
        },
        ControlReceiver { shared },
    )
}

impl ControlReceiver {
    /// Everything queued since the last call, merged.  Never blocks.
    pub(crate) fn take_patch(&self) -> ControlPatch {
        let mut ret = ControlPatch::default();
        while let Some(p) = self.shared.patches.pop() {
            if let Some(p) = p {
                ret = ret.merge_newer(p);
            }
        }
        ret
    }

    pub(crate) fn publish_azimuth(&self, azimuth: i32) {
        self.shared.azimuth.store(azimuth, Ordering::Relaxed);
    }
}

impl ControlHandle {
    fn pending_mut(&mut self) -> &mut ControlPatch {
        self.pending.get_or_insert_with(Default::default)
    }

    /// Sweep between `start` and `finish` degrees, restarting at `start`.
    pub fn set_sweep(&mut self, start: i32, finish: i32) -> Result<(), ControlError> {
        self.pending_mut().sweep = Some(SweepBounds::new(start, finish)?);
        self.flush();
        Ok(())
    }

    pub fn set_jump_level(&mut self, level: u8) -> Result<(), ControlError> {
        self.pending_mut().jump = Some(JumpLevel::new(level)?);
        self.flush();
        Ok(())
    }

    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.pending_mut().mode = Some(mode);
        self.flush();
    }

    /// Merge a whole patch at once.
    pub fn send(&mut self, patch: ControlPatch) {
        let merged = self.pending.take().unwrap_or_default().merge_newer(patch);
        self.pending = Some(merged);
        self.flush();
    }

    /// Try to get pending changes onto the queue.
    ///
    /// Returns `true` if nothing is left pending.  Called by every setter; call it directly to retry after the queue was
    /// full.
    pub fn flush(&mut self) -> bool {
        let Some(p) = self.pending.as_ref() else {
            return true;
        };

        if p.is_empty() || self.shared.patches.push(Some(p.clone())).is_ok() {
            self.pending = None;
            return true;
        }

        log::debug!("Control queue is full; holding changes until the engine catches up");
        false
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The azimuth most recently published by the engine.
    pub fn current_azimuth(&self) -> i32 {
        self.shared.azimuth.load(Ordering::Relaxed)
    }
}
