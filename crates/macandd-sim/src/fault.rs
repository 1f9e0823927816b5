//! One-shot fault injection for the simulated device.

/// Device operation a fault can be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    /// Record slot erase.
    Erase,
    /// Record slot write.
    Write,
    /// Record slot read.
    Read,
    /// Mac-and-Destroy call.
    Oracle,
    /// Random byte generation.
    Random,
}

/// What happens when a fault fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultMode {
    /// The operation does nothing and reports an error.
    Fail,
    /// The operation completes, then the device loses power: the call reports
    /// an error and the secure session is gone.
    PowerLossAfter,
}

#[derive(Clone, Copy, Debug)]
struct Pending {
    op: Op,
    skip: usize,
    mode: FaultMode,
}

/// Set of armed faults.
#[derive(Clone, Debug, Default)]
pub struct FaultPlan {
    pending: Vec<Pending>,
}

impl FaultPlan {
    /// Let `skip` calls of `op` through, then fire `mode` on the next one.
    pub fn arm(&mut self, op: Op, skip: usize, mode: FaultMode) {
        self.pending.push(Pending { op, skip, mode });
    }

    /// Account for one call of `op`; returns the fault to apply, if any.
    ///
    /// Every armed fault for `op` counts the call. When several fire on the
    /// same call, the first armed wins and the rest are discarded too.
    pub fn on_call(&mut self, op: Op) -> Option<FaultMode> {
        let mut fired = None;
        self.pending.retain_mut(|p| {
            if p.op != op {
                return true;
            }
            if p.skip == 0 {
                fired = fired.or(Some(p.mode));
                return false;
            }
            p.skip = p.skip.saturating_sub(1);
            true
        });
        fired
    }

    /// Drop every armed fault.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Returns `true` if no fault is armed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
