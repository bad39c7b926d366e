//! Per-frame bridge from the host's avatar position to the runner.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::geo::{HostPosition, MapPoint};
use crate::runtime::GameRunner;

/// Detects avatar movement between frames.
///
/// Positions are compared by exact value; there is no tolerance.
#[derive(Debug, Clone)]
pub struct HostLoopAdapter {
    last: HostPosition,
}

impl Default for HostLoopAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HostLoopAdapter {
    pub fn new() -> Self {
        Self {
            last: HostPosition::UNSET,
        }
    }

    pub fn last(&self) -> HostPosition {
        self.last
    }

    /// Call once per frame. Returns true when a change was forwarded.
    ///
    /// A panic raised while the engine handles the update is logged and
    /// contained here so it never unwinds into the host's frame loop.
    pub fn tick(&mut self, runner: &GameRunner, current: HostPosition) -> bool {
        if current == self.last {
            return false;
        }
        self.last = current;

        let point = MapPoint::from(current);
        let outcome = catch_unwind(AssertUnwindSafe(|| runner.on_position_changed(point)));
        if let Err(payload) = outcome {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(?point, %reason, "Position update panicked");
        }
        true
    }
}
