//! Messages published on the [`MessageBus`](crate::bus::MessageBus) by the core.
//!
//! Engine subsystems define their own message types next to the code that
//! publishes them.

use crate::geo::MapPoint;
use crate::runtime::RunnerState;

/// The avatar moved; published once per changed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPositionChanged {
    pub point: MapPoint,
}

/// The runner entered a new lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerStateChanged {
    pub from: RunnerState,
    pub to: RunnerState,
}
