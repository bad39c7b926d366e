//! Headless stand-in for the host engine's frame loop.

use std::time::Duration;

use mapkit::{GameRunner, HostLoopAdapter, HostPosition};
use tokio::time::MissedTickBehavior;

/// Simulated avatar walking a slow spiral; it pauses every other frame so
/// unchanged positions are exercised too.
#[derive(Debug, Clone)]
pub struct Avatar {
    position: HostPosition,
    speed: f32,
    frame: u64,
}

impl Avatar {
    pub fn new(speed: f32) -> Self {
        Self {
            position: HostPosition::new(0.0, 0.0, 0.0),
            speed,
            frame: 0,
        }
    }

    pub fn position(&self) -> HostPosition {
        self.position
    }

    /// Advance one frame and return the position the host would report.
    pub fn advance(&mut self) -> HostPosition {
        self.frame += 1;
        if self.frame % 2 == 0 {
            let heading = self.frame as f32 * 0.01;
            self.position.x += self.speed * heading.cos();
            self.position.z += self.speed * heading.sin();
        }
        self.position
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameLoopOptions {
    pub frame_rate: u32,
    pub max_frames: Option<u64>,
    pub speed: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub updates: u64,
}

/// Tick the runner at a fixed rate until `max_frames` or a shutdown signal.
pub async fn run_frames(runner: &GameRunner, opts: FrameLoopOptions) -> FrameStats {
    let period = Duration::from_secs_f64(1.0 / f64::from(opts.frame_rate.max(1)));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut adapter = HostLoopAdapter::new();
    let mut avatar = Avatar::new(opts.speed);
    let mut stats = FrameStats::default();

    let shutdown = mapkit_bootstrap::wait_for_shutdown();
    tokio::pin!(shutdown);

    tracing::info!(frame_rate = opts.frame_rate, max_frames = ?opts.max_frames, "Frame loop started");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                if adapter.tick(runner, avatar.advance()) {
                    stats.updates += 1;
                }
                stats.frames += 1;
                if opts.max_frames.is_some_and(|max| stats.frames >= max) {
                    break;
                }
            }
        }
    }
    tracing::info!(frames = stats.frames, updates = stats.updates, "Frame loop stopped");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_moves_every_other_frame() {
        let mut avatar = Avatar::new(1.0);
        let first = avatar.advance();
        let second = avatar.advance();
        let third = avatar.advance();

        assert_eq!(first, HostPosition::new(0.0, 0.0, 0.0));
        assert_ne!(second, first);
        assert_eq!(third, second);
        assert_eq!(avatar.position(), third);
        assert_eq!(third.y, 0.0);
    }

    #[tokio::test]
    async fn loop_stops_after_max_frames() {
        use mapkit::{BootstrapperService, Container, MessageBus, PluginRegistry, SequentialBootstrapper};
        use std::sync::Arc;

        let container = Arc::new(Container::new());
        container
            .register_instance::<dyn BootstrapperService>(Arc::new(SequentialBootstrapper::new()))
            .unwrap();
        let mut runner = GameRunner::new(
            container,
            Arc::new(MessageBus::new()),
            PluginRegistry::builder().build().unwrap(),
        )
        .unwrap();
        runner.start().unwrap();

        let stats = run_frames(
            &runner,
            FrameLoopOptions {
                frame_rate: 1000,
                max_frames: Some(4),
                speed: 2.0,
            },
        )
        .await;

        // Frames 1, 2 and 4 report a new position; frame 3 repeats frame 2.
        assert_eq!(stats, FrameStats { frames: 4, updates: 3 });
    }
}
