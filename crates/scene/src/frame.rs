use crate::viewport::Viewport;
use std::time::{Duration, Instant};

/// Monotonic clock started once when the driver becomes ready.
///
/// Elapsed time is always `now - start`, so a dropped frame shows up as a
/// larger step on the next read rather than as accumulated drift.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn starting_at(start: Instant) -> Self {
        Self { start }
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }
}

/// Lifecycle of the frame driver. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Ready,
    Rendering,
}

/// Everything a renderer needs to know about the frame being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the driver became ready.
    pub elapsed: f32,
    pub viewport: Viewport,
    pub frame_index: u64,
}

/// Host-side frame loop state: lifecycle, clock and current backing size.
#[derive(Debug)]
pub struct FrameDriver {
    state: DriverState,
    clock: Option<FrameClock>,
    viewport: Viewport,
    frames: u64,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Uninitialized,
            clock: None,
            viewport: Viewport { width: 1, height: 1 },
            frames: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Resources exist; start the clock. Repeated calls keep the first start time.
    pub fn mark_ready(&mut self, viewport: Viewport, now: Instant) {
        if self.state == DriverState::Uninitialized {
            self.clock = Some(FrameClock::starting_at(now));
            self.state = DriverState::Ready;
            tracing::info!(
                width = viewport.width,
                height = viewport.height,
                "frame driver ready"
            );
        }
        self.viewport = viewport;
    }

    /// Record a new backing size. Returns whether it changed.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        let changed = self.viewport != viewport;
        self.viewport = viewport;
        changed
    }

    /// Start a frame at `now`. Returns `None` until the driver is ready.
    pub fn begin_frame(&mut self, now: Instant) -> Option<FrameInput> {
        let clock = self.clock?;
        if self.state == DriverState::Ready {
            tracing::debug!("first frame");
            self.state = DriverState::Rendering;
        }
        let input = FrameInput {
            elapsed: clock.elapsed_at(now).as_secs_f32(),
            viewport: self.viewport,
            frame_index: self.frames,
        };
        self.frames += 1;
        Some(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frames_before_ready() {
        let mut driver = FrameDriver::new();
        assert_eq!(driver.state(), DriverState::Uninitialized);
        assert!(driver.begin_frame(Instant::now()).is_none());
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn lifecycle_transitions() {
        let start = Instant::now();
        let mut driver = FrameDriver::new();
        let vp = Viewport { width: 640, height: 480 };
        driver.mark_ready(vp, start);
        assert_eq!(driver.state(), DriverState::Ready);

        let frame = driver.begin_frame(start + Duration::from_millis(500)).unwrap();
        assert_eq!(driver.state(), DriverState::Rendering);
        assert_eq!(frame.frame_index, 0);
        assert!((frame.elapsed - 0.5).abs() < 1e-6);
        assert_eq!(frame.viewport, vp);
    }

    #[test]
    fn elapsed_is_read_fresh_not_accumulated() {
        let start = Instant::now();
        let mut driver = FrameDriver::new();
        driver.mark_ready(Viewport { width: 1, height: 1 }, start);
        driver.begin_frame(start + Duration::from_millis(16));
        // A long stall: the next frame simply sees the later time.
        let late = driver.begin_frame(start + Duration::from_secs(3)).unwrap();
        assert!((late.elapsed - 3.0).abs() < 1e-6);
        assert_eq!(late.frame_index, 1);
    }

    #[test]
    fn ready_twice_keeps_first_clock() {
        let start = Instant::now();
        let mut driver = FrameDriver::new();
        let vp = Viewport { width: 10, height: 10 };
        driver.mark_ready(vp, start);
        driver.mark_ready(vp, start + Duration::from_secs(5));
        let frame = driver.begin_frame(start + Duration::from_secs(6)).unwrap();
        assert!((frame.elapsed - 6.0).abs() < 1e-6);
    }

    #[test]
    fn resize_reports_changes_only() {
        let mut driver = FrameDriver::new();
        let vp = Viewport { width: 800, height: 600 };
        assert!(driver.resize(vp));
        assert!(!driver.resize(vp));
        assert_eq!(driver.viewport(), vp);
    }
}
