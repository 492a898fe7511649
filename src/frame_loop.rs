//! Self-rescheduling filter loop.
//!
//! Each display refresh the loop draws the active source's frame onto the surface, reads the
//! pixels back, runs the active [`Filter`] over them and commits the result. It then asks the
//! scheduler for the next refresh. Failures inside one iteration only skip that iteration.

use std::time::{Duration, Instant};

use crate::{
    filter::{Filter, apply_filter_rgba8_in_place},
    foundation::core::FrameRgba,
    surface::DisplaySurface,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRequestId(pub u64);

/// Display refresh callback registry (the `requestAnimationFrame` contract).
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequestId;
    fn cancel_frame(&mut self, id: FrameRequestId);
}

/// Scheduler whose refresh ticks are fired explicitly by the caller.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Vec<FrameRequestId>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[FrameRequestId] {
        &self.pending
    }

    /// Fire one refresh: every request registered so far becomes due, requests made while
    /// handling them wait for the next refresh.
    pub fn take_due(&mut self) -> Vec<FrameRequestId> {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        self.next_id += 1;
        let id = FrameRequestId(self.next_id);
        self.pending.push(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.pending.retain(|p| *p != id);
    }
}

/// Fixed-rate scheduler on a monotonic clock.
#[derive(Clone, Debug)]
pub struct IntervalScheduler {
    inner: ManualScheduler,
    interval: Duration,
    next_tick: Instant,
}

impl IntervalScheduler {
    pub fn new(fps: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        Self {
            inner: ManualScheduler::new(),
            interval,
            next_tick: Instant::now() + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next refresh and return the requests due on it.
    pub fn wait_for_tick(&mut self) -> Vec<FrameRequestId> {
        let now = Instant::now();
        if self.next_tick > now {
            std::thread::sleep(self.next_tick - now);
        }
        // Missed ticks are dropped rather than replayed back to back.
        self.next_tick = self.next_tick.max(Instant::now()) + self.interval;
        self.inner.take_due()
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_frame(&mut self) -> FrameRequestId {
        self.inner.request_frame()
    }

    fn cancel_frame(&mut self, id: FrameRequestId) {
        self.inner.cancel_frame(id);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    ZeroAreaSurface,
    NoFrame,
    CaptureFailed,
    CommitFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IterationOutcome {
    Rendered,
    Skipped(SkipReason),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FrameLoopStats {
    pub iterations: u64,
    pub rendered: u64,
    pub skipped: u64,
    pub stale_callbacks: u64,
    pub restarts: u64,
}

/// Capture, filter and commit one frame. Never fails; problems become a skip.
pub fn run_iteration(
    frame: Option<&FrameRgba>,
    filter: Filter,
    surface: &mut dyn DisplaySurface,
    scratch: &mut Vec<u8>,
) -> IterationOutcome {
    if surface.size().is_empty() {
        return IterationOutcome::Skipped(SkipReason::ZeroAreaSurface);
    }
    let Some(frame) = frame else {
        return IterationOutcome::Skipped(SkipReason::NoFrame);
    };

    if let Err(e) = surface
        .draw_frame_scaled(frame)
        .and_then(|()| surface.read_pixels(scratch))
    {
        tracing::debug!(error = %e, "frame capture failed");
        return IterationOutcome::Skipped(SkipReason::CaptureFailed);
    }

    if let Err(e) = apply_filter_rgba8_in_place(scratch, filter)
        .and_then(|()| surface.write_pixels(scratch))
    {
        tracing::debug!(error = %e, "frame commit failed");
        return IterationOutcome::Skipped(SkipReason::CommitFailed);
    }
    IterationOutcome::Rendered
}

/// The loop's lifecycle: at most one pending refresh request exists at any time.
#[derive(Debug, Default)]
pub struct FrameLoop {
    running: bool,
    pending: Option<FrameRequestId>,
    scratch: Vec<u8>,
    stats: FrameLoopStats,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pending(&self) -> Option<FrameRequestId> {
        self.pending
    }

    pub fn stats(&self) -> FrameLoopStats {
        self.stats
    }

    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.running {
            return;
        }
        self.running = true;
        self.pending = Some(scheduler.request_frame());
        tracing::debug!("frame loop started");
    }

    /// Drop the in-flight request and begin a fresh capture context.
    pub fn restart(&mut self, scheduler: &mut dyn FrameScheduler) {
        if !self.running {
            return;
        }
        if let Some(id) = self.pending.take() {
            scheduler.cancel_frame(id);
        }
        self.pending = Some(scheduler.request_frame());
        self.stats.restarts += 1;
        tracing::debug!(restarts = self.stats.restarts, "frame loop restarted");
    }

    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel_frame(id);
        }
        if self.running {
            tracing::debug!(iterations = self.stats.iterations, "frame loop stopped");
        }
        self.running = false;
    }

    /// Refresh callback. Returns `None` for a callback that no longer belongs to this loop.
    pub fn on_frame(
        &mut self,
        id: FrameRequestId,
        scheduler: &mut dyn FrameScheduler,
        frame: Option<&FrameRgba>,
        filter: Filter,
        surface: &mut dyn DisplaySurface,
    ) -> Option<IterationOutcome> {
        if !self.running || self.pending != Some(id) {
            self.stats.stale_callbacks += 1;
            tracing::trace!(id = id.0, "stale frame callback ignored");
            return None;
        }
        self.pending = None;

        let outcome = run_iteration(frame, filter, surface, &mut self.scratch);
        self.stats.iterations += 1;
        match outcome {
            IterationOutcome::Rendered => self.stats.rendered += 1,
            IterationOutcome::Skipped(reason) => {
                self.stats.skipped += 1;
                tracing::trace!(?reason, "frame iteration skipped");
            }
        }

        self.pending = Some(scheduler.request_frame());
        Some(outcome)
    }
}
