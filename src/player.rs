//! View lifecycle around the controller and the frame loop.
//!
//! A [`Player`] is what a mounted video view is: it owns the media output (through the
//! controller), the display surface and the refresh scheduler. Mounting binds the media output
//! and starts the frame loop; unmounting cancels the loop's pending refresh and unbinds the media
//! output, after which no callback has any effect.

use crate::{
    controller::{PlaybackController, PlaybackSnapshot},
    frame_loop::{
        FrameLoop, FrameLoopStats, FrameRequestId, FrameScheduler, IterationOutcome,
        ManualScheduler,
    },
    media::{MediaOutput, SimulatedMedia},
    surface::DisplaySurface,
};

/// User intents exposed by the UI controls.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    PlayPause,
    Seek { seconds: f64 },
    SetVolume { value: f64 },
    ToggleMute,
    SelectFilter { index: i64 },
    SelectVideo { index: i64 },
}

/// An intent scheduled at a playback-clock instant (seconds since mount).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimedIntent {
    pub at: f64,
    #[serde(flatten)]
    pub intent: Intent,
}

pub struct Player<M, S, D> {
    controller: PlaybackController<M>,
    frame_loop: FrameLoop,
    scheduler: S,
    surface: D,
    mounted: bool,
}

impl<M, S, D> Player<M, S, D>
where
    M: MediaOutput,
    S: FrameScheduler,
    D: DisplaySurface,
{
    pub fn new(controller: PlaybackController<M>, scheduler: S, surface: D) -> Self {
        Self {
            controller,
            frame_loop: FrameLoop::new(),
            scheduler,
            surface,
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn controller(&self) -> &PlaybackController<M> {
        &self.controller
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.controller.snapshot()
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Access to the media output for whoever drives its clock.
    pub fn media_mut(&mut self) -> Option<&mut M> {
        self.controller.media_mut()
    }

    pub fn frame_loop_stats(&self) -> FrameLoopStats {
        self.frame_loop.stats()
    }

    pub fn mount(&mut self, media: M) {
        if self.mounted {
            tracing::warn!("player already mounted, ignoring");
            return;
        }
        self.controller.attach_media(media);
        self.frame_loop.start(&mut self.scheduler);
        self.mounted = true;
        tracing::debug!(url = self.controller.video_url(), "player mounted");
    }

    /// Stop the loop and hand the media output back.
    pub fn unmount(&mut self) -> Option<M> {
        if !self.mounted {
            return None;
        }
        self.frame_loop.stop(&mut self.scheduler);
        self.mounted = false;
        tracing::debug!("player unmounted");
        self.controller.detach_media()
    }

    pub fn dispatch(&mut self, intent: Intent) {
        tracing::trace!(?intent, "dispatch");
        match intent {
            Intent::PlayPause => self.controller.toggle_play_pause(),
            Intent::Seek { seconds } => self.controller.seek(seconds),
            Intent::SetVolume { value } => self.controller.set_volume(value),
            Intent::ToggleMute => self.controller.toggle_mute(),
            Intent::SelectFilter { index } => {
                self.controller.select_filter(index);
                self.restart_loop();
            }
            Intent::SelectVideo { index } => {
                self.controller.select_video(index);
                self.restart_loop();
            }
        }
    }

    fn restart_loop(&mut self) {
        if self.mounted {
            self.frame_loop.restart(&mut self.scheduler);
        }
    }

    /// Apply pending media notifications. A source change caused by one restarts the loop.
    pub fn pump(&mut self) -> usize {
        if !self.mounted {
            return 0;
        }
        let before = self.controller.source_token();
        let applied = self.controller.pump_events();
        if self.controller.source_token() != before {
            self.restart_loop();
        }
        applied
    }

    /// Refresh callback for request `id`.
    pub fn on_frame(&mut self, id: FrameRequestId) -> Option<IterationOutcome> {
        let frame = self.controller.media().and_then(|m| m.current_frame());
        let filter = self.controller.current_filter();
        self.frame_loop
            .on_frame(id, &mut self.scheduler, frame, filter, &mut self.surface)
    }

    /// Run every due refresh callback, in order.
    pub fn fire(&mut self, due: Vec<FrameRequestId>) -> Vec<IterationOutcome> {
        due.into_iter().filter_map(|id| self.on_frame(id)).collect()
    }
}

impl<D: DisplaySurface> Player<SimulatedMedia, ManualScheduler, D> {
    /// One display refresh of `dt` seconds: advance the media clock, apply its notifications,
    /// then run the due frame callbacks.
    pub fn step(&mut self, dt: f64) -> Vec<IterationOutcome> {
        if let Some(media) = self.controller.media_mut() {
            media.advance(dt);
        }
        self.pump();
        let due = self.scheduler.take_due();
        self.fire(due)
    }
}
