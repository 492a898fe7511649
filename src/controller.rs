//! Playback and filter state controller.
//!
//! [`PlaybackController`] owns the only [`PlaybackState`] of a session. Every write goes through
//! one of its named operations or through a media notification bound to the current source, so
//! the index, volume and time invariants hold at all times.

use crate::{
    catalog::{Video, VideoCatalog},
    filter::{Filter, FilterCatalog},
    media::{MediaEvent, MediaNotification, MediaOutput, SourceToken},
};

/// Volume slider granularity offered to UI controls.
pub const VOLUME_STEP: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlaybackState {
    pub current_video_index: usize,
    pub current_filter_index: usize,
    pub is_playing: bool,
    pub is_muted: bool,
    /// Always within `[0, 1]`.
    pub volume: f64,
    /// Always within `[0, total_duration_seconds]`.
    pub current_time_seconds: f64,
    /// `0.0` until the source's metadata is loaded.
    pub total_duration_seconds: f64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_video_index: 0,
            current_filter_index: 0,
            is_playing: false,
            is_muted: false,
            volume: 1.0,
            current_time_seconds: 0.0,
            total_duration_seconds: 0.0,
        }
    }
}

/// Read-only view handed to UI code.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlaybackSnapshot {
    #[serde(flatten)]
    pub state: PlaybackState,
    pub video_url: String,
    pub filter: Filter,
}

pub struct PlaybackController<M> {
    catalog: VideoCatalog,
    filters: FilterCatalog,
    state: PlaybackState,
    media: Option<M>,
    token: SourceToken,
    inbox: Vec<MediaNotification>,
}

impl<M: MediaOutput> PlaybackController<M> {
    pub fn new(catalog: VideoCatalog, filters: FilterCatalog) -> Self {
        Self {
            catalog,
            filters,
            state: PlaybackState::default(),
            media: None,
            token: SourceToken::default(),
            inbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn catalog(&self) -> &VideoCatalog {
        &self.catalog
    }

    pub fn filters(&self) -> &FilterCatalog {
        &self.filters
    }

    pub fn current_video(&self) -> &Video {
        self.catalog.get_wrapped(self.state.current_video_index as i64).1
    }

    pub fn video_url(&self) -> &str {
        &self.current_video().video_url
    }

    pub fn current_filter(&self) -> Filter {
        self.filters
            .get(self.state.current_filter_index)
            .unwrap_or(Filter::Identity)
    }

    /// Token the current source's notifications must carry.
    pub fn source_token(&self) -> SourceToken {
        self.token
    }

    pub fn media(&self) -> Option<&M> {
        self.media.as_ref()
    }

    pub fn media_mut(&mut self) -> Option<&mut M> {
        self.media.as_mut()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state.clone(),
            video_url: self.video_url().to_owned(),
            filter: self.current_filter(),
        }
    }

    /// Bind a media output: it receives the current source, volume and mute flag.
    pub fn attach_media(&mut self, mut media: M) {
        media.set_volume(self.state.volume);
        media.set_muted(self.state.is_muted);
        self.media = Some(media);
        self.load_current_source();
    }

    /// Unbind the media output. Its pending notifications become stale.
    pub fn detach_media(&mut self) -> Option<M> {
        let mut media = self.media.take()?;
        media.release();
        self.token = self.token.next();
        tracing::debug!(token = self.token.0, "media detached");
        Some(media)
    }

    #[tracing::instrument(skip(self))]
    pub fn select_video(&mut self, index: i64) -> usize {
        let resolved = self.catalog.wrap_index(index);
        self.state.current_video_index = resolved;
        self.state.current_time_seconds = 0.0;
        self.state.total_duration_seconds = 0.0;
        self.load_current_source();
        resolved
    }

    fn load_current_source(&mut self) {
        self.token = self.token.next();
        let token = self.token;
        let url = self.current_video().video_url.clone();
        tracing::debug!(url = %url, token = token.0, "source selected");
        if let Some(media) = self.media.as_mut() {
            media.load_source(&url, token);
        }
    }

    pub fn select_filter(&mut self, index: i64) -> usize {
        let clamped = self.filters.clamp_index(index);
        if clamped as i64 != index {
            tracing::warn!(index, clamped, "filter index out of range, clamped");
        }
        self.state.current_filter_index = clamped;
        clamped
    }

    pub fn toggle_play_pause(&mut self) {
        let Some(media) = self.media.as_mut() else {
            tracing::trace!("toggle_play_pause without media output");
            return;
        };
        if self.state.is_playing {
            media.pause();
        } else {
            media.play();
        }
        self.state.is_playing = !self.state.is_playing;
    }

    pub fn seek(&mut self, time_seconds: f64) {
        if time_seconds.is_nan() {
            return;
        }
        let Some(media) = self.media.as_mut() else {
            tracing::trace!("seek without media output");
            return;
        };
        let t = time_seconds.clamp(0.0, self.state.total_duration_seconds);
        media.set_current_time(t);
        self.state.current_time_seconds = t;
    }

    pub fn toggle_mute(&mut self) {
        self.state.is_muted = !self.state.is_muted;
        if let Some(media) = self.media.as_mut() {
            media.set_muted(self.state.is_muted);
        }
    }

    pub fn set_volume(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        let v = value.clamp(0.0, 1.0);
        if let Some(media) = self.media.as_mut() {
            media.set_volume(v);
        }
        self.state.volume = v;
    }

    /// Apply one notification. Returns `false` when it was dropped as stale.
    pub fn handle_notification(&mut self, n: MediaNotification) -> bool {
        if n.token != self.token {
            tracing::debug!(
                token = n.token.0,
                current = self.token.0,
                event = ?n.event,
                "stale media notification dropped"
            );
            return false;
        }
        let Some(media) = self.media.as_mut() else {
            return false;
        };

        match n.event {
            MediaEvent::MetadataLoaded => {
                let d = media.duration();
                self.state.total_duration_seconds = if d.is_finite() { d.max(0.0) } else { 0.0 };
                self.state.current_time_seconds =
                    clamp_time(media.current_time(), self.state.total_duration_seconds);
                if self.state.is_playing {
                    media.play();
                }
            }
            MediaEvent::TimeUpdate => {
                self.state.current_time_seconds =
                    clamp_time(media.current_time(), self.state.total_duration_seconds);
            }
            MediaEvent::Ended => {
                let next = self.state.current_video_index as i64 + 1;
                self.select_video(next);
            }
        }
        true
    }

    /// Drain and apply every pending notification of the media output.
    pub fn pump_events(&mut self) -> usize {
        let Some(media) = self.media.as_mut() else {
            return 0;
        };
        media.drain_events(&mut self.inbox);
        let mut inbox = std::mem::take(&mut self.inbox);
        let applied = inbox
            .drain(..)
            .filter(|n| self.handle_notification(*n))
            .count();
        self.inbox = inbox;
        applied
    }
}

fn clamp_time(t: f64, duration: f64) -> f64 {
    if t.is_finite() {
        t.clamp(0.0, duration.max(0.0))
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::Video,
        media::{SimulatedMedia, SimulatedMediaOpts},
    };

    fn three() -> VideoCatalog {
        let v = |n: &str| Video {
            video_url: format!("{n}.mp4"),
            image_url: format!("{n}.jpg"),
            description: n.to_owned(),
        };
        VideoCatalog::new(vec![v("a"), v("b"), v("c")]).unwrap()
    }

    fn controller() -> PlaybackController<SimulatedMedia> {
        let mut c = PlaybackController::new(three(), FilterCatalog::builtin());
        c.attach_media(SimulatedMedia::new(SimulatedMediaOpts::default()));
        c
    }

    fn load_metadata(c: &mut PlaybackController<SimulatedMedia>) {
        c.media_mut().unwrap().advance(0.0);
        c.pump_events();
    }

    #[test]
    fn attach_loads_current_source() {
        let c = controller();
        assert_eq!(c.media().unwrap().source_url(), Some("a.mp4"));
        assert_eq!(c.video_url(), "a.mp4");
    }

    #[test]
    fn select_video_wraps_and_resets_time() {
        let mut c = controller();
        load_metadata(&mut c);
        c.seek(4.0);
        assert_eq!(c.select_video(5), 2);
        assert_eq!(c.state().current_time_seconds, 0.0);
        assert_eq!(c.state().total_duration_seconds, 0.0);
        assert_eq!(c.media().unwrap().source_url(), Some("c.mp4"));
        assert_eq!(c.select_video(-1), 2);
    }

    #[test]
    fn metadata_resumes_when_already_playing() {
        let mut c = controller();
        c.toggle_play_pause();
        assert!(c.state().is_playing);
        c.select_video(1);
        assert!(!c.media().unwrap().is_playing());

        load_metadata(&mut c);
        assert_eq!(c.state().total_duration_seconds, 10.0);
        assert!(c.media().unwrap().is_playing());
    }

    #[test]
    fn operations_without_media_are_noops() {
        let mut c: PlaybackController<SimulatedMedia> =
            PlaybackController::new(three(), FilterCatalog::builtin());
        c.toggle_play_pause();
        c.seek(3.0);
        assert!(!c.state().is_playing);
        assert_eq!(c.state().current_time_seconds, 0.0);

        c.set_volume(0.4);
        c.toggle_mute();
        assert_eq!(c.state().volume, 0.4);
        assert!(c.state().is_muted);
        assert_eq!(c.pump_events(), 0);
    }

    #[test]
    fn attach_applies_volume_and_mute() {
        let mut c: PlaybackController<SimulatedMedia> =
            PlaybackController::new(three(), FilterCatalog::builtin());
        c.set_volume(0.3);
        c.toggle_mute();
        c.attach_media(SimulatedMedia::new(SimulatedMediaOpts::default()));
        assert_eq!(c.media().unwrap().volume(), 0.3);
        assert!(c.media().unwrap().muted());
    }

    #[test]
    fn nan_inputs_leave_state_untouched() {
        let mut c = controller();
        load_metadata(&mut c);
        c.seek(2.0);
        c.seek(f64::NAN);
        c.set_volume(f64::NAN);
        assert_eq!(c.state().current_time_seconds, 2.0);
        assert_eq!(c.state().volume, 1.0);
    }

    #[test]
    fn detach_makes_pending_events_stale() {
        let mut c = controller();
        let old = c.source_token();
        let media = c.detach_media().unwrap();
        assert!(media.source_url().is_none());
        assert!(!c.handle_notification(MediaNotification {
            token: old,
            event: MediaEvent::Ended,
        }));
        assert_eq!(c.state().current_video_index, 0);
    }

    #[test]
    fn snapshot_serializes_flat() {
        let mut c = controller();
        c.select_filter(4);
        let json = serde_json::to_value(c.snapshot()).unwrap();
        assert_eq!(json["filter"], "grayscale");
        assert_eq!(json["video_url"], "a.mp4");
        assert_eq!(json["current_filter_index"], 4);
    }
}
