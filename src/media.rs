//! Media output seam.
//!
//! A [`MediaOutput`] decodes one source at a time and reports progress through
//! [`MediaNotification`]s. Every notification carries the [`SourceToken`] the source was loaded
//! with, so a consumer can tell events of the current source apart from leftovers of a source it
//! already replaced.

use std::collections::BTreeMap;

use crate::foundation::core::FrameRgba;

/// Binding between a loaded source and the events it produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceToken(pub u64);

impl SourceToken {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaEvent {
    /// Duration became known.
    MetadataLoaded,
    /// Playback position moved.
    TimeUpdate,
    /// Playback reached the end of the source.
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaNotification {
    pub token: SourceToken,
    pub event: MediaEvent,
}

pub trait MediaOutput {
    /// Replace the current source. Pending notifications of the old source may still be
    /// delivered; they carry the old token.
    fn load_source(&mut self, url: &str, token: SourceToken);

    /// Drop the current source and every pending notification.
    fn release(&mut self);

    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);

    /// Source duration in seconds, `0.0` until metadata is loaded.
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);

    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);

    fn play(&mut self);
    fn pause(&mut self);

    /// Most recently decoded frame, if the source has produced one.
    fn current_frame(&self) -> Option<&FrameRgba>;

    /// Move every pending notification into `out`, oldest first.
    fn drain_events(&mut self, out: &mut Vec<MediaNotification>);
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatedMediaOpts {
    /// Duration used for any URL missing from `durations`.
    pub default_duration_secs: f64,
    pub durations: BTreeMap<String, f64>,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Minimum playback time between two `TimeUpdate` notifications.
    pub time_update_interval_secs: f64,
}

impl Default for SimulatedMediaOpts {
    fn default() -> Self {
        Self {
            default_duration_secs: 10.0,
            durations: BTreeMap::new(),
            frame_width: 320,
            frame_height: 180,
            time_update_interval_secs: 0.25,
        }
    }
}

#[derive(Clone, Debug)]
enum FrameSynth {
    Gradient,
    Still(FrameRgba),
}

#[derive(Clone, Debug)]
struct LoadedSource {
    url: String,
    token: SourceToken,
    duration: f64,
    metadata_pending: bool,
}

/// Deterministic in-process media output driven by an explicit clock (`advance`).
///
/// Loading a source takes one `advance` call before `MetadataLoaded` fires, mirroring the
/// asynchronous metadata fetch of a real decoder.
#[derive(Clone, Debug)]
pub struct SimulatedMedia {
    opts: SimulatedMediaOpts,
    synth: FrameSynth,
    source: Option<LoadedSource>,
    position: f64,
    playing: bool,
    volume: f64,
    muted: bool,
    since_time_update: f64,
    frame: Option<FrameRgba>,
    events: Vec<MediaNotification>,
}

impl SimulatedMedia {
    pub fn new(opts: SimulatedMediaOpts) -> Self {
        Self {
            opts,
            synth: FrameSynth::Gradient,
            source: None,
            position: 0.0,
            playing: false,
            volume: 1.0,
            muted: false,
            since_time_update: 0.0,
            frame: None,
            events: Vec::new(),
        }
    }

    /// Every source shows `frame` instead of the synthetic gradient.
    pub fn with_still_frame(opts: SimulatedMediaOpts, frame: FrameRgba) -> Self {
        Self {
            synth: FrameSynth::Still(frame),
            ..Self::new(opts)
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.url.as_str())
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_pending_metadata(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.metadata_pending)
    }

    /// Advance the media clock by `dt` seconds of wall time.
    pub fn advance(&mut self, dt: f64) {
        let Some(src) = self.source.as_mut() else {
            return;
        };
        let token = src.token;
        let duration = src.duration;

        if src.metadata_pending {
            src.metadata_pending = false;
            self.push(token, MediaEvent::MetadataLoaded);
            self.refresh_frame();
            return;
        }

        if !self.playing || !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.position = (self.position + dt).min(duration);
        self.since_time_update += dt;

        if self.position >= duration {
            self.playing = false;
            self.since_time_update = 0.0;
            self.push(token, MediaEvent::TimeUpdate);
            self.push(token, MediaEvent::Ended);
        } else if self.since_time_update >= self.opts.time_update_interval_secs {
            self.since_time_update = 0.0;
            self.push(token, MediaEvent::TimeUpdate);
        }
        self.refresh_frame();
    }

    fn push(&mut self, token: SourceToken, event: MediaEvent) {
        tracing::trace!(token = token.0, ?event, "media notification");
        self.events.push(MediaNotification { token, event });
    }

    fn metadata_known(&self) -> bool {
        self.source.as_ref().is_some_and(|s| !s.metadata_pending)
    }

    fn refresh_frame(&mut self) {
        let Some(src) = self.source.as_ref() else {
            self.frame = None;
            return;
        };
        if src.metadata_pending {
            self.frame = None;
            return;
        }
        self.frame = match &self.synth {
            FrameSynth::Still(f) => Some(f.clone()),
            FrameSynth::Gradient => gradient_frame(
                self.opts.frame_width,
                self.opts.frame_height,
                url_seed(&src.url),
                self.position,
            ),
        };
    }
}

impl MediaOutput for SimulatedMedia {
    fn load_source(&mut self, url: &str, token: SourceToken) {
        let duration = self
            .opts
            .durations
            .get(url)
            .copied()
            .unwrap_or(self.opts.default_duration_secs);
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        tracing::debug!(url, token = token.0, duration, "simulated media load");
        self.source = Some(LoadedSource {
            url: url.to_owned(),
            token,
            duration,
            metadata_pending: true,
        });
        self.position = 0.0;
        self.playing = false;
        self.since_time_update = 0.0;
        self.frame = None;
    }

    fn release(&mut self) {
        self.source = None;
        self.position = 0.0;
        self.playing = false;
        self.frame = None;
        self.events.clear();
    }

    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        self.position = secs.clamp(0.0, self.duration());
        if let Some(token) = self.source.as_ref().map(|s| s.token)
            && self.metadata_known()
        {
            self.push(token, MediaEvent::TimeUpdate);
            self.refresh_frame();
        }
    }

    fn duration(&self) -> f64 {
        match &self.source {
            Some(s) if !s.metadata_pending => s.duration,
            _ => 0.0,
        }
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn play(&mut self) {
        if self.source.is_some() {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn current_frame(&self) -> Option<&FrameRgba> {
        self.frame.as_ref()
    }

    fn drain_events(&mut self, out: &mut Vec<MediaNotification>) {
        out.append(&mut self.events);
    }
}

fn url_seed(url: &str) -> u8 {
    // FNV-1a folded to one byte.
    let mut h: u32 = 0x811c_9dc5;
    for b in url.bytes() {
        h ^= u32::from(b);
        h = h.wrapping_mul(0x0100_0193);
    }
    (h ^ (h >> 8) ^ (h >> 16) ^ (h >> 24)) as u8
}

fn gradient_frame(width: u32, height: u32, seed: u8, position: f64) -> Option<FrameRgba> {
    if width == 0 || height == 0 {
        return None;
    }
    let shift = ((position * 60.0).max(0.0) as u64 % 256) as u32;
    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for y in 0..height {
        let g = (y * 255 / height.saturating_sub(1).max(1)) as u8;
        for x in 0..width {
            let r = ((x * 255 / width.saturating_sub(1).max(1) + shift) % 256) as u8;
            data.extend_from_slice(&[r, g, seed, 255]);
        }
    }
    FrameRgba::new(width, height, data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drained(m: &mut SimulatedMedia) -> Vec<MediaNotification> {
        let mut out = Vec::new();
        m.drain_events(&mut out);
        out
    }

    #[test]
    fn metadata_arrives_on_first_advance() {
        let mut m = SimulatedMedia::new(SimulatedMediaOpts::default());
        m.load_source("a.mp4", SourceToken(7));
        assert!(m.has_pending_metadata());
        assert_eq!(m.duration(), 0.0);
        assert!(m.current_frame().is_none());

        m.advance(0.016);
        assert!(!m.has_pending_metadata());
        assert_eq!(m.duration(), 10.0);
        assert!(m.current_frame().is_some());
        assert_eq!(
            drained(&mut m),
            vec![MediaNotification {
                token: SourceToken(7),
                event: MediaEvent::MetadataLoaded
            }]
        );
    }

    #[test]
    fn playback_reports_time_and_end() {
        let mut opts = SimulatedMediaOpts::default();
        opts.durations.insert("short.mp4".to_owned(), 1.0);
        let mut m = SimulatedMedia::new(opts);
        m.load_source("short.mp4", SourceToken(1));
        m.advance(0.0);
        m.play();
        drained(&mut m);

        m.advance(0.3);
        assert_eq!(drained(&mut m).len(), 1);

        m.advance(5.0);
        let events: Vec<_> = drained(&mut m).into_iter().map(|n| n.event).collect();
        assert_eq!(events, vec![MediaEvent::TimeUpdate, MediaEvent::Ended]);
        assert_eq!(m.current_time(), 1.0);
        assert!(!m.is_playing());
    }

    #[test]
    fn release_drops_pending_events() {
        let mut m = SimulatedMedia::new(SimulatedMediaOpts::default());
        m.load_source("a.mp4", SourceToken(1));
        m.advance(0.0);
        m.release();
        assert!(drained(&mut m).is_empty());
        assert!(m.source_url().is_none());
        m.play();
        assert!(!m.is_playing());
    }

    #[test]
    fn gradient_moves_with_position() {
        let a = gradient_frame(8, 4, 3, 0.0).unwrap();
        let b = gradient_frame(8, 4, 3, 1.0).unwrap();
        assert_ne!(a, b);
        assert!(gradient_frame(0, 4, 3, 0.0).is_none());
    }
}
