//! chromaplay is the core of a video player that recolors every frame in real time.
//!
//! - [`PlaybackController`] owns the playback state (video, filter, play/pause, volume, time)
//! - [`FrameLoop`] captures, filters and commits one frame per display refresh
//! - [`Player`] ties both to a view lifecycle (mount/unmount) and UI [`Intent`]s
//!
//! The browser primitives the player needs are traits ([`MediaOutput`], [`DisplaySurface`],
//! [`FrameScheduler`]); [`SimulatedMedia`], [`PixelSurface`] and [`ManualScheduler`] implement
//! them in-process.
#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod controller;
pub mod filter;
pub mod foundation;
pub mod frame_loop;
pub mod media;
pub mod player;
pub mod surface;

pub use catalog::{Video, VideoCatalog};
pub use config::PlayerConfig;
pub use controller::{PlaybackController, PlaybackSnapshot, PlaybackState, VOLUME_STEP};
pub use filter::{Filter, FilterCatalog, apply_filter_rgba8_in_place};
pub use foundation::core::{Canvas, FrameRgba, Rgb8};
pub use foundation::error::{ChromaError, ChromaResult};
pub use frame_loop::{
    FrameLoop, FrameLoopStats, FrameRequestId, FrameScheduler, IntervalScheduler,
    IterationOutcome, ManualScheduler, SkipReason, run_iteration,
};
pub use media::{
    MediaEvent, MediaNotification, MediaOutput, SimulatedMedia, SimulatedMediaOpts, SourceToken,
};
pub use player::{Intent, Player, TimedIntent};
pub use surface::{DisplaySurface, PixelSurface};
