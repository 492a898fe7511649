use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use crate::{
    catalog::VideoCatalog,
    controller::PlaybackController,
    filter::{Filter, FilterCatalog},
    foundation::error::{ChromaError, ChromaResult},
    media::{MediaOutput, SimulatedMediaOpts},
};

pub const MAX_SURFACE_SIDE: u32 = 16_384;
pub const MAX_FPS: u32 = 240;

/// Session settings. Every field is optional in JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    pub surface_width: u32,
    pub surface_height: u32,
    pub fps: u32,
    pub volume: f64,
    pub muted: bool,
    pub filter: Filter,
    pub video: i64,
    /// JSON video catalog replacing the built-in one. Relative paths resolve against the
    /// config file's directory.
    pub catalog: Option<PathBuf>,
    pub media: SimulatedMediaOpts,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            surface_width: 640,
            surface_height: 380,
            fps: 60,
            volume: 1.0,
            muted: false,
            filter: Filter::Identity,
            video: 0,
            catalog: None,
            media: SimulatedMediaOpts::default(),
        }
    }
}

impl PlayerConfig {
    pub fn from_json(reader: impl Read) -> ChromaResult<Self> {
        let cfg: Self = serde_json::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> ChromaResult<Self> {
        let f = File::open(path).map_err(|e| {
            ChromaError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        let mut cfg = Self::from_json(BufReader::new(f))?;
        if let (Some(catalog), Some(dir)) = (cfg.catalog.as_mut(), path.parent())
            && catalog.is_relative()
        {
            *catalog = dir.join(&*catalog);
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> ChromaResult<()> {
        if self.surface_width > MAX_SURFACE_SIDE || self.surface_height > MAX_SURFACE_SIDE {
            return Err(ChromaError::validation(format!(
                "surface sides must be <= {MAX_SURFACE_SIDE}"
            )));
        }
        if self.fps == 0 || self.fps > MAX_FPS {
            return Err(ChromaError::validation(format!(
                "fps must be in 1..={MAX_FPS}"
            )));
        }
        if !self.volume.is_finite() {
            return Err(ChromaError::validation("volume must be finite"));
        }
        let m = &self.media;
        if !m.default_duration_secs.is_finite() || m.default_duration_secs < 0.0 {
            return Err(ChromaError::validation(
                "media.default_duration_secs must be finite and >= 0",
            ));
        }
        if !m.time_update_interval_secs.is_finite() || m.time_update_interval_secs <= 0.0 {
            return Err(ChromaError::validation(
                "media.time_update_interval_secs must be finite and > 0",
            ));
        }
        Ok(())
    }

    pub fn load_catalog(&self) -> ChromaResult<VideoCatalog> {
        let Some(path) = self.catalog.as_deref() else {
            return Ok(VideoCatalog::builtin());
        };
        let f = File::open(path).map_err(|e| {
            ChromaError::validation(format!("open catalog '{}': {e}", path.display()))
        })?;
        VideoCatalog::from_json(BufReader::new(f))
    }

    /// Controller in the configured initial state, no media output attached yet.
    pub fn controller<M: MediaOutput>(&self) -> ChromaResult<PlaybackController<M>> {
        let filters = FilterCatalog::builtin();
        let filter_index = filters.position(self.filter).unwrap_or(0);
        let mut c = PlaybackController::new(self.load_catalog()?, filters);
        c.set_volume(self.volume);
        if self.muted {
            c.toggle_mute();
        }
        c.select_filter(filter_index as i64);
        c.select_video(self.video);
        Ok(c)
    }
}
