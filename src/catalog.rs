use std::io::Read;

use crate::foundation::error::{ChromaError, ChromaResult};

const SAMPLE_ROOT: &str = "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample";

/// One playable entry of the catalog.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Video {
    #[serde(rename = "videoURL")]
    pub video_url: String,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub description: String,
}

impl Video {
    fn sample(stem: &str, description: &str) -> Self {
        Self {
            video_url: format!("{SAMPLE_ROOT}/{stem}.mp4"),
            image_url: format!("{SAMPLE_ROOT}/images/{stem}.jpg"),
            description: description.to_owned(),
        }
    }
}

/// Ordered, non-empty, read-only list of videos addressed by wrapping index.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct VideoCatalog {
    videos: Vec<Video>,
}

impl VideoCatalog {
    pub fn new(videos: Vec<Video>) -> ChromaResult<Self> {
        if videos.is_empty() {
            return Err(ChromaError::validation("video catalog must not be empty"));
        }
        for (i, v) in videos.iter().enumerate() {
            if v.video_url.trim().is_empty() {
                return Err(ChromaError::validation(format!(
                    "video catalog entry {i} has an empty videoURL"
                )));
            }
        }
        Ok(Self { videos })
    }

    pub fn builtin() -> Self {
        Self {
            videos: vec![
                Video::sample(
                    "BigBuckBunny",
                    "Big Buck Bunny tells the story of a giant rabbit with a heart bigger than himself.",
                ),
                Video::sample(
                    "ElephantsDream",
                    "The first Blender Open Movie from 2006.",
                ),
                Video::sample(
                    "ForBiggerBlazes",
                    "HBO GO now works with Chromecast.",
                ),
                Video::sample(
                    "Sintel",
                    "Sintel is an independently produced short film by the Blender Foundation.",
                ),
            ],
        }
    }

    /// Parse a JSON array of `{videoURL, imageURL, description}` objects.
    pub fn from_json(reader: impl Read) -> ChromaResult<Self> {
        let videos: Vec<Video> = serde_json::from_reader(reader)?;
        Self::new(videos)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Euclidean wrap of any index into `0..len`.
    pub fn wrap_index(&self, index: i64) -> usize {
        let len = self.videos.len() as i64;
        index.rem_euclid(len) as usize
    }

    pub fn get(&self, index: usize) -> Option<&Video> {
        self.videos.get(index)
    }

    pub fn get_wrapped(&self, index: i64) -> (usize, &Video) {
        let i = self.wrap_index(index);
        (i, &self.videos[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Video> {
        self.videos.iter()
    }
}

impl Default for VideoCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
