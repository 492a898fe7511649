use crate::foundation::{
    core::Rgb8,
    error::{ChromaError, ChromaResult},
};

/// Fixed set of per-pixel color transforms. Alpha is never touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Identity,
    Green,
    Blue,
    Red,
    Grayscale,
}

impl Filter {
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Grayscale => "grayscale",
        }
    }

    pub fn parse(name: &str) -> ChromaResult<Self> {
        let key = name.trim().to_ascii_lowercase();
        match key.as_str() {
            "identity" | "none" | "original" => Ok(Self::Identity),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "red" => Ok(Self::Red),
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(Self::Grayscale),
            _ => Err(ChromaError::validation(format!("unknown filter '{name}'"))),
        }
    }

    #[inline]
    pub fn transform(self, px: Rgb8) -> Rgb8 {
        match self {
            Self::Identity => px,
            Self::Green => Rgb8::new(0, px.g, 0),
            Self::Blue => Rgb8::new(0, 0, px.b),
            Self::Red => Rgb8::new(px.r, 0, 0),
            Self::Grayscale => {
                let l = average_luma(px);
                Rgb8::new(l, l, l)
            }
        }
    }
}

/// `round((r + g + b) / 3)`. The sum is an integer so the quotient never lands on `.5`.
#[inline]
fn average_luma(px: Rgb8) -> u8 {
    let sum = u16::from(px.r) + u16::from(px.g) + u16::from(px.b);
    ((sum + 1) / 3) as u8
}

/// Apply `filter` to every RGBA8 pixel of `buf`, leaving alpha unchanged.
pub fn apply_filter_rgba8_in_place(buf: &mut [u8], filter: Filter) -> ChromaResult<()> {
    if !buf.len().is_multiple_of(4) {
        return Err(ChromaError::validation(
            "apply_filter_rgba8_in_place expects an rgba8 buffer",
        ));
    }
    if filter == Filter::Identity {
        return Ok(());
    }
    for px in buf.chunks_exact_mut(4) {
        let out = filter.transform(Rgb8::new(px[0], px[1], px[2]));
        px[0] = out.r;
        px[1] = out.g;
        px[2] = out.b;
    }
    Ok(())
}

/// Index-addressable filter list. Index 0 is always [`Filter::Identity`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterCatalog {
    filters: Vec<Filter>,
}

impl FilterCatalog {
    pub fn builtin() -> Self {
        Self {
            filters: vec![
                Filter::Identity,
                Filter::Green,
                Filter::Blue,
                Filter::Red,
                Filter::Grayscale,
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Filter> {
        self.filters.get(index).copied()
    }

    /// Clamp an untrusted index into `0..len`.
    pub fn clamp_index(&self, index: i64) -> usize {
        let max = self.filters.len().saturating_sub(1) as i64;
        index.clamp(0, max) as usize
    }

    pub fn position(&self, filter: Filter) -> Option<usize> {
        self.filters.iter().position(|f| *f == filter)
    }

    pub fn iter(&self) -> impl Iterator<Item = Filter> + '_ {
        self.filters.iter().copied()
    }
}

impl Default for FilterCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
