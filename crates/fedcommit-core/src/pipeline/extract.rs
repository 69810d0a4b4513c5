//! Feature extraction from decoded images.
//!
//! Every extractor is versioned: a vector's version fixes its arity and the
//! meaning of each position, so consumers can pin a version while richer
//! extractors are added alongside.

use super::decode::DecodedImage;
use crate::types::FeatureVector;

/// Number of luminance bins appended by [`LumaHistogramExtractor`].
pub const LUMA_BINS: usize = 8;

/// Turns a decoded image into a fixed-arity feature vector.
pub trait FeatureExtractor: Send + Sync {
    /// Version tag stamped onto every vector this extractor produces.
    fn version(&self) -> u32;

    /// Number of values in every vector this extractor produces.
    fn arity(&self) -> usize;

    /// Derive the feature vector. Must be deterministic.
    fn extract(&self, image: &DecodedImage) -> FeatureVector;
}

/// Versions accepted by [`extractor_for_version`].
pub fn supported_versions() -> &'static [u32] {
    &[DimensionExtractor::VERSION, LumaHistogramExtractor::VERSION]
}

/// Instantiate the extractor for a configured version.
pub fn extractor_for_version(version: u32) -> Option<Box<dyn FeatureExtractor>> {
    match version {
        DimensionExtractor::VERSION => Some(Box::new(DimensionExtractor)),
        LumaHistogramExtractor::VERSION => Some(Box::new(LumaHistogramExtractor)),
        _ => None,
    }
}

/// Baseline extractor: `[width, height, width*height, width/height]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionExtractor;

impl DimensionExtractor {
    pub const VERSION: u32 = 1;

    fn values(width: u32, height: u32) -> [f64; 4] {
        let (w, h) = (f64::from(width), f64::from(height));
        // Height 0 is rejected by the codec; 0.0 stands in if one ever arrives.
        let aspect = if height == 0 { 0.0 } else { w / h };
        [w, h, w * h, aspect]
    }
}

impl FeatureExtractor for DimensionExtractor {
    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn arity(&self) -> usize {
        4
    }

    fn extract(&self, image: &DecodedImage) -> FeatureVector {
        FeatureVector::new(
            Self::VERSION,
            Self::values(image.width, image.height).to_vec(),
        )
    }
}

/// Dimension features followed by a normalized luminance histogram.
///
/// Bins split the 0..=255 luma range evenly and sum to 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct LumaHistogramExtractor;

impl LumaHistogramExtractor {
    pub const VERSION: u32 = 2;
}

impl FeatureExtractor for LumaHistogramExtractor {
    fn version(&self) -> u32 {
        Self::VERSION
    }

    fn arity(&self) -> usize {
        4 + LUMA_BINS
    }

    fn extract(&self, image: &DecodedImage) -> FeatureVector {
        let luma = image.image.to_luma8();
        let mut counts = [0u64; LUMA_BINS];
        for pixel in luma.pixels() {
            counts[usize::from(pixel.0[0]) * LUMA_BINS / 256] += 1;
        }
        let total = counts.iter().sum::<u64>().max(1) as f64;

        let mut values = DimensionExtractor::values(image.width, image.height).to_vec();
        values.extend(counts.iter().map(|&c| c as f64 / total));
        FeatureVector::new(Self::VERSION, values)
    }
}
