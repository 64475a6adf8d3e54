use std::sync::Arc;

use image::imageops::{self, FilterType};
use rustdct::{Dct2, DctPlanner};

use crate::dedup::domain::fingerprinter::{Fingerprint, Fingerprinter};
use crate::shared::error::SendError;
use crate::shared::frame::Frame;

const SAMPLE_SIZE: usize = 32;
const HASH_SIZE: usize = 8;

/// DCT perceptual hash.
///
/// The frame is reduced to a 32x32 grayscale thumbnail, transformed with a
/// 2-D DCT-II, and the 8x8 lowest-frequency coefficients are thresholded
/// against their median. Bit `i` of the hash is coefficient `i` in
/// row-major order.
pub struct DctFingerprinter {
    dct: Arc<dyn Dct2<f32>>,
}

impl DctFingerprinter {
    pub fn new() -> Self {
        let mut planner = DctPlanner::new();
        Self {
            dct: planner.plan_dct2(SAMPLE_SIZE),
        }
    }

    fn transform(&self, samples: &mut [f32]) {
        for row in samples.chunks_exact_mut(SAMPLE_SIZE) {
            self.dct.process_dct2(row);
        }
        let mut column = [0.0f32; SAMPLE_SIZE];
        for x in 0..SAMPLE_SIZE {
            for (y, value) in column.iter_mut().enumerate() {
                *value = samples[y * SAMPLE_SIZE + x];
            }
            self.dct.process_dct2(&mut column);
            for (y, value) in column.iter().enumerate() {
                samples[y * SAMPLE_SIZE + x] = *value;
            }
        }
    }
}

impl Default for DctFingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter for DctFingerprinter {
    fn fingerprint(&self, frame: &Frame) -> Result<Fingerprint, SendError> {
        let rgb = frame
            .to_rgb_image()
            .ok_or_else(|| format!("frame {} is not an RGB image", frame.index()))?;
        let gray = imageops::grayscale(&rgb);
        let thumb = imageops::resize(
            &gray,
            SAMPLE_SIZE as u32,
            SAMPLE_SIZE as u32,
            FilterType::Lanczos3,
        );

        let mut samples: Vec<f32> = thumb.as_raw().iter().map(|&v| v as f32).collect();
        self.transform(&mut samples);

        let low: Vec<f32> = (0..HASH_SIZE)
            .flat_map(|y| samples[y * SAMPLE_SIZE..y * SAMPLE_SIZE + HASH_SIZE].to_vec())
            .collect();
        let median = median(&low);

        let bits = low
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > median)
            .fold(0u64, |acc, (i, _)| acc | (1 << i));
        Ok(Fingerprint(bits))
    }
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
