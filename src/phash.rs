//! 64-bit DCT perceptual hash.
//!
//! Robust to resizing, recompression, and minor edits: the image is reduced
//! to 32x32 grayscale, transformed with a 2D DCT-II, and the top-left 8x8
//! low-frequency block (minus the DC term) is thresholded against its median.
//! Two hashes are compared by Hamming distance over the 64 bits.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use std::path::Path;

const SAMPLE_SIZE: usize = 32;
const HASH_SIZE: usize = 8;

/// 64-bit perceptual hash of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptualHash(pub u64);

impl PerceptualHash {
    /// Hash an image file. Fails only when the file cannot be read or
    /// decoded.
    pub fn from_file(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        Ok(Self::from_image(&img))
    }

    pub fn from_image(img: &image::DynamicImage) -> Self {
        let small = img
            .resize_exact(SAMPLE_SIZE as u32, SAMPLE_SIZE as u32, FilterType::Triangle)
            .to_luma8();

        let pixels: Vec<f64> = small.pixels().map(|p| p.0[0] as f64).collect();
        let freq = dct_2d(&pixels);

        // Low-frequency 8x8 block, skipping the DC coefficient
        let mut coeffs = Vec::with_capacity(HASH_SIZE * HASH_SIZE - 1);
        for y in 0..HASH_SIZE {
            for x in 0..HASH_SIZE {
                if x == 0 && y == 0 {
                    continue;
                }
                coeffs.push(freq[y * SAMPLE_SIZE + x]);
            }
        }

        let median = median_of(&coeffs);

        let mut bits: u64 = 0;
        for (i, &c) in coeffs.iter().enumerate() {
            if c > median {
                bits |= 1 << i;
            }
        }
        // 63 coefficient bits; bit 63 stays zero
        PerceptualHash(bits)
    }

    /// Parse the 16-hex-digit form stored in the duplicate log
    pub fn from_hex(s: &str) -> Result<Self> {
        let bits = u64::from_str_radix(s, 16).with_context(|| format!("bad hash hex '{s}'"))?;
        Ok(PerceptualHash(bits))
    }

    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }

    /// Number of differing bits between two hashes
    pub fn distance(self, other: PerceptualHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

/// Naive 2D DCT-II over a SAMPLE_SIZE x SAMPLE_SIZE block. At 32x32 this is
/// ~1M multiply-adds per image, well under a millisecond.
fn dct_2d(input: &[f64]) -> Vec<f64> {
    let n = SAMPLE_SIZE;
    debug_assert_eq!(input.len(), n * n);

    // Precomputed cosine basis
    let mut basis = vec![0.0f64; n * n];
    for k in 0..n {
        for i in 0..n {
            basis[k * n + i] =
                (std::f64::consts::PI / n as f64 * (i as f64 + 0.5) * k as f64).cos();
        }
    }

    // Rows
    let mut rows = vec![0.0f64; n * n];
    for y in 0..n {
        for k in 0..n {
            let mut sum = 0.0;
            for x in 0..n {
                sum += input[y * n + x] * basis[k * n + x];
            }
            rows[y * n + k] = sum;
        }
    }

    // Columns
    let mut out = vec![0.0f64; n * n];
    for x in 0..n {
        for k in 0..n {
            let mut sum = 0.0;
            for y in 0..n {
                sum += rows[y * n + x] * basis[k * n + y];
            }
            out[k * n + x] = sum;
        }
    }

    out
}

fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
