//! Image augmentation operators and policy resolution.
//!
//! Operators are label-preserving `(image, rng) -> image` values, each
//! carrying its own activation probability; `OneOf` groups gate a weighted
//! choice of exactly one child. A resolved [`AugPipeline`] is fixed for
//! the lifetime of a dataset and terminates in CHW f32 conversion plus
//! optional mean/std normalization.

use crate::types::{AugMode, ImageTensor, Target};
use image::imageops::FilterType;
use image::{imageops, RgbImage};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Fixed per-channel normalization constants for the corpus (RGB order).
pub const NORM_MEAN: [f32; 3] = [0.807, 0.611, 0.832];
pub const NORM_STD: [f32; 3] = [0.123, 0.147, 0.087];

#[derive(Debug, Clone)]
pub enum AugOp {
    RandomCrop {
        width: u32,
        height: u32,
    },
    CenterCrop {
        width: u32,
        height: u32,
    },
    Resize {
        width: u32,
        height: u32,
    },
    /// Rotate by a uniformly chosen multiple of 90 degrees (0 included).
    Rotate90 {
        p: f32,
    },
    HorizontalFlip {
        p: f32,
    },
    /// Additive Gaussian noise, std in [0, 1] pixel units.
    GaussNoise {
        p: f32,
        std_dev: f32,
    },
    /// Directional box blur along a random axis, odd kernel 3..=7.
    MotionBlur {
        p: f32,
    },
    /// 3x3 median filter.
    MedianBlur {
        p: f32,
    },
    Blur {
        p: f32,
        sigma: f32,
    },
    /// Small random affine: translate, scale, rotate about the center.
    ShiftScaleRotate {
        p: f32,
        shift_limit: f32,
        scale_limit: f32,
        rotate_limit_deg: f32,
    },
    /// Per-channel histogram equalization.
    Equalize {
        p: f32,
    },
    /// Emboss kernel blended over the source.
    Emboss {
        p: f32,
    },
    BrightnessContrast {
        p: f32,
        limit: f32,
    },
    HueSaturationValue {
        p: f32,
        hue_limit_deg: f32,
        sat_limit: f32,
        val_limit: f32,
    },
    /// Apply exactly one child, weighted by the children's own
    /// probabilities, gated by `p`.
    OneOf {
        p: f32,
        choices: Vec<AugOp>,
    },
}

impl AugOp {
    /// Activation probability; deterministic geometry ops always fire.
    fn prob(&self) -> f32 {
        match self {
            AugOp::RandomCrop { .. } | AugOp::CenterCrop { .. } | AugOp::Resize { .. } => 1.0,
            AugOp::Rotate90 { p }
            | AugOp::HorizontalFlip { p }
            | AugOp::GaussNoise { p, .. }
            | AugOp::MotionBlur { p }
            | AugOp::MedianBlur { p }
            | AugOp::Blur { p, .. }
            | AugOp::ShiftScaleRotate { p, .. }
            | AugOp::Equalize { p }
            | AugOp::Emboss { p }
            | AugOp::BrightnessContrast { p, .. }
            | AugOp::HueSaturationValue { p, .. }
            | AugOp::OneOf { p, .. } => *p,
        }
    }

    pub fn apply(&self, img: RgbImage, rng: &mut dyn rand::RngCore) -> RgbImage {
        let p = self.prob();
        if p < 1.0 && rng.random_range(0.0..1.0) >= p {
            return img;
        }
        self.transform(img, rng)
    }

    /// Unconditional application; `OneOf` routes here so a chosen child
    /// is not gated a second time.
    fn transform(&self, mut img: RgbImage, rng: &mut dyn rand::RngCore) -> RgbImage {
        match self {
            AugOp::RandomCrop { width, height } => {
                let (w, h) = img.dimensions();
                let cw = (*width).min(w);
                let ch = (*height).min(h);
                let x0 = if w > cw { rng.random_range(0..=w - cw) } else { 0 };
                let y0 = if h > ch { rng.random_range(0..=h - ch) } else { 0 };
                imageops::crop_imm(&img, x0, y0, cw, ch).to_image()
            }
            AugOp::CenterCrop { width, height } => {
                let (w, h) = img.dimensions();
                let cw = (*width).min(w);
                let ch = (*height).min(h);
                imageops::crop_imm(&img, (w - cw) / 2, (h - ch) / 2, cw, ch).to_image()
            }
            AugOp::Resize { width, height } => {
                imageops::resize(&img, *width, *height, FilterType::Triangle)
            }
            AugOp::Rotate90 { .. } => match rng.random_range(0..4u32) {
                0 => img,
                1 => imageops::rotate90(&img),
                2 => imageops::rotate180(&img),
                _ => imageops::rotate270(&img),
            },
            AugOp::HorizontalFlip { .. } => {
                imageops::flip_horizontal_in_place(&mut img);
                img
            }
            AugOp::GaussNoise { std_dev, .. } => gauss_noise(img, *std_dev, rng),
            AugOp::MotionBlur { .. } => {
                let ksize = 3 + 2 * rng.random_range(0..3u32);
                let horizontal = rng.random_range(0.0..1.0) < 0.5;
                line_blur(&img, ksize, horizontal)
            }
            AugOp::MedianBlur { .. } => median3(&img),
            AugOp::Blur { sigma, .. } => imageops::blur(&img, *sigma),
            AugOp::ShiftScaleRotate {
                shift_limit,
                scale_limit,
                rotate_limit_deg,
                ..
            } => {
                let angle = jitter(rng, *rotate_limit_deg);
                let scale = 1.0 + jitter(rng, *scale_limit);
                let dx = jitter(rng, *shift_limit) * img.width() as f32;
                let dy = jitter(rng, *shift_limit) * img.height() as f32;
                affine(&img, angle.to_radians(), scale, dx, dy)
            }
            AugOp::Equalize { .. } => equalize(&img),
            AugOp::Emboss { .. } => {
                let alpha = rng.random_range(0.2..0.5);
                emboss(&img, alpha)
            }
            AugOp::BrightnessContrast { limit, .. } => {
                let bright = 1.0 + jitter(rng, *limit);
                let contrast = 1.0 + jitter(rng, *limit);
                brightness_contrast(img, bright, contrast)
            }
            AugOp::HueSaturationValue {
                hue_limit_deg,
                sat_limit,
                val_limit,
                ..
            } => {
                let dh = jitter(rng, *hue_limit_deg);
                let ds = jitter(rng, *sat_limit);
                let dv = jitter(rng, *val_limit);
                hsv_jitter(img, dh, ds, dv)
            }
            AugOp::OneOf { choices, .. } => {
                let total: f32 = choices.iter().map(AugOp::prob).sum();
                if total <= 0.0 || choices.is_empty() {
                    return img;
                }
                let mut draw = rng.random_range(0.0..total);
                for choice in choices {
                    draw -= choice.prob();
                    if draw < 0.0 {
                        return choice.transform(img, rng);
                    }
                }
                // Float accumulation can leave draw at ~0; fall back to
                // the last child.
                choices[choices.len() - 1].transform(img, rng)
            }
        }
    }
}

/// The fixed transform sequence a dataset applies on every retrieval.
#[derive(Debug, Clone)]
pub struct AugPipeline {
    ops: Vec<AugOp>,
    normalize: bool,
}

impl AugPipeline {
    /// Resolve `(target, aug_mode)` to a concrete op list. `same` follows
    /// the target, `none` strips every geometric/color op, and a policy
    /// name overrides the target-implied choice.
    pub fn resolve(
        target: Target,
        aug_mode: AugMode,
        crop_size: u32,
        size: u32,
        normalize: bool,
    ) -> Self {
        let ops = match aug_mode {
            AugMode::None => Vec::new(),
            AugMode::Train => train_policy(crop_size, size),
            AugMode::Test => test_policy(size),
            AugMode::Same => match target {
                Target::Train => train_policy(crop_size, size),
                Target::Test | Target::All => test_policy(size),
            },
        };
        Self { ops, normalize }
    }

    pub fn ops(&self) -> &[AugOp] {
        &self.ops
    }

    pub fn apply(&self, img: &RgbImage, rng: &mut dyn rand::RngCore) -> ImageTensor {
        let mut out = img.clone();
        for op in &self.ops {
            out = op.apply(out, rng);
        }
        let mut tensor = to_chw(&out);
        if self.normalize {
            normalize_chw(&mut tensor.chw);
        }
        tensor
    }
}

/// Stochastic training battery: crop/resize geometry followed by the
/// label-preserving distortion stack.
fn train_policy(crop_size: u32, size: u32) -> Vec<AugOp> {
    vec![
        AugOp::RandomCrop {
            width: crop_size,
            height: crop_size,
        },
        AugOp::Resize {
            width: size,
            height: size,
        },
        AugOp::Rotate90 { p: 1.0 },
        AugOp::HorizontalFlip { p: 0.5 },
        AugOp::GaussNoise {
            p: 0.2,
            std_dev: 0.02,
        },
        AugOp::OneOf {
            p: 0.2,
            choices: vec![
                AugOp::MotionBlur { p: 0.2 },
                AugOp::MedianBlur { p: 0.1 },
                AugOp::Blur { p: 0.1, sigma: 1.0 },
            ],
        },
        AugOp::ShiftScaleRotate {
            p: 0.5,
            shift_limit: 0.0625,
            scale_limit: 0.2,
            rotate_limit_deg: 5.0,
        },
        AugOp::OneOf {
            p: 0.3,
            choices: vec![
                AugOp::Equalize { p: 0.5 },
                AugOp::Emboss { p: 0.5 },
                AugOp::BrightnessContrast { p: 0.5, limit: 0.2 },
            ],
        },
        AugOp::HueSaturationValue {
            p: 0.3,
            hue_limit_deg: 20.0,
            sat_limit: 0.12,
            val_limit: 0.08,
        },
    ]
}

/// Deterministic evaluation policy: a center crop, nothing else.
fn test_policy(size: u32) -> Vec<AugOp> {
    vec![AugOp::CenterCrop {
        width: size,
        height: size,
    }]
}

/// Uniform draw from `-limit..limit`. A zero or negative limit means no
/// jitter; `random_range` rejects empty ranges.
fn jitter(rng: &mut dyn rand::RngCore, limit: f32) -> f32 {
    if limit <= 0.0 {
        0.0
    } else {
        rng.random_range(-limit..limit)
    }
}

pub(crate) fn to_chw(img: &RgbImage) -> ImageTensor {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut chw = vec![0.0f32; plane * 3];
    for (x, y, pixel) in img.enumerate_pixels() {
        let base = (y * width + x) as usize;
        chw[base] = pixel[0] as f32 / 255.0;
        chw[plane + base] = pixel[1] as f32 / 255.0;
        chw[2 * plane + base] = pixel[2] as f32 / 255.0;
    }
    ImageTensor { chw, width, height }
}

fn normalize_chw(chw: &mut [f32]) {
    let plane = chw.len() / 3;
    for c in 0..3 {
        for v in &mut chw[c * plane..(c + 1) * plane] {
            *v = (*v - NORM_MEAN[c]) / NORM_STD[c];
        }
    }
}

fn gauss_noise(mut img: RgbImage, std_dev: f32, rng: &mut dyn rand::RngCore) -> RgbImage {
    let normal = match Normal::new(0.0f32, std_dev) {
        Ok(n) => n,
        Err(_) => return img,
    };
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0 + normal.sample(rng);
            pixel[c] = (v.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
    img
}

fn line_blur(img: &RgbImage, ksize: u32, horizontal: bool) -> RgbImage {
    let (w, h) = img.dimensions();
    let half = (ksize / 2) as i64;
    let mut out = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u32; 3];
            let mut count = 0u32;
            for k in -half..=half {
                let (sx, sy) = if horizontal {
                    (x as i64 + k, y as i64)
                } else {
                    (x as i64, y as i64 + k)
                };
                if sx < 0 || sy < 0 || sx >= w as i64 || sy >= h as i64 {
                    continue;
                }
                let p = img.get_pixel(sx as u32, sy as u32);
                for c in 0..3 {
                    acc[c] += u32::from(p[c]);
                }
                count += 1;
            }
            let p = out.get_pixel_mut(x, y);
            for c in 0..3 {
                p[c] = (acc[c] / count.max(1)) as u8;
            }
        }
    }
    out
}

fn median3(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();
    let mut out = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut window: [[u8; 9]; 3] = [[0; 9]; 3];
            let mut n = 0;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let sx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                    let sy = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                    let p = img.get_pixel(sx, sy);
                    for c in 0..3 {
                        window[c][n] = p[c];
                    }
                    n += 1;
                }
            }
            let p = out.get_pixel_mut(x, y);
            for c in 0..3 {
                window[c].sort_unstable();
                p[c] = window[c][4];
            }
        }
    }
    out
}

/// Inverse-mapped affine with nearest sampling; out-of-bounds fills black.
fn affine(img: &RgbImage, angle_rad: f32, scale: f32, dx: f32, dy: f32) -> RgbImage {
    let (w, h) = img.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();
    let inv_scale = 1.0 / scale.max(1e-6);
    let mut out = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let ox = x as f32 - cx - dx;
            let oy = y as f32 - cy - dy;
            let sx = (cos * ox + sin * oy) * inv_scale + cx;
            let sy = (-sin * ox + cos * oy) * inv_scale + cy;
            let sx = sx.round();
            let sy = sy.round();
            if sx >= 0.0 && sy >= 0.0 && sx < w as f32 && sy < h as f32 {
                out.put_pixel(x, y, *img.get_pixel(sx as u32, sy as u32));
            }
        }
    }
    out
}

fn equalize(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();
    let total = (w * h) as u32;
    if total == 0 {
        return img.clone();
    }
    let mut out = img.clone();
    for c in 0..3 {
        let mut hist = [0u32; 256];
        for p in img.pixels() {
            hist[p[c] as usize] += 1;
        }
        let mut cdf = [0u32; 256];
        let mut running = 0u32;
        for (i, count) in hist.iter().enumerate() {
            running += count;
            cdf[i] = running;
        }
        let cdf_min = cdf.iter().copied().find(|&v| v > 0).unwrap_or(0);
        let denom = total.saturating_sub(cdf_min).max(1);
        for p in out.pixels_mut() {
            let v = cdf[p[c] as usize].saturating_sub(cdf_min);
            p[c] = ((v as f32 / denom as f32) * 255.0).round() as u8;
        }
    }
    out
}

fn emboss(img: &RgbImage, alpha: f32) -> RgbImage {
    const KERNEL: [[i32; 3]; 3] = [[-1, -1, 0], [-1, 1, 1], [0, 1, 1]];
    let (w, h) = img.dimensions();
    let mut out = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0i32; 3];
            for (ky, row) in KERNEL.iter().enumerate() {
                for (kx, k) in row.iter().enumerate() {
                    let sx = (x as i64 + kx as i64 - 1).clamp(0, w as i64 - 1) as u32;
                    let sy = (y as i64 + ky as i64 - 1).clamp(0, h as i64 - 1) as u32;
                    let p = img.get_pixel(sx, sy);
                    for c in 0..3 {
                        acc[c] += k * i32::from(p[c]);
                    }
                }
            }
            let src = img.get_pixel(x, y);
            let p = out.get_pixel_mut(x, y);
            for c in 0..3 {
                let embossed = acc[c].clamp(0, 255) as f32;
                let blended = f32::from(src[c]) * (1.0 - alpha) + embossed * alpha;
                p[c] = blended.clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

fn brightness_contrast(mut img: RgbImage, bright: f32, contrast: f32) -> RgbImage {
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            let v = ((v - 0.5) * contrast + 0.5) * bright;
            pixel[c] = (v.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
    img
}

fn hsv_jitter(mut img: RgbImage, dh_deg: f32, ds: f32, dv: f32) -> RgbImage {
    for pixel in img.pixels_mut() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let h = (h + dh_deg).rem_euclid(360.0);
        let s = (s + ds).clamp(0.0, 1.0);
        let v = (v + dv).clamp(0.0, 1.0);
        let (r, g, b) = hsv_to_rgb(h, s, v);
        pixel[0] = r;
        pixel[1] = g;
        pixel[2] = b;
    }
    img
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    (
        ((r + m).clamp(0.0, 1.0) * 255.0).round() as u8,
        ((g + m).clamp(0.0, 1.0) * 255.0).round() as u8,
        ((b + m).clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod aug_tests {
    use super::*;
    use image::Rgb;
    use rand::SeedableRng;

    fn gradient(w: u32, h: u32) -> RgbImage {
        let mut img = RgbImage::new(w, h);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8]);
        }
        img
    }

    #[test]
    fn resolve_none_strips_all_ops() {
        let pipe = AugPipeline::resolve(Target::Train, AugMode::None, 32, 16, false);
        assert!(pipe.ops().is_empty());
    }

    #[test]
    fn resolve_same_follows_target() {
        let train = AugPipeline::resolve(Target::Train, AugMode::Same, 32, 16, true);
        let test = AugPipeline::resolve(Target::Test, AugMode::Same, 32, 16, true);
        let all = AugPipeline::resolve(Target::All, AugMode::Same, 32, 16, true);
        assert!(train.ops().len() > 1);
        assert_eq!(test.ops().len(), 1);
        assert_eq!(all.ops().len(), 1);
        assert!(matches!(test.ops()[0], AugOp::CenterCrop { .. }));
    }

    #[test]
    fn resolve_override_wins_over_target() {
        let pipe = AugPipeline::resolve(Target::Test, AugMode::Train, 32, 16, false);
        assert!(matches!(pipe.ops()[0], AugOp::RandomCrop { .. }));
    }

    #[test]
    fn center_crop_is_bit_identical_across_calls() {
        let pipe = AugPipeline::resolve(Target::Test, AugMode::Same, 32, 8, true);
        let img = gradient(20, 14);
        let mut rng_a = rand::rngs::StdRng::seed_from_u64(1);
        let mut rng_b = rand::rngs::StdRng::seed_from_u64(999);
        let a = pipe.apply(&img, &mut rng_a);
        let b = pipe.apply(&img, &mut rng_b);
        assert_eq!(a, b);
        assert_eq!((a.width, a.height), (8, 8));
    }

    #[test]
    fn none_mode_preserves_source_dimensions() {
        let pipe = AugPipeline::resolve(Target::Train, AugMode::None, 32, 8, false);
        let img = gradient(21, 13);
        let out = pipe.apply(&img, &mut rand::rng());
        assert_eq!((out.width, out.height), (21, 13));
        assert_eq!(out.chw.len(), 21 * 13 * 3);
        // Raw decode: values stay in [0, 1].
        assert!(out.chw.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn train_policy_emits_fixed_square() {
        let pipe = AugPipeline::resolve(Target::Train, AugMode::Same, 12, 16, false);
        let img = gradient(40, 30);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..8 {
            let out = pipe.apply(&img, &mut rng);
            assert_eq!((out.width, out.height), (16, 16));
        }
    }

    #[test]
    fn normalization_applies_fixed_constants() {
        let mut img = RgbImage::new(2, 2);
        for p in img.pixels_mut() {
            *p = Rgb([255, 0, 255]);
        }
        let pipe = AugPipeline::resolve(Target::Test, AugMode::None, 2, 2, true);
        let out = pipe.apply(&img, &mut rand::rng());
        let plane = 4;
        assert!((out.chw[0] - (1.0 - NORM_MEAN[0]) / NORM_STD[0]).abs() < 1e-5);
        assert!((out.chw[plane] - (0.0 - NORM_MEAN[1]) / NORM_STD[1]).abs() < 1e-5);
        assert!((out.chw[2 * plane] - (1.0 - NORM_MEAN[2]) / NORM_STD[2]).abs() < 1e-5);
    }

    #[test]
    fn undersized_source_clamps_crops() {
        let pipe = AugPipeline::resolve(Target::Test, AugMode::Same, 64, 64, false);
        let img = gradient(10, 6);
        let out = pipe.apply(&img, &mut rand::rng());
        assert_eq!((out.width, out.height), (10, 6));
    }

    #[test]
    fn hflip_reverses_rows() {
        let img = gradient(4, 2);
        let flipped = AugOp::HorizontalFlip { p: 1.0 }.apply(img.clone(), &mut rand::rng());
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(flipped.get_pixel(x, y), img.get_pixel(3 - x, y));
            }
        }
    }

    #[test]
    fn one_of_applies_exactly_one_child() {
        // Children that fully saturate a channel make the choice visible.
        let op = AugOp::OneOf {
            p: 1.0,
            choices: vec![
                AugOp::BrightnessContrast { p: 0.5, limit: 0.0 },
                AugOp::Equalize { p: 0.5 },
            ],
        };
        let img = gradient(8, 8);
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        // Must not panic and must keep dimensions.
        let out = op.apply(img, &mut rng);
        assert_eq!(out.dimensions(), (8, 8));
    }

    #[test]
    fn zero_limits_draw_no_jitter() {
        let img = gradient(9, 7);
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let ssr = AugOp::ShiftScaleRotate {
            p: 1.0,
            shift_limit: 0.0,
            scale_limit: 0.0,
            rotate_limit_deg: 0.0,
        }
        .apply(img.clone(), &mut rng);
        assert_eq!(ssr, img);
        let bc = AugOp::BrightnessContrast { p: 1.0, limit: 0.0 }.apply(img.clone(), &mut rng);
        for (a, b) in bc.pixels().zip(img.pixels()) {
            for c in 0..3 {
                assert!((i32::from(a[c]) - i32::from(b[c])).abs() <= 1);
            }
        }
        let hsv = AugOp::HueSaturationValue {
            p: 1.0,
            hue_limit_deg: 0.0,
            sat_limit: 0.0,
            val_limit: 0.0,
        }
        .apply(img.clone(), &mut rng);
        assert_eq!(hsv.dimensions(), img.dimensions());
    }

    #[test]
    fn hsv_round_trip_is_close() {
        for (r, g, b) in [(255, 0, 0), (12, 200, 96), (80, 80, 80), (0, 0, 255)] {
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let (r2, g2, b2) = hsv_to_rgb(h, s, v);
            assert!((i32::from(r) - i32::from(r2)).abs() <= 1);
            assert!((i32::from(g) - i32::from(g2)).abs() <= 1);
            assert!((i32::from(b) - i32::from(b2)).abs() <= 1);
        }
    }
}
