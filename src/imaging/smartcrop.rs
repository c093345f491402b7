//! Content-aware crop detection.
//!
//! Scores every candidate window of the requested aspect ratio and returns the
//! one that keeps the most "interesting" pixels. Interest is a weighted blend
//! of three per-pixel features:
//!
//! | Channel | Feature | Signal |
//! |---|---|---|
//! | red | skin | chroma close to a reference skin tone, inside a brightness band |
//! | green | detail | Laplacian of luminance (edges, texture) |
//! | blue | saturation | HSL saturation, inside a brightness band |
//!
//! The feature map is downsampled before scoring, and each cell is weighted by
//! its position inside the candidate (centre bias, soft edge penalty,
//! rule-of-thirds boost; cells outside the window count against it).
//!
//! Large images are prescaled so their shorter side is about 256 px; the
//! winning window is mapped back to source pixels at the end.

use super::calculations::{
    max_crop_size, prescale_factor, scale_crop_to_source, scale_length, sliding_offsets,
};
use super::params::{CropRect, Dimensions};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

/// Tuning knobs for the detector. Defaults follow the reference smartcrop weights.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOptions {
    pub detail_weight: f64,
    pub skin_color: [f64; 3],
    pub skin_bias: f64,
    pub skin_brightness_min: f64,
    pub skin_brightness_max: f64,
    pub skin_threshold: f64,
    pub skin_weight: f64,
    pub saturation_brightness_min: f64,
    pub saturation_brightness_max: f64,
    pub saturation_threshold: f64,
    pub saturation_bias: f64,
    pub saturation_weight: f64,
    /// Feature-map cells are `score_down_sample` analysis pixels wide.
    pub score_down_sample: u32,
    /// Distance in analysis pixels between candidate windows.
    pub step: u32,
    pub edge_radius: f64,
    pub edge_weight: f64,
    pub outside_importance: f64,
    pub rule_of_thirds: bool,
    pub prescale: bool,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            detail_weight: 0.2,
            skin_color: [0.78, 0.57, 0.44],
            skin_bias: 0.01,
            skin_brightness_min: 0.2,
            skin_brightness_max: 1.0,
            skin_threshold: 0.8,
            skin_weight: 1.8,
            saturation_brightness_min: 0.05,
            saturation_brightness_max: 0.9,
            saturation_threshold: 0.4,
            saturation_bias: 0.2,
            saturation_weight: 0.1,
            score_down_sample: 8,
            step: 8,
            edge_radius: 0.4,
            edge_weight: -20.0,
            outside_importance: -0.5,
            rule_of_thirds: true,
            prescale: true,
        }
    }
}

/// Per-feature breakdown of a candidate's score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Score {
    pub detail: f64,
    pub saturation: f64,
    pub skin: f64,
    /// Weighted sum normalised by the window area.
    pub total: f64,
}

/// The winning window, in source pixels, with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCrop {
    pub crop: CropRect,
    pub score: Score,
}

/// Find the best window of `target`'s aspect ratio inside `image`.
///
/// Returns `None` only for zero-sized images.
pub fn find_best_crop(
    image: &DynamicImage,
    target: Dimensions,
    options: &CropOptions,
) -> Option<ScoredCrop> {
    let source = Dimensions::new(image.width(), image.height());
    if source.width == 0 || source.height == 0 || target.width == 0 || target.height == 0 {
        return None;
    }

    let (crop_w, crop_h) = max_crop_size(source, target);
    let prescale = if options.prescale {
        prescale_factor(source)
    } else {
        1.0
    };

    let (analysed, crop_w, crop_h) = if prescale < 1.0 {
        let w = scale_length(source.width, prescale);
        let h = scale_length(source.height, prescale);
        let resized = image.resize_exact(w, h, FilterType::Triangle).to_rgb8();
        (
            resized,
            scale_length(crop_w, prescale).min(w),
            scale_length(crop_h, prescale).min(h),
        )
    } else {
        (image.to_rgb8(), crop_w, crop_h)
    };

    let features = feature_map(&analysed, options);
    let score_map = down_sample(&features, options.score_down_sample);

    // First candidate wins ties, so uniform images keep the top-left window.
    let mut best: Option<(CropRect, Score)> = None;
    for y in sliding_offsets(analysed.height(), crop_h, options.step) {
        for x in sliding_offsets(analysed.width(), crop_w, options.step) {
            let candidate = CropRect {
                x,
                y,
                width: crop_w,
                height: crop_h,
            };
            let score = score(&score_map, options.score_down_sample, &candidate, options);
            if best.is_none_or(|(_, top)| score.total > top.total) {
                best = Some((candidate, score));
            }
        }
    }

    best.map(|(crop, score)| ScoredCrop {
        crop: scale_crop_to_source(crop, prescale, source),
        score,
    })
}

/// Luminance weighting used for all brightness tests.
fn cie(px: &Rgb<u8>) -> f64 {
    let [r, g, b] = px.0;
    0.5126 * b as f64 + 0.7152 * g as f64 + 0.0722 * r as f64
}

/// Closeness of a pixel's chroma to the reference skin colour; higher is closer.
fn skin_likeness(px: &Rgb<u8>, skin: &[f64; 3]) -> f64 {
    let [r, g, b] = px.0.map(f64::from);
    let mag = (r * r + g * g + b * b).sqrt();
    if mag == 0.0 {
        return 0.0;
    }
    let rd = r / mag - skin[0];
    let gd = g / mag - skin[1];
    let bd = b / mag - skin[2];
    1.0 - (rd * rd + gd * gd + bd * bd).sqrt()
}

/// HSL saturation of a pixel in `0.0..=1.0`.
fn saturation(px: &Rgb<u8>) -> f64 {
    let [r, g, b] = px.0.map(|c| c as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return 0.0;
    }
    let l = (max + min) / 2.0;
    let d = max - min;
    if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    }
}

fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Build the skin / detail / saturation map for the analysis image.
fn feature_map(img: &RgbImage, options: &CropOptions) -> RgbImage {
    let (w, h) = img.dimensions();
    let luma: Vec<f64> = img.pixels().map(cie).collect();
    let at = |x: u32, y: u32| luma[(y * w + x) as usize];

    RgbImage::from_fn(w, h, |x, y| {
        let px = img.get_pixel(x, y);
        let l = at(x, y);

        let edge = if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
            l
        } else {
            l * 4.0 - at(x, y - 1) - at(x - 1, y) - at(x + 1, y) - at(x, y + 1)
        };

        let lightness = l / 255.0;

        let skin = skin_likeness(px, &options.skin_color);
        let skin = if skin > options.skin_threshold
            && (options.skin_brightness_min..=options.skin_brightness_max).contains(&lightness)
        {
            (skin - options.skin_threshold) * (255.0 / (1.0 - options.skin_threshold))
        } else {
            0.0
        };

        let sat = saturation(px);
        let sat = if sat > options.saturation_threshold
            && (options.saturation_brightness_min..=options.saturation_brightness_max)
                .contains(&lightness)
        {
            (sat - options.saturation_threshold) * (255.0 / (1.0 - options.saturation_threshold))
        } else {
            0.0
        };

        Rgb([to_channel(skin), to_channel(edge), to_channel(sat)])
    })
}

/// Shrink the feature map by `factor`, blending cell mean and cell maximum 50/50.
fn down_sample(input: &RgbImage, factor: u32) -> RgbImage {
    let factor = factor.max(1);
    let w = input.width() / factor;
    let h = input.height() / factor;
    let inv_area = 1.0 / (factor * factor) as f64;

    RgbImage::from_fn(w, h, |x, y| {
        let mut sum = [0.0f64; 3];
        let mut max = [0u8; 3];
        for v in 0..factor {
            for u in 0..factor {
                let px = input.get_pixel(x * factor + u, y * factor + v);
                for c in 0..3 {
                    sum[c] += px[c] as f64;
                    max[c] = max[c].max(px[c]);
                }
            }
        }
        Rgb(std::array::from_fn(|c| {
            to_channel(sum[c] * inv_area * 0.5 + max[c] as f64 * 0.5)
        }))
    })
}

/// Rule-of-thirds bump: peaks at 1.0 when `x` sits on a third line.
fn thirds(x: f64) -> f64 {
    let x = ((x - 1.0 / 3.0 + 1.0) % 2.0 * 0.5 - 0.5) * 16.0;
    (1.0 - x * x).max(0.0)
}

/// Weight of analysis pixel `(x, y)` for a candidate window.
fn importance(options: &CropOptions, crop: &CropRect, x: f64, y: f64) -> f64 {
    let (cx, cy) = (crop.x as f64, crop.y as f64);
    let (cw, ch) = (crop.width as f64, crop.height as f64);
    if cx > x || x >= cx + cw || cy > y || y >= cy + ch {
        return options.outside_importance;
    }
    let px = (0.5 - (x - cx) / cw).abs() * 2.0;
    let py = (0.5 - (y - cy) / ch).abs() * 2.0;
    let dx = (px - 1.0 + options.edge_radius).max(0.0);
    let dy = (py - 1.0 + options.edge_radius).max(0.0);
    let d = (dx * dx + dy * dy) * options.edge_weight;
    let mut s = 1.41 - (px * px + py * py).sqrt();
    if options.rule_of_thirds {
        s += (s + d + 0.5).max(0.0) * 1.2 * (thirds(px) + thirds(py));
    }
    s + d
}

fn score(map: &RgbImage, down_sample: u32, crop: &CropRect, options: &CropOptions) -> Score {
    let mut result = Score::default();
    let step = down_sample.max(1);

    for (mx, my, px) in map.enumerate_pixels() {
        let x = (mx * step) as f64;
        let y = (my * step) as f64;
        let i = importance(options, crop, x, y);
        let detail = px[1] as f64 / 255.0;
        result.skin += px[0] as f64 / 255.0 * (detail + options.skin_bias) * i;
        result.detail += detail * i;
        result.saturation += px[2] as f64 / 255.0 * (detail + options.saturation_bias) * i;
    }

    result.total = (result.detail * options.detail_weight
        + result.skin * options.skin_weight
        + result.saturation * options.saturation_weight)
        / (crop.width as f64 * crop.height as f64);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: Dimensions = Dimensions::new(650, 434);

    /// Flat grey canvas with a high-contrast checkerboard over `[x0, x1)`.
    fn detail_band(width: u32, height: u32, x0: u32, x1: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            if (x0..x1).contains(&x) && ((x / 16) + (y / 16)) % 2 == 0 {
                Rgb([255, 255, 255])
            } else if (x0..x1).contains(&x) {
                Rgb([0, 0, 0])
            } else {
                Rgb([128, 128, 128])
            }
        }))
    }

    #[test]
    fn thirds_peaks_on_third_line() {
        assert!((thirds(1.0 / 3.0) - 1.0).abs() < 1e-9);
        assert_eq!(thirds(0.0), 0.0);
    }

    #[test]
    fn saturation_of_pure_and_grey() {
        assert!((saturation(&Rgb([255, 0, 0])) - 1.0).abs() < 1e-9);
        assert_eq!(saturation(&Rgb([90, 90, 90])), 0.0);
    }

    #[test]
    fn skin_likeness_prefers_skin_tones() {
        let skin = CropOptions::default().skin_color;
        let tone = skin_likeness(&Rgb([224, 164, 127]), &skin);
        let blue = skin_likeness(&Rgb([20, 40, 220]), &skin);
        assert!(tone > 0.9, "skin tone scored {tone}");
        assert!(blue < 0.5, "blue scored {blue}");
        assert_eq!(skin_likeness(&Rgb([0, 0, 0]), &skin), 0.0);
    }

    #[test]
    fn importance_outside_is_penalised() {
        let options = CropOptions::default();
        let crop = CropRect {
            x: 10,
            y: 10,
            width: 100,
            height: 100,
        };
        assert_eq!(importance(&options, &crop, 0.0, 0.0), -0.5);
        assert_eq!(importance(&options, &crop, 110.0, 50.0), -0.5);
    }

    #[test]
    fn importance_centre_beats_corner() {
        let options = CropOptions::default();
        let crop = CropRect {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        };
        let centre = importance(&options, &crop, 50.0, 50.0);
        let corner = importance(&options, &crop, 1.0, 1.0);
        assert!(centre > corner);
    }

    #[test]
    fn down_sample_blends_mean_and_max() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([200, 0, 0]));
        let out = down_sample(&img, 2);
        assert_eq!(out.dimensions(), (1, 1));
        // mean 50 * 0.5 + max 200 * 0.5
        assert_eq!(out.get_pixel(0, 0)[0], 125);
    }

    #[test]
    fn feature_map_flat_image_has_no_interior_detail() {
        let img = RgbImage::from_pixel(8, 8, Rgb([100, 100, 100]));
        let features = feature_map(&img, &CropOptions::default());
        assert_eq!(features.get_pixel(4, 4)[1], 0);
        assert_eq!(features.get_pixel(4, 4)[2], 0);
    }

    #[test]
    fn crop_follows_detail_to_the_right() {
        let img = detail_band(1300, 434, 650, 1300);
        let best = find_best_crop(&img, TARGET, &CropOptions::default()).unwrap();
        assert!(best.crop.x > 400, "crop stayed left at x={}", best.crop.x);
        assert!(best.crop.x + best.crop.width <= 1300);
    }

    #[test]
    fn crop_follows_detail_to_the_left() {
        let img = detail_band(1300, 434, 0, 650);
        let best = find_best_crop(&img, TARGET, &CropOptions::default()).unwrap();
        assert!(best.crop.x < 250, "crop drifted right to x={}", best.crop.x);
    }

    #[test]
    fn crop_has_target_aspect() {
        let img = detail_band(3000, 2000, 0, 3000);
        let best = find_best_crop(&img, TARGET, &CropOptions::default()).unwrap();
        let aspect = best.crop.width as f64 / best.crop.height as f64;
        assert!((aspect - 650.0 / 434.0).abs() < 0.02, "aspect was {aspect}");
    }

    #[test]
    fn crop_of_portrait_spans_full_width() {
        let img = detail_band(434, 1300, 0, 434);
        let best = find_best_crop(&img, TARGET, &CropOptions::default()).unwrap();
        assert!(best.crop.width >= 430);
        assert!(best.crop.y + best.crop.height <= 1300);
    }

    #[test]
    fn crop_of_tiny_image_stays_in_bounds() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([10, 200, 30])));
        let best = find_best_crop(&img, TARGET, &CropOptions::default()).unwrap();
        assert!(best.crop.width >= 1 && best.crop.height >= 1);
        assert!(best.crop.x + best.crop.width <= 3);
        assert!(best.crop.y + best.crop.height <= 2);
    }

    #[test]
    fn crop_of_empty_image_is_none() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(find_best_crop(&img, TARGET, &CropOptions::default()).is_none());
    }

    #[test]
    fn crop_uniform_image_spans_full_height() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1300, 434, Rgb([50, 50, 50])));
        let options = CropOptions {
            prescale: false,
            ..CropOptions::default()
        };
        let best = find_best_crop(&img, TARGET, &options).unwrap();
        assert_eq!(best.crop.y, 0);
        assert_eq!(best.crop.height, 434);
    }

    #[test]
    fn score_total_is_weighted_sum_per_pixel() {
        let options = CropOptions {
            prescale: false,
            ..CropOptions::default()
        };
        let best = find_best_crop(&detail_band(390, 260, 100, 200), TARGET, &options).unwrap();
        let s = best.score;

        let area = best.crop.width as f64 * best.crop.height as f64;
        let expected = (s.detail * options.detail_weight
            + s.skin * options.skin_weight
            + s.saturation * options.saturation_weight)
            / area;
        assert!((s.total - expected).abs() < 1e-9);
        assert!(s.detail != 0.0);
    }
}
