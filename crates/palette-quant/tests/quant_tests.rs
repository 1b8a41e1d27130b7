use std::collections::HashSet;

use image::{Rgba, RgbaImage};
use palette_quant::refine::nearest_index;
use palette_quant::{QuantizeStrategy, Quantizer, TRANSPARENT};

fn generate_gradient(size: u32) -> RgbaImage {
    // Every pixel a different color
    RgbaImage::from_fn(size, size, |x, y| {
        let r = (x * 255 / (size - 1)) as u8;
        let g = (y * 255 / (size - 1)) as u8;
        let b = ((x + y) * 127 / (size - 1)) as u8;
        Rgba([r, g, b, 255])
    })
}

fn generate_sprite(size: u32) -> RgbaImage {
    // Opaque disc on a fully transparent background with noisy invisible RGB
    let center = size as f32 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dist = ((x as f32 - center).powi(2) + (y as f32 - center).powi(2)).sqrt();
        if dist < center * 0.6 {
            Rgba([(x * 3) as u8, (y * 3) as u8, 180, 255])
        } else if dist < center * 0.7 {
            Rgba([20, 20, 20, 128])
        } else {
            Rgba([(x * 7) as u8, (y * 11) as u8, 99, 0])
        }
    })
}

fn distinct_colors(image: &RgbaImage) -> usize {
    image.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

#[test]
fn test_color_budget_respected_by_both_strategies() {
    let image = generate_gradient(80);
    assert!(distinct_colors(&image) > 1000);

    for strategy in [QuantizeStrategy::Octree, QuantizeStrategy::MedianCut] {
        for max_colors in [2usize, 16, 64, 256] {
            let result = Quantizer::new(strategy, max_colors).quantize(&image).unwrap();

            assert_eq!(result.indices.len(), 80 * 80);
            assert!(
                result.palette_len() <= max_colors,
                "{} produced {} colors for budget {}",
                strategy,
                result.palette_len(),
                max_colors
            );
            assert!(distinct_colors(&result.to_rgba()) <= max_colors);
        }
    }
}

#[test]
fn test_transparent_background_stays_transparent() {
    let image = generate_sprite(80);
    let quantizer = Quantizer::for_color_type(image::ColorType::Rgba8, 64);
    assert_eq!(quantizer.strategy(), QuantizeStrategy::Octree);

    let result = quantizer.quantize(&image).unwrap();
    let output = result.to_rgba();

    assert!(result.palette.contains(&TRANSPARENT));
    for (src, dst) in image.pixels().zip(output.pixels()) {
        if src.0[3] == 0 {
            assert_eq!(dst.0, TRANSPARENT);
        } else {
            assert_ne!(dst.0[3], 0, "visible pixel {:?} became transparent", src.0);
        }
    }
}

#[test]
fn test_small_palettes_are_preserved_exactly() {
    let colors = [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [17, 34, 51, 255],
    ];
    let image = RgbaImage::from_fn(8, 8, |x, y| Rgba(colors[((x + y) % 4) as usize]));

    for strategy in [QuantizeStrategy::Octree, QuantizeStrategy::MedianCut] {
        let output = Quantizer::new(strategy, 64).quantize(&image).unwrap().to_rgba();
        assert_eq!(output, image, "{} altered an image within budget", strategy);
    }
}

#[test]
fn test_quantization_is_deterministic() {
    let image = generate_sprite(64);

    for strategy in [QuantizeStrategy::Octree, QuantizeStrategy::MedianCut] {
        let quantizer = Quantizer::new(strategy, 32);
        let first = quantizer.quantize(&image).unwrap();
        let second = quantizer.quantize(&image).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_no_dithering_on_flat_regions() {
    // Left half one color, right half another, budget of one: every pixel
    // must map to the same entry with no pattern.
    let image = RgbaImage::from_fn(16, 16, |x, _| {
        if x < 8 {
            Rgba([100, 100, 100, 255])
        } else {
            Rgba([110, 110, 110, 255])
        }
    });

    let result = Quantizer::new(QuantizeStrategy::MedianCut, 1).quantize(&image).unwrap();
    assert_eq!(result.palette, vec![[105, 105, 105, 255]]);
    assert!(result.indices.iter().all(|&i| i == 0));
}

#[test]
fn test_refinement_iterations_keep_budget() {
    let image = generate_gradient(40);
    let result = Quantizer::new(QuantizeStrategy::MedianCut, 8)
        .with_kmeans_iterations(5)
        .quantize(&image)
        .unwrap();

    assert!(result.palette_len() <= 8);
    assert!(result.colors_used() >= 1);
}

#[test]
fn test_nearest_mapping_without_dithering() {
    let image = generate_gradient(48);

    for strategy in [QuantizeStrategy::Octree, QuantizeStrategy::MedianCut] {
        let result = Quantizer::new(strategy, 8).quantize(&image).unwrap();
        assert!(result.palette_len() > 1);

        let output = result.to_rgba();
        for (src, dst) in image.pixels().zip(output.pixels()) {
            let expected = result.palette[nearest_index(src.0, &result.palette)];
            assert_eq!(dst.0, expected, "{} did not map {:?} to its nearest entry", strategy, src.0);
        }
    }
}

#[test]
fn test_kmeans_pass_moves_median_cut_palette() {
    // Red ramp: 0 ×3, 60, 200, 210. Median cut with two colors splits after
    // the three zeros: {0} and {60, 200, 210} → [0] and [157]. One k-means
    // pass moves 60 to the first cluster: (0*3 + 60) / 4 = 15 and
    // (200 + 210) / 2 = 205.
    let reds = [0u8, 0, 0, 60, 200, 210];
    let image = RgbaImage::from_fn(6, 1, |x, _| Rgba([reds[x as usize], 0, 0, 255]));

    let unrefined = Quantizer::new(QuantizeStrategy::MedianCut, 2)
        .with_kmeans_iterations(0)
        .quantize(&image)
        .unwrap();
    assert_eq!(unrefined.palette, vec![[0, 0, 0, 255], [157, 0, 0, 255]]);

    let refined = Quantizer::new(QuantizeStrategy::MedianCut, 2).quantize(&image).unwrap();
    assert_ne!(refined.palette, unrefined.palette, "default quantizer skipped refinement");
    assert_eq!(refined.palette, vec![[15, 0, 0, 255], [205, 0, 0, 255]]);
    assert_eq!(refined.indices, vec![0, 0, 0, 0, 1, 1]);
}
