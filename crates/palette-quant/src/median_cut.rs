use tracing::debug;

use crate::histogram::ColorCount;

/// Axis-aligned box of histogram colors
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<ColorCount>,
}

impl ColorBox {
    /// Widest channel and its extent
    fn widest_channel(&self) -> (usize, u8) {
        let mut lo = [u8::MAX; 4];
        let mut hi = [u8::MIN; 4];
        for c in &self.colors {
            for ch in 0..4 {
                lo[ch] = lo[ch].min(c.rgba[ch]);
                hi[ch] = hi[ch].max(c.rgba[ch]);
            }
        }

        let mut best = (0, 0u8);
        for ch in 0..4 {
            let range = hi[ch].saturating_sub(lo[ch]);
            if range > best.1 {
                best = (ch, range);
            }
        }
        best
    }

    fn can_split(&self) -> bool {
        self.colors.len() > 1
    }

    /// Split at the pixel-weighted median of the widest channel.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (ch, _) = self.widest_channel();
        self.colors
            .sort_unstable_by_key(|c| (c.rgba[ch], c.rgba));

        let total: u64 = self.colors.iter().map(|c| c.count as u64).sum();
        let half = total.div_ceil(2);

        let mut acc = 0u64;
        let mut cut = self.colors.len() - 1;
        for (i, c) in self.colors.iter().enumerate() {
            acc += c.count as u64;
            if acc >= half {
                cut = i + 1;
                break;
            }
        }
        // Both halves must hold at least one color.
        let cut = cut.clamp(1, self.colors.len() - 1);

        let upper = self.colors.split_off(cut);
        (self, ColorBox { colors: upper })
    }

    fn mean(&self) -> [u8; 4] {
        let mut sums = [0u64; 4];
        let mut total = 0u64;
        for c in &self.colors {
            let n = c.count as u64;
            for ch in 0..4 {
                sums[ch] += c.rgba[ch] as u64 * n;
            }
            total += n;
        }
        if total == 0 {
            return [0, 0, 0, 255];
        }

        let mut out = [0u8; 4];
        for ch in 0..4 {
            out[ch] = ((sums[ch] + total / 2) / total) as u8;
        }
        out
    }
}

/// Build a palette of at most `max_colors` entries by recursive median cut.
pub fn median_cut_palette(colors: &[ColorCount], max_colors: usize) -> Vec<[u8; 4]> {
    if colors.is_empty() {
        return Vec::new();
    }

    // Already within budget: keep every color as-is.
    if colors.len() <= max_colors {
        return colors.iter().map(|c| c.rgba).collect();
    }

    let mut boxes = vec![ColorBox {
        colors: colors.to_vec(),
    }];

    while boxes.len() < max_colors {
        // First box with the widest range wins ties.
        let mut pick: Option<(usize, u8)> = None;
        for (idx, b) in boxes.iter().enumerate() {
            if !b.can_split() {
                continue;
            }
            let (_, range) = b.widest_channel();
            if pick.map_or(true, |(_, best)| range > best) {
                pick = Some((idx, range));
            }
        }

        let Some((idx, _)) = pick else {
            break;
        };

        let (lower, upper) = boxes.remove(idx).split();
        boxes.push(lower);
        boxes.push(upper);
    }

    debug!(stage = "quantize", boxes = boxes.len(), "Median cut finished");

    boxes.iter().map(ColorBox::mean).collect()
}
