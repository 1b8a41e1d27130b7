use crate::histogram::ColorCount;

/// Squared RGBA distance
#[inline]
pub fn distance_sq(a: [u8; 4], b: [u8; 4]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Index of the nearest palette entry; ties go to the lowest index.
pub fn nearest_index(color: [u8; 4], palette: &[[u8; 4]]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (idx, &entry) in palette.iter().enumerate() {
        let dist = distance_sq(color, entry);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
            if dist == 0 {
                break;
            }
        }
    }
    best_idx
}

/// One k-means step over the histogram: every entry moves to the
/// count-weighted mean of the colors assigned to it. Entries that attract
/// no color keep their value.
pub fn kmeans_pass(colors: &[ColorCount], palette: &[[u8; 4]]) -> Vec<[u8; 4]> {
    if palette.is_empty() {
        return Vec::new();
    }

    let mut sums = vec![[0u64; 4]; palette.len()];
    let mut totals = vec![0u64; palette.len()];

    for c in colors {
        let idx = nearest_index(c.rgba, palette);
        let n = c.count as u64;
        for ch in 0..4 {
            sums[idx][ch] += c.rgba[ch] as u64 * n;
        }
        totals[idx] += n;
    }

    palette
        .iter()
        .zip(sums.iter().zip(totals.iter()))
        .map(|(&old, (sum, &total))| {
            if total == 0 {
                return old;
            }
            let mut out = [0u8; 4];
            for ch in 0..4 {
                out[ch] = ((sum[ch] + total / 2) / total) as u8;
            }
            out
        })
        .collect()
}
