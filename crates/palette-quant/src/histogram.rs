use std::collections::BTreeMap;

/// One distinct RGBA color and how many pixels carry it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCount {
    pub rgba: [u8; 4],
    pub count: u32,
}

/// Distinct colors of an RGBA buffer, sorted by color value.
#[derive(Debug, Clone, Default)]
pub struct ColorHistogram {
    colors: Vec<ColorCount>,
}

impl ColorHistogram {
    pub fn from_pixels<'a>(pixels: impl IntoIterator<Item = &'a [u8; 4]>) -> Self {
        let mut counts: BTreeMap<[u8; 4], u32> = BTreeMap::new();
        for &rgba in pixels {
            *counts.entry(rgba).or_insert(0) += 1;
        }

        Self {
            colors: counts
                .into_iter()
                .map(|(rgba, count)| ColorCount { rgba, count })
                .collect(),
        }
    }

    pub fn has_transparent(&self) -> bool {
        self.colors.iter().any(|c| c.rgba[3] == 0)
    }

    /// Split off the fully transparent colors, returning how many pixels they covered.
    pub fn take_transparent(&mut self) -> u32 {
        let mut transparent = 0;
        self.colors.retain(|c| {
            if c.rgba[3] == 0 {
                transparent += c.count;
                false
            } else {
                true
            }
        });
        transparent
    }

    pub fn colors(&self) -> &[ColorCount] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn total_pixels(&self) -> u64 {
        self.colors.iter().map(|c| c.count as u64).sum()
    }
}
