//! Octree quantizer extended with an alpha axis.
//!
//! Every level of the tree consumes one bit of each channel (R, G, B and A),
//! so an interior node has up to 16 children. Colors are inserted down to
//! depth 8, where each leaf holds exactly one color. Leaves are then merged
//! bottom-up until the leaf count fits the color budget: always the deepest
//! level first, and within a level the node covering the fewest pixels first
//! (ties by creation order). Because alpha takes part in the partitioning,
//! transparent and opaque colors only share a leaf once the tree has been
//! reduced close to the root.

use tracing::debug;

use crate::histogram::ColorCount;

const MAX_DEPTH: usize = 8;
const CHILDREN: usize = 16;

#[derive(Debug, Clone)]
struct Node {
    children: [Option<usize>; CHILDREN],
    pixel_count: u64,
    sums: [u64; 4],
    is_leaf: bool,
}

impl Node {
    fn new(is_leaf: bool) -> Self {
        Self {
            children: [None; CHILDREN],
            pixel_count: 0,
            sums: [0; 4],
            is_leaf,
        }
    }

    fn mean(&self) -> [u8; 4] {
        let n = self.pixel_count.max(1);
        let mut out = [0u8; 4];
        for (o, &s) in out.iter_mut().zip(self.sums.iter()) {
            *o = ((s + n / 2) / n).min(255) as u8;
        }
        out
    }
}

fn child_slot(rgba: [u8; 4], level: usize) -> usize {
    let shift = 7 - level;
    let bit = |c: u8| ((c >> shift) & 1) as usize;
    (bit(rgba[0]) << 3) | (bit(rgba[1]) << 2) | (bit(rgba[2]) << 1) | bit(rgba[3])
}

/// Arena-backed color tree
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<Node>,
    levels: Vec<Vec<usize>>, // Interior nodes per level, in creation order
    leaf_count: usize,
}

impl Default for Octree {
    fn default() -> Self {
        Self::new()
    }
}

impl Octree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(false)],
            levels: {
                let mut levels = vec![Vec::new(); MAX_DEPTH];
                levels[0].push(0);
                levels
            },
            leaf_count: 0,
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Add `count` pixels of one color.
    pub fn insert(&mut self, rgba: [u8; 4], count: u32) {
        let count = count as u64;
        let mut node = 0;

        for level in 0..MAX_DEPTH {
            self.nodes[node].pixel_count += count;
            let slot = child_slot(rgba, level);

            node = match self.nodes[node].children[slot] {
                Some(child) => child,
                None => {
                    let child_level = level + 1;
                    let is_leaf = child_level == MAX_DEPTH;
                    let child = self.nodes.len();
                    self.nodes.push(Node::new(is_leaf));
                    self.nodes[node].children[slot] = Some(child);
                    if is_leaf {
                        self.leaf_count += 1;
                    } else {
                        self.levels[child_level].push(child);
                    }
                    child
                }
            };
        }

        let leaf = &mut self.nodes[node];
        leaf.pixel_count += count;
        for (sum, &c) in leaf.sums.iter_mut().zip(rgba.iter()) {
            *sum += c as u64 * count;
        }
    }

    /// Merge leaves until at most `max_colors` remain.
    pub fn reduce(&mut self, max_colors: usize) {
        let max_colors = max_colors.max(1);

        for level in (0..MAX_DEPTH).rev() {
            if self.leaf_count <= max_colors {
                break;
            }

            let mut candidates = std::mem::take(&mut self.levels[level]);
            // Stable sort keeps creation order among equal counts.
            candidates.sort_by_key(|&idx| self.nodes[idx].pixel_count);

            let mut remaining = candidates.into_iter();
            for idx in remaining.by_ref() {
                self.merge_children(idx);
                if self.leaf_count <= max_colors {
                    break;
                }
            }

            // Nodes left untouched stay interior for the palette walk.
            self.levels[level] = remaining.collect();
        }

        debug!(stage = "quantize", leaves = self.leaf_count, "Octree reduced");
    }

    fn merge_children(&mut self, idx: usize) {
        let children = std::mem::replace(&mut self.nodes[idx].children, [None; CHILDREN]);

        let mut sums = [0u64; 4];
        let mut merged = 0usize;
        for child in children.into_iter().flatten() {
            for (sum, &s) in sums.iter_mut().zip(self.nodes[child].sums.iter()) {
                *sum += s;
            }
            merged += 1;
        }

        let node = &mut self.nodes[idx];
        node.sums = sums;
        node.is_leaf = true;
        self.leaf_count = self.leaf_count + 1 - merged;
    }

    /// Mean color of every leaf, in tree order.
    pub fn palette(&self) -> Vec<[u8; 4]> {
        let mut palette = Vec::with_capacity(self.leaf_count);
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.is_leaf {
                if node.pixel_count > 0 {
                    palette.push(node.mean());
                }
                continue;
            }
            // Reverse push so slot 0 is visited first.
            for child in node.children.iter().rev().flatten() {
                stack.push(*child);
            }
        }

        palette
    }
}

/// Build a palette of at most `max_colors` entries from a color histogram.
pub fn octree_palette(colors: &[ColorCount], max_colors: usize) -> Vec<[u8; 4]> {
    let mut tree = Octree::new();
    for c in colors {
        tree.insert(c.rgba, c.count);
    }
    tree.reduce(max_colors);
    tree.palette()
}
