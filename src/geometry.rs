//! Box arithmetic over label images.
//!
//! Boxes use half-open pixel ranges: `x0..x1` columns, `y0..y1` rows.

use std::collections::{BTreeMap, HashMap};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl BBox {
    pub fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Height over width; infinite for zero-width boxes.
    pub fn aspect(&self) -> f32 {
        self.height() as f32 / self.width() as f32
    }

    /// Horizontal distance from the right edge of `self` to the left edge of `next`.
    /// Negative when the boxes overlap horizontally.
    pub fn gap_to(&self, next: &BBox) -> i64 {
        next.x0 as i64 - self.x1 as i64
    }

    pub fn x_center(&self) -> f64 {
        (self.x0 + self.x1) as f64 / 2.0
    }

    /// Row-major `(r0, c0, r1, c1)` view.
    pub fn raster(&self) -> (usize, usize, usize, usize) {
        (self.y0, self.x0, self.y1, self.x1)
    }
}

/// Union of an optional running box with a new one.
pub fn union_opt(acc: Option<BBox>, next: &BBox) -> BBox {
    match acc {
        Some(b) => b.union(next),
        None => *next,
    }
}

pub fn max_label(labels: &Array2<u32>) -> u32 {
    labels.iter().copied().max().unwrap_or(0)
}

/// Bounding box of every label present in `labels`, background excluded.
/// Only labels that occur get an entry, so sparse labelings stay cheap.
pub fn seg_boxes(labels: &Array2<u32>) -> BTreeMap<u32, BBox> {
    let mut boxes: BTreeMap<u32, BBox> = BTreeMap::new();
    for ((y, x), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let pixel = BBox::new(x, y, x + 1, y + 1);
        boxes
            .entry(label)
            .and_modify(|b| *b = b.union(&pixel))
            .or_insert(pixel);
    }
    boxes
}

/// Relabels components 1..N by ascending box x-center, dropping unused labels.
/// Ties keep the original label order.
pub fn renumber_by_x_center(labels: &Array2<u32>) -> Array2<u32> {
    let mut present: Vec<(u32, f64)> = seg_boxes(labels)
        .into_iter()
        .map(|(label, b)| (label, b.x_center()))
        .collect();
    present.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let remap: HashMap<u32, u32> = present
        .iter()
        .enumerate()
        .map(|(rank, (label, _))| (*label, rank as u32 + 1))
        .collect();
    labels.mapv(|v| remap.get(&v).copied().unwrap_or(0))
}

/// Median with averaging of the two middle values; `None` for empty input.
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Crops `box ± margin` out of `image`, filling out-of-image pixels with `bg`.
pub fn cut<T: Clone>(image: &Array2<T>, bbox: &BBox, margin: usize, bg: T) -> Array2<T> {
    let (rows, cols) = image.dim();
    let r0 = bbox.y0 as i64 - margin as i64;
    let c0 = bbox.x0 as i64 - margin as i64;
    let h = bbox.height() + 2 * margin;
    let w = bbox.width() + 2 * margin;
    Array2::from_shape_fn((h, w), |(r, c)| {
        let y = r0 + r as i64;
        let x = c0 + c as i64;
        if y < 0 || x < 0 || y as usize >= rows || x as usize >= cols {
            bg.clone()
        } else {
            image[[y as usize, x as usize]].clone()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn union_and_aspect() {
        let a = BBox::new(0, 2, 3, 10);
        let b = BBox::new(5, 0, 7, 6);
        let u = a.union(&b);
        assert_eq!(u, BBox::new(0, 0, 7, 10));
        assert!((u.aspect() - 10.0 / 7.0).abs() < 1e-6);
        assert_eq!(a.gap_to(&b), 2);
        assert_eq!(b.gap_to(&a), -7);
    }

    #[test]
    fn seg_boxes_skips_background_and_missing_labels() {
        let labels = array![[0u32, 1, 1, 0, 3], [0, 1, 0, 0, 3]];
        let boxes = seg_boxes(&labels);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes.get(&1), Some(&BBox::new(1, 0, 3, 2)));
        assert_eq!(boxes.get(&3), Some(&BBox::new(4, 0, 5, 2)));
    }

    #[test]
    fn sparse_huge_labels_are_renumbered() {
        let labels = array![[u32::MAX, 0, 9, 0, 4_000_000_000]];
        assert_eq!(seg_boxes(&labels).len(), 3);
        assert_eq!(renumber_by_x_center(&labels), array![[1u32, 0, 2, 0, 3]]);
    }

    #[test]
    fn renumber_orders_by_center_and_compacts() {
        let labels = array![[7u32, 0, 2, 0, 5], [7, 0, 2, 0, 5]];
        let renumbered = renumber_by_x_center(&labels);
        assert_eq!(renumbered, array![[1u32, 0, 2, 0, 3], [1, 0, 2, 0, 3]]);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn cut_pads_with_background() {
        let image = array![[1u8, 2], [3, 4]];
        let out = cut(&image, &BBox::new(0, 0, 2, 2), 1, 9);
        assert_eq!(out.dim(), (4, 4));
        assert_eq!(out[[0, 0]], 9);
        assert_eq!(out[[1, 1]], 1);
        assert_eq!(out[[2, 2]], 4);
        assert_eq!(out[[3, 3]], 9);
    }
}
