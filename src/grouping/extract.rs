use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use ndarray::Array2;

use super::SegmentGrouper;
use crate::error::LatticeError;
use crate::geometry::cut;
use crate::types::Group;

impl SegmentGrouper {
    /// Membership mask of group `i` over its bounding box plus `margin`.
    pub fn get_mask(&self, i: usize, margin: usize) -> Result<Option<Array2<bool>>, LatticeError> {
        let Some(group) = self.non_empty_group(i)? else {
            return Ok(None);
        };
        let segmentation = self.require_segmentation()?;
        Ok(Some(membership(
            &cut(segmentation, &group.bbox, margin, 0),
            &group.labels,
        )))
    }

    /// Pixels of `source` under group `i`'s box grown by `grow`; pixels outside
    /// the image are `dflt`.
    pub fn extract_with_background<T: Clone>(
        &self,
        source: &Array2<T>,
        dflt: T,
        i: usize,
        grow: usize,
    ) -> Result<Option<Array2<T>>, LatticeError> {
        let Some(group) = self.non_empty_group(i)? else {
            return Ok(None);
        };
        Ok(Some(cut(source, &group.bbox, grow, dflt)))
    }

    /// Pixels of `source` belonging to group `i` (others set to `bg`) and the
    /// membership mask dilated `grow` times. `margin` defaults to `grow`.
    pub fn extract_with_mask<T: Clone>(
        &self,
        source: &Array2<T>,
        i: usize,
        grow: usize,
        bg: T,
        margin: Option<usize>,
    ) -> Result<Option<(Array2<T>, Array2<bool>)>, LatticeError> {
        let Some(group) = self.non_empty_group(i)? else {
            return Ok(None);
        };
        let segmentation = self.require_segmentation()?;
        if source.dim() != segmentation.dim() {
            return Err(LatticeError::invalid_input(format!(
                "source shape {:?} does not match segmentation shape {:?}",
                source.dim(),
                segmentation.dim()
            )));
        }

        let margin = margin.unwrap_or(grow);
        let image = cut(source, &group.bbox, margin, bg.clone());
        let mut mask = membership(&cut(segmentation, &group.bbox, margin, 0), &group.labels);
        if grow > 0 {
            mask = dilate(&mask, grow);
        }
        let masked = Array2::from_shape_fn(image.dim(), |idx| {
            if mask[idx] {
                image[idx].clone()
            } else {
                bg.clone()
            }
        });
        Ok(Some((masked, mask)))
    }

    fn non_empty_group(&self, i: usize) -> Result<Option<&Group>, LatticeError> {
        self.check_index(i)?;
        let group = &self.groups[i];
        if group.bbox.is_empty() {
            return Ok(None);
        }
        Ok(Some(group))
    }
}

fn membership(labels: &Array2<u32>, members: &[u32]) -> Array2<bool> {
    labels.mapv(|v| v != 0 && members.binary_search(&v).is_ok())
}

/// `steps` iterations of a 3x3 cross dilation, i.e. an L1 ball of radius `steps`.
fn dilate(mask: &Array2<bool>, steps: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return mask.clone();
    }
    let gray = GrayImage::from_fn(w as u32, h as u32, |x, y| {
        Luma([if mask[[y as usize, x as usize]] { 255 } else { 0 }])
    });
    let radius = u8::try_from(steps).unwrap_or(u8::MAX);
    let dilated = morphology::dilate(&gray, Norm::L1, radius);
    Array2::from_shape_fn((h, w), |(y, x)| dilated.get_pixel(x as u32, y as u32)[0] > 0)
}
