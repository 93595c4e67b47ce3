use crate::RectificationPipeline;
use stereo_rig_core::{FramePair, Image, Roi};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Crops rectified pairs to the region both cameras see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlapExtractor {
    roi_left: Roi,
    roi_right: Roi,
    overlap: Option<Roi>,
}

impl OverlapExtractor {
    pub fn new(roi_left: Roi, roi_right: Roi) -> Self {
        let overlap = Self::intersect(&roi_left, &roi_right);
        match overlap {
            Some(roi) => log::debug!("overlap {roi} from {roi_left} and {roi_right}"),
            None => log::warn!("valid regions {roi_left} and {roi_right} do not overlap"),
        }
        Self {
            roi_left,
            roi_right,
            overlap,
        }
    }

    pub fn from_pipeline(pipeline: &RectificationPipeline) -> Self {
        let maps = pipeline.maps();
        Self::new(maps.roi_left, maps.roi_right)
    }

    /// Common rectangle of two valid regions; `None` means there is nothing
    /// to display or compute.
    pub fn intersect(a: &Roi, b: &Roi) -> Option<Roi> {
        a.intersect(b)
    }

    /// Copy of `roi` out of `image`, clamped to its bounds.
    pub fn crop(image: &Image, roi: &Roi) -> Image {
        image.crop(roi)
    }

    pub fn rois(&self) -> (Roi, Roi) {
        (self.roi_left, self.roi_right)
    }

    pub fn overlap(&self) -> Option<Roi> {
        self.overlap
    }

    /// Crop both rectified images to the overlap. `None` when the regions
    /// are disjoint or the overlap falls outside the frames.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn extract(&self, rectified: &FramePair) -> Option<FramePair> {
        let roi = self.overlap?;
        let cropped = rectified.map(|img| Self::crop(img, &roi));
        if cropped.left.is_empty() || cropped.right.is_empty() {
            return None;
        }
        Some(cropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stereo_rig_core::{ImageSize, PixelFormat};

    fn numbered(w: usize, h: usize) -> Image {
        let data = (0..w * h).map(|i| i as u8).collect();
        Image::new(w, h, PixelFormat::Gray8, data).expect("image")
    }

    #[test]
    fn extract_crops_both_sides_to_the_same_rectangle() {
        let ex = OverlapExtractor::new(Roi::new(1, 0, 5, 4), Roi::new(0, 1, 4, 4));
        assert_eq!(ex.overlap(), Some(Roi::new(1, 1, 3, 3)));

        let img = numbered(6, 5);
        let out = ex
            .extract(&FramePair::new(img.clone(), img.clone()))
            .expect("overlap");
        assert_eq!(out.left.size(), ImageSize::new(3, 3));
        assert_eq!(out.left, out.right);
        assert_eq!(out.left.pixel(0, 0), img.pixel(1, 1));
        assert_eq!(out.left.pixel(2, 2), img.pixel(3, 3));
    }

    #[test]
    fn disjoint_regions_extract_nothing() {
        let ex = OverlapExtractor::new(Roi::new(0, 0, 10, 10), Roi::new(20, 20, 10, 10));
        assert_eq!(ex.overlap(), None);
        let img = numbered(30, 30);
        assert!(ex.extract(&FramePair::new(img.clone(), img)).is_none());
    }

    #[test]
    fn overlap_outside_the_frame_extracts_nothing() {
        let ex = OverlapExtractor::new(Roi::new(50, 50, 10, 10), Roi::new(52, 52, 10, 10));
        let img = numbered(8, 8);
        assert!(ex.extract(&FramePair::new(img.clone(), img)).is_none());
    }

    #[test]
    fn crop_is_deterministic() {
        let img = numbered(7, 7);
        let roi = Roi::new(2, 1, 3, 4);
        assert_eq!(
            OverlapExtractor::crop(&img, &roi),
            OverlapExtractor::crop(&img, &roi)
        );
    }
}
