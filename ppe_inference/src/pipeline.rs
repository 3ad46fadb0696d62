use crate::{error::InferenceError, model_service::Detector};
use image::{DynamicImage, GenericImageView, Rgb};
use ppe_core::{BoundingBox, CropRegion};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDetection {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub label: String,
    pub color: Rgb<u8>,
    pub confidence: f32,
}

/// Everything found in one image, in full-image coordinates.
#[derive(Debug, Clone, Default)]
pub struct ImageDetections {
    pub regions: Vec<LabeledDetection>,
    pub items: Vec<LabeledDetection>,
}

/// Finds regions with one detector, then runs a second detector on each
/// region's crop and maps its boxes back onto the full image.
pub struct TwoStagePipeline<R: Detector, I: Detector> {
    region_detector: R,
    item_detector: I,
    region_class: Option<usize>,
}

impl<R: Detector, I: Detector> TwoStagePipeline<R, I> {
    pub fn new(region_detector: R, item_detector: I, region_class: Option<usize>) -> Self {
        Self {
            region_detector,
            item_detector,
            region_class,
        }
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn process(&mut self, image: &DynamicImage) -> Result<ImageDetections, InferenceError> {
        let (img_width, img_height) = image.dimensions();
        let region_class = self.region_class;
        let regions = self.region_detector.detect(image)?;
        let region_labels = self.region_detector.labels();
        let mut result = ImageDetections::default();

        for region in regions
            .into_iter()
            .filter(|region| region_class.map_or(true, |class_id| class_id == region.class_id))
        {
            let bbox = region.bbox.clamp_to(img_width, img_height);
            let crop = image.crop_imm(
                bbox.x1() as u32,
                bbox.y1() as u32,
                bbox.width(),
                bbox.height(),
            );

            let crop_region = match CropRegion::new(bbox, crop.width(), crop.height()) {
                Ok(crop_region) => crop_region,
                Err(e) => {
                    tracing::warn!("Skipping region {:?}: {}", region.bbox, e);
                    continue;
                }
            };

            let local_detections = self.item_detector.detect(&crop)?;
            tracing::debug!(
                "Region {:?} produced {} item detections",
                bbox,
                local_detections.len()
            );

            let labels = self.item_detector.labels();
            result
                .items
                .extend(local_detections.into_iter().map(|local| LabeledDetection {
                    bbox: crop_region.to_full_image(&local.bbox),
                    class_id: local.class_id,
                    label: labels.name(local.class_id),
                    color: labels.color(local.class_id),
                    confidence: local.confidence,
                }));
            result.regions.push(LabeledDetection {
                bbox,
                class_id: region.class_id,
                label: region_labels.name(region.class_id),
                color: region_labels.color(region.class_id),
                confidence: region.confidence,
            });
        }

        Ok(result)
    }
}
