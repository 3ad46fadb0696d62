use crate::{config::AnnotationConfig, pipeline::LabeledDetection};
use ab_glyph::{FontVec, PxScale};
use image::RgbImage;
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut},
    rect::Rect,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Failed to read font file {0:?}: {1}")]
    FontRead(PathBuf, std::io::Error),
    #[error("Invalid font file {0:?}: {1}")]
    FontLoad(PathBuf, ab_glyph::InvalidFont),
    #[error("Invalid bundled font: {0}")]
    BundledFont(ab_glyph::InvalidFont),
}

static BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Draws detections onto output images, each labeled with its class name and
/// confidence. The bundled font is used unless a font file is configured.
pub struct Annotator {
    thickness: u32,
    font: FontVec,
    scale: PxScale,
    draw_regions: bool,
}

impl Annotator {
    pub fn new(config: &AnnotationConfig) -> Result<Self, AnnotateError> {
        let font = match &config.font_file {
            Some(path) => {
                let data =
                    std::fs::read(path).map_err(|e| AnnotateError::FontRead(path.clone(), e))?;
                FontVec::try_from_vec(data)
                    .map_err(|e| AnnotateError::FontLoad(path.clone(), e))?
            }
            None => FontVec::try_from_vec(BUNDLED_FONT.to_vec())
                .map_err(AnnotateError::BundledFont)?,
        };

        Ok(Self {
            thickness: config.thickness,
            font,
            scale: PxScale::from(config.font_size),
            draw_regions: config.draw_regions,
        })
    }

    pub fn draw_regions(&self) -> bool {
        self.draw_regions
    }

    pub fn annotate(&self, image: &mut RgbImage, bboxes: &[LabeledDetection]) {
        for bbox in bboxes {
            self.draw_box(image, bbox);

            let label = format!("{} {:.2}", bbox.label, bbox.confidence);
            let y = (bbox.bbox.y1() - self.scale.y as i32 - 5).max(0);
            draw_text_mut(
                image,
                bbox.color,
                bbox.bbox.x1(),
                y,
                self.scale,
                &self.font,
                &label,
            );
        }
    }

    fn draw_box(&self, image: &mut RgbImage, bbox: &LabeledDetection) {
        let (mut width, mut height) = (bbox.bbox.width(), bbox.bbox.height());

        for offset in 0..self.thickness {
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at(bbox.bbox.x1() + offset as i32, bbox.bbox.y1() + offset as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(image, rect, bbox.color);
            width = width.saturating_sub(2);
            height = height.saturating_sub(2);
        }
    }
}
