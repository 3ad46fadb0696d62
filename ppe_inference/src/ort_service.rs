use crate::{
    config::{ExecutionProvider, ModelConfig},
    error::InferenceError,
    labels::{load_labels, parse_names_metadata, Labels},
    model_service::Detector,
};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::{s, Array, ArrayD, ArrayView2, Axis, Ix2, Ix4};
use ort::{
    execution_providers::{
        CUDAExecutionProvider, ExecutionProviderDispatch, TensorRTExecutionProvider,
    },
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use ppe_core::{BoundingBox, Detection};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
struct RawBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    class_id: usize,
    confidence: f32,
}

fn intersection(box1: &RawBox, box2: &RawBox) -> f32 {
    (box1.x2.min(box2.x2) - box1.x1.max(box2.x1)).max(0.)
        * (box1.y2.min(box2.y2) - box1.y1.max(box2.y1)).max(0.)
}

fn union(box1: &RawBox, box2: &RawBox) -> f32 {
    ((box1.x2 - box1.x1) * (box1.y2 - box1.y1)) + ((box2.x2 - box2.x1) * (box2.y2 - box2.y1))
        - intersection(box1, box2)
}

fn transform_image(image: &DynamicImage, input_size: u32) -> (Array<f32, Ix4>, u32, u32) {
    let (img_width, img_height) = image.dimensions();
    let img = image.resize_exact(input_size, input_size, FilterType::CatmullRom);

    let size = input_size as usize;
    let mut input = Array::zeros((1, 3, size, size));
    for pixel in img.pixels() {
        let x = pixel.0 as _;
        let y = pixel.1 as _;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, 0, y, x]] = (r as f32) / 255.;
        input[[0, 1, y, x]] = (g as f32) / 255.;
        input[[0, 2, y, x]] = (b as f32) / 255.;
    }

    (input, img_height, img_width)
}

/// Keeps the most confident box of every overlapping same-class cluster.
fn non_max_suppression(mut boxes: Vec<RawBox>, iou_threshold: f32) -> Vec<RawBox> {
    boxes.sort_by(|box1, box2| box2.confidence.total_cmp(&box1.confidence));
    let mut result = Vec::new();

    while !boxes.is_empty() {
        let best = boxes.remove(0);
        boxes.retain(|candidate| {
            candidate.class_id != best.class_id
                || intersection(&best, candidate) / union(&best, candidate) < iou_threshold
        });
        result.push(best);
    }

    result
}

#[derive(Debug, Clone, Copy)]
struct Postprocess {
    input_size: f32,
    img_width: f32,
    img_height: f32,
    min_probability: f32,
    iou_threshold: f32,
}

/// Decodes a YOLOv8 detection head laid out as `[4 + num_classes, num_anchors]`.
/// Boxes are clipped to the image.
fn postprocess(output: ArrayView2<f32>, params: Postprocess) -> Vec<Detection> {
    let mut boxes = Vec::new();

    for row in output.axis_iter(Axis(1)) {
        let row: Vec<_> = row.iter().copied().collect();
        let Some((class_id, prob)) = row
            .iter()
            .skip(4)
            .enumerate()
            .map(|(index, value)| (index, *value))
            .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
        else {
            continue;
        };

        if prob < params.min_probability {
            continue;
        }

        let xc = row[0] / params.input_size * params.img_width;
        let yc = row[1] / params.input_size * params.img_height;
        let w = row[2] / params.input_size * params.img_width;
        let h = row[3] / params.input_size * params.img_height;

        boxes.push(RawBox {
            class_id,
            confidence: prob,
            x1: xc - w / 2.,
            y1: yc - h / 2.,
            x2: xc + w / 2.,
            y2: yc + h / 2.,
        });
    }

    non_max_suppression(boxes, params.iou_threshold)
        .into_iter()
        .map(|bbox| {
            Detection::new(
                BoundingBox::from_xyxy_f32(bbox.x1, bbox.y1, bbox.x2, bbox.y2)
                    .clamp_to(params.img_width as u32, params.img_height as u32),
                bbox.class_id,
                bbox.confidence,
            )
        })
        .collect()
}

fn execution_providers(provider: ExecutionProvider) -> Vec<ExecutionProviderDispatch> {
    match provider {
        ExecutionProvider::Cpu => Vec::new(),
        ExecutionProvider::Cuda => vec![CUDAExecutionProvider::default().build()],
        ExecutionProvider::TensorRT => vec![
            TensorRTExecutionProvider::default()
                .with_engine_cache(true)
                .build(),
            CUDAExecutionProvider::default().build(),
        ],
    }
}

fn build_session(model_path: &Path, provider: ExecutionProvider) -> ort::Result<Session> {
    let session = Session::builder()?
        .with_execution_providers(execution_providers(provider))?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(model_path)?;
    Ok(session)
}

/// A YOLOv8 ONNX model behind the [`Detector`] seam.
pub struct OrtModelService {
    session: Session,
    labels: Labels,
    input_size: u32,
    min_probability: f32,
    iou_threshold: f32,
}

impl OrtModelService {
    pub fn new(
        model_path: &Path,
        model_config: &ModelConfig,
        provider: ExecutionProvider,
    ) -> Result<Self, InferenceError> {
        let session = build_session(model_path, provider)?;

        let labels = match &model_config.labels_file {
            Some(labels_file) => load_labels(labels_file).map_err(InferenceError::Labels)?,
            None => session
                .metadata()
                .ok()
                .and_then(|metadata| metadata.custom("names").ok().flatten())
                .and_then(|names| parse_names_metadata(&names))
                .unwrap_or_default(),
        };

        tracing::info!(
            "Loaded ONNX model {:?} with {} class labels ({:?})",
            model_path,
            labels.len(),
            provider
        );

        Ok(Self {
            session,
            labels,
            input_size: model_config.input_size,
            min_probability: model_config.min_probability,
            iou_threshold: model_config.iou_threshold,
        })
    }

    pub fn run_inference(
        &mut self,
        input: &Array<f32, Ix4>,
    ) -> Result<ArrayD<f32>, InferenceError> {
        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().into_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)?;
        let outputs = self.session.run(ort::inputs![tensor_ref])?;

        let output = outputs
            .get("output0")
            .ok_or_else(|| InferenceError::MissingOutput("output0".to_string()))?;
        let (shape, data) = output.try_extract_tensor::<f32>()?;

        let array = ArrayD::from_shape_vec(shape.to_ixdyn(), data.to_vec())?;
        Ok(array)
    }
}

impl Detector for OrtModelService {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<Detection>, InferenceError> {
        let (input, img_height, img_width) = transform_image(image, self.input_size);
        let outputs = self.run_inference(&input)?;

        if outputs.ndim() != 3 || outputs.shape()[0] != 1 || outputs.shape()[1] < 4 {
            return Err(InferenceError::OutputShape(outputs.shape().to_vec()));
        }

        let output = outputs.slice(s![0, .., ..]).into_dimensionality::<Ix2>()?;
        let detections = postprocess(
            output,
            Postprocess {
                input_size: self.input_size as f32,
                img_width: img_width as f32,
                img_height: img_height as f32,
                min_probability: self.min_probability,
                iou_threshold: self.iou_threshold,
            },
        );

        for (i, detection) in detections.iter().enumerate() {
            tracing::debug!(
                "Detection {}: class_id={}, confidence={:.3}, bbox=({}, {}, {}, {})",
                i,
                detection.class_id,
                detection.confidence,
                detection.bbox.x1(),
                detection.bbox.y1(),
                detection.bbox.x2(),
                detection.bbox.y2()
            );
        }

        Ok(detections)
    }

    fn labels(&self) -> &Labels {
        &self.labels
    }
}
