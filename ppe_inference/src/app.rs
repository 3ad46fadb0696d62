use crate::{
    annotate::Annotator,
    config::Config,
    error::InferenceError,
    model_service::Detector,
    ort_service::OrtModelService,
    pipeline::TwoStagePipeline,
};
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub person_model: PathBuf,
    pub ppe_model: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub images: usize,
    pub detections: usize,
}

pub struct App<R: Detector, I: Detector> {
    pipeline: TwoStagePipeline<R, I>,
    annotator: Annotator,
}

impl<R: Detector, I: Detector> App<R, I> {
    pub fn new(pipeline: TwoStagePipeline<R, I>, annotator: Annotator) -> Self {
        Self {
            pipeline,
            annotator,
        }
    }

    /// Annotates every file of `input_dir` into a same-named file in `output_dir`.
    /// The first image that fails stops the run.
    pub fn run(
        &mut self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<RunSummary, InferenceError> {
        fs::create_dir_all(output_dir)?;

        let mut summary = RunSummary::default();
        for path in list_files(input_dir)? {
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let output_path = output_dir.join(file_name);
            summary.detections += self.process_file(&path, &output_path)?;
            summary.images += 1;
        }

        Ok(summary)
    }

    fn process_file(&mut self, path: &Path, output_path: &Path) -> Result<usize, InferenceError> {
        let image = image::open(path).map_err(|source| InferenceError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let detections = self.pipeline.process(&image)?;
        tracing::info!(
            "{:?}: {} regions, {} items",
            path.file_name().unwrap_or_default(),
            detections.regions.len(),
            detections.items.len()
        );

        let mut canvas = image.to_rgb8();
        if self.annotator.draw_regions() {
            self.annotator.annotate(&mut canvas, &detections.regions);
        }
        self.annotator.annotate(&mut canvas, &detections.items);

        canvas.save(output_path).map_err(|source| InferenceError::Save {
            path: output_path.to_path_buf(),
            source,
        })?;

        Ok(detections.items.len())
    }
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, InferenceError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn start_app(config: Config, paths: RunPaths) -> Result<RunSummary, Box<dyn Error>> {
    let person_model = OrtModelService::new(
        &paths.person_model,
        &config.person_model,
        config.execution_provider,
    )?;
    let ppe_model =
        OrtModelService::new(&paths.ppe_model, &config.ppe_model, config.execution_provider)?;

    let pipeline = TwoStagePipeline::new(person_model, ppe_model, config.region_class);
    let annotator = Annotator::new(&config.annotation)?;
    let mut app = App::new(pipeline, annotator);

    let summary = app.run(&paths.input_dir, &paths.output_dir)?;
    tracing::info!(
        "Annotated {} images with {} detections into {:?}",
        summary.images,
        summary.detections,
        paths.output_dir
    );

    Ok(summary)
}
