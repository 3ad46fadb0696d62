use crate::{
    config::Config,
    convert::{convert_document, render_lines},
    error::ConvertError,
    voc::VocAnnotation,
};
use ppe_core::ClassVocabulary;
use std::{
    fs,
    io::BufReader,
    path::{Path, PathBuf},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub files: usize,
    pub annotations: usize,
    pub dropped: usize,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConvertError + '_ {
    move |source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `<stem>.txt` into `output_dir` for every `*.xml` file of `input_dir`.
/// A `.txt` file is written even when none of its objects are kept.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
    vocabulary: &ClassVocabulary,
) -> Result<ConversionSummary, ConvertError> {
    fs::create_dir_all(output_dir).map_err(io_error(output_dir))?;

    let mut summary = ConversionSummary::default();
    for xml_path in list_xml_files(input_dir)? {
        let file = fs::File::open(&xml_path).map_err(io_error(&xml_path))?;
        let document = VocAnnotation::from_reader(BufReader::new(file))
            .map_err(ConvertError::from)
            .map_err(|e| ConvertError::Document {
                path: xml_path.clone(),
                source: Box::new(e),
            })?;
        let annotations =
            convert_document(&document, vocabulary).map_err(|e| ConvertError::Document {
                path: xml_path.clone(),
                source: Box::new(e),
            })?;

        let txt_path = output_dir.join(txt_file_name(&xml_path));
        fs::write(&txt_path, render_lines(&annotations)).map_err(io_error(&txt_path))?;

        tracing::debug!(
            "{:?}: kept {} of {} objects",
            xml_path,
            annotations.len(),
            document.objects.len()
        );
        summary.files += 1;
        summary.annotations += annotations.len();
        summary.dropped += document.objects.len() - annotations.len();
    }

    Ok(summary)
}

fn list_xml_files(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        let is_xml = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(".xml"));
        if is_xml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn txt_file_name(xml_path: &Path) -> PathBuf {
    let stem = xml_path.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push(".txt");
    PathBuf::from(name)
}

pub fn start_app(
    config: Config,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<ConversionSummary, ConvertError> {
    let summary = convert_directory(input_dir, output_dir, &config.classes)?;
    tracing::info!(
        "Conversion completed! {} files, {} annotations ({} dropped) saved in {:?}",
        summary.files,
        summary.annotations,
        summary.dropped,
        output_dir
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE_XML: &str = "<annotation><size><width>1000</width><height>500</height></size>\
        <object><name>vest</name><bndbox><xmin>100</xmin><ymin>100</ymin><xmax>300</xmax><ymax>300</ymax></bndbox></object>\
        <object><name>cat</name><bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox></object>\
        </annotation>";

    const EMPTY_XML: &str =
        "<annotation><size><width>640</width><height>480</height></size></annotation>";

    #[test]
    fn test_convert_directory() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_root = tempfile::tempdir().unwrap();
        let output_dir = output_root.path().join("labels");

        fs::write(input_dir.path().join("site.xml"), SITE_XML).unwrap();
        fs::write(input_dir.path().join("empty.xml"), EMPTY_XML).unwrap();
        fs::write(input_dir.path().join("README.md"), "not an annotation").unwrap();
        fs::write(input_dir.path().join("site.xml.bak"), "stale").unwrap();

        let summary =
            convert_directory(input_dir.path(), &output_dir, &ClassVocabulary::default()).unwrap();

        assert_eq!(
            summary,
            ConversionSummary {
                files: 2,
                annotations: 1,
                dropped: 1
            }
        );
        assert_eq!(
            fs::read_to_string(output_dir.join("site.txt")).unwrap(),
            "6 0.200000 0.400000 0.200000 0.400000"
        );
        assert_eq!(fs::read_to_string(output_dir.join("empty.txt")).unwrap(), "");
        assert!(!output_dir.join("README.txt").exists());
        assert!(!output_dir.join("site.xml.txt").exists());
    }

    #[test]
    fn test_malformed_document_names_the_file() {
        let input_dir = tempfile::tempdir().unwrap();
        let output_dir = tempfile::tempdir().unwrap();
        fs::write(input_dir.path().join("broken.xml"), "<annotation><size>").unwrap();

        let err = convert_directory(
            input_dir.path(),
            output_dir.path(),
            &ClassVocabulary::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ConvertError::Document { .. }));
        assert!(err.to_string().contains("broken.xml"));
    }

    #[test]
    fn test_missing_input_directory() {
        let output_dir = tempfile::tempdir().unwrap();
        let missing = output_dir.path().join("missing");

        let err = convert_directory(&missing, output_dir.path(), &ClassVocabulary::default())
            .unwrap_err();

        assert!(matches!(err, ConvertError::Io { .. }));
    }

    #[test]
    fn test_txt_file_name() {
        assert_eq!(txt_file_name(Path::new("/a/b/site.xml")), PathBuf::from("site.txt"));
        assert_eq!(txt_file_name(Path::new("x.y.xml")), PathBuf::from("x.y.txt"));
    }
}
