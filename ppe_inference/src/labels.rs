use image::Rgb;
use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

pub const DEFAULT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

#[derive(Debug, Clone, PartialEq)]
pub struct ColorLabel {
    pub label: String,
    pub color: Rgb<u8>,
}

impl ColorLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: DEFAULT_COLOR,
        }
    }
}

/// Class-name table of one model, indexed by class id.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    class_labels: Vec<ColorLabel>,
}

impl Labels {
    pub fn new(class_labels: Vec<ColorLabel>) -> Self {
        Self { class_labels }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(ColorLabel::new).collect())
    }

    pub fn name(&self, class_id: usize) -> String {
        match self.class_labels.get(class_id) {
            Some(color_label) => color_label.label.clone(),
            None => format!("Unknown class {}", class_id),
        }
    }

    pub fn color(&self, class_id: usize) -> Rgb<u8> {
        self.class_labels
            .get(class_id)
            .map(|color_label| color_label.color)
            .unwrap_or(DEFAULT_COLOR)
    }

    pub fn len(&self) -> usize {
        self.class_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_labels.is_empty()
    }
}

/// Reads one class per line, either `label` or `label,red,green,blue`.
pub fn load_labels(filepath: &Path) -> io::Result<Labels> {
    let file = File::open(filepath)?;
    let reader = io::BufReader::new(file);
    let mut color_labels = Vec::new();

    for line_result in reader.lines() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        color_labels.push(parse_label_line(&line)?);
    }

    Ok(Labels::new(color_labels))
}

fn parse_label_line(line: &str) -> io::Result<ColorLabel> {
    let parts: Vec<&str> = line.split(',').collect();

    match parts.as_slice() {
        [label] => Ok(ColorLabel::new(label.trim())),
        [label, red, green, blue] => Ok(ColorLabel {
            label: label.trim().to_string(),
            color: Rgb([
                parse_channel(red, "red")?,
                parse_channel(green, "green")?,
                parse_channel(blue, "blue")?,
            ]),
        }),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid line format: {}", line),
        )),
    }
}

fn parse_channel(value: &str, channel: &str) -> io::Result<u8> {
    value.trim().parse().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid {} value", channel),
        )
    })
}

/// Parses the `names` entry Ultralytics writes into exported ONNX metadata,
/// e.g. `{0: 'person', 1: 'hard-hat'}`.
pub fn parse_names_metadata(raw: &str) -> Option<Labels> {
    let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
    let mut entries = Vec::new();

    for entry in body.split(',').filter(|entry| !entry.trim().is_empty()) {
        let (index, name) = entry.split_once(':')?;
        let index: usize = index.trim().parse().ok()?;
        let name = name.trim().trim_matches(|c| c == '\'' || c == '"');
        entries.push((index, name.to_string()));
    }

    entries.sort_by_key(|(index, _)| *index);
    let dense = entries
        .iter()
        .enumerate()
        .all(|(position, (index, _))| position == *index);
    if !dense {
        return None;
    }

    Some(Labels::from_names(entries.into_iter().map(|(_, name)| name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_labels_with_and_without_colors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hard-hat,255,200,0").unwrap();
        writeln!(file, "vest").unwrap();
        writeln!(file).unwrap();
        writeln!(file, " gloves , 0, 0, 255").unwrap();

        let labels = load_labels(file.path()).unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.name(0), "hard-hat");
        assert_eq!(labels.color(0), Rgb([255, 200, 0]));
        assert_eq!(labels.name(1), "vest");
        assert_eq!(labels.color(1), DEFAULT_COLOR);
        assert_eq!(labels.name(2), "gloves");
        assert_eq!(labels.color(2), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_load_labels_rejects_bad_color() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mask,300,0,0").unwrap();

        let err = load_labels(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_unknown_class() {
        let labels = Labels::from_names(["person"]);

        assert_eq!(labels.name(4), "Unknown class 4");
        assert_eq!(labels.color(4), DEFAULT_COLOR);
    }

    #[test]
    fn test_parse_names_metadata() {
        let labels = parse_names_metadata("{0: 'hard-hat', 2: 'mask', 1: \"gloves\"}").unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.name(0), "hard-hat");
        assert_eq!(labels.name(1), "gloves");
        assert_eq!(labels.name(2), "mask");
    }

    #[test]
    fn test_parse_names_metadata_rejects_malformed() {
        assert!(parse_names_metadata("person, vest").is_none());
        assert!(parse_names_metadata("{0: 'person', 2: 'vest'}").is_none());
        assert!(parse_names_metadata("{zero: 'person'}").is_none());
    }
}
