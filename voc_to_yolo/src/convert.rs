use crate::{error::ConvertError, voc::VocAnnotation};
use ppe_core::{ClassVocabulary, NormalizedAnnotation};

/// Converts every object whose name is in `vocabulary`, in document order.
/// Objects with any other name are dropped without looking at their box.
pub fn convert_document(
    document: &VocAnnotation,
    vocabulary: &ClassVocabulary,
) -> Result<Vec<NormalizedAnnotation>, ConvertError> {
    let mut annotations = Vec::with_capacity(document.objects.len());

    for object in &document.objects {
        let name = object.name.trim();
        let Some(class_id) = vocabulary.index_of(name) else {
            tracing::debug!("Dropping object with unknown class {:?}", name);
            continue;
        };

        annotations.push(NormalizedAnnotation::from_pixel_box(
            class_id,
            object.corners()?,
            document.size.width,
            document.size.height,
        )?);
    }

    Ok(annotations)
}

pub fn convert_annotation(
    xml: &str,
    vocabulary: &ClassVocabulary,
) -> Result<Vec<NormalizedAnnotation>, ConvertError> {
    let document = VocAnnotation::from_xml(xml)?;
    convert_document(&document, vocabulary)
}

/// One line per annotation, no trailing newline.
pub fn render_lines(annotations: &[NormalizedAnnotation]) -> String {
    annotations
        .iter()
        .map(|annotation| annotation.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
