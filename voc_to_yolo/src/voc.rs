use crate::error::ConvertError;
use serde::Deserialize;
use std::io::BufRead;

/// The parts of a Pascal VOC annotation document used for conversion.
/// Other elements (`folder`, `source`, `pose`, `difficult`, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct VocAnnotation {
    pub size: VocSize,
    #[serde(rename = "object", default)]
    pub objects: Vec<VocObject>,
}

#[derive(Debug, Deserialize)]
pub struct VocSize {
    pub width: u32,
    pub height: u32,
}

/// Objects keep their box as raw text. It is only parsed for objects whose
/// class is converted, so a dropped object may have a missing or odd box.
#[derive(Debug, Deserialize)]
pub struct VocObject {
    pub name: String,
    #[serde(default)]
    pub bndbox: Option<VocBndBox>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct VocBndBox {
    #[serde(default)]
    pub xmin: Option<String>,
    #[serde(default)]
    pub ymin: Option<String>,
    #[serde(default)]
    pub xmax: Option<String>,
    #[serde(default)]
    pub ymax: Option<String>,
}

impl VocBndBox {
    pub fn corners(&self) -> Result<(i64, i64, i64, i64), ConvertError> {
        Ok((
            coordinate("xmin", &self.xmin)?,
            coordinate("ymin", &self.ymin)?,
            coordinate("xmax", &self.xmax)?,
            coordinate("ymax", &self.ymax)?,
        ))
    }
}

fn coordinate(field: &'static str, value: &Option<String>) -> Result<i64, ConvertError> {
    let value = value.as_deref().ok_or(ConvertError::MissingField(field))?;
    value.trim().parse().map_err(|_| ConvertError::InvalidCoordinate {
        field,
        value: value.to_string(),
    })
}

impl VocObject {
    pub fn corners(&self) -> Result<(i64, i64, i64, i64), ConvertError> {
        self.bndbox
            .as_ref()
            .ok_or(ConvertError::MissingField("bndbox"))?
            .corners()
    }
}

impl VocAnnotation {
    pub fn from_xml(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// Reads a document, decoding it with the encoding its XML declaration names.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_reader(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELIMG_DOCUMENT: &str = r#"<annotation>
    <folder>images</folder>
    <filename>site_042.jpg</filename>
    <path>/data/images/site_042.jpg</path>
    <source><database>Unknown</database></source>
    <size>
        <width>1000</width>
        <height>500</height>
        <depth>3</depth>
    </size>
    <segmented>0</segmented>
    <object>
        <name>vest</name>
        <pose>Unspecified</pose>
        <truncated>0</truncated>
        <difficult>0</difficult>
        <bndbox>
            <xmin>100</xmin>
            <ymin>100</ymin>
            <xmax>300</xmax>
            <ymax>300</ymax>
        </bndbox>
    </object>
    <object>
        <name>cat</name>
        <bndbox>
            <xmin>5</xmin>
            <ymin>6</ymin>
            <xmax>7</xmax>
            <ymax>8</ymax>
        </bndbox>
    </object>
</annotation>"#;

    #[test]
    fn test_parse_labelimg_document() {
        let annotation = VocAnnotation::from_xml(LABELIMG_DOCUMENT).unwrap();

        assert_eq!(annotation.size.width, 1000);
        assert_eq!(annotation.size.height, 500);
        assert_eq!(annotation.objects.len(), 2);
        assert_eq!(annotation.objects[0].name, "vest");
        assert_eq!(annotation.objects[0].corners().unwrap(), (100, 100, 300, 300));
        assert_eq!(annotation.objects[1].name, "cat");
    }

    #[test]
    fn test_parse_interleaved_objects() {
        let xml = r#"<annotation>
            <object><name>boots</name><bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox></object>
            <size><width>10</width><height>10</height></size>
            <object><name>mask</name><bndbox><xmin>5</xmin><ymin>6</ymin><xmax>7</xmax><ymax>8</ymax></bndbox></object>
        </annotation>"#;

        let annotation = VocAnnotation::from_xml(xml).unwrap();

        assert_eq!(annotation.objects.len(), 2);
        assert_eq!(annotation.objects[1].name, "mask");
    }

    #[test]
    fn test_document_without_objects() {
        let xml = "<annotation><size><width>640</width><height>480</height></size></annotation>";

        let annotation = VocAnnotation::from_xml(xml).unwrap();
        assert!(annotation.objects.is_empty());
    }

    #[test]
    fn test_missing_fields_are_errors() {
        let no_size = "<annotation><object><name>vest</name></object></annotation>";
        assert!(VocAnnotation::from_xml(no_size).is_err());

        let bad_number = "<annotation><size><width>wide</width><height>4</height></size></annotation>";
        assert!(VocAnnotation::from_xml(bad_number).is_err());
    }

    #[test]
    fn test_boxes_are_checked_on_demand() {
        let xml = "<annotation><size><width>6</width><height>4</height></size>\
                   <object><name>vest</name></object>\
                   <object><name>mask</name><bndbox><xmin>1.5</xmin><ymin>0</ymin>\
                   <xmax>2</xmax><ymax>3</ymax></bndbox></object>\
                   <object><name>gloves</name><bndbox><xmin>1</xmin></bndbox></object>\
                   </annotation>";

        let annotation = VocAnnotation::from_xml(xml).unwrap();

        assert!(matches!(
            annotation.objects[0].corners(),
            Err(ConvertError::MissingField("bndbox"))
        ));
        assert!(matches!(
            annotation.objects[1].corners(),
            Err(ConvertError::InvalidCoordinate { field: "xmin", .. })
        ));
        assert!(matches!(
            annotation.objects[2].corners(),
            Err(ConvertError::MissingField("ymin"))
        ));
    }

    #[test]
    fn test_from_reader_honours_declared_encoding() {
        let mut xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
            <annotation><size><width>10</width><height>10</height></size>\
            <object><name>vest</name><bndbox><xmin>1</xmin><ymin>2</ymin>\
            <xmax>3</xmax><ymax>4</ymax></bndbox></object><object><name>prot"
            .to_vec();
        xml.push(0xE8);
        xml.extend_from_slice(b"ge-oreilles</name></object></annotation>");

        let annotation = VocAnnotation::from_reader(xml.as_slice()).unwrap();

        assert_eq!(annotation.objects[0].name, "vest");
        assert_eq!(annotation.objects[0].corners().unwrap(), (1, 2, 3, 4));
        assert_eq!(annotation.objects[1].name, "prot\u{e8}ge-oreilles");
    }
}
