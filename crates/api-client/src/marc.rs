//! Minimal MARC record model
//!
//! Source record storage returns bibliographic records as MARC-in-JSON:
//!
//! ```json
//! {
//!   "leader": "01234nam a2200289 a 4500",
//!   "fields": [
//!     { "001": "a123" },
//!     { "245": { "ind1": "1", "ind2": "0", "subfields": [{ "a": "Title" }] } }
//!   ]
//! }
//! ```
//!
//! [`MarcRecord`] reads that shape, supports the few edits the client needs,
//! and writes MARCXML in the Library of Congress slim schema.

use crate::error::{FolioError, FolioResult};
use quick_xml::se::to_string as xml_to_string;
use serde::Serialize;
use serde_json::Value;

/// The MARCXML namespace URI
const MARCXML_NS: &str = "http://www.loc.gov/MARC21/slim";

/// A subfield of a data field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    /// Single-character subfield code
    pub code: String,
    /// Subfield content
    pub value: String,
}

/// A variable field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarcField {
    /// Control field (001-009), a tag and an unstructured value
    Control {
        /// Field tag
        tag: String,
        /// Field value
        value: String,
    },
    /// Data field with indicators and subfields
    Data {
        /// Field tag
        tag: String,
        /// First indicator
        ind1: String,
        /// Second indicator
        ind2: String,
        /// Subfields in record order
        subfields: Vec<Subfield>,
    },
}

impl MarcField {
    /// Field tag
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Control { tag, .. } | Self::Data { tag, .. } => tag,
        }
    }
}

/// A MARC bibliographic record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarcRecord {
    /// 24-character leader
    pub leader: String,
    /// Fields in record order
    pub fields: Vec<MarcField>,
}

impl MarcRecord {
    /// Parse a MARC-in-JSON value
    ///
    /// # Errors
    ///
    /// [`FolioError::Marc`] when the value does not have the MARC-in-JSON shape.
    pub fn from_marc_json(json: &Value) -> FolioResult<Self> {
        let leader = json
            .get("leader")
            .and_then(Value::as_str)
            .ok_or_else(|| FolioError::Marc("record has no leader".to_string()))?
            .to_string();

        let fields = json
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| FolioError::Marc("record has no fields list".to_string()))?
            .iter()
            .map(parse_field)
            .collect::<FolioResult<Vec<_>>>()?;

        Ok(Self { leader, fields })
    }

    /// Copy of this record without any field whose tag is listed
    #[must_use]
    pub fn without_tags(&self, tags: &[&str]) -> Self {
        Self {
            leader: self.leader.clone(),
            fields: self
                .fields
                .iter()
                .filter(|field| !tags.contains(&field.tag()))
                .cloned()
                .collect(),
        }
    }

    /// Replace every field with `tag` by a single control field, placed in tag order
    pub fn set_control_field(&mut self, tag: &str, value: impl Into<String>) {
        self.fields.retain(|field| field.tag() != tag);
        let position = self
            .fields
            .iter()
            .position(|field| field.tag() > tag)
            .unwrap_or(self.fields.len());
        self.fields.insert(
            position,
            MarcField::Control {
                tag: tag.to_string(),
                value: value.into(),
            },
        );
    }

    /// Serialize as a MARCXML `<record>` element
    ///
    /// # Errors
    ///
    /// [`FolioError::Marc`] if XML serialization fails.
    pub fn to_marcxml(&self) -> FolioResult<String> {
        let mut record = XmlRecord {
            leader: self.leader.clone(),
            controlfield: Vec::new(),
            datafield: Vec::new(),
        };

        for field in &self.fields {
            match field {
                MarcField::Control { tag, value } => record.controlfield.push(XmlControlField {
                    tag: tag.clone(),
                    value: value.clone(),
                }),
                MarcField::Data {
                    tag,
                    ind1,
                    ind2,
                    subfields,
                } => record.datafield.push(XmlDataField {
                    tag: tag.clone(),
                    ind1: ind1.clone(),
                    ind2: ind2.clone(),
                    subfield: subfields
                        .iter()
                        .map(|subfield| XmlSubfield {
                            code: subfield.code.clone(),
                            value: subfield.value.clone(),
                        })
                        .collect(),
                }),
            }
        }

        let body = xml_to_string(&record)
            .map_err(|e| FolioError::Marc(format!("Failed to serialize to MARCXML: {e}")))?;
        let body = body.replacen("<record>", &format!("<record xmlns=\"{MARCXML_NS}\">"), 1);

        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"))
    }
}

fn parse_field(entry: &Value) -> FolioResult<MarcField> {
    let (tag, content) = entry
        .as_object()
        .filter(|object| object.len() == 1)
        .and_then(|object| object.iter().next())
        .ok_or_else(|| FolioError::Marc(format!("field must be a single-key object: {entry}")))?;

    if let Some(value) = content.as_str() {
        return Ok(MarcField::Control {
            tag: tag.clone(),
            value: value.to_string(),
        });
    }

    let indicator = |name: &str| {
        content
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or(" ")
            .to_string()
    };

    let subfields = content
        .get("subfields")
        .and_then(Value::as_array)
        .ok_or_else(|| FolioError::Marc(format!("data field {tag} has no subfields")))?
        .iter()
        .map(|subfield| {
            subfield
                .as_object()
                .and_then(|object| object.iter().next())
                .and_then(|(code, value)| {
                    Some(Subfield {
                        code: code.clone(),
                        value: value.as_str()?.to_string(),
                    })
                })
                .ok_or_else(|| FolioError::Marc(format!("malformed subfield in {tag}: {subfield}")))
        })
        .collect::<FolioResult<Vec<_>>>()?;

    Ok(MarcField::Data {
        tag: tag.clone(),
        ind1: indicator("ind1"),
        ind2: indicator("ind2"),
        subfields,
    })
}

#[derive(Serialize)]
#[serde(rename = "record")]
struct XmlRecord {
    leader: String,
    controlfield: Vec<XmlControlField>,
    datafield: Vec<XmlDataField>,
}

#[derive(Serialize)]
struct XmlControlField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(rename = "$value")]
    value: String,
}

#[derive(Serialize)]
struct XmlDataField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(rename = "@ind1")]
    ind1: String,
    #[serde(rename = "@ind2")]
    ind2: String,
    subfield: Vec<XmlSubfield>,
}

#[derive(Serialize)]
struct XmlSubfield {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "$value")]
    value: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_marc_json() -> Value {
        json!({
            "leader": "00426nam a2200133 a 4500",
            "fields": [
                { "001": "old-hrid" },
                { "003": "OCoLC" },
                { "008": "750409s1961||||enk           ||| | eng  " },
                { "245": { "ind1": "1", "ind2": "0", "subfields": [
                    { "a": "Gaudy night /" },
                    { "c": "Dorothy L. Sayers & co." }
                ] } },
                { "999": { "ind1": "f", "ind2": "f", "subfields": [{ "i": "instance-uuid" }] } }
            ]
        })
    }

    fn field<'a>(record: &'a MarcRecord, tag: &str) -> Option<&'a MarcField> {
        record.fields.iter().find(|field| field.tag() == tag)
    }

    #[test]
    fn test_from_marc_json() {
        let record = MarcRecord::from_marc_json(&sample_marc_json()).unwrap();
        assert_eq!(record.leader, "00426nam a2200133 a 4500");
        assert_eq!(record.fields.len(), 5);
        assert_eq!(
            field(&record, "001"),
            Some(&MarcField::Control {
                tag: "001".to_string(),
                value: "old-hrid".to_string()
            })
        );
        let Some(MarcField::Data { ind1, subfields, .. }) = field(&record, "245") else {
            panic!("245 should be a data field");
        };
        assert_eq!(ind1, "1");
        assert_eq!(subfields.len(), 2);
        assert_eq!(subfields[1].code, "c");
    }

    #[test]
    fn test_malformed_json_is_marc_error() {
        assert!(matches!(
            MarcRecord::from_marc_json(&json!({"fields": []})),
            Err(FolioError::Marc(_))
        ));
        assert!(matches!(
            MarcRecord::from_marc_json(&json!({"leader": "x", "fields": [{"001": "a", "003": "b"}]})),
            Err(FolioError::Marc(_))
        ));
        assert!(matches!(
            MarcRecord::from_marc_json(&json!({"leader": "x", "fields": [{"245": {"ind1": " "}}]})),
            Err(FolioError::Marc(_))
        ));
    }

    #[test]
    fn test_without_tags_and_set_control_field() {
        let mut record = MarcRecord::from_marc_json(&sample_marc_json())
            .unwrap()
            .without_tags(&["001", "003"]);
        assert!(field(&record, "001").is_none());
        assert!(field(&record, "003").is_none());

        record.set_control_field("001", "a666");
        record.set_control_field("003", "FOLIO");

        let tags: Vec<&str> = record.fields.iter().map(MarcField::tag).collect();
        assert_eq!(tags, ["001", "003", "008", "245", "999"]);
    }

    #[test]
    fn test_to_marcxml() {
        let mut record = MarcRecord::from_marc_json(&sample_marc_json()).unwrap();
        record.set_control_field("001", "a666");
        let xml = record.to_marcxml().unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"<record xmlns="http://www.loc.gov/MARC21/slim">"#));
        assert!(xml.contains("<leader>00426nam a2200133 a 4500</leader>"));
        assert!(xml.contains(r#"<controlfield tag="001">a666</controlfield>"#));
        assert!(!xml.contains("old-hrid"));
        assert!(xml.contains(r#"<datafield tag="245" ind1="1" ind2="0">"#));
        assert!(xml.contains(r#"<subfield code="a">Gaudy night /</subfield>"#));
        assert!(xml.contains("Dorothy L. Sayers &amp; co."));
        assert!(xml.find("<controlfield").unwrap() < xml.find("<datafield").unwrap());
    }
}
