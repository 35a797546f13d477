//! Imaging study payload and its decoding from upstream response bodies.
//!
//! The cache only reads `id`, `patientId` and `relatedStudyIds`. Every other
//! field of the upstream object is carried through untouched, so a cached study
//! serializes back to exactly what the imaging API sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ImagingError, Result};

/// Fixed accounting overhead per cached entry (key, timestamps, map slot).
pub const ENTRY_OVERHEAD_BYTES: u64 = 512;

const RELATED_STUDY_IDS: &str = "relatedStudyIds";

// == Imaging Study ==
/// Metadata for one imaging study as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingStudy {
    pub id: String,
    pub patient_id: String,
    /// Remaining upstream fields (study date, modality, status, ...) as sent
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ImagingStudy {
    pub fn new(id: impl Into<String>, patient_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            attributes: Map::new(),
        }
    }

    /// Sets an upstream attribute, replacing any previous value.
    pub fn with_attribute(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Ids listed under `relatedStudyIds`. Non-string items are skipped.
    pub fn related_study_ids(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get(RELATED_STUDY_IDS)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    /// Estimated cache footprint in bytes.
    ///
    /// Serialized JSON length plus [`ENTRY_OVERHEAD_BYTES`]. With compression the
    /// payload portion counts at half its length, rounded up.
    pub fn estimated_size_bytes(&self, compression_enabled: bool) -> u64 {
        let payload = serde_json::to_vec(self).map(|v| v.len() as u64).unwrap_or(0);
        let payload = if compression_enabled {
            payload.div_ceil(2)
        } else {
            payload
        };
        ENTRY_OVERHEAD_BYTES + payload
    }
}

// == Decoding ==
/// Decodes an upstream success body into a study.
///
/// Classification:
/// - body is not JSON: `InvalidJson`
/// - JSON but not an object: `InvalidResponseFormat`
/// - object without a string `id` or `patientId`: `MissingStudyData`
pub fn decode_study(body: &str) -> Result<ImagingStudy> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ImagingError::InvalidJson(e.to_string()))?;

    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(ImagingError::InvalidResponseFormat(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    let id = take_string(&mut object, "id")?;
    let patient_id = take_string(&mut object, "patientId")?;

    Ok(ImagingStudy {
        id,
        patient_id,
        attributes: object,
    })
}

fn take_string(object: &mut Map<String, Value>, field: &str) -> Result<String> {
    match object.remove(field) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(ImagingError::MissingStudyData(format!(
            "field `{}` must be a string, got {}",
            field,
            json_type_name(&other)
        ))),
        None => Err(ImagingError::MissingStudyData(format!(
            "missing field `{}`",
            field
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
