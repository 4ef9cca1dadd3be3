use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// UTF-8 text, or a `data:image/...;base64,...` URL when `is_image` is set.
    pub content: String,
    pub file_name: String,
    pub is_image: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub lab: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub doctor: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub report_type: Option<String>,
}

impl PatientInfo {
    pub fn has_identifying_info(&self) -> bool {
        self.name.is_some() || self.age.is_some() || self.lab.is_some() || self.doctor.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub result: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub normal_range: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
}

/// Normalized analysis of one document.
///
/// Deserialization is forgiving: the model is only asked to follow the schema,
/// so missing fields default and scalar values are stringified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "lenient_patient")]
    pub patient: Option<PatientInfo>,
    #[serde(default, deserialize_with = "lenient_parameters")]
    pub parameters: Vec<Parameter>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub recommendations: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "std::ops::Not::not",
        deserialize_with = "lenient_bool"
    )]
    pub raw_text: bool,
}

impl AnalysisResult {
    /// Shape returned when the model answered with something other than JSON.
    pub fn raw_fallback(text: impl Into<String>) -> Self {
        Self {
            patient: None,
            parameters: Vec::new(),
            summary: Some(text.into()),
            recommendations: Vec::new(),
            raw_text: true,
        }
    }

    /// Typed view of whatever JSON the relay returned. A document that is not an
    /// object is kept as raw text.
    pub fn from_document(document: Value) -> Self {
        match document {
            Value::Object(_) => Self::deserialize(&document)
                .unwrap_or_else(|_| Self::raw_fallback(document.to_string())),
            Value::String(text) => Self::raw_fallback(text),
            other => Self::raw_fallback(other.to_string()),
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        single => scalar_to_string(single).into_iter().collect(),
    };
    Ok(items)
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_patient<'de, D>(deserializer: D) -> Result<Option<PatientInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    let patient = match Value::deserialize(deserializer)? {
        document @ Value::Object(_) => PatientInfo::deserialize(document).ok(),
        _ => None,
    };
    Ok(patient)
}

/// Objects become parameters, bare scalars become a parameter carrying only a name.
/// Anything other than an array yields no parameters.
fn lenient_parameters<'de, D>(deserializer: D) -> Result<Vec<Parameter>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    let parameters = items
        .into_iter()
        .filter_map(|item| match item {
            document @ Value::Object(_) => Parameter::deserialize(document).ok(),
            other => scalar_to_string(other).map(|name| Parameter {
                name,
                ..Parameter::default()
            }),
        })
        .collect();
    Ok(parameters)
}
