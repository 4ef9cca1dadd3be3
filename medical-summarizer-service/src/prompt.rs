use serde::{Deserialize, Serialize};

use crate::models::UploadRequest;

pub const SYSTEM_PROMPT: &str = r#"You are an expert medical document analyzer. When given a medical document (report, prescription, lab result, clinical notes, or medical image), you MUST return a JSON response with the following structure. Do NOT return markdown. Return ONLY valid JSON.

{
  "patient": {
    "name": "Patient name or null",
    "age": "Age or null",
    "gender": "Gender or null",
    "date": "Report date or null",
    "lab": "Lab/hospital name or null",
    "doctor": "Doctor name or null",
    "reportType": "e.g. CBC, Blood Panel, Lipid Profile, etc."
  },
  "parameters": [
    {
      "name": "Parameter name (e.g. Hemoglobin)",
      "result": "Observed value with unit (e.g. 14 g/dL)",
      "normalRange": "Reference range (e.g. 13-17 g/dL)",
      "status": "Normal | Slightly High | Slightly Low | High | Low | Borderline High | Borderline Low | Critical High | Critical Low"
    }
  ],
  "summary": "A brief 2-3 sentence overall assessment of the report highlighting any concerns.",
  "recommendations": ["Recommendation 1", "Recommendation 2"]
}

Rules:
- Extract ALL parameters from the document
- Compare each value against the reference range to determine status
- Use the reference ranges for the patient's sex when it is known (e.g. male ranges for male patients)
- "Normal" = within range, "Slightly High/Low" = marginally outside, "High/Low" = significantly outside, "Borderline High/Low" = at the edge of the range, "Critical" = dangerously outside
- If the document does not state a range, use standard medical reference ranges
- Return ONLY the JSON object, no other text, no markdown code blocks"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

/// Body of a chat-completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn for_upload(model: &str, upload: &UploadRequest) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: MessageContent::Text(SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: Role::User,
                    content: MessageContent::Parts(user_content(upload)),
                },
            ],
        }
    }
}

pub fn user_content(upload: &UploadRequest) -> Vec<ContentPart> {
    if upload.is_image {
        vec![
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: upload.content.clone(),
                },
            },
            ContentPart::Text {
                text: format!(
                    "Analyze this medical document image named \"{}\". Extract all parameters and return structured JSON.",
                    upload.file_name
                ),
            },
        ]
    } else {
        vec![ContentPart::Text {
            text: format!(
                "Analyze this medical document named \"{}\" and return structured JSON:\n\n{}",
                upload.file_name, upload.content
            ),
        }]
    }
}
