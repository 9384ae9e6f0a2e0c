use crate::model::ListingRecord;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tracing::warn;

const SYSTEM_PROMPT: &str = "Bạn là trợ lý phân tích tin thuê nhà.";

/// Classification returned by the language model
///
/// Every field decodes leniently: a value of the wrong type becomes `None`
/// instead of failing the whole reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmInsights {
    #[serde(default, deserialize_with = "string_list")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, alias = "room_type", deserialize_with = "lenient")]
    pub room_type: Option<String>,
    #[serde(default, alias = "is_owner", deserialize_with = "lenient")]
    pub is_owner: Option<bool>,
    #[serde(default, alias = "spam_score", deserialize_with = "lenient")]
    pub spam_score: Option<f64>,
}

impl LlmInsights {
    /// Parses the model's JSON reply
    pub fn from_reply(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Copies the insights onto a record
    ///
    /// `amenities` is always set (empty when the reply had no list). A spam
    /// score outside `[0, 1]` is discarded.
    pub fn apply_to(self, record: &mut ListingRecord) {
        record.amenities = Some(self.amenities.unwrap_or_default());
        if let Some(room_type) = self.room_type.filter(|r| !r.trim().is_empty()) {
            record.room_type = Some(room_type);
        }
        if let Some(is_owner) = self.is_owner {
            record.is_owner = Some(is_owner);
        }
        if let Some(score) = self.spam_score.filter(|s| (0.0..=1.0).contains(s)) {
            record.spam_score = Some(score);
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Composes the user prompt for one listing
pub fn build_prompt(record: &ListingRecord) -> String {
    format!(
        "Bạn là trợ lý giúp phân tích tin thuê nhà tại Việt Nam. Trả về JSON với các trường: \
         amenities (array), roomType (string), isOwner (boolean), spamScore (0-1). \
         Dựa trên tiêu đề và mô tả dưới đây. Không giải thích thêm, chỉ JSON.\n\
         Tiêu đề: {}\nMô tả: {}\nĐịa chỉ: {}",
        record.title,
        record.raw_description.as_deref().unwrap_or_default(),
        record.address.as_deref().unwrap_or_default(),
    )
}

/// Asks the chat-completions API to classify one listing
pub async fn classify_listing(
    client: &Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    record: &ListingRecord,
) -> Result<LlmInsights, String> {
    let body = json!({
        "model": model,
        "response_format": {"type": "json_object"},
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": build_prompt(record)},
        ],
    });

    let response = client
        .post(format!("{}/chat/completions", base_url.trim_end_matches('/')))
        .header(AUTHORIZATION, format!("Bearer {}", api_key))
        .header(CONTENT_TYPE, "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        warn!("Chat completion returned {}", status);
        return Err(format!("LLM API {}", status.as_u16()));
    }

    let chat: ChatResponse = response.json().await.map_err(|e| e.to_string())?;
    let content = chat
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_else(|| "{}".to_string());

    LlmInsights::from_reply(&content).map_err(|e| format!("Unreadable LLM reply: {}", e))
}
