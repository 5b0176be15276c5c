//! Analysis response contract.
//!
//! The backend payload is generated by an external service and is not fully
//! trusted. Only `symptom_analysis` is mandatory; every other field is
//! optional and `null`-tolerant so an incomplete payload degrades to empty
//! sections instead of failing.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Why a response body could not be accepted.
#[derive(Debug, thiserror::Error)]
pub enum MalformedResponse {
    #[error("response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response body is not a JSON object")]
    NotAnObject,
}

/// Full analysis returned by `POST /api/analyze-symptom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub symptom_analysis: String,

    #[serde(default, deserialize_with = "text")]
    pub ai_web_research: String,

    #[serde(default)]
    pub risk_assessment: RiskAssessment,

    #[serde(default, deserialize_with = "text_list")]
    pub personalized_tips: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub diet_plan: DietPlan,

    #[serde(default, deserialize_with = "null_as_default")]
    pub possible_causes: Vec<PossibleCause>,

    #[serde(default, deserialize_with = "text_list")]
    pub lifestyle_suggestions: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub ai_insights: Vec<AiInsight>,

    #[serde(default, deserialize_with = "text_list")]
    pub red_flags: Vec<String>,

    #[serde(default, deserialize_with = "text")]
    pub medical_disclaimer: String,

    #[serde(default)]
    pub search_timestamp: SearchTimestamp,
}

impl AnalysisResponse {
    /// Parse and normalize a response body.
    ///
    /// # Errors
    /// Returns `MalformedResponse` if the body is not a JSON object or lacks a
    /// string `symptom_analysis`.
    pub fn from_json(body: &str) -> Result<Self, MalformedResponse> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(MalformedResponse::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Dietary guidance. Each list may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    #[serde(default, deserialize_with = "text_list")]
    pub foods_to_consume: Vec<String>,

    #[serde(default, deserialize_with = "text_list")]
    pub foods_to_avoid: Vec<String>,

    #[serde(default, deserialize_with = "text_list")]
    pub nutritional_focus: Vec<String>,

    #[serde(default, deserialize_with = "text_list")]
    pub supplements: Vec<String>,

    #[serde(default, deserialize_with = "text_list")]
    pub meal_suggestions: Vec<String>,
}

impl DietPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.foods_to_consume.is_empty()
            && self.foods_to_avoid.is_empty()
            && self.nutritional_focus.is_empty()
            && self.supplements.is_empty()
            && self.meal_suggestions.is_empty()
    }
}

/// Urgency attached to a possible cause.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Urgency {
    High,
    Medium,
    Low,
    /// Anything else the backend sent, kept verbatim.
    Other(String),
    #[default]
    Unspecified,
}

impl Urgency {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "" => Self::Unspecified,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Other(raw.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Other(s) => s,
            Self::Unspecified => "",
        }
    }
}

impl Serialize for Urgency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Urgency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        text(deserializer).map(|s| Self::parse(&s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PossibleCause {
    #[serde(default, deserialize_with = "text")]
    pub condition: String,

    #[serde(default)]
    pub urgency_level: Urgency,

    #[serde(default, deserialize_with = "text")]
    pub probability: String,

    #[serde(default, deserialize_with = "text")]
    pub ai_confidence: String,

    #[serde(default, deserialize_with = "text")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiInsight {
    #[serde(default, deserialize_with = "text")]
    pub title: String,

    #[serde(default, deserialize_with = "text")]
    pub insight_type: String,

    #[serde(default, deserialize_with = "text")]
    pub description: String,

    #[serde(default, deserialize_with = "text")]
    pub recommendation: String,

    #[serde(default, deserialize_with = "text")]
    pub evidence_level: String,
}

/// Free-form risk factors in backend order.
///
/// Non-string values are stringified; `null` values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskAssessment(pub Vec<(String, String)>);

impl RiskAssessment {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for RiskAssessment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RiskAssessment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Self(
            raw.unwrap_or_default()
                .into_iter()
                .filter_map(|(k, v)| value_to_text(v).map(|v| (k, v)))
                .collect(),
        ))
    }
}

/// Turn a risk-assessment key like `follow_up_timeline` into `Follow Up Timeline`.
#[must_use]
pub fn humanize_key(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// When the backend produced the analysis.
///
/// Accepts RFC 3339, offset-less ISO 8601 (interpreted as local time) and
/// epoch numbers (seconds, or milliseconds when large enough).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchTimestamp {
    Text(String),
    Epoch(f64),
    #[default]
    Missing,
}

/// Epoch values at or above this are taken as milliseconds (~1973 in ms, ~5138 in s).
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl SearchTimestamp {
    /// Resolve to local time, if parseable.
    #[must_use]
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        match self {
            Self::Text(raw) => parse_text_timestamp(raw.trim()),
            Self::Epoch(n) => from_epoch(*n),
            Self::Missing => None,
        }
    }

    /// Local date/time for display, or `unknown`.
    #[must_use]
    pub fn display(&self) -> String {
        self.to_local()
            .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn parse_text_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    raw.parse::<f64>().ok().and_then(from_epoch)
}

fn from_epoch(value: f64) -> Option<DateTime<Local>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .map(|dt| dt.with_timezone(&Local))
}

impl Serialize for SearchTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Epoch(n) => serializer.serialize_f64(*n),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for SearchTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Self::Text(s),
            Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Epoch),
            _ => Self::Missing,
        })
    }
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(value_to_text)
        .unwrap_or_default())
}

fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .filter_map(value_to_text)
        .collect())
}
