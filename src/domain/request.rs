//! Symptom form input, validation and request building.
//!
//! The form holds raw user input exactly as typed. `SymptomForm::validate`
//! is the only gate between the form and the network: it trims free text,
//! checks the primary symptom and coerces the optional age.

use serde::{Serialize, Serializer};
use zeroize::Zeroize;

/// A fixed set of options the user picks from rather than types.
///
/// Implemented by the enumerated request fields so the form can cycle
/// through them generically.
pub trait Choice: Copy + PartialEq + 'static {
    /// Every option, in display order.
    const ALL: &'static [Self];

    /// Value sent on the wire.
    fn as_str(&self) -> &'static str;

    /// Human-readable label for the form.
    fn label(&self) -> &'static str;

    /// Parse a wire value (case-insensitive, surrounding whitespace ignored).
    fn from_wire(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
    }

    /// Next option after `current`. Wraps through "not selected".
    fn cycle_next(current: Option<Self>) -> Option<Self> {
        match current {
            None => Self::ALL.first().copied(),
            Some(c) => {
                let idx = Self::ALL.iter().position(|x| *x == c).unwrap_or(0);
                Self::ALL.get(idx + 1).copied()
            }
        }
    }

    /// Previous option before `current`. Wraps through "not selected".
    fn cycle_prev(current: Option<Self>) -> Option<Self> {
        match current {
            None => Self::ALL.last().copied(),
            Some(c) => {
                let idx = Self::ALL.iter().position(|x| *x == c).unwrap_or(0);
                if idx == 0 {
                    None
                } else {
                    Self::ALL.get(idx - 1).copied()
                }
            }
        }
    }
}

/// How long the symptom has been present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationBucket {
    LessThanOneHour,
    OneToSixHours,
    SixToTwentyFourHours,
    OneToThreeDays,
    ThreeToSevenDays,
    OneToTwoWeeks,
    MoreThanTwoWeeks,
}

impl Choice for DurationBucket {
    const ALL: &'static [Self] = &[
        Self::LessThanOneHour,
        Self::OneToSixHours,
        Self::SixToTwentyFourHours,
        Self::OneToThreeDays,
        Self::ThreeToSevenDays,
        Self::OneToTwoWeeks,
        Self::MoreThanTwoWeeks,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::LessThanOneHour => "less than 1 hour",
            Self::OneToSixHours => "1-6 hours",
            Self::SixToTwentyFourHours => "6-24 hours",
            Self::OneToThreeDays => "1-3 days",
            Self::ThreeToSevenDays => "3-7 days",
            Self::OneToTwoWeeks => "1-2 weeks",
            Self::MoreThanTwoWeeks => "more than 2 weeks",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::LessThanOneHour => "Less than 1 hour",
            Self::OneToSixHours => "1-6 hours",
            Self::SixToTwentyFourHours => "6-24 hours",
            Self::OneToThreeDays => "1-3 days",
            Self::ThreeToSevenDays => "3-7 days",
            Self::OneToTwoWeeks => "1-2 weeks",
            Self::MoreThanTwoWeeks => "More than 2 weeks",
        }
    }
}

/// Self-reported intensity of the symptom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    VerySevere,
}

impl Choice for Severity {
    const ALL: &'static [Self] = &[Self::Mild, Self::Moderate, Self::Severe, Self::VerySevere];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::VerySevere => "very severe",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Mild => "Mild (1-3)",
            Self::Moderate => "Moderate (4-6)",
            Self::Severe => "Severe (7-8)",
            Self::VerySevere => "Very Severe (9-10)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

impl Choice for Gender {
    const ALL: &'static [Self] = &[Self::Male, Self::Female, Self::Other, Self::PreferNotToSay];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::PreferNotToSay => "prefer not to say",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
            Self::PreferNotToSay => "Prefer not to say",
        }
    }
}

macro_rules! serialize_as_wire {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }
        )*
    };
}

serialize_as_wire!(DurationBucket, Severity, Gender);

/// Reasons a submission is refused before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a symptom to analyze")]
    MissingSymptom,

    #[error("Age must be a whole number between 1 and 120")]
    InvalidAge,
}

pub const MIN_AGE: u8 = 1;
pub const MAX_AGE: u8 = 120;

/// Raw form input as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomForm {
    pub symptom: String,
    pub duration: Option<DurationBucket>,
    pub severity: Option<Severity>,
    pub additional_info: String,
    pub age: String,
    pub gender: Option<Gender>,
    pub medical_history: String,
}

/// Form input that passed validation: trimmed, age coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub symptom: String,
    pub duration: Option<DurationBucket>,
    pub severity: Option<Severity>,
    pub additional_info: String,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub medical_history: String,
}

impl SymptomForm {
    /// Validate the raw input.
    ///
    /// # Errors
    /// `MissingSymptom` when the symptom is empty or whitespace-only,
    /// `InvalidAge` when an age was typed but is not an integer in 1-120.
    pub fn validate(&self) -> Result<ValidatedInput, ValidationError> {
        let symptom = self.symptom.trim();
        if symptom.is_empty() {
            return Err(ValidationError::MissingSymptom);
        }

        let age = match self.age.trim() {
            "" => None,
            raw => {
                let value: u8 = raw.parse().map_err(|_| ValidationError::InvalidAge)?;
                if !(MIN_AGE..=MAX_AGE).contains(&value) {
                    return Err(ValidationError::InvalidAge);
                }
                Some(value)
            }
        };

        Ok(ValidatedInput {
            symptom: symptom.to_string(),
            duration: self.duration,
            severity: self.severity,
            additional_info: self.additional_info.trim().to_string(),
            age,
            gender: self.gender,
            medical_history: self.medical_history.trim().to_string(),
        })
    }

    /// Validate and build the request in one step.
    ///
    /// # Errors
    /// See [`SymptomForm::validate`].
    pub fn build_request(&self) -> Result<AnalysisRequest, ValidationError> {
        self.validate().map(AnalysisRequest::from_input)
    }

    /// Wipe every text buffer and deselect every choice.
    pub fn clear(&mut self) {
        self.symptom.zeroize();
        self.additional_info.zeroize();
        self.age.zeroize();
        self.medical_history.zeroize();
        self.duration = None;
        self.severity = None;
        self.gender = None;
    }

    /// A filled-in example, useful for demos.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            symptom: "headache".to_string(),
            duration: Some(DurationBucket::OneToThreeDays),
            severity: Some(Severity::Moderate),
            additional_info: "Worse in the morning, mild light sensitivity".to_string(),
            age: "34".to_string(),
            gender: Some(Gender::PreferNotToSay),
            medical_history: String::new(),
        }
    }
}

fn empty_when_none<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

/// Body of `POST /api/analyze-symptom`.
///
/// `duration`, `severity` and `additional_info` are always present on the
/// wire (empty when unset). The personal fields are omitted entirely when
/// not supplied so the backend applies its own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub symptom: String,

    #[serde(serialize_with = "empty_when_none")]
    pub duration: Option<DurationBucket>,

    #[serde(serialize_with = "empty_when_none")]
    pub severity: Option<Severity>,

    pub additional_info: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
}

impl AnalysisRequest {
    #[must_use]
    pub fn from_input(input: ValidatedInput) -> Self {
        Self {
            symptom: input.symptom,
            duration: input.duration,
            severity: input.severity,
            additional_info: input.additional_info,
            age: input.age,
            gender: input.gender,
            medical_history: Some(input.medical_history).filter(|h| !h.is_empty()),
        }
    }

    /// Names of the optional fields that will be sent. Safe to log.
    #[must_use]
    pub fn supplied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.duration.is_some() {
            fields.push("duration");
        }
        if self.severity.is_some() {
            fields.push("severity");
        }
        if !self.additional_info.is_empty() {
            fields.push("additional_info");
        }
        if self.age.is_some() {
            fields.push("age");
        }
        if self.gender.is_some() {
            fields.push("gender");
        }
        if self.medical_history.is_some() {
            fields.push("medical_history");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(symptom: &str) -> SymptomForm {
        SymptomForm {
            symptom: symptom.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_blank_symptom_rejected() {
        for raw in ["", "   ", "\t\n"] {
            assert_eq!(form(raw).validate(), Err(ValidationError::MissingSymptom));
        }
    }

    #[test]
    fn test_example_request_body() {
        let f = SymptomForm {
            symptom: "headache".to_string(),
            duration: Some(DurationBucket::OneToThreeDays),
            severity: Some(Severity::Moderate),
            ..Default::default()
        };
        let body = serde_json::to_string(&f.build_request().expect("valid")).expect("json");
        assert_eq!(
            body,
            r#"{"symptom":"headache","duration":"1-3 days","severity":"moderate","additional_info":""}"#
        );
    }

    #[test]
    fn test_only_supplied_optional_fields_are_sent() {
        for mask in 0u8..8 {
            let f = SymptomForm {
                symptom: "nausea".to_string(),
                age: if mask & 1 != 0 { "42".into() } else { String::new() },
                gender: (mask & 2 != 0).then_some(Gender::Female),
                medical_history: if mask & 4 != 0 { "asthma".into() } else { "  ".into() },
                ..Default::default()
            };
            let value = serde_json::to_value(f.build_request().expect("valid")).expect("json");
            let obj = value.as_object().expect("object");

            assert_eq!(obj.contains_key("age"), mask & 1 != 0);
            assert_eq!(obj.contains_key("gender"), mask & 2 != 0);
            assert_eq!(obj.contains_key("medical_history"), mask & 4 != 0);
            assert!(obj.values().all(|v| !v.is_null()));
        }
    }

    #[test]
    fn test_free_text_is_trimmed() {
        let f = SymptomForm {
            symptom: "  stomach pain ".to_string(),
            additional_info: " after meals\n".to_string(),
            age: " 30 ".to_string(),
            medical_history: " gastritis ".to_string(),
            ..Default::default()
        };
        let req = f.build_request().expect("valid");
        assert_eq!(req.symptom, "stomach pain");
        assert_eq!(req.additional_info, "after meals");
        assert_eq!(req.age, Some(30));
        assert_eq!(req.medical_history.as_deref(), Some("gastritis"));
    }

    #[test]
    fn test_age_bounds() {
        let with_age = |age: &str| SymptomForm {
            age: age.to_string(),
            ..form("fatigue")
        };
        assert_eq!(with_age("1").validate().map(|v| v.age), Ok(Some(1)));
        assert_eq!(with_age("120").validate().map(|v| v.age), Ok(Some(120)));
        for bad in ["0", "121", "-4", "3.5", "abc", "999"] {
            assert_eq!(with_age(bad).validate(), Err(ValidationError::InvalidAge), "{bad}");
        }
    }

    #[test]
    fn test_choice_wire_values() {
        assert_eq!(Severity::from_wire("Very Severe"), Some(Severity::VerySevere));
        assert_eq!(DurationBucket::from_wire("more than 2 weeks"), Some(DurationBucket::MoreThanTwoWeeks));
        assert_eq!(Gender::from_wire("prefer not to say"), Some(Gender::PreferNotToSay));
        assert_eq!(Gender::from_wire("unknown"), None);
    }

    #[test]
    fn test_choice_cycling_wraps_through_unset() {
        let mut current = None;
        let mut seen = Vec::new();
        for _ in 0..Severity::ALL.len() + 1 {
            current = Severity::cycle_next(current);
            seen.push(current);
        }
        assert_eq!(seen.first(), Some(&Some(Severity::Mild)));
        assert_eq!(seen.last(), Some(&None));

        assert_eq!(Severity::cycle_prev(None), Some(Severity::VerySevere));
        assert_eq!(Severity::cycle_prev(Some(Severity::Mild)), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut f = SymptomForm::sample();
        f.clear();
        assert_eq!(f, SymptomForm::default());
    }
}
