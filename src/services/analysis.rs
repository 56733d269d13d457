// src/services/analysis.rs
//
// Structured injury assessment extracted from free-form model output

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::ApiError;

pub const DEFAULT_SEVERITY: u8 = 5;
pub const SEEK_ADVICE: &str = "Seek professional medical advice";

// First `{ ... }` in the text, across newlines
static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*?\}").expect("JSON object pattern is valid"));

/// Severity assessment of an injury photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryAnalysis {
    #[serde(default = "unknown_condition")]
    pub condition: String,
    #[serde(default = "default_severity", deserialize_with = "deserialize_severity")]
    pub severity_score: u8,
    #[serde(default)]
    pub visible_symptoms: Vec<String>,
    #[serde(default)]
    pub immediate_actions: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub additional_notes: String,
}

fn unknown_condition() -> String {
    "Unknown".to_string()
}

fn default_severity() -> u8 {
    DEFAULT_SEVERITY
}

fn clamp_severity(score: f64) -> u8 {
    score.round().clamp(1.0, 10.0) as u8
}

/// Accepts numbers and numeric strings; anything else falls back to the default.
fn deserialize_severity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let score = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(score
        .filter(|s| s.is_finite())
        .map(clamp_severity)
        .unwrap_or(DEFAULT_SEVERITY))
}

fn deserialize_notes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl InjuryAnalysis {
    /// The model answered but its JSON could not be read
    pub fn undetermined() -> Self {
        Self {
            condition: unknown_condition(),
            severity_score: DEFAULT_SEVERITY,
            visible_symptoms: vec!["Unable to determine".to_string()],
            immediate_actions: vec![SEEK_ADVICE.to_string()],
            additional_notes: "Could not properly analyze the image".to_string(),
        }
    }

    /// The request itself failed
    pub fn from_api_error(err: &ApiError) -> Self {
        let (symptom, notes) = match err.status() {
            Some(status) => ("Unable to analyze", format!("API Error: {}", status)),
            None => (
                "Unable to analyze due to technical error",
                format!("Error: {}", err),
            ),
        };

        Self {
            condition: "Analysis Error".to_string(),
            severity_score: DEFAULT_SEVERITY,
            visible_symptoms: vec![symptom.to_string()],
            immediate_actions: vec![SEEK_ADVICE.to_string()],
            additional_notes: notes,
        }
    }
}

/// Read an assessment out of the model's reply.
///
/// The first `{...}` block is decoded as JSON. Without one, the reply is read
/// line by line looking for "condition:", "severity:" and similar labels.
pub fn parse_analysis(response_text: &str) -> InjuryAnalysis {
    match JSON_OBJECT.find(response_text) {
        Some(object) => serde_json::from_str(object.as_str()).unwrap_or_else(|e| {
            debug!("Analysis JSON did not decode: {}", e);
            InjuryAnalysis::undetermined()
        }),
        None => parse_analysis_lines(response_text),
    }
}

/// Text after the first ':' of the first line mentioning `label`
fn labelled_value<'a>(lines: &[&'a str], label: &str) -> Option<&'a str> {
    lines
        .iter()
        .find(|line| line.to_lowercase().contains(label))
        .and_then(|line| line.split(':').nth(1))
        .map(str::trim)
}

fn labelled_list(lines: &[&str], label: &str, default: &str) -> Vec<String> {
    let items: Vec<String> = labelled_value(lines, label)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if items.is_empty() {
        vec![default.to_string()]
    } else {
        items
    }
}

fn parse_analysis_lines(response_text: &str) -> InjuryAnalysis {
    let lines: Vec<&str> = response_text.lines().collect();

    let severity_score = labelled_value(&lines, "severity")
        .and_then(|value| {
            value
                .split(|c: char| !c.is_ascii_digit())
                .find(|digits| !digits.is_empty())
        })
        .and_then(|digits| digits.parse::<f64>().ok())
        .map(clamp_severity)
        .unwrap_or(DEFAULT_SEVERITY);

    InjuryAnalysis {
        condition: labelled_value(&lines, "condition")
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(unknown_condition),
        severity_score,
        visible_symptoms: labelled_list(&lines, "symptom", "Unable to determine"),
        immediate_actions: labelled_list(&lines, "action", SEEK_ADVICE),
        additional_notes: labelled_value(&lines, "note")
            .map(str::to_string)
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_json_wrapped_in_prose() {
        let text = r#"Here is the assessment:
```json
{
    "condition": "Minor laceration",
    "severity_score": 3,
    "visible_symptoms": ["Small cut", "Light bleeding"],
    "immediate_actions": ["Clean the wound", "Apply pressure"],
    "additional_notes": "Watch for infection"
}
```
Stay safe."#;

        let analysis = parse_analysis(text);
        assert_eq!(analysis.condition, "Minor laceration");
        assert_eq!(analysis.severity_score, 3);
        assert_eq!(analysis.visible_symptoms, vec!["Small cut", "Light bleeding"]);
        assert_eq!(analysis.immediate_actions.len(), 2);
        assert_eq!(analysis.additional_notes, "Watch for infection");
    }

    #[test]
    fn test_lenient_json_fields() {
        let analysis = parse_analysis(
            r#"{"condition": "Burn", "severity_score": "7", "additional_notes": null}"#,
        );
        assert_eq!(analysis.severity_score, 7);
        assert!(analysis.visible_symptoms.is_empty());
        assert_eq!(analysis.additional_notes, "");

        let analysis = parse_analysis(r#"{"condition": "Fracture", "severity_score": 14.2}"#);
        assert_eq!(analysis.severity_score, 10);

        let analysis = parse_analysis(r#"{"severity_score": "high"}"#);
        assert_eq!(analysis.condition, "Unknown");
        assert_eq!(analysis.severity_score, DEFAULT_SEVERITY);
    }

    #[test]
    fn test_broken_json_is_undetermined() {
        let analysis = parse_analysis(r#"{"condition": "Burn", "severity_score": }"#);
        assert_eq!(analysis, InjuryAnalysis::undetermined());
    }

    #[test]
    fn test_line_based_fallback() {
        let text = "Condition: Sprained ankle\n\
                    Severity: 4/10\n\
                    Visible symptoms: swelling, bruising\n\
                    Immediate actions: rest, ice, elevate\n\
                    Notes: see a doctor if pain persists";

        let analysis = parse_analysis(text);
        assert_eq!(analysis.condition, "Sprained ankle");
        assert_eq!(analysis.severity_score, 4);
        assert_eq!(analysis.visible_symptoms, vec!["swelling", "bruising"]);
        assert_eq!(analysis.immediate_actions, vec!["rest", "ice", "elevate"]);
        assert_eq!(analysis.additional_notes, "see a doctor if pain persists");
    }

    #[test]
    fn test_line_based_defaults() {
        let analysis = parse_analysis("I cannot tell what this image shows.");
        assert_eq!(analysis.condition, "Unknown");
        assert_eq!(analysis.severity_score, DEFAULT_SEVERITY);
        assert_eq!(analysis.visible_symptoms, vec!["Unable to determine"]);
        assert_eq!(analysis.immediate_actions, vec![SEEK_ADVICE]);
        assert_eq!(analysis.additional_notes, "");
    }

    #[test]
    fn test_api_error_fallbacks() {
        let status = ApiError::Status {
            status: 503,
            body: "overloaded".to_string(),
        };
        let analysis = InjuryAnalysis::from_api_error(&status);
        assert_eq!(analysis.condition, "Analysis Error");
        assert_eq!(analysis.visible_symptoms, vec!["Unable to analyze"]);
        assert_eq!(analysis.additional_notes, "API Error: 503");

        let parse = ApiError::parse("response has no candidate text");
        let analysis = InjuryAnalysis::from_api_error(&parse);
        assert_eq!(
            analysis.visible_symptoms,
            vec!["Unable to analyze due to technical error"]
        );
        assert_eq!(
            analysis.additional_notes,
            "Error: malformed response: response has no candidate text"
        );
        assert_eq!(analysis.immediate_actions, vec![SEEK_ADVICE]);
    }
}
