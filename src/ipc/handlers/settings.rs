use crate::config::{
    validate_ranges, validate_scale, validate_subjects, CompositeWeights, RangeBand, ScaleEntry,
    SubjectDef,
};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Clone, Copy)]
enum SettingsSection {
    Scale,
    Remarks,
    Subjects,
    GradeRanges,
    ObservationRanges,
    ObservationScale,
    Weights,
    Rating,
    Term,
    Attendance,
}

impl SettingsSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "scale" => Some(Self::Scale),
            "remarks" => Some(Self::Remarks),
            "subjects" => Some(Self::Subjects),
            "gradeRanges" => Some(Self::GradeRanges),
            "observationRanges" => Some(Self::ObservationRanges),
            "observationScale" => Some(Self::ObservationScale),
            "weights" => Some(Self::Weights),
            "rating" => Some(Self::Rating),
            "term" => Some(Self::Term),
            "attendance" => Some(Self::Attendance),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Scale => "scale",
            Self::Remarks => "remarks",
            Self::Subjects => "subjects",
            Self::GradeRanges => "gradeRanges",
            Self::ObservationRanges => "observationRanges",
            Self::ObservationScale => "observationScale",
            Self::Weights => "weights",
            Self::Rating => "rating",
            Self::Term => "term",
            Self::Attendance => "attendance",
        }
    }
}

fn parse_value<T: serde::de::DeserializeOwned>(value: &Value, section: &str) -> Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|e| format!("{}: {}", section, e))
}

/// Apply one section edit to the settings value. Returns the new section
/// contents for the response echo, or a message for `bad_params`.
fn apply_section(
    state: &mut AppState,
    section: SettingsSection,
    value: &Value,
) -> Result<Value, String> {
    match section {
        SettingsSection::Scale => {
            let scale: Vec<ScaleEntry> = parse_value(value, "scale")?;
            validate_scale(&scale)?;
            state.settings.scale = scale;
            Ok(json!(state.settings.scale))
        }
        SettingsSection::Remarks => {
            let overrides: HashMap<String, String> = parse_value(value, "remarks")?;
            state.settings.remark_overrides = overrides;
            Ok(json!(state.settings.remark_overrides))
        }
        SettingsSection::Subjects => {
            let subjects: Vec<SubjectDef> = parse_value(value, "subjects")?;
            validate_subjects(&subjects)?;
            state.settings.subjects = subjects;
            Ok(json!(state.settings.subjects))
        }
        SettingsSection::GradeRanges => {
            let ranges: Vec<RangeBand> = parse_value(value, "gradeRanges")?;
            validate_ranges(&ranges)?;
            state.settings.grade_ranges = ranges;
            Ok(json!(state.settings.grade_ranges))
        }
        SettingsSection::ObservationRanges => {
            let ranges: Vec<RangeBand> = parse_value(value, "observationRanges")?;
            validate_ranges(&ranges)?;
            state.settings.observation_ranges = ranges;
            Ok(json!(state.settings.observation_ranges))
        }
        SettingsSection::ObservationScale => {
            let max: f64 = parse_value(value, "observationScale")?;
            if !max.is_finite() || max <= 0.0 {
                return Err("observationScale must be a positive number".to_string());
            }
            state.settings.observation_scale_max = max;
            Ok(json!(state.settings.observation_scale_max))
        }
        SettingsSection::Weights => {
            let weights: CompositeWeights = parse_value(value, "weights")?;
            for (name, v) in [
                ("classPercent", weights.class_percent),
                ("examPercent", weights.exam_percent),
                ("classMax", weights.class_max),
                ("examMax", weights.exam_max),
            ] {
                if !v.is_finite() || v < 0.0 {
                    return Err(format!("{} must be a non-negative number", name));
                }
            }
            state.settings.composite = weights;
            Ok(json!(state.settings.composite))
        }
        SettingsSection::Rating => {
            let points: i64 = parse_value(value, "rating")?;
            if ![2, 3, 5, 9].contains(&points) {
                return Err("rating points must be one of: 2, 3, 5, 9".to_string());
            }
            state.settings.rating_points = points;
            Ok(json!(state.settings.rating_points))
        }
        SettingsSection::Term => {
            let term: String = parse_value(value, "term")?;
            if term.trim().is_empty() {
                return Err("term must not be empty".to_string());
            }
            state.settings.current_term = term.trim().to_string();
            Ok(json!(state.settings.current_term))
        }
        SettingsSection::Attendance => {
            let code: String = parse_value(value, "attendance")?;
            let trimmed = code.trim();
            if trimmed.chars().count() != 1 {
                return Err("attendance present code must be a single character".to_string());
            }
            state.settings.present_code = trimmed.to_string();
            Ok(json!(state.settings.present_code))
        }
    }
}

fn handle_get(state: &AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!(state.settings))
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SettingsSection::parse(section_raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown section: {}", section_raw),
            None,
        );
    };
    let Some(value) = req.params.get("value") else {
        return err(&req.id, "bad_params", "missing value", None);
    };

    match apply_section(state, section, value) {
        Ok(echoed) => {
            tracing::info!(section = section.key(), "settings updated");
            ok(&req.id, json!({ "section": section.key(), "value": echoed }))
        }
        Err(message) => err(&req.id, "bad_params", message, None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "settings.get" => Some(handle_get(state, req)),
        "settings.update" => Some(handle_update(state, req)),
        _ => None,
    }
}
