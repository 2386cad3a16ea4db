use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the norm-referenced grading table. `value` runs 1 (best) to
/// 9 (worst); `cutoff` is the lowest z-score the grade still covers.
/// A configured table must keep its cutoffs strictly descending so that a
/// first-match scan resolves deterministically; the last row is the
/// catch-all for anything below every cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleEntry {
    pub grade: String,
    pub value: i64,
    pub cutoff: f64,
    pub remark: String,
    pub color: String,
}

/// A labeled score band, `min..=max` inclusive on both ends. Used for the
/// early-years achievement and observation tables. First match wins;
/// keeping bands contiguous is the caller's configuration concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeBand {
    pub min: f64,
    pub max: f64,
    pub label: String,
    pub color: String,
    pub remark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectDef {
    pub name: String,
    #[serde(default)]
    pub core: bool,
    #[serde(default)]
    pub facilitator: Option<String>,
}

/// Weighting for composite totals built from a classwork section and an
/// exam section. Percentages apply after each section is normalized by its
/// configured maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositeWeights {
    pub class_percent: f64,
    pub exam_percent: f64,
    pub class_max: f64,
    pub exam_max: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            class_percent: 30.0,
            exam_percent: 70.0,
            class_max: 60.0,
            exam_max: 100.0,
        }
    }
}

/// The full grading configuration. Treated as an immutable value: handlers
/// replace whole sections, computations only ever borrow it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub subjects: Vec<SubjectDef>,
    pub scale: Vec<ScaleEntry>,
    pub remark_overrides: HashMap<String, String>,
    pub grade_ranges: Vec<RangeBand>,
    pub observation_ranges: Vec<RangeBand>,
    pub observation_scale_max: f64,
    pub composite: CompositeWeights,
    pub rating_points: i64,
    pub current_term: String,
    pub present_code: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            subjects: default_subjects(),
            scale: default_scale(),
            remark_overrides: HashMap::new(),
            grade_ranges: default_grade_ranges(),
            observation_ranges: default_observation_ranges(),
            observation_scale_max: 3.0,
            composite: CompositeWeights::default(),
            rating_points: 5,
            current_term: "1".to_string(),
            present_code: "P".to_string(),
        }
    }
}

fn scale_entry(grade: &str, value: i64, cutoff: f64, remark: &str, color: &str) -> ScaleEntry {
    ScaleEntry {
        grade: grade.to_string(),
        value,
        cutoff,
        remark: remark.to_string(),
        color: color.to_string(),
    }
}

/// The stock nine-point table with stanine cutoffs. Overridable per class
/// through `settings.update`.
pub fn default_scale() -> Vec<ScaleEntry> {
    vec![
        scale_entry("A1", 1, 1.75, "Excellent", "#1b5e20"),
        scale_entry("B2", 2, 1.25, "Very Good", "#2e7d32"),
        scale_entry("B3", 3, 0.75, "Good", "#43a047"),
        scale_entry("C4", 4, 0.25, "Credit", "#7cb342"),
        scale_entry("C5", 5, -0.25, "Credit", "#c0ca33"),
        scale_entry("C6", 6, -0.75, "Credit", "#fdd835"),
        scale_entry("D7", 7, -1.25, "Pass", "#fb8c00"),
        scale_entry("E8", 8, -1.75, "Pass", "#f4511e"),
        scale_entry("F9", 9, -2.25, "Fail", "#c62828"),
    ]
}

fn subject(name: &str, core: bool) -> SubjectDef {
    SubjectDef {
        name: name.to_string(),
        core,
        facilitator: None,
    }
}

fn default_subjects() -> Vec<SubjectDef> {
    vec![
        subject("English Language", true),
        subject("Mathematics", true),
        subject("Integrated Science", true),
        subject("Social Studies", true),
        subject("Religious And Moral Education", false),
        subject("Ghanaian Language", false),
        subject("Information And Communication Technology", false),
        subject("Creative Arts", false),
    ]
}

fn band(min: f64, max: f64, label: &str, color: &str, remark: &str) -> RangeBand {
    RangeBand {
        min,
        max,
        label: label.to_string(),
        color: color.to_string(),
        remark: remark.to_string(),
    }
}

fn default_grade_ranges() -> Vec<RangeBand> {
    vec![
        band(80.0, 100.0, "A", "#2e7d32", "Excellent"),
        band(70.0, 79.0, "B", "#43a047", "Very Good"),
        band(60.0, 69.0, "C", "#7cb342", "Good"),
        band(50.0, 59.0, "D", "#fdd835", "Average"),
        band(40.0, 49.0, "E", "#fb8c00", "Below Average"),
        band(0.0, 39.0, "F", "#c62828", "Weak"),
    ]
}

fn default_observation_ranges() -> Vec<RangeBand> {
    vec![
        band(75.0, 100.0, "Exceeding", "#2e7d32", "Exceeds expectation"),
        band(40.0, 74.0, "Meeting", "#7cb342", "Meets expectation"),
        band(0.0, 39.0, "Emerging", "#fb8c00", "Emerging"),
    ]
}

/// Scales are scanned first-match, so the cutoff order is load-bearing.
/// Rejecting a bad edit here keeps resolution itself validation-free.
pub fn validate_scale(scale: &[ScaleEntry]) -> Result<(), String> {
    if scale.is_empty() {
        return Err("scale must contain at least one entry".to_string());
    }
    for e in scale {
        if e.grade.trim().is_empty() {
            return Err("scale entries must have a grade label".to_string());
        }
        if !(1..=9).contains(&e.value) {
            return Err(format!("scale value for {} must be between 1 and 9", e.grade));
        }
        if !e.cutoff.is_finite() {
            return Err(format!("scale cutoff for {} must be finite", e.grade));
        }
    }
    for pair in scale.windows(2) {
        if pair[1].cutoff >= pair[0].cutoff {
            return Err(format!(
                "scale cutoffs must be strictly descending ({} comes before {})",
                pair[0].grade, pair[1].grade
            ));
        }
    }
    Ok(())
}

pub fn validate_ranges(ranges: &[RangeBand]) -> Result<(), String> {
    for r in ranges {
        if !r.min.is_finite() || !r.max.is_finite() {
            return Err(format!("range {} bounds must be finite", r.label));
        }
        if r.min > r.max {
            return Err(format!("range {} has min greater than max", r.label));
        }
    }
    Ok(())
}

pub fn validate_subjects(subjects: &[SubjectDef]) -> Result<(), String> {
    if subjects.is_empty() {
        return Err("at least one subject is required".to_string());
    }
    let mut seen: Vec<String> = Vec::new();
    for s in subjects {
        let name = s.name.trim();
        if name.is_empty() {
            return Err("subject names must not be empty".to_string());
        }
        let lower = name.to_ascii_lowercase();
        if seen.contains(&lower) {
            return Err(format!("duplicate subject: {}", name));
        }
        seen.push(lower);
    }
    Ok(())
}
