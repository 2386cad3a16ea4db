use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::calc::{
    self, band_remark, classify_aggregate, composite_total, resolve_grade, round1, score_stats,
    Category, ScoreStats, WORST_AGGREGATE,
};
use crate::config::{CompositeWeights, Settings};

/// One subject's recorded marks for one pupil. Either the section scores or
/// a directly entered total; section scores take precedence when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubjectScore {
    pub class_score: Option<f64>,
    pub exam_score: Option<f64>,
    pub total: Option<f64>,
    pub remark: Option<String>,
}

/// Source student record as entered upstream. Read-only to the engine;
/// every processing pass projects fresh pupil reports from it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// subject name -> recorded marks
    #[serde(default)]
    pub scores: HashMap<String, SubjectScore>,
    /// term key -> one attendance code per school day
    #[serde(default)]
    pub attendance: HashMap<String, String>,
    #[serde(default)]
    pub final_remark: Option<String>,
    #[serde(default = "default_true")]
    pub fees_cleared: bool,
}

fn default_true() -> bool {
    true
}

impl StudentRecord {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub subject: String,
    pub score: f64,
    pub grade: String,
    pub value: i64,
    pub color: String,
    pub remark: String,
    pub core: bool,
    pub class_avg: f64,
    pub band_remark: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PupilReport {
    pub student_id: String,
    pub display_name: String,
    pub position: usize,
    pub rank: String,
    pub subjects: Vec<SubjectResult>,
    pub aggregate: i64,
    pub category_code: String,
    pub category_label: String,
    pub attendance_present: String,
    pub remark: String,
    pub fees_cleared: bool,
}

/// Raw total a pupil carries into class statistics for a subject. Missing
/// records count as zero; absentees stay in the population and pull the
/// class mean down unless excluded upstream.
fn effective_total(score: Option<&SubjectScore>, w: &CompositeWeights) -> f64 {
    let Some(s) = score else {
        return 0.0;
    };
    composite_total(s.class_score, s.exam_score, w)
        .or(s.total)
        .unwrap_or(0.0)
}

/// Best-six rule: the 4 best core results plus the 2 best elective results
/// by nine-point value. Anything short of exactly six chosen subjects reads
/// as incomplete data and forces the worst aggregate instead of a
/// misleadingly good partial sum.
pub fn best_six_aggregate(results: &[SubjectResult]) -> i64 {
    let mut core: Vec<i64> = results.iter().filter(|r| r.core).map(|r| r.value).collect();
    let mut elective: Vec<i64> = results.iter().filter(|r| !r.core).map(|r| r.value).collect();
    core.sort_unstable();
    elective.sort_unstable();
    if core.len().min(4) + elective.len().min(2) != 6 {
        return WORST_AGGREGATE;
    }
    core[..4].iter().sum::<i64>() + elective[..2].iter().sum::<i64>()
}

fn category_remark(category: &Category) -> String {
    match category.code {
        "P1" => "An outstanding performance. Keep it up.",
        "G1" => "A very good performance.",
        "S1" => "A good performance. Aim higher.",
        "B1" => "A fair performance. More effort required.",
        _ => "Performance needs serious attention and support.",
    }
    .to_string()
}

fn count_present(record: &StudentRecord, term: &str, present_code: &str) -> usize {
    let code = present_code.chars().next().unwrap_or('P');
    record
        .attendance
        .get(term)
        .map(|days| days.chars().filter(|c| *c == code).count())
        .unwrap_or(0)
}

/// Class-wide stats for every active subject, over every student. Step one
/// of the processing pipeline, also reused by the facilitator summary.
fn subject_stats(students: &[StudentRecord], settings: &Settings) -> HashMap<String, ScoreStats> {
    let mut out = HashMap::new();
    for subject in &settings.subjects {
        let totals: Vec<f64> = students
            .iter()
            .map(|st| effective_total(st.scores.get(&subject.name), &settings.composite))
            .collect();
        out.insert(subject.name.clone(), score_stats(&totals));
    }
    out
}

/// Transform the raw roster plus the current configuration into a ranked,
/// graded roster. Pure with respect to its inputs: identical state in,
/// identical roster out, nothing mutated in place.
pub fn process_roster(
    students: &[StudentRecord],
    settings: &Settings,
    term: &str,
) -> Vec<PupilReport> {
    let stats_by_subject = subject_stats(students, settings);

    let mut pupils: Vec<PupilReport> = Vec::with_capacity(students.len());
    for st in students {
        let mut results: Vec<SubjectResult> = Vec::new();
        for subject in &settings.subjects {
            // Grades are only attached for subjects the pupil has a record
            // for; the pupil still counted toward every subject's stats.
            let Some(rec) = st.scores.get(&subject.name) else {
                continue;
            };
            let stats = stats_by_subject[&subject.name];
            let total = effective_total(Some(rec), &settings.composite);
            let g = resolve_grade(total, &stats, &settings.scale, &settings.remark_overrides);
            results.push(SubjectResult {
                subject: subject.name.clone(),
                score: total,
                grade: g.grade,
                value: g.value,
                color: g.color,
                remark: rec.remark.clone().unwrap_or(g.remark),
                core: subject.core,
                class_avg: round1(stats.mean),
                band_remark: band_remark(total).to_string(),
            });
        }
        // Display ordering only; grades were resolved before the sort.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let aggregate = best_six_aggregate(&results);
        let category = classify_aggregate(aggregate);
        let present = count_present(st, term, &settings.present_code);
        let remark = st
            .final_remark
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| category_remark(&category));

        pupils.push(PupilReport {
            student_id: st.id.clone().unwrap_or_default(),
            display_name: st.display_name(),
            position: 0,
            rank: String::new(),
            subjects: results,
            aggregate,
            category_code: category.code.to_string(),
            category_label: category.label.to_string(),
            attendance_present: present.to_string(),
            remark,
            fees_cleared: st.fees_cleared,
        });
    }

    // Lower aggregate is better; sort_by is stable so tied pupils keep
    // their roster order.
    pupils.sort_by_key(|p| p.aggregate);
    for (i, p) in pupils.iter_mut().enumerate() {
        p.position = i + 1;
        p.rank = calc::ordinal(i + 1);
    }
    pupils
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorSummary {
    pub subject: String,
    pub facilitator: String,
    pub distribution: Vec<GradeCount>,
    pub pupil_count: usize,
    pub performance_percent: f64,
    pub summary_grade: String,
}

/// One subject's grade distribution and the facilitator's derived
/// performance score. `None` when the subject is not configured.
///
/// performancePercent is the normalized inverse of the average grade value,
/// (1 - totalValue / (pupilCount * 9)) * 100: higher when the class lands
/// better grades, 0 when every pupil fails maximally.
pub fn facilitator_summary(
    students: &[StudentRecord],
    settings: &Settings,
    subject_name: &str,
) -> Option<FacilitatorSummary> {
    let subject = settings
        .subjects
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(subject_name.trim()))?;

    let totals: Vec<f64> = students
        .iter()
        .map(|st| effective_total(st.scores.get(&subject.name), &settings.composite))
        .collect();
    let stats = score_stats(&totals);

    // Zero-initialized over the whole table so absent grades report 0
    // instead of going missing from the histogram.
    let mut counts: Vec<usize> = vec![0; settings.scale.len()];
    let no_overrides = HashMap::new();
    let mut total_value: i64 = 0;
    for total in &totals {
        let g = resolve_grade(*total, &stats, &settings.scale, &no_overrides);
        if let Some(idx) = settings.scale.iter().position(|e| e.grade == g.grade) {
            counts[idx] += 1;
        }
        total_value += g.value;
    }

    let n = totals.len();
    let performance_percent = if n == 0 {
        0.0
    } else {
        (1.0 - (total_value as f64) / ((n as f64) * 9.0)) * 100.0
    };
    let summary_grade = if n == 0 {
        "F9".to_string()
    } else {
        let mean_value = ((total_value as f64) / (n as f64)).round() as i64;
        settings
            .scale
            .iter()
            .find(|e| e.value == mean_value)
            .map(|e| e.grade.clone())
            // rounding can produce a value missing from a customized scale
            .unwrap_or_else(|| "F9".to_string())
    };

    Some(FacilitatorSummary {
        subject: subject.name.clone(),
        facilitator: subject
            .facilitator
            .clone()
            .unwrap_or_else(|| "TBA".to_string()),
        distribution: settings
            .scale
            .iter()
            .zip(counts)
            .map(|(e, count)| GradeCount {
                grade: e.grade.clone(),
                count,
            })
            .collect(),
        pupil_count: n,
        performance_percent: round1(performance_percent),
        summary_grade,
    })
}
