use serde::Serialize;
use std::collections::HashMap;

use crate::config::{CompositeWeights, RangeBand, ScaleEntry};

/// Color for every "no meaningful answer" sentinel the resolvers hand back.
pub const NEUTRAL_COLOR: &str = "#9e9e9e";

/// Aggregate a pupil is forced to when fewer than six eligible subject
/// results exist. 54 = six subjects at the worst nine-point value.
pub const WORST_AGGREGATE: i64 = 54;

/// Scale row used when a class has no spread (stdDev <= 0). Index 3 is C4
/// in the stock table; shorter custom tables fall back to their last row.
pub const DEGENERATE_GRADE_INDEX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Mean and *population* standard deviation (divide by N). The class is the
/// whole population being graded, not a sample drawn from one. Both values
/// are 0 for an empty slice; there is no error case.
pub fn score_stats(scores: &[f64]) -> ScoreStats {
    if scores.is_empty() {
        return ScoreStats {
            mean: 0.0,
            std_dev: 0.0,
        };
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;
    ScoreStats {
        mean,
        std_dev: variance.sqrt(),
    }
}

/// 1-decimal display rounding used on averages and percentages.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub grade: String,
    pub value: i64,
    pub color: String,
    pub remark: String,
}

fn entry_result(entry: &ScaleEntry, overrides: &HashMap<String, String>) -> GradeResult {
    GradeResult {
        grade: entry.grade.clone(),
        value: entry.value,
        color: entry.color.clone(),
        remark: overrides
            .get(&entry.grade)
            .cloned()
            .unwrap_or_else(|| entry.remark.clone()),
    }
}

fn unmatched_grade() -> GradeResult {
    GradeResult {
        grade: "?".to_string(),
        value: 9,
        color: NEUTRAL_COLOR.to_string(),
        remark: "Unknown".to_string(),
    }
}

/// Resolve a raw score against a subject's class distribution.
///
/// With stdDev <= 0 the z-score is meaningless (zero-variance or empty
/// class), so resolution short-circuits to the table's default row instead
/// of dividing by zero. Otherwise the table is scanned in configured order
/// and the first row whose cutoff the z-score reaches wins; the last row
/// catches everything below, which makes this total over all real inputs.
pub fn resolve_grade(
    score: f64,
    stats: &ScoreStats,
    scale: &[ScaleEntry],
    overrides: &HashMap<String, String>,
) -> GradeResult {
    let Some(last) = scale.last() else {
        return unmatched_grade();
    };
    if stats.std_dev <= 0.0 {
        let entry = scale.get(DEGENERATE_GRADE_INDEX).unwrap_or(last);
        return entry_result(entry, overrides);
    }
    let z = (score - stats.mean) / stats.std_dev;
    let entry = scale.iter().find(|e| e.cutoff <= z).unwrap_or(last);
    entry_result(entry, overrides)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResult {
    pub label: String,
    pub value: i64,
    pub color: String,
    pub remark: String,
}

fn rating(label: &str, value: i64, color: &str, remark: &str) -> RatingResult {
    RatingResult {
        label: label.to_string(),
        value,
        color: color.to_string(),
        remark: remark.to_string(),
    }
}

/// Developmental rating for early-childhood learners: the same z-score
/// machinery as `resolve_grade`, on a coarser ladder selected by `points`
/// (2, 3, 5, or the full table at 9). A degenerate stdDev yields the
/// neutral "N/A" sentinel rather than a default band. Unrecognized point
/// counts resolve on the 5-point bands.
pub fn resolve_rating(
    score: f64,
    stats: &ScoreStats,
    points: i64,
    scale: &[ScaleEntry],
) -> RatingResult {
    if stats.std_dev <= 0.0 {
        return rating("N/A", 0, NEUTRAL_COLOR, "Not available");
    }
    if points == 9 {
        let g = resolve_grade(score, stats, scale, &HashMap::new());
        return RatingResult {
            label: g.grade,
            value: g.value,
            color: g.color,
            remark: g.remark,
        };
    }
    let z = (score - stats.mean) / stats.std_dev;
    match points {
        2 => {
            if z >= 0.0 {
                rating("Achieved", 1, "#2e7d32", "Competency achieved")
            } else {
                rating("Emerging", 2, "#fb8c00", "Competency emerging")
            }
        }
        3 => {
            if z > 1.0 {
                rating("Exceeding", 1, "#2e7d32", "Exceeds expectation")
            } else if z >= -1.0 {
                rating("Meeting", 2, "#7cb342", "Meets expectation")
            } else {
                rating("Emerging", 3, "#fb8c00", "Emerging")
            }
        }
        _ => {
            if z > 1.5 {
                rating("Exceeding", 1, "#1b5e20", "Exceeds expectation")
            } else if z > 0.5 {
                rating("Meeting", 2, "#43a047", "Meets expectation")
            } else if z >= -0.5 {
                rating("Approaching", 3, "#fdd835", "Approaching expectation")
            } else if z >= -1.5 {
                rating("Emerging", 4, "#fb8c00", "Emerging")
            } else {
                rating("Beginning", 5, "#c62828", "Beginning")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeMatch {
    pub label: String,
    pub color: String,
    pub remark: String,
}

/// First band covering the score wins; a score no band covers resolves to
/// the "?" sentinel. Overlaps and gaps are configuration concerns, not
/// validated here.
pub fn resolve_range(score: f64, ranges: &[RangeBand]) -> RangeMatch {
    for r in ranges {
        if r.min <= score && score <= r.max {
            return RangeMatch {
                label: r.label.clone(),
                color: r.color.clone(),
                remark: r.remark.clone(),
            };
        }
    }
    RangeMatch {
        label: "?".to_string(),
        color: NEUTRAL_COLOR.to_string(),
        remark: "Unknown".to_string(),
    }
}

/// Rescale a small-integer observation rating (1..=scaleMax) to a 0-100
/// percentage before range lookup. A configured max of 0 falls back to a
/// denominator of 1.
pub fn rating_to_percent(rating: f64, scale_max: f64) -> f64 {
    let denom = if scale_max > 0.0 { scale_max } else { 1.0 };
    100.0 * rating / denom
}

/// Canned report remark keyed by raw score band, independent of the
/// norm-referenced grade.
pub fn band_remark(score: f64) -> &'static str {
    if score >= 80.0 {
        "Excellent"
    } else if score >= 70.0 {
        "Very Good"
    } else if score >= 60.0 {
        "Good"
    } else if score >= 50.0 {
        "Credit"
    } else if score >= 40.0 {
        "Pass"
    } else {
        "Fail"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub code: &'static str,
    pub label: &'static str,
}

/// Performance tier for a best-six aggregate. Upper bounds are inclusive,
/// evaluated low-to-high.
pub fn classify_aggregate(aggregate: i64) -> Category {
    if aggregate <= 10 {
        Category {
            code: "P1",
            label: "Platinum Elite",
        }
    } else if aggregate <= 18 {
        Category {
            code: "G1",
            label: "Gold Scholar",
        }
    } else if aggregate <= 30 {
        Category {
            code: "S1",
            label: "Silver Achiever",
        }
    } else if aggregate <= 45 {
        Category {
            code: "B1",
            label: "Bronze Competent",
        }
    } else {
        Category {
            code: "W1",
            label: "Needs Improvement",
        }
    }
}

/// Combine classwork and exam sections into one 0-100 total. `None` when
/// neither section was recorded, so callers can fall back to a directly
/// entered total. Section maxima of 0 default to a denominator of 1.
pub fn composite_total(
    class_score: Option<f64>,
    exam_score: Option<f64>,
    w: &CompositeWeights,
) -> Option<f64> {
    if class_score.is_none() && exam_score.is_none() {
        return None;
    }
    let class_max = if w.class_max > 0.0 { w.class_max } else { 1.0 };
    let exam_max = if w.exam_max > 0.0 { w.exam_max } else { 1.0 };
    let class_part = class_score.unwrap_or(0.0) / class_max * w.class_percent;
    let exam_part = exam_score.unwrap_or(0.0) / exam_max * w.exam_percent;
    Some(class_part + exam_part)
}

/// 1 -> "1st", 2 -> "2nd", 11 -> "11th", 23 -> "23rd".
pub fn ordinal(n: usize) -> String {
    let suffix = match n % 100 {
        11..=13 => "th",
        _ => match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_scale;

    fn no_overrides() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn stats_match_closed_form() {
        let s = score_stats(&[90.0, 80.0, 70.0, 60.0, 50.0]);
        assert!((s.mean - 70.0).abs() < 1e-9);
        // population variance of the spread above is exactly 200
        assert!((s.std_dev - 200.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn stats_empty_is_zero() {
        let s = score_stats(&[]);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn stats_single_score_has_no_spread() {
        let s = score_stats(&[73.0]);
        assert_eq!(s.mean, 73.0);
        assert_eq!(s.std_dev, 0.0);
    }

    #[test]
    fn degenerate_std_dev_resolves_to_default_row() {
        let scale = default_scale();
        for score in [0.0, 50.0, 100.0] {
            let g = resolve_grade(
                score,
                &ScoreStats {
                    mean: 50.0,
                    std_dev: 0.0,
                },
                &scale,
                &no_overrides(),
            );
            assert_eq!(g.grade, "C4");
            assert_eq!(g.value, 4);
        }
    }

    #[test]
    fn degenerate_short_scale_falls_back_to_last_row() {
        let scale = vec![crate::config::ScaleEntry {
            grade: "P".to_string(),
            value: 1,
            cutoff: 0.0,
            remark: "Pass".to_string(),
            color: "#2e7d32".to_string(),
        }];
        let g = resolve_grade(
            10.0,
            &ScoreStats {
                mean: 10.0,
                std_dev: 0.0,
            },
            &scale,
            &no_overrides(),
        );
        assert_eq!(g.grade, "P");
    }

    #[test]
    fn round_trip_scenario_matches_z_scores() {
        let scores = [90.0, 80.0, 70.0, 60.0, 50.0];
        let stats = score_stats(&scores);
        assert!((stats.std_dev - 14.142).abs() < 1e-3);
        let scale = default_scale();
        let expected = ["B2", "C4", "C5", "C6", "E8"];
        for (score, want) in scores.iter().zip(expected) {
            let g = resolve_grade(*score, &stats, &scale, &no_overrides());
            assert_eq!(g.grade, want, "score {}", score);
        }
    }

    #[test]
    fn deep_negative_z_falls_through_to_last_row() {
        let stats = ScoreStats {
            mean: 90.0,
            std_dev: 5.0,
        };
        let g = resolve_grade(0.0, &stats, &default_scale(), &no_overrides());
        assert_eq!(g.grade, "F9");
        assert_eq!(g.value, 9);
    }

    #[test]
    fn grade_quality_is_monotone_in_score() {
        let stats = ScoreStats {
            mean: 50.0,
            std_dev: 10.0,
        };
        let scale = default_scale();
        let mut prev_value = i64::MAX;
        for score in 0..=100 {
            let g = resolve_grade(score as f64, &stats, &scale, &no_overrides());
            assert!(
                g.value <= prev_value,
                "value worsened from {} to {} at score {}",
                prev_value,
                g.value,
                score
            );
            prev_value = g.value;
        }
    }

    #[test]
    fn remark_override_wins_over_table_remark() {
        let stats = ScoreStats {
            mean: 50.0,
            std_dev: 10.0,
        };
        let mut overrides = HashMap::new();
        overrides.insert("A1".to_string(), "Top of the class".to_string());
        let g = resolve_grade(90.0, &stats, &default_scale(), &overrides);
        assert_eq!(g.grade, "A1");
        assert_eq!(g.remark, "Top of the class");
        // untouched grades keep the table remark
        let g = resolve_grade(50.0, &stats, &default_scale(), &overrides);
        assert_eq!(g.remark, "Credit");
    }

    #[test]
    fn empty_scale_yields_unknown_sentinel() {
        let g = resolve_grade(
            50.0,
            &ScoreStats {
                mean: 40.0,
                std_dev: 10.0,
            },
            &[],
            &no_overrides(),
        );
        assert_eq!(g.grade, "?");
    }

    fn stats_unit() -> ScoreStats {
        // mean 0, stdDev 1: scores are z-scores directly
        ScoreStats {
            mean: 0.0,
            std_dev: 1.0,
        }
    }

    #[test]
    fn two_point_rating_splits_at_zero() {
        let scale = default_scale();
        assert_eq!(resolve_rating(0.0, &stats_unit(), 2, &scale).label, "Achieved");
        assert_eq!(
            resolve_rating(-0.01, &stats_unit(), 2, &scale).label,
            "Emerging"
        );
    }

    #[test]
    fn three_point_rating_bands() {
        let scale = default_scale();
        assert_eq!(resolve_rating(1.01, &stats_unit(), 3, &scale).label, "Exceeding");
        assert_eq!(resolve_rating(1.0, &stats_unit(), 3, &scale).label, "Meeting");
        assert_eq!(resolve_rating(-1.0, &stats_unit(), 3, &scale).label, "Meeting");
        assert_eq!(
            resolve_rating(-1.01, &stats_unit(), 3, &scale).label,
            "Emerging"
        );
    }

    #[test]
    fn five_point_rating_bands() {
        let scale = default_scale();
        assert_eq!(resolve_rating(1.51, &stats_unit(), 5, &scale).label, "Exceeding");
        // 1.5 itself is outside the strict upper band
        assert_eq!(resolve_rating(1.5, &stats_unit(), 5, &scale).label, "Meeting");
        assert_eq!(
            resolve_rating(-0.5, &stats_unit(), 5, &scale).label,
            "Approaching"
        );
        assert_eq!(resolve_rating(-1.5, &stats_unit(), 5, &scale).label, "Emerging");
        assert_eq!(
            resolve_rating(-1.51, &stats_unit(), 5, &scale).label,
            "Beginning"
        );
    }

    #[test]
    fn nine_point_rating_delegates_to_grade_table() {
        let scale = default_scale();
        let r = resolve_rating(1.41, &stats_unit(), 9, &scale);
        assert_eq!(r.label, "B2");
        assert_eq!(r.value, 2);
    }

    #[test]
    fn degenerate_rating_is_na_for_every_tier() {
        let scale = default_scale();
        let flat = ScoreStats {
            mean: 60.0,
            std_dev: 0.0,
        };
        for points in [2, 3, 5, 9] {
            let r = resolve_rating(60.0, &flat, points, &scale);
            assert_eq!(r.label, "N/A", "points {}", points);
            assert_eq!(r.value, 0);
        }
    }

    #[test]
    fn range_lookup_first_match_wins() {
        let ranges = vec![
            crate::config::RangeBand {
                min: 50.0,
                max: 100.0,
                label: "High".to_string(),
                color: "#2e7d32".to_string(),
                remark: "high".to_string(),
            },
            crate::config::RangeBand {
                min: 40.0,
                max: 60.0,
                label: "Overlap".to_string(),
                color: "#fdd835".to_string(),
                remark: "overlap".to_string(),
            },
        ];
        assert_eq!(resolve_range(55.0, &ranges).label, "High");
        assert_eq!(resolve_range(45.0, &ranges).label, "Overlap");
    }

    #[test]
    fn uncovered_score_resolves_to_question_mark() {
        let ranges = crate::config::Settings::default().grade_ranges;
        let m = resolve_range(79.5, &ranges);
        assert_eq!(m.label, "?");
        assert_eq!(m.color, NEUTRAL_COLOR);
        assert_eq!(m.remark, "Unknown");
    }

    #[test]
    fn rating_rescale_uses_fallback_denominator() {
        assert!((rating_to_percent(2.0, 3.0) - 66.6666).abs() < 1e-3);
        assert_eq!(rating_to_percent(2.0, 0.0), 200.0);
    }

    #[test]
    fn band_remark_boundaries() {
        assert_eq!(band_remark(80.0), "Excellent");
        assert_eq!(band_remark(79.9), "Very Good");
        assert_eq!(band_remark(70.0), "Very Good");
        assert_eq!(band_remark(60.0), "Good");
        assert_eq!(band_remark(50.0), "Credit");
        assert_eq!(band_remark(40.0), "Pass");
        assert_eq!(band_remark(39.9), "Fail");
    }

    #[test]
    fn category_ladder_boundaries() {
        let cases = [
            (6, "P1"),
            (10, "P1"),
            (11, "G1"),
            (18, "G1"),
            (19, "S1"),
            (30, "S1"),
            (31, "B1"),
            (45, "B1"),
            (46, "W1"),
            (54, "W1"),
        ];
        for (aggregate, code) in cases {
            assert_eq!(
                classify_aggregate(aggregate).code,
                code,
                "aggregate {}",
                aggregate
            );
        }
    }

    #[test]
    fn composite_total_combines_sections() {
        let w = CompositeWeights::default();
        // full marks in both sections land exactly on 100
        assert_eq!(composite_total(Some(60.0), Some(100.0), &w), Some(100.0));
        assert_eq!(composite_total(Some(30.0), None, &w), Some(15.0));
        assert_eq!(composite_total(None, None, &w), None);
    }

    #[test]
    fn composite_zero_max_defaults_denominator() {
        let w = CompositeWeights {
            class_percent: 50.0,
            exam_percent: 50.0,
            class_max: 0.0,
            exam_max: 100.0,
        };
        // class section divides by 1 instead of 0
        assert_eq!(composite_total(Some(1.0), Some(100.0), &w), Some(100.0));
    }

    #[test]
    fn ordinals() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (101, "101st"),
            (111, "111th"),
        ];
        for (n, want) in cases {
            assert_eq!(ordinal(n), want);
        }
    }
}
