use crate::calc::{self, ScoreStats};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn parse_stats(req: &Request) -> Result<ScoreStats, serde_json::Value> {
    let mean = required_f64(req, "mean")?;
    let std_dev = required_f64(req, "stdDev")?;
    Ok(ScoreStats { mean, std_dev })
}

/// One-off lookup against the configured scale, for editors that show a
/// grade preview next to a score cell.
fn handle_grade_resolve(state: &AppState, req: &Request) -> serde_json::Value {
    let score = match required_f64(req, "score") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let stats = match parse_stats(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let g = calc::resolve_grade(
        score,
        &stats,
        &state.settings.scale,
        &state.settings.remark_overrides,
    );
    ok(&req.id, json!(g))
}

fn handle_rating_resolve(state: &AppState, req: &Request) -> serde_json::Value {
    let score = match required_f64(req, "score") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let stats = match parse_stats(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let points = req
        .params
        .get("points")
        .and_then(|v| v.as_i64())
        .unwrap_or(state.settings.rating_points);
    let r = calc::resolve_rating(score, &stats, points, &state.settings.scale);
    ok(&req.id, json!(r))
}

/// Early-years band lookup. Accepts either a 0-100 `score` or a raw
/// observation `rating`, the latter rescaled through the configured
/// observation scale before matching.
fn handle_range_resolve(state: &AppState, req: &Request) -> serde_json::Value {
    let table = req
        .params
        .get("table")
        .and_then(|v| v.as_str())
        .unwrap_or("grades");
    let ranges = match table {
        "grades" => &state.settings.grade_ranges,
        "observations" => &state.settings.observation_ranges,
        other => {
            return err(
                &req.id,
                "bad_params",
                "table must be one of: grades, observations",
                Some(json!({ "table": other })),
            )
        }
    };

    let score = if let Some(rating) = req.params.get("rating").and_then(|v| v.as_f64()) {
        calc::rating_to_percent(rating, state.settings.observation_scale_max)
    } else if let Some(score) = req.params.get("score").and_then(|v| v.as_f64()) {
        score
    } else {
        return err(&req.id, "bad_params", "missing score or rating", None);
    };

    let m = calc::resolve_range(score, ranges);
    ok(
        &req.id,
        json!({
            "score": score,
            "label": m.label,
            "color": m.color,
            "remark": m.remark,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grade.resolve" => Some(handle_grade_resolve(state, req)),
        "rating.resolve" => Some(handle_rating_resolve(state, req)),
        "range.resolve" => Some(handle_range_resolve(state, req)),
        _ => None,
    }
}
