use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, StudentRecord};
use serde_json::json;
use uuid::Uuid;

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("students") else {
        return err(&req.id, "bad_params", "missing params.students", None);
    };
    let mut students: Vec<StudentRecord> = match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("students: {}", e), None),
    };
    for s in &mut students {
        if s.id.as_deref().map(str::trim).unwrap_or("").is_empty() {
            s.id = Some(Uuid::new_v4().to_string());
        }
    }
    let ids: Vec<&str> = students.iter().filter_map(|s| s.id.as_deref()).collect();
    let resp = ok(
        &req.id,
        json!({ "count": students.len(), "studentIds": ids }),
    );
    tracing::info!(count = students.len(), "roster replaced");
    state.students = students;
    resp
}

fn handle_process(state: &AppState, req: &Request) -> serde_json::Value {
    let term = req
        .params
        .get("term")
        .and_then(|v| v.as_str())
        .unwrap_or(&state.settings.current_term)
        .to_string();
    let pupils = roster::process_roster(&state.students, &state.settings, &term);
    tracing::debug!(term = %term, pupils = pupils.len(), "roster processed");
    ok(
        &req.id,
        json!({
            "generatedAt": chrono::Utc::now().to_rfc3339(),
            "term": term,
            "classSize": pupils.len(),
            "pupils": pupils,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.load" => Some(handle_load(state, req)),
        "roster.process" => Some(handle_process(state, req)),
        _ => None,
    }
}
