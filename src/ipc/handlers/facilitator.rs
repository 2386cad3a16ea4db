use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use serde_json::json;

fn handle_summary(state: &AppState, req: &Request) -> serde_json::Value {
    let Some(subject) = req.params.get("subject").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing subject", None);
    };
    match roster::facilitator_summary(&state.students, &state.settings, subject) {
        Some(summary) => ok(
            &req.id,
            json!({
                "generatedAt": chrono::Utc::now().to_rfc3339(),
                "summary": summary,
            }),
        ),
        None => err(
            &req.id,
            "unknown_subject",
            format!("subject not configured: {}", subject),
            None,
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "facilitator.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
