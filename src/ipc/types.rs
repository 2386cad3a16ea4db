use serde::Deserialize;

use crate::config::Settings;
use crate::roster::StudentRecord;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The user-edited collections the daemon computes over: the current
/// roster and the grading configuration. Replaced wholesale by the load and
/// settings handlers; computation handlers only ever borrow them.
pub struct AppState {
    pub students: Vec<StudentRecord>,
    pub settings: Settings,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            students: Vec::new(),
            settings: Settings::default(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
