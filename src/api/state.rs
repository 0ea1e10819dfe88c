use crate::config::TriageConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: TriageConfig,
    pub log_path: String,
}
