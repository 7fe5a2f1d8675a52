use crate::analytics::fallback::DemoFallback;
use crate::config::AppConfig;
use crate::db::RecordStore;
use crate::domain::gender::{GenderClassifier, PatternGenderClassifier};
use crate::middleware::RateLimiter;
use crate::time_utils::CivilZone;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const FACE_ATTEMPT_WINDOW_SECS: u64 = 60;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub zone: CivilZone,
    pub gender: Arc<dyn GenderClassifier>,
    pub face_limiter: RateLimiter,
    pub fallback: DemoFallback,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, config: &AppConfig) -> Self {
        Self {
            store,
            zone: config.zone,
            gender: Arc::new(PatternGenderClassifier::default()),
            face_limiter: RateLimiter::new(config.face_attempts_per_minute, FACE_ATTEMPT_WINDOW_SECS),
            fallback: DemoFallback::new(config.dashboard_demo_fallback),
        }
    }

    /// Current instant; handlers read time through here.
    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
