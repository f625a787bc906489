// Event types for async communication

use crate::api::ApiError;

/// Outcome of a request task, applied to the inspector by the main loop.
///
/// `generation` is the inspector's selection generation when the request
/// started; outcomes from an older selection are discarded.
#[derive(Debug)]
pub enum AppEvent {
    /// Analysis text, or why the upload failed
    AnalysisFinished {
        generation: u64,
        outcome: Result<String, ApiError>,
    },
    /// Report filename, or why generation failed
    ReportFinished {
        generation: u64,
        outcome: Result<String, ApiError>,
    },
}
