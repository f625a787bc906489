// Upload, analyze and report workflow
//
// `Inspector` owns the workflow state together with the view model the
// front ends draw. Requests are split into `begin_*` (validation and busy
// state) and `finish_*` (applying the outcome) so the terminal front end can
// run the HTTP call on a spawned task; `analyze` and `generate_report` run the
// same steps sequentially.

use thiserror::Error;

use crate::api::{ApiError, Endpoints, InspectionClient};
use crate::markdown::{self, Document};
use crate::models::SelectedFile;

pub const ANALYSIS_PLACEHOLDER: &str = "No analysis yet. Upload a document and click \"Analyze Document\" to see structured findings here.";
pub const REPORT_NOTICE: &str =
    "Your inspection report is ready. Open the download link to retrieve it.";

const ANALYZING: &str = "Analyzing document... This may take a moment.";
const GENERATING: &str =
    "Generating report with AI agents... This is a complex task and can take up to a minute.";
const ANALYSIS_FALLBACK: &str = "Analysis failed. Please try again.";
const REPORT_FALLBACK: &str = "Report generation failed.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Please select a file to analyze.")]
    NoFileSelected,
    #[error("No analysis text available to generate a report.")]
    NoAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
}

impl Status {
    pub const fn title(&self) -> &'static str {
        match self.severity {
            Severity::Error => "There was a problem",
            Severity::Info => "Working...",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowState {
    pub selected_file: Option<SelectedFile>,
    pub status: Option<Status>,
    pub busy: bool,
    /// Empty until an analysis succeeds
    pub analysis_text: String,
    /// Empty until a report is generated
    pub report_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub busy_label: &'static str,
    pub enabled: bool,
    pub loading: bool,
}

impl Button {
    const fn new(label: &'static str, busy_label: &'static str) -> Self {
        Self {
            label,
            busy_label,
            enabled: false,
            loading: false,
        }
    }

    pub const fn current_label(&self) -> &'static str {
        if self.loading {
            self.busy_label
        } else {
            self.label
        }
    }

    const fn start_loading(&mut self) {
        self.loading = true;
        self.enabled = false;
    }

    const fn stop_loading(&mut self, enabled: bool) {
        self.loading = false;
        self.enabled = enabled;
    }
}

#[derive(Debug)]
pub struct Inspector {
    state: WorkflowState,
    endpoints: Endpoints,
    pub analyze_button: Button,
    pub generate_button: Button,
    analysis_document: Document,
    analysis_html: String,
    generation: u64,
}

impl Inspector {
    /// Idle state: nothing selected, both actions disabled, placeholder shown
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            state: WorkflowState::default(),
            endpoints,
            analyze_button: Button::new("Analyze Document", "Processing"),
            generate_button: Button::new("Generate Inspection Report", "Generating"),
            analysis_document: Document::default(),
            analysis_html: String::new(),
            generation: 0,
        }
    }

    pub const fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub const fn status(&self) -> Option<&Status> {
        self.state.status.as_ref()
    }

    pub const fn is_busy(&self) -> bool {
        self.state.busy
    }

    /// Bumped on every selection change. Request outcomes carry the value
    /// they were started under.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub const fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn analysis_text(&self) -> &str {
        &self.state.analysis_text
    }

    pub fn selected_file_label(&self) -> Option<String> {
        self.state
            .selected_file
            .as_ref()
            .map(|file| format!("Selected: {}", file.name))
    }

    /// Parsed analysis, or `None` while the placeholder is shown
    pub fn analysis_document(&self) -> Option<&Document> {
        if self.state.analysis_text.is_empty() {
            None
        } else {
            Some(&self.analysis_document)
        }
    }

    /// The analysis display as an HTML fragment
    pub fn analysis_html(&self) -> String {
        if self.state.analysis_text.is_empty() {
            format!("<p class=\"analysis-placeholder\">{ANALYSIS_PLACEHOLDER}</p>")
        } else {
            format!("<div class=\"analysis-content\">{}</div>", self.analysis_html)
        }
    }

    /// Download link target; `None` keeps the link and the report notice hidden
    pub fn download_url(&self) -> Option<String> {
        if self.state.report_filename.is_empty() {
            None
        } else {
            Some(self.endpoints.download_url(&self.state.report_filename))
        }
    }

    pub fn report_notice(&self) -> Option<&'static str> {
        self.download_url().map(|_| REPORT_NOTICE)
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.set_status(message.into(), Severity::Error);
    }

    /// Replace the selection; any previous analysis and report are dropped
    pub fn select_file(&mut self, file: Option<SelectedFile>) {
        tracing::debug!(file = ?file.as_ref().map(|f| &f.path), "file selection changed");

        self.generation = self.generation.wrapping_add(1);
        self.state.selected_file = file;
        self.state.report_filename.clear();
        // The banner of a request still in flight stays until it returns
        let busy = self.state.busy;
        self.state.status = self
            .state
            .status
            .take()
            .filter(|status| busy && status.severity == Severity::Info);
        self.set_analysis(String::new());

        if !self.analyze_button.loading {
            self.analyze_button.enabled = self.state.selected_file.is_some();
        }
        self.generate_button.enabled = false;
    }

    /// Validate and enter the busy state for an analysis request.
    ///
    /// Returns the file to upload. Without a selection the error is shown in
    /// the status banner and no request must be made.
    pub fn begin_analysis(&mut self) -> Result<SelectedFile, WorkflowError> {
        let Some(file) = self.state.selected_file.clone() else {
            return Err(self.reject(WorkflowError::NoFileSelected));
        };

        tracing::info!(file = %file.name, "analysis started");
        self.state.busy = true;
        self.set_status(ANALYZING.to_string(), Severity::Info);
        self.analyze_button.start_loading();
        self.generate_button.enabled = false;
        self.state.report_filename.clear();
        self.set_analysis(String::new());

        Ok(file)
    }

    pub fn finish_analysis(&mut self, outcome: Result<String, ApiError>) {
        match outcome {
            Ok(text) => {
                tracing::info!(chars = text.len(), "analysis finished");
                self.set_analysis(text);
                self.state.status = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "analysis failed");
                self.set_analysis(String::new());
                self.show_error(format!(
                    "Error during analysis: {}",
                    failure_message(&err, ANALYSIS_FALLBACK)
                ));
            }
        }

        self.state.busy = false;
        self.analyze_button
            .stop_loading(self.state.selected_file.is_some());
        if !self.generate_button.loading {
            self.generate_button.enabled = !self.state.analysis_text.is_empty();
        }
    }

    /// Validate and enter the busy state for a report request.
    ///
    /// Returns the analysis text to send.
    pub fn begin_report(&mut self) -> Result<String, WorkflowError> {
        if self.state.analysis_text.is_empty() {
            return Err(self.reject(WorkflowError::NoAnalysis));
        }

        tracing::info!("report generation started");
        self.state.busy = true;
        self.state.report_filename.clear();
        self.set_status(GENERATING.to_string(), Severity::Info);
        self.generate_button.start_loading();

        Ok(self.state.analysis_text.clone())
    }

    pub fn finish_report(&mut self, outcome: Result<String, ApiError>) {
        match outcome {
            Ok(filename) => {
                tracing::info!(report = %filename, "report generated");
                self.state.report_filename = filename;
                self.state.status = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "report generation failed");
                self.state.report_filename.clear();
                self.show_error(format!(
                    "Error generating report: {}",
                    failure_message(&err, REPORT_FALLBACK)
                ));
            }
        }

        self.state.busy = false;
        self.generate_button
            .stop_loading(!self.state.analysis_text.is_empty());
    }

    /// Leave the busy state of an analysis started for a previous selection
    /// without applying its outcome
    pub fn discard_analysis(&mut self) {
        tracing::debug!("analysis outcome discarded after selection change");
        self.end_discarded_request();
        self.analyze_button
            .stop_loading(self.state.selected_file.is_some());
    }

    /// Leave the busy state of a report started for a previous selection
    pub fn discard_report(&mut self) {
        tracing::debug!("report outcome discarded after selection change");
        self.end_discarded_request();
        self.generate_button
            .stop_loading(!self.state.analysis_text.is_empty());
    }

    /// Run an analysis request to completion
    pub async fn analyze(&mut self, client: &InspectionClient) {
        if let Ok(file) = self.begin_analysis() {
            let outcome = client.analyze(&file).await;
            self.finish_analysis(outcome);
        }
    }

    /// Run a report request to completion
    pub async fn generate_report(&mut self, client: &InspectionClient) {
        if let Ok(text) = self.begin_report() {
            let outcome = client.generate_report(&text).await;
            self.finish_report(outcome);
        }
    }

    fn reject(&mut self, err: WorkflowError) -> WorkflowError {
        tracing::debug!(error = %err, "action rejected");
        self.show_error(err.to_string());
        err
    }

    fn end_discarded_request(&mut self) {
        self.state.busy = false;
        if self
            .state
            .status
            .as_ref()
            .is_some_and(|status| status.severity == Severity::Info)
        {
            self.state.status = None;
        }
    }

    fn set_status(&mut self, message: String, severity: Severity) {
        self.state.status = Some(Status { message, severity });
    }

    fn set_analysis(&mut self, text: String) {
        if text.is_empty() {
            self.analysis_document = Document::default();
            self.analysis_html.clear();
        } else {
            self.analysis_document = markdown::parse(&text);
            self.analysis_html = markdown::render_html(&text);
        }
        self.state.analysis_text = text;
    }
}

/// Server detail, else the fallback for HTTP failures, else the error text
fn failure_message(err: &ApiError, fallback: &str) -> String {
    let message = match err {
        ApiError::Server { .. } => err.detail().unwrap_or(fallback).to_string(),
        other => other.to_string(),
    };

    if message.trim().is_empty() {
        "Unknown error".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ANALYZE_PATH: &str = "/api/v1/analysis/analyze";
    const REPORT_PATH: &str = "/api/v1/inspection/generate-report";

    struct Harness {
        server: MockServer,
        client: InspectionClient,
        inspector: Inspector,
        dir: TempDir,
    }

    impl Harness {
        async fn start() -> Self {
            let server = MockServer::start().await;
            let endpoints = Endpoints::new(&format!("{}/api/v1", server.uri())).unwrap();
            let client = InspectionClient::new(endpoints.clone(), Some(5)).unwrap();
            Self {
                server,
                client,
                inspector: Inspector::new(endpoints),
                dir: TempDir::new().unwrap(),
            }
        }

        fn file(&self, name: &str) -> SelectedFile {
            let path = self.dir.path().join(name);
            fs::write(&path, b"document body").unwrap();
            SelectedFile::from_path(&path).unwrap()
        }

        async fn mock(&self, route: &str, response: ResponseTemplate, calls: u64) {
            Mock::given(method("POST"))
                .and(path(route))
                .respond_with(response)
                .expect(calls)
                .mount(&self.server)
                .await;
        }
    }

    fn offline_inspector() -> Inspector {
        Inspector::new(Endpoints::new("https://inspector.test/api/v1").unwrap())
    }

    fn error_message(inspector: &Inspector) -> &str {
        let status = inspector.status().expect("status should be set");
        assert_eq!(status.severity, Severity::Error);
        &status.message
    }

    #[test]
    fn test_idle_initialization() {
        let inspector = offline_inspector();
        assert!(!inspector.analyze_button.enabled);
        assert!(!inspector.generate_button.enabled);
        assert!(inspector.analysis_document().is_none());
        assert!(inspector.analysis_html().contains(ANALYSIS_PLACEHOLDER));
        assert!(inspector.download_url().is_none());
        assert!(inspector.report_notice().is_none());
        assert!(inspector.status().is_none());
        assert!(!inspector.is_busy());
    }

    #[test]
    fn test_select_file_enables_analyze() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("form.pdf");
        fs::write(&path, b"x").unwrap();

        let mut inspector = offline_inspector();
        inspector.select_file(Some(SelectedFile::from_path(&path).unwrap()));
        assert!(inspector.analyze_button.enabled);
        assert!(!inspector.generate_button.enabled);
        assert_eq!(inspector.selected_file_label().as_deref(), Some("Selected: form.pdf"));

        inspector.select_file(None);
        assert!(!inspector.analyze_button.enabled);
        assert!(inspector.selected_file_label().is_none());
    }

    #[test]
    fn test_discard_analysis_after_reselect() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("a.pdf");
        let second = dir.path().join("b.pdf");
        fs::write(&first, b"x").unwrap();
        fs::write(&second, b"y").unwrap();

        let mut inspector = offline_inspector();
        inspector.select_file(Some(SelectedFile::from_path(&first).unwrap()));
        inspector.begin_analysis().unwrap();
        let started = inspector.generation();

        inspector.select_file(Some(SelectedFile::from_path(&second).unwrap()));
        assert!(!inspector.is_current(started));
        // The in-flight request keeps its banner
        let status = inspector.status().unwrap();
        assert_eq!(status.severity, Severity::Info);
        assert!(inspector.is_busy());

        inspector.discard_analysis();
        assert!(!inspector.is_busy());
        assert!(inspector.status().is_none());
        assert!(inspector.analysis_document().is_none());
        assert!(inspector.analyze_button.enabled);
        assert!(!inspector.analyze_button.loading);
        assert!(!inspector.generate_button.enabled);
    }

    #[tokio::test]
    async fn test_analyze_without_file_is_rejected() {
        let mut h = Harness::start().await;
        h.mock(ANALYZE_PATH, ResponseTemplate::new(200), 0).await;

        h.inspector.analyze(&h.client).await;

        assert_eq!(error_message(&h.inspector), "Please select a file to analyze.");
        assert!(!h.inspector.is_busy());
        assert_eq!(
            h.inspector.begin_analysis(),
            Err(WorkflowError::NoFileSelected)
        );
    }

    #[tokio::test]
    async fn test_generate_before_analysis_is_rejected() {
        let mut h = Harness::start().await;
        h.mock(REPORT_PATH, ResponseTemplate::new(200), 0).await;

        h.inspector.generate_report(&h.client).await;

        assert_eq!(
            error_message(&h.inspector),
            "No analysis text available to generate a report."
        );
        assert!(h.inspector.download_url().is_none());
    }

    #[test]
    fn test_begin_analysis_enters_busy_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("form.pdf");
        fs::write(&path, b"x").unwrap();

        let mut inspector = offline_inspector();
        inspector.select_file(Some(SelectedFile::from_path(&path).unwrap()));
        let file = inspector.begin_analysis().unwrap();

        assert_eq!(file.name, "form.pdf");
        assert!(inspector.is_busy());
        assert!(inspector.analyze_button.loading);
        assert!(!inspector.analyze_button.enabled);
        assert_eq!(inspector.analyze_button.current_label(), "Processing");
        let status = inspector.status().unwrap();
        assert_eq!(status.severity, Severity::Info);
        assert_eq!(status.title(), "Working...");
        assert_eq!(status.message, ANALYZING);
    }

    #[tokio::test]
    async fn test_successful_analysis_renders_and_enables_generate() {
        let mut h = Harness::start().await;
        h.mock(
            ANALYZE_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "result": "**hi**" })),
            1,
        )
        .await;

        let file = h.file("sef.pdf");
        h.inspector.select_file(Some(file));
        h.inspector.analyze(&h.client).await;

        assert!(h.inspector.analysis_html().contains("<strong>hi</strong>"));
        assert!(h.inspector.analysis_html().starts_with("<div class=\"analysis-content\">"));
        assert_eq!(h.inspector.analysis_text(), "**hi**");
        assert!(h.inspector.analysis_document().is_some());
        assert!(h.inspector.generate_button.enabled);
        assert!(h.inspector.status().is_none());
        assert!(!h.inspector.is_busy());
        assert!(!h.inspector.analyze_button.loading);
        assert_eq!(h.inspector.analyze_button.current_label(), "Analyze Document");
    }

    #[tokio::test]
    async fn test_failed_analysis_reports_detail() {
        let mut h = Harness::start().await;
        h.mock(
            ANALYZE_PATH,
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "bad file" })),
            1,
        )
        .await;

        let file = h.file("sef.pdf");
        h.inspector.select_file(Some(file));
        h.inspector.analyze(&h.client).await;

        assert_eq!(error_message(&h.inspector), "Error during analysis: bad file");
        assert_eq!(h.inspector.status().unwrap().title(), "There was a problem");
        assert!(!h.inspector.generate_button.enabled);
        assert!(h.inspector.analysis_text().is_empty());
        assert!(!h.inspector.is_busy());
        assert!(h.inspector.analyze_button.enabled);
        assert_eq!(h.inspector.analyze_button.current_label(), "Analyze Document");
    }

    #[tokio::test]
    async fn test_failed_analysis_without_detail_uses_fallback() {
        let mut h = Harness::start().await;
        h.mock(
            ANALYZE_PATH,
            ResponseTemplate::new(500).set_body_string("Internal Server Error"),
            1,
        )
        .await;

        let file = h.file("sef.pdf");
        h.inspector.select_file(Some(file));
        h.inspector.analyze(&h.client).await;

        assert_eq!(
            error_message(&h.inspector),
            "Error during analysis: Analysis failed. Please try again."
        );
    }

    #[tokio::test]
    async fn test_empty_analysis_keeps_generate_disabled() {
        let mut h = Harness::start().await;
        h.mock(ANALYZE_PATH, ResponseTemplate::new(200).set_body_json(json!({})), 1)
            .await;

        let file = h.file("sef.pdf");
        h.inspector.select_file(Some(file));
        h.inspector.analyze(&h.client).await;

        assert!(h.inspector.status().is_none());
        assert!(!h.inspector.generate_button.enabled);
        assert!(h.inspector.analysis_html().contains(ANALYSIS_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_successful_report_reveals_download() {
        let mut h = Harness::start().await;
        h.mock(
            ANALYZE_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "result": "## Findings" })),
            1,
        )
        .await;
        h.mock(
            REPORT_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "report_filename": "report-123.pdf" })),
            1,
        )
        .await;

        let file = h.file("sef.pdf");
        h.inspector.select_file(Some(file));
        h.inspector.analyze(&h.client).await;
        h.inspector.generate_report(&h.client).await;

        let url = h.inspector.download_url().expect("download link should be visible");
        assert!(url.ends_with("/api/v1/reports/report-123.pdf"));
        assert_eq!(h.inspector.report_notice(), Some(REPORT_NOTICE));
        assert!(h.inspector.status().is_none());
        assert!(!h.inspector.is_busy());
        assert!(h.inspector.generate_button.enabled);
        assert_eq!(
            h.inspector.generate_button.current_label(),
            "Generate Inspection Report"
        );
    }

    #[tokio::test]
    async fn test_failed_report_hides_download() {
        let mut h = Harness::start().await;
        h.mock(
            ANALYZE_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "result": "text" })),
            1,
        )
        .await;
        h.mock(REPORT_PATH, ResponseTemplate::new(503), 1).await;

        let file = h.file("sef.pdf");
        h.inspector.select_file(Some(file));
        h.inspector.analyze(&h.client).await;
        h.inspector.generate_report(&h.client).await;

        assert_eq!(
            error_message(&h.inspector),
            "Error generating report: Report generation failed."
        );
        assert!(h.inspector.download_url().is_none());
        assert!(h.inspector.report_notice().is_none());
        assert!(!h.inspector.is_busy());
        assert!(h.inspector.generate_button.enabled);
    }

    #[tokio::test]
    async fn test_begin_report_clears_previous_report() {
        let mut h = Harness::start().await;
        h.mock(
            ANALYZE_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "result": "text" })),
            1,
        )
        .await;
        h.mock(
            REPORT_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "report_filename": "first.pdf" })),
            1,
        )
        .await;

        let file = h.file("sef.pdf");
        h.inspector.select_file(Some(file));
        h.inspector.analyze(&h.client).await;
        h.inspector.generate_report(&h.client).await;
        assert!(h.inspector.download_url().is_some());

        let text = h.inspector.begin_report().unwrap();
        assert_eq!(text, "text");
        assert!(h.inspector.download_url().is_none());
        assert!(h.inspector.generate_button.loading);
        assert_eq!(h.inspector.generate_button.current_label(), "Generating");
        assert_eq!(h.inspector.status().unwrap().message, GENERATING);
    }

    #[tokio::test]
    async fn test_new_selection_resets_analysis_and_report() {
        let mut h = Harness::start().await;
        h.mock(
            ANALYZE_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "result": "**hi**" })),
            1,
        )
        .await;
        h.mock(
            REPORT_PATH,
            ResponseTemplate::new(200).set_body_json(json!({ "report_filename": "report-123.pdf" })),
            1,
        )
        .await;

        let first = h.file("first.pdf");
        h.inspector.select_file(Some(first));
        h.inspector.analyze(&h.client).await;
        h.inspector.generate_report(&h.client).await;
        assert!(h.inspector.download_url().is_some());

        let second = h.file("second.pdf");
        h.inspector.select_file(Some(second));

        assert!(h.inspector.analysis_html().contains(ANALYSIS_PLACEHOLDER));
        assert!(h.inspector.analysis_document().is_none());
        assert!(h.inspector.download_url().is_none());
        assert!(h.inspector.report_notice().is_none());
        assert!(!h.inspector.generate_button.enabled);
        assert!(h.inspector.analyze_button.enabled);
        assert!(h.inspector.state().report_filename.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_message() {
        let endpoints = Endpoints::new("http://127.0.0.1:9/api/v1").unwrap();
        let client = InspectionClient::new(endpoints.clone(), Some(5)).unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("form.pdf");
        fs::write(&path, b"x").unwrap();

        let mut inspector = Inspector::new(endpoints);
        inspector.select_file(Some(SelectedFile::from_path(&path).unwrap()));
        inspector.analyze(&client).await;

        let message = error_message(&inspector);
        assert!(message.starts_with("Error during analysis: "));
        assert!(message.len() > "Error during analysis: ".len());
        assert!(!inspector.generate_button.enabled);
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let server = ApiError::Server {
            status: reqwest::StatusCode::BAD_GATEWAY,
            detail: None,
        };
        assert_eq!(failure_message(&server, "fallback"), "fallback");

        let decode = ApiError::Decode(String::new());
        assert_eq!(failure_message(&decode, "fallback"), "Malformed response: ");

        let blank = ApiError::Server {
            status: reqwest::StatusCode::BAD_REQUEST,
            detail: Some("  ".to_string()),
        };
        assert_eq!(failure_message(&blank, "fallback"), "Unknown error");
    }
}
