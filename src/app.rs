use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::events::AppEvent;
use crate::models::SelectedFile;
use crate::workflow::Inspector;

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub show_help: bool,
    pub exit_pending: bool,
    pub path_input: String,
    pub scroll_offset: usize,
    /// Advances once per frame; drives the loader animation
    pub tick: usize,
    /// Front-end message shown in the bottom bar
    pub notice: Option<String>,
    pub inspector: Inspector,
    export_dir: PathBuf,
}

impl App {
    pub const fn new(inspector: Inspector, export_dir: PathBuf) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            exit_pending: false,
            path_input: String::new(),
            scroll_offset: 0,
            tick: 0,
            notice: None,
            inspector,
            export_dir,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    pub const fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub const fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub const fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub const fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(amount);
    }

    pub const fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub const fn scroll_to_bottom(&mut self) {
        // Clamped by the analysis pane when it renders
        self.scroll_offset = usize::MAX;
    }

    /// Select the file named in the path input; an empty input clears the selection
    pub fn select_path(&mut self) {
        self.notice = None;
        self.scroll_to_top();

        let input = self.path_input.trim();
        if input.is_empty() {
            self.inspector.select_file(None);
            return;
        }

        match SelectedFile::from_path(Path::new(input)) {
            Ok(file) => self.inspector.select_file(Some(file)),
            Err(err) => {
                self.inspector.select_file(None);
                self.inspector.show_error(err.to_string());
            }
        }
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::AnalysisFinished { generation, outcome } => {
                if self.inspector.is_current(generation) {
                    self.inspector.finish_analysis(outcome);
                    self.scroll_to_top();
                } else {
                    self.inspector.discard_analysis();
                }
            }
            AppEvent::ReportFinished { generation, outcome } => {
                if self.inspector.is_current(generation) {
                    self.inspector.finish_report(outcome);
                } else {
                    self.inspector.discard_report();
                }
            }
        }
    }

    pub fn export_analysis(&mut self) {
        match write_analysis_html(&self.inspector, &self.export_dir) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "analysis exported");
                self.notice = Some(format!("Saved analysis to {}", path.display()));
            }
            Err(err) => self.inspector.show_error(format!("{err:#}")),
        }
    }
}

/// Write the rendered analysis as a standalone HTML page into `dir`
pub fn write_analysis_html(inspector: &Inspector, dir: &Path) -> Result<PathBuf> {
    if inspector.analysis_document().is_none() {
        anyhow::bail!("No analysis to export yet.");
    }

    let stem = inspector
        .state()
        .selected_file
        .as_ref()
        .and_then(|file| Path::new(&file.name).file_stem())
        .map_or_else(|| "analysis".to_string(), |s| s.to_string_lossy().into_owned());

    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{stem} analysis</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        inspector.analysis_html()
    );

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(format!("{stem}-analysis.html"));
    fs::write(&path, page).with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}
