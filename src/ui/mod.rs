pub mod icons;
pub mod markdown;
pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    // Status banner and download panel only take space while visible
    let status_height = if app.inspector.status().is_some() { 4 } else { 0 };
    let download_height = if app.inspector.download_url().is_some() { 4 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),               // Path input
            Constraint::Length(1),               // Selected file
            Constraint::Length(1),               // Action buttons
            Constraint::Length(status_height),   // Status banner
            Constraint::Min(0),                  // Analysis
            Constraint::Length(download_height), // Download link + notice
            Constraint::Length(1),               // Bottom keymap bar
        ])
        .split(frame.area());

    widgets::render_path_input(frame, app, chunks[0]);
    widgets::render_selected_file(frame, app, chunks[1]);
    widgets::render_buttons(frame, app, chunks[2]);
    if status_height > 0 {
        widgets::render_status_banner(frame, app, chunks[3]);
    }
    widgets::render_analysis(frame, app, chunks[4]);
    if download_height > 0 {
        widgets::render_download(frame, app, chunks[5]);
    }
    widgets::render_bottom_bar(frame, app, chunks[6]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
