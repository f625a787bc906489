use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::icons::{self, Icon};
use crate::app::App;
use crate::workflow::{Button, Severity, ANALYSIS_PLACEHOLDER};

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "KHDA Inspector - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("Document:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Typing        - Edit the document path"),
        Line::from("  Enter         - Select the document"),
        Line::from(""),
        Line::from(Span::styled("Actions:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+A        - Analyze document"),
        Line::from("  Ctrl+G        - Generate inspection report"),
        Line::from("  Ctrl+E        - Export analysis as HTML"),
        Line::from(""),
        Line::from(Span::styled("Navigation:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down       - Scroll analysis"),
        Line::from("  PgUp/PgDn     - Scroll analysis"),
        Line::from("  Home/End      - Jump to start/end"),
        Line::from(""),
        Line::from(Span::styled("General:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from("  Ctrl+C        - Quit application"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    // Calculate centered position
    let popup_width = 60;
    let popup_height = 25;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel".to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if let Some(notice) = &app.notice {
        (notice.clone(), Style::default().fg(Color::Green))
    } else {
        (
            "Enter: Select | Ctrl+A: Analyze | Ctrl+G: Generate | Ctrl+E: Export | Ctrl+H: Help | Ctrl+C: Quit"
                .to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}

pub fn render_path_input(frame: &mut Frame, app: &App, area: Rect) {
    let (input_text, input_style) = if app.path_input.is_empty() {
        (
            "Type the path of a document to inspect...",
            Style::default().fg(Color::Gray),
        )
    } else {
        (
            app.path_input.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    };

    let input = Paragraph::new(input_text).style(input_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Document ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(input, area);
}

pub fn render_selected_file(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(label) = app.inspector.selected_file_label() {
        let selected = Paragraph::new(format!(" {label}")).style(Style::default().fg(Color::Green));
        frame.render_widget(selected, area);
    }
}

fn button_span(button: &Button, icon: Icon, key: &str, tick: usize) -> Span<'static> {
    let label = icons::decorate(icon, button.current_label(), button.loading, tick);
    let style = if button.loading {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else if button.enabled {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("[ {label}  {key} ]"), style)
}

pub fn render_buttons(frame: &mut Frame, app: &App, area: Rect) {
    let buttons = Line::from(vec![
        Span::raw(" "),
        button_span(&app.inspector.analyze_button, Icon::FileUp, "^A", app.tick),
        Span::raw("   "),
        button_span(&app.inspector.generate_button, Icon::Rocket, "^G", app.tick),
    ]);

    frame.render_widget(Paragraph::new(buttons), area);
}

pub fn render_status_banner(frame: &mut Frame, app: &App, area: Rect) {
    let Some(status) = app.inspector.status() else {
        return;
    };

    let color = match status.severity {
        Severity::Error => Color::Red,
        Severity::Info => Color::Blue,
    };

    let banner = Paragraph::new(status.message.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", status.title()))
                .border_style(Style::default().fg(color)),
        )
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true });

    frame.render_widget(banner, area);
}

pub fn render_analysis(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = if app.inspector.is_busy() {
        " Analysis (waiting for the API) "
    } else {
        " Analysis "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(document) = app.inspector.analysis_document() else {
        let placeholder = Paragraph::new(ANALYSIS_PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(placeholder, area);
        return;
    };

    let lines = super::markdown::document_to_lines(document);

    // Account for wrapping to find the true visual height inside the borders
    let available_width = area.width.saturating_sub(2).max(1) as usize;
    let total_visual_lines: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(available_width).max(1))
        .sum();

    let visible_height = area.height.saturating_sub(2) as usize;
    let max_scroll = total_visual_lines.saturating_sub(visible_height);
    let actual_scroll = app.scroll_offset.min(max_scroll);

    // Sync the actual scroll back to the app state
    if app.scroll_offset != actual_scroll {
        app.scroll_offset = actual_scroll;
    }

    let analysis = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(analysis, area);
}

pub fn render_download(frame: &mut Frame, app: &App, area: Rect) {
    let Some(url) = app.inspector.download_url() else {
        return;
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{} Download report: ", Icon::Download.glyph()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::styled(url, Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)),
    ])];
    if let Some(notice) = app.inspector.report_notice() {
        lines.push(Line::from(Span::styled(
            format!("{} {notice}", Icon::ArrowRight.glyph()),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let download = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Report ")
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(download, area);
}
