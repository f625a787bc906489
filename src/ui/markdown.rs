// Terminal rendering of the markdown tree

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::markdown::{Block, Document, Inline};

/// Convert a parsed document to styled lines, one blank line between blocks
pub fn document_to_lines(document: &Document) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (index, block) in document.blocks.iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        push_block(&mut lines, block);
    }

    lines
}

fn push_block(lines: &mut Vec<Line<'static>>, block: &Block) {
    match block {
        Block::Heading { level, content } => {
            let color = match level {
                1 => Color::Yellow,
                2 => Color::Cyan,
                _ => Color::Blue,
            };
            let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            let mut spans = Vec::new();
            push_inlines(&mut spans, content, style);
            lines.push(Line::from(spans));
        }
        Block::Paragraph(paragraph) => {
            for line in paragraph {
                let mut spans = Vec::new();
                push_inlines(&mut spans, line, Style::default());
                lines.push(Line::from(spans));
            }
        }
        Block::List(items) => {
            for item in items {
                let mut spans = vec![Span::styled("• ", Style::default().fg(Color::Cyan))];
                push_inlines(&mut spans, item, Style::default());
                lines.push(Line::from(spans));
            }
        }
        Block::Code { language, text } => {
            let lang_display = language.as_deref().unwrap_or("code");
            lines.push(Line::from(Span::styled(
                format!("┌─ {lang_display} ───────────────────────────────────────────"),
                Style::default().fg(Color::DarkGray),
            )));
            for code_line in text.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {code_line}"),
                    Style::default().fg(Color::Green),
                )));
            }
            lines.push(Line::from(Span::styled(
                "└──────────────────────────────────────────────",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
}

/// Flatten inline spans, layering strong/emphasis modifiers onto `base`
fn push_inlines(spans: &mut Vec<Span<'static>>, inlines: &[Inline], base: Style) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => spans.push(Span::styled(text.clone(), base)),
            Inline::Strong(children) => push_inlines(
                spans,
                children,
                base.fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Inline::Emphasis(children) => {
                push_inlines(spans, children, base.add_modifier(Modifier::ITALIC));
            }
            Inline::Code(code) => spans.push(Span::styled(code.clone(), base.fg(Color::Magenta))),
        }
    }
}
