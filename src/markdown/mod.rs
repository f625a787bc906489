// Markdown subset used by the analysis API
//
// Input is parsed line by line into a small node tree which is then
// serialized to HTML (see `html`) or to terminal lines (see `ui::markdown`).

mod html;

pub use html::render_html;

/// Inline content of a heading, paragraph line or list item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Code(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    /// One entry per source line; lines are joined with hard breaks
    Paragraph(Vec<Vec<Inline>>),
    List(Vec<Vec<Inline>>),
    Code { language: Option<String>, text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// Parse markdown text into a document tree
pub fn parse(text: &str) -> Document {
    let mut parser = Parser::default();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

#[derive(Debug, Default)]
enum Open {
    #[default]
    Nothing,
    Paragraph(Vec<Vec<Inline>>),
    List(Vec<Vec<Inline>>),
    Code {
        language: Option<String>,
        lines: Vec<String>,
    },
}

#[derive(Debug, Default)]
struct Parser {
    blocks: Vec<Block>,
    open: Open,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        if let Open::Code { lines, .. } = &mut self.open {
            if is_code_fence(line) {
                self.close();
            } else {
                lines.push(line.to_string());
            }
            return;
        }

        if is_code_fence(line) {
            self.close();
            self.open = Open::Code {
                language: extract_code_language(line),
                lines: Vec::new(),
            };
        } else if line.trim().is_empty() {
            self.close();
        } else if let Some((level, rest)) = heading(line) {
            self.close();
            self.blocks.push(Block::Heading {
                level,
                content: parse_inlines(rest.trim_end()),
            });
        } else if let Some(item) = list_item(line) {
            let item = parse_inlines(item.trim_end());
            if let Open::List(items) = &mut self.open {
                items.push(item);
            } else {
                self.close();
                self.open = Open::List(vec![item]);
            }
        } else {
            let text = parse_inlines(line.trim_end());
            if let Open::Paragraph(lines) = &mut self.open {
                lines.push(text);
            } else {
                self.close();
                self.open = Open::Paragraph(vec![text]);
            }
        }
    }

    fn close(&mut self) {
        match std::mem::take(&mut self.open) {
            Open::Nothing => {}
            Open::Paragraph(lines) => self.blocks.push(Block::Paragraph(lines)),
            Open::List(items) => self.blocks.push(Block::List(items)),
            Open::Code { language, lines } => self.blocks.push(Block::Code {
                language,
                text: lines.join("\n"),
            }),
        }
    }

    fn finish(mut self) -> Document {
        self.close();
        Document {
            blocks: self.blocks,
        }
    }
}

/// `#`, `##` and `###` headings; deeper levels are plain text
fn heading(line: &str) -> Option<(u8, &str)> {
    [("### ", 3), ("## ", 2), ("# ", 1)]
        .into_iter()
        .find_map(|(prefix, level)| line.strip_prefix(prefix).map(|rest| (level, rest)))
}

fn list_item(line: &str) -> Option<&str> {
    line.strip_prefix("* ").or_else(|| line.strip_prefix("- "))
}

/// Detect if a line is a code block fence
pub fn is_code_fence(line: &str) -> bool {
    line.trim().starts_with("```")
}

/// Extract language from code fence
pub fn extract_code_language(line: &str) -> Option<String> {
    line.trim()
        .strip_prefix("```")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(ToString::to_string)
}

/// Parse `**strong**`, `*emphasis*` and `` `code` `` spans.
///
/// Markers without a closing partner are kept as literal text. Code spans are
/// verbatim; strong and emphasis spans may nest other spans.
pub fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        let span = if let Some(after) = rest.strip_prefix("**") {
            after
                .find("**")
                .filter(|&end| end > 0)
                .map(|end| (Inline::Strong(parse_inlines(&after[..end])), &after[end + 2..]))
        } else if let Some(after) = rest.strip_prefix('*') {
            after
                .find('*')
                .filter(|&end| end > 0)
                .map(|end| (Inline::Emphasis(parse_inlines(&after[..end])), &after[end + 1..]))
        } else if let Some(after) = rest.strip_prefix('`') {
            after
                .find('`')
                .map(|end| (Inline::Code(after[..end].to_string()), &after[end + 1..]))
        } else {
            None
        };

        if let Some((inline, remaining)) = span {
            if !plain.is_empty() {
                inlines.push(Inline::Text(std::mem::take(&mut plain)));
            }
            inlines.push(inline);
            rest = remaining;
        } else {
            plain.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }

    if !plain.is_empty() {
        inlines.push(Inline::Text(plain));
    }
    inlines
}
