// HTML serialization of the markdown tree
//
// Text is written as-is: raw HTML in the source passes through unescaped.

use super::{parse, Block, Document, Inline};

/// Convert markdown text to an HTML fragment
pub fn render_html(markdown: &str) -> String {
    parse(markdown).to_html()
}

impl Document {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            write_block(&mut out, block);
        }
        out
    }
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading { level, content } => {
            out.push_str(&format!("<h{level}>"));
            write_inlines(out, content);
            out.push_str(&format!("</h{level}>"));
        }
        Block::Paragraph(lines) => {
            out.push_str("<p>");
            for (index, line) in lines.iter().enumerate() {
                if index > 0 {
                    out.push_str("<br>");
                }
                write_inlines(out, line);
            }
            out.push_str("</p>");
        }
        Block::List(items) => {
            out.push_str("<ul>");
            for item in items {
                out.push_str("<li>");
                write_inlines(out, item);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }
        Block::Code { language, text } => {
            match language {
                Some(lang) => out.push_str(&format!("<pre><code class=\"language-{lang}\">")),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(text);
            out.push_str("</code></pre>");
        }
    }
}

fn write_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Strong(children) => {
                out.push_str("<strong>");
                write_inlines(out, children);
                out.push_str("</strong>");
            }
            Inline::Emphasis(children) => {
                out.push_str("<em>");
                write_inlines(out, children);
                out.push_str("</em>");
            }
            Inline::Code(code) => {
                out.push_str("<code>");
                out.push_str(code);
                out.push_str("</code>");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_three_heading() {
        let html = render_html("intro\n### Findings and notes\nmore");
        assert!(html.contains("<h3>Findings and notes</h3>"));
    }

    #[test]
    fn test_all_heading_levels() {
        assert_eq!(render_html("# A"), "<h1>A</h1>");
        assert_eq!(render_html("## B"), "<h2>B</h2>");
        assert_eq!(render_html("### C"), "<h3>C</h3>");
    }

    #[test]
    fn test_two_paragraphs() {
        let html = render_html("First paragraph.\n\nSecond paragraph.");
        assert_eq!(html, "<p>First paragraph.</p>\n<p>Second paragraph.</p>");
        assert_eq!(html.matches("<p>").count(), 2);
    }

    #[test]
    fn test_line_break_inside_paragraph() {
        assert_eq!(render_html("one\ntwo"), "<p>one<br>two</p>");
    }

    #[test]
    fn test_extra_blank_lines_emit_no_empty_paragraphs() {
        let html = render_html("one\n\n\n\ntwo\n\n");
        assert_eq!(html, "<p>one</p>\n<p>two</p>");
        assert!(!html.contains("<p></p>"));
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(render_html("**hi**"), "<p><strong>hi</strong></p>");
        assert_eq!(render_html("an *aside*"), "<p>an <em>aside</em></p>");
    }

    #[test]
    fn test_list_items_collapse_into_one_list() {
        let html = render_html("Issues:\n\n* missing policy\n* outdated register\n- no signature");
        assert_eq!(
            html,
            "<p>Issues:</p>\n<ul><li>missing policy</li><li>outdated register</li><li>no signature</li></ul>"
        );
    }

    #[test]
    fn test_code_block() {
        let html = render_html("```json\n{\"a\": 1}\n```");
        assert_eq!(html, "<pre><code class=\"language-json\">{\"a\": 1}</code></pre>");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(render_html("run `make`"), "<p>run <code>make</code></p>");
    }

    #[test]
    fn test_raw_html_passes_through() {
        assert_eq!(render_html("<b>x</b>"), "<p><b>x</b></p>");
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(render_html(""), "");
    }
}
