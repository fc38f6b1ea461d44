//! Visible text extraction from HTML

use scraper::{ElementRef, Html};

/// Elements whose content never renders as page text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

/// Elements that start a new line of text
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "legend", "li", "main", "nav", "ol", "option", "p", "pre", "section",
    "summary", "table", "td", "th", "title", "tr", "ul",
];

/// Accumulates inline text and emits one line per block
#[derive(Default)]
struct TextCollector {
    current: String,
    lines: Vec<String>,
    /// Open `<pre>` elements around the current position
    preformatted: usize,
}

impl TextCollector {
    fn push(&mut self, text: &str) {
        if self.preformatted == 0 {
            self.current.push_str(text);
            return;
        }

        // Source newlines are real line breaks inside <pre>
        for (index, part) in text.split('\n').enumerate() {
            if index > 0 {
                self.break_line();
            }
            self.current.push_str(part);
        }
    }

    fn break_line(&mut self) {
        let line = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

/// Pending work of the document walk
enum Step<'a> {
    Enter(ElementRef<'a>),
    Text(&'a str),
    Leave { block: bool, pre: bool },
}

/// Convert an HTML document to its visible text.
///
/// Text is returned in document order, one line per block-level element, with
/// whitespace collapsed and empty lines dropped. Newlines inside `<pre>` are
/// kept as line breaks. The walk uses an explicit stack, so nesting depth is
/// unbounded.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = TextCollector::default();
    let mut stack = vec![Step::Enter(document.root_element())];

    while let Some(step) = stack.pop() {
        match step {
            Step::Text(text) => out.push(text),
            Step::Leave { block, pre } => {
                if block {
                    out.break_line();
                }
                if pre {
                    out.preformatted -= 1;
                }
            }
            Step::Enter(element) => {
                let name = element.value().name();
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }

                let block = BLOCK_ELEMENTS.contains(&name);
                let pre = name == "pre";
                if block || name == "br" {
                    out.break_line();
                }
                if pre {
                    out.preformatted += 1;
                }

                stack.push(Step::Leave { block, pre });
                for child in element.children().rev() {
                    if let Some(text) = child.value().as_text() {
                        stack.push(Step::Text(&**text));
                    } else if let Some(child_element) = ElementRef::wrap(child) {
                        stack.push(Step::Enter(child_element));
                    }
                }
            }
        }
    }

    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_elements_become_lines() {
        let html = r#"<html><head><title>Acme Settlement</title></head>
            <body>
              <h1>Acme Class Action</h1>
              <p>Settlement Fund: <strong>$1,200,000</strong> total</p>
              <ul><li>Tier 1: $50</li><li>Tier 2: $100</li></ul>
            </body></html>"#;

        let text = html_to_text(html);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Acme Settlement",
                "Acme Class Action",
                "Settlement Fund: $1,200,000 total",
                "Tier 1: $50",
                "Tier 2: $100",
            ]
        );
    }

    #[test]
    fn test_hidden_elements_are_skipped() {
        let html = r#"<body>
            <script>var fund = "$9,999,999 settlement fund";</script>
            <style>p { color: red; }</style>
            <noscript>Enable JavaScript</noscript>
            <p>Visible</p>
        </body>"#;

        assert_eq!(html_to_text(html), "Visible");
    }

    #[test]
    fn test_line_breaks_and_whitespace() {
        let html = "<p>Claim   deadline:<br>\n   March 3, 2025</p>";
        assert_eq!(html_to_text(html), "Claim deadline:\nMarch 3, 2025");
    }

    #[test]
    fn test_table_cells_are_separate_lines() {
        let html = "<table><tr><td>Tier 1</td><td>$25</td></tr></table>";
        assert_eq!(html_to_text(html), "Tier 1\n$25");
    }

    #[test]
    fn test_deeply_nested_text_is_kept() {
        let depth = 300;
        let html = format!(
            "<body>{}Settlement Fund: $1,000,000{}</body>",
            "<div>".repeat(depth),
            "</div>".repeat(depth)
        );
        assert_eq!(html_to_text(&html), "Settlement Fund: $1,000,000");
    }

    #[test]
    fn test_preformatted_newlines_are_kept() {
        let html = "<body><pre>Tier 1: $5\nTier 2:   $10\n\n</pre><p>After</p></body>";
        assert_eq!(html_to_text(html), "Tier 1: $5\nTier 2: $10\nAfter");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("<html><body>   </body></html>"), "");
    }
}
