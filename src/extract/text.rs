use scraper::{ElementRef, Html, Node};

/// Elements removed together with everything inside them
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "iframe", "form", "svg",
    "canvas", "head", "template",
];

/// Elements whose boundaries become line breaks
const BLOCK_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "blockquote",
    "body",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "li",
    "main",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "tr",
    "ul",
];

/// Extracts readable plain text from an HTML document
///
/// Scripts, styles and structural chrome (navigation, headers, footers,
/// sidebars, forms, embedded graphics) are dropped with their contents.
/// Block-level elements and `<br>` become line breaks, entities are decoded,
/// whitespace inside a line is collapsed and runs of blank lines are capped at
/// one. Malformed markup never fails; the worst case is an empty string.
///
/// # Examples
///
/// ```
/// use sumi_harvest::extract::extract_text;
///
/// let html = "<html><body><nav>skip</nav><p>Hello &amp; welcome</p></body></html>";
/// let text = extract_text(html);
/// assert!(text.contains("Hello & welcome"));
/// assert!(!text.contains("skip"));
/// ```
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::with_capacity(html.len() / 2);
    collect_text(document.root_element(), &mut raw);
    tidy_lines(&raw)
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                // Source formatting is not content; structure supplies the breaks
                for c in text.chars() {
                    out.push(if c.is_whitespace() { ' ' } else { c });
                }
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push('\n');
                    continue;
                }

                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let is_block = BLOCK_ELEMENTS.contains(&name);
                if is_block {
                    out.push('\n');
                }
                collect_text(child_element, out);
                if is_block {
                    out.push('\n');
                } else if name == "td" || name == "th" {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Collapses whitespace per line and caps consecutive blank lines at one
fn tidy_lines(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in raw.split('\n') {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            if !previous_blank {
                lines.push(String::new());
            }
            previous_blank = true;
        } else {
            lines.push(collapsed);
            previous_blank = false;
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_removed_and_entities_decoded() {
        let html = "<html><body><nav>skip</nav><p>Hello &amp; welcome</p></body></html>";
        let text = extract_text(html);
        assert!(text.contains("Hello & welcome"));
        assert!(!text.contains("skip"));
    }

    #[test]
    fn test_scripts_styles_and_chrome_removed() {
        let html = r#"<html><head><title>T</title><style>p { color: red }</style></head>
            <body>
              <header>Site header</header>
              <script>var x = 1;</script>
              <main><p>Body copy</p></main>
              <aside>Sidebar</aside>
              <form><input name="q"> Search</form>
              <footer>Copyright</footer>
            </body></html>"#;
        let text = extract_text(html);
        assert_eq!(text, "Body copy");
    }

    #[test]
    fn test_comments_dropped() {
        let text = extract_text("<p>Visible<!-- hidden --> text</p>");
        assert_eq!(text, "Visible text");
    }

    #[test]
    fn test_blocks_become_lines() {
        let text = extract_text("<h1>Title</h1><p>First</p><p>Second<br>line</p>");
        assert_eq!(text, "Title\n\nFirst\n\nSecond\nline");
    }

    #[test]
    fn test_inline_whitespace_collapsed() {
        let text = extract_text("<p>  lots \n\t of   <b>space</b>  </p>");
        assert_eq!(text, "lots of space");
    }

    #[test]
    fn test_blank_lines_capped() {
        let text = extract_text("<div><p>A</p></div><div></div><div><div><p>B</p></div></div>");
        assert_eq!(text, "A\n\nB");
    }

    #[test]
    fn test_numeric_entities() {
        let text = extract_text("<p>&#169; 2024 &#x2014; caf&eacute;</p>");
        assert_eq!(text, "\u{a9} 2024 \u{2014} caf\u{e9}");
    }

    #[test]
    fn test_table_cells_separated() {
        let text = extract_text("<table><tr><td>a</td><td>b</td></tr><tr><th>c</th></tr></table>");
        assert_eq!(text, "a b\n\nc");
    }

    #[test]
    fn test_malformed_markup() {
        let text = extract_text("<p>unclosed <div>nested <span>deep");
        assert!(text.contains("unclosed"));
        assert!(text.contains("nested deep"));
        assert_eq!(extract_text(""), "");
    }
}
