// src/export/paginator.rs
// Greedy single-pass page layout for the exported document

/// A4 portrait layout in millimetres, matching the exported PDF geometry.
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_TOP_MM: f64 = 20.0;
pub const MARGIN_BOTTOM_MM: f64 = 20.0;
pub const LINE_HEIGHT_MM: f64 = 5.0;

/// Page 1 reserves room for the title, source line, date line and
/// separator rule; body text starts below them.
pub const HEADER_HEIGHT_MM: f64 = 30.0;

/// Character budget for the 170 mm text block at body size.
pub const MAX_LINE_CHARS: usize = 90;

#[derive(Debug, Clone)]
pub struct Page {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PaginatedDocument {
    pub pages: Vec<Page>,
}

impl PaginatedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|page| page.lines.len()).sum()
    }
}

/// Usable line slots on a page; the first page loses the header block.
pub fn lines_per_page(first_page: bool) -> usize {
    let header = if first_page { HEADER_HEIGHT_MM } else { 0.0 };
    let usable = PAGE_HEIGHT_MM - MARGIN_TOP_MM - MARGIN_BOTTOM_MM - header;
    (usable / LINE_HEIGHT_MM).floor() as usize
}

/// Wrap text into lines of at most `width` characters. Paragraph breaks
/// (newlines) survive as line boundaries; words longer than a line are
/// hard-broken.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        wrap_paragraph(paragraph, width, &mut lines);
    }
    // A trailing blank from an empty input should not produce a page.
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

fn wrap_paragraph(paragraph: &str, width: usize, out: &mut Vec<String>) {
    let mut line = String::new();
    let mut line_chars = 0usize;

    for word in paragraph.split_whitespace() {
        let mut word = word;

        // Hard-break words that cannot fit on any line.
        while word.chars().count() > width {
            if line_chars > 0 {
                out.push(std::mem::take(&mut line));
                line_chars = 0;
            }
            let split_at = word
                .char_indices()
                .nth(width)
                .map(|(idx, _)| idx)
                .unwrap_or(word.len());
            out.push(word[..split_at].to_string());
            word = &word[split_at..];
        }

        let word_chars = word.chars().count();
        if line_chars == 0 {
            line.push_str(word);
            line_chars = word_chars;
        } else if line_chars + 1 + word_chars <= width {
            line.push(' ');
            line.push_str(word);
            line_chars += 1 + word_chars;
        } else {
            out.push(std::mem::take(&mut line));
            line.push_str(word);
            line_chars = word_chars;
        }
    }

    if line_chars > 0 {
        out.push(line);
    }
}

/// Lay wrapped lines onto pages greedily: when a line would exceed the
/// page's capacity, a new page starts before placing it. Single pass, no
/// backtracking.
pub fn paginate(text: &str) -> PaginatedDocument {
    paginate_lines(wrap_text(text, MAX_LINE_CHARS))
}

pub fn paginate_lines(lines: Vec<String>) -> PaginatedDocument {
    let mut pages = Vec::new();
    let mut current = Page { lines: Vec::new() };
    let mut capacity = lines_per_page(true);

    for line in lines {
        if current.lines.len() >= capacity {
            pages.push(std::mem::replace(&mut current, Page { lines: Vec::new() }));
            capacity = lines_per_page(false);
        }
        current.lines.push(line);
    }

    if !current.lines.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    PaginatedDocument { pages }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let text = "le rapport trimestriel couvre les résultats de chaque équipe régionale ainsi que les prévisions";
        for line in wrap_text(text, 30) {
            assert!(line.chars().count() <= 30, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn test_wrap_hard_breaks_long_words() {
        let lines = wrap_text("anticonstitutionnellement", 10);
        assert_eq!(lines, vec!["anticonsti", "tutionnell", "ement"]);
    }

    #[test]
    fn test_round_trip_no_loss_or_duplication() {
        let text = "un deux trois quatre cinq six sept huit neuf dix onze douze treize quatorze quinze";
        let wrapped = wrap_text(text, 20);
        let document = paginate_lines(wrapped.clone());

        let mut flattened = Vec::new();
        for page in &document.pages {
            flattened.extend(page.lines.iter().cloned());
        }
        assert_eq!(flattened, wrapped);
        assert_eq!(flattened.join(" "), text);
    }

    #[test]
    fn test_no_page_exceeds_capacity() {
        let line = "x".repeat(MAX_LINE_CHARS);
        let lines: Vec<String> = std::iter::repeat(line).take(500).collect();
        let document = paginate_lines(lines);

        assert!(document.pages[0].lines.len() <= lines_per_page(true));
        for page in &document.pages[1..] {
            assert!(page.lines.len() <= lines_per_page(false));
        }
        assert_eq!(document.line_count(), 500);
    }

    #[test]
    fn test_exact_capacity_is_one_page() {
        let capacity = lines_per_page(true);
        let lines: Vec<String> = (0..capacity).map(|i| format!("ligne {}", i)).collect();
        assert_eq!(paginate_lines(lines).page_count(), 1);
    }

    #[test]
    fn test_one_line_over_capacity_starts_page_two() {
        let capacity = lines_per_page(true);
        let lines: Vec<String> = (0..capacity + 1).map(|i| format!("ligne {}", i)).collect();
        let document = paginate_lines(lines);

        assert_eq!(document.page_count(), 2);
        assert_eq!(document.pages[0].lines.len(), capacity);
        assert_eq!(document.pages[1].lines, vec![format!("ligne {}", capacity)]);
    }

    #[test]
    fn test_first_page_holds_fewer_lines() {
        assert!(lines_per_page(true) < lines_per_page(false));
        assert_eq!(lines_per_page(true), 45);
        assert_eq!(lines_per_page(false), 51);
    }
}
