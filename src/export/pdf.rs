// src/export/pdf.rs
// Minimal PDF 1.4 emitter for paginated transcripts

use super::paginator::{Page, PaginatedDocument, LINE_HEIGHT_MM, MARGIN_TOP_MM};

const PAGE_WIDTH_PT: f64 = 595.28;
const PAGE_HEIGHT_PT: f64 = 841.89;
const MM_TO_PT: f64 = 72.0 / 25.4;

const MARGIN_LEFT_MM: f64 = 20.0;
const RULE_RIGHT_MM: f64 = 190.0;

const TITLE_FONT_SIZE: f64 = 16.0;
const META_FONT_SIZE: f64 = 10.0;
const BODY_FONT_SIZE: f64 = 11.0;

const TITLE: &str = "Transcription Audio";

fn x_pt(x_mm: f64) -> f64 {
    x_mm * MM_TO_PT
}

// PDF origin is bottom-left; layout y grows downward from the top edge.
fn y_pt(y_mm: f64) -> f64 {
    PAGE_HEIGHT_PT - y_mm * MM_TO_PT
}

/// Render the paginated document as PDF bytes. Object layout: catalog,
/// page tree, two fonts, then one page + one content stream per page.
pub fn render(document: &PaginatedDocument, source_filename: &str, generated_on: &str) -> Vec<u8> {
    let page_count = document.pages.len();
    let mut bodies: Vec<Vec<u8>> = Vec::with_capacity(4 + page_count * 2);

    bodies.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

    let kids = (0..page_count)
        .map(|index| format!("{} 0 R", 5 + 2 * index))
        .collect::<Vec<_>>()
        .join(" ");
    bodies.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count).into_bytes());

    bodies.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );
    bodies.push(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    );

    for (index, page) in document.pages.iter().enumerate() {
        let content = content_stream(page, index == 0, source_filename, generated_on);
        bodies.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH_PT,
                PAGE_HEIGHT_PT,
                6 + 2 * index
            )
            .into_bytes(),
        );

        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"\nendstream");
        bodies.push(stream);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(bodies.len());
    for (index, body) in bodies.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", bodies.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            bodies.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    out
}

fn content_stream(page: &Page, first_page: bool, source: &str, date: &str) -> String {
    let mut ops = String::new();
    let left = x_pt(MARGIN_LEFT_MM);

    if first_page {
        ops.push_str(&format!(
            "BT /F2 {:.0} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            TITLE_FONT_SIZE,
            left,
            y_pt(20.0),
            escape_text(TITLE)
        ));
        ops.push_str(&format!(
            "BT /F1 {:.0} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            META_FONT_SIZE,
            left,
            y_pt(30.0),
            escape_text(&format!("Fichier source: {}", source))
        ));
        ops.push_str(&format!(
            "BT /F1 {:.0} Tf {:.2} {:.2} Td ({}) Tj ET\n",
            META_FONT_SIZE,
            left,
            y_pt(35.0),
            escape_text(&format!("Date: {}", date))
        ));
        ops.push_str(&format!(
            "0.5 w {:.2} {:.2} m {:.2} {:.2} l S\n",
            left,
            y_pt(40.0),
            x_pt(RULE_RIGHT_MM),
            y_pt(40.0)
        ));
    }

    if !page.lines.is_empty() {
        let body_start_mm = if first_page {
            50.0
        } else {
            MARGIN_TOP_MM + LINE_HEIGHT_MM
        };
        ops.push_str(&format!(
            "BT /F1 {:.0} Tf {:.2} TL {:.2} {:.2} Td\n",
            BODY_FONT_SIZE,
            LINE_HEIGHT_MM * MM_TO_PT,
            left,
            y_pt(body_start_mm)
        ));
        for (index, line) in page.lines.iter().enumerate() {
            if index == 0 {
                ops.push_str(&format!("({}) Tj\n", escape_text(line)));
            } else {
                ops.push_str(&format!("T* ({}) Tj\n", escape_text(line)));
            }
        }
        ops.push_str("ET\n");
    }

    ops
}

/// Escape a line for a PDF literal string. WinAnsi overlaps Latin-1 on the
/// accented range, so bytes above 127 go out as octal escapes; anything
/// outside Latin-1 degrades to '?'.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 32 => out.push(' '),
            c if c.is_ascii() => out.push(c),
            c if (c as u32) <= 255 => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::paginator::paginate;

    #[test]
    fn test_structure_markers() {
        let document = paginate("bonjour tout le monde");
        let bytes = render(&document, "reunion.mp3", "01/06/2026");

        assert!(bytes.starts_with(b"%PDF-1.4"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("Transcription Audio"));
        assert!(text.contains("Fichier source: reunion.mp3"));
    }

    #[test]
    fn test_page_objects_match_pagination() {
        let long_text = "mot ".repeat(20_000);
        let document = paginate(&long_text);
        assert!(document.page_count() > 1);

        let bytes = render(&document, "long.mp3", "01/06/2026");
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(&format!("/Count {}", document.page_count())));
        assert_eq!(text.matches("/Type /Page ").count(), document.page_count());
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a(b)c"), "a\\(b\\)c");
        assert_eq!(escape_text("back\\slash"), "back\\\\slash");
        assert_eq!(escape_text("été"), "\\351t\\351");
        assert_eq!(escape_text("日本"), "??");
    }
}
