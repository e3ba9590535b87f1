//! PDF text and table extraction.
//!
//! Text is pulled per page and concatenated in page order; tables recovered
//! from each page are serialized as tab-separated rows inside a
//! `<table>…</table>` wrapper and appended after all of the page text. The
//! combined string becomes the document body used for retrieval.

use thiserror::Error;

/// Extraction never panics; a failing file returns an error and the
/// ingestion pipeline skips it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF parse failed: {0}")]
    Pdf(String),
}

/// Rows of cells recovered from a page's text layout.
type Table = Vec<Vec<String>>;

pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let mut out = String::new();
    for page in &pages {
        out.push_str(page);
    }
    for page in &pages {
        for table in detect_tables(page) {
            out.push('\n');
            out.push_str(&format_table(&table));
        }
    }
    Ok(out)
}

/// Heuristic table recovery from extracted page text.
///
/// Cell geometry is not available from the text extractor, so columns are
/// inferred from the layout: a line splitting into two or more cells on tabs
/// or runs of two-plus spaces is a candidate row, and two or more
/// consecutive candidate rows form a table. Ruled tables whose cells arrive
/// without such gaps are not recovered.
fn detect_tables(page: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Table = Vec::new();

    for line in page.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            current.push(cells);
        } else if !current.is_empty() {
            if current.len() >= 2 {
                tables.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        tables.push(current);
    }
    tables
}

fn split_cells(line: &str) -> Vec<String> {
    line.replace('\t', "  ")
        .split("  ")
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn format_table(table: &Table) -> String {
    let rows: Vec<String> = table.iter().map(|row| row.join("\t")).collect();
    format!("<table>\n{}\n</table>", rows.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn split_cells_on_tabs_and_space_runs() {
        assert_eq!(split_cells("a\tb"), vec!["a", "b"]);
        assert_eq!(split_cells("plan    price   copay"), vec!["plan", "price", "copay"]);
        assert_eq!(split_cells("one cell only"), vec!["one cell only"]);
        assert!(split_cells("").is_empty());
    }

    #[test]
    fn detect_tables_groups_consecutive_rows() {
        let page = "Intro paragraph.\nplan\tpremium\nStandard\t100\nPlus\t250\nClosing note.";
        let tables = detect_tables(page);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 3);
        assert_eq!(tables[0][1], vec!["Standard", "100"]);
    }

    #[test]
    fn single_aligned_line_is_not_a_table() {
        let page = "heading\nleft    right\nprose continues here";
        assert!(detect_tables(page).is_empty());
    }

    #[test]
    fn format_table_uses_table_wrapper() {
        let table = vec![
            vec!["plan".to_string(), "premium".to_string()],
            vec!["Standard".to_string(), "100".to_string()],
        ];
        assert_eq!(
            format_table(&table),
            "<table>\nplan\tpremium\nStandard\t100\n</table>"
        );
    }
}
