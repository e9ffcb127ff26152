//! `.xlsx` previews via `calamine`, gated behind the `xlsx` feature.
//!
//! Each preview covers at most [`MAX_SHEETS`] sheets and, per sheet, the
//! top-left [`PREVIEW_ROWS`] x [`PREVIEW_COLS`] window. Every window line has
//! exactly [`PREVIEW_COLS`] cells; empty or absent cells render as `null`.
//! Rows below the window are never parsed.

use std::path::Path;

/// Maximum number of sheets previewed per workbook.
pub const MAX_SHEETS: usize = 3;
/// Rows in each sheet's preview window.
pub const PREVIEW_ROWS: u32 = 15;
/// Columns in each sheet's preview window.
pub const PREVIEW_COLS: u32 = 10;

/// Handle proving spreadsheet support is compiled in.
#[derive(Debug, Clone, Copy)]
pub struct SpreadsheetReader {
    _private: (),
}

impl SpreadsheetReader {
    /// `Some` when the `xlsx` feature is enabled.
    pub fn detect() -> Option<Self> {
        cfg!(feature = "xlsx").then_some(Self { _private: () })
    }

    /// Bounded preview of a workbook. Never fails.
    pub fn preview(&self, path: &Path) -> String {
        imp::preview(path)
    }
}

#[cfg(feature = "xlsx")]
mod imp {
    use std::io::{Read, Seek};
    use std::path::Path;

    use calamine::{Data, Reader, Xlsx, XlsxError, open_workbook};
    use serde_json::Value;
    use tracing::{debug, warn};

    use super::{MAX_SHEETS, PREVIEW_COLS, PREVIEW_ROWS};

    pub(super) fn preview(path: &Path) -> String {
        let mut workbook: Xlsx<_> = match open_workbook(path) {
            Ok(wb) => wb,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "workbook unreadable");
                return crate::unreadable(path, &e);
            }
        };

        let names: Vec<String> = workbook.sheet_names().into_iter().take(MAX_SHEETS).collect();
        if names.is_empty() {
            return "(Workbook contains no sheets)".to_string();
        }

        let mut parts = Vec::with_capacity(names.len() * 2);
        for name in names {
            parts.push(format!("Sheet: {name}"));
            match window(&mut workbook, &name) {
                Ok(grid) => {
                    debug!(sheet = %name, "previewing sheet");
                    parts.push(format!(
                        "Top-left preview ({PREVIEW_ROWS}x{PREVIEW_COLS}):\n{}",
                        render_grid(&grid)
                    ));
                }
                Err(e) => {
                    warn!(sheet = %name, error = %e, "sheet unreadable");
                    parts.push(format!("(Could not read sheet: {e})"));
                }
            }
        }

        parts.join("\n")
    }

    /// Stream cells in sheet order and stop at the first row past the window,
    /// so the rest of the sheet is never parsed. Positions are absolute: the
    /// window starts at A1 even when the used range does not.
    fn window<RS: Read + Seek>(
        workbook: &mut Xlsx<RS>,
        sheet: &str,
    ) -> Result<Vec<Vec<Value>>, XlsxError> {
        let mut grid = vec![vec![Value::Null; PREVIEW_COLS as usize]; PREVIEW_ROWS as usize];
        let mut cells = workbook.worksheet_cells_reader(sheet)?;
        while let Some(cell) = cells.next_cell()? {
            let (row, col) = cell.get_position();
            if row >= PREVIEW_ROWS {
                break;
            }
            if col < PREVIEW_COLS {
                grid[row as usize][col as usize] = cell_value(&Data::from(cell.get_value().clone()));
            }
        }
        Ok(grid)
    }

    fn render_grid(grid: &[Vec<Value>]) -> String {
        grid.iter()
            .map(|row| serde_json::to_string(row).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn cell_value(cell: &Data) -> Value {
        match cell {
            Data::Empty => Value::Null,
            Data::String(s) => Value::String(s.clone()),
            Data::Bool(b) => Value::Bool(*b),
            Data::Int(i) => Value::from(*i),
            Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Value::from(*f as i64),
            Data::Float(f) => serde_json::Number::from_f64(*f)
                .map_or_else(|| Value::String(f.to_string()), Value::Number),
            other => Value::String(other.to_string()),
        }
    }
}

#[cfg(not(feature = "xlsx"))]
mod imp {
    use std::path::Path;

    pub(super) fn preview(_path: &Path) -> String {
        crate::SPREADSHEET_UNAVAILABLE.to_string()
    }
}

#[cfg(all(test, feature = "xlsx"))]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::test_support::temp_dir;

    /// Column letters for 0-based index (A..Z, AA..).
    fn col_name(mut col: u32) -> String {
        let mut name = String::new();
        loop {
            name.insert(0, (b'A' + (col % 26) as u8) as char);
            if col < 26 {
                break;
            }
            col = col / 26 - 1;
        }
        name
    }

    /// Sheet XML whose cell at (r, c) holds the number `r * 1000 + c`.
    fn sheet_xml(rows: u32, cols: u32) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
        );
        for r in 0..rows {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for c in 0..cols {
                xml.push_str(&format!(
                    r#"<c r="{}{}"><v>{}</v></c>"#,
                    col_name(c),
                    r + 1,
                    r * 1000 + c
                ));
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }

    /// Minimal workbook with one sheet per `(name, rows, cols)` entry.
    fn write_workbook(path: &Path, sheets: &[(&str, u32, u32)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts = SimpleFileOptions::default();

        let mut overrides = String::new();
        let mut sheet_entries = String::new();
        let mut rels = String::new();
        for (i, (name, _, _)) in sheets.iter().enumerate() {
            let n = i + 1;
            overrides.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
            sheet_entries.push_str(&format!(
                r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
        }

        zip.start_file("[Content_Types].xml", opts).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
        )
        .unwrap();

        zip.start_file("_rels/.rels", opts).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
        )
        .unwrap();

        zip.start_file("xl/workbook.xml", opts).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
        )
        .unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", opts).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
        )
        .unwrap();

        for (i, (_, rows, cols)) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), opts)
                .unwrap();
            zip.write_all(sheet_xml(*rows, *cols).as_bytes()).unwrap();
        }

        zip.finish().unwrap();
    }

    fn reader() -> SpreadsheetReader {
        SpreadsheetReader::detect().expect("xlsx feature enabled")
    }

    fn grid_lines(preview: &str) -> Vec<&str> {
        preview.lines().filter(|l| l.starts_with('[')).collect()
    }

    #[test]
    fn large_workbook_is_bounded_to_three_sheets_of_fifteen_by_ten() {
        let tmp = temp_dir("boardroom-xlsx");
        let path = tmp.join("model.xlsx");
        write_workbook(
            &path,
            &[
                ("Revenue", 40, 26),
                ("Costs", 20, 12),
                ("Headcount", 16, 11),
                ("Scenarios", 5, 5),
            ],
        );

        let preview = reader().preview(&path);

        assert_eq!(preview.matches("Sheet: ").count(), 3);
        assert!(preview.contains("Sheet: Revenue"));
        assert!(preview.contains("Sheet: Headcount"));
        assert!(!preview.contains("Scenarios"));

        let lines = grid_lines(&preview);
        assert_eq!(lines.len(), 3 * 15);
        for line in &lines {
            let cells: Vec<serde_json::Value> = serde_json::from_str(line).unwrap();
            assert_eq!(cells.len(), 10);
        }
        // Row 15 / column 10 of the first sheet is the last cell inside the window.
        assert_eq!(lines[0], "[0,1,2,3,4,5,6,7,8,9]");
        assert!(lines[14].ends_with("14009]"));
        assert!(!preview.contains("15000"));
        assert!(!preview.contains("10,"), "column 11 must stay outside the window");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn small_sheet_is_padded_with_nulls() {
        let tmp = temp_dir("boardroom-xlsx");
        let path = tmp.join("tiny.xlsx");
        write_workbook(&path, &[("Only", 2, 2)]);

        let preview = reader().preview(&path);
        let lines = grid_lines(&preview);

        assert!(preview.starts_with("Sheet: Only\nTop-left preview (15x10):\n"));
        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], "[0,1,null,null,null,null,null,null,null,null]");
        assert_eq!(lines[1], "[1000,1001,null,null,null,null,null,null,null,null]");
        assert_eq!(lines[2], "[null,null,null,null,null,null,null,null,null,null]");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn corrupt_workbook_degrades_to_placeholder() {
        let tmp = temp_dir("boardroom-xlsx");
        let path = tmp.join("broken.xlsx");
        std::fs::write(&path, b"PK\x03\x04 definitely not a workbook").unwrap();

        let preview = reader().preview(&path);
        assert!(preview.starts_with("(Could not read broken.xlsx:"));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
