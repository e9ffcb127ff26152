//! `.csv` previews: the first rows only, whatever the file size.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::warn;

/// Maximum number of CSV records included in a preview.
pub const CSV_PREVIEW_ROWS: usize = 30;

pub(crate) fn preview(path: &Path) -> String {
    match File::open(path) {
        Ok(file) => preview_from_reader(file),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "csv file unreadable");
            crate::unreadable(path, &e)
        }
    }
}

/// Render up to [`CSV_PREVIEW_ROWS`] records, one JSON array per line.
///
/// Rows may be ragged and fields need not be valid UTF-8. A blank line is a
/// row with no fields (`[]`) and counts toward the limit. Reading stops at
/// the row limit, so the rest of the input is never consumed.
pub fn preview_from_reader<R: Read>(reader: R) -> String {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Recorded {
            inner: reader,
            seen: Vec::new(),
        });

    let mut out = format!("CSV PREVIEW (first {CSV_PREVIEW_ROWS} rows):");
    let mut record = csv::ByteRecord::new();
    let mut rows = 0;
    let mut consumed = 0;
    let mut after_cr = false;

    while rows < CSV_PREVIEW_ROWS {
        let more = match rdr.read_byte_record(&mut record) {
            Ok(more) => more,
            Err(e) => {
                let row = rows + 1;
                warn!(row, error = %e, "csv parsing stopped early");
                out.push_str(&format!("\n(CSV parsing stopped at row {row}: {e})"));
                break;
            }
        };

        // The parser skips blank lines; recover them from the bytes it consumed.
        let end = usize::try_from(rdr.position().byte()).unwrap_or(usize::MAX);
        let seen = &rdr.get_ref().seen;
        let end = end.min(seen.len());
        let span = &seen[consumed.min(end)..end];
        let blanks = leading_blank_lines(span, after_cr);
        if let Some(&last) = span.last() {
            after_cr = last == b'\r';
        }
        consumed = end;

        for _ in 0..blanks {
            if rows == CSV_PREVIEW_ROWS {
                break;
            }
            out.push_str("\n[]");
            rows += 1;
        }

        if !more {
            break;
        }
        if rows < CSV_PREVIEW_ROWS {
            let fields: Vec<String> = record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect();
            out.push('\n');
            out.push_str(&serde_json::to_string(&fields).unwrap_or_default());
            rows += 1;
        }
    }

    out
}

/// Copies every byte handed to the parser so gaps between records can be inspected.
struct Recorded<R> {
    inner: R,
    seen: Vec<u8>,
}

impl<R: Read> Read for Recorded<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.seen.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

/// Number of blank lines before the first record byte in `span`.
///
/// `after_cr` means the previous read ended on `\r`, so a leading `\n` closes
/// that record rather than a blank line.
fn leading_blank_lines(span: &[u8], after_cr: bool) -> usize {
    let span = span.strip_prefix(b"\xef\xbb\xbf").unwrap_or(span);
    let mut bytes = span
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .peekable();
    if after_cr && bytes.peek() == Some(&&b'\n') {
        bytes.next();
    }

    let mut count = 0;
    while let Some(&b) = bytes.next() {
        if b == b'\r' && bytes.peek() == Some(&&b'\n') {
            bytes.next();
        }
        count += 1;
    }
    count
}
