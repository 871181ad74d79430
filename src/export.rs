//! CSV output of a scan report.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::models::ScanReport;

/// Quote a field when it contains a separator, quote or line break
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_record<W: Write>(writer: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line: Vec<Cow<'_, str>> = fields.iter().map(|f| escape_field(f)).collect();
    writeln!(writer, "{}", line.join(","))
}

/// Write the header and every row of `report`
///
/// Rows keep the report order, which is the scanners' path order.
pub fn write_csv<W: Write>(report: &ScanReport, question_count: usize, writer: &mut W) -> Result<()> {
    write_record(writer, &ScanReport::header(question_count))?;
    for row in &report.rows {
        write_record(writer, &row.cells())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the table to a file, replacing it
pub fn save_csv(report: &ScanReport, question_count: usize, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(report, question_count, &mut writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanRow;
    use std::path::PathBuf;

    fn row(path: &str) -> ScanRow {
        ScanRow {
            roll_number: "10X".into(),
            qbno: "*4".into(),
            qpseries: 'A',
            answers: vec!['B', 'X', '*'],
            source_image_path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_write_csv() {
        let report = ScanReport {
            rows: vec![row("scans/001F.jpg"), row("scans/a,b\"F.jpg")],
            ..ScanReport::default()
        };
        let mut out = Vec::new();
        write_csv(&report, 3, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ROLLNO,QBNO,QPSERIES,A1,A2,A3,Front side Image");
        assert_eq!(lines[1], "10X,*4,A,B,X,*,scans/001F.jpg");
        assert_eq!(lines[2], "10X,*4,A,B,X,*,\"scans/a,b\"\"F.jpg\"");
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let mut out = Vec::new();
        write_csv(&ScanReport::default(), 0, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ROLLNO,QBNO,QPSERIES,Front side Image\n");
    }
}
