//! Report filename policy

use std::path::{Component, Path};

use chrono::NaiveDateTime;

use crate::error::{Result, ValidationError};

/// Timestamp format used in generated names
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Resolve the file name for a generated report.
///
/// Without a usable name, `report_<YYYYMMDD_HHMMSS>.<extension>` is used.
/// Generated names only have second resolution: two reports generated in the
/// same second without a name get the same file name.
/// A supplied name keeps its extension when it already ends with
/// `.<extension>` (case-insensitive); otherwise the extension is appended.
/// A supplied name must be a single path component so the report stays
/// inside the output directory.
pub fn report_filename(
    file_name: Option<&str>,
    extension: &str,
    now: NaiveDateTime,
) -> Result<String> {
    match file_name {
        Some(name) if !name.trim().is_empty() => {
            check_plain_name(name)?;
            let suffix = format!(".{}", extension.to_ascii_lowercase());
            if name.to_lowercase().ends_with(&suffix) {
                Ok(name.to_string())
            } else {
                Ok(format!("{}.{}", name, extension))
            }
        }
        _ => Ok(format!("report_{}.{}", now.format(TIMESTAMP_FORMAT), extension)),
    }
}

fn check_plain_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(ValidationError::InvalidParameter {
            name: "file_name".to_string(),
            message: format!("'{}' must be a plain file name without directories", name),
        }
        .into()),
    }
}

/// Whether `name` has the `report_<YYYYMMDD_HHMMSS>.<extension>` shape
#[cfg(test)]
pub(crate) fn is_generated_name(name: &str, extension: &str) -> bool {
    let Some(stem) = name
        .strip_prefix("report_")
        .and_then(|rest| rest.strip_suffix(&format!(".{}", extension)))
    else {
        return false;
    };

    let bytes = stem.as_bytes();
    bytes.len() == 15
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 => *b == b'_',
            _ => b.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::error::WeatherMcpError;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 28)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn name(file_name: Option<&str>, extension: &str) -> String {
        report_filename(file_name, extension, at(9, 0, 0)).unwrap()
    }

    #[test]
    fn test_appends_missing_extension() {
        assert_eq!(name(Some("foo"), "pdf"), "foo.pdf");
        assert_eq!(name(Some("foo.txt"), "md"), "foo.txt.md");
    }

    #[test]
    fn test_keeps_existing_extension() {
        assert_eq!(name(Some("foo.pdf"), "pdf"), "foo.pdf");
        assert_eq!(name(Some("FOO.PDF"), "pdf"), "FOO.PDF");
        assert_eq!(name(Some("a.Docx"), "docx"), "a.Docx");
    }

    #[test]
    fn test_generates_timestamped_name() {
        let generated = report_filename(None, "pdf", at(14, 5, 9)).unwrap();
        assert_eq!(generated, "report_20251028_140509.pdf");
        assert!(is_generated_name(&generated, "pdf"));

        let blank = report_filename(Some("   "), "png", at(14, 5, 9)).unwrap();
        assert_eq!(blank, "report_20251028_140509.png");
    }

    #[test]
    fn test_same_second_collides() {
        assert_eq!(
            report_filename(None, "md", at(8, 30, 1)).unwrap(),
            report_filename(Some(""), "md", at(8, 30, 1)).unwrap()
        );
    }

    #[test]
    fn test_rejects_names_with_directories() {
        for bad in ["../x", "/tmp/x", "a/b", "..", ".", "dir/", "..\\x"] {
            let err = report_filename(Some(bad), "md", at(9, 0, 0)).unwrap_err();
            assert!(
                matches!(
                    err,
                    WeatherMcpError::Validation(ValidationError::InvalidParameter { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_is_generated_name() {
        assert!(is_generated_name("report_20250101_000000.md", "md"));
        assert!(!is_generated_name("report_2025010_000000.md", "md"));
        assert!(!is_generated_name("report_20250101-000000.md", "md"));
        assert!(!is_generated_name("report_20250101_000000.pdf", "md"));
        assert!(!is_generated_name("foo.md", "md"));
    }
}
