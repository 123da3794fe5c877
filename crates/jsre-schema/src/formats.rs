//! Custom string formats registered with the validator.

use chrono::NaiveDate;
use uuid::Uuid;

/// Hyphenated 8-4-4-4-12 hex UUID, any case.
pub fn is_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::parse_str(value).is_ok()
}

/// `YYYY-MM-DD` naming a real calendar day.
pub fn is_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    shaped && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_format() {
        assert!(is_uuid("4342336d-ded2-4e20-ace8-3d63276be455"));
        assert!(is_uuid("4342336D-DED2-4E20-ACE8-3D63276BE455"));
        assert!(!is_uuid("4342336dded24e20ace83d63276be455"));
        assert!(!is_uuid("{4342336d-ded2-4e20-ace8-3d63276be455}"));
        assert!(!is_uuid("not-a-uuid"));
    }

    #[test]
    fn date_format() {
        assert!(is_date("2024-01-22"));
        assert!(is_date("2024-02-29"));
        assert!(!is_date("2023-02-29"));
        assert!(!is_date("2024-1-22"));
        assert!(!is_date("2024-13-01"));
        assert!(!is_date("Jan 2024"));
    }
}
