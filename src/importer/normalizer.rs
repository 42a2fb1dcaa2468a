// ==========================================
// mHealth Barangay San Cristobal - Field Normalizers
// ==========================================
// Pure functions shared by every import profile. Canonical forms:
// - dates: ISO (YYYY-MM-DD) in storage, DD/MM/YYYY for display
// - phone numbers: +<country code><subscriber digits>
// - gender: single letter M / F
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Days between the spreadsheet serial epoch (1899-12-30) and the Unix
/// epoch (1970-01-01).
const SERIAL_EPOCH_OFFSET_DAYS: f64 = 25_569.0;

// ==========================================
// Dates
// ==========================================

/// Parse a date cell in any of the forms the dashboard has historically
/// accepted. Tried in order:
/// 1. ISO `YYYY-MM-DD`
/// 2. `DD/MM/YYYY` (day first; this is the display form)
/// 3. spreadsheet serial number
/// 4. a handful of looser fallbacks
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%d/%m/%Y") {
        return Some(date);
    }

    if let Ok(serial) = value.parse::<f64>() {
        if serial > 0.0 {
            let secs = ((serial - SERIAL_EPOCH_OFFSET_DAYS) * 86_400.0) as i64;
            return DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive());
        }
    }

    for format in ["%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    None
}

/// Storage form: ISO `YYYY-MM-DD`.
pub fn to_storage_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Display form: `DD/MM/YYYY`.
pub fn to_display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

// ==========================================
// Phone numbers
// ==========================================

/// Canonicalize a phone cell: strip everything but digits, then prefix
/// the country code. A leading local trunk `0` is replaced by the
/// country code, so `0917...` and `63917...` spellings of one
/// subscriber share a single canonical form; without that fold the two
/// spellings would never match each other on re-import. Already
/// canonical input passes through unchanged, so the function is
/// idempotent.
pub fn normalize_phone(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return String::new();
    }
    if digits.starts_with(country_code) {
        format!("+{}", digits)
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("+{}{}", country_code, rest)
    } else {
        format!("+{}{}", country_code, digits)
    }
}

/// Strict-mode check: a canonical mobile number is the country code
/// plus exactly ten subscriber digits.
pub fn is_valid_mobile(canonical: &str, country_code: &str) -> bool {
    canonical
        .strip_prefix('+')
        .and_then(|s| s.strip_prefix(country_code))
        .map(|rest| rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

// ==========================================
// Gender
// ==========================================

/// Map the common spellings to the single-letter form; anything else
/// passes through trimmed (lenient mode keeps historical data intact).
pub fn normalize_gender(raw: &str) -> String {
    let value = raw.trim();
    match value.to_lowercase().as_str() {
        "m" | "male" => "M".to_string(),
        "f" | "female" => "F".to_string(),
        _ => value.to_string(),
    }
}

/// Whether a normalized gender value is one of the recognized forms.
pub fn is_recognized_gender(normalized: &str) -> bool {
    matches!(normalized, "" | "M" | "F")
}

// ==========================================
// Timestamps
// ==========================================

/// Parse a creation-timestamp cell. Accepts RFC 3339, the plain
/// `YYYY-MM-DD HH:MM:SS` form, the `MM:SS.f` fragment some spreadsheet
/// exports leave behind (anchored to today's date), spreadsheet serial
/// numbers, and bare dates (taken as midnight UTC).
pub fn normalize_timestamp(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Some(ts) = parse_clock_fragment(value, now) {
        return Some(ts);
    }

    if let Ok(serial) = value.parse::<f64>() {
        if serial > 0.0 {
            let secs = ((serial - SERIAL_EPOCH_OFFSET_DAYS) * 86_400.0) as i64;
            return DateTime::from_timestamp(secs, 0);
        }
    }

    normalize_date(value)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// `MM:SS.f` with two-digit components; the date and hour come from
/// `now` truncated to midnight.
fn parse_clock_fragment(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let (clock, frac) = value.split_once('.')?;
    let (minutes, seconds) = clock.split_once(':')?;
    if minutes.len() != 2 || seconds.len() != 2 {
        return None;
    }
    if frac.is_empty() || frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    let time = NaiveTime::from_hms_opt(0, minutes, seconds)?;
    Some(Utc.from_utc_datetime(&now.date_naive().and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_date_iso_passthrough() {
        assert_eq!(
            normalize_date("1990-05-15"),
            NaiveDate::from_ymd_opt(1990, 5, 15)
        );
    }

    #[test]
    fn test_normalize_date_day_first() {
        assert_eq!(
            normalize_date("15/05/1990"),
            NaiveDate::from_ymd_opt(1990, 5, 15)
        );
        // Day first wins for ambiguous values.
        assert_eq!(
            normalize_date("03/04/1990"),
            NaiveDate::from_ymd_opt(1990, 4, 3)
        );
    }

    #[test]
    fn test_normalize_date_serial_number() {
        // Serial 25569 is the Unix epoch itself.
        assert_eq!(
            normalize_date("25569"),
            NaiveDate::from_ymd_opt(1970, 1, 1)
        );
        // 2023-05-15 as exported by common spreadsheet tools.
        assert_eq!(
            normalize_date("45061"),
            NaiveDate::from_ymd_opt(2023, 5, 15)
        );
    }

    #[test]
    fn test_normalize_date_fallbacks_and_garbage() {
        assert_eq!(
            normalize_date("1990/05/15"),
            NaiveDate::from_ymd_opt(1990, 5, 15)
        );
        assert_eq!(
            normalize_date("May 15, 1990"),
            NaiveDate::from_ymd_opt(1990, 5, 15)
        );
        assert_eq!(normalize_date("not a date"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn test_date_round_trip() {
        let date = normalize_date("15/05/1990").unwrap();
        assert_eq!(to_display_date(date), "15/05/1990");
        assert_eq!(to_storage_date(date), "1990-05-15");
        // Storage form re-normalizes to the same date.
        assert_eq!(normalize_date(&to_storage_date(date)), Some(date));
    }

    #[test]
    fn test_normalize_phone_variants() {
        assert_eq!(normalize_phone("09171234567", "63"), "+639171234567");
        assert_eq!(normalize_phone("639171234567", "63"), "+639171234567");
        assert_eq!(normalize_phone("0917-123-4567", "63"), "+639171234567");
        assert_eq!(normalize_phone("9171234567", "63"), "+639171234567");
        assert_eq!(normalize_phone("", "63"), "");
    }

    #[test]
    fn test_trunk_zero_folds_into_country_code() {
        // Both spellings of the same subscriber land on one canonical
        // form; the naive double-prefix form is never produced.
        assert_eq!(
            normalize_phone("09171234567", "63"),
            normalize_phone("639171234567", "63")
        );
        assert_eq!(normalize_phone("09171234567", "63"), "+639171234567");
        assert_ne!(normalize_phone("09171234567", "63"), "+6309171234567");
    }

    #[test]
    fn test_normalize_phone_idempotent() {
        let once = normalize_phone("0917 123 4567", "63");
        assert_eq!(normalize_phone(&once, "63"), once);
    }

    #[test]
    fn test_is_valid_mobile() {
        assert!(is_valid_mobile("+639171234567", "63"));
        assert!(!is_valid_mobile("+63917123456", "63")); // nine digits
        assert!(!is_valid_mobile("639171234567", "63")); // missing plus
        assert!(!is_valid_mobile("", "63"));
    }

    #[test]
    fn test_normalize_gender() {
        assert_eq!(normalize_gender("male"), "M");
        assert_eq!(normalize_gender("M"), "M");
        assert_eq!(normalize_gender("Female"), "F");
        assert_eq!(normalize_gender(" f "), "F");
        // Lenient passthrough for anything else.
        assert_eq!(normalize_gender("non-binary"), "non-binary");
        assert_eq!(normalize_gender(""), "");
    }

    #[test]
    fn test_normalize_timestamp_full_forms() {
        let now = Utc::now();
        let rfc = normalize_timestamp("2023-05-15T08:30:00+00:00", now).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2023-05-15T08:30:00+00:00");

        let plain = normalize_timestamp("2023-05-15 08:30:00", now).unwrap();
        assert_eq!(plain, rfc);
    }

    #[test]
    fn test_normalize_timestamp_clock_fragment() {
        let now = Utc.with_ymd_and_hms(2023, 5, 15, 14, 0, 0).unwrap();
        let ts = normalize_timestamp("42:07.5", now).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 5, 15, 0, 42, 7).unwrap());
    }

    #[test]
    fn test_normalize_timestamp_bare_date_and_garbage() {
        let now = Utc::now();
        let ts = normalize_timestamp("15/05/2023", now).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 5, 15, 0, 0, 0).unwrap());
        assert_eq!(normalize_timestamp("soon", now), None);
        assert_eq!(normalize_timestamp("", now), None);
    }
}
