//! Shape checks run before any storage call.

use chrono::{NaiveDate, NaiveTime};
use validator::ValidateEmail;

use crate::calendar::hhmm;
use crate::{CoreError, CoreResult};

pub const MIN_PHONE_DIGITS: usize = 10;
const NAME_MAX: usize = 30;

/// Customer fields after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
}

impl CustomerDetails {
    pub fn parse(first_name: &str, last_name: &str, phone: &str, email: Option<&str>) -> CoreResult<Self> {
        Ok(Self {
            first_name: validate_name("First name", first_name, 3)?,
            last_name: validate_name("Last name", last_name, 1)?,
            phone: validate_phone(phone)?,
            email: validate_email(email)?,
        })
    }
}

/// Fails with the `required` message if any field is absent or blank.
pub fn require_fields(fields: &[Option<&str>], required: &str) -> CoreResult<()> {
    if fields.iter().any(|f| f.map_or(true, |v| v.trim().is_empty())) {
        return Err(CoreError::ValidationError(required.to_string()));
    }
    Ok(())
}

/// At least ten digits, digits only.
pub fn validate_phone(phone: &str) -> CoreResult<String> {
    let phone = phone.trim();
    if phone.len() < MIN_PHONE_DIGITS || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::ValidationError(format!(
            "Phone must be at least {} digits.",
            MIN_PHONE_DIGITS
        )));
    }
    Ok(phone.to_string())
}

fn validate_name(label: &str, value: &str, min: usize) -> CoreResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len < min {
        let unit = if min == 1 { "character" } else { "characters" };
        return Err(CoreError::ValidationError(format!(
            "{} must be at least {} {}.",
            label, min, unit
        )));
    }
    if len > NAME_MAX {
        return Err(CoreError::ValidationError(format!(
            "{} cannot exceed {} characters.",
            label, NAME_MAX
        )));
    }
    Ok(value.to_string())
}

/// Blank is treated as "not provided".
pub fn validate_email(email: Option<&str>) -> CoreResult<Option<String>> {
    match email.map(str::trim) {
        None | Some("") => Ok(None),
        Some(email) if email.validate_email() => Ok(Some(email.to_string())),
        Some(_) => Err(CoreError::ValidationError("Provide a valid email".to_string())),
    }
}

/// Exactly `YYYY-MM-DD`; chrono's `%Y` alone also takes signed and
/// five-digit years.
pub fn parse_date(value: &str) -> CoreResult<NaiveDate> {
    let value = value.trim();
    let invalid = || CoreError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD.", value));
    let shape_ok = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

/// Zero-padded `HH:mm`. The fixed width keeps string and time ordering equal.
pub fn parse_slot_time(value: &str) -> CoreResult<NaiveTime> {
    let value = value.trim();
    let invalid = || CoreError::ValidationError(format!("Invalid time '{}', expected HH:mm.", value));
    if value.len() != 5 || value.as_bytes()[2] != b':' {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(value, hhmm::FORMAT).map_err(|_| invalid())
}

pub fn validate_window(start: NaiveTime, end: NaiveTime) -> CoreResult<()> {
    if start >= end {
        return Err(CoreError::ValidationError("startTime must be before endTime.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_digit_count() {
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("123456789").is_err());
        assert_eq!(validate_phone("1234567890").unwrap(), "1234567890");
        assert!(validate_phone("123456789012").is_ok());
        assert!(validate_phone("12345-67890").is_err());
        assert!(validate_phone("+1234567890").is_err());
    }

    #[test]
    fn test_customer_names() {
        assert!(CustomerDetails::parse("Al", "Smith", "1234567890", None).is_err());
        assert!(CustomerDetails::parse("Alice", "", "1234567890", None).is_err());
        assert!(CustomerDetails::parse("Alice", "  ", "1234567890", None).is_err());
        assert!(CustomerDetails::parse(&"x".repeat(31), "S", "1234567890", None).is_err());

        let c = CustomerDetails::parse(" Alice ", "S", "1234567890", Some("")).unwrap();
        assert_eq!(c.first_name, "Alice");
        assert_eq!(c.email, None);
    }

    #[test]
    fn test_email() {
        assert_eq!(validate_email(None).unwrap(), None);
        assert_eq!(
            validate_email(Some("guest@example.com")).unwrap(),
            Some("guest@example.com".to_string())
        );
        assert!(validate_email(Some("not-an-email")).is_err());
    }

    #[test]
    fn test_required_fields() {
        assert!(require_fields(&[Some("A1"), Some("x")], "required").is_ok());
        let err = require_fields(&[Some("A1"), None], "seatId and phone are required").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: seatId and phone are required");
        assert!(require_fields(&[Some(" ")], "required").is_err());
    }

    #[test]
    fn test_slot_time_format() {
        assert_eq!(parse_slot_time("09:00").unwrap(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(parse_slot_time("14:30").unwrap(), NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert!(parse_slot_time("9:00").is_err());
        assert!(parse_slot_time("25:00").is_err());
        assert!(parse_slot_time("0900").is_err());
    }

    #[test]
    fn test_window_order() {
        let t = |s| parse_slot_time(s).unwrap();
        assert!(validate_window(t("10:00"), t("11:00")).is_ok());
        assert!(validate_window(t("11:00"), t("11:00")).is_err());
        assert!(validate_window(t("12:00"), t("11:00")).is_err());
    }

    #[test]
    fn test_date_format() {
        assert!(parse_date("2024-06-03").is_ok());
        assert!(parse_date("03/06/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("+262142-12-31").is_err());
        assert!(parse_date("-0001-01-01").is_err());
        assert!(parse_date("12024-01-01").is_err());
        assert!(parse_date("2024-6-3").is_err());
    }
}
