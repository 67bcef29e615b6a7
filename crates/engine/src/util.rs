//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use chrono::{DateTime, Utc};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Collapse inner whitespace and trim. Returns `None` for blank input.
pub(crate) fn normalize_display_name(input: &str) -> Option<String> {
    let mut out = String::new();
    for token in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Comparison key for user-facing names: NFKD-folded, accents stripped,
/// lowercase, punctuation collapsed to single spaces.
pub(crate) fn normalize_name_key(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::new();
    let mut prev_space = false;
    for ch in trimmed.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Both the display name and its comparison key, or `InvalidName`.
pub(crate) fn name_with_key(input: &str, label: &str) -> ResultEngine<(String, String)> {
    let invalid = || EngineError::InvalidName(format!("{label} name must not be empty"));
    let display = normalize_display_name(input).ok_or_else(invalid)?;
    let key = normalize_name_key(&display).ok_or_else(invalid)?;
    Ok((display, key))
}

/// Plan windows are half-open, so `start < end` is required.
pub(crate) fn validate_date_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ResultEngine<()> {
    if end <= start {
        return Err(EngineError::InvalidDate(
            "end date must be greater than start date".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_positive(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}

fn amount_overflow(label: &str) -> EngineError {
    EngineError::InvalidAmount(format!("{label} is out of range"))
}

/// `lhs + rhs`, or `InvalidAmount` when the result does not fit an `i64`.
pub(crate) fn add_amounts(lhs: i64, rhs: i64, label: &str) -> ResultEngine<i64> {
    lhs.checked_add(rhs).ok_or_else(|| amount_overflow(label))
}

pub(crate) fn sub_amounts(lhs: i64, rhs: i64, label: &str) -> ResultEngine<i64> {
    lhs.checked_sub(rhs).ok_or_else(|| amount_overflow(label))
}

pub(crate) fn sum_amounts<I>(amounts: I, label: &str) -> ResultEngine<i64>
where
    I: IntoIterator<Item = i64>,
{
    amounts
        .into_iter()
        .try_fold(0_i64, |total, amount| add_amounts(total, amount, label))
}

pub(crate) fn ensure_non_negative(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be >= 0")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn name_key_folds_case_accents_and_punctuation() {
        assert_eq!(
            normalize_name_key("  Caffè & Bar ").as_deref(),
            Some("caffe bar")
        );
        assert_eq!(
            normalize_name_key("Rent/Mortgage").as_deref(),
            Some("rent mortgage")
        );
        assert_eq!(normalize_name_key(" !! "), None);
    }

    #[test]
    fn display_name_collapses_whitespace() {
        assert_eq!(
            normalize_display_name("  Dining   out ").as_deref(),
            Some("Dining out")
        );
        assert!(name_with_key("   ", "plan").is_err());
    }

    #[test]
    fn date_window_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(validate_date_window(start, end).is_ok());
        assert_eq!(
            validate_date_window(start, start),
            Err(EngineError::InvalidDate(
                "end date must be greater than start date".to_string()
            ))
        );
        assert!(validate_date_window(end, start).is_err());
    }

    #[test]
    fn amount_arithmetic_is_checked() {
        assert_eq!(add_amounts(2, 3, "balance"), Ok(5));
        assert_eq!(
            add_amounts(i64::MAX, 1, "balance"),
            Err(EngineError::InvalidAmount("balance is out of range".to_string()))
        );
        assert!(sub_amounts(i64::MIN, 1, "balance").is_err());
        assert_eq!(sum_amounts([1, 2, 3], "spent"), Ok(6));
        assert!(sum_amounts([i64::MAX, 1], "spent").is_err());
    }

    #[test]
    fn amount_guards() {
        assert!(ensure_positive(1, "amount").is_ok());
        assert!(ensure_positive(0, "amount").is_err());
        assert!(ensure_non_negative(0, "amount").is_ok());
        assert!(ensure_non_negative(-1, "amount").is_err());
    }
}
