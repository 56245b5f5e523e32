use std::sync::LazyLock;
use chrono::NaiveDate;
use regex::Regex;
use crate::model::{AppError, ErrorCode};

pub const MAX_SEQUENCE: u32 = 9999;

static DEFECT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DF-(\d{8})-(\d{4})$").expect("defect id pattern is valid")
});

/// `DF-<YYYYMMDD>-<NNNN>` with a real calendar date.
pub fn is_valid_defect_id(id: &str) -> bool {
    DEFECT_ID
        .captures(id)
        .is_some_and(|caps| NaiveDate::parse_from_str(&caps[1], "%Y%m%d").is_ok())
}

pub fn sequence_of(id: &str) -> Option<u32> {
    DEFECT_ID
        .captures(id)
        .and_then(|caps| caps[2].parse().ok())
}

/// Next id after every existing one. The sequence is store-wide, so ids stay
/// unique even when two defects share a creation date.
pub fn next_defect_id<'a, I>(existing: I, date: NaiveDate) -> Result<String, AppError>
where
    I: IntoIterator<Item = &'a str>,
{
    let last = existing.into_iter().filter_map(sequence_of).max().unwrap_or(0);
    let next = last + 1;

    if next > MAX_SEQUENCE {
        return Err(AppError::new(ErrorCode::IdSequenceExhausted));
    }

    Ok(format!("DF-{}-{:04}", date.format("%Y%m%d"), next))
}
