//! Report query-string parsing.
//!
//! The report UI sends repeated keys, with or without the `[]` suffix
//! (`projects[]=/a&projects[]=/b` or `projects=/a`), so the raw pairs are
//! folded by hand instead of through a derived struct.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use codetrail_core::error::DomainError;
use codetrail_core::filter::ActivityFilter;
use codetrail_core::period::Granularity;

/// A parsed report request.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ReportParams {
    pub(crate) filter: ActivityFilter,
    pub(crate) granularity: Granularity,
}

impl ReportParams {
    /// Folds raw query pairs into a filter. Unknown keys are ignored.
    pub(crate) fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, DomainError> {
        let mut params = Self::default();
        for (key, value) in pairs {
            let filter = &mut params.filter;
            match key.strip_suffix("[]").unwrap_or(&key) {
                "startDate" => filter.start = parse_date("startDate", &value)?,
                "endDate" => filter.end = parse_date("endDate", &value)?,
                "projects" => push_value(&mut filter.projects, value),
                "languages" => push_value(&mut filter.languages, value),
                "computers" => push_value(&mut filter.computers, value),
                "files" => push_value(&mut filter.files, value),
                "limit" => filter.limit = parse_count("limit", &value)?,
                "offset" => filter.offset = parse_count("offset", &value)?,
                "groupBy" => params.granularity = Granularity::parse(&value),
                _ => {}
            }
        }
        Ok(params)
    }
}

fn push_value(values: &mut Vec<String>, value: String) {
    if !value.is_empty() {
        values.push(value);
    }
}

/// Accepts RFC 3339, a bare `YYYY-MM-DD` (midnight UTC) or a naive
/// `YYYY-MM-DDTHH:MM:SS` (UTC). Blank means unset.
fn parse_date(key: &str, raw: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(at.and_utc()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|at| Some(at.and_utc()))
        .ok_or_else(|| DomainError::Validation(format!("{key} is not a valid date: {raw}")))
}

fn parse_count(key: &str, raw: &str) -> Result<Option<u32>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| DomainError::Validation(format!("{key} must be a non-negative integer")))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_bracketed_and_plain_keys_accumulate() {
        let params = ReportParams::from_pairs(pairs(&[
            ("projects[]", "/a"),
            ("projects", "/b"),
            ("languages[]", "rust"),
            ("limit", "50"),
            ("offset", "10"),
            ("groupBy", "week"),
        ]))
        .unwrap();

        assert_eq!(params.filter.projects, vec!["/a".to_owned(), "/b".to_owned()]);
        assert_eq!(params.filter.languages, vec!["rust".to_owned()]);
        assert_eq!(params.filter.limit, Some(50));
        assert_eq!(params.filter.offset, Some(10));
        assert_eq!(params.granularity, Granularity::Week);
    }

    #[test]
    fn test_dates_accept_rfc3339_plain_and_naive_forms() {
        let params = ReportParams::from_pairs(pairs(&[
            ("startDate", "2026-01-08"),
            ("endDate", "2026-01-15T12:30:00+02:00"),
        ]))
        .unwrap();
        let naive = ReportParams::from_pairs(pairs(&[("startDate", "2026-01-08T06:00:00")]))
            .unwrap();

        assert_eq!(
            params.filter.start,
            Some(Utc.with_ymd_and_hms(2026, 1, 8, 0, 0, 0).unwrap())
        );
        assert_eq!(
            params.filter.end,
            Some(Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap())
        );
        assert_eq!(
            naive.filter.start,
            Some(Utc.with_ymd_and_hms(2026, 1, 8, 6, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unknown_group_by_falls_back_to_day() {
        let params = ReportParams::from_pairs(pairs(&[("groupBy", "fortnight")])).unwrap();

        assert_eq!(params.granularity, Granularity::Day);
    }

    #[test]
    fn test_malformed_values_are_validation_errors() {
        let bad_date = ReportParams::from_pairs(pairs(&[("startDate", "last tuesday")]));
        let bad_limit = ReportParams::from_pairs(pairs(&[("limit", "-1")]));

        assert!(matches!(bad_date, Err(DomainError::Validation(_))));
        assert!(matches!(bad_limit, Err(DomainError::Validation(_))));
    }
}
