//! Query handlers for the reporting context.
//!
//! The single-purpose handlers (`query_activities`, `get_statistics`,
//! `get_timeline`, `distinct_values`) run the filter exactly as given. The
//! report-style handlers (`build_report`, `build_statistics_report`) first
//! fill in the trailing seven-day window when the caller named no range.

use std::cmp::Reverse;

use codetrail_core::activity::ActivityRecord;
use codetrail_core::clock::Clock;
use codetrail_core::error::DomainError;
use codetrail_core::filter::ActivityFilter;
use codetrail_core::period::Granularity;
use codetrail_core::repository::{ActivityRepository, AggregateRow, Dimension, GroupKey};
use tracing::debug;

use crate::domain::views::{
    AppliedFilters, FilterOptionsView, LanguageTotal, PeriodTotal, ProjectTotal, ReportMeta,
    ReportView, StatisticsReportView, StatisticsView, TOP_N,
};

/// The filter a report-style query actually runs with.
#[must_use]
pub fn effective_filter(filter: ActivityFilter, clock: &dyn Clock) -> ActivityFilter {
    filter.with_default_range(clock.now())
}

/// Matching records, newest first, honoring `limit` and `offset`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store query fails.
pub async fn query_activities(
    filter: &ActivityFilter,
    repo: &dyn ActivityRepository,
) -> Result<Vec<ActivityRecord>, DomainError> {
    repo.find(filter).await
}

/// Totals and top-N languages and projects for the filter.
///
/// An empty result set yields zero totals and empty lists.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any store query fails.
pub async fn get_statistics(
    filter: &ActivityFilter,
    repo: &dyn ActivityRepository,
) -> Result<StatisticsView, DomainError> {
    let totals = repo.totals(filter).await?;
    let languages = top_groups(filter, Dimension::Language, repo).await?;
    let projects = top_groups(filter, Dimension::Project, repo).await?;

    Ok(StatisticsView {
        total_duration: totals.total_duration,
        count: totals.count,
        top_languages: languages
            .into_iter()
            .map(|row| LanguageTotal {
                language: row.key,
                duration: row.total_duration,
                count: row.count,
            })
            .collect(),
        top_projects: projects
            .into_iter()
            .map(|row| ProjectTotal {
                project: row.key,
                duration: row.total_duration,
                count: row.count,
            })
            .collect(),
    })
}

async fn top_groups(
    filter: &ActivityFilter,
    dimension: Dimension,
    repo: &dyn ActivityRepository,
) -> Result<Vec<AggregateRow>, DomainError> {
    let mut rows = repo
        .aggregate(filter, GroupKey::Dimension(dimension), Some(TOP_N))
        .await?;
    // Stores must not decide the tie order.
    rows.sort_by_key(|row| (Reverse(row.total_duration), row.first_id));
    rows.truncate(TOP_N as usize);
    Ok(rows)
}

/// Summed duration and count per time bucket, oldest bucket first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store query fails.
pub async fn get_timeline(
    filter: &ActivityFilter,
    granularity: Granularity,
    repo: &dyn ActivityRepository,
) -> Result<Vec<PeriodTotal>, DomainError> {
    let mut rows = repo
        .aggregate(filter, GroupKey::Period(granularity), None)
        .await?;
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(rows
        .into_iter()
        .map(|row| PeriodTotal {
            period: row.key,
            duration: row.total_duration,
            count: row.count,
        })
        .collect())
}

/// Sorted, non-empty distinct values of one column.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the store query fails.
pub async fn distinct_values(
    dimension: Dimension,
    repo: &dyn ActivityRepository,
) -> Result<Vec<String>, DomainError> {
    repo.distinct_values(dimension).await
}

/// Every value the report filters can offer.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any store query fails.
pub async fn get_filter_options(
    repo: &dyn ActivityRepository,
) -> Result<FilterOptionsView, DomainError> {
    Ok(FilterOptionsView {
        projects: distinct_values(Dimension::Project, repo).await?,
        languages: distinct_values(Dimension::Language, repo).await?,
        computers: distinct_values(Dimension::ComputerId, repo).await?,
    })
}

/// Rows, statistics and metadata over the effective filter.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any store query fails.
pub async fn build_report(
    filter: ActivityFilter,
    clock: &dyn Clock,
    repo: &dyn ActivityRepository,
) -> Result<ReportView, DomainError> {
    let filter = effective_filter(filter, clock);
    debug!(?filter, "building report");

    let data = query_activities(&filter, repo).await?;
    let statistics = get_statistics(&filter, repo).await?;

    Ok(ReportView {
        meta: ReportMeta {
            total: data.len(),
            start_date: filter.start,
            end_date: filter.end,
            filters: AppliedFilters {
                projects: filter.projects,
                languages: filter.languages,
                computers: filter.computers,
                files: filter.files,
            },
        },
        data,
        statistics,
    })
}

/// Statistics and a timeline over the effective filter.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any store query fails.
pub async fn build_statistics_report(
    filter: ActivityFilter,
    granularity: Granularity,
    clock: &dyn Clock,
    repo: &dyn ActivityRepository,
) -> Result<StatisticsReportView, DomainError> {
    let filter = effective_filter(filter, clock);
    debug!(?filter, ?granularity, "building statistics report");

    Ok(StatisticsReportView {
        statistics: get_statistics(&filter, repo).await?,
        timeline: get_timeline(&filter, granularity, repo).await?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use codetrail_core::activity::{ActivityKind, NewActivity};
    use codetrail_core::error::DomainError;
    use codetrail_test_support::{
        FailingActivityRepository, FixedClock, InMemoryActivityRepository,
    };

    use super::*;

    fn activity(time: i64, duration: i64, project: &str, language: &str) -> NewActivity {
        let mut activity = NewActivity::new(ActivityKind::Edit, time, duration);
        activity.project = project.to_owned();
        activity.language = language.to_owned();
        activity.computer_id = "pc-1".to_owned();
        activity.file = "src/main.rs".to_owned();
        activity
    }

    async fn seeded(activities: &[NewActivity]) -> InMemoryActivityRepository {
        let repo = InMemoryActivityRepository::default();
        for activity in activities {
            repo.save(activity).await.unwrap();
        }
        repo
    }

    fn hours_before_now(hours: i64) -> i64 {
        (FixedClock::standard().0 - Duration::hours(hours)).timestamp_millis()
    }

    #[tokio::test]
    async fn test_statistics_on_empty_store_are_zero() {
        // Arrange
        let repo = InMemoryActivityRepository::default();

        // Act
        let stats = get_statistics(&ActivityFilter::default(), &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(stats, StatisticsView::default());
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalDuration": 0,
                "count": 0,
                "topLanguages": [],
                "topProjects": []
            })
        );
    }

    #[tokio::test]
    async fn test_statistics_rank_by_duration_with_id_tie_break() {
        let repo = seeded(&[
            activity(1_000, 2_000, "/a", "go"),
            activity(2_000, 2_000, "/b", "rust"),
            activity(3_000, 9_000, "/b", "toml"),
        ])
        .await;

        let stats = get_statistics(&ActivityFilter::default(), &repo)
            .await
            .unwrap();

        assert_eq!(stats.total_duration, 13_000);
        assert_eq!(stats.count, 3);
        let languages: Vec<&str> = stats
            .top_languages
            .iter()
            .map(|l| l.language.as_str())
            .collect();
        assert_eq!(languages, vec!["toml", "go", "rust"]);
        assert_eq!(stats.top_projects[0].project, "/b");
        assert_eq!(stats.top_projects[0].duration, 11_000);
        assert_eq!(stats.top_projects[0].count, 2);
    }

    #[tokio::test]
    async fn test_statistics_keep_at_most_ten_groups() {
        let activities: Vec<NewActivity> = (0..12)
            .map(|i| activity(1_000 + i, 100 + i, "/a", &format!("lang-{i:02}")))
            .collect();
        let repo = seeded(&activities).await;

        let stats = get_statistics(&ActivityFilter::default(), &repo)
            .await
            .unwrap();

        assert_eq!(stats.top_languages.len(), 10);
        assert_eq!(stats.top_languages[0].language, "lang-11");
        assert_eq!(stats.count, 12);
    }

    #[tokio::test]
    async fn test_day_timeline_splits_events_36_hours_apart() {
        // Arrange
        let first = Utc.with_ymd_and_hms(2026, 1, 13, 6, 0, 0).unwrap();
        let second = first + Duration::hours(36);
        let repo = seeded(&[
            activity(second.timestamp_millis(), 3_000, "/a", "rust"),
            activity(first.timestamp_millis(), 1_000, "/a", "rust"),
            activity(first.timestamp_millis() + 60_000, 500, "/a", "rust"),
        ])
        .await;

        // Act
        let timeline = get_timeline(&ActivityFilter::default(), Granularity::Day, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(
            timeline,
            vec![
                PeriodTotal {
                    period: "2026-01-13".to_owned(),
                    duration: 1_500,
                    count: 2,
                },
                PeriodTotal {
                    period: "2026-01-14".to_owned(),
                    duration: 3_000,
                    count: 1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_timeline_honors_set_predicates() {
        let repo = seeded(&[
            activity(hours_before_now(2), 1_000, "/a", "rust"),
            activity(hours_before_now(2), 4_000, "/b", "rust"),
        ])
        .await;
        let filter = ActivityFilter {
            projects: vec!["/a".to_owned()],
            ..ActivityFilter::default()
        };

        let timeline = get_timeline(&filter, Granularity::Month, &repo)
            .await
            .unwrap();

        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].period, "2026-01");
        assert_eq!(timeline[0].duration, 1_000);
    }

    #[tokio::test]
    async fn test_report_defaults_to_trailing_seven_days() {
        // Arrange
        let clock = FixedClock::standard();
        let repo = seeded(&[
            activity(hours_before_now(24 * 8), 1_000, "/old", "rust"),
            activity(hours_before_now(3), 2_000, "/new", "rust"),
            activity(hours_before_now(1), 3_000, "/new", "go"),
        ])
        .await;

        // Act
        let report = build_report(ActivityFilter::default(), &clock, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(report.meta.total, 2);
        assert_eq!(report.meta.end_date, Some(clock.0));
        assert_eq!(report.meta.start_date, Some(clock.0 - Duration::days(7)));
        assert_eq!(report.data[0].activity.time, hours_before_now(1));
        assert_eq!(report.statistics.total_duration, 5_000);
    }

    #[tokio::test]
    async fn test_report_applies_the_same_filter_to_rows_and_statistics() {
        let clock = FixedClock::standard();
        let repo = seeded(&[
            activity(hours_before_now(3), 2_000, "/a", "rust"),
            activity(hours_before_now(2), 3_000, "/a", "go"),
            activity(hours_before_now(1), 4_000, "/b", "rust"),
        ])
        .await;
        let filter = ActivityFilter {
            languages: vec!["rust".to_owned()],
            limit: Some(1),
            ..ActivityFilter::default()
        };

        let report = build_report(filter, &clock, &repo).await.unwrap();

        assert_eq!(report.data.len(), 1);
        assert_eq!(report.meta.total, 1);
        assert_eq!(report.meta.filters.languages, vec!["rust".to_owned()]);
        assert_eq!(report.statistics.count, 2);
        assert_eq!(report.statistics.total_duration, 6_000);
        assert_eq!(report.statistics.top_languages.len(), 1);
    }

    #[tokio::test]
    async fn test_statistics_report_uses_requested_granularity() {
        let clock = FixedClock::standard();
        let repo = seeded(&[
            activity(hours_before_now(1), 1_000, "/a", "rust"),
            activity(hours_before_now(2), 1_000, "/a", "rust"),
        ])
        .await;

        let view = build_statistics_report(
            ActivityFilter::default(),
            Granularity::Hour,
            &clock,
            &repo,
        )
        .await
        .unwrap();

        assert_eq!(view.statistics.count, 2);
        let periods: Vec<&str> = view.timeline.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2026-01-15 08:00:00", "2026-01-15 09:00:00"]);
    }

    #[tokio::test]
    async fn test_filter_options_list_each_dimension() {
        let mut on_laptop = activity(1_000, 1_000, "/b", "rust");
        on_laptop.computer_id = "laptop".to_owned();
        let repo = seeded(&[
            on_laptop,
            activity(2_000, 1_000, "/a", "go"),
            activity(3_000, 1_000, "", ""),
        ])
        .await;

        let options = get_filter_options(&repo).await.unwrap();

        assert_eq!(options.projects, vec!["/a".to_owned(), "/b".to_owned()]);
        assert_eq!(options.languages, vec!["go".to_owned(), "rust".to_owned()]);
        assert_eq!(
            options.computers,
            vec!["laptop".to_owned(), "pc-1".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_to_caller() {
        let repo = FailingActivityRepository::default();

        let result =
            build_report(ActivityFilter::default(), &FixedClock::standard(), &repo).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
