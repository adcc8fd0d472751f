//! Fine Policy Ledger
//!
//! Answers "what daily rate applied on day X" for any historical range and
//! turns an overdue interval into an auditable breakdown. The walk itself is
//! a pure function so it can be tested without a database.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::fine_policy::{FineAssessment, FinePolicy, FineSegment},
    repository::Repository,
};

/// Walk the overdue interval `[due, end)` against a library's policy
/// history and bill each covered day exactly once.
///
/// Day counts round up: a started day is a full day. The day grid is
/// anchored at the due date, so the segments always tile
/// `[due_date, due_date + ceil(end - due))` with no gaps or overlaps. Days
/// not covered by any policy (including the no-policy case) bill at the
/// library's default rate.
pub fn calculate_fine(
    policies: &[FinePolicy],
    default_rate: Decimal,
    due: DateTime<Utc>,
    end: DateTime<Utc>,
) -> FineAssessment {
    if end <= due {
        return FineAssessment::zero();
    }

    let overdue_secs = (end - due).num_seconds();
    let overdue_days = (overdue_secs + 86_399) / 86_400;
    let grid_start = due.date_naive();
    let grid_end = grid_start + Duration::days(overdue_days);

    let mut sorted: Vec<&FinePolicy> = policies.iter().collect();
    sorted.sort_by_key(|p| p.effective_from);

    let mut breakdown = Vec::new();
    let mut cursor = grid_start;

    for policy in sorted {
        if cursor >= grid_end || policy.effective_from >= grid_end {
            break;
        }
        let window_end = policy.window_end();
        if window_end.map_or(false, |we| we <= cursor) {
            continue;
        }

        // Unpoliced days before this window bill at the default rate
        if policy.effective_from > cursor {
            let gap_end = policy.effective_from.min(grid_end);
            breakdown.push(segment(cursor, gap_end, default_rate));
            cursor = gap_end;
            if cursor >= grid_end {
                break;
            }
        }

        let segment_end = window_end.map_or(grid_end, |we| we.min(grid_end));
        if segment_end > cursor {
            breakdown.push(segment(cursor, segment_end, policy.daily_rate));
            cursor = segment_end;
        }
    }

    if cursor < grid_end {
        breakdown.push(segment(cursor, grid_end, default_rate));
    }

    let total = breakdown.iter().map(|s| s.amount).sum();
    FineAssessment { total, breakdown }
}

fn segment(start: NaiveDate, end: NaiveDate, rate: Decimal) -> FineSegment {
    let days = (end - start).num_days();
    FineSegment {
        start,
        end,
        rate,
        amount: (Decimal::from(days) * rate).round_dp(2),
    }
}

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
}

impl FinesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Policy history for a library, oldest first
    pub async fn get_policies(&self, library_id: i32) -> AppResult<Vec<FinePolicy>> {
        self.repository.libraries.get_by_id(library_id).await?;
        self.repository.fine_policies.list_for_library(library_id).await
    }

    /// Create a new rate policy, closing the current open one
    pub async fn create_policy(
        &self,
        library_id: i32,
        daily_rate: Decimal,
        effective_from: NaiveDate,
    ) -> AppResult<FinePolicy> {
        if daily_rate < Decimal::ZERO {
            return Err(AppError::Validation(
                "Daily rate must not be negative".to_string(),
            ));
        }
        self.repository.libraries.get_by_id(library_id).await?;
        self.repository
            .fine_policies
            .create(library_id, daily_rate, effective_from)
            .await
    }

    /// Assess the fine for a loan of the given library over `[due, end)`
    pub async fn assess(
        &self,
        library_id: i32,
        due: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<FineAssessment> {
        let library = self.repository.libraries.get_by_id(library_id).await?;
        let policies = self
            .repository
            .fine_policies
            .list_for_library(library_id)
            .await?;
        Ok(calculate_fine(
            &policies,
            library.default_fine_rate,
            due,
            end,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn policy(id: i32, rate: Decimal, from: NaiveDate, to: Option<NaiveDate>) -> FinePolicy {
        FinePolicy {
            id,
            library_id: 1,
            daily_rate: rate,
            effective_from: from,
            effective_to: to,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at_midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_early_return_is_free() {
        let due = at_midnight(2024, 3, 10);
        let end = at_midnight(2024, 3, 5);
        let assessment = calculate_fine(&[], dec!(0.50), due, end);
        assert_eq!(assessment.total, Decimal::ZERO);
        assert!(assessment.breakdown.is_empty());

        let assessment = calculate_fine(&[], dec!(0.50), due, due);
        assert_eq!(assessment.total, Decimal::ZERO);
    }

    #[test]
    fn test_no_policy_falls_back_to_default_rate() {
        let due = at_midnight(2024, 3, 10);
        let end = at_midnight(2024, 3, 14);
        let assessment = calculate_fine(&[], dec!(0.25), due, end);
        assert_eq!(assessment.breakdown.len(), 1);
        assert_eq!(assessment.breakdown[0].days(), 4);
        assert_eq!(assessment.breakdown[0].rate, dec!(0.25));
        assert_eq!(assessment.total, dec!(1.00));
    }

    #[test]
    fn test_started_day_counts_as_full_day() {
        let due = at_midnight(2024, 3, 10);
        let end = Utc.with_ymd_and_hms(2024, 3, 11, 9, 30, 0).unwrap();
        let assessment = calculate_fine(&[], dec!(0.50), due, end);
        assert_eq!(assessment.breakdown.len(), 1);
        assert_eq!(assessment.breakdown[0].days(), 2);
        assert_eq!(assessment.total, dec!(1.00));
    }

    #[test]
    fn test_rate_change_mid_interval() {
        // Library rate $0.50/day before 2024-01-01, $0.75/day from then on;
        // due 2023-12-30, returned 2024-01-03.
        let policies = vec![
            policy(1, dec!(0.50), date(2020, 1, 1), Some(date(2023, 12, 31))),
            policy(2, dec!(0.75), date(2024, 1, 1), None),
        ];
        let due = at_midnight(2023, 12, 30);
        let end = at_midnight(2024, 1, 3);

        let assessment = calculate_fine(&policies, dec!(0.10), due, end);

        assert_eq!(assessment.breakdown.len(), 2);
        assert_eq!(assessment.breakdown[0].start, date(2023, 12, 30));
        assert_eq!(assessment.breakdown[0].end, date(2024, 1, 1));
        assert_eq!(assessment.breakdown[0].rate, dec!(0.50));
        assert_eq!(assessment.breakdown[0].amount, dec!(1.00));
        assert_eq!(assessment.breakdown[1].start, date(2024, 1, 1));
        assert_eq!(assessment.breakdown[1].end, date(2024, 1, 3));
        assert_eq!(assessment.breakdown[1].rate, dec!(0.75));
        assert_eq!(assessment.breakdown[1].amount, dec!(1.50));
        assert_eq!(assessment.total, dec!(2.50));
    }

    #[test]
    fn test_gap_between_policies_bills_default_rate() {
        let policies = vec![
            policy(1, dec!(0.50), date(2024, 1, 1), Some(date(2024, 1, 5))),
            policy(2, dec!(0.75), date(2024, 1, 10), None),
        ];
        let due = at_midnight(2024, 1, 4);
        let end = at_midnight(2024, 1, 12);

        let assessment = calculate_fine(&policies, dec!(0.20), due, end);

        let rates: Vec<Decimal> = assessment.breakdown.iter().map(|s| s.rate).collect();
        assert_eq!(rates, vec![dec!(0.50), dec!(0.20), dec!(0.75)]);
        // 2 days at 0.50, 4 days at 0.20, 2 days at 0.75
        assert_eq!(assessment.total, dec!(1.00) + dec!(0.80) + dec!(1.50));
    }

    #[test]
    fn test_breakdown_tiles_interval_exactly() {
        let policies = vec![
            policy(1, dec!(0.30), date(2024, 1, 1), Some(date(2024, 2, 15))),
            policy(2, dec!(0.45), date(2024, 2, 16), Some(date(2024, 3, 31))),
            policy(3, dec!(0.60), date(2024, 4, 1), None),
        ];
        let due = at_midnight(2024, 2, 10);
        let end = Utc.with_ymd_and_hms(2024, 4, 5, 16, 0, 0).unwrap();

        let assessment = calculate_fine(&policies, dec!(0.10), due, end);

        // Contiguous, non-overlapping, chronological
        let mut cursor = due.date_naive();
        for seg in &assessment.breakdown {
            assert_eq!(seg.start, cursor);
            assert!(seg.end > seg.start);
            cursor = seg.end;
        }
        // Summed days equal the rounded-up overdue day count
        let total_days: i64 = assessment.breakdown.iter().map(|s| s.days()).sum();
        assert_eq!(total_days, 56);
        assert_eq!(cursor, due.date_naive() + Duration::days(56));
    }
}
