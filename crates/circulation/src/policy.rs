//! Circulation policy constants.

use crate::money::Cents;
use time::{Date, Duration};

/// The policy knobs the schema leaves undetermined: how long a loan runs,
/// what a late day costs, and where the fine stops growing.
///
/// Defaults match the figures used throughout the sample data (14-day
/// loans at $0.25/day); production values come from `stacks-config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CirculationPolicy {
    /// Days from checkout to due date.
    pub loan_period_days: u16,
    /// Fine accrued per late day.
    pub daily_rate: Cents,
    /// Ceiling on a single loan's fine.
    pub fine_cap: Cents,
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            daily_rate: Cents::of(25),
            fine_cap: Cents::of(2500),
        }
    }
}

impl From<&stacks_config::PolicyConfig> for CirculationPolicy {
    fn from(config: &stacks_config::PolicyConfig) -> Self {
        Self {
            loan_period_days: config.loan_period_days,
            daily_rate: Cents::of(config.daily_rate_cents),
            fine_cap: Cents::of(config.fine_cap_cents),
        }
    }
}

impl CirculationPolicy {
    /// Due date for a loan checked out on the given day.
    pub fn due_date(&self, date_out: Date) -> Date {
        date_out + Duration::days(i64::from(self.loan_period_days))
    }

    /// Fine owed for a number of late days, capped.
    pub fn fine_for(&self, late_days: u32) -> Cents {
        self.daily_rate.times(late_days).min(self.fine_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::date;

    #[test]
    fn test_due_date() {
        let policy = CirculationPolicy::default();
        assert_eq!(policy.due_date(date!(2025 - 01 - 01)), date!(2025 - 01 - 15));
        // Month rollover
        assert_eq!(policy.due_date(date!(2025 - 01 - 20)), date!(2025 - 02 - 03));
    }

    #[rstest]
    #[case(0, Cents::ZERO)]
    #[case(1, Cents::of(25))]
    #[case(10, Cents::of(250))]
    // 100 days at $0.25 would be $25.00, exactly the cap
    #[case(100, Cents::of(2500))]
    #[case(101, Cents::of(2500))]
    #[case(10_000, Cents::of(2500))]
    fn test_fine_for_is_capped(#[case] late_days: u32, #[case] expected: Cents) {
        assert_eq!(CirculationPolicy::default().fine_for(late_days), expected);
    }

    #[test]
    fn test_from_config() {
        let config = stacks_config::PolicyConfig {
            loan_period_days: 21,
            daily_rate_cents: 10,
            fine_cap_cents: 500,
        };
        let policy = CirculationPolicy::from(&config);
        assert_eq!(policy.loan_period_days, 21);
        assert_eq!(policy.daily_rate, Cents::of(10));
        assert_eq!(policy.fine_cap, Cents::of(500));
    }
}
