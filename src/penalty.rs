//! Return penalties and status transitions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{CylinderStatus, ReturnCondition};

/// Surcharges applied when a cylinder comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyPolicy {
    /// Charged when the condition is anything but `Good`
    pub damage_surcharge: Decimal,
    /// Charged when the safety test was overdue at return time
    pub late_surcharge: Decimal,
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            damage_surcharge: Decimal::new(500, 0),
            late_surcharge: Decimal::new(1000, 0),
        }
    }
}

/// Penalty and next status for one return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnOutcome {
    pub penalty: Decimal,
    pub new_status: CylinderStatus,
}

impl PenaltyPolicy {
    /// Compute the outcome of a return under this policy.
    #[must_use]
    pub fn compute_return(&self, condition: ReturnCondition, was_overdue: bool) -> ReturnOutcome {
        let mut penalty = Decimal::ZERO;
        if condition != ReturnCondition::Good {
            penalty += self.damage_surcharge;
        }
        if was_overdue {
            penalty += self.late_surcharge;
        }

        let new_status = match condition {
            ReturnCondition::Good => CylinderStatus::Empty,
            ReturnCondition::Dented
            | ReturnCondition::Leaking
            | ReturnCondition::ValveDamage
            | ReturnCondition::Broken => CylinderStatus::Damaged,
        };

        ReturnOutcome { penalty, new_status }
    }
}

/// [`PenaltyPolicy::compute_return`] with the default surcharges (500 and 1000).
#[must_use]
pub fn compute_return(condition: ReturnCondition, was_overdue: bool) -> ReturnOutcome {
    PenaltyPolicy::default().compute_return(condition, was_overdue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(penalty: i64, new_status: CylinderStatus) -> ReturnOutcome {
        ReturnOutcome {
            penalty: Decimal::new(penalty, 0),
            new_status,
        }
    }

    #[test]
    fn test_penalty_table() {
        assert_eq!(compute_return(ReturnCondition::Good, false), outcome(0, CylinderStatus::Empty));
        assert_eq!(compute_return(ReturnCondition::Good, true), outcome(1000, CylinderStatus::Empty));
        assert_eq!(compute_return(ReturnCondition::Dented, false), outcome(500, CylinderStatus::Damaged));
        assert_eq!(compute_return(ReturnCondition::Leaking, true), outcome(1500, CylinderStatus::Damaged));
    }

    #[test]
    fn test_every_damage_condition_is_surcharged() {
        for condition in ReturnCondition::ALL {
            let result = compute_return(condition, false);
            if condition == ReturnCondition::Good {
                assert_eq!(result.penalty, Decimal::ZERO);
            } else {
                assert_eq!(result.penalty, Decimal::new(500, 0), "{condition}");
                assert_eq!(result.new_status, CylinderStatus::Damaged);
            }
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = PenaltyPolicy {
            damage_surcharge: Decimal::new(7500, 2),
            late_surcharge: Decimal::new(20, 0),
        };
        let result = policy.compute_return(ReturnCondition::Broken, true);
        assert_eq!(result.penalty, Decimal::new(9500, 2));
    }
}
