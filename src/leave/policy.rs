use crate::model::leave_type::LeaveTypeConfig;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub auto_approve: bool,
    pub bypass_conflict: bool,
}

/// Conflict bypass only ever rides along with auto-approval.
pub fn evaluate(config: &LeaveTypeConfig, requested_days: i32) -> PolicyDecision {
    let auto_approve = config.auto_approve_enabled && requested_days <= config.auto_approve_threshold_days;
    PolicyDecision {
        auto_approve,
        bypass_conflict: auto_approve && config.bypass_conflict_check,
    }
}

#[cfg(test)]
mod tests {
    use super::evaluate;
    use crate::model::leave_type::{LeaveType, LeaveTypeConfig};

    fn config(enabled: bool, threshold: i32, bypass: bool) -> LeaveTypeConfig {
        LeaveTypeConfig {
            leave_type: LeaveType::Casual,
            default_balance: 7,
            auto_approve_enabled: enabled,
            auto_approve_threshold_days: threshold,
            bypass_conflict_check: bypass,
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let cfg = config(true, 3, false);
        assert!(evaluate(&cfg, 3).auto_approve);
        assert!(evaluate(&cfg, 1).auto_approve);
        assert!(!evaluate(&cfg, 4).auto_approve);
    }

    #[test]
    fn over_threshold_never_bypasses_even_when_flagged() {
        let decision = evaluate(&config(true, 3, true), 4);
        assert!(!decision.auto_approve);
        assert!(!decision.bypass_conflict);
    }

    #[test]
    fn bypass_without_auto_approval_is_ignored() {
        let decision = evaluate(&config(false, 10, true), 1);
        assert!(!decision.auto_approve);
        assert!(!decision.bypass_conflict);
    }

    #[test]
    fn bypass_applies_alongside_auto_approval() {
        let decision = evaluate(&config(true, 2, true), 2);
        assert!(decision.auto_approve);
        assert!(decision.bypass_conflict);
    }

    #[test]
    fn fallback_policy_never_auto_approves() {
        let decision = evaluate(&LeaveTypeConfig::fallback(LeaveType::Annual), 1);
        assert!(!decision.auto_approve);
    }
}
