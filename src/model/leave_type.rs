use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Casual,
    Unpaid,
}

/// Per-type leave policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveTypeConfig {
    pub leave_type: LeaveType,
    #[schema(example = 21)]
    pub default_balance: i32,
    pub auto_approve_enabled: bool,
    #[schema(example = 3)]
    pub auto_approve_threshold_days: i32,
    pub bypass_conflict_check: bool,
}

impl LeaveTypeConfig {
    /// Policy used when no config row exists for the type.
    pub fn fallback(leave_type: LeaveType) -> Self {
        Self {
            leave_type,
            default_balance: if leave_type == LeaveType::Annual { 21 } else { 7 },
            auto_approve_enabled: false,
            auto_approve_threshold_days: 0,
            bypass_conflict_check: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LeaveType, LeaveTypeConfig};

    #[test]
    fn fallback_grants_annual_more_days_than_other_types() {
        assert_eq!(LeaveTypeConfig::fallback(LeaveType::Annual).default_balance, 21);
        assert_eq!(LeaveTypeConfig::fallback(LeaveType::Sick).default_balance, 7);
        assert_eq!(LeaveTypeConfig::fallback(LeaveType::Unpaid).default_balance, 7);

        let cfg = LeaveTypeConfig::fallback(LeaveType::Casual);
        assert!(!cfg.auto_approve_enabled);
        assert!(!cfg.bypass_conflict_check);
    }

    #[test]
    fn leave_type_parses_storage_spelling() {
        assert_eq!("annual".parse::<LeaveType>().ok(), Some(LeaveType::Annual));
        assert_eq!(LeaveType::Sick.as_ref(), "sick");
        assert!("holiday".parse::<LeaveType>().is_err());
    }
}
