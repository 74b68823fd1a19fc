use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{ReportId, Timestamp, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "resolved" => Ok(ReportStatus::Resolved),
            "dismissed" => Ok(ReportStatus::Dismissed),
            _ => Err(DomainError::invalid_argument("status", "invalid_status")),
        }
    }
}

/// 用户提交的举报，由管理员审核
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter_id: UserId,
    pub target_user_id: UserId,
    pub reason: String,
    pub details: String,
    pub status: ReportStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Report {
    pub fn open(
        id: ReportId,
        reporter_id: UserId,
        target_user_id: UserId,
        reason: String,
        details: String,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            reporter_id,
            target_user_id,
            reason,
            details,
            status: ReportStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_status(&mut self, status: ReportStatus, now: Timestamp) {
        self.status = status;
        self.updated_at = now;
    }
}
