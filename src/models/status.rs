use serde::{Deserialize, Serialize};

/// Ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusLevel {
    Ok,
    Warning,
    Error,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Ok => "OK",
            StatusLevel::Warning => "WARNING",
            StatusLevel::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatus {
    pub level: StatusLevel,
    pub message: String,
}

impl StageStatus {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Ok,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.level == StatusLevel::Ok
    }

    /// Merge several statuses: the worst level wins, messages are joined.
    pub fn combine(statuses: impl IntoIterator<Item = StageStatus>) -> Self {
        let statuses: Vec<StageStatus> = statuses.into_iter().collect();
        let level = statuses
            .iter()
            .map(|s| s.level)
            .max()
            .unwrap_or(StatusLevel::Ok);
        let message = statuses
            .into_iter()
            .map(|s| s.message)
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        Self { level, message }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// A stage result that never carries a fault: failures become an empty
/// value plus an error status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome<T> {
    pub data: T,
    pub status: StageStatus,
}

impl<T> StageOutcome<T> {
    pub fn new(data: T, status: StageStatus) -> Self {
        Self { data, status }
    }
}

impl<T: Default> StageOutcome<T> {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            data: T::default(),
            status: StageStatus::error(message),
        }
    }
}
