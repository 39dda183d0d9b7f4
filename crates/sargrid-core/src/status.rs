//! Grid cell lifecycle status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a single grid cell.
///
/// The usual progression is unassigned, assigned, in progress, completed.
/// Transitions are not restricted: coordinators routinely move cells
/// backward to correct mistakes made in the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridCellStatus {
    Unassigned,
    Assigned,
    InProgress,
    Completed,
}

impl GridCellStatus {
    pub const ALL: [GridCellStatus; 4] = [
        GridCellStatus::Unassigned,
        GridCellStatus::Assigned,
        GridCellStatus::InProgress,
        GridCellStatus::Completed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GridCellStatus::Unassigned => "unassigned",
            GridCellStatus::Assigned => "assigned",
            GridCellStatus::InProgress => "in_progress",
            GridCellStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for GridCellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown grid cell status '{0}'; expected unassigned, assigned, in_progress, or completed")]
pub struct StatusParseError(pub String);

impl FromStr for GridCellStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unassigned" => Ok(GridCellStatus::Unassigned),
            "assigned" => Ok(GridCellStatus::Assigned),
            "in_progress" => Ok(GridCellStatus::InProgress),
            "completed" => Ok(GridCellStatus::Completed),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}
