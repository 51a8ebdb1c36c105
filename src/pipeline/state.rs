//! Stages and the actions that move a file between them.

use crate::transform::{CleaningOptions, ColumnSelection};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Decoded,
    Cleaned,
    Projected,
    Visualized,
    Converted,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Decoded => "decoded",
            Self::Cleaned => "cleaned",
            Self::Projected => "projected",
            Self::Visualized => "visualized",
            Self::Converted => "converted",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl Stage {
    /// No action is accepted once a file is done or has failed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether the working table has been projected and can be charted or
    /// exported.
    pub fn is_projected(self) -> bool {
        matches!(self, Self::Projected | Self::Visualized | Self::Converted)
    }

    /// Stage reached by running `action` from `self`, or `None` when the
    /// action is not allowed here.
    pub fn next(self, action: &Action) -> Option<Self> {
        match (self, action) {
            (Self::Received, Action::Decode) => Some(Self::Decoded),
            (Self::Decoded | Self::Cleaned, Action::Clean(_)) => Some(Self::Cleaned),
            (Self::Decoded | Self::Cleaned, Action::Select(_)) => Some(Self::Projected),
            (stage, Action::Visualize) if stage.is_projected() => Some(Self::Visualized),
            (stage, Action::Convert(_)) if stage.is_projected() => Some(Self::Converted),
            (stage, Action::Finish) if stage.is_projected() => Some(Self::Done),
            _ => None,
        }
    }
}

/// A user-triggered step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Decode,
    Clean(CleaningOptions),
    Select(ColumnSelection),
    Visualize,
    /// Export to a target named by the user (`csv`, `xlsx` or `excel`)
    Convert(String),
    Finish,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Clean(_) => "clean",
            Self::Select(_) => "select columns",
            Self::Visualize => "visualize",
            Self::Convert(_) => "convert",
            Self::Finish => "finish",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STAGES: [Stage; 8] = [
        Stage::Received,
        Stage::Decoded,
        Stage::Cleaned,
        Stage::Projected,
        Stage::Visualized,
        Stage::Converted,
        Stage::Done,
        Stage::Failed,
    ];

    #[test]
    fn test_happy_path() {
        let mut stage = Stage::Received;
        for action in [
            Action::Decode,
            Action::Clean(CleaningOptions::default()),
            Action::Select(ColumnSelection::All),
            Action::Visualize,
            Action::Convert("csv".to_owned()),
            Action::Convert("xlsx".to_owned()),
            Action::Finish,
        ] {
            stage = stage.next(&action).unwrap_or(Stage::Failed);
        }
        assert_eq!(stage, Stage::Done);
    }

    #[test]
    fn test_cleaning_is_optional_and_repeatable() {
        let clean = Action::Clean(CleaningOptions::default());
        let select = Action::Select(ColumnSelection::All);
        assert_eq!(Stage::Decoded.next(&select), Some(Stage::Projected));
        assert_eq!(Stage::Cleaned.next(&clean), Some(Stage::Cleaned));
        assert_eq!(Stage::Projected.next(&clean), None);
    }

    #[test]
    fn test_terminal_stages_accept_nothing() {
        let actions = [
            Action::Decode,
            Action::Clean(CleaningOptions::default()),
            Action::Select(ColumnSelection::All),
            Action::Visualize,
            Action::Convert("csv".to_owned()),
            Action::Finish,
        ];
        for stage in ALL_STAGES.into_iter().filter(|s| s.is_terminal()) {
            assert!(actions.iter().all(|a| stage.next(a).is_none()), "{stage}");
        }
    }

    #[test]
    fn test_convert_requires_projection() {
        let convert = Action::Convert("csv".to_owned());
        let allowed: Vec<Stage> = ALL_STAGES
            .into_iter()
            .filter(|s| s.next(&convert).is_some())
            .collect();
        assert_eq!(
            allowed,
            vec![Stage::Projected, Stage::Visualized, Stage::Converted]
        );
    }
}
