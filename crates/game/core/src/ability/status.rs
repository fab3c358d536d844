//! Per-ability input state machine.
//!
//! ```text
//! Idle ──begin──▶ AwaitingTarget ──with_target──▶ AwaitingCost ──with_cost──▶ AwaitingOutput
//!   ▲                                                                             │
//!   └─────────────────────────────── with_output (resolved) ◀─────────────────────┘
//! ```
//!
//! Steps whose input is already determined are skipped by the activation
//! driver; any state may fall back to `Idle` on cancel.
use super::{AbilityAction, AbilityError};
use crate::essence::EssenceSelection;
use crate::registry::TappableId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AbilityStatus {
    #[default]
    Idle,
    AwaitingTarget {
        roll: Option<u32>,
    },
    AwaitingCost {
        target: Option<TappableId>,
        roll: Option<u32>,
    },
    AwaitingOutput {
        target: Option<TappableId>,
        cost: EssenceSelection,
        roll: Option<u32>,
    },
}

/// Choices collected so far during one activation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub target: Option<TappableId>,
    pub cost: Option<EssenceSelection>,
    pub roll: Option<u32>,
}

impl Progress {
    /// Status that waits for the next missing choice.
    pub fn awaiting_target(self) -> AbilityStatus {
        AbilityStatus::AwaitingTarget { roll: self.roll }
    }

    pub fn awaiting_cost(self) -> AbilityStatus {
        AbilityStatus::AwaitingCost {
            target: self.target,
            roll: self.roll,
        }
    }

    pub fn awaiting_output(self, cost: EssenceSelection) -> AbilityStatus {
        AbilityStatus::AwaitingOutput {
            target: self.target,
            cost,
            roll: self.roll,
        }
    }

    pub fn resolve(self, cost: EssenceSelection, output: EssenceSelection) -> AbilityAction {
        AbilityAction {
            cost,
            output,
            target: self.target,
            roll: self.roll,
        }
    }
}

impl AbilityStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, AbilityStatus::Idle)
    }

    fn unexpected(self, input: &'static str) -> AbilityError {
        AbilityError::UnexpectedInput {
            status: self.as_ref().to_string(),
            input,
        }
    }

    pub fn begin(self, roll: Option<u32>) -> Result<Progress, AbilityError> {
        match self {
            AbilityStatus::Idle => Ok(Progress {
                roll,
                ..Progress::default()
            }),
            other => Err(other.unexpected("begin")),
        }
    }

    pub fn with_target(self, target: TappableId) -> Result<Progress, AbilityError> {
        match self {
            AbilityStatus::AwaitingTarget { roll } => Ok(Progress {
                target: Some(target),
                cost: None,
                roll,
            }),
            other => Err(other.unexpected("target")),
        }
    }

    pub fn with_cost(self, cost: EssenceSelection) -> Result<Progress, AbilityError> {
        match self {
            AbilityStatus::AwaitingCost { target, roll } => Ok(Progress {
                target,
                cost: Some(cost),
                roll,
            }),
            other => Err(other.unexpected("cost")),
        }
    }

    pub fn with_output(self, output: EssenceSelection) -> Result<AbilityAction, AbilityError> {
        match self {
            AbilityStatus::AwaitingOutput { target, cost, roll } => Ok(AbilityAction {
                cost,
                output,
                target,
                roll,
            }),
            other => Err(other.unexpected("output")),
        }
    }
}
