use crate::error::{ErrorSeverity, GameError};
use crate::registry::{AbilityId, PlayerId, TappableId};

/// Why an ability could not be activated or replayed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AbilityError {
    #[error("ability {0} does not exist")]
    NotFound(AbilityId),

    #[error("the game is over")]
    GameOver,

    #[error("abilities can only be used during the turn loop")]
    NotTurnLoop,

    #[error("ability {0} is passive")]
    Passive(AbilityId),

    #[error("ability belongs to {owner:?} but it is {current}'s turn")]
    NotOwnersTurn {
        owner: Option<PlayerId>,
        current: PlayerId,
    },

    #[error("ability belongs to another client's player")]
    NotLocal,

    #[error("ability {0} is already waiting for input")]
    AnotherActive(AbilityId),

    #[error("another local action is waiting for input")]
    InputPending,

    #[error("the current turn has already acted")]
    TurnSpent,

    #[error("attack responses are still pending")]
    AttackPending,

    #[error("owner has passed this round")]
    OwnerPassed,

    #[error("card {0} is not on its owner's table")]
    NotOnTable(TappableId),

    #[error("card {0} is tapped")]
    Tapped(TappableId),

    #[error("cost cannot be paid from the owner's essences")]
    CostUnpayable,

    #[error("cost {0} does not settle the ability's cost")]
    InvalidCost(String),

    #[error("no legal target")]
    NoTargets,

    #[error("target missing")]
    MissingTarget,

    #[error("card {0} is not a legal target")]
    InvalidTarget(TappableId),

    #[error("output {0} does not settle the ability's output")]
    InvalidOutput(String),

    #[error("roll {roll:?} is out of range for {sides} outcomes")]
    InvalidRoll { roll: Option<u32>, sides: u32 },

    #[error("{input} received while {status}")]
    UnexpectedInput { status: String, input: &'static str },
}

impl GameError for AbilityError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            AbilityError::AnotherActive(_)
            | AbilityError::InputPending
            | AbilityError::CostUnpayable
            | AbilityError::NoTargets
            | AbilityError::Tapped(_) => ErrorSeverity::Recoverable,
            AbilityError::UnexpectedInput { .. } | AbilityError::NotFound(_) => {
                ErrorSeverity::Internal
            }
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AbilityError::NotFound(_) => "ABILITY_NOT_FOUND",
            AbilityError::GameOver => "ABILITY_GAME_OVER",
            AbilityError::NotTurnLoop => "ABILITY_NOT_TURN_LOOP",
            AbilityError::Passive(_) => "ABILITY_PASSIVE",
            AbilityError::NotOwnersTurn { .. } => "ABILITY_NOT_OWNERS_TURN",
            AbilityError::NotLocal => "ABILITY_NOT_LOCAL",
            AbilityError::AnotherActive(_) => "ABILITY_ANOTHER_ACTIVE",
            AbilityError::InputPending => "ABILITY_INPUT_PENDING",
            AbilityError::TurnSpent => "ABILITY_TURN_SPENT",
            AbilityError::AttackPending => "ABILITY_ATTACK_PENDING",
            AbilityError::OwnerPassed => "ABILITY_OWNER_PASSED",
            AbilityError::NotOnTable(_) => "ABILITY_NOT_ON_TABLE",
            AbilityError::Tapped(_) => "ABILITY_TAPPED",
            AbilityError::CostUnpayable => "ABILITY_COST_UNPAYABLE",
            AbilityError::InvalidCost(_) => "ABILITY_INVALID_COST",
            AbilityError::NoTargets => "ABILITY_NO_TARGETS",
            AbilityError::MissingTarget => "ABILITY_MISSING_TARGET",
            AbilityError::InvalidTarget(_) => "ABILITY_INVALID_TARGET",
            AbilityError::InvalidOutput(_) => "ABILITY_INVALID_OUTPUT",
            AbilityError::InvalidRoll { .. } => "ABILITY_INVALID_ROLL",
            AbilityError::UnexpectedInput { .. } => "ABILITY_UNEXPECTED_INPUT",
        }
    }
}
