//! Deterministic rules of an arcana table, shared by every client.
//!
//! Each client owns a [`GameState`] and feeds it the same ordered stream of
//! [`Message`]s through [`GameEngine`]; identical input yields identical
//! state. Local decisions (selectors, activations in progress) live beside
//! the replicated state in [`input::LocalInput`] and never reach the wire
//! until they resolve into a single message.
pub mod ability;
pub mod action;
pub mod cards;
pub mod config;
pub mod engine;
pub mod error;
pub mod essence;
pub mod input;
pub mod registry;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use ability::{
    AbilityAction, AbilityEffect, AbilityError, AbilityStatus, Activation, EffectSummary,
    FixedRoll, RollSource,
};
pub use action::{ActionKey, ActionTransition, Message, SenderRule};
pub use cards::{CardCatalog, CardTemplate, Location, Tappable, TappableKind};
pub use config::GameConfig;
pub use engine::{ApplyError, ApplyOutcome, GameEngine, GameEvent, TransitionPhase, TransitionPhaseError};
pub use error::{ErrorSeverity, GameError};
pub use essence::{EssenceKind, EssenceMask, EssenceParseError, EssenceSelection};
pub use input::{InputError, LocalInput, Requester, SelectionResult, SelectorKind};
pub use registry::{AbilityId, EntityRegistry, PlayerId, RegistryError, TappableId};
pub use state::{GameState, Phase, Player, StateSnapshot};
