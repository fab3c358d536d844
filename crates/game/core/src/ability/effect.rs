use crate::cards::{Capabilities, Location, TappableKind};
use crate::essence::{EssenceKind, EssenceMask, EssenceSelection};
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::GameState;

/// Closed set of ability behaviours.
///
/// Amounts that are indeterminate in the catalog are settled by the
/// activating player through an output selector before broadcast.
#[derive(Clone, Debug, PartialEq, Eq, strum::AsRefStr, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AbilityEffect {
    /// Gain `output`.
    Produce { output: EssenceSelection },
    /// Gain as many essences as were paid, on kinds outside `excluded`.
    Convert { excluded: EssenceMask },
    /// Place `amount` on this card.
    StoreOnSelf { amount: EssenceSelection },
    /// Place `amount` on another of the owner's cards.
    StoreOnOther { amount: EssenceSelection },
    /// Take every essence stored on this card.
    CollectStored,
    /// Every opponent loses `loss` unless they protect; the owner gains `gain`.
    Attack {
        loss: EssenceSelection,
        #[cfg_attr(feature = "serde", serde(default))]
        gain: EssenceSelection,
    },
    Draw { count: u8 },
    /// Take one of the top `depth` deck cards into hand.
    Foresee { depth: u8 },
    /// Take a card from the discard pile into hand.
    Retrieve,
    /// Discard a card from hand and gain `gain`.
    DiscardForGain { gain: EssenceSelection },
    /// Destroy another of the owner's artifacts; gain its cost in any kinds
    /// plus `bonus`.
    Sacrifice {
        #[cfg_attr(feature = "serde", serde(default))]
        bonus: EssenceSelection,
    },
    /// Destroy an opponent's artifact.
    DestroyOther,
    /// Untap another of the owner's cards.
    Untap,
    /// Untap all of the owner's other cards.
    Refresh,
    /// Take up to `amount` of `kind` from every opponent.
    Drain { kind: EssenceKind, amount: i32 },
    /// The owner gains `gain`; every other player gains `others`.
    Share {
        gain: EssenceSelection,
        others: EssenceSelection,
    },
    /// Gain `per` for every card the owner has in play with `capability`.
    GainPerCapability {
        capability: Capabilities,
        per: EssenceSelection,
    },
    /// Add victory points to one of the owner's cards.
    Ennoble { points: i32 },
    /// Claim the first-player token for next round.
    TakeFirstPlayer,
    /// Gain one of `outcomes`, chosen by a roll made by the activating client.
    Gamble { outcomes: Vec<EssenceSelection> },
    /// Turn every essence stored on another card into `into` in the pool.
    Transmute { into: EssenceKind },
    /// Passive: tap the card to ignore an attack.
    Protect,
    /// Passive: cheaper artifact plays for cards matching `applies_to`
    /// (every artifact when empty).
    CostReduction {
        reduction: EssenceSelection,
        #[cfg_attr(feature = "serde", serde(default))]
        applies_to: Capabilities,
    },
}

/// Which cards an effect may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetRule {
    /// Another card on the owner's table.
    OwnTableOther,
    /// Any non-mage card on the owner's table, this one included.
    OwnTable,
    /// One of the top `depth` cards of the owner's deck.
    DeckTop { depth: usize },
    OwnDiscard,
    OwnHand,
    /// Another artifact the owner has in play.
    OwnArtifactOther,
    OpponentArtifact,
    /// Another tapped card on the owner's table.
    OwnTappedOther,
    /// Another card on the owner's table that holds essences.
    OwnStoredOther,
}

impl AbilityEffect {
    /// Passive effects apply automatically and cannot be activated.
    pub fn is_passive(&self) -> bool {
        matches!(
            self,
            AbilityEffect::Protect | AbilityEffect::CostReduction { .. }
        )
    }

    pub fn target_rule(&self) -> Option<TargetRule> {
        match self {
            AbilityEffect::StoreOnOther { .. } => Some(TargetRule::OwnTableOther),
            AbilityEffect::Ennoble { .. } => Some(TargetRule::OwnTable),
            AbilityEffect::Foresee { depth } => Some(TargetRule::DeckTop {
                depth: usize::from(*depth),
            }),
            AbilityEffect::Retrieve => Some(TargetRule::OwnDiscard),
            AbilityEffect::DiscardForGain { .. } => Some(TargetRule::OwnHand),
            AbilityEffect::Sacrifice { .. } => Some(TargetRule::OwnArtifactOther),
            AbilityEffect::DestroyOther => Some(TargetRule::OpponentArtifact),
            AbilityEffect::Untap => Some(TargetRule::OwnTappedOther),
            AbilityEffect::Transmute { .. } => Some(TargetRule::OwnStoredOther),
            _ => None,
        }
    }

    /// Broadcasting this effect may push a player over the win threshold.
    pub fn is_game_ending(&self) -> bool {
        matches!(
            self,
            AbilityEffect::Ennoble { .. }
                | AbilityEffect::StoreOnSelf { .. }
                | AbilityEffect::StoreOnOther { .. }
        )
    }

    /// Number of distinct roll results, for effects that roll.
    pub fn roll_sides(&self) -> Option<u32> {
        match self {
            AbilityEffect::Gamble { outcomes } => Some(outcomes.len() as u32),
            _ => None,
        }
    }
}

impl GameState {
    /// Legal targets for an ability, in a stable order.
    pub fn target_candidates(&self, ability: AbilityId) -> Vec<TappableId> {
        let Some(entry) = self.ability(ability) else {
            return Vec::new();
        };
        let Some(rule) = entry.template.effect.target_rule() else {
            return Vec::new();
        };
        let Some(owner) = self.ability_owner(ability) else {
            return Vec::new();
        };
        let Some(seat) = self.player(owner) else {
            return Vec::new();
        };
        let source = entry.card;
        let card = move |id: &TappableId| self.tappable(*id);

        match rule {
            TargetRule::OwnTableOther => seat.table().filter(|id| *id != source).collect(),
            TargetRule::OwnTable => seat
                .table()
                .filter(|id| card(id).is_some_and(|c| c.kind != TappableKind::Mage))
                .collect(),
            TargetRule::DeckTop { depth } => seat.deck.iter().take(depth).copied().collect(),
            TargetRule::OwnDiscard => seat.discard.clone(),
            TargetRule::OwnHand => seat.hand.clone(),
            TargetRule::OwnArtifactOther => seat
                .in_play
                .iter()
                .copied()
                .filter(|id| *id != source)
                .filter(|id| card(id).is_some_and(|c| c.kind == TappableKind::Artifact))
                .collect(),
            TargetRule::OpponentArtifact => self
                .tappables
                .iter()
                .filter(|c| c.kind == TappableKind::Artifact)
                .filter(|c| matches!(c.location, Location::InPlay(holder) if holder != owner))
                .map(|c| c.id)
                .collect(),
            TargetRule::OwnTappedOther => seat
                .table()
                .filter(|id| *id != source)
                .filter(|id| card(id).is_some_and(|c| c.tapped))
                .collect(),
            TargetRule::OwnStoredOther => seat
                .table()
                .filter(|id| *id != source)
                .filter(|id| card(id).is_some_and(|c| !c.stored.is_zero()))
                .collect(),
        }
    }

    /// What the ability's `output` field must settle, given the choices made
    /// so far. `None` if the choices do not fit the effect.
    pub fn output_template(
        &self,
        ability: AbilityId,
        target: Option<TappableId>,
        cost: &EssenceSelection,
        roll: Option<u32>,
    ) -> Option<EssenceSelection> {
        let entry = self.ability(ability)?;
        let owner = self.ability_owner(ability)?;
        let template = match &entry.template.effect {
            AbilityEffect::Produce { output } => *output,
            AbilityEffect::Convert { excluded } => {
                EssenceSelection::any_except(cost.determined_total(), *excluded)
            }
            AbilityEffect::StoreOnSelf { amount } | AbilityEffect::StoreOnOther { amount } => {
                *amount
            }
            AbilityEffect::CollectStored => self.tappable(entry.card)?.stored,
            AbilityEffect::Attack { gain, .. } => *gain,
            AbilityEffect::DiscardForGain { gain } => *gain,
            AbilityEffect::Sacrifice { bonus } => {
                let sacrificed = self.tappable(target?)?.cost.total();
                EssenceSelection::any(sacrificed) + *bonus
            }
            AbilityEffect::Drain { kind, amount } => {
                let taken: i32 = self
                    .connected_players()
                    .filter(|seat| seat.id != owner)
                    .map(|seat| seat.essences.get(*kind).clamp(0, (*amount).max(0)))
                    .sum();
                EssenceSelection::of(*kind, taken)
            }
            AbilityEffect::Share { gain, .. } => *gain,
            AbilityEffect::GainPerCapability { capability, per } => {
                per.scale(self.count_with_capability(owner, *capability))
            }
            AbilityEffect::Gamble { outcomes } => *outcomes.get(roll? as usize)?,
            AbilityEffect::Transmute { into } => {
                let stored = self.tappable(target?)?.stored;
                EssenceSelection::of(*into, stored.determined_total())
            }
            AbilityEffect::Draw { .. }
            | AbilityEffect::Foresee { .. }
            | AbilityEffect::Retrieve
            | AbilityEffect::DestroyOther
            | AbilityEffect::Untap
            | AbilityEffect::Refresh
            | AbilityEffect::Ennoble { .. }
            | AbilityEffect::TakeFirstPlayer
            | AbilityEffect::Protect
            | AbilityEffect::CostReduction { .. } => EssenceSelection::zero(),
        };
        Some(template)
    }

    fn count_with_capability(&self, player: PlayerId, capability: Capabilities) -> i32 {
        self.player(player).map_or(0, |seat| {
            seat.table()
                .filter_map(|id| self.tappable(id))
                .filter(|card| card.capabilities.intersects(capability))
                .count() as i32
        })
    }
}
