//! Fixture catalog and scripted table setup for tests.
//!
//! Available to this crate's unit tests and, through the `testing` feature,
//! to downstream integration tests.
use std::sync::Arc;

use crate::ability::AbilityEffect;
use crate::action::{
    AddPlayer, DealCards, DraftAction, GameStart, IncomeDone, Message, Shuffle, ShuffleKind,
};
use crate::cards::{AbilityTemplate, Capabilities, CardCatalog, CardTemplate, TappableKind};
use crate::config::GameConfig;
use crate::engine::ApplyOutcome;
use crate::essence::{EssenceKind, EssenceSelection};
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::{DraftStage, GameState, Phase};

use EssenceKind::{Calm, Death, Elan, Gold, Life};

fn card(key: &str, kind: TappableKind) -> CardTemplate {
    CardTemplate {
        key: key.to_string(),
        name: key.replace('_', " "),
        kind,
        cost: EssenceSelection::zero(),
        points: 0,
        capabilities: Capabilities::empty(),
        collect: EssenceSelection::zero(),
        points_per_stored: None,
        abilities: Vec::new(),
    }
}

fn costing(mut template: CardTemplate, cost: EssenceSelection) -> CardTemplate {
    template.cost = cost;
    template
}

fn with_ability(mut template: CardTemplate, ability: AbilityTemplate) -> CardTemplate {
    template.abilities.push(ability);
    template
}

/// Small catalog that covers every card kind and the common effects.
///
/// Every mage collects one elan plus one essence of any kind, and can pay
/// any two essences for one gold. Mages and magic items are worth no points.
pub fn fixture_catalog() -> CardCatalog {
    let artifact = |key: &str| card(key, TappableKind::Artifact);

    let artifacts = vec![
        with_ability(
            costing(artifact("elvish_bow"), EssenceSelection::from_pairs(&[(Elan, 2), (Life, 1)])),
            AbilityTemplate::new(AbilityEffect::Attack {
                loss: EssenceSelection::of(Life, 1),
                gain: EssenceSelection::zero(),
            }),
        ),
        with_ability(
            costing(artifact("guard_dog"), EssenceSelection::of(Elan, 1)),
            AbilityTemplate::new(AbilityEffect::Protect).without_tap(),
        ),
        with_ability(
            costing(artifact("fountain"), EssenceSelection::of(Calm, 1)),
            AbilityTemplate::new(AbilityEffect::Draw { count: 1 }),
        ),
        with_ability(
            costing(artifact("alchemy_set"), EssenceSelection::of(Gold, 1)),
            AbilityTemplate::new(AbilityEffect::Convert {
                excluded: Gold.mask(),
            })
            .with_cost(EssenceSelection::any(2)),
        ),
        with_ability(
            costing(artifact("jeweled_statuette"), EssenceSelection::of(Death, 2)),
            AbilityTemplate::new(AbilityEffect::Sacrifice {
                bonus: EssenceSelection::of(Gold, 1),
            }),
        ),
        with_ability(
            costing(artifact("cursed_skull"), EssenceSelection::of(Death, 2)),
            AbilityTemplate::new(AbilityEffect::Drain {
                kind: Life,
                amount: 1,
            }),
        ),
        with_ability(
            costing(artifact("crypt_urn"), EssenceSelection::of(Death, 1)),
            AbilityTemplate::new(AbilityEffect::StoreOnSelf {
                amount: EssenceSelection::of(Death, 1),
            }),
        ),
        with_ability(
            costing(artifact("ancient_vault"), EssenceSelection::of(Gold, 1)),
            AbilityTemplate::new(AbilityEffect::CollectStored),
        ),
        with_ability(
            costing(artifact("windup_man"), EssenceSelection::from_pairs(&[(Elan, 1), (Gold, 1)])),
            AbilityTemplate::new(AbilityEffect::Untap),
        ),
        with_ability(
            costing(artifact("hand_of_glory"), EssenceSelection::of(Life, 2)),
            AbilityTemplate::new(AbilityEffect::Foresee { depth: 2 }),
        ),
        with_ability(
            costing(artifact("dancing_sword"), EssenceSelection::from_pairs(&[(Gold, 1), (Elan, 1)])),
            AbilityTemplate::new(AbilityEffect::DestroyOther)
                .with_cost(EssenceSelection::of(Death, 1)),
        ),
        with_ability(
            costing(artifact("fiery_whip"), EssenceSelection::from_pairs(&[(Elan, 2), (Death, 2)])),
            AbilityTemplate::new(AbilityEffect::Share {
                gain: EssenceSelection::of(Elan, 3),
                others: EssenceSelection::of(Elan, 1),
            }),
        ),
        with_ability(
            costing(artifact("dice_of_fate"), EssenceSelection::any(1)),
            AbilityTemplate::new(AbilityEffect::Gamble {
                outcomes: vec![
                    EssenceSelection::of(Gold, 1),
                    EssenceSelection::any(2),
                    EssenceSelection::zero(),
                ],
            }),
        ),
        with_ability(
            costing(artifact("philosophers_stone"), EssenceSelection::from_pairs(&[(Elan, 2), (Life, 2)])),
            AbilityTemplate::new(AbilityEffect::CostReduction {
                reduction: EssenceSelection::any(1),
                applies_to: Capabilities::empty(),
            }),
        ),
        with_ability(
            costing(artifact("chalice_of_life"), EssenceSelection::from_pairs(&[(Calm, 1), (Life, 1)])),
            AbilityTemplate::new(AbilityEffect::Produce {
                output: EssenceSelection::of(Life, 2),
            }),
        ),
    ];

    let mages = [
        "alchemist",
        "bard",
        "healer",
        "necromancer",
        "witch",
        "seer",
        "transmuter",
        "duelist",
    ]
    .into_iter()
    .map(|key| {
        let mut mage = with_ability(
            card(key, TappableKind::Mage),
            AbilityTemplate::new(AbilityEffect::Produce {
                output: EssenceSelection::of(Gold, 1),
            })
            .with_cost(EssenceSelection::any(2)),
        );
        mage.collect = EssenceSelection::of(Elan, 1);
        mage.collect.set_indeterminate(1);
        mage
    })
    .collect();

    let magic_items = ["alchemy", "divination", "protection", "reanimate", "research"]
        .into_iter()
        .map(|key| {
            let mut item = card(key, TappableKind::MagicItem);
            if key == "protection" {
                item.capabilities = Capabilities::PROTECTS;
            } else {
                item.collect = EssenceSelection::of(Calm, 1);
            }
            item
        })
        .collect();

    let mut monuments = Vec::new();
    for (key, points) in [("colossus", 2), ("great_pyramid", 3), ("obelisk", 1)] {
        let mut monument = costing(card(key, TappableKind::Monument), EssenceSelection::of(Gold, 4));
        monument.points = points;
        monuments.push(monument);
    }

    let mut sacred_grove = costing(
        card("sacred_grove", TappableKind::PowerPlace),
        EssenceSelection::from_pairs(&[(Elan, 8), (Life, 4)]),
    );
    sacred_grove.points = 2;
    let mut crystal_keep = costing(
        card("crystal_keep", TappableKind::PowerPlace),
        EssenceSelection::from_pairs(&[(Gold, 3), (Calm, 3)]),
    );
    crystal_keep.points_per_stored = Some(Calm);
    let crystal_keep = with_ability(
        crystal_keep,
        AbilityTemplate::new(AbilityEffect::StoreOnSelf {
            amount: EssenceSelection::of(Calm, 1),
        })
        .with_cost(EssenceSelection::of(Calm, 1)),
    );

    let scrolls = vec![with_ability(
        costing(card("scroll_of_fortune", TappableKind::Scroll), EssenceSelection::of(Gold, 1)),
        AbilityTemplate::new(AbilityEffect::TakeFirstPlayer).one_shot(),
    )];

    CardCatalog {
        artifacts,
        mages,
        magic_items,
        monuments,
        power_places: vec![sacred_grove, crystal_keep],
        scrolls,
    }
}

/// One client's view of a table, driven through the engine.
pub struct TestTable {
    pub state: GameState,
}

impl TestTable {
    pub fn new(catalog: CardCatalog) -> Self {
        Self {
            state: GameState::new(GameConfig::default(), Arc::new(catalog)),
        }
    }

    /// Seats `client` through an `add_player` action.
    pub fn seat(&mut self, client: u32, name: &str) -> PlayerId {
        self.apply_from(client, AddPlayer {
            client_id: client,
            name: name.to_string(),
        })
        .and_then(|_| self.state.player_by_client(client))
        .expect("seat is free")
    }

    /// Three seats held by clients 10, 11 and 12.
    pub fn three_players() -> Self {
        let mut table = Self::new(fixture_catalog());
        for (client, name) in [(10, "ana"), (11, "bo"), (12, "cy")] {
            table.seat(client, name);
        }
        table
    }

    pub fn client_of(&self, player: PlayerId) -> u32 {
        self.state.player(player).expect("player is seated").client_id
    }

    pub fn apply_from(&mut self, client: u32, message: impl Into<Message>) -> Option<ApplyOutcome> {
        self.state.apply_action(&message.into(), client)
    }

    fn designated(&self) -> u32 {
        self.state.designated_client().expect("someone is connected")
    }

    /// Every artifact id in arena order.
    pub fn artifact_ids(&self) -> Vec<TappableId> {
        self.state
            .tappables
            .iter()
            .filter(|card| card.kind == TappableKind::Artifact)
            .map(|card| card.id)
            .collect()
    }

    /// The first ability on `player`'s mage.
    pub fn mage_ability(&self, player: PlayerId) -> AbilityId {
        let mage = self
            .state
            .player(player)
            .and_then(|seat| seat.mage)
            .expect("player has drafted a mage");
        self.state.tappable(mage).expect("mage exists").abilities[0]
    }

    /// Starts the game and deals, stopping when mages are offered.
    pub fn start_until_draft(&mut self) {
        let designated = self.designated();
        self.apply_from(designated, GameStart).expect("game starts");

        let artifacts = self.artifact_ids();
        self.apply_from(designated, Shuffle {
            kind: ShuffleKind::Initial,
            player: None,
            order: artifacts,
        })
        .expect("initial shuffle applies");

        let seats: Vec<PlayerId> = self.state.players.iter().map(|seat| seat.id).collect();
        for player in seats {
            let deck = &self.state.player(player).expect("seated").deck;
            let count = self.state.config.starting_hand.min(deck.len());
            let cards = deck[..count].to_vec();
            self.apply_from(designated, DealCards { player, cards })
                .expect("deal applies");
        }

        let mages = self
            .state
            .tappables
            .iter()
            .filter(|card| card.kind == TappableKind::Mage)
            .map(|card| card.id)
            .collect();
        self.apply_from(designated, Shuffle {
            kind: ShuffleKind::Draft,
            player: None,
            order: mages,
        })
        .expect("draft shuffle applies");
        assert_eq!(self.state.phase, Phase::Draft(DraftStage::Mages));
    }

    /// Runs the draft: every seat keeps its first offered mage, then takes
    /// the first free magic item when its pick comes up.
    pub fn start_until_income(&mut self) {
        self.start_until_draft();
        let seats: Vec<PlayerId> = self.state.players.iter().map(|seat| seat.id).collect();
        for player in seats {
            let card = self.state.player(player).expect("seated").offered_mages[0];
            let client = self.client_of(player);
            self.apply_from(client, DraftAction { player, card })
                .expect("mage pick applies");
        }
        while let Phase::Draft(DraftStage::MagicItems { picking }) = self.state.phase {
            let card = self.state.supply_of(TappableKind::MagicItem)[0];
            let client = self.client_of(picking);
            self.apply_from(client, DraftAction {
                player: picking,
                card,
            })
            .expect("item pick applies");
        }
        assert_eq!(self.state.phase, Phase::Income);
    }

    /// Full setup through the first income, ending on seat 0's first turn.
    pub fn start(&mut self) {
        self.start_until_income();
        let seats: Vec<PlayerId> = self.state.players.iter().map(|seat| seat.id).collect();
        for player in seats {
            let choices = self
                .state
                .income_sources(player)
                .into_iter()
                .filter(|(_, collect)| !collect.is_determined())
                .map(|(card, collect)| (card, collect.default_resolution()))
                .collect();
            let client = self.client_of(player);
            self.apply_from(client, IncomeDone { player, choices })
                .expect("income applies");
        }
        assert_eq!(self.state.phase, Phase::Turns);
    }
}
