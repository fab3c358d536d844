//! Phase and turn scheduling.
//!
//! These functions are the only code that moves `state.phase` forward after
//! the lobby. Transitions call them from `apply`; the engine calls [`settle`]
//! after every applied action.
use tracing::{debug, info, warn};

use super::GameEvent;
use crate::action::AttackReply;
use crate::cards::{Location, TappableKind};
use crate::essence::EssenceSelection;
use crate::registry::{AbilityId, PlayerId, TappableId};
use crate::state::{DraftStage, GameState, PendingAttack, Phase, TurnState};

// ===== draft =====

pub(crate) fn begin_draft(state: &mut GameState) {
    state.phase = Phase::Draft(DraftStage::Mages);
    info!(target: "arcana::draft", players = state.player_count(), "draft started");
    state.emit(GameEvent::DraftStarted);
    progress_draft(state);
}

/// Puts a drafted card on the player's table. Keeping a mage returns the
/// other offered mages to the supply.
pub(crate) fn draft_pick(state: &mut GameState, player: PlayerId, card: TappableId) {
    match state.phase {
        Phase::Draft(DraftStage::Mages) => {
            let offered: Vec<TappableId> = state
                .player(player)
                .map(|seat| seat.offered_mages.iter().copied().collect())
                .unwrap_or_default();
            state.move_card(card, Location::InPlay(player));
            for other in offered.into_iter().filter(|id| *id != card) {
                state.move_card(other, Location::Supply);
            }
        }
        Phase::Draft(DraftStage::MagicItems { .. }) => {
            state.move_card(card, Location::InPlay(player));
        }
        other => warn!(target: "arcana::draft", phase = %other, %player, "pick outside the draft"),
    }
}

/// Moves the draft along as far as it can go without player input.
///
/// Disconnected players pick automatically: their first offered mage and the
/// first magic item left in the supply.
pub(crate) fn progress_draft(state: &mut GameState) {
    loop {
        match state.phase {
            Phase::Draft(DraftStage::Mages) => {
                let absent: Vec<(PlayerId, TappableId)> = state
                    .players
                    .iter()
                    .filter(|seat| seat.disconnected && seat.mage.is_none())
                    .filter_map(|seat| seat.offered_mages.first().map(|mage| (seat.id, *mage)))
                    .collect();
                for (player, mage) in absent {
                    draft_pick(state, player, mage);
                }
                let done = state
                    .players
                    .iter()
                    .all(|seat| seat.mage.is_some() || seat.offered_mages.is_empty());
                if !done {
                    return;
                }
                let Some(last) = state.players.iter().last().map(|seat| seat.id) else {
                    return;
                };
                state.phase = Phase::Draft(DraftStage::MagicItems { picking: last });
            }
            Phase::Draft(DraftStage::MagicItems { picking }) => {
                let Some(seat) = state.player(picking) else {
                    return;
                };
                let (has_item, disconnected) = (seat.magic_item.is_some(), seat.disconnected);
                if !has_item {
                    let first_free = state.supply_of(TappableKind::MagicItem).first().copied();
                    match first_free {
                        None => {
                            warn!(target: "arcana::draft", player = %picking, "no magic item left");
                        }
                        Some(item) if disconnected => draft_pick(state, picking, item),
                        Some(_) => return,
                    }
                }
                if picking.0 == 0 {
                    state.emit(GameEvent::DraftFinished);
                    begin_first_round(state);
                    return;
                }
                state.phase = Phase::Draft(DraftStage::MagicItems {
                    picking: PlayerId(picking.0 - 1),
                });
            }
            _ => return,
        }
    }
}

fn begin_first_round(state: &mut GameState) {
    state.turn = TurnState {
        round: 1,
        ..TurnState::default()
    };
    state.emit(GameEvent::RoundStarted { round: 1 });
    begin_income(state);
}

// ===== income =====

pub(crate) fn begin_income(state: &mut GameState) {
    state.phase = Phase::Income;
    let round = state.turn.round;
    for seat in state.players.iter_mut() {
        seat.income_resolved = false;
    }
    debug!(target: "arcana::income", round, "income started");
    state.emit(GameEvent::IncomeStarted { round });

    let absent: Vec<PlayerId> = state
        .players
        .iter()
        .filter(|seat| seat.disconnected)
        .map(|seat| seat.id)
        .collect();
    for player in absent {
        auto_collect(state, player);
    }
    progress_income(state);
}

/// Adds the player's income. `choices` settles indeterminate sources and
/// has already been checked; an open source without a choice collects its
/// default resolution.
pub(crate) fn collect_income(
    state: &mut GameState,
    player: PlayerId,
    choices: &[(TappableId, EssenceSelection)],
) {
    let mut gained = EssenceSelection::zero();
    for (card, collect) in state.income_sources(player) {
        let settled = if collect.is_determined() {
            collect
        } else {
            choices
                .iter()
                .find(|(source, _)| *source == card)
                .map_or_else(|| collect.default_resolution(), |(_, choice)| *choice)
        };
        gained.add(&settled.determined_part());
    }
    if let Some(seat) = state.player_mut(player) {
        seat.essences.add(&gained);
        seat.income_resolved = true;
    }
    debug!(target: "arcana::income", %player, %gained, "income collected");
}

fn auto_collect(state: &mut GameState, player: PlayerId) {
    collect_income(state, player, &[]);
}

pub(crate) fn progress_income(state: &mut GameState) {
    if state.phase == Phase::Income && state.players.iter().all(|seat| seat.income_resolved) {
        begin_turns(state);
    }
}

// ===== turns =====

/// First active seat in turn order after `from`, wrapping around to `from`
/// itself last. With `inclusive`, `from` is considered first instead.
fn next_active(state: &GameState, from: PlayerId, inclusive: bool) -> Option<PlayerId> {
    let order: Vec<PlayerId> = if inclusive {
        state.seats_from(from).collect()
    } else {
        state
            .seats_from(from)
            .skip(1)
            .chain(std::iter::once(from))
            .collect()
    };
    order
        .into_iter()
        .find(|id| state.player(*id).is_some_and(|seat| seat.is_active()))
}

fn begin_turns(state: &mut GameState) {
    state.phase = Phase::Turns;
    state.turn.turn = 0;
    state.turn.awaiting_advance = false;
    let round = state.turn.round;
    state.emit(GameEvent::TurnsStarted { round });
    match next_active(state, state.turn.first_player, true) {
        Some(current) => {
            state.turn.current = current;
            info!(target: "arcana::turn", round, %current, "turns started");
            state.emit(GameEvent::TurnAdvanced { current });
        }
        None => end_round(state),
    }
}

/// Moves to the next turn once the current one is spent and no attack
/// response is outstanding.
pub(crate) fn settle(state: &mut GameState) {
    if state.phase == Phase::Turns
        && state.turn.awaiting_advance
        && state.pending_attacks.is_empty()
    {
        advance_turn(state);
    }
}

fn advance_turn(state: &mut GameState) {
    let previous = state.turn.current;
    state.turn.awaiting_advance = false;
    state.turn.turn += 1;
    match next_active(state, previous, false) {
        Some(current) => {
            state.turn.current = current;
            if current != previous {
                state.abort_turn_input();
            }
            debug!(
                target: "arcana::turn",
                turn = state.turn.turn,
                %current,
                "turn advanced"
            );
            state.emit(GameEvent::TurnAdvanced { current });
        }
        None => {
            state.abort_turn_input();
            end_round(state);
        }
    }
}

fn end_round(state: &mut GameState) {
    let round = state.turn.round;
    info!(target: "arcana::turn", round, "round ended");
    state.emit(GameEvent::RoundEnded { round });
    if check_game_end(state) {
        return;
    }
    state.phase = Phase::RoundEnd;
    for seat in state.players.iter_mut() {
        seat.voted_next_round = seat.disconnected;
    }
    if votes_missing(state) == 0 {
        state.emit(GameEvent::RoundVotesComplete { round });
    }
}

// ===== rounds and victory =====

/// Connected players that have not voted for the next round.
pub fn votes_missing(state: &GameState) -> usize {
    state
        .connected_players()
        .filter(|seat| !seat.voted_next_round)
        .count()
}

pub(crate) fn next_round(state: &mut GameState) {
    for card in state.tappables.iter_mut() {
        if matches!(card.location, Location::InPlay(_)) {
            card.untap();
        }
    }
    for seat in state.players.iter_mut() {
        seat.passed = seat.disconnected;
        seat.voted_next_round = false;
    }
    state.turn.round += 1;
    if let Some(first) = state.turn.next_first_player.take() {
        state.turn.first_player = first;
    }
    let round = state.turn.round;
    info!(
        target: "arcana::turn",
        round,
        first_player = %state.turn.first_player,
        "round started"
    );
    state.emit(GameEvent::RoundStarted { round });
    begin_income(state);
}

/// Best connected player: most points, then most essences, then earliest
/// in turn order from the first player.
pub fn winner(state: &GameState) -> Option<PlayerId> {
    let mut best: Option<(PlayerId, (i32, i32))> = None;
    for id in state.seats_from(state.turn.first_player) {
        if !state.player(id).is_some_and(|seat| seat.is_connected()) {
            continue;
        }
        let score = (state.points(id), state.essence_total(id));
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((id, score));
        }
    }
    best.map(|(id, _)| id)
}

/// Ends the game if a connected player has reached the win threshold.
pub(crate) fn check_game_end(state: &mut GameState) -> bool {
    if state.phase.is_game_over() {
        return true;
    }
    let threshold = state.config.win_points;
    let reached = state
        .connected_players()
        .any(|seat| state.points(seat.id) >= threshold);
    if !reached {
        return false;
    }
    let winner = winner(state);
    state.phase = Phase::GameOver { winner };
    state.pending_attacks.clear();
    state.clear_local_input();
    info!(target: "arcana::turn", ?winner, threshold, "victory threshold reached");
    state.emit(GameEvent::GameOver { winner });
    true
}

// ===== disconnects =====

/// Marks a player as gone for good and makes every pending decision of
/// theirs automatically.
pub(crate) fn retire_player(state: &mut GameState, player: PlayerId) {
    let Some(seat) = state.player_mut(player) else {
        return;
    };
    if seat.disconnected {
        return;
    }
    seat.disconnected = true;
    seat.passed = true;
    let income_pending = !seat.income_resolved;
    info!(target: "arcana::session", %player, phase = %state.phase, "player disconnected");
    state.emit(GameEvent::PlayerDisconnected { player });
    if state.local.player == Some(player) {
        state.clear_local_input();
    }

    match state.phase {
        Phase::Draft(_) => progress_draft(state),
        Phase::Income => {
            if income_pending {
                auto_collect(state, player);
            }
            progress_income(state);
        }
        Phase::Turns => {
            let (own, rest): (Vec<PendingAttack>, Vec<PendingAttack>) = state
                .pending_attacks
                .drain(..)
                .partition(|attack| attack.victim == player);
            state.pending_attacks = rest.into();
            for attack in &own {
                suffer(state, attack);
            }
            if state.turn.current == player {
                state.turn.awaiting_advance = true;
            }
        }
        Phase::RoundEnd => {
            if let Some(seat) = state.player_mut(player) {
                seat.voted_next_round = true;
            }
            if votes_missing(state) == 0 {
                let round = state.turn.round;
                state.emit(GameEvent::RoundVotesComplete { round });
            }
        }
        Phase::Lobby | Phase::Setup | Phase::GameOver { .. } => {}
    }
}

// ===== attacks =====

/// Opens an attack against every opponent. Disconnected opponents suffer
/// immediately. Returns the number of responses now awaited.
pub(crate) fn open_attack(
    state: &mut GameState,
    ability: AbilityId,
    attacker: PlayerId,
    loss: EssenceSelection,
) -> usize {
    let victims: Vec<(PlayerId, bool)> = state
        .seats_from(attacker)
        .skip(1)
        .filter_map(|id| state.player(id).map(|seat| (id, seat.disconnected)))
        .collect();
    let mut opened = 0;
    for (victim, disconnected) in victims {
        let attack = PendingAttack {
            ability,
            attacker,
            victim,
            loss,
        };
        if disconnected {
            suffer(state, &attack);
        } else {
            state.pending_attacks.push_back(attack);
            state.emit(GameEvent::AttackOpened { ability, victim });
            opened += 1;
        }
    }
    opened
}

pub(crate) fn resolve_attack(
    state: &mut GameState,
    ability: AbilityId,
    victim: PlayerId,
    reply: AttackReply,
) {
    let Some(index) = state
        .pending_attacks
        .iter()
        .position(|attack| attack.ability == ability && attack.victim == victim)
    else {
        warn!(target: "arcana::attack", %ability, %victim, "no such pending attack");
        return;
    };
    let Some(attack) = state.pending_attacks.remove(index) else {
        return;
    };
    match reply {
        AttackReply::Protect(card) => {
            if let Some(protector) = state.tappable_mut(card) {
                protector.tap();
            }
            debug!(target: "arcana::attack", %ability, %victim, %card, "attack blocked");
            state.emit(GameEvent::AttackResolved {
                ability,
                victim,
                protected_by: Some(card),
            });
        }
        AttackReply::Suffer => suffer(state, &attack),
    }
}

/// The victim loses the attack's determined essences, as far as held.
fn suffer(state: &mut GameState, attack: &PendingAttack) {
    if let Some(seat) = state.player_mut(attack.victim) {
        let lost = attack.loss.clamp_to(&seat.essences);
        seat.essences.subtract(&lost);
        debug!(
            target: "arcana::attack",
            ability = %attack.ability,
            victim = %attack.victim,
            %lost,
            "attack suffered"
        );
    }
    state.emit(GameEvent::AttackResolved {
        ability: attack.ability,
        victim: attack.victim,
        protected_by: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{IncomeDone, NextRound, PlayerAction, UserInputOverwrite, VoteNextRound};
    use crate::cards::Location;
    use crate::testing::TestTable;

    fn pass(table: &mut TestTable, player: PlayerId) {
        let client = table.client_of(player);
        table.apply_from(client, UserInputOverwrite::Player {
            player,
            action: PlayerAction::Pass { magic_item: None },
        });
    }

    #[test]
    fn start_reaches_the_first_turn() {
        let mut table = TestTable::three_players();
        table.start();
        assert_eq!(table.state.phase, Phase::Turns);
        assert_eq!(table.state.turn.round, 1);
        assert_eq!(table.state.turn.current, PlayerId(0));
        for seat in table.state.players.iter() {
            assert!(seat.mage.is_some());
            assert!(seat.magic_item.is_some());
            assert!(seat.offered_mages.is_empty());
        }
    }

    #[test]
    fn round_ends_when_everyone_passed() {
        let mut table = TestTable::three_players();
        table.start();
        for seat in 0..3 {
            pass(&mut table, PlayerId(seat));
        }
        assert_eq!(table.state.phase, Phase::RoundEnd);
        assert_eq!(votes_missing(&table.state), 3);
    }

    #[test]
    fn first_passer_leads_the_next_round() {
        let mut table = TestTable::three_players();
        table.start();
        let card = table.state.player(PlayerId(0)).unwrap().hand[0];
        table.apply_from(10, UserInputOverwrite::Card {
            player: PlayerId(0),
            card,
            action: crate::action::CardAction::Discard {
                gain: EssenceSelection::of(crate::essence::EssenceKind::Gold, 1),
            },
        });
        pass(&mut table, PlayerId(1));
        pass(&mut table, PlayerId(2));
        pass(&mut table, PlayerId(0));
        assert_eq!(table.state.phase, Phase::RoundEnd);
        for seat in 0..3 {
            let client = table.client_of(PlayerId(seat));
            table.apply_from(client, VoteNextRound {
                player: PlayerId(seat),
            });
        }
        table.apply_from(10, NextRound { round: 2 });
        assert_eq!(table.state.phase, Phase::Income);
        assert_eq!(table.state.turn.round, 2);
        assert_eq!(table.state.turn.first_player, PlayerId(1));
        assert!(table.state.players.iter().all(|seat| !seat.passed));
    }

    #[test]
    fn next_round_needs_every_vote() {
        let mut table = TestTable::three_players();
        table.start();
        for seat in 0..3 {
            pass(&mut table, PlayerId(seat));
        }
        table.apply_from(10, VoteNextRound {
            player: PlayerId(0),
        });
        assert!(table.apply_from(10, NextRound { round: 2 }).is_none());
        assert_eq!(table.state.phase, Phase::RoundEnd);
    }

    #[test]
    fn disconnected_players_are_skipped_and_auto_voted() {
        let mut table = TestTable::three_players();
        table.start();
        retire_player(&mut table.state, PlayerId(1));
        pass(&mut table, PlayerId(0));
        assert_eq!(table.state.turn.current, PlayerId(2));
        pass(&mut table, PlayerId(2));
        assert_eq!(table.state.phase, Phase::RoundEnd);
        assert_eq!(votes_missing(&table.state), 2);
    }

    #[test]
    fn retiring_the_current_player_moves_the_turn() {
        let mut table = TestTable::three_players();
        table.start();
        table.apply_from(10, crate::action::Disconnect {
            player: PlayerId(0),
        });
        assert_eq!(table.state.turn.current, PlayerId(1));
        assert_eq!(table.state.designated_client(), Some(11));
    }

    #[test]
    fn ties_go_to_essences_then_turn_order() {
        let mut table = TestTable::three_players();
        table.start();
        for seat in table.state.players.iter_mut() {
            seat.essences = EssenceSelection::zero();
        }
        assert_eq!(winner(&table.state), Some(PlayerId(0)));
        table.state.player_mut(PlayerId(2)).unwrap().essences =
            EssenceSelection::of(crate::essence::EssenceKind::Gold, 1);
        assert_eq!(winner(&table.state), Some(PlayerId(2)));
        table.state.turn.first_player = PlayerId(1);
        table.state.player_mut(PlayerId(2)).unwrap().essences = EssenceSelection::zero();
        assert_eq!(winner(&table.state), Some(PlayerId(1)));
    }

    #[test]
    fn illegal_income_choices_are_rejected() {
        let mut table = TestTable::three_players();
        table.start_until_income();
        let player = PlayerId(0);
        let open: Vec<_> = table
            .state
            .income_sources(player)
            .into_iter()
            .filter(|(_, collect)| !collect.is_determined())
            .collect();
        let (card, _) = *open.first().expect("fixture mage collects an open amount");
        let before = table.state.player(player).unwrap().essences;

        let overdrawn = vec![(card, EssenceSelection::of(crate::essence::EssenceKind::Gold, 9))];
        assert!(table.apply_from(10, IncomeDone { player, choices: overdrawn }).is_none());
        assert!(table.apply_from(10, IncomeDone { player, choices: Vec::new() }).is_none());
        let seat = table.state.player(player).unwrap();
        assert_eq!(seat.essences, before);
        assert!(!seat.income_resolved);

        let legal = open
            .iter()
            .map(|(card, collect)| (*card, collect.default_resolution()))
            .collect();
        assert!(table.apply_from(10, IncomeDone { player, choices: legal }).is_some());
        assert!(table.state.player(player).unwrap().income_resolved);
    }

    #[test]
    fn mage_pick_returns_the_other_offer_to_supply() {
        let mut table = TestTable::three_players();
        table.start_until_draft();
        let offered: Vec<TappableId> = table
            .state
            .player(PlayerId(1))
            .unwrap()
            .offered_mages
            .iter()
            .copied()
            .collect();
        table.apply_from(11, crate::action::DraftAction {
            player: PlayerId(1),
            card: offered[1],
        });
        assert_eq!(
            table.state.tappable(offered[0]).unwrap().location,
            Location::Supply
        );
        assert_eq!(table.state.player(PlayerId(1)).unwrap().mage, Some(offered[1]));
    }
}
