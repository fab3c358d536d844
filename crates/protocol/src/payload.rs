//! Per-key payload layouts.
//!
//! | key               | payload                                                   |
//! |-------------------|-----------------------------------------------------------|
//! | `add_player`      | `name` (client id comes from the header)                  |
//! | `game_start`      | empty                                                     |
//! | `set_name`        | `player;name`                                             |
//! | `disconnect`      | `player`                                                  |
//! | `game_action`     | `ability;<ability>;<cost>;<output>;<target>;<roll>`       |
//! |                   | `card;<player>;<card>;<play\|buy\|discard>;<essences>`     |
//! |                   | `pass;<player>;<magic item>`                              |
//! | `shuffle`         | `<kind>;<player>;<card>,<card>,...`                       |
//! | `draft_action`    | `player;card`                                             |
//! | `deal_cards`      | `player;<card>,<card>,...`                                |
//! | `next_round`      | `round`                                                   |
//! | `vote_next_round` | `player`                                                  |
//! | `income_done`     | `player;<card>,<essences>;...`                            |
//! | `attack`          | `ability;victim;suffer` or `ability;victim;protect,<card>`|
//! | `control`         | `voter;vote_disconnect;<target>`                          |
//! | `checksum`        | `player;round;digest`                                     |
//!
//! Optional values are written as `-`.
use core::str::FromStr;

use arcana_core::action::{
    AddPlayer, AttackReply, AttackResponse, CardAction, Checksum, Control, ControlCommand,
    DealCards, Disconnect, DraftAction, GameStart, IncomeDone, NextRound, PlayerAction, SetName,
    Shuffle, UserInputOverwrite, VoteNextRound, sanitize_name,
};
use arcana_core::essence::EssenceSelection;
use arcana_core::registry::{AbilityId, EntityRef, EntityRegistry, PlayerId, TappableId};
use arcana_core::{AbilityAction, ActionKey, Message};

use crate::{NONE_MARK, PART_SEP, ProtocolError, VALUE_SEP};

pub(crate) fn encode(message: &Message, registry: &EntityRegistry) -> Result<String, ProtocolError> {
    let mut out = Parts::new(registry);
    match message {
        Message::AddPlayer(action) => {
            out.text(sanitize_name(&action.name));
        }
        Message::GameStart(GameStart) => {}
        Message::SetName(action) => {
            out.entity(action.player)?.text(sanitize_name(&action.name));
        }
        Message::Disconnect(action) => {
            out.entity(action.player)?;
        }
        Message::GameAction(overwrite) => encode_overwrite(&mut out, overwrite)?,
        Message::Shuffle(action) => {
            out.text(action.kind)
                .optional(action.player)?
                .list(&action.order)?;
        }
        Message::DraftAction(action) => {
            out.entity(action.player)?.entity(action.card)?;
        }
        Message::DealCards(action) => {
            out.entity(action.player)?.list(&action.cards)?;
        }
        Message::NextRound(action) => {
            out.text(action.round);
        }
        Message::VoteNextRound(action) => {
            out.entity(action.player)?;
        }
        Message::IncomeDone(action) => {
            out.entity(action.player)?;
            for (card, essences) in &action.choices {
                let card = out.identifier(*card)?;
                out.text(format!("{card}{VALUE_SEP}{essences}"));
            }
        }
        Message::Attack(action) => {
            out.entity(action.ability)?.entity(action.victim)?;
            match action.reply {
                AttackReply::Suffer => out.text("suffer"),
                AttackReply::Protect(card) => {
                    let card = out.identifier(card)?;
                    out.text(format!("protect{VALUE_SEP}{card}"))
                }
            };
        }
        Message::Control(action) => {
            out.entity(action.voter)?;
            match action.command {
                ControlCommand::VoteDisconnect { target } => {
                    out.text("vote_disconnect").entity(target)?;
                }
            }
        }
        Message::Checksum(action) => {
            out.entity(action.player)?
                .text(action.round)
                .text(&action.digest);
        }
    }
    Ok(out.finish())
}

fn encode_overwrite(out: &mut Parts<'_>, overwrite: &UserInputOverwrite) -> Result<(), ProtocolError> {
    match overwrite {
        UserInputOverwrite::Ability { ability, action } => {
            out.text("ability")
                .entity(*ability)?
                .text(action.cost)
                .text(action.output)
                .optional(action.target)?;
            match action.roll {
                Some(roll) => out.text(roll),
                None => out.text(NONE_MARK),
            };
        }
        UserInputOverwrite::Card {
            player,
            card,
            action,
        } => {
            let (verb, essences) = match action {
                CardAction::Play { payment } => ("play", payment),
                CardAction::Buy { payment } => ("buy", payment),
                CardAction::Discard { gain } => ("discard", gain),
            };
            out.text("card")
                .entity(*player)?
                .entity(*card)?
                .text(verb)
                .text(essences);
        }
        UserInputOverwrite::Player {
            player,
            action: PlayerAction::Pass { magic_item },
        } => {
            out.text("pass").entity(*player)?.optional(*magic_item)?;
        }
    }
    Ok(())
}

pub(crate) fn decode(
    key: ActionKey,
    client_id: u32,
    payload: &str,
    registry: &EntityRegistry,
) -> Result<Message, ProtocolError> {
    let input = Reader::new(key, payload, registry);
    let message: Message = match key {
        ActionKey::AddPlayer => {
            input.expect(1)?;
            AddPlayer {
                client_id,
                name: sanitize_name(input.part(0)?),
            }
            .into()
        }
        ActionKey::GameStart => {
            input.expect(0)?;
            GameStart.into()
        }
        ActionKey::SetName => {
            input.expect(2)?;
            SetName {
                player: input.player(0)?,
                name: sanitize_name(input.part(1)?),
            }
            .into()
        }
        ActionKey::Disconnect => {
            input.expect(1)?;
            Disconnect {
                player: input.player(0)?,
            }
            .into()
        }
        ActionKey::GameAction => decode_overwrite(&input)?.into(),
        ActionKey::Shuffle => {
            input.expect(3)?;
            Shuffle {
                kind: input.number(0, "shuffle kind")?,
                player: input.optional(1, |raw| registry.resolve_player(raw))?,
                order: input.tappables(2)?,
            }
            .into()
        }
        ActionKey::DraftAction => {
            input.expect(2)?;
            DraftAction {
                player: input.player(0)?,
                card: input.tappable(1)?,
            }
            .into()
        }
        ActionKey::DealCards => {
            input.expect(2)?;
            DealCards {
                player: input.player(0)?,
                cards: input.tappables(1)?,
            }
            .into()
        }
        ActionKey::NextRound => {
            input.expect(1)?;
            NextRound {
                round: input.number(0, "round")?,
            }
            .into()
        }
        ActionKey::VoteNextRound => {
            input.expect(1)?;
            VoteNextRound {
                player: input.player(0)?,
            }
            .into()
        }
        ActionKey::IncomeDone => {
            input.at_least(1)?;
            let choices = (1..input.len())
                .map(|index| -> Result<(TappableId, EssenceSelection), ProtocolError> {
                    let raw = input.part(index)?;
                    let (card, essences) = raw
                        .split_once(VALUE_SEP)
                        .ok_or_else(|| ProtocolError::bad("income choice", raw))?;
                    Ok((registry.resolve_tappable(card)?, essences.parse()?))
                })
                .collect::<Result<Vec<_>, _>>()?;
            IncomeDone {
                player: input.player(0)?,
                choices,
            }
            .into()
        }
        ActionKey::Attack => {
            input.expect(3)?;
            let raw = input.part(2)?;
            let reply = match raw.split_once(VALUE_SEP) {
                None if raw == "suffer" => AttackReply::Suffer,
                Some(("protect", card)) => AttackReply::Protect(registry.resolve_tappable(card)?),
                _ => return Err(ProtocolError::bad("attack reply", raw)),
            };
            AttackResponse {
                ability: input.ability(0)?,
                victim: input.player(1)?,
                reply,
            }
            .into()
        }
        ActionKey::Control => {
            input.expect(3)?;
            let command = match input.part(1)? {
                "vote_disconnect" => ControlCommand::VoteDisconnect {
                    target: input.player(2)?,
                },
                other => return Err(ProtocolError::bad("control command", other)),
            };
            Control {
                voter: input.player(0)?,
                command,
            }
            .into()
        }
        ActionKey::Checksum => {
            input.expect(3)?;
            let digest = input.part(2)?;
            if digest.is_empty() || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ProtocolError::bad("digest", digest));
            }
            Checksum {
                player: input.player(0)?,
                round: input.number(1, "round")?,
                digest: digest.to_string(),
            }
            .into()
        }
    };
    Ok(message)
}

fn decode_overwrite(input: &Reader<'_, '_>) -> Result<UserInputOverwrite, ProtocolError> {
    input.at_least(1)?;
    match input.part(0)? {
        "ability" => {
            input.expect(6)?;
            Ok(UserInputOverwrite::Ability {
                ability: input.ability(1)?,
                action: AbilityAction {
                    cost: input.essences(2)?,
                    output: input.essences(3)?,
                    target: input.optional(4, |raw| input.registry.resolve_tappable(raw))?,
                    roll: input.optional(5, |raw| {
                        raw.parse().map_err(|_| ProtocolError::bad("roll", raw))
                    })?,
                },
            })
        }
        "card" => {
            input.expect(5)?;
            let essences = input.essences(4)?;
            let action = match input.part(3)? {
                "play" => CardAction::Play { payment: essences },
                "buy" => CardAction::Buy { payment: essences },
                "discard" => CardAction::Discard { gain: essences },
                other => return Err(ProtocolError::bad("card action", other)),
            };
            Ok(UserInputOverwrite::Card {
                player: input.player(1)?,
                card: input.tappable(2)?,
                action,
            })
        }
        "pass" => {
            input.expect(3)?;
            Ok(UserInputOverwrite::Player {
                player: input.player(1)?,
                action: PlayerAction::Pass {
                    magic_item: input.optional(2, |raw| input.registry.resolve_tappable(raw))?,
                },
            })
        }
        other => Err(ProtocolError::bad("game action", other)),
    }
}

/// Collects payload parts, turning entities into identifiers.
struct Parts<'r> {
    registry: &'r EntityRegistry,
    parts: Vec<String>,
}

impl<'r> Parts<'r> {
    fn new(registry: &'r EntityRegistry) -> Self {
        Self {
            registry,
            parts: Vec::new(),
        }
    }

    fn identifier(&self, entity: impl Into<EntityRef>) -> Result<String, ProtocolError> {
        let entity = entity.into();
        self.registry
            .identifier(entity)
            .ok_or_else(|| ProtocolError::Unregistered(format!("{}#{}", entity.kind(), entity.index())))
    }

    fn text(&mut self, value: impl ToString) -> &mut Self {
        self.parts.push(value.to_string());
        self
    }

    fn entity(&mut self, entity: impl Into<EntityRef>) -> Result<&mut Self, ProtocolError> {
        let ident = self.identifier(entity)?;
        Ok(self.text(ident))
    }

    fn optional<E: Into<EntityRef>>(&mut self, entity: Option<E>) -> Result<&mut Self, ProtocolError> {
        match entity {
            Some(entity) => self.entity(entity),
            None => Ok(self.text(NONE_MARK)),
        }
    }

    fn list(&mut self, cards: &[TappableId]) -> Result<&mut Self, ProtocolError> {
        let idents = cards
            .iter()
            .map(|card| self.identifier(*card))
            .collect::<Result<Vec<_>, _>>()?;
        let sep = VALUE_SEP.to_string();
        Ok(self.text(idents.join(sep.as_str())))
    }

    fn finish(self) -> String {
        let sep = PART_SEP.to_string();
        self.parts.join(sep.as_str())
    }
}

/// Positional access to the parts of one payload.
struct Reader<'a, 'r> {
    key: &'static str,
    parts: Vec<&'a str>,
    registry: &'r EntityRegistry,
}

impl<'a, 'r> Reader<'a, 'r> {
    fn new(key: ActionKey, payload: &'a str, registry: &'r EntityRegistry) -> Self {
        let parts = if payload.is_empty() {
            Vec::new()
        } else {
            payload.split(PART_SEP).collect()
        };
        Self {
            key: key.into(),
            parts,
            registry,
        }
    }

    fn len(&self) -> usize {
        self.parts.len()
    }

    fn expect(&self, expected: usize) -> Result<(), ProtocolError> {
        if self.parts.len() == expected {
            Ok(())
        } else {
            Err(self.count_error(expected))
        }
    }

    fn at_least(&self, expected: usize) -> Result<(), ProtocolError> {
        if self.parts.len() >= expected {
            Ok(())
        } else {
            Err(self.count_error(expected))
        }
    }

    fn count_error(&self, expected: usize) -> ProtocolError {
        ProtocolError::PartCount {
            key: self.key,
            expected,
            found: self.parts.len(),
        }
    }

    fn part(&self, index: usize) -> Result<&'a str, ProtocolError> {
        self.parts
            .get(index)
            .copied()
            .ok_or_else(|| self.count_error(index + 1))
    }

    fn player(&self, index: usize) -> Result<PlayerId, ProtocolError> {
        Ok(self.registry.resolve_player(self.part(index)?)?)
    }

    fn tappable(&self, index: usize) -> Result<TappableId, ProtocolError> {
        Ok(self.registry.resolve_tappable(self.part(index)?)?)
    }

    fn ability(&self, index: usize) -> Result<AbilityId, ProtocolError> {
        Ok(self.registry.resolve_ability(self.part(index)?)?)
    }

    fn essences(&self, index: usize) -> Result<EssenceSelection, ProtocolError> {
        Ok(self.part(index)?.parse()?)
    }

    fn number<T: FromStr>(&self, index: usize, field: &'static str) -> Result<T, ProtocolError> {
        let raw = self.part(index)?;
        raw.parse().map_err(|_| ProtocolError::bad(field, raw))
    }

    fn tappables(&self, index: usize) -> Result<Vec<TappableId>, ProtocolError> {
        let raw = self.part(index)?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(VALUE_SEP)
            .map(|ident| Ok(self.registry.resolve_tappable(ident)?))
            .collect()
    }

    fn optional<T, E>(
        &self,
        index: usize,
        parse: impl FnOnce(&'a str) -> Result<T, E>,
    ) -> Result<Option<T>, ProtocolError>
    where
        ProtocolError: From<E>,
    {
        match self.part(index)? {
            NONE_MARK => Ok(None),
            raw => Ok(Some(parse(raw)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use arcana_core::essence::EssenceKind;
    use arcana_core::action::ShuffleKind;
    use arcana_core::testing::TestTable;

    use super::*;
    use crate::Envelope;

    fn started() -> TestTable {
        let mut table = TestTable::three_players();
        table.start();
        table
    }

    fn round_trip(table: &TestTable, message: impl Into<Message>) -> String {
        let envelope = Envelope::action(11, message);
        let line = envelope.encode(&table.state.registry).unwrap();
        assert_eq!(Envelope::decode(&line, &table.state.registry), Ok(envelope));
        line
    }

    #[test]
    fn ability_overwrite_uses_identifiers_and_essence_strings() {
        let table = started();
        let ability = table.mage_ability(PlayerId(0));
        let line = round_trip(
            &table,
            UserInputOverwrite::Ability {
                ability,
                action: AbilityAction {
                    cost: EssenceSelection::of(EssenceKind::Elan, 2),
                    output: EssenceSelection::of(EssenceKind::Gold, 1),
                    target: None,
                    roll: None,
                },
            },
        );
        let ident = table.state.registry.identifier(ability).unwrap();
        assert_eq!(
            line,
            format!("C|11|game_action|ability;{ident};2:0:0:0:0:0;0:0:0:0:1:0;-;-$")
        );
    }

    #[test]
    fn names_are_cleaned_on_both_sides() {
        let table = TestTable::three_players();
        let line = Envelope::action(
            5,
            AddPlayer {
                client_id: 5,
                name: "ana;|$".into(),
            },
        )
        .encode(&table.state.registry)
        .unwrap();
        assert_eq!(line, "C|5|add_player|ana$");

        let decoded = Envelope::decode("C|7|add_player|bo$", &table.state.registry).unwrap();
        assert_eq!(
            decoded,
            Envelope::action(
                7,
                AddPlayer {
                    client_id: 7,
                    name: "bo".into()
                }
            )
        );
    }

    #[test]
    fn setup_lists_and_optional_players() {
        let table = started();
        let cards = table.artifact_ids();
        round_trip(
            &table,
            Shuffle {
                kind: ShuffleKind::Initial,
                player: None,
                order: cards.clone(),
            },
        );
        round_trip(
            &table,
            Shuffle {
                kind: ShuffleKind::Refill,
                player: Some(PlayerId(2)),
                order: Vec::new(),
            },
        );
        round_trip(
            &table,
            DealCards {
                player: PlayerId(1),
                cards: cards[..3].to_vec(),
            },
        );
    }

    #[test]
    fn round_bookkeeping_messages() {
        let table = started();
        let cards = table.artifact_ids();
        round_trip(
            &table,
            IncomeDone {
                player: PlayerId(0),
                choices: vec![(cards[0], "0:0:0:0:0:2~gold".parse().unwrap())],
            },
        );
        round_trip(&table, IncomeDone { player: PlayerId(1), choices: Vec::new() });
        round_trip(&table, NextRound { round: 3 });
        round_trip(
            &table,
            Checksum {
                player: PlayerId(2),
                round: 3,
                digest: "00ff".into(),
            },
        );
        round_trip(
            &table,
            Control {
                voter: PlayerId(0),
                command: ControlCommand::VoteDisconnect { target: PlayerId(1) },
            },
        );
    }

    #[test]
    fn attack_replies() {
        let table = started();
        let ability = table.mage_ability(PlayerId(0));
        let card = table.artifact_ids()[1];
        round_trip(
            &table,
            AttackResponse {
                ability,
                victim: PlayerId(1),
                reply: AttackReply::Protect(card),
            },
        );
        round_trip(
            &table,
            AttackResponse {
                ability,
                victim: PlayerId(1),
                reply: AttackReply::Suffer,
            },
        );
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        let table = started();
        let registry = &table.state.registry;
        assert_eq!(
            Envelope::decode("C|1|next_round|x$", registry),
            Err(ProtocolError::bad("round", "x"))
        );
        assert!(matches!(
            Envelope::decode("C|1|set_name|onlyone$", registry),
            Err(ProtocolError::PartCount {
                key: "set_name",
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Envelope::decode("C|1|disconnect|Player#9#nobody$", registry),
            Err(ProtocolError::Unresolved(_))
        ));
        assert!(matches!(
            Envelope::decode("C|1|game_action|dance$", registry),
            Err(ProtocolError::BadValue { field: "game action", .. })
        ));
    }

    #[test]
    fn unknown_entities_cannot_be_encoded() {
        let table = started();
        let err = Envelope::action(1, Disconnect { player: PlayerId(40) })
            .encode(&table.state.registry)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Unregistered(_)));
    }
}
