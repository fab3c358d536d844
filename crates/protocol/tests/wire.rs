use arcana_core::essence::{EssenceKind, EssenceSelection};
use arcana_core::registry::PlayerId;
use arcana_core::testing::TestTable;
use arcana_core::{AbilityAction, Message};
use arcana_core::action::{UserInputOverwrite, VoteNextRound};
use arcana_protocol::{Body, Envelope, Notice, ProtocolError, RawLine, Role};
use proptest::prelude::*;

fn started() -> TestTable {
    let mut table = TestTable::three_players();
    table.start();
    table
}

#[test]
fn a_line_encoded_on_one_client_decodes_on_another() {
    let sender = started();
    let receiver = started();
    let ability = sender.mage_ability(PlayerId(0));
    let envelope = Envelope::action(
        10,
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
    let line = envelope.encode(&sender.state.registry).unwrap();
    let decoded = Envelope::decode(&line, &receiver.state.registry).unwrap();
    assert_eq!(decoded, envelope);
    assert_eq!(decoded.role(), Role::Client);
}

#[test]
fn relay_restamping_keeps_the_payload() {
    let table = started();
    let line = Envelope::action(99, VoteNextRound { player: PlayerId(1) })
        .encode(&table.state.registry)
        .unwrap();
    let restamped = RawLine::parse(&line).unwrap().with_client(11).to_string();
    let decoded = Envelope::decode(&restamped, &table.state.registry).unwrap();
    assert_eq!(decoded.client_id, 11);
    assert_eq!(
        decoded.body,
        Body::Action(Message::VoteNextRound(VoteNextRound { player: PlayerId(1) }))
    );
}

#[test]
fn left_notice_carries_the_departed_client() {
    let table = TestTable::three_players();
    let decoded = Envelope::decode("S|12|left|$\n", &table.state.registry).unwrap();
    assert_eq!(decoded, Envelope::notice(12, Notice::Left));
}

#[test]
fn identifiers_from_a_diverged_registry_fail_to_resolve() {
    let sender = started();
    let receiver = TestTable::three_players();
    let ability = sender.mage_ability(PlayerId(0));
    let line = Envelope::action(
        10,
        UserInputOverwrite::Ability {
            ability,
            action: AbilityAction::default(),
        },
    )
    .encode(&sender.state.registry)
    .unwrap();
    assert!(matches!(
        Envelope::decode(&line, &receiver.state.registry),
        Err(ProtocolError::Unresolved(_))
    ));
}

proptest! {
    #[test]
    fn arbitrary_lines_never_panic(line in "[CS]\\|[0-9]{1,3}\\|[a-z_]{0,16}\\|[ -~]{0,64}\\$") {
        let table = TestTable::three_players();
        let _ = Envelope::decode(&line, &table.state.registry);
    }
}
