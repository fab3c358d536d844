//! Two clients on an in-process relay, driven through the public session API.
use std::sync::Arc;

use arcana_core::input::SelectorKind;
use arcana_core::state::DraftStage;
use arcana_core::testing::fixture_catalog;
use arcana_core::{
    AbilityError, EssenceKind, EssenceSelection, GameConfig, Phase, PlayerId, SelectionResult,
    TappableKind,
};
use arcana_runtime::{
    ClientSession, LocalHub, LocalTransport, SessionConfig, SessionError, state_digest,
};

type Session = ClientSession<LocalTransport>;

fn pump(sessions: &mut [Session]) {
    for _ in 0..500 {
        let mut idle = true;
        for session in sessions.iter_mut() {
            let report = session.poll().expect("poll succeeds");
            if !report.is_idle() || session.in_flight() > 0 {
                idle = false;
            }
        }
        if idle {
            return;
        }
    }
    panic!("table never settled");
}

fn connect(hub: &LocalHub, names: &[&str]) -> Vec<Session> {
    let catalog = Arc::new(fixture_catalog());
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let mut config = SessionConfig::named(*name);
            config.seed = Some(index as u64 + 1);
            config.autostart_players = Some(names.len());
            ClientSession::new(
                config,
                GameConfig::default(),
                Arc::clone(&catalog),
                hub.connect().expect("hub accepts"),
            )
        })
        .collect()
}

/// Seats everyone, lets the designated client deal, drafts and settles the
/// first income with every indeterminate essence taken as elan.
fn start(hub: &LocalHub, names: &[&str]) -> Vec<Session> {
    let mut sessions = connect(hub, names);
    pump(&mut sessions);
    for index in 0..sessions.len() {
        sessions[index].join().unwrap();
        pump(&mut sessions);
    }
    assert_eq!(sessions[0].state().phase, Phase::Draft(DraftStage::Mages));

    for session in sessions.iter_mut() {
        let me = session.local_player().unwrap();
        let mage = session.state().player(me).unwrap().offered_mages[0];
        session.draft(mage).unwrap();
    }
    pump(&mut sessions);

    while let Phase::Draft(DraftStage::MagicItems { picking }) = sessions[0].state().phase {
        let picker = sessions
            .iter_mut()
            .find(|session| session.local_player() == Some(picking))
            .unwrap();
        let item = picker.state().supply_of(TappableKind::MagicItem)[0];
        picker.draft(item).unwrap();
        pump(&mut sessions);
    }

    settle_income(&mut sessions);
    assert_eq!(sessions[0].state().phase, Phase::Turns);
    sessions
}

fn settle_income(sessions: &mut [Session]) {
    for session in sessions.iter_mut() {
        let Some(SelectorKind::Income { sources }) =
            session.current_selector().map(|selector| selector.kind.clone())
        else {
            panic!("income needs a decision");
        };
        let choices = sources
            .iter()
            .map(|(card, collect)| (*card, collect.default_resolution()))
            .collect();
        assert!(session.resolve_selector(SelectionResult::Income(choices)).unwrap());
    }
    pump(sessions);
}

fn digests(sessions: &[Session]) -> Vec<String> {
    sessions
        .iter()
        .map(|session| state_digest(&session.state().snapshot()).unwrap())
        .collect()
}

#[test]
fn paying_two_elan_for_gold_replicates_exactly() {
    let hub = LocalHub::new();
    let mut sessions = start(&hub, &["ana", "bo"]);
    let me = PlayerId(0);
    let before = sessions[1].state().player(me).unwrap().essences;
    assert_eq!(before.get(EssenceKind::Elan), 3);

    let mage = sessions[0].state().player(me).unwrap().mage.unwrap();
    let ability = sessions[0].state().tappable(mage).unwrap().abilities[0];
    assert!(!sessions[0].activate_ability(ability).unwrap());
    assert!(matches!(
        sessions[0].current_selector().map(|selector| &selector.kind),
        Some(SelectorKind::Cost { .. })
    ));
    let sent = sessions[0]
        .resolve_selector(SelectionResult::Essences(EssenceSelection::of(
            EssenceKind::Elan,
            2,
        )))
        .unwrap();
    assert!(sent);
    pump(&mut sessions);

    for session in &sessions {
        let essences = session.state().player(me).unwrap().essences;
        assert_eq!(essences.get(EssenceKind::Elan), 1);
        assert_eq!(essences.get(EssenceKind::Gold), before.get(EssenceKind::Gold) + 1);
        assert_eq!(essences.get(EssenceKind::Life), before.get(EssenceKind::Life));
    }
    let [left, right] = digests(&sessions).try_into().unwrap();
    assert_eq!(left, right);
}

#[test]
fn canceled_activation_leaves_every_copy_untouched() {
    let hub = LocalHub::new();
    let mut sessions = start(&hub, &["ana", "bo"]);
    let before = digests(&sessions);
    let sent_before = sessions[0].metrics().sent();

    let mage = sessions[0].state().player(PlayerId(0)).unwrap().mage.unwrap();
    let ability = sessions[0].state().tappable(mage).unwrap().abilities[0];
    assert!(!sessions[0].activate_ability(ability).unwrap());
    assert!(sessions[0].cancel_selector());
    pump(&mut sessions);

    assert_eq!(digests(&sessions), before);
    assert_eq!(sessions[0].metrics().sent(), sent_before);
    assert!(sessions[0].state().local.active_ability.is_none());
}

#[test]
fn a_second_activation_is_refused() {
    let hub = LocalHub::new();
    let mut sessions = start(&hub, &["ana", "bo"]);
    let mage = sessions[0].state().player(PlayerId(0)).unwrap().mage.unwrap();
    let ability = sessions[0].state().tappable(mage).unwrap().abilities[0];

    assert!(!sessions[0].activate_ability(ability).unwrap());
    let second = sessions[0].activate_ability(ability);
    assert!(matches!(
        second,
        Err(SessionError::Ability(AbilityError::AnotherActive(id))) if id == ability
    ));
    assert_eq!(sessions[0].state().local.active_ability, Some(ability));
}

#[test]
fn a_full_round_ends_with_matching_checksums() {
    let hub = LocalHub::new();
    let mut sessions = start(&hub, &["ana", "bo", "cy"]);

    for seat in 0..3 {
        let current = sessions[0].state().turn.current;
        assert_eq!(current, PlayerId(seat));
        sessions[seat as usize].pass(None).unwrap();
        pump(&mut sessions);
    }

    // Votes, refills and the next round are all automatic.
    assert_eq!(sessions[0].state().turn.round, 2);
    assert_eq!(sessions[0].state().phase, Phase::Income);
    let ours: Vec<_> = sessions
        .iter()
        .map(|session| session.digest(2).map(str::to_string))
        .collect();
    assert!(ours[0].is_some());
    assert!(ours.iter().all(|digest| *digest == ours[0]));
    assert!(sessions.iter().all(|session| session.metrics().checksum_mismatches() == 0));

    settle_income(&mut sessions);
    let [a, b, c] = digests(&sessions).try_into().unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn a_dropped_connection_disconnects_the_seat() {
    let hub = LocalHub::new();
    let mut sessions = start(&hub, &["ana", "bo", "cy"]);
    let gone = sessions.pop().unwrap();
    let player = gone.local_player().unwrap();
    drop(gone);
    pump(&mut sessions);

    for session in &sessions {
        assert!(session.state().player(player).unwrap().disconnected);
    }
}

#[test]
fn requests_before_seating_are_refused() {
    let hub = LocalHub::new();
    let mut sessions = connect(&hub, &["ana"]);
    pump(&mut sessions);
    assert!(matches!(
        sessions[0].leave(),
        Err(SessionError::NotSeated)
    ));
}
