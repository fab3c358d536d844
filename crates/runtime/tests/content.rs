use std::sync::Arc;

use arcana_content::ContentFactory;
use arcana_core::Phase;
use arcana_core::state::DraftStage;
use arcana_runtime::{ClientSession, LocalHub, SessionConfig, state_digest};

#[test]
fn shipped_cards_deal_a_full_table_identically() {
    let factory = ContentFactory::builtin();
    let game = factory.load_config().unwrap();
    let catalog = Arc::new(factory.load_catalog().unwrap());
    let hub = LocalHub::new();

    let mut sessions: Vec<_> = ["ana", "bo", "cy", "dee"]
        .into_iter()
        .map(|name| {
            let mut config = SessionConfig::named(name);
            config.autostart_players = Some(4);
            config.seed = Some(7);
            ClientSession::new(config, game.clone(), Arc::clone(&catalog), hub.connect().unwrap())
        })
        .collect();

    for index in 0..=sessions.len() {
        for _ in 0..100 {
            let mut idle = true;
            for session in sessions.iter_mut() {
                if !session.poll().unwrap().is_idle() || session.in_flight() > 0 {
                    idle = false;
                }
            }
            if idle {
                break;
            }
        }
        if let Some(session) = sessions.get_mut(index) {
            session.join().unwrap();
        }
    }

    let digests: Vec<_> = sessions
        .iter()
        .map(|session| {
            assert_eq!(session.state().phase, Phase::Draft(DraftStage::Mages));
            state_digest(&session.state().snapshot()).unwrap()
        })
        .collect();
    assert!(digests.windows(2).all(|pair| pair[0] == pair[1]));

    let state = sessions[0].state();
    for seat in state.players.iter() {
        assert_eq!(seat.hand.len(), game.starting_hand);
        assert_eq!(seat.offered_mages.len(), 2);
    }
}
