use romeo_core::{
    ClientMessage, MergeDecision, PeerEvent, Presence, ReplayMode, RomeoConfig, ServerMessage,
    Session,
};

fn draw_line(session: &mut Session, x: f64, now: u64) -> u64 {
    session.pointer_down(x, 0.0, now);
    for step in 1..=4 {
        session.pointer_move(x, step as f64 * 10.0, now + step * 40);
    }
    session.pointer_up(x, 40.0, now + 170);
    now + 170
}

/// Relay a session's outgoing board the way the relay server would.
fn relay(session: &Session) -> String {
    let board = session.outgoing_board().unwrap().clone();
    let sent = ClientMessage::Board { board }.to_json().unwrap();
    let ClientMessage::Board { board } = serde_json::from_str::<ClientMessage>(&sent).unwrap() else {
        panic!("not a board message");
    };
    serde_json::to_string(&ServerMessage::Board {
        from: "peer".to_string(),
        board,
    })
    .unwrap()
}

fn board_event(json: &str) -> PeerEvent {
    romeo_core::wire::decode_server_message(json).unwrap()
}

#[test]
fn test_response_round_trip_animates_only_the_tail() {
    let mut alice = Session::new(RomeoConfig::default(), 0);
    let mut bob = Session::new(RomeoConfig::default(), 0);

    // Alice draws and sends.
    draw_line(&mut alice, 0.0, 100);
    let to_bob = relay(&alice);

    // Bob is active, so the drawing replays at once.
    let decision = match board_event(&to_bob) {
        PeerEvent::BoardReceived { board, .. } => bob.receive_board(board, 1_000).unwrap(),
        other => panic!("unexpected event: {:?}", other),
    };
    assert_eq!(decision, MergeDecision::ReplayNow);
    assert!(bob.replay().is_playing());
    assert_eq!(bob.frame(5_000).mode, ReplayMode::Done);

    // Bob answers on the same board.
    draw_line(&mut bob, 50.0, 5_500);
    assert_eq!(bob.board().len(), 2);
    let to_alice = relay(&bob);

    // Alice sees her own stroke at once and only Bob's stroke animates.
    alice.set_presence(Some(Presence::Away));
    alice.apply_peer_event(board_event(&to_alice), 6_000);
    assert_eq!(alice.board().len(), 2);
    assert!(alice.replay().is_playing());
    assert_eq!(alice.replay().current_stroke_index(), 1);

    let frame = alice.frame(6_000);
    assert_eq!(frame.finished.len(), 1);
    assert_eq!(frame.progress, 0);

    let frame = alice.frame(6_200);
    assert_eq!(frame.mode, ReplayMode::Done);
    assert_eq!(frame.finished.len(), 2);
}

#[test]
fn test_duplicate_delivery_is_ignored() {
    let mut alice = Session::new(RomeoConfig::default(), 0);
    let mut bob = Session::new(RomeoConfig::default(), 0);
    draw_line(&mut alice, 0.0, 0);
    let payload = relay(&alice);

    bob.apply_peer_event(board_event(&payload), 500);
    bob.frame(10_000);
    let before = bob.board().clone();

    let event = board_event(&payload);
    let PeerEvent::BoardReceived { board, .. } = event else {
        panic!("not a board event");
    };
    assert_eq!(bob.receive_board(board, 10_100).unwrap(), MergeDecision::Duplicate);
    assert!(!bob.replay().is_playing());
    assert!(!bob.is_message_pending());
    assert!(!bob.is_overflow_pending());
    assert_eq!(bob.board(), &before);
}

#[test]
fn test_inactive_user_gets_envelope_then_promotion_on_erase() {
    let mut alice = Session::new(RomeoConfig::default(), 0);
    let mut bob = Session::new(RomeoConfig::default(), 0);

    draw_line(&mut bob, 0.0, 0);
    bob.erase_last(200);
    assert!(bob.board().is_empty());

    draw_line(&mut alice, 0.0, 0);
    let payload = relay(&alice);

    // Bob has not touched the screen for more than the inactivity timeout.
    assert_eq!(bob.presence(30_000), Presence::Away);
    bob.apply_peer_event(board_event(&payload), 30_000);
    assert!(bob.is_message_pending());
    assert!(bob.board().is_empty());

    assert!(bob.open_pending(30_100));
    assert!(!bob.is_message_pending());
    assert!(bob.replay().is_playing());
    assert_eq!(bob.board().len(), 1);
}

#[test]
fn test_unrelated_board_waits_without_touching_local_work() {
    let mut alice = Session::new(RomeoConfig::default(), 0);
    let mut bob = Session::new(RomeoConfig::default(), 0);
    draw_line(&mut alice, 0.0, 0);
    draw_line(&mut bob, 30.0, 0);
    let local = bob.board().clone();

    let decision = bob.receive_payload(
        &serde_json::to_string(alice.outgoing_board().unwrap()).unwrap(),
        400,
    );
    assert_eq!(decision.unwrap(), MergeDecision::QueueOverflow);
    assert_eq!(bob.board(), &local);
    assert!(bob.is_overflow_pending());
    assert!(!bob.replay().is_playing());

    // Erasing the last local stroke promotes the waiting board.
    assert!(bob.erase_last(500).is_some());
    assert!(!bob.is_overflow_pending());
    assert_eq!(bob.board().len(), 1);
    assert_ne!(bob.board().strokes()[0].id(), local.strokes()[0].id());
}

#[test]
fn test_malformed_remote_stroke_is_dropped() {
    let mut bob = Session::new(RomeoConfig::default(), 0);
    let mut alice = Session::new(RomeoConfig::default(), 0);
    draw_line(&mut alice, 0.0, 0);

    let mut json: serde_json::Value =
        serde_json::to_value(alice.outgoing_board().unwrap()).unwrap();
    json["strokes"][0]["sample_times"] = serde_json::json!([0]);

    assert!(bob.receive_payload(&json.to_string(), 100).is_err());
    assert!(bob.board().is_empty());
    assert!(!bob.replay().is_playing());
    assert!(bob.pending().is_empty());
}

#[test]
fn test_response_during_replay_resumes_at_new_strokes() {
    let mut alice = Session::new(RomeoConfig::default(), 0);
    let mut bob = Session::new(RomeoConfig::default(), 0);

    draw_line(&mut alice, 0.0, 100);
    bob.apply_peer_event(board_event(&relay(&alice)), 1_000);
    assert_eq!(bob.frame(5_000).mode, ReplayMode::Done);
    draw_line(&mut bob, 50.0, 5_500);
    let to_alice = relay(&bob);

    // Alice is watching her own drawing when the answer arrives.
    alice.animate(6_000).unwrap();
    alice.frame(6_050);
    assert!(alice.replay().is_playing());
    assert_eq!(alice.replay().strokes().len(), 1);

    let PeerEvent::BoardReceived { board, .. } = board_event(&to_alice) else {
        panic!("not a board event");
    };
    assert_eq!(
        alice.receive_board(board, 6_060).unwrap(),
        MergeDecision::Response { resume_from: 1 }
    );
    assert!(alice.replay().is_playing());
    assert_eq!(alice.replay().strokes().len(), 2);
    assert_eq!(alice.replay().current_stroke_index(), 1);

    let frame = alice.frame(6_060);
    assert_eq!(frame.finished.len(), 1);
    assert_eq!(frame.progress, 0);
    assert_eq!(alice.frame(6_300).mode, ReplayMode::Done);
}
