use kurbo::Point;
use romeo_core::{
    Board, MergeDecision, MergePolicy, Presence, ReplayEngine, ReplayError, ReplayMode, Stroke,
    StrokeColor, StrokeRecorder,
};
use uuid::Uuid;

/// A horizontal stroke starting at `start` ms with `samples` samples 40 ms apart.
fn stroke(start: u64, samples: usize) -> Stroke {
    let points = (0..samples).map(|i| Point::new(i as f64 * 10.0, 0.0)).collect();
    let times = (0..samples).map(|i| start + i as u64 * 40).collect();
    let lengths = (0..samples).map(|i| i as f64 * 10.0).collect();
    Stroke::from_parts(Uuid::new_v4(), points, times, lengths, StrokeColor::BLACK, 15.0).unwrap()
}

fn strokes() -> Vec<Stroke> {
    vec![stroke(0, 4), stroke(300, 3), stroke(500, 5)]
}

#[test]
fn test_recorded_samples_are_monotonic() {
    let mut board = Board::new();
    let mut recorder = StrokeRecorder::default();
    let mut now = 10_000;
    for (i, &(x, y)) in [(0.0, 0.0), (3.0, 4.0), (3.0, 10.0), (9.0, 18.0)].iter().enumerate() {
        if i == 0 {
            recorder.on_pointer_down(&mut board, x, y, now);
        } else {
            recorder.on_pointer_move(&mut board, x, y, now);
        }
        now += 35;
    }
    recorder.on_pointer_up(&mut board, 9.0, 18.0, now);

    let stroke = &board.strokes()[0];
    assert!(stroke.sample_times().windows(2).all(|w| w[0] <= w[1]));
    assert!(stroke.sample_lengths().windows(2).all(|w| w[0] <= w[1]));
    assert!((stroke.total_length() - stroke.length()).abs() < 1e-9);
    assert!(stroke.validate().is_ok());
}

#[test]
fn test_tap_renders_as_dot() {
    let mut board = Board::new();
    let mut recorder = StrokeRecorder::default();
    recorder.on_pointer_down(&mut board, 0.0, 0.0, 0);
    recorder.on_pointer_up(&mut board, 0.0, 0.0, 0);

    let stroke = &board.strokes()[0];
    assert_eq!(stroke.sample_count(), 2);
    assert!(stroke.total_length() > 0.0);
}

#[test]
fn test_launch_empty_stays_idle() {
    let mut engine = ReplayEngine::new();
    assert_eq!(engine.launch(Vec::new(), 0), Err(ReplayError::EmptyInput));
    assert_eq!(engine.mode(), ReplayMode::Idle);
}

#[test]
fn test_replay_visits_every_stroke_in_order() {
    let mut engine = ReplayEngine::new();
    engine.launch(strokes(), 1_000).unwrap();

    let mut visited = Vec::new();
    let mut now = 1_000;
    while engine.is_playing() {
        engine.tick(now);
        let index = engine.current_stroke_index();
        if visited.last() != Some(&index) {
            visited.push(index);
        }
        now += 7;
    }
    assert_eq!(visited, vec![0, 1, 2]);
    assert_eq!(engine.mode(), ReplayMode::Done);
}

#[test]
fn test_replay_never_rewinds() {
    let mut engine = ReplayEngine::new();
    engine.launch(strokes(), 0).unwrap();

    let mut last = (0, 0.0);
    let mut seen_done = false;
    for now in (0..800).step_by(13) {
        let mode = engine.tick(now).mode;
        if seen_done {
            assert_eq!(mode, ReplayMode::Done);
        }
        seen_done |= mode == ReplayMode::Done;

        let current = (engine.current_stroke_index(), engine.revealed_length());
        assert!(current.0 >= last.0);
        if current.0 == last.0 {
            assert!(current.1 >= last.1);
        }
        last = current;
    }
    assert!(seen_done);
}

#[test]
fn test_tick_is_idempotent() {
    let mut engine = ReplayEngine::new();
    engine.launch(strokes(), 0).unwrap();
    for now in [0, 45, 310, 420, 530] {
        let first = engine.tick(now).visible_strokes();
        let state = engine.state();
        let second = engine.tick(now).visible_strokes();
        assert_eq!(first, second);
        assert_eq!(engine.state(), state);
    }
}

#[test]
fn test_done_frame_draws_everything() {
    let mut engine = ReplayEngine::new();
    engine.launch(strokes(), 0).unwrap();
    let frame = engine.tick(60_000);
    assert_eq!(frame.mode, ReplayMode::Done);
    assert_eq!(frame.finished.len(), 3);
    assert!(frame.partial.is_none());
    assert_eq!(frame.progress, 100);
}

#[test]
fn test_merge_classification() {
    let all = strokes();
    let local = Board::from_strokes(all[..2].to_vec());
    let response = Board::from_strokes(all.clone());
    assert_eq!(
        MergePolicy::classify(&local, &response, Presence::Available),
        MergeDecision::Response { resume_from: 2 }
    );

    let unrelated = Board::from_strokes(vec![all[0].clone(), stroke(900, 2)]);
    let before = local.clone();
    assert_eq!(
        MergePolicy::classify(&local, &unrelated, Presence::Available),
        MergeDecision::QueueOverflow
    );
    assert_eq!(local, before);
}
