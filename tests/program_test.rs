//! End-to-end tests: synthetic keypoint frames through sessions, the
//! program engine, replay scheduling and the threaded driver.

use smart_counter::pose::{schedule, Frame, Keypoint, ReplayStep};
use smart_counter::program::{DriverInput, ProgramCatalog, ProgramDriver, ProgramEngine};
use smart_counter::stats::create_shared_stats;
use smart_counter::{DetectionConfig, ExerciseKind, ExerciseSession, ProgramEvent, RecordKind};

// Frame builders shared with the unit tests; they name `crate::pose`.
mod pose {
    pub use smart_counter::pose::{Frame, Keypoint};
}

#[path = "../src/testing.rs"]
#[allow(dead_code)]
mod testing;

fn body(knees: f64, elbows: f64) -> Frame {
    testing::limb_frame(knees, elbows, 0.9)
}

/// Eight frames down, eight frames back up.
fn squat_rep() -> Vec<Frame> {
    let mut frames = vec![body(90.0, 180.0); 8];
    frames.extend(vec![body(180.0, 180.0); 8]);
    frames
}

fn push_up_rep() -> Vec<Frame> {
    let mut frames = vec![body(180.0, 90.0); 8];
    frames.extend(vec![body(180.0, 180.0); 8]);
    frames
}

fn catalog(json: &str) -> ProgramCatalog {
    ProgramCatalog::from_json(json).unwrap()
}

fn feed(engine: &mut ProgramEngine, frames: &[Frame]) {
    for frame in frames {
        engine.process_frame(frame);
    }
}

fn ticks(engine: &mut ProgramEngine, n: u32) {
    for _ in 0..n {
        engine.tick();
    }
}

#[test]
fn test_squat_program_from_catalog_rows() {
    let json = r#"[{"exercise_id": 2, "exercise_name": "Squat", "max_reps": 3,
                    "duration": null, "sets_count": 2, "type_id": 1,
                    "order_num": 1, "break_time": "00:00:05"}]"#;
    let stats = create_shared_stats();
    let mut engine = ProgramEngine::start(catalog(json), DetectionConfig::default())
        .unwrap()
        .with_stats(stats.clone());

    for _ in 0..3 {
        feed(&mut engine, &squat_rep());
    }
    ticks(&mut engine, 5);
    ticks(&mut engine, 2);
    for _ in 0..3 {
        feed(&mut engine, &squat_rep());
    }
    ticks(&mut engine, 5);

    let events = engine.take_events();
    let records: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ProgramEvent::Record(r) => Some(r.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind(), RecordKind::Set);
    assert_eq!(records[0].rep_count(), 3);
    assert_eq!(records[0].duration_seconds(), 0);

    assert_eq!(records[1].kind(), RecordKind::Exercise);
    assert_eq!(records[1].set_number(), 2);
    assert_eq!(records[1].rep_count(), 6);
    assert_eq!(records[1].duration_seconds(), 2);
    assert_eq!(records[1].total_score(), 600);
    assert_eq!(records[1].average_score(), 100.0);

    assert_eq!(events.last(), Some(&ProgramEvent::Completed));
    assert!(engine.is_finished());
    assert_eq!(stats.snapshot().reps_counted, 6);
    assert_eq!(stats.snapshot().records_emitted, 2);
}

#[test]
fn test_push_up_session_counts_arm_reps() {
    let mut session = ExerciseSession::new(ExerciseKind::PushUp, &DetectionConfig::default());
    for _ in 0..4 {
        for frame in push_up_rep() {
            session.process_frame(&frame);
        }
    }
    assert_eq!(session.tally().rep_count(), 4);
    assert_eq!(session.tally().average_score(), 100.0);

    // Knee bends do not move a push-up
    let mut session = ExerciseSession::new(ExerciseKind::PushUp, &DetectionConfig::default());
    for frame in squat_rep() {
        session.process_frame(&frame);
    }
    assert_eq!(session.tally().rep_count(), 0);
}

#[test]
fn test_two_step_program_switches_exercise() {
    let json = r#"[
        {"exercise_id": 1, "type_id": 1, "order_num": 1, "max_reps": 2, "sets_count": 1, "break_time": "00:00:00"},
        {"exercise_id": 2, "type_id": 2, "order_num": 2, "duration": "00:00:03", "sets_count": 1}
    ]"#;
    let mut engine = ProgramEngine::start(catalog(json), DetectionConfig::default()).unwrap();

    feed(&mut engine, &push_up_rep());
    feed(&mut engine, &push_up_rep());
    assert_eq!(engine.live().exercise, Some(ExerciseKind::Squat));

    feed(&mut engine, &squat_rep());
    ticks(&mut engine, 3);

    let records: Vec<_> = engine
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            ProgramEvent::Record(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].exercise_id(), 1);
    assert_eq!(records[0].rep_count(), 2);
    assert_eq!(records[1].exercise_id(), 2);
    assert_eq!(records[1].rep_count(), 1);
    assert_eq!(records[1].duration_seconds(), 3);
    assert!(engine.is_finished());
}

#[test]
fn test_occluded_frames_never_count() {
    let stats = create_shared_stats();
    let json = r#"[{"exercise_id": 2, "type_id": 1, "order_num": 1, "max_reps": 1}]"#;
    let mut engine = ProgramEngine::start(catalog(json), DetectionConfig::default())
        .unwrap()
        .with_stats(stats.clone());

    // Only hips visible
    let hips = Frame::new(vec![
        Keypoint::new("left_hip", 0.0, 0.0, 0.9),
        Keypoint::new("right_hip", 1.0, 0.0, 0.9),
    ]);
    let garbage = Frame::new(vec![Keypoint::new("left_knee", f64::NAN, f64::INFINITY, 0.9)]);
    for _ in 0..20 {
        engine.process_frame(&hips);
        engine.process_frame(&garbage);
        engine.process_frame(&Frame::default());
    }

    assert_eq!(engine.runtime().unwrap().tally().rep_count(), 0);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.frames_processed, 60);
    assert_eq!(snapshot.frames_degraded, 60);
}

#[test]
fn test_replayed_timestamps_drive_timer_step() {
    let json = r#"[{"exercise_id": 2, "type_id": 2, "order_num": 1, "duration": "00:00:02"}]"#;
    let mut engine = ProgramEngine::start(catalog(json), DetectionConfig::default()).unwrap();

    // Ten frames a second for three seconds
    let frames: Vec<Frame> = (0..30u64)
        .map(|i| body(180.0, 180.0).with_timestamp(i * 100))
        .collect();

    for step in schedule(frames, 30) {
        match step {
            ReplayStep::Frame(frame) => engine.process_frame(&frame),
            ReplayStep::Tick => engine.tick(),
        }
        if engine.is_finished() {
            break;
        }
    }

    let events = engine.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        ProgramEvent::Record(r) if r.kind() == RecordKind::Exercise && r.duration_seconds() == 2
    )));
    assert_eq!(events.last(), Some(&ProgramEvent::Completed));
}

#[test]
fn test_driver_serializes_frames_and_ticks() {
    let json = r#"[{"exercise_id": 2, "type_id": 1, "order_num": 1, "max_reps": 2, "break_time": "00:00:01"}]"#;
    let engine = ProgramEngine::start(catalog(json), DetectionConfig::default()).unwrap();
    let driver = ProgramDriver::spawn(engine);
    let sender = driver.sender();

    for _ in 0..2 {
        for frame in squat_rep() {
            sender.send(DriverInput::Frame(frame)).unwrap();
        }
    }
    sender.send(DriverInput::Tick).unwrap();

    let events: Vec<ProgramEvent> = driver.events().iter().collect();
    let reps = events
        .iter()
        .filter(|e| matches!(e, ProgramEvent::RepCompleted { .. }))
        .count();
    assert_eq!(reps, 2);
    assert!(events.contains(&ProgramEvent::BreakStarted { duration: 1 }));
    assert_eq!(events.last(), Some(&ProgramEvent::Completed));

    let engine = driver.join().unwrap();
    assert!(engine.is_finished());
    assert!(engine.live().finished);
}
