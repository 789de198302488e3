use rnhost_animated_core::{AnimatedError, AnimatedEvent, DriverState, NodesManager, Tag};
use serde_json::{json, Map, Value as JsonValue};

fn cfg(v: JsonValue) -> Map<String, JsonValue> {
    v.as_object().cloned().expect("config must be an object")
}

/// Value node 1 listened to, so every change shows up as an event.
fn listened_value(initial: f64) -> NodesManager {
    let mut m = NodesManager::default();
    m.create_node(Tag(1), "value", &cfg(json!({ "value": initial })))
        .unwrap();
    m.start_listening(Tag(1)).unwrap();
    m.run_updates(0.0);
    m
}

fn finished(frame_events: &[AnimatedEvent]) -> Vec<(i32, bool)> {
    frame_events
        .iter()
        .filter_map(|e| match e {
            AnimatedEvent::AnimationFinished {
                animation_id,
                finished,
            } => Some((*animation_id, *finished)),
            _ => None,
        })
        .collect()
}

#[test]
fn frames_animation_runs_to_completion() {
    let mut m = listened_value(0.0);
    m.start_animation(
        7,
        Tag(1),
        &json!({ "type": "frames", "frames": [0.0, 0.25, 0.5, 1.0], "toValue": 8.0 }),
    )
    .unwrap();
    assert_eq!(m.driver_state(7), Some(DriverState::Idle));

    let frame = m.run_updates(1000.0);
    assert_eq!(m.driver_state(7), Some(DriverState::Running));
    assert_eq!(m.value(Tag(1)), Ok(0.0));
    assert!(finished(&frame.events).is_empty());

    m.run_updates(1016.0);
    assert_eq!(m.value(Tag(1)), Ok(2.0));

    let frame = m.run_updates(1100.0);
    assert_eq!(m.value(Tag(1)), Ok(8.0));
    assert_eq!(finished(&frame.events), vec![(7, true)]);
    assert!(frame.events.contains(&AnimatedEvent::ValueChanged {
        tag: Tag(1),
        value: 8.0
    }));
    assert_eq!(m.driver_state(7), None);
    assert!(!m.has_active_animations());
}

#[test]
fn stopping_keeps_the_last_written_value() {
    let mut m = listened_value(0.0);
    m.start_animation(
        1,
        Tag(1),
        &json!({ "type": "frames", "frames": [0.0, 0.5, 1.0], "toValue": 10.0 }),
    )
    .unwrap();
    m.run_updates(0.0);
    m.run_updates(16.0);
    assert_eq!(m.value(Tag(1)), Ok(5.0));

    m.stop_animation(1).unwrap();
    let frame = m.run_updates(32.0);
    assert_eq!(finished(&frame.events), vec![(1, false)]);
    assert_eq!(m.value(Tag(1)), Ok(5.0));
    assert_eq!(
        m.stop_animation(1),
        Err(AnimatedError::UnknownAnimation { id: 1 })
    );
}

#[test]
fn set_value_cancels_running_animations() {
    let mut m = listened_value(0.0);
    m.start_animation(
        3,
        Tag(1),
        &json!({ "type": "decay", "velocity": 0.5, "deceleration": 0.99 }),
    )
    .unwrap();
    m.run_updates(0.0);
    m.set_value(Tag(1), -4.0).unwrap();
    let frame = m.run_updates(16.0);
    assert_eq!(finished(&frame.events), vec![(3, false)]);
    assert_eq!(m.value(Tag(1)), Ok(-4.0));
}

#[test]
fn later_driver_wins_within_a_tick() {
    let mut m = listened_value(0.0);
    let frames = |to: f64| json!({ "type": "frames", "frames": [0.0, 0.5, 1.0], "toValue": to });
    m.start_animation(1, Tag(1), &frames(10.0)).unwrap();
    m.start_animation(2, Tag(1), &frames(100.0)).unwrap();

    m.run_updates(0.0);
    m.run_updates(16.0);
    assert_eq!(m.value(Tag(1)), Ok(50.0));

    let frame = m.run_updates(1000.0);
    assert_eq!(m.value(Tag(1)), Ok(100.0));
    assert_eq!(finished(&frame.events), vec![(1, true), (2, true)]);
}

#[test]
fn restarting_an_id_replaces_the_old_driver() {
    let mut m = listened_value(0.0);
    let spring = json!({ "type": "spring", "toValue": 1.0 });
    m.start_animation(5, Tag(1), &spring).unwrap();
    m.run_updates(0.0);
    m.start_animation(5, Tag(1), &spring).unwrap();
    let frame = m.run_updates(16.0);
    assert_eq!(finished(&frame.events), vec![(5, false)]);
    assert_eq!(m.driver_state(5), Some(DriverState::Running));
}

#[test]
fn dropping_the_node_cancels_its_drivers() {
    let mut m = listened_value(0.0);
    m.start_animation(9, Tag(1), &json!({ "type": "spring", "toValue": 1.0 }))
        .unwrap();
    m.drop_node(Tag(1)).unwrap();
    let frame = m.run_updates(16.0);
    assert_eq!(finished(&frame.events), vec![(9, false)]);
    assert!(!m.has_active_animations());
}

#[test]
fn spring_and_decay_eventually_finish() {
    let mut m = listened_value(0.0);
    m.start_animation(1, Tag(1), &json!({ "type": "spring", "toValue": 3.0 }))
        .unwrap();
    let mut done = Vec::new();
    for i in 0..600 {
        done.extend(finished(&m.run_updates(i as f64 * 1000.0 / 60.0).events));
        if !done.is_empty() {
            break;
        }
    }
    assert_eq!(done, vec![(1, true)]);
    assert_eq!(m.value(Tag(1)), Ok(3.0));

    m.start_animation(2, Tag(1), &json!({ "type": "decay", "velocity": 1.0 }))
        .unwrap();
    let mut done = Vec::new();
    for i in 0..2_000 {
        done.extend(finished(&m.run_updates(20_000.0 + i as f64 * 16.0).events));
        if !done.is_empty() {
            break;
        }
    }
    assert_eq!(done, vec![(2, true)]);
    assert!(m.value(Tag(1)).unwrap() > 3.0);
}

#[test]
fn infinite_iterations_keep_running() {
    let mut m = listened_value(0.0);
    m.start_animation(
        1,
        Tag(1),
        &json!({ "type": "frames", "frames": [0.0, 1.0], "toValue": 1.0, "iterations": -1 }),
    )
    .unwrap();
    for i in 0..50 {
        let frame = m.run_updates(i as f64 * 20.0);
        assert!(finished(&frame.events).is_empty());
    }
    assert_eq!(m.driver_state(1), Some(DriverState::Running));
}

#[test]
fn bad_animation_configs_are_rejected() {
    let mut m = listened_value(0.0);
    for config in [
        json!({ "type": "tween", "toValue": 1.0 }),
        json!({ "type": "frames", "frames": [], "toValue": 1.0 }),
        json!({ "type": "spring", "toValue": 1.0, "mass": -1.0 }),
        json!({ "type": "decay", "velocity": 1.0, "deceleration": 1.0 }),
    ] {
        let err = m.start_animation(1, Tag(1), &config).unwrap_err();
        assert!(
            matches!(err, AnimatedError::InvalidAnimation { tag: Tag(1), .. }),
            "{config} -> {err:?}"
        );
    }
    assert!(!m.has_active_animations());

    m.create_node(Tag(2), "props", &cfg(json!({ "props": {} })))
        .unwrap();
    assert!(matches!(
        m.start_animation(1, Tag(2), &json!({ "type": "spring", "toValue": 1.0 })),
        Err(AnimatedError::UnsupportedNodeType { tag: Tag(2), .. })
    ));
}
