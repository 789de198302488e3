use rnhost_animated_core::{AnimatedEvent, GraphCommand, NodesManager, Tag, UpdateBatch};

fn run_script(name: &str) -> NodesManager {
    let commands: Vec<GraphCommand> =
        rnhost_test_fixtures::graphs::script(name).expect("load graph script");
    let mut manager = NodesManager::default();
    for (i, result) in manager.apply_batch(&commands).into_iter().enumerate() {
        result.unwrap_or_else(|e| panic!("{name}: command #{i} failed: {e}"));
    }
    manager
}

#[test]
fn scripted_graphs_produce_expected_first_frame() {
    for name in rnhost_test_fixtures::graphs::keys() {
        let Some(expected) = rnhost_test_fixtures::graphs::expected::<UpdateBatch>(&name)
            .expect("load expected updates")
        else {
            continue;
        };
        let mut manager = run_script(&name);
        let frame = manager.run_updates(0.0);
        assert!(frame.failures.is_empty(), "{name}: {:?}", frame.failures);
        assert_eq!(frame.updates, expected, "{name}");
    }
}

#[test]
fn spring_fixture_settles_and_reports_progress() {
    let mut manager = run_script("spring-translate");
    let mut last_translate = None;
    let mut changes = 0;
    let mut finished = None;
    for i in 0..600 {
        let frame = manager.run_updates(i as f64 * 1000.0 / 60.0);
        if let Some(update) = frame.updates.for_view(Tag(42)) {
            last_translate = update.transform().and_then(|t| t[0]["translateY"].as_f64());
        }
        for event in frame.events {
            match event {
                AnimatedEvent::ValueChanged { tag, .. } => {
                    assert_eq!(tag, Tag(1));
                    changes += 1;
                }
                AnimatedEvent::AnimationFinished {
                    animation_id,
                    finished: done,
                } => finished = Some((animation_id, done)),
            }
        }
        if finished.is_some() {
            break;
        }
    }
    assert_eq!(finished, Some((1, true)));
    assert_eq!(last_translate, Some(200.0));
    assert!(changes > 10);
}
