//! Property tests over generation, decoding, layout and the viewport

use proptest::prelude::*;
use swimlane::plugins::bpmn::fan_out_offsets;
use swimlane::prelude::*;
use swimlane::viewer::ViewportController;

fn label() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 &<>\"'?]{0,24}"
}

fn process_input() -> impl Strategy<Value = ProcessInput> {
    (
        label(),
        prop::collection::vec(label(), 0..4),
        label(),
        prop::collection::vec(label(), 0..6),
        prop::collection::vec(label(), 0..3),
        label(),
    )
        .prop_map(
            |(process_name, participants, trigger, activities, decision_points, end_event)| {
                ProcessInput {
                    process_name,
                    participants,
                    trigger,
                    activities,
                    decision_points,
                    end_event,
                    ..Default::default()
                }
            },
        )
}

fn viewer_event() -> impl Strategy<Value = ViewerEvent> {
    prop_oneof![
        (-500.0..500.0f64, -500.0..500.0f64).prop_map(|(x, y)| ViewerEvent::PointerDown { x, y }),
        (-500.0..500.0f64, -500.0..500.0f64).prop_map(|(x, y)| ViewerEvent::PointerMove { x, y }),
        Just(ViewerEvent::PointerUp),
        Just(ViewerEvent::PointerLeave),
        (-300.0..300.0f64).prop_map(|delta_y| ViewerEvent::Wheel { delta_y }),
        Just(ViewerEvent::ZoomIn),
        Just(ViewerEvent::ZoomOut),
        Just(ViewerEvent::Fit),
        Just(ViewerEvent::Reset),
    ]
}

proptest! {
    #[test]
    fn test_generated_documents_always_validate(input in process_input(), token in any::<u64>()) {
        let generated = Orchestrator::with_bpmn_plugins()
            .generate(&input, RunToken::from(token))
            .unwrap();
        let report = validate(&generated.xml);
        prop_assert!(report.ok(), "{}", report);
        prop_assert!(!generated.regenerated);
    }

    #[test]
    fn test_round_trip_preserves_degrees(input in process_input(), token in any::<u64>()) {
        let generated = Orchestrator::with_bpmn_plugins()
            .generate(&input, RunToken::from(token))
            .unwrap();
        let back = BpmnDecoder::new().decode(&generated.xml).into_model().unwrap();

        prop_assert_eq!(back.node_count(), generated.model.node_count());
        prop_assert_eq!(back.edge_count(), generated.model.edge_count());
        for node in generated.model.nodes() {
            prop_assert_eq!(back.in_degree(&node.id), generated.model.in_degree(&node.id));
            prop_assert_eq!(back.out_degree(&node.id), generated.model.out_degree(&node.id));
            prop_assert_eq!(&back.get_node(&node.id).unwrap().name, &node.name);
        }
    }

    #[test]
    fn test_fan_out_offsets_are_symmetric(count in 0usize..12, spacing in 1.0..100.0f64) {
        let offsets = fan_out_offsets(count, spacing);
        prop_assert_eq!(offsets.len(), count);

        let sum: f64 = offsets.iter().sum();
        prop_assert!(sum.abs() < 1e-9, "sum {}", sum);
        for i in 0..count {
            prop_assert!((offsets[i] + offsets[count - 1 - i]).abs() < 1e-9);
        }
        if count == 1 {
            prop_assert_eq!(offsets[0], 0.0);
        }
    }

    #[test]
    fn test_scale_stays_clamped(events in prop::collection::vec(viewer_event(), 0..60)) {
        let mut controller = ViewportController::new();
        for event in events {
            controller.handle(event);
            let scale = controller.state().scale;
            prop_assert!((0.3..=3.0).contains(&scale), "scale {}", scale);
        }
    }

    #[test]
    fn test_session_scale_stays_clamped(
        events in prop::collection::vec(viewer_event(), 0..40),
        width in 1.0..3000.0f64,
        height in 1.0..3000.0f64,
    ) {
        let generated = Orchestrator::with_bpmn_plugins()
            .generate(&ProcessInput::default(), RunToken::from(1))
            .unwrap();
        let mut session = ViewerSession::new(width, height);
        session.load(generated.model);
        for event in events {
            session.handle(event);
            let scale = session.state().scale;
            prop_assert!((0.3..=3.0).contains(&scale), "scale {}", scale);
        }
    }

    #[test]
    fn test_decoder_never_panics(input in ".{0,400}") {
        let _ = BpmnDecoder::new().decode(&input);
        let _ = validate(&input);
        let _ = repair(&input);
    }
}
