use super::*;
use crate::chain::NodeHandle;
use approx::assert_abs_diff_eq;

const TWO_STATES: &str = r#"{
    "nodes": [{"name": "A", "value": 1.0}, {"name": "B", "value": 0.0}],
    "links": [{"source": 0, "target": 1, "p": 0.5}, {"source": 1, "target": 1, "p": 1.0}]
}"#;

fn settings() -> Settings {
    Settings {
        layout_seed: Some(3),
        prewarm_iterations: 20,
        ..Settings::default()
    }
}

fn session() -> Session {
    let doc = ChainDocument::from_json(TWO_STATES).unwrap();
    Session::new(&doc, TWO_STATES.to_string(), &settings()).unwrap()
}

#[test]
fn starts_paused_with_a_drawn_scene() {
    let s = session();
    assert!(!s.is_playing());
    assert!(s.error().is_none());
    // A->B straight, B's loop; the anchor link is not drawn
    assert_eq!(s.scene().links.len(), 2);
    assert_eq!(s.scene().nodes.len(), 2);
    assert_eq!(s.display().value(NodeHandle(0), 0.0), Some(1.0));
}

#[test]
fn play_runs_fixed_ticks() {
    let mut s = session();
    s.toggle_play();
    assert!(s.is_playing());

    assert!(s.frame(0.0));
    s.frame(0.2);
    assert_eq!(s.model().values()[0], 1.0);

    s.frame(0.4);
    assert_abs_diff_eq!(s.model().values()[0], 1.0 - 0.5 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(s.model().total_mass(), 1.0, epsilon = 1e-12);

    s.toggle_play();
    assert!(!s.is_playing());
    s.frame(10.0);
    assert_abs_diff_eq!(s.model().values()[0], 1.0 - 0.5 / 3.0, epsilon = 1e-12);
}

#[test]
fn step_button_cancels_animation_and_transitions() {
    let mut s = session();
    s.toggle_play();
    s.frame(1.0);
    s.step_once();

    assert!(!s.is_playing());
    assert_eq!(s.model().values(), vec![0.5, 0.5]);
    // one second transition starting at the last frame
    assert!(s.display().is_animating(1.5));
    assert_abs_diff_eq!(s.display().value(NodeHandle(0), 1.5).unwrap(), 0.75, epsilon = 1e-9);
    assert!(!s.display().is_animating(2.5));
}

#[test]
fn reset_reloads_from_editor() {
    let mut s = session();
    s.step_once();
    s.step_once();
    s.editor = r#"{"nodes":[{"name":"X","value":0.2},{"name":"Y","value":0.8}],"links":[]}"#.to_string();
    s.reset();

    assert!(s.error().is_none());
    assert_eq!(s.model().values(), vec![0.2, 0.8]);
    assert_eq!(s.model().state(NodeHandle(0)).unwrap().name, "X");
    assert!(s.scene().links.is_empty());
    assert_eq!(s.display().value(NodeHandle(1), 0.0), Some(0.8));
    assert!(s.layout_running());
}

#[test]
fn rejected_editor_keeps_the_chain() {
    let mut s = session();
    s.step_once();
    s.editor = r#"{"nodes":[{"name":"X","value":1}],"links":[{"source":0,"target":4,"p":0.5}]}"#.to_string();
    s.reset();

    let error = s.error().unwrap();
    assert!(error.contains("references node 4"), "{}", error);
    // reset happened, the reload did not
    assert_eq!(s.model().values(), vec![1.0, 0.0]);
    assert_eq!(s.model().nodes().len(), 3);
    assert!(!s.is_playing());
}

#[test]
fn malformed_editor_is_reported() {
    let mut s = session();
    s.editor = "{ \"nodes\": [".to_string();
    s.reset();
    assert!(s.error().unwrap().starts_with("malformed chain document"));

    // a good reload clears the error
    s.editor = TWO_STATES.to_string();
    s.reset();
    assert!(s.error().is_none());
}

#[test]
fn settles_when_nothing_moves() {
    let mut s = session();
    let mut now = 0.0;
    while s.frame(now) {
        now += 1.0 / 60.0;
        assert!(now < 60.0, "session never settled");
    }
    assert!(!s.layout_running());
}

#[test]
fn format_pretty_prints_valid_json() {
    let mut s = session();
    s.editor = r#"{"nodes":[{"name":"A","value":1.0}],"links":[]}"#.to_string();
    s.format_editor();
    assert!(s.editor.contains("\n"));
    assert!(s.error().is_none());

    s.editor = "nope".to_string();
    s.format_editor();
    assert_eq!(s.editor, "nope");
    assert!(s.error().is_some());
}
