use glam::Vec3;
use vantage_engine::animation::{Animator, LerpTrack, PoseLerp};
use vantage_engine::math::Xfo;
use vantage_engine::scene::{ItemRef, ParamValue};
use vantage_engine::Editor;

const STEP: f32 = 0.02;

fn xfo_at(x: f32) -> Xfo {
    Xfo::from_translation(Vec3::new(x, 0.0, 0.0))
}

fn editor_with_part() -> (Editor, ItemRef) {
    let mut editor = Editor::default();
    let root = editor.scene_mut().add_root("Asset");
    let a = editor.scene_mut().add_child(&root, "PartA");
    (editor, a)
}

fn drag_to(editor: &mut Editor, item: &ItemRef, xfo: Xfo) {
    editor.set_selection(vec![item.clone()]);
    assert!(editor.begin_selection_drag());
    editor.update_selection_drag(&[xfo]);
}

#[test]
fn transform_interpolation_starts_near_start_and_ends_exact() {
    let (mut editor, a) = editor_with_part();
    a.borrow().set_global_xfo(xfo_at(1.0));
    let top = editor.create_view(Some("Top"));
    drag_to(&mut editor, &a, xfo_at(5.0));
    editor.activate_initial_view_instant();
    assert_eq!(a.borrow().global_xfo(), xfo_at(1.0));

    editor.activate_view(top).expect("transition starts");
    assert!(editor.is_transitioning());

    editor.update(STEP);
    let after_first = a.borrow().global_xfo().tr.x;
    // Smoothstep keeps the first step close to the start value.
    assert!(after_first > 1.0 && after_first < 1.5, "got {after_first}");

    for _ in 1..25 {
        editor.update(STEP);
    }
    // The final step lands on the stored value exactly.
    assert_eq!(a.borrow().global_xfo(), xfo_at(5.0));
    assert!(!editor.is_transitioning());
}

#[test]
fn discrete_values_snap_on_first_step() {
    let (mut editor, a) = editor_with_part();
    let top = editor.create_view(Some("Top"));
    editor.set_selection(vec![a.clone()]);
    editor.hide_selection();
    editor.activate_initial_view_instant();
    assert!(a.borrow().is_visible());

    editor.activate_view(top).expect("transition starts");
    // Still untouched before any step fires.
    assert!(a.borrow().is_visible());

    editor.update(STEP);
    // Visibility is not interpolable: it takes effect immediately.
    assert!(!a.borrow().is_visible());
}

#[test]
fn number_values_ease_between_endpoints() {
    let (mut editor, a) = editor_with_part();
    let opacity = a.borrow_mut().add_param("Opacity", ParamValue::Number(0.0));
    let top = editor.create_view(Some("Top"));
    editor.set_parameter_value(&opacity, ParamValue::Number(42.0));
    editor.activate_initial_view_instant();
    assert_eq!(opacity.borrow().value(), ParamValue::Number(0.0));

    editor.activate_view(top).expect("transition starts");
    for _ in 0..12 {
        editor.update(STEP);
    }
    match opacity.borrow().value() {
        ParamValue::Number(v) => assert!(v > 0.0 && v < 42.0, "got {v}"),
        other => panic!("expected number, got {other:?}"),
    }

    for _ in 12..25 {
        editor.update(STEP);
    }
    assert_eq!(opacity.borrow().value(), ParamValue::Number(42.0));
}

#[test]
fn camera_transition_lands_on_view_snapshot() {
    let (mut editor, _a) = editor_with_part();
    let camera = editor.camera();
    camera.borrow_mut().set_position_and_target(Vec3::new(0.0, 0.0, 8.0), Vec3::ZERO);
    let front = editor.create_view(Some("Front"));

    camera.borrow_mut().set_position_and_target(Vec3::new(6.0, 2.0, -1.0), Vec3::new(1.0, 1.0, 0.0));
    editor.activate_view(front).expect("transition starts");
    for _ in 0..25 {
        editor.update(STEP);
    }

    let cam = camera.borrow();
    assert!(cam.global_xfo().tr.abs_diff_eq(Vec3::new(0.0, 0.0, 8.0), 1e-5));
    assert!(cam.target_position().abs_diff_eq(Vec3::ZERO, 1e-5));
    assert!((cam.focal_distance() - 8.0).abs() < 1e-4);
}

#[test]
fn second_activation_cancels_first_transition() {
    let (mut editor, a) = editor_with_part();
    a.borrow().set_global_xfo(xfo_at(1.0));
    let top = editor.create_view(Some("Top"));
    drag_to(&mut editor, &a, xfo_at(5.0));
    editor.activate_initial_view_instant();
    let side = editor.create_view(Some("Side"));
    drag_to(&mut editor, &a, xfo_at(-3.0));
    editor.activate_initial_view_instant();

    editor.activate_view(top).expect("first transition");
    editor.update(STEP);
    editor.activate_view(side).expect("second transition");

    for _ in 0..25 {
        editor.update(STEP);
    }
    // Only the second transition's end state remains; the first never
    // finished and stopped writing when it was cancelled.
    assert_eq!(a.borrow().global_xfo(), xfo_at(-3.0));
    assert!(!editor.is_transitioning());
}

#[test]
fn cancelled_animation_stops_writing() {
    let (_editor, a) = editor_with_part();
    let param = a.borrow().global_xfo_param();
    a.borrow().set_global_xfo(xfo_at(0.0));

    let tracks = vec![LerpTrack::new(
        param.clone(),
        ParamValue::Xfo(xfo_at(0.0)),
        ParamValue::Xfo(xfo_at(10.0)),
    )];
    let mut animator = Animator::new();
    let handle = animator.spawn(Box::new(PoseLerp::new(tracks)), 25, STEP);
    handle.cancel();
    animator.update(1.0);

    assert_eq!(a.borrow().global_xfo(), xfo_at(0.0));
    assert!(animator.is_idle());
    assert!(handle.is_cancelled());
    assert!(!handle.is_finished());
}
