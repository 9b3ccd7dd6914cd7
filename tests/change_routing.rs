use glam::Vec3;
use vantage_engine::math::Xfo;
use vantage_engine::scene::{ItemRef, ParamValue};
use vantage_engine::{ActiveView, Editor};

fn xfo_at(x: f32) -> Xfo {
    Xfo::from_translation(Vec3::new(x, 0.0, 0.0))
}

fn editor_with_part() -> (Editor, ItemRef) {
    let mut editor = Editor::default();
    let root = editor.scene_mut().add_root("Asset");
    let a = editor.scene_mut().add_child(&root, "PartA");
    (editor, a)
}

#[test]
fn edits_without_active_view_overwrite_the_neutral_pose() {
    let (mut editor, a) = editor_with_part();
    let opacity = a.borrow_mut().add_param("Opacity", ParamValue::Number(0.0));
    let key = opacity.borrow().key();

    editor.set_parameter_value(&opacity, ParamValue::Number(0.25));
    editor.set_parameter_value(&opacity, ParamValue::Number(0.75));

    // Neutral routing tracks the latest value, not the first.
    assert_eq!(editor.neutral_pose().value(&key), Some(&ParamValue::Number(0.75)));
}

#[test]
fn edits_in_a_view_seed_neutral_once_and_overwrite_the_view() {
    let (mut editor, a) = editor_with_part();
    let opacity = a.borrow_mut().add_param("Opacity", ParamValue::Number(0.1));
    let key = opacity.borrow().key();

    let top = editor.create_view(Some("Top"));
    editor.set_parameter_value(&opacity, ParamValue::Number(0.5));
    editor.set_parameter_value(&opacity, ParamValue::Number(0.9));

    assert_eq!(editor.neutral_pose().value(&key), Some(&ParamValue::Number(0.1)));
    assert_eq!(editor.view(top).unwrap().pose.value(&key), Some(&ParamValue::Number(0.9)));
}

#[test]
fn update_stream_touches_only_the_view_pose() {
    let (mut editor, a) = editor_with_part();
    let opacity = a.borrow_mut().add_param("Opacity", ParamValue::Number(0.1));
    let key = opacity.borrow().key();

    let top = editor.create_view(Some("Top"));
    editor.set_parameter_value(&opacity, ParamValue::Number(0.5));
    editor.update_parameter_value(ParamValue::Number(0.6));
    editor.update_parameter_value(ParamValue::Number(0.7));

    assert_eq!(editor.neutral_pose().value(&key), Some(&ParamValue::Number(0.1)));
    assert_eq!(editor.view(top).unwrap().pose.value(&key), Some(&ParamValue::Number(0.7)));
    assert_eq!(opacity.borrow().value(), ParamValue::Number(0.7));
}

#[test]
fn deleted_active_view_degrades_to_neutral_routing() {
    let (mut editor, a) = editor_with_part();
    let opacity = a.borrow_mut().add_param("Opacity", ParamValue::Number(0.1));
    let key = opacity.borrow().key();

    let top = editor.create_view(Some("Top"));
    editor.delete_view(top).expect("deletes");
    assert_eq!(*editor.active_view(), ActiveView::None);

    editor.set_parameter_value(&opacity, ParamValue::Number(0.5));
    assert_eq!(editor.neutral_pose().value(&key), Some(&ParamValue::Number(0.5)));
}

#[test]
fn excluded_owners_are_never_captured() {
    let mut editor = Editor::default();
    let materials = editor.scene_mut().add_root("Materials");
    let paint = editor.scene_mut().add_child(&materials, "Paint");
    let roughness = paint.borrow_mut().add_param("Roughness", ParamValue::Number(0.3));
    let key = roughness.borrow().key();

    let top = editor.create_view(Some("Top"));
    editor.set_parameter_value(&roughness, ParamValue::Number(0.8));

    // The live parameter changed but neither pose captured it.
    assert_eq!(roughness.borrow().value(), ParamValue::Number(0.8));
    assert_eq!(editor.neutral_pose().value(&key), None);
    assert_eq!(editor.view(top).unwrap().pose.value(&key), None);
    // The edit is still undoable.
    assert!(editor.undo());
    assert_eq!(roughness.borrow().value(), ParamValue::Number(0.3));
}

#[test]
fn visibility_edit_without_active_view_leaves_view_poses_alone() {
    let (mut editor, a) = editor_with_part();
    let visible_key = a.borrow().visible_param().borrow().key();
    let top = editor.create_view(Some("Top"));
    editor.set_selection(vec![a.clone()]);
    editor.hide_selection();
    editor.deactivate_view();

    editor.set_selection(vec![a.clone()]);
    editor.set_selection_visibility(true);

    // Top's own override survives; only the neutral pose and the live
    // parameter change.
    assert_eq!(
        editor.view(top).unwrap().pose.value(&visible_key),
        Some(&ParamValue::Bool(false))
    );
    assert_eq!(editor.neutral_pose().value(&visible_key), Some(&ParamValue::Bool(true)));
    assert!(a.borrow().is_visible());
}

#[test]
fn visibility_edit_from_initial_view_propagates_to_all_views() {
    let (mut editor, a) = editor_with_part();
    let visible_key = a.borrow().visible_param().borrow().key();
    let top = editor.create_view(Some("Top"));
    editor.set_selection(vec![a.clone()]);
    editor.hide_selection();

    editor.activate_initial_view_instant();
    editor.set_selection(vec![a.clone()]);
    editor.hide_selection();

    // Hiding from the Initial View rewrites every view's snapshot too.
    assert_eq!(editor.neutral_pose().value(&visible_key), Some(&ParamValue::Bool(false)));
    assert_eq!(
        editor.view(top).unwrap().pose.value(&visible_key),
        Some(&ParamValue::Bool(false))
    );
    assert!(!a.borrow().is_visible());
}

#[test]
fn visibility_undo_reactivates_the_owning_view() {
    let (mut editor, a) = editor_with_part();
    let top = editor.create_view(Some("Top"));
    let top_id = editor.view(top).unwrap().id().clone();

    editor.set_selection(vec![a.clone()]);
    editor.hide_selection();
    editor.deactivate_view();

    assert!(editor.undo());
    assert!(a.borrow().is_visible());
    // The undo snapped the display back to the view that owns the snapshot.
    assert_eq!(*editor.active_view(), ActiveView::View(top_id.clone()));

    assert!(editor.redo());
    assert!(!a.borrow().is_visible());
    assert_eq!(*editor.active_view(), ActiveView::View(top_id));
}

#[test]
fn camera_save_undo_restores_snapshot_and_reactivates() {
    let (mut editor, _a) = editor_with_part();
    let camera = editor.camera();
    camera.borrow_mut().set_position_and_target(Vec3::new(0.0, 0.0, 8.0), Vec3::ZERO);
    let top = editor.create_view(Some("Top"));

    camera.borrow_mut().set_position_and_target(Vec3::new(4.0, 4.0, 4.0), Vec3::ZERO);
    assert!(editor.save_view_camera());
    assert!(editor
        .view(top)
        .unwrap()
        .camera_xfo()
        .tr
        .abs_diff_eq(Vec3::new(4.0, 4.0, 4.0), 1e-5));

    assert!(editor.undo());
    // Stored snapshot and live camera both return to the pre-save state.
    assert!(editor
        .view(top)
        .unwrap()
        .camera_xfo()
        .tr
        .abs_diff_eq(Vec3::new(0.0, 0.0, 8.0), 1e-5));
    assert!(camera.borrow().global_xfo().tr.abs_diff_eq(Vec3::new(0.0, 0.0, 8.0), 1e-5));
    assert_eq!(editor.active_view_name(), Some("Top"));
}

#[test]
fn undo_limit_trims_the_oldest_entries() {
    let (mut editor, a) = editor_with_part();
    let opacity = a.borrow_mut().add_param("Opacity", ParamValue::Number(0.0));
    editor.set_undo_limit(Some(2));

    editor.set_parameter_value(&opacity, ParamValue::Number(1.0));
    editor.set_parameter_value(&opacity, ParamValue::Number(2.0));
    editor.set_parameter_value(&opacity, ParamValue::Number(3.0));

    assert!(editor.undo());
    assert_eq!(opacity.borrow().value(), ParamValue::Number(2.0));
    assert!(editor.undo());
    assert_eq!(opacity.borrow().value(), ParamValue::Number(1.0));
    // The first edit fell off the bounded stack.
    assert!(!editor.can_undo());
    assert!(!editor.undo());
}

#[test]
fn drag_undo_restores_pre_drag_transforms() {
    let (mut editor, a) = editor_with_part();
    a.borrow().set_global_xfo(xfo_at(1.0));

    editor.set_selection(vec![a.clone()]);
    assert!(editor.begin_selection_drag());
    editor.update_selection_drag(&[xfo_at(4.0)]);
    editor.update_selection_drag(&[xfo_at(6.0)]);
    assert_eq!(a.borrow().global_xfo(), xfo_at(6.0));

    assert!(editor.undo());
    assert_eq!(a.borrow().global_xfo(), xfo_at(1.0));
    assert!(editor.redo());
    assert_eq!(a.borrow().global_xfo(), xfo_at(6.0));
}
