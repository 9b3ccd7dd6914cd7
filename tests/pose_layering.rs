use glam::Vec3;
use vantage_engine::math::Xfo;
use vantage_engine::pose::Pose;
use vantage_engine::scene::{ItemRef, ParamValue, SceneGraph};

fn build_scene() -> (SceneGraph, ItemRef, ItemRef) {
    let mut scene = SceneGraph::new();
    let root = scene.add_root("Asset");
    let a = scene.add_child(&root, "PartA");
    let b = scene.add_child(&root, "PartB");
    (scene, a, b)
}

fn xfo_at(x: f32) -> Xfo {
    Xfo::from_translation(Vec3::new(x, 0.0, 0.0))
}

#[test]
fn first_write_wins_for_only_new_stores() {
    let (_scene, a, _b) = build_scene();
    let param = a.borrow().global_xfo_param();
    let key = param.borrow().key();

    let mut pose = Pose::new();
    pose.store_param_value(&param, ParamValue::Xfo(xfo_at(1.0)), true);
    pose.store_param_value(&param, ParamValue::Xfo(xfo_at(2.0)), true);
    pose.store_param_value(&param, ParamValue::Xfo(xfo_at(3.0)), true);

    assert_eq!(pose.len(), 1);
    assert_eq!(pose.value(&key), Some(&ParamValue::Xfo(xfo_at(1.0))));
}

#[test]
fn unconditional_store_overwrites() {
    let (_scene, a, _b) = build_scene();
    let param = a.borrow().global_xfo_param();
    let key = param.borrow().key();

    let mut pose = Pose::new();
    pose.store_param_value(&param, ParamValue::Xfo(xfo_at(1.0)), false);
    pose.store_param_value(&param, ParamValue::Xfo(xfo_at(2.0)), false);

    assert_eq!(pose.value(&key), Some(&ParamValue::Xfo(xfo_at(2.0))));
}

#[test]
fn activate_applies_fallback_first_then_own_values() {
    let (_scene, a, b) = build_scene();
    let param_a = a.borrow().global_xfo_param();
    let param_b = b.borrow().global_xfo_param();

    let mut fallback = Pose::new();
    fallback.store_param_value(&param_a, ParamValue::Xfo(xfo_at(10.0)), false);
    fallback.store_param_value(&param_b, ParamValue::Xfo(xfo_at(20.0)), false);

    let mut pose = Pose::new();
    pose.store_param_value(&param_a, ParamValue::Xfo(xfo_at(1.0)), false);

    // Scrub the live values so activation visibly writes both layers.
    a.borrow().set_global_xfo(xfo_at(99.0));
    b.borrow().set_global_xfo(xfo_at(99.0));

    pose.activate(Some(&fallback));

    // Shared key: the pose's own value wins over the fallback.
    assert_eq!(a.borrow().global_xfo(), xfo_at(1.0));
    // Fallback-only key: restored to the fallback value.
    assert_eq!(b.borrow().global_xfo(), xfo_at(20.0));
}

#[test]
fn store_neutral_pose_preserves_first_capture() {
    let (_scene, a, _b) = build_scene();
    let key = a.borrow().global_xfo_param().borrow().key();

    a.borrow().set_global_xfo(xfo_at(5.0));
    let mut neutral = Pose::new();
    neutral.store_neutral_pose(&[a.clone()]);

    // Later edits must not disturb the first capture.
    a.borrow().set_global_xfo(xfo_at(6.0));
    neutral.store_neutral_pose(&[a.clone()]);

    assert_eq!(neutral.value(&key), Some(&ParamValue::Xfo(xfo_at(5.0))));
}

#[test]
fn store_tree_items_pose_tracks_latest_state() {
    let (_scene, a, _b) = build_scene();
    let key = a.borrow().global_xfo_param().borrow().key();

    a.borrow().set_global_xfo(xfo_at(5.0));
    let mut pose = Pose::new();
    pose.store_tree_items_pose(&[a.clone()]);

    a.borrow().set_global_xfo(xfo_at(6.0));
    pose.store_tree_items_pose(&[a.clone()]);

    assert_eq!(pose.value(&key), Some(&ParamValue::Xfo(xfo_at(6.0))));
}

#[test]
fn copy_from_merges_and_overwrites_conflicts() {
    let (_scene, a, b) = build_scene();
    let param_a = a.borrow().global_xfo_param();
    let param_b = b.borrow().global_xfo_param();
    let key_a = param_a.borrow().key();
    let key_b = param_b.borrow().key();

    let mut source = Pose::new();
    source.store_param_value(&param_a, ParamValue::Xfo(xfo_at(1.0)), false);
    source.store_param_value(&param_b, ParamValue::Xfo(xfo_at(2.0)), false);

    let mut target = Pose::new();
    target.store_param_value(&param_a, ParamValue::Xfo(xfo_at(7.0)), false);

    target.copy_from(&source);

    assert_eq!(target.len(), 2);
    assert_eq!(target.value(&key_a), Some(&ParamValue::Xfo(xfo_at(1.0))));
    assert_eq!(target.value(&key_b), Some(&ParamValue::Xfo(xfo_at(2.0))));
}

#[test]
fn hidden_items_reports_false_visibility_entries() {
    let (scene, a, b) = build_scene();
    let visible_a = a.borrow().visible_param();
    let visible_b = b.borrow().visible_param();

    let mut pose = Pose::new();
    pose.store_param_value(&visible_a, ParamValue::Bool(false), false);
    pose.store_param_value(&visible_b, ParamValue::Bool(true), false);

    let hidden = pose.hidden_items(&scene);
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].borrow().name(), "PartA");
}
