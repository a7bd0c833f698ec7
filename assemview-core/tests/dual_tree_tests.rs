//! Integration tests for the dual-tree builder and tree interaction
//!
//! A recording loader holds on to every request so each test decides when
//! (and in which order) meshes arrive.

use std::sync::Mutex;

use assemview_core::*;

#[derive(Default)]
struct RecordingLoader {
    requests: Mutex<Vec<(MeshRequest, CompletionSender)>>,
}

impl MeshLoader for RecordingLoader {
    fn load(&self, request: MeshRequest, completions: CompletionSender) {
        self.requests.lock().unwrap().push((request, completions));
    }
}

impl RecordingLoader {
    fn references(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(r, _)| r.reference.clone())
            .collect()
    }

    /// Complete the requests at the given positions, in that order
    fn complete(&self, order: &[usize]) {
        let requests = self.requests.lock().unwrap();
        for &i in order {
            let (request, sender) = &requests[i];
            assert!(sender.complete(request.node, triangle()));
        }
    }

    fn complete_all(&self) {
        let count = self.requests.lock().unwrap().len();
        self.complete(&(0..count).collect::<Vec<_>>());
    }
}

fn triangle() -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2]],
    )
}

fn item_named(ctx: &ViewerContext, name: &str) -> TreeItemId {
    ctx.tree()
        .visible_rows()
        .into_iter()
        .find(|row| row.label == name)
        .map(|row| row.id)
        .unwrap_or_else(|| panic!("no tree item named {name}"))
}

fn scene_child_names(ctx: &ViewerContext, id: SceneNodeId) -> Vec<String> {
    ctx.scene()
        .children(id)
        .iter()
        .map(|c| ctx.scene().get(*c).unwrap().name.clone())
        .collect()
}

fn tree_child_names(ctx: &ViewerContext, id: TreeItemId) -> Vec<String> {
    ctx.tree()
        .get(id)
        .unwrap()
        .children()
        .iter()
        .map(|c| ctx.tree().get(*c).unwrap().label.clone())
        .collect()
}

#[test]
fn test_one_tree_item_per_assembly_node() {
    let loader = RecordingLoader::default();
    let ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();

    assert_eq!(ctx.tree().len(), ctx.assembly().node_count());
    assert_eq!(ctx.bindings().len(), 7);
    assert_eq!(
        loader.references(),
        ["cube1.stl", "cube2.stl", "cube3.stl", "cube4.stl", "cube5.stl"]
    );
}

#[test]
fn test_groups_bound_at_build_leaves_after_pump() {
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();

    assert!(ctx.bindings().is_bound(item_named(&ctx, "assembly")));
    assert!(ctx.bindings().is_bound(item_named(&ctx, "group")));
    assert!(!ctx.bindings().is_bound(item_named(&ctx, "cube1")));
    assert_eq!(ctx.pending_loads(), 5);

    // completions sit in the channel until pumped
    loader.complete_all();
    assert!(!ctx.bindings().is_bound(item_named(&ctx, "cube1")));

    assert_eq!(ctx.pump().unwrap(), 5);
    assert_eq!(ctx.pending_loads(), 0);
    assert!(ctx.bindings().unbound().is_empty());
    assert_eq!(ctx.scene().drawables().len(), 5);
}

#[test]
fn test_label_click_before_load_is_noop() {
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();
    let cube2 = item_named(&ctx, "cube2");

    let outcome = ctx.handle_click(TreeClick::label(cube2)).unwrap();
    assert_eq!(outcome, ClickOutcome::Ignored);
    assert_eq!(ctx.tree().get(cube2).unwrap().label_style, LabelStyle::Normal);

    loader.complete_all();
    ctx.pump().unwrap();
    assert!(matches!(
        ctx.handle_click(TreeClick::label(cube2)).unwrap(),
        ClickOutcome::VisibilityToggled { visible: false, .. }
    ));
}

#[test]
fn test_double_label_toggle_restores_state() {
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();
    loader.complete_all();
    ctx.pump().unwrap();

    let cube4 = item_named(&ctx, "cube4");
    let node = ctx.bindings().scene_node_for(cube4).unwrap();

    ctx.handle_click(TreeClick::label(cube4)).unwrap();
    assert!(!ctx.scene().get(node).unwrap().visible);
    assert_eq!(ctx.tree().get(cube4).unwrap().label_style, LabelStyle::Hidden);
    assert_eq!(ctx.scene().drawables().len(), 4);

    ctx.handle_click(TreeClick::label(cube4)).unwrap();
    assert!(ctx.scene().get(node).unwrap().visible);
    assert_eq!(ctx.tree().get(cube4).unwrap().label_style, LabelStyle::Normal);
    assert_eq!(ctx.scene().drawables().len(), 5);
}

#[test]
fn test_hiding_group_keeps_child_flags() {
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();
    loader.complete_all();
    ctx.pump().unwrap();

    let group = item_named(&ctx, "group");
    let cube3 = item_named(&ctx, "cube3");
    ctx.handle_click(TreeClick::label(group)).unwrap();

    let cube3_node = ctx.bindings().scene_node_for(cube3).unwrap();
    assert!(ctx.scene().get(cube3_node).unwrap().visible);
    assert!(!ctx.scene().is_effectively_visible(cube3_node));
    assert_eq!(ctx.tree().get(cube3).unwrap().label_style, LabelStyle::Normal);

    let drawn: Vec<String> = ctx
        .scene()
        .drawables()
        .iter()
        .map(|d| ctx.scene().get(d.id).unwrap().name.clone())
        .collect();
    assert_eq!(drawn, ["cube1", "cube2", "cube5"]);
}

#[test]
fn test_expander_click_toggles_only_that_item() {
    let nested = Assembly::new(AssemblyNode::group(
        "root",
        Transform3D::identity(),
        vec![AssemblyNode::group(
            "outer",
            Transform3D::identity(),
            vec![AssemblyNode::group(
                "inner",
                Transform3D::identity(),
                vec![AssemblyNode::leaf("part", Transform3D::identity(), "part.stl")],
            )],
        )],
    ));
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(nested, &loader).unwrap();
    let outer = item_named(&ctx, "outer");
    let inner = item_named(&ctx, "inner");
    let root = item_named(&ctx, "root");

    let outcome = ctx.handle_click(TreeClick::expander(outer)).unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::ExpandToggled {
            item: outer,
            state: ExpandState::Collapsed
        }
    );

    let rows = ctx.tree().visible_rows();
    let labels: Vec<&str> = rows.iter().map(|r| r.label).collect();
    assert_eq!(labels, ["root", "outer"]);
    assert_eq!(rows[1].glyph, Some(EXPAND_GLYPH));
    assert_eq!(rows[0].glyph, Some(COLLAPSE_GLYPH));
    assert_eq!(ctx.tree().get(inner).unwrap().expander(), Some(ExpandState::Expanded));
    assert_eq!(ctx.tree().get(root).unwrap().expander(), Some(ExpandState::Expanded));

    ctx.handle_click(TreeClick::expander(outer)).unwrap();
    assert_eq!(ctx.tree().visible_rows().len(), 4);
}

#[test]
fn test_expander_click_leaves_sibling_group_expanded() {
    let siblings = Assembly::new(AssemblyNode::group(
        "root",
        Transform3D::identity(),
        vec![
            AssemblyNode::group(
                "g1",
                Transform3D::identity(),
                vec![AssemblyNode::leaf("p1", Transform3D::identity(), "p1.stl")],
            ),
            AssemblyNode::group(
                "g2",
                Transform3D::identity(),
                vec![AssemblyNode::leaf("p2", Transform3D::identity(), "p2.stl")],
            ),
        ],
    ));
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(siblings, &loader).unwrap();
    let g1 = item_named(&ctx, "g1");
    let g2 = item_named(&ctx, "g2");

    ctx.handle_click(TreeClick::expander(g1)).unwrap();

    let rows = ctx.tree().visible_rows();
    let labels: Vec<&str> = rows.iter().map(|r| r.label).collect();
    assert_eq!(labels, ["root", "g1", "g2", "p2"]);
    assert_eq!(rows[1].glyph, Some(EXPAND_GLYPH));
    assert_eq!(rows[2].glyph, Some(COLLAPSE_GLYPH));
    assert_eq!(ctx.tree().get(g1).unwrap().expander(), Some(ExpandState::Collapsed));
    assert_eq!(ctx.tree().get(g2).unwrap().expander(), Some(ExpandState::Expanded));
}

#[test]
fn test_declared_order_survives_reversed_completion() {
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();

    loader.complete(&[4, 3, 2, 1, 0]);
    assert_eq!(ctx.pump().unwrap(), 5);

    let root_scene = ctx.scene().children(ctx.scene().root())[0];
    assert_eq!(scene_child_names(&ctx, root_scene), ["cube1", "cube2", "group", "cube5"]);
    let group_scene = ctx.bindings().scene_node_for(item_named(&ctx, "group")).unwrap();
    assert_eq!(scene_child_names(&ctx, group_scene), ["cube3", "cube4"]);

    let root_item = item_named(&ctx, "assembly");
    assert_eq!(tree_child_names(&ctx, root_item), ["cube1", "cube2", "group", "cube5"]);

    let drawn: Vec<String> = ctx
        .scene()
        .drawables()
        .iter()
        .map(|d| ctx.scene().get(d.id).unwrap().name.clone())
        .collect();
    assert_eq!(drawn, ["cube1", "cube2", "cube3", "cube4", "cube5"]);
}

#[test]
fn test_empty_children_is_an_expandable_group() {
    let json = r#"{
      "name": "root", "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1],
      "children": [
        { "name": "empty", "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1], "children": [] }
      ]
    }"#;
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::from_json_str(json).unwrap(), &loader).unwrap();
    let empty = item_named(&ctx, "empty");

    assert!(ctx.tree().get(empty).unwrap().is_expandable());
    assert!(ctx.tree().get(empty).unwrap().children().is_empty());
    assert!(ctx.bindings().is_bound(empty));
    assert!(loader.references().is_empty());
    assert!(matches!(
        ctx.handle_click(TreeClick::expander(empty)).unwrap(),
        ClickOutcome::ExpandToggled { state: ExpandState::Collapsed, .. }
    ));
}

#[test]
fn test_failed_load_stays_unbound() {
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();

    // cube2 never completes
    loader.complete(&[0, 2, 3, 4]);
    assert_eq!(ctx.pump().unwrap(), 4);

    let unbound: Vec<NodeId> = ctx.bindings().unbound().iter().map(|b| b.node).collect();
    assert_eq!(unbound, [NodeId(2)]);
    assert_eq!(ctx.pending_loads(), 1);
    assert_eq!(
        ctx.handle_click(TreeClick::label(item_named(&ctx, "cube2"))).unwrap(),
        ClickOutcome::Ignored
    );
}

#[test]
fn test_world_transforms_follow_assembly_matrices() {
    let loader = RecordingLoader::default();
    let mut ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();
    loader.complete_all();
    ctx.pump().unwrap();

    let cube4 = ctx.bindings().scene_node_for(item_named(&ctx, "cube4")).unwrap();
    let world = ctx.scene().world_transform(cube4).unwrap();
    assert_eq!(world.translation_part(), Vector3f::new(1.0, 0.0, 0.0));
}

#[test]
fn test_teardown_discards_late_completions() {
    let loader = RecordingLoader::default();
    let ctx = ViewerContext::new(Assembly::sample(), &loader).unwrap();

    let assembly = ctx.teardown();
    assert_eq!(assembly, Assembly::sample());

    let requests = loader.requests.lock().unwrap();
    let (request, sender) = &requests[0];
    assert!(!sender.complete(request.node, triangle()));
}
