//! Integration tests driving the context menu controller into the store.

use std::sync::Arc;

use assert_matches::assert_matches;
use twitcanva_canvas::{CanvasMenuDispatcher, NodeStore};
use twitcanva_core::context_menu::{
    ConnectorSide, ContextMenuController, HitTarget, MenuChoice, MenuKind, MenuSelection,
    PointerEvent,
};
use twitcanva_core::error::CoreError;
use twitcanva_core::node::{GenerationConfig, Node, NodeType};
use twitcanva_core::viewport::{ViewportSize, ViewportTransform};

fn setup() -> (Arc<NodeStore>, CanvasMenuDispatcher, ContextMenuController) {
    let store = Arc::new(NodeStore::new());
    let dispatcher = CanvasMenuDispatcher::new(Arc::clone(&store), GenerationConfig::default());
    (store, dispatcher, ContextMenuController::new())
}

fn viewport() -> ViewportSize {
    ViewportSize {
        width: 1200.0,
        height: 800.0,
    }
}

#[test]
fn global_menu_creates_node_at_canvas_position() {
    let (store, dispatcher, mut menu) = setup();
    menu.handle_double_click(&PointerEvent {
        x: 300.0,
        y: 250.0,
        target: HitTarget::Background,
    });
    let transform = ViewportTransform {
        pan_x: 100.0,
        pan_y: 50.0,
        zoom: 2.0,
    };

    assert!(menu.select_option(MenuChoice::Create(NodeType::Image), transform, &dispatcher));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.nodes.len(), 1);
    let node = &snapshot.nodes[0];
    assert_eq!((node.x, node.y), (100.0, 100.0));
    assert!(node.is_root());
    assert_eq!(snapshot.selected, vec![node.id.clone()]);
    assert!(!menu.is_open());
}

#[test]
fn latest_menu_wins_before_selection() {
    let (store, dispatcher, mut menu) = setup();
    let source = store
        .add_node(Node::new(NodeType::Image, 0.0, 0.0, GenerationConfig::default()), false)
        .unwrap();

    menu.open_global_menu(10.0, 10.0);
    menu.open_node_options_menu(
        &PointerEvent {
            x: 20.0,
            y: 20.0,
            target: HitTarget::Node(source.clone()),
        },
        source.clone(),
    );
    assert_eq!(menu.state().kind, MenuKind::NodeOptions);

    menu.select_option(MenuChoice::Delete, ViewportTransform::default(), &dispatcher);

    assert!(store.snapshot().nodes.is_empty());
}

#[test]
fn right_connector_creates_linked_child() {
    let (store, dispatcher, mut menu) = setup();
    let source = store
        .add_node(Node::new(NodeType::Image, 50.0, 60.0, GenerationConfig::default()), false)
        .unwrap();

    menu.open_connector_menu(source.clone(), ConnectorSide::Right, viewport());
    let create_video = MenuChoice::Create(NodeType::Video);
    menu.select_option(create_video, ViewportTransform::default(), &dispatcher);

    let snapshot = store.snapshot();
    let child = snapshot.nodes.iter().find(|n| n.id != source).unwrap();
    assert_eq!(child.node_type, NodeType::Video);
    assert_eq!(child.parent_ids, vec![source]);
    assert_eq!((child.x, child.y), (490.0, 60.0));
}

#[test]
fn left_connector_creates_new_parent() {
    let (store, dispatcher, mut menu) = setup();
    let target = store
        .add_node(Node::new(NodeType::Video, 500.0, 0.0, GenerationConfig::default()), false)
        .unwrap();

    menu.open_connector_menu(target.clone(), ConnectorSide::Left, viewport());
    let create_image = MenuChoice::Create(NodeType::Image);
    menu.select_option(create_image, ViewportTransform::default(), &dispatcher);

    let snapshot = store.snapshot();
    let upstream = snapshot.nodes.iter().find(|n| n.id != target).unwrap();
    assert!(upstream.is_root());
    assert_eq!((upstream.x, upstream.y), (60.0, 0.0));
    assert_eq!(snapshot.node(&target).unwrap().parent_ids, vec![upstream.id.clone()]);
}

#[test]
fn delete_from_global_menu_is_ignored() {
    let (store, dispatcher, mut menu) = setup();
    store
        .add_node(Node::new(NodeType::Text, 0.0, 0.0, GenerationConfig::default()), false)
        .unwrap();

    menu.open_global_menu(0.0, 0.0);
    assert!(menu.select_option(MenuChoice::Delete, ViewportTransform::default(), &dispatcher));

    assert_eq!(store.snapshot().nodes.len(), 1);
}

#[test]
fn selection_on_vanished_source_reports_not_found() {
    let (store, dispatcher, mut menu) = setup();
    let source = store
        .add_node(Node::new(NodeType::Image, 0.0, 0.0, GenerationConfig::default()), false)
        .unwrap();
    menu.open_connector_menu(source.clone(), ConnectorSide::Right, viewport());
    store.remove_node(&source).unwrap();

    let selection = MenuSelection {
        menu: menu.state().clone(),
        choice: MenuChoice::Create(NodeType::Image),
        viewport: ViewportTransform::default(),
    };

    assert_matches!(dispatcher.apply(&selection), Err(CoreError::NotFound { .. }));
    assert!(store.snapshot().nodes.is_empty());
}

#[test]
fn global_create_rejects_degenerate_zoom() {
    let (store, dispatcher, mut menu) = setup();
    menu.open_global_menu(100.0, 100.0);

    let selection = MenuSelection {
        menu: menu.state().clone(),
        choice: MenuChoice::Create(NodeType::Text),
        viewport: ViewportTransform {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 0.0,
        },
    };

    assert_matches!(dispatcher.apply(&selection), Err(CoreError::Validation(_)));
    assert_eq!(store.revision(), 0);
}
