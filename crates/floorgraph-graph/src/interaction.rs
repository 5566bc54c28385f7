//! Pointer-driven editing state machine.
//!
//! The engine owns only gesture state. Everything it edits is borrowed per
//! call through [`EditContext`], and each call reports what happened as an
//! [`InteractionOutcome`] for the caller to react to.

use crate::geometry::{Rect, Vec2};
use crate::history::History;
use crate::hit_tester::{HitResult, HitTester};
use crate::selection::Selection;
use crate::spatial::{Corner, nodes_overlapping};
use floorgraph_core::{
    BoundingBox, EdgeId, GraphDocument, GraphEdge, GraphNode, NodeId, NodePatch, NodeType,
    floor_extent, is_valid_traversal_time,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Externally selected tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolMode {
    #[default]
    Select,
    AddNode,
    AddEdge,
}

/// Gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragAction {
    #[default]
    Idle,
    Move,
    Resize(Corner),
    Create,
    SelectBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Smallest width/height a drawn or resized node may have.
    pub min_box_size: f64,
    /// Half extent of a resize handle.
    pub handle_size: f64,
    pub edge_hit_tolerance: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_box_size: 10.0,
            handle_size: 8.0,
            edge_hit_tolerance: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    pub node_type: NodeType,
    pub capacity: u32,
    pub safety_level: i32,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            node_type: NodeType::Classroom,
            capacity: 30,
            safety_level: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDefaults {
    pub traversal_time: f64,
    pub capacity: u32,
}

impl Default for EdgeDefaults {
    fn default() -> Self {
        Self {
            traversal_time: 10.0,
            capacity: 50,
        }
    }
}

impl EdgeDefaults {
    /// Replace an unusable traversal time with the built-in default.
    pub fn validated(self) -> Self {
        if is_valid_traversal_time(self.traversal_time) {
            return self;
        }
        tracing::warn!(
            traversal_time = self.traversal_time,
            "invalid default traversal time, using built-in default"
        );
        Self {
            traversal_time: Self::default().traversal_time,
            ..self
        }
    }
}

/// Pan/zoom of the 2D editor: `screen = local * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub offset: Vec2,
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn screen_to_local(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) * (1.0 / self.scale)
    }

    pub fn local_to_screen(&self, local: Vec2) -> Vec2 {
        local * self.scale + self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Screen position; converted through the view transform.
    pub position: Vec2,
    /// Multi-select modifier (shift/ctrl).
    pub modifier: bool,
}

impl PointerEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            modifier: false,
        }
    }

    pub fn with_modifier(mut self) -> Self {
        self.modifier = true;
        self
    }
}

/// Everything an interaction may read or write, borrowed for one event.
pub struct EditContext<'a> {
    pub document: &'a mut GraphDocument,
    pub selection: &'a mut Selection,
    pub history: &'a mut History,
    /// Level of the floor being edited, if any.
    pub active_level: Option<i32>,
}

impl EditContext<'_> {
    fn commit(&mut self) {
        self.history
            .commit(self.document.nodes(), self.document.edges());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    /// The event had no effect.
    Ignored,
    SelectionChanged,
    /// A move or resize gesture began.
    DragStarted(DragAction),
    /// The live document changed mid-gesture; nothing committed yet.
    Dragged,
    PreviewUpdated(Rect),
    /// A move/resize ended and its net effect was committed.
    Committed,
    /// A create gesture was too small and was dropped.
    Discarded,
    NodeCreated(NodeId),
    EdgeSourceLatched(NodeId),
    EdgeCreated(EdgeId),
    EdgeCancelled,
}

#[derive(Debug, Clone, Default)]
struct Gesture {
    action: DragAction,
    anchor: Vec2,
    last: Vec2,
    modified: bool,
    additive: bool,
    resize_target: Option<NodeId>,
}

pub struct InteractionEngine {
    mode: ToolMode,
    gesture: Gesture,
    preview: Option<Rect>,
    pending_source: Option<NodeId>,
    view: ViewTransform,
    config: InteractionConfig,
    node_defaults: NodeDefaults,
    edge_defaults: EdgeDefaults,
    hit_tester: HitTester,
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self::new(
            InteractionConfig::default(),
            NodeDefaults::default(),
            EdgeDefaults::default(),
        )
    }
}

impl InteractionEngine {
    pub fn new(
        config: InteractionConfig,
        node_defaults: NodeDefaults,
        edge_defaults: EdgeDefaults,
    ) -> Self {
        Self {
            mode: ToolMode::default(),
            gesture: Gesture::default(),
            preview: None,
            pending_source: None,
            view: ViewTransform::default(),
            config,
            node_defaults,
            edge_defaults,
            hit_tester: HitTester::new(config.handle_size, config.edge_hit_tolerance),
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn action(&self) -> DragAction {
        self.gesture.action
    }

    /// Rubber-band rectangle of an in-progress create or box select.
    pub fn preview(&self) -> Option<Rect> {
        self.preview
    }

    pub fn pending_source(&self) -> Option<&NodeId> {
        self.pending_source.as_ref()
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Switch tools. Drops the edge latch and any gesture in flight.
    pub fn set_mode(&mut self, ctx: &mut EditContext<'_>, mode: ToolMode) {
        self.cancel(ctx);
        self.cancel_pending_edge();
        self.mode = mode;
    }

    pub fn cancel_pending_edge(&mut self) -> bool {
        let had = self.pending_source.take().is_some();
        if had {
            tracing::debug!("edge latch cancelled");
        }
        had
    }

    /// Abort the current gesture. Uncommitted drag edits are rolled back to
    /// the last history snapshot.
    pub fn cancel(&mut self, ctx: &mut EditContext<'_>) {
        let rollback = matches!(
            self.gesture.action,
            DragAction::Move | DragAction::Resize(_)
        ) && self.gesture.modified;
        if rollback {
            let snapshot = ctx.history.current();
            ctx.document
                .replace_graph(snapshot.nodes.clone(), snapshot.edges.clone());
            tracing::debug!("uncommitted drag rolled back");
        }
        self.gesture = Gesture::default();
        self.preview = None;
    }

    /// Forget a latch whose source node no longer exists.
    pub fn revalidate(&mut self, doc: &GraphDocument) {
        if self
            .pending_source
            .as_ref()
            .is_some_and(|id| !doc.contains_node(id))
        {
            self.pending_source = None;
        }
    }

    fn start(&mut self, action: DragAction, at: Vec2, additive: bool) {
        self.gesture = Gesture {
            action,
            anchor: at,
            last: at,
            modified: false,
            additive,
            resize_target: None,
        };
    }

    fn hit(&mut self, ctx: &EditContext<'_>, at: Vec2) -> HitResult {
        let Some(level) = ctx.active_level else {
            return HitResult::None;
        };
        let handle_owner = match self.mode {
            ToolMode::Select => ctx.selection.single_node(),
            _ => None,
        };
        self.hit_tester.update(ctx.document, level, handle_owner);
        self.hit_tester.hit_test(at)
    }

    pub fn pointer_down(
        &mut self,
        ctx: &mut EditContext<'_>,
        event: PointerEvent,
    ) -> InteractionOutcome {
        if self.gesture.action != DragAction::Idle {
            // The matching pointer-up never arrived.
            self.cancel(ctx);
        }
        let at = self.view.screen_to_local(event.position);
        let hit = self.hit(ctx, at);

        match self.mode {
            ToolMode::Select => self.select_down(ctx, hit, at, event.modifier),
            ToolMode::AddNode => {
                self.start(DragAction::Create, at, false);
                self.preview = Some(Rect::from_points(at, at));
                InteractionOutcome::PreviewUpdated(Rect::from_points(at, at))
            }
            ToolMode::AddEdge => match hit {
                HitResult::Node(id) | HitResult::Handle { node_id: id, .. } => {
                    self.connect_click(ctx, id)
                }
                _ => InteractionOutcome::Ignored,
            },
        }
    }

    fn select_down(
        &mut self,
        ctx: &mut EditContext<'_>,
        hit: HitResult,
        at: Vec2,
        modifier: bool,
    ) -> InteractionOutcome {
        match hit {
            HitResult::Handle { node_id, corner } => {
                self.start(DragAction::Resize(corner), at, false);
                self.gesture.resize_target = Some(node_id);
                InteractionOutcome::DragStarted(DragAction::Resize(corner))
            }
            HitResult::Node(id) => {
                if modifier {
                    ctx.selection.toggle(id);
                } else if !ctx.selection.contains_node(&id) {
                    ctx.selection.select_only(id);
                    ctx.selection.select_edge(None);
                }
                self.start(DragAction::Move, at, false);
                InteractionOutcome::DragStarted(DragAction::Move)
            }
            HitResult::Edge(id) => {
                if !modifier {
                    ctx.selection.clear_nodes();
                }
                ctx.selection.select_edge(Some(id));
                InteractionOutcome::SelectionChanged
            }
            HitResult::None => {
                if !modifier {
                    ctx.selection.clear();
                }
                self.start(DragAction::SelectBox, at, modifier);
                self.preview = Some(Rect::from_points(at, at));
                InteractionOutcome::SelectionChanged
            }
        }
    }

    fn connect_click(&mut self, ctx: &mut EditContext<'_>, clicked: NodeId) -> InteractionOutcome {
        let source = self
            .pending_source
            .take()
            .filter(|id| ctx.document.contains_node(id));

        match source {
            None => {
                ctx.selection.select_only(clicked.clone());
                ctx.selection.select_edge(None);
                self.pending_source = Some(clicked.clone());
                InteractionOutcome::EdgeSourceLatched(clicked)
            }
            Some(source) if source == clicked => {
                tracing::debug!(node = %clicked, "edge latch cancelled by re-click");
                InteractionOutcome::EdgeCancelled
            }
            Some(source) => {
                let edge = GraphEdge {
                    id: EdgeId::generate(),
                    source,
                    target: clicked,
                    traversal_time: self.edge_defaults.traversal_time,
                    capacity: self.edge_defaults.capacity,
                    active: true,
                    bidirectional: true,
                };
                let id = edge.id.clone();
                tracing::debug!(edge = %id, source = %edge.source, target = %edge.target, "edge created");
                ctx.document.add_edge(edge);
                ctx.commit();
                InteractionOutcome::EdgeCreated(id)
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        ctx: &mut EditContext<'_>,
        event: PointerEvent,
    ) -> InteractionOutcome {
        let at = self.view.screen_to_local(event.position);
        match self.gesture.action {
            DragAction::Idle => InteractionOutcome::Ignored,
            DragAction::Create | DragAction::SelectBox => {
                let rect = Rect::from_points(self.gesture.anchor, at);
                self.preview = Some(rect);
                InteractionOutcome::PreviewUpdated(rect)
            }
            DragAction::Move => {
                let delta = at - self.gesture.last;
                self.gesture.last = at;
                if delta == Vec2::ZERO || ctx.selection.nodes().is_empty() {
                    return InteractionOutcome::Ignored;
                }
                let patches: Vec<(NodeId, NodePatch)> = ctx
                    .selection
                    .nodes()
                    .iter()
                    .filter_map(|id| ctx.document.node(id))
                    .map(|node| {
                        let moved = node.bounding_box.translated(delta.x, delta.y);
                        (node.id.clone(), NodePatch::bounding_box(moved))
                    })
                    .collect();
                ctx.document.update_nodes(patches);
                self.gesture.modified = true;
                InteractionOutcome::Dragged
            }
            DragAction::Resize(corner) => {
                let delta = at - self.gesture.last;
                self.gesture.last = at;
                let Some(target) = self.gesture.resize_target.clone() else {
                    return InteractionOutcome::Ignored;
                };
                if ctx.selection.single_node() != Some(&target) {
                    return InteractionOutcome::Ignored;
                }
                let Some(node) = ctx.document.node(&target) else {
                    return InteractionOutcome::Ignored;
                };
                let resized = resize_box(
                    node.bounding_box,
                    corner,
                    delta,
                    self.config.min_box_size,
                );
                ctx.document
                    .update_node(&target, NodePatch::bounding_box(resized));
                self.gesture.modified = true;
                InteractionOutcome::Dragged
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        ctx: &mut EditContext<'_>,
        event: PointerEvent,
    ) -> InteractionOutcome {
        let at = self.view.screen_to_local(event.position);
        let gesture = std::mem::take(&mut self.gesture);
        self.preview = None;

        match gesture.action {
            DragAction::Idle => InteractionOutcome::Ignored,
            DragAction::Create => {
                let rect = Rect::from_points(gesture.anchor, at);
                self.finish_create(ctx, rect)
            }
            DragAction::SelectBox => {
                let rect = Rect::from_points(gesture.anchor, at);
                let hits = match ctx.active_level {
                    Some(level) => nodes_overlapping(&rect, ctx.document.nodes(), level),
                    None => Vec::new(),
                };
                if gesture.additive {
                    ctx.selection.extend_nodes(hits);
                } else {
                    ctx.selection.replace_nodes(hits);
                }
                InteractionOutcome::SelectionChanged
            }
            DragAction::Move | DragAction::Resize(_) => {
                if gesture.modified {
                    ctx.commit();
                    InteractionOutcome::Committed
                } else {
                    InteractionOutcome::Ignored
                }
            }
        }
    }

    fn finish_create(&mut self, ctx: &mut EditContext<'_>, rect: Rect) -> InteractionOutcome {
        let min = self.config.min_box_size;
        let Some(level) = ctx.active_level else {
            tracing::debug!("create discarded: no active floor");
            return InteractionOutcome::Discarded;
        };
        if rect.width() < min || rect.height() < min {
            tracing::debug!(
                width = rect.width(),
                height = rect.height(),
                "create discarded: below minimum size"
            );
            return InteractionOutcome::Discarded;
        }

        let (z1, z2) = floor_extent(level);
        let node = GraphNode {
            id: NodeId::generate(),
            label: format!("Room {}", ctx.document.nodes().len() + 1),
            node_type: self.node_defaults.node_type,
            capacity: self.node_defaults.capacity,
            safety_level: self.node_defaults.safety_level,
            floor_levels: BTreeSet::from([level]),
            bounding_box: BoundingBox {
                x1: rect.min.x,
                y1: rect.min.y,
                x2: rect.max.x,
                y2: rect.max.y,
                z1,
                z2,
            },
        };
        let id = node.id.clone();
        tracing::debug!(node = %id, level, "node created");
        ctx.document.add_node(node);
        ctx.selection.select_only(id.clone());
        ctx.selection.select_edge(None);
        ctx.commit();
        InteractionOutcome::NodeCreated(id)
    }
}

/// Move the two coordinates owned by `corner` by `delta`, then clamp the
/// moved side so neither axis drops below `min_size`.
pub fn resize_box(bbox: BoundingBox, corner: Corner, delta: Vec2, min_size: f64) -> BoundingBox {
    let mut out = bbox;
    if corner.owns_min_x() {
        out.x1 += delta.x;
        if out.x2 - out.x1 < min_size {
            out.x1 = out.x2 - min_size;
        }
    } else {
        out.x2 += delta.x;
        if out.x2 - out.x1 < min_size {
            out.x2 = out.x1 + min_size;
        }
    }
    if corner.owns_min_y() {
        out.y1 += delta.y;
        if out.y2 - out.y1 < min_size {
            out.y1 = out.y2 - min_size;
        }
    } else {
        out.y2 += delta.y;
        if out.y2 - out.y1 < min_size {
            out.y2 = out.y1 + min_size;
        }
    }
    out
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn corner_strategy() -> impl Strategy<Value = Corner> {
        prop::sample::select(Corner::ALL.to_vec())
    }

    proptest! {
        /// Resizing never yields a box under the minimum size or with swapped axes.
        #[test]
        fn prop_resize_respects_minimum(
            x in -500.0f64..500.0,
            y in -500.0f64..500.0,
            w in 10.0f64..300.0,
            h in 10.0f64..300.0,
            steps in prop::collection::vec((corner_strategy(), -400.0f64..400.0, -400.0f64..400.0), 1..20)
        ) {
            let mut bbox = BoundingBox::from_corners((x, y, 0.0), (x + w, y + h, 300.0));
            for (corner, dx, dy) in steps {
                bbox = resize_box(bbox, corner, Vec2::new(dx, dy), 10.0);
                prop_assert!(bbox.is_ordered());
                prop_assert!(bbox.width() >= 10.0 - 1e-9);
                prop_assert!(bbox.height() >= 10.0 - 1e-9);
            }
        }

        /// Created nodes always have ordered boxes, whatever the drag direction.
        #[test]
        fn prop_created_boxes_are_ordered(
            ax in -200.0f64..200.0, ay in -200.0f64..200.0,
            bx in -200.0f64..200.0, by in -200.0f64..200.0,
            level in -2i32..4
        ) {
            let mut doc = GraphDocument::new();
            let mut selection = Selection::new();
            let mut history = History::new();
            let mut engine = InteractionEngine::default();
            let mut ctx = EditContext {
                document: &mut doc,
                selection: &mut selection,
                history: &mut history,
                active_level: Some(level),
            };
            engine.set_mode(&mut ctx, ToolMode::AddNode);
            engine.pointer_down(&mut ctx, PointerEvent::at(ax, ay));
            engine.pointer_move(&mut ctx, PointerEvent::at(bx, by));
            engine.pointer_up(&mut ctx, PointerEvent::at(bx, by));

            for node in doc.nodes() {
                prop_assert!(node.bounding_box.is_ordered());
                prop_assert!(node.bounding_box.width() >= 10.0);
            }
        }

        /// Union box-select never shrinks the selection.
        #[test]
        fn prop_union_box_select_is_superset(
            rooms in prop::collection::vec((0.0f64..400.0, 0.0f64..400.0), 1..8),
            preselect in prop::collection::vec(any::<bool>(), 8),
            ax in 0.0f64..450.0, ay in 0.0f64..450.0,
            bx in 0.0f64..450.0, by in 0.0f64..450.0
        ) {
            let mut doc = GraphDocument::new();
            for (i, (x, y)) in rooms.iter().enumerate() {
                doc.add_node(GraphNode {
                    id: NodeId::new(format!("n{i}")),
                    label: format!("n{i}"),
                    node_type: NodeType::Classroom,
                    capacity: 1,
                    safety_level: 1,
                    floor_levels: BTreeSet::from([0]),
                    bounding_box: BoundingBox::from_corners((*x, *y, 0.0), (x + 20.0, y + 20.0, 300.0)),
                });
            }
            let mut selection = Selection::new();
            selection.replace_nodes(
                doc.nodes()
                    .iter()
                    .zip(&preselect)
                    .filter(|(_, keep)| **keep)
                    .map(|(n, _)| n.id.clone()),
            );
            let before = selection.nodes().clone();
            let mut history = History::new();
            let mut engine = InteractionEngine::default();
            let mut ctx = EditContext {
                document: &mut doc,
                selection: &mut selection,
                history: &mut history,
                active_level: Some(0),
            };

            // Start outside every room so the press lands on empty canvas.
            engine.pointer_down(&mut ctx, PointerEvent::at(-50.0, -50.0).with_modifier());
            engine.pointer_move(&mut ctx, PointerEvent::at(ax, ay).with_modifier());
            engine.pointer_up(&mut ctx, PointerEvent::at(bx, by).with_modifier());

            prop_assert!(selection.nodes().is_superset(&before));
        }
    }
}
