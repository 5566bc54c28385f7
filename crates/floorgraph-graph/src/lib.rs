pub mod geometry;
pub mod history;
pub mod hit_tester;
pub mod interaction;
pub mod layering;
pub mod projection;
pub mod scene;
pub mod selection;
pub mod spatial;

pub use geometry::{Affine2, Rect, Vec2};
pub use history::{History, Snapshot};
pub use hit_tester::{HitResult, HitTester};
pub use interaction::{
    DragAction, EdgeDefaults, EditContext, InteractionConfig, InteractionEngine,
    InteractionOutcome, NodeDefaults, PointerEvent, ToolMode, ViewTransform, resize_box,
};
pub use layering::{FloorLayer, assign_layers, edge_layer, node_layer};
pub use projection::{Camera, Projection, plan_center};
pub use scene::{EdgeSegment, NodePrism, Scene, SceneBuilder, SceneLayer};
pub use selection::Selection;
pub use spatial::{Corner, boxes_overlap, is_on_level, layer_level, levels_spanned};
