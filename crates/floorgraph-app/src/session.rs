use crate::error::{ExportError, ExtractionError, SessionError};
use crate::extraction::{
    ExtractionRequest, ExtractionResult, FloorPlanExtractor, MergeReport, PreparedImage,
    plan_merge,
};
use crate::persist::PersistedDocument;
use crate::settings::EditorSettings;
use crate::tabular;
use floorgraph_core::document::Removed;
use floorgraph_core::{EdgeId, EdgePatch, Floor, FloorId, GraphDocument, NodeId, NodePatch};
use floorgraph_graph::{
    Camera, EditContext, FloorLayer, History, InteractionEngine, InteractionOutcome,
    PointerEvent, Scene, SceneBuilder, Selection, Snapshot, ToolMode, ViewTransform,
    assign_layers, levels_spanned,
};
use std::path::Path;

/// One open editing session: the document plus everything that edits it.
pub struct EditorSession {
    settings: EditorSettings,
    document: GraphDocument,
    history: History,
    selection: Selection,
    engine: InteractionEngine,
    camera: Camera,
    active_floor: Option<FloorId>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl EditorSession {
    pub fn new(mut settings: EditorSettings) -> Self {
        settings.edge_defaults = settings.edge_defaults.validated();
        let engine = InteractionEngine::new(
            settings.interaction,
            settings.node_defaults,
            settings.edge_defaults,
        );
        Self {
            camera: settings.camera.clamped(),
            settings,
            document: GraphDocument::new(),
            history: History::new(),
            selection: Selection::new(),
            engine,
            active_floor: None,
        }
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn engine(&self) -> &InteractionEngine {
        &self.engine
    }

    fn edit<R>(&mut self, f: impl FnOnce(&mut InteractionEngine, &mut EditContext<'_>) -> R) -> R {
        let active_level = self.active_level();
        let mut ctx = EditContext {
            document: &mut self.document,
            selection: &mut self.selection,
            history: &mut self.history,
            active_level,
        };
        f(&mut self.engine, &mut ctx)
    }

    fn commit(&mut self) {
        self.history
            .commit(self.document.nodes(), self.document.edges());
    }

    // ---- floors ----

    pub fn active_floor(&self) -> Option<&Floor> {
        self.active_floor
            .as_ref()
            .and_then(|id| self.document.floor(id))
    }

    pub fn active_level(&self) -> Option<i32> {
        self.active_floor().map(|f| f.level)
    }

    /// Add a floor. The first floor added becomes the active one.
    pub fn add_floor(
        &mut self,
        name: &str,
        level: i32,
        image_url: &str,
        width: u32,
        height: u32,
    ) -> Result<FloorId, SessionError> {
        if self.document.floor_by_level(level).is_some() {
            return Err(SessionError::DuplicateFloorLevel(level));
        }
        let floor = Floor {
            id: FloorId::generate(),
            level,
            name: name.to_string(),
            image_url: image_url.to_string(),
            width,
            height,
        };
        let id = floor.id.clone();
        if !self.document.add_floor(floor) {
            return Err(SessionError::DuplicateFloorId(id));
        }
        tracing::info!(floor = %id, level, "floor added");
        if self.active_floor().is_none() {
            self.active_floor = Some(id.clone());
        }
        Ok(id)
    }

    pub fn add_floor_from_image(
        &mut self,
        name: &str,
        level: i32,
        image: PreparedImage,
    ) -> Result<FloorId, SessionError> {
        self.add_floor(name, level, &image.encoded_image, image.width, image.height)
    }

    /// Remove a floor, leaving its nodes and edges in place. Not undoable.
    pub fn remove_floor(&mut self, id: &FloorId) -> Result<Floor, SessionError> {
        let was_active = self.active_floor.as_ref() == Some(id);
        if was_active {
            self.edit(|engine, ctx| engine.cancel(ctx));
        }
        let floor = self
            .document
            .remove_floor(id)
            .ok_or_else(|| SessionError::UnknownFloor(id.clone()))?;
        if was_active {
            self.active_floor = self.lowest_floor();
        }
        tracing::info!(floor = %id, level = floor.level, "floor removed");
        Ok(floor)
    }

    pub fn set_active_floor(&mut self, id: &FloorId) -> Result<(), SessionError> {
        if self.document.floor(id).is_none() {
            return Err(SessionError::UnknownFloor(id.clone()));
        }
        self.edit(|engine, ctx| engine.cancel(ctx));
        self.active_floor = Some(id.clone());
        Ok(())
    }

    fn lowest_floor(&self) -> Option<FloorId> {
        self.document
            .floors_by_level()
            .first()
            .map(|f| f.id.clone())
    }

    // ---- pointer input ----

    pub fn mode(&self) -> ToolMode {
        self.engine.mode()
    }

    pub fn set_mode(&mut self, mode: ToolMode) {
        self.edit(|engine, ctx| engine.set_mode(ctx, mode));
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.engine.set_view(view);
    }

    /// Drop a latched edge source without creating an edge.
    pub fn cancel_pending_edge(&mut self) -> bool {
        self.engine.cancel_pending_edge()
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> InteractionOutcome {
        self.edit(|engine, ctx| engine.pointer_down(ctx, event))
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> InteractionOutcome {
        self.edit(|engine, ctx| engine.pointer_move(ctx, event))
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> InteractionOutcome {
        self.edit(|engine, ctx| engine.pointer_up(ctx, event))
    }

    // ---- property edits ----

    /// Apply a property edit to a node as one undoable step.
    ///
    /// A new bounding box is normalized, and if its z-range moved the
    /// node's floor levels are recomputed from the existing floors. Any
    /// gesture in flight is cancelled first.
    pub fn edit_node(&mut self, id: &NodeId, mut patch: NodePatch) -> bool {
        if !self.document.contains_node(id) || patch.is_empty() {
            return false;
        }
        self.edit(|engine, ctx| engine.cancel(ctx));
        let Some(current) = self.document.node(id) else {
            return false;
        };
        if let Some(bbox) = patch.bounding_box.take() {
            let bbox = bbox.normalized();
            let z_changed = bbox.z1 != current.bounding_box.z1 || bbox.z2 != current.bounding_box.z2;
            if z_changed && patch.floor_levels.is_none() {
                let levels = self.document.floors().iter().map(|f| f.level);
                patch.floor_levels = Some(levels_spanned(&bbox, levels));
            }
            patch.bounding_box = Some(bbox);
        }
        if patch.is_empty() {
            return false;
        }
        self.document.update_node(id, patch);
        self.commit();
        true
    }

    /// Apply a property edit to an edge as one undoable step. A patch with a
    /// non-positive or non-finite traversal time is discarded.
    pub fn edit_edge(&mut self, id: &EdgeId, patch: EdgePatch) -> bool {
        if patch.is_empty() || !self.document.contains_edge(id) {
            return false;
        }
        if !patch.is_valid() {
            tracing::debug!(edge = %id, "edge edit discarded: invalid traversal time");
            return false;
        }
        self.edit(|engine, ctx| engine.cancel(ctx));
        if !self.document.update_edge(id, patch) {
            return false;
        }
        self.commit();
        true
    }

    /// Delete the selected nodes (with their edges) and the selected edge.
    pub fn delete_selection(&mut self) -> Removed {
        self.edit(|engine, ctx| engine.cancel(ctx));
        let mut removed = self.document.remove_nodes(self.selection.nodes().iter());
        if let Some(edge) = self.selection.edge().cloned() {
            if self.document.remove_edge(&edge) {
                removed.edges.push(edge);
            }
        }
        self.selection.purge(&self.document);
        self.engine.revalidate(&self.document);
        if !removed.is_empty() {
            tracing::debug!(
                nodes = removed.nodes.len(),
                edges = removed.edges.len(),
                "selection deleted"
            );
            self.commit();
        }
        removed
    }

    // ---- history ----

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.edit(|engine, ctx| engine.cancel(ctx));
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.edit(|engine, ctx| engine.cancel(ctx));
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        self.document
            .replace_graph(snapshot.nodes.clone(), snapshot.edges.clone());
        self.selection.purge(&self.document);
        self.engine.revalidate(&self.document);
    }

    // ---- projection ----

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Setters on the returned camera clamp their inputs.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn layers(&self) -> Vec<FloorLayer> {
        assign_layers(&self.document)
    }

    pub fn scene(&self) -> Scene {
        SceneBuilder::new(self.camera).build(&self.document)
    }

    // ---- import / export ----

    pub fn export_document(&self) -> PersistedDocument {
        PersistedDocument::from_document(&self.document, &self.settings.app_name)
    }

    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        self.export_document().write(path)?;
        tracing::info!("Saved document to {:?}", path);
        Ok(())
    }

    pub fn export_csv(&self, nodes: &Path, edges: &Path) -> Result<(), ExportError> {
        tabular::export_csv(&self.document, nodes, edges)
    }

    /// Replace the document with a persisted one and restart history from it.
    /// On error nothing changes.
    pub fn import_json(&mut self, json: &str) -> Result<(), SessionError> {
        let persisted = PersistedDocument::parse(json).inspect_err(|e| {
            tracing::warn!("Rejected document import: {}", e);
        })?;
        self.replace_document(persisted.into_document());
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<(), SessionError> {
        let persisted = PersistedDocument::read(path).inspect_err(|e| {
            tracing::warn!("Rejected document {:?}: {}", path, e);
        })?;
        self.replace_document(persisted.into_document());
        tracing::info!("Loaded document from {:?}", path);
        Ok(())
    }

    fn replace_document(&mut self, document: GraphDocument) {
        self.edit(|engine, ctx| engine.cancel(ctx));
        self.engine.cancel_pending_edge();
        self.history.reset(Snapshot {
            nodes: document.nodes().to_vec(),
            edges: document.edges().to_vec(),
        });
        self.document = document;
        self.selection.clear();
        self.active_floor = self.lowest_floor();
        tracing::info!(
            floors = self.document.floors().len(),
            nodes = self.document.nodes().len(),
            edges = self.document.edges().len(),
            "document imported"
        );
    }

    // ---- extraction ----

    /// Merge an extraction result onto the floor at `floor_level` as one
    /// undoable step.
    pub fn merge_extraction(
        &mut self,
        floor_level: i32,
        result: &ExtractionResult,
    ) -> Result<MergeReport, SessionError> {
        let floor = self
            .document
            .floor_by_level(floor_level)
            .ok_or(ExtractionError::UnknownFloor(floor_level))?;
        if result.nodes.is_empty() {
            return Err(ExtractionError::Empty.into());
        }

        let plan = plan_merge(
            result,
            floor,
            &self.settings.node_defaults,
            &self.settings.edge_defaults,
        );
        self.edit(|engine, ctx| engine.cancel(ctx));
        for node in plan.nodes {
            self.document.add_node(node);
        }
        for edge in plan.edges {
            self.document.add_edge(edge);
        }
        self.commit();
        tracing::info!(
            floor_level,
            nodes = plan.report.nodes_added,
            edges = plan.report.edges_added,
            dropped = plan.report.dropped_connections.len(),
            "extraction merged"
        );
        Ok(plan.report)
    }

    pub fn extract_and_merge<E: FloorPlanExtractor + ?Sized>(
        &mut self,
        extractor: &E,
        request: &ExtractionRequest,
    ) -> Result<MergeReport, SessionError> {
        if self.document.floor_by_level(request.floor_level).is_none() {
            return Err(ExtractionError::UnknownFloor(request.floor_level).into());
        }
        let result = extractor
            .extract(request)
            .inspect_err(|e| tracing::warn!("Extraction failed: {}", e))?
            .ok_or(ExtractionError::Empty)?;
        self.merge_extraction(request.floor_level, &result)
    }
}
