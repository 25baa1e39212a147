//! Backend selection and factories.
//!
//! A [`BackendRegistry`] holds one instance per [`BackendKind`] and an ordered
//! list of which kinds to try. [`detect_available`](BackendRegistry::detect_available)
//! walks that list, probes each backend through an editor, and picks the
//! first that reports itself usable. Every factory resolves its backend that
//! way before constructing anything.
//!
//! The order a new registry starts from is process-wide
//! ([`default_backend_order`], [`set_default_backend_order`]); a registry can
//! override it with [`with_order`](BackendRegistry::with_order) or per call
//! by passing candidates to `detect_available`.

use crate::config::GrafikaConfig;
use crate::editor::{Editor, EditorDefaults};
use crate::error::{GrafikaError, Result};
use crate::imaging::backend::{BackendKind, GraphicsBackend};
use crate::imaging::drawing::{DrawingObject, ShapeArgs};
use crate::imaging::filter::Filter;
use crate::imaging::raster_backend::RasterBackend;
use crate::imaging::skia_backend::SkiaBackend;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

static DEFAULT_ORDER: LazyLock<RwLock<Vec<BackendKind>>> =
    LazyLock::new(|| RwLock::new(BackendKind::ALL.to_vec()));

/// Order new registries start from. Initially skia, then raster.
pub fn default_backend_order() -> Vec<BackendKind> {
    DEFAULT_ORDER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide default order. Existing registries keep theirs.
pub fn set_default_backend_order(order: Vec<BackendKind>) -> Result<()> {
    if order.is_empty() {
        return Err(GrafikaError::invalid("backend order must not be empty"));
    }
    *DEFAULT_ORDER
        .write()
        .unwrap_or_else(PoisonError::into_inner) = order;
    Ok(())
}

fn builtin(kind: BackendKind) -> Arc<dyn GraphicsBackend> {
    match kind {
        BackendKind::Skia => Arc::new(SkiaBackend::new()),
        BackendKind::Raster => Arc::new(RasterBackend::new()),
    }
}

/// Ordered set of backends plus the defaults handed to every editor.
pub struct BackendRegistry {
    order: Vec<BackendKind>,
    backends: HashMap<BackendKind, Arc<dyn GraphicsBackend>>,
    defaults: EditorDefaults,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    /// Built-in backends in the process-wide default order.
    pub fn new() -> Self {
        Self::with_order(default_backend_order())
    }

    pub fn with_order(order: Vec<BackendKind>) -> Self {
        Self {
            order,
            backends: BackendKind::ALL
                .into_iter()
                .map(|kind| (kind, builtin(kind)))
                .collect(),
            defaults: EditorDefaults::default(),
        }
    }

    /// Order and editor defaults from a loaded config.
    pub fn from_config(config: &GrafikaConfig) -> Result<Self> {
        let mut registry = Self::with_order(config.backend_order()?);
        registry.defaults = EditorDefaults::from_config(config);
        Ok(registry)
    }

    pub fn with_defaults(mut self, defaults: EditorDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Swap in a different implementation for `backend.kind()`.
    pub fn install(&mut self, backend: Arc<dyn GraphicsBackend>) -> &mut Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    pub fn backend(&self, kind: BackendKind) -> Arc<dyn GraphicsBackend> {
        self.backends
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| builtin(kind))
    }

    pub fn order(&self) -> &[BackendKind] {
        &self.order
    }

    pub fn set_order(&mut self, order: Vec<BackendKind>) -> &mut Self {
        self.order = order;
        self
    }

    /// Run the capability check of one backend.
    pub fn probe(&self, kind: BackendKind) -> bool {
        Editor::new(self.backend(kind)).is_available()
    }

    /// First available backend among `candidates`, or the registry order
    /// when `None`.
    pub fn detect_available(&self, candidates: Option<&[BackendKind]>) -> Result<BackendKind> {
        let candidates = candidates.unwrap_or(&self.order);
        for &kind in candidates {
            if self.probe(kind) {
                debug!(backend = kind.name(), "selected backend");
                return Ok(kind);
            }
            debug!(backend = kind.name(), "backend unavailable");
        }
        Err(GrafikaError::NoBackendAvailable {
            tried: candidates.iter().map(|k| k.name().to_string()).collect(),
        })
    }

    fn resolve(&self) -> Result<Arc<dyn GraphicsBackend>> {
        self.detect_available(None).map(|kind| self.backend(kind))
    }

    /// Editor on the first available backend, without an image.
    pub fn create_editor(&self) -> Result<Editor> {
        Ok(Editor::new(self.resolve()?).with_defaults(self.defaults.clone()))
    }

    /// Editor with `path` already open.
    pub fn create_image(&self, path: impl AsRef<Path>) -> Result<Editor> {
        let mut editor = self.create_editor()?;
        editor.open(path)?;
        Ok(editor)
    }

    /// Editor with an opaque black `width` x `height` image.
    pub fn create_blank_image(&self, width: u32, height: u32) -> Result<Editor> {
        let mut editor = self.create_editor()?;
        editor.blank(width, height)?;
        Ok(editor)
    }

    /// Filter by name (`dither`, `grayscale`, `sobel`).
    pub fn create_filter(&self, name: &str) -> Result<Filter> {
        self.resolve()?;
        name.parse()
    }

    /// Shape by name; see [`DrawingObject::from_name`].
    pub fn create_drawing_object(&self, name: &str, args: ShapeArgs) -> Result<DrawingObject> {
        self.resolve()?;
        DrawingObject::from_name(name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::imaging::backend::tests::MockBackend;

    fn registry_with(skia: bool, raster: bool) -> BackendRegistry {
        let mut registry = BackendRegistry::with_order(BackendKind::ALL.to_vec());
        registry
            .install(Arc::new(MockBackend::of_kind(BackendKind::Skia, skia)))
            .install(Arc::new(MockBackend::of_kind(BackendKind::Raster, raster)));
        registry
    }

    // =========================================================================
    // Detection
    // =========================================================================

    #[test]
    fn builtin_backends_are_available() {
        let registry = BackendRegistry::with_order(BackendKind::ALL.to_vec());
        assert!(registry.probe(BackendKind::Skia));
        assert!(registry.probe(BackendKind::Raster));
        assert_eq!(registry.detect_available(None).unwrap(), BackendKind::Skia);
    }

    #[test]
    fn detection_follows_order() {
        let mut registry = registry_with(true, true);
        registry.set_order(vec![BackendKind::Raster, BackendKind::Skia]);
        assert_eq!(registry.detect_available(None).unwrap(), BackendKind::Raster);
    }

    #[test]
    fn detection_skips_unavailable() {
        let registry = registry_with(false, true);
        assert_eq!(registry.detect_available(None).unwrap(), BackendKind::Raster);
    }

    #[test]
    fn per_call_candidates_override_order() {
        let registry = registry_with(true, true);
        let only_raster = [BackendKind::Raster];
        assert_eq!(
            registry.detect_available(Some(&only_raster)).unwrap(),
            BackendKind::Raster
        );
    }

    #[test]
    fn nothing_available_is_an_error() {
        let registry = registry_with(false, false);
        let err = registry.detect_available(None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NoBackendAvailable);
        assert_eq!(err.to_string(), "No supported backend (tried: skia, raster)");
        assert!(registry.create_editor().is_err());
        assert!(matches!(
            registry.create_filter("dither"),
            Err(GrafikaError::NoBackendAvailable { .. })
        ));
    }

    #[test]
    fn empty_order_is_an_error() {
        let registry = BackendRegistry::with_order(vec![]);
        assert!(matches!(
            registry.detect_available(None),
            Err(GrafikaError::NoBackendAvailable { tried }) if tried.is_empty()
        ));
    }

    // =========================================================================
    // Factories
    // =========================================================================

    #[test]
    fn editors_use_selected_backend() {
        let registry = registry_with(false, true);
        let editor = registry.create_blank_image(3, 2).unwrap();
        assert_eq!(editor.backend().kind(), BackendKind::Raster);
        assert_eq!(editor.dimensions().unwrap(), (3, 2));
    }

    #[test]
    fn create_image_surfaces_io_errors() {
        let registry = registry_with(true, true);
        let err = registry.create_image("/definitely/not/here.png").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::IoFailure);
    }

    #[test]
    fn named_factories_reject_unknown_names() {
        let registry = registry_with(true, true);
        assert_eq!(registry.create_filter("sobel").unwrap(), Filter::Sobel);
        assert!(matches!(
            registry.create_filter("blur"),
            Err(GrafikaError::InvalidArgument(_))
        ));
        let line = registry
            .create_drawing_object("line", ShapeArgs::default().points([(0, 0), (3, 3)]))
            .unwrap();
        assert_eq!(line.name(), "Line");
        assert!(matches!(
            registry.create_drawing_object("Star", ShapeArgs::default()),
            Err(GrafikaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn from_config_applies_order_and_defaults() {
        let mut config = GrafikaConfig::default();
        config.backends.order = vec!["raster".into()];
        config.text.size = 18.0;
        let registry = BackendRegistry::from_config(&config).unwrap();
        assert_eq!(registry.order(), &[BackendKind::Raster]);
        let editor = registry.create_editor().unwrap();
        assert_eq!(editor.backend().kind(), BackendKind::Raster);
        assert_eq!(editor.defaults().text_size, 18.0);
    }

    #[test]
    fn process_wide_default_order() {
        let original = default_backend_order();
        assert!(set_default_backend_order(vec![]).is_err());
        set_default_backend_order(vec![BackendKind::Raster]).unwrap();
        assert_eq!(BackendRegistry::new().order(), &[BackendKind::Raster]);
        set_default_backend_order(original).unwrap();
    }
}
