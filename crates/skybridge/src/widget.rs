//! Widget Resource Resolver
//!
//! Maps widget template ids (and bundle filenames) to cached [`WidgetAsset`]s.
//!
//! Lookups go to the primary [`WidgetSource`] (normally a [`BundleDir`]) and
//! fall back to a secondary source (normally [`StaticFragments`]). The first
//! successful load of a key is cached and every later lookup is served from
//! memory until [`WidgetResolver::clear`] is called.
//!
//! The bundle directory is treated as immutable for the life of the process.
//! Rebuilding the bundle while the server runs has no effect until a restart
//! or an explicit `clear()`.

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::types::error::McpError;
use crate::types::resource::Resource;

/// MIME type the host uses to recognize widget markup.
pub const WIDGET_MIME_TYPE: &str = "text/html+skybridge";

/// A widget in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetTemplate {
    pub id: String,
    pub title: String,
    /// Status line shown while the tool runs.
    pub invoking: String,
    /// Status line shown when the tool finishes.
    pub invoked: String,
}

impl WidgetTemplate {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        invoking: impl Into<String>,
        invoked: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            invoking: invoking.into(),
            invoked: invoked.into(),
        }
    }

    /// `ui://widget/<id>.html`
    pub fn uri(&self) -> String {
        format!("ui://widget/{}.html", self.id)
    }

    /// Bundle filename for the template markup.
    pub fn filename(&self) -> String {
        format!("{}.html", self.id)
    }

    /// `_meta` advertised on tools, resources, and resource contents.
    pub fn descriptor_meta(&self) -> Map<String, Value> {
        let mut meta = self.invocation_meta();
        meta.insert("openai/outputTemplate".into(), json!(self.uri()));
        meta.insert("openai/widgetAccessible".into(), json!(true));
        meta.insert("openai/resultCanProduceWidget".into(), json!(true));
        meta
    }

    /// `_meta` attached to each tool result.
    pub fn invocation_meta(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("openai/toolInvocation/invoking".into(), json!(self.invoking));
        meta.insert("openai/toolInvocation/invoked".into(), json!(self.invoked));
        meta
    }

    /// The template as an MCP resource.
    pub fn to_resource(&self) -> Resource {
        Resource::new(self.uri(), &self.title)
            .with_title(&self.title)
            .with_description(format!("{} widget markup", self.title))
            .with_mime_type(WIDGET_MIME_TYPE)
            .with_meta(self.descriptor_meta())
    }
}

/// Where a cached asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetOrigin {
    /// The built bundle directory.
    Bundle,
    /// A static fragment compiled into the binary.
    Static,
}

/// A resolved widget file.
#[derive(Debug, Clone)]
pub struct WidgetAsset {
    /// Template id or filename this asset was resolved for.
    pub key: String,
    pub content: Bytes,
    pub content_type: &'static str,
    pub origin: WidgetOrigin,
    pub resolved_at: SystemTime,
}

impl WidgetAsset {
    /// Content as text. Widget markup is UTF-8; anything else is lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// Reference to a widget attached to a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRef {
    pub template_id: String,
    pub uri: String,
    pub url: String,
    pub origin: WidgetOrigin,
}

/// A place widget files can be loaded from.
///
/// Sources return `None` for anything they do not have. I/O problems are
/// logged by the source and reported as a miss.
pub trait WidgetSource: Send + Sync {
    fn origin(&self) -> WidgetOrigin;

    /// Load the markup for a catalog template.
    fn load_template(&self, template: &WidgetTemplate) -> Option<Bytes>;

    /// Load a non-template file by name (scripts, stylesheets).
    fn load_file(&self, _filename: &str) -> Option<Bytes> {
        None
    }
}

/// Built widget bundle on disk.
///
/// Template markup is `<id>.html`; when that is missing, the
/// lexicographically last hashed build `<id>-*.html` is used.
#[derive(Debug, Clone)]
pub struct BundleDir {
    root: PathBuf,
}

impl BundleDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &Path) -> Option<Bytes> {
        match std::fs::read(path) {
            Ok(bytes) => Some(Bytes::from(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read widget file");
                None
            }
        }
    }

    fn latest_hashed_build(&self, id: &str) -> Option<PathBuf> {
        let prefix = format!("{}-", id);
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(root = %self.root.display(), error = %e, "Bundle directory unreadable");
                return None;
            }
        };

        let mut candidates: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(&prefix) && name.ends_with(".html"))
            .collect();
        candidates.sort();
        candidates.pop().map(|name| self.root.join(name))
    }
}

impl WidgetSource for BundleDir {
    fn origin(&self) -> WidgetOrigin {
        WidgetOrigin::Bundle
    }

    fn load_template(&self, template: &WidgetTemplate) -> Option<Bytes> {
        let exact = self.root.join(template.filename());
        if let Some(bytes) = self.read(&exact) {
            return Some(bytes);
        }
        let hashed = self.latest_hashed_build(&template.id)?;
        tracing::debug!(path = %hashed.display(), "Using hashed widget build");
        self.read(&hashed)
    }

    fn load_file(&self, filename: &str) -> Option<Bytes> {
        self.read(&self.root.join(filename))
    }
}

/// In-memory widget fragments keyed by template id.
#[derive(Debug, Clone, Default)]
pub struct StaticFragments {
    fragments: HashMap<String, Bytes>,
}

impl StaticFragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template_id: impl Into<String>, html: impl Into<Bytes>) {
        self.fragments.insert(template_id.into(), html.into());
    }

    pub fn with(mut self, template_id: impl Into<String>, html: impl Into<Bytes>) -> Self {
        self.insert(template_id, html);
        self
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl WidgetSource for StaticFragments {
    fn origin(&self) -> WidgetOrigin {
        WidgetOrigin::Static
    }

    fn load_template(&self, template: &WidgetTemplate) -> Option<Bytes> {
        self.fragments.get(&template.id).cloned()
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Cache key. Templates and bundle files live in separate namespaces, so a
/// file named like a template id never aliases the template markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Template(String),
    File(String),
}

/// Resolves widget templates and bundle files through a keyed cache.
pub struct WidgetResolver {
    templates: Vec<WidgetTemplate>,
    primary: Box<dyn WidgetSource>,
    fallback: Option<Box<dyn WidgetSource>>,
    base_url: String,
    cache: DashMap<CacheKey, Arc<WidgetAsset>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl WidgetResolver {
    pub fn new(
        templates: Vec<WidgetTemplate>,
        primary: impl WidgetSource + 'static,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            templates,
            primary: Box::new(primary),
            fallback: None,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_fallback(mut self, fallback: impl WidgetSource + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Catalog templates in declaration order.
    pub fn templates(&self) -> &[WidgetTemplate] {
        &self.templates
    }

    pub fn template(&self, id: &str) -> Option<&WidgetTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Look up a template by its `ui://widget/<id>.html` URI.
    pub fn template_by_uri(&self, uri: &str) -> Option<&WidgetTemplate> {
        self.templates.iter().find(|t| t.uri() == uri)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a template's markup, loading it on first use.
    pub fn resolve(&self, template_id: &str) -> Result<Arc<WidgetAsset>, McpError> {
        let key = CacheKey::Template(template_id.to_string());
        if let Some(asset) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(asset.value()));
        }

        let template = self
            .template(template_id)
            .ok_or_else(|| McpError::WidgetNotFound(template_id.to_string()))?;

        self.populate(key, || self.load_template(template))
    }

    /// Fetch a bundle file by name. `<id>.html` for a catalog id resolves the
    /// template; anything else is read from the sources as-is.
    pub fn fetch(&self, filename: &str) -> Result<Arc<WidgetAsset>, McpError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(McpError::WidgetNotFound(filename.to_string()));
        }

        if let Some(id) = filename.strip_suffix(".html") {
            if self.template(id).is_some() {
                return self.resolve(id);
            }
        }

        let key = CacheKey::File(filename.to_string());
        if let Some(asset) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(asset.value()));
        }

        self.populate(key, || self.load_file(filename))
    }

    /// Resolve a template and build the reference attached to tool results.
    pub fn widget_ref(&self, template_id: &str) -> Result<WidgetRef, McpError> {
        let asset = self.resolve(template_id)?;
        Ok(WidgetRef {
            template_id: template_id.to_string(),
            uri: format!("ui://widget/{}.html", template_id),
            url: format!("{}/assets/{}.html", self.base_url, template_id),
            origin: asset.origin,
        })
    }

    /// Resolve every catalog template. Returns the ids that failed.
    pub fn preload(&self) -> Vec<(String, McpError)> {
        self.templates
            .iter()
            .filter_map(|t| self.resolve(&t.id).err().map(|e| (t.id.clone(), e)))
            .collect()
    }

    /// Drop every cached asset. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.cache.len();
        self.cache.clear();
        tracing::info!(removed, "Widget cache cleared");
        removed
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Load under the entry lock so concurrent first lookups load once.
    ///
    /// The source read holds that shard's write lock, which stalls other keys
    /// in the same shard for one read per key over the process lifetime.
    /// Reads are synchronous; async callers on a runtime should go through
    /// `spawn_blocking` for keys that may miss.
    fn populate(
        &self,
        key: CacheKey,
        load: impl FnOnce() -> Result<WidgetAsset, McpError>,
    ) -> Result<Arc<WidgetAsset>, McpError> {
        match self.cache.entry(key) {
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let asset = Arc::new(load()?);
                tracing::debug!(
                    key = %asset.key,
                    origin = ?asset.origin,
                    bytes = asset.content.len(),
                    "Widget asset cached"
                );
                entry.insert(Arc::clone(&asset));
                Ok(asset)
            }
        }
    }

    fn load_template(&self, template: &WidgetTemplate) -> Result<WidgetAsset, McpError> {
        self.sources()
            .find_map(|source| {
                source
                    .load_template(template)
                    .map(|content| (source.origin(), content))
            })
            .map(|(origin, content)| WidgetAsset {
                key: template.id.clone(),
                content,
                content_type: content_type_for("html"),
                origin,
                resolved_at: SystemTime::now(),
            })
            .ok_or_else(|| McpError::WidgetNotFound(template.id.clone()))
    }

    fn load_file(&self, filename: &str) -> Result<WidgetAsset, McpError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        self.sources()
            .find_map(|source| {
                source
                    .load_file(filename)
                    .map(|content| (source.origin(), content))
            })
            .map(|(origin, content)| WidgetAsset {
                key: filename.to_string(),
                content,
                content_type: content_type_for(extension),
                origin,
                resolved_at: SystemTime::now(),
            })
            .ok_or_else(|| McpError::WidgetNotFound(filename.to_string()))
    }

    fn sources(&self) -> impl Iterator<Item = &dyn WidgetSource> {
        std::iter::once(self.primary.as_ref()).chain(self.fallback.as_deref())
    }
}

/// Content type for a bundle file extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "woff2" => "font/woff2",
        "woff" => "font/woff",
        _ => "application/octet-stream",
    }
}
