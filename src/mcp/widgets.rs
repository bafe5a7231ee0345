//! Widget Registry
//!
//! Holds the fixed set of widget descriptors and their markup. Markup is
//! read from the assets directory once per process (lazily, on first use)
//! and cached for the process lifetime. A missing artifact is a deployment
//! defect: the registry refuses to load and startup exits non-zero.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Static descriptor for one widget: identity, template uri and the status
/// strings clients show around an invocation.
#[derive(Debug)]
pub struct WidgetSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub template_uri: &'static str,
    pub invoking_text: &'static str,
    pub invoked_text: &'static str,
}

impl WidgetSpec {
    /// Rendering hints attached to tool definitions and call results.
    pub fn meta(&self) -> Value {
        json!({
            "openai/outputTemplate": self.template_uri,
            "openai/toolInvocation/invoking": self.invoking_text,
            "openai/toolInvocation/invoked": self.invoked_text,
            "openai/widgetAccessible": true,
        })
    }
}

/// The known widgets. One resource descriptor exists per entry (1:1).
pub const WIDGET_SPECS: &[WidgetSpec] = &[
    WidgetSpec {
        id: "task-board",
        title: "Task Board",
        template_uri: "ui://widget/task-board.html",
        invoking_text: "Laying out the board",
        invoked_text: "Here is the board",
    },
    WidgetSpec {
        id: "task-card",
        title: "Task Card",
        template_uri: "ui://widget/task-card.html",
        invoking_text: "Fetching the task",
        invoked_text: "Here is the task",
    },
    WidgetSpec {
        id: "workload-summary",
        title: "Workload Summary",
        template_uri: "ui://widget/workload-summary.html",
        invoking_text: "Crunching the numbers",
        invoked_text: "Here is the workload breakdown",
    },
];

/// Look up a widget spec by id.
pub fn widget_spec(id: &str) -> Option<&'static WidgetSpec> {
    WIDGET_SPECS.iter().find(|spec| spec.id == id)
}

/// Runtime inputs the registry needs: where markup artifacts live and the
/// externally reachable base URL baked into each template.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub assets_dir: PathBuf,
    pub base_url: String,
}

/// One loaded widget: its static spec plus markup ready to serve.
#[derive(Debug)]
pub struct WidgetDescriptor {
    pub spec: &'static WidgetSpec,
    pub markup: String,
}

/// Process-wide, write-once widget cache.
#[derive(Debug)]
pub struct WidgetRegistry {
    widgets: HashMap<&'static str, WidgetDescriptor>,
}

static GLOBAL: OnceLock<WidgetRegistry> = OnceLock::new();

impl WidgetRegistry {
    /// Load markup for every known widget. Fails if any artifact is
    /// missing or unreadable.
    pub fn load(config: &WidgetConfig) -> Result<Self> {
        let mut widgets = HashMap::new();

        for spec in WIDGET_SPECS {
            let path = locate_markup(&config.assets_dir, spec.id).with_context(|| {
                format!(
                    "widget artifact for '{}' not found in {:?}",
                    spec.id, config.assets_dir
                )
            })?;
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read widget markup at {:?}", path))?;
            let markup = inject_base_url(&raw, &config.base_url);
            debug!("Loaded widget '{}' from {:?}", spec.id, path);
            widgets.insert(spec.id, WidgetDescriptor { spec, markup });
        }

        info!("Widget registry loaded with {} widgets", widgets.len());
        Ok(Self { widgets })
    }

    /// The process-wide registry, populated on first access.
    ///
    /// Concurrent first-touch may race to load, but `get_or_init` makes
    /// every caller converge on a single cached value.
    pub fn global(config: &WidgetConfig) -> Result<&'static WidgetRegistry> {
        if let Some(registry) = GLOBAL.get() {
            return Ok(registry);
        }
        let loaded = Self::load(config)?;
        Ok(GLOBAL.get_or_init(|| loaded))
    }

    pub fn resolve(&self, id: &str) -> Option<&WidgetDescriptor> {
        self.widgets.get(id)
    }

    /// Find the widget backing a template uri.
    pub fn resolve_by_uri(&self, uri: &str) -> Option<&WidgetDescriptor> {
        self.widgets
            .values()
            .find(|descriptor| descriptor.spec.template_uri == uri)
    }
}

/// Locate the markup artifact for a widget id.
///
/// Lookup order: exact `{id}.html`, then the lexicographically last file
/// matching `{id}-*.html` (content-hashed build output), then error.
fn locate_markup(assets_dir: &Path, id: &str) -> Result<PathBuf> {
    let exact = assets_dir.join(format!("{}.html", id));
    if exact.is_file() {
        return Ok(exact);
    }

    let prefix = format!("{}-", id);
    let mut candidates: Vec<PathBuf> = WalkDir::new(assets_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".html"))
        })
        .map(|entry| entry.into_path())
        .collect();
    candidates.sort();

    match candidates.pop() {
        Some(path) => Ok(path),
        None => bail!(
            "no markup file '{}.html' or '{}*.html' in {:?}",
            id,
            prefix,
            assets_dir
        ),
    }
}

/// Inject the server's base URL into markup, once, immediately after the
/// root element's open tag. The cached markup then carries the correct
/// callback address for the lifetime of the process.
fn inject_base_url(markup: &str, base_url: &str) -> String {
    let snippet = format!(
        "<script>window.__TASKDECK_BASE_URL = {};</script>",
        Value::String(base_url.to_string())
    );

    let Some(insert_at) = root_open_tag_end(markup) else {
        return format!("{}{}", snippet, markup);
    };

    let mut injected = String::with_capacity(markup.len() + snippet.len());
    injected.push_str(&markup[..insert_at]);
    injected.push_str(&snippet);
    injected.push_str(&markup[insert_at..]);
    injected
}

/// Byte offset just past the `>` of the first element open tag, skipping
/// doctype declarations and comments.
fn root_open_tag_end(markup: &str) -> Option<usize> {
    let bytes = markup.as_bytes();
    let mut pos = 0;

    while let Some(open) = markup[pos..].find('<').map(|i| pos + i) {
        let close = markup[open..].find('>').map(|i| open + i)?;
        let is_element = bytes
            .get(open + 1)
            .is_some_and(|b| b.is_ascii_alphabetic());
        if is_element {
            return Some(close + 1);
        }
        pos = close + 1;
    }
    None
}
