//! Template engine over namespaced template directories.
//!
//! Every entry of the `paths` config maps a namespace to a directory. Files
//! under that directory are registered as `@<Namespace>/<relative path>`,
//! so the core layout is addressed as `@PaygateCore/layout.html`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, ErrorKind, Template, Tera};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Template errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    /// The template file exists but could not be loaded.
    #[error("template {name} could not be loaded: {reason}")]
    Invalid { name: String, reason: String },

    #[error("template error: {0}")]
    Engine(#[from] tera::Error),
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Tera instance with namespaced template names.
pub struct TemplateEngine {
    tera: Tera,
    namespaces: BTreeMap<String, PathBuf>,
    broken: BTreeMap<String, String>,
}

impl TemplateEngine {
    /// Engine without any templates.
    pub fn empty() -> Self {
        Self {
            tera: Tera::default(),
            namespaces: BTreeMap::new(),
            broken: BTreeMap::new(),
        }
    }

    /// Load every file under each namespace directory.
    ///
    /// Directories that do not exist are skipped with a warning. Files that
    /// cannot be read or parsed are left out and reported by
    /// [`render`](Self::render) as [`TemplateError::Invalid`].
    pub fn from_paths<I, N, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        let mut engine = Self::empty();
        let mut sources = Vec::new();

        for (namespace, dir) in paths {
            let namespace = namespace.into();
            let dir = dir.into();
            if !dir.is_dir() {
                warn!(namespace = %namespace, path = %dir.display(), "template path is not a directory, skipping");
                continue;
            }
            for (name, path) in collect_files(&dir, &namespace) {
                match fs::read_to_string(&path) {
                    Ok(content) => sources.push((name, content)),
                    Err(e) => engine.mark_broken(name, e.to_string()),
                }
            }
            engine.namespaces.insert(namespace, dir);
        }

        sources.retain(|(name, content)| match Template::new(name, None, content) {
            Ok(_) => true,
            Err(e) => {
                engine.mark_broken(name.clone(), error_chain(&e));
                false
            }
        });

        debug!(
            namespaces = engine.namespaces.len(),
            templates = sources.len(),
            broken = engine.broken.len(),
            "loading templates"
        );
        engine.load(sources);
        engine
    }

    /// Build the Tera instance, dropping templates whose inheritance chain
    /// cannot be resolved.
    fn load(&mut self, mut sources: Vec<(String, String)>) {
        while !sources.is_empty() {
            let mut tera = Tera::default();
            let Err(e) = tera.add_raw_templates(sources.iter().map(|(n, c)| (n.as_str(), c.as_str()))) else {
                self.tera = tera;
                return;
            };
            let reason = error_chain(&e);
            match unresolvable_template(&e) {
                Some(culprit) => {
                    sources.retain(|(name, _)| name != &culprit);
                    self.mark_broken(culprit, reason);
                }
                None => {
                    for (name, _) in sources.drain(..) {
                        self.mark_broken(name, reason.clone());
                    }
                }
            }
        }
    }

    fn mark_broken(&mut self, name: String, reason: String) {
        warn!(template = %name, reason = %reason, "skipping template");
        self.broken.insert(name, reason);
    }

    /// Register a template from a string.
    pub fn add_raw_template(&mut self, name: &str, content: &str) -> TemplateResult<()> {
        self.tera.add_raw_template(name, content)?;
        self.broken.remove(name);
        Ok(())
    }

    /// Registered namespaces and their directories.
    pub fn namespaces(&self) -> &BTreeMap<String, PathBuf> {
        &self.namespaces
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Templates that were found but could not be loaded, with the reason.
    pub fn broken_templates(&self) -> &BTreeMap<String, String> {
        &self.broken
    }

    /// Render `name` with `parameters`, which must serialize to a map.
    pub fn render<T: Serialize>(&self, name: &str, parameters: &T) -> TemplateResult<String> {
        if let Some(reason) = self.broken.get(name) {
            return Err(TemplateError::Invalid {
                name: name.to_string(),
                reason: reason.clone(),
            });
        }
        if !self.has_template(name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        let context = Context::from_serialize(parameters)?;
        Ok(self.tera.render(name, &context)?)
    }
}

/// Regular files under `root` as `(@namespace/relative/path, path)`, sorted
/// by path. Symlinks are not followed.
fn collect_files(root: &Path, namespace: &str) -> Vec<(String, PathBuf)> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "unreadable template entry, skipping");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((format!("@{namespace}/{relative}"), entry.into_path()));
    }
    files
}

/// The template a Tera inheritance error is about, if it names one.
fn unresolvable_template(error: &tera::Error) -> Option<String> {
    match &error.kind {
        ErrorKind::MissingParent { current, .. } => Some(current.clone()),
        ErrorKind::CircularExtend { tpl, .. } => Some(tpl.clone()),
        _ => None,
    }
}

fn error_chain(error: &tera::Error) -> String {
    let mut reason = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("namespaces", &self.namespaces)
            .field("templates", &self.tera.get_template_names().count())
            .field("broken", &self.broken.keys().collect::<Vec<_>>())
            .finish()
    }
}
