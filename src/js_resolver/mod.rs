mod rewrite_requires;

use std::path::{Component, Path, PathBuf};

pub use rewrite_requires::{rewrite_json_module, rewrite_requires, RewrittenModule, LOADER_IDENT};

/// Canonical, root-relative module identifier such as `./src/index.js`.
pub type ModuleId = String;

pub const DEFAULT_EXTENSION: &str = "js";

/// Lexical specifier resolution against a fixed project root.
///
/// No file system access happens here: a specifier pointing at a missing file
/// still resolves, and the failure surfaces when the module is read.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
        }
    }

    /// Resolves `specifier`, written in a module living in `importer_dir`.
    ///
    /// The specifier is always appended to `importer_dir`, so a leading `/`
    /// does not escape to the file system root.
    pub fn resolve(&self, importer_dir: &Path, specifier: &str) -> ModuleId {
        let mut candidate = importer_dir
            .join(specifier.trim_start_matches('/'))
            .into_os_string();
        if Path::new(specifier).extension().is_none() {
            candidate.push(".");
            candidate.push(DEFAULT_EXTENSION);
        }
        self.module_id(Path::new(&candidate))
    }

    /// Canonical id of a module given its path on disk.
    pub fn module_id(&self, path: &Path) -> ModuleId {
        let path = normalize(&self.root.join(path));
        let relative = pathdiff::diff_paths(&path, &self.root).unwrap_or(path);
        let mut id = ModuleId::from(".");
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    id.push('/');
                    id.push_str(&part.to_string_lossy());
                }
                Component::ParentDir => id.push_str("/.."),
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        id
    }

    /// Absolute path of the module a canonical id refers to.
    pub fn module_path(&self, id: &str) -> PathBuf {
        normalize(&self.root.join(id))
    }
}

/// Folds `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}
