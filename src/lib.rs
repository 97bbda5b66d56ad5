mod collect_deps;
mod config;
mod emit;
mod error;
mod js_resolver;

pub use collect_deps::{collect_modules, BuildSession, DuplicatePolicy, ModuleRecord};
pub use config::{Config, OutputConfig, DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT_FILENAME};
pub use emit::{render_bundle, write_bundle};
pub use error::{Error, RewriteError};
pub use js_resolver::{rewrite_requires, ModuleId, Resolver, RewrittenModule, LOADER_IDENT};

use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::info;

pub trait FileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

#[derive(Default, Clone, Debug)]
pub struct OsFileSystem(());

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Bundles the project rooted at `cwd` as described by `config`.
///
/// Relative `entry` and `output.path` are taken relative to `cwd`, which is
/// also the root module ids are computed against. Nothing is written unless
/// every module builds.
pub fn bundle<FS: FileSystem>(
    fs: &FS,
    cwd: &Path,
    config: &Config,
    policy: DuplicatePolicy,
) -> Result<PathBuf, Error> {
    let resolver = Resolver::new(cwd);
    let entry = cwd.join(&config.entry);
    let modules = collect_modules(fs, &resolver, &entry, policy)?;
    info!(modules = modules.len(), ?policy, "collected modules");

    let contents = render_bundle(&resolver.module_id(&entry), &modules)?;
    write_bundle(&cwd.join(&config.output.path), &config.output.filename, &contents)
}
