use std::path::Path;

use oxc_allocator::Allocator;
use oxc_span::SourceType;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::{
    error::Error,
    js_resolver::{rewrite_json_module, rewrite_requires, ModuleId, Resolver},
    FileSystem,
};

/// One module of the bundle: canonical id plus rewritten source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub source: String,
}

/// How a module reachable along several import paths is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// A record per discovery. Shared dependencies appear once per importing
    /// path; the runtime loader's memoization keeps execution single. A module
    /// requiring one of its own ancestors fails with [`Error::Cycle`].
    #[default]
    PerDiscovery,
    /// A record per id, at its first discovery. Cycles terminate.
    FirstDiscovery,
}

pub struct ResetOnDrop<'a>(&'a mut Allocator);
impl<'a> Drop for ResetOnDrop<'a> {
    fn drop(&mut self) {
        self.0.reset()
    }
}

/// State of one build: the accumulated records and traversal bookkeeping.
pub struct BuildSession<'r, FS> {
    fs: &'r FS,
    resolver: &'r Resolver,
    policy: DuplicatePolicy,
    allocator: Allocator,
    modules: Vec<ModuleRecord>,
    visited: FxHashSet<ModuleId>,
    ancestors: Vec<ModuleId>,
}

impl<'r, FS: FileSystem> BuildSession<'r, FS> {
    pub fn new(fs: &'r FS, resolver: &'r Resolver, policy: DuplicatePolicy) -> Self {
        Self {
            fs,
            resolver,
            policy,
            allocator: Allocator::default(),
            modules: vec![],
            visited: FxHashSet::default(),
            ancestors: vec![],
        }
    }

    /// Reads, rewrites and records the module at `module_path`, then recurses
    /// into its dependencies in the order they are required.
    pub fn build(&mut self, module_path: &Path) -> Result<(), Error> {
        let id = self.resolver.module_id(module_path);
        match self.policy {
            DuplicatePolicy::FirstDiscovery => {
                if !self.visited.insert(id.clone()) {
                    trace!(%id, "skipping already built module");
                    return Ok(());
                }
            }
            DuplicatePolicy::PerDiscovery => {
                if let Some(start) = self.ancestors.iter().position(|ancestor| *ancestor == id) {
                    let mut chain = self.ancestors[start..].to_vec();
                    chain.push(id);
                    return Err(Error::Cycle { chain });
                }
            }
        }

        let source = self
            .fs
            .read_to_string(module_path)
            .map_err(|source| Error::Resolution {
                path: module_path.to_owned(),
                source,
            })?;
        let importer_dir = module_path.parent().unwrap_or(module_path);

        let rewritten = if module_path.extension().is_some_and(|ext| ext == "json") {
            rewrite_json_module(&source)
        } else {
            let reset_on_drop = ResetOnDrop(&mut self.allocator);
            let source_type = SourceType::from_path(module_path)
                .unwrap_or_default()
                .with_module(false);
            rewrite_requires(
                &*reset_on_drop.0,
                source_type,
                &source,
                self.resolver,
                importer_dir,
            )
        }
        .map_err(|source| Error::Rewrite {
            path: module_path.to_owned(),
            source,
        })?;

        debug!(%id, dependencies = rewritten.dependencies.len(), "built module");
        self.modules.push(ModuleRecord {
            id: id.clone(),
            source: rewritten.source,
        });

        self.ancestors.push(id);
        for dependency in &rewritten.dependencies {
            let dependency_path = self.resolver.module_path(dependency);
            self.build(&dependency_path)?;
        }
        self.ancestors.pop();
        Ok(())
    }

    pub fn into_modules(self) -> Vec<ModuleRecord> {
        self.modules
    }
}

/// Builds every module reachable from `entry`, in depth-first pre-order.
pub fn collect_modules<FS: FileSystem>(
    fs: &FS,
    resolver: &Resolver,
    entry: &Path,
    policy: DuplicatePolicy,
) -> Result<Vec<ModuleRecord>, Error> {
    let mut session = BuildSession::new(fs, resolver, policy);
    session.build(entry)?;
    Ok(session.into_modules())
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::error::RewriteError;
    use rustc_hash::FxHashMap;
    use std::{io, path::PathBuf};

    struct MemoryFileSystem(FxHashMap<PathBuf, &'static str>);

    impl FileSystem for MemoryFileSystem {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.0
                .get(path)
                .map(|source| (*source).to_owned())
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn fs(files: &[(&str, &'static str)]) -> MemoryFileSystem {
        MemoryFileSystem(
            files
                .iter()
                .map(|(path, source)| (Path::new("/project").join(path), *source))
                .collect(),
        )
    }

    fn collect(
        fs: &MemoryFileSystem,
        policy: DuplicatePolicy,
    ) -> Result<Vec<ModuleRecord>, Error> {
        collect_modules(
            fs,
            &Resolver::new("/project"),
            Path::new("/project/src/index.js"),
            policy,
        )
    }

    fn ids(modules: &[ModuleRecord]) -> Vec<&str> {
        modules.iter().map(|module| module.id.as_str()).collect()
    }

    #[test]
    fn test_single_dependency() {
        let fs = fs(&[
            ("src/index.js", "const x = require('./a')"),
            ("src/a.js", "module.exports = 1;"),
        ]);
        let modules = collect(&fs, DuplicatePolicy::PerDiscovery).unwrap();
        assert_eq!(
            modules,
            vec![
                ModuleRecord {
                    id: "./src/index.js".into(),
                    source: "const x = __webpack_require__('./src/a.js')".into(),
                },
                ModuleRecord {
                    id: "./src/a.js".into(),
                    source: "module.exports = 1;".into(),
                },
            ]
        );
    }

    #[test]
    fn test_pre_order() {
        let fs = fs(&[
            ("src/index.js", "require('./a'); require('./d');"),
            ("src/a.js", "require('./b'); require('../lib/c');"),
            ("src/b.js", ""),
            ("lib/c.js", "require('../src/e.json')"),
            ("src/d.js", ""),
            ("src/e.json", "[1, 2]"),
        ]);
        let modules = collect(&fs, DuplicatePolicy::PerDiscovery).unwrap();
        assert_eq!(
            ids(&modules),
            vec![
                "./src/index.js",
                "./src/a.js",
                "./src/b.js",
                "./lib/c.js",
                "./src/e.json",
                "./src/d.js"
            ]
        );
        assert_eq!(modules[4].source, "module.exports = [1, 2];");
    }

    fn diamond() -> MemoryFileSystem {
        fs(&[
            ("src/index.js", "require('./a'); require('./b');"),
            ("src/a.js", "require('./shared');"),
            ("src/b.js", "require('./shared');"),
            ("src/shared.js", "module.exports = {};"),
        ])
    }

    #[test]
    fn test_shared_dependency_per_discovery() {
        let modules = collect(&diamond(), DuplicatePolicy::PerDiscovery).unwrap();
        assert_eq!(
            ids(&modules),
            vec![
                "./src/index.js",
                "./src/a.js",
                "./src/shared.js",
                "./src/b.js",
                "./src/shared.js"
            ]
        );
    }

    #[test]
    fn test_shared_dependency_first_discovery() {
        let modules = collect(&diamond(), DuplicatePolicy::FirstDiscovery).unwrap();
        assert_eq!(
            ids(&modules),
            vec!["./src/index.js", "./src/a.js", "./src/shared.js", "./src/b.js"]
        );
    }

    fn cycle() -> MemoryFileSystem {
        fs(&[
            ("src/index.js", "require('./a');"),
            ("src/a.js", "require('./b');"),
            ("src/b.js", "require('./a');"),
        ])
    }

    #[test]
    fn test_cycle_per_discovery_is_an_error() {
        match collect(&cycle(), DuplicatePolicy::PerDiscovery) {
            Err(Error::Cycle { chain }) => {
                assert_eq!(chain, vec!["./src/a.js", "./src/b.js", "./src/a.js"])
            }
            other => panic!("expected a cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_first_discovery_records_each_id_once() {
        let modules = collect(&cycle(), DuplicatePolicy::FirstDiscovery).unwrap();
        assert_eq!(
            ids(&modules),
            vec!["./src/index.js", "./src/a.js", "./src/b.js"]
        );
    }

    #[test]
    fn test_missing_module() {
        let fs = fs(&[("src/index.js", "require('./missing');")]);
        match collect(&fs, DuplicatePolicy::PerDiscovery) {
            Err(Error::Resolution { path, source }) => {
                assert_eq!(path, Path::new("/project/src/missing.js"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected a resolution error, got {other:?}"),
        }
    }

    #[test]
    fn test_rewrite_errors_carry_module_path() {
        let bad_argument = fs(&[
            ("src/index.js", "require('./a');"),
            ("src/a.js", "require(getName());"),
        ]);
        match collect(&bad_argument, DuplicatePolicy::PerDiscovery) {
            Err(Error::Rewrite {
                path,
                source: RewriteError::ArgumentShape { .. },
            }) => assert_eq!(path, Path::new("/project/src/a.js")),
            other => panic!("expected an argument shape error, got {other:?}"),
        }

        let bad_syntax = fs(&[("src/index.js", "const = ;")]);
        assert!(matches!(
            collect(&bad_syntax, DuplicatePolicy::PerDiscovery),
            Err(Error::Rewrite {
                source: RewriteError::Parse { .. },
                ..
            })
        ));
    }
}
