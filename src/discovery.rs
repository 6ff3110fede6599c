//! Component file discovery.
//!
//! Walks a file or directory and returns every file whose extension is in
//! the allow-list (`tsx`, `jsx` by default). A path that does not exist
//! yields no files rather than an error, and so does an empty match.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::DiscoveryConfig;
use kit_catalog_core::models::ComponentFileRef;

pub struct Discovery {
    extensions: Vec<String>,
    exclude_set: GlobSet,
    follow_symlinks: bool,
}

impl Discovery {
    /// Compile the discovery policy. Fails only on an invalid exclude glob.
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        Ok(Self {
            extensions: config.extensions.clone(),
            exclude_set: build_globset(&config.exclude_globs)?,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Find component files under `path`, in directory traversal order.
    ///
    /// Callers that need a stable order must sort the result.
    pub fn discover(&self, path: &Path) -> Vec<ComponentFileRef> {
        info!(path = %path.display(), "searching for component files");

        if !path.exists() {
            warn!(path = %path.display(), "path does not exist");
            return Vec::new();
        }

        let root = absolutize(path);
        let mut found = Vec::new();

        if root.is_file() {
            if self.is_component(&root) {
                debug!(path = %root.display(), "found component file");
                found.push(ComponentFileRef::new(root));
            } else {
                info!(path = %root.display(), "file is not a component source");
            }
        } else if root.is_dir() {
            let walker = WalkDir::new(&root).follow_links(self.follow_symlinks);
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let file = entry.path();
                let relative = file.strip_prefix(&root).unwrap_or(file);
                if self.exclude_set.is_match(relative) {
                    continue;
                }
                if !self.is_component(file) {
                    continue;
                }

                debug!(path = %file.display(), "found component file");
                found.push(ComponentFileRef::new(file));
            }
        } else {
            warn!(path = %root.display(), "path is neither a file nor a directory");
        }

        info!(count = found.len(), "component discovery finished");
        found
    }

    fn is_component(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or(false)
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            extensions: DiscoveryConfig::default().extensions,
            exclude_set: GlobSet::empty(),
            follow_symlinks: false,
        }
    }
}

/// Discover with the default policy (`.tsx` / `.jsx`, no excludes).
pub fn discover(path: &Path) -> Vec<ComponentFileRef> {
    Discovery::default().discover(path)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "export {}\n").unwrap();
        path
    }

    fn as_set(files: Vec<ComponentFileRef>) -> BTreeSet<PathBuf> {
        files.into_iter().map(ComponentFileRef::into_path).collect()
    }

    #[test]
    fn finds_tsx_and_jsx_recursively() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let button = touch(root, "Button.tsx");
        let input = touch(root, "Input.jsx");
        touch(root, "utils.ts");
        let header = touch(root, "nested/deep/Header.tsx");

        let found = as_set(discover(root));

        let expected: BTreeSet<PathBuf> = [button, input, header].into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn returns_absolute_paths() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a/Card.tsx");
        let found = discover(tmp.path());
        assert_eq!(found.len(), 1);
        assert!(found[0].path().is_absolute());
    }

    #[test]
    fn missing_path_is_empty_not_error() {
        assert!(discover(Path::new("/no/such/path")).is_empty());
    }

    #[test]
    fn single_file_respects_allow_list() {
        let tmp = tempfile::tempdir().unwrap();
        let tsx = touch(tmp.path(), "Dialog.tsx");
        let ts = touch(tmp.path(), "hooks.ts");

        let found = discover(&tsx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path(), tsx.as_path());

        assert!(discover(&ts).is_empty());
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "README.md");
        assert!(discover(tmp.path()).is_empty());
    }

    #[test]
    fn extension_match_is_case_sensitive() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "Legacy.TSX");
        assert!(discover(tmp.path()).is_empty());
    }

    #[test]
    fn exclude_globs_and_custom_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let keep = touch(root, "ui/Button.tsx");
        touch(root, "ui/Button.stories.tsx");
        touch(root, "node_modules/pkg/Thing.tsx");
        let vue = touch(root, "ui/Panel.vue");

        let discovery = Discovery::new(&DiscoveryConfig {
            extensions: vec!["tsx".to_string(), "vue".to_string()],
            exclude_globs: vec![
                "node_modules/**".to_string(),
                "**/*.stories.tsx".to_string(),
            ],
            follow_symlinks: false,
        })
        .unwrap();

        let found = as_set(discovery.discover(root));
        let expected: BTreeSet<PathBuf> = [keep, vue].into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn invalid_glob_is_a_config_error() {
        let result = Discovery::new(&DiscoveryConfig {
            exclude_globs: vec!["a/[".to_string()],
            ..DiscoveryConfig::default()
        });
        assert!(result.is_err());
    }
}
