use crate::violation::{CheckSource, Violation};
use crate::{first_str, Params};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

const PROTECTED_FILES: &[&str] = &[".env", ".env.local", ".env.production", "id_rsa", "id_ed25519"];
const PROTECTED_DIRS: &[&str] = &["node_modules", ".git", ".github", "runs", "reports", "coverage"];
const MAX_SYMLINK_HOPS: usize = 40;
const TARGET_KEYS: &[&str] = &["path", "file_path", "target", "notebook_path"];

/// Keeps write/edit targets inside the project root.
pub struct PathGuard {
    project_root: PathBuf,
}

impl PathGuard {
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = fs::canonicalize(project_root)?;
        Ok(Self { project_root: root })
    }

    pub fn inspect(&self, params: &Params) -> Vec<Violation> {
        match first_str(params, TARGET_KEYS) {
            Some(target) => self.check(target).err().into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn check(&self, target: &str) -> Result<(), Violation> {
        if target.is_empty() {
            return Ok(());
        }

        let resolved = self.resolve(Path::new(target));
        let Ok(relative) = resolved.strip_prefix(&self.project_root) else {
            return Err(Violation::new(
                CheckSource::WriteSandbox,
                format!("Write/Edit path is outside project: {}", target),
            ));
        };

        if let Some(name) = relative.file_name().and_then(|n| n.to_str()) {
            if PROTECTED_FILES.contains(&name) {
                return Err(Violation::new(
                    CheckSource::WriteSandbox,
                    format!("Write/Edit to protected file is not allowed: {}", name),
                ));
            }
        }

        let parent_dirs = relative.parent().into_iter().flat_map(Path::components);
        for component in parent_dirs {
            if let Component::Normal(segment) = component {
                if let Some(dir) = PROTECTED_DIRS.iter().find(|d| segment.to_str() == Some(**d)) {
                    return Err(Violation::new(
                        CheckSource::WriteSandbox,
                        format!("Write/Edit in protected directory is not allowed: {}", dir),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Resolve `target` the way the kernel would. Relative paths are anchored
    /// at the project root. Symlinks are followed component by component,
    /// including links whose target does not exist yet. The tail that does not
    /// exist is applied lexically.
    pub fn resolve(&self, target: &Path) -> PathBuf {
        let absolute = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.project_root.join(target)
        };
        if let Ok(resolved) = fs::canonicalize(&absolute) {
            return resolved;
        }

        let mut pending = VecDeque::new();
        push_front(&mut pending, &absolute);
        let mut resolved = PathBuf::new();
        let mut hops = 0;

        while let Some(part) = pending.pop_front() {
            let Some(component) = part.components().next() else {
                continue;
            };
            match component {
                Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::Normal(name) => {
                    let candidate = resolved.join(name);
                    if hops < MAX_SYMLINK_HOPS && is_symlink(&candidate) {
                        if let Ok(link) = fs::read_link(&candidate) {
                            hops += 1;
                            if link.is_absolute() {
                                resolved = PathBuf::new();
                            }
                            push_front(&mut pending, &link);
                            continue;
                        }
                    }
                    resolved = candidate;
                }
            }
        }

        resolved
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

fn push_front(pending: &mut VecDeque<PathBuf>, path: &Path) {
    for component in path.components().rev() {
        pending.push_front(PathBuf::from(component.as_os_str()));
    }
}
