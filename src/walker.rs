use crate::errors::{Error, Result};
use crate::replacements::ReplacementSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

const VCS_DIR: &str = ".git";
const VENDOR_DIR: &str = "vendor";
const FAKE_MARKER: &str = "fake";

/// Decides which directories the walk descends into.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryFilter {
    include_fakes: bool,
}

impl DirectoryFilter {
    pub fn new(include_fakes: bool) -> Self {
        Self { include_fakes }
    }

    /// Returns `true` if a directory with this name must be pruned.
    ///
    /// `.git` and `vendor` are always pruned. Any name containing `fake` is
    /// pruned unless fakes were requested.
    pub fn should_skip(&self, name: &str) -> bool {
        name == VCS_DIR || name == VENDOR_DIR || (!self.include_fakes && name.contains(FAKE_MARKER))
    }

    /// Applies the rule to a walk entry. The root and non-directories always pass.
    fn admits(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if self.should_skip(&name) {
            debug!(dir = %entry.path().display(), "pruned");
            return false;
        }
        true
    }
}

/// Counters collected during one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Files with the recognized suffix that were examined.
    pub candidates: usize,
    /// Candidates that were rewritten.
    pub modified: usize,
    /// Candidates that could not be read or written.
    pub errors: usize,
}

/// The result of a walk: modified files in traversal order, plus counters.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub modified: Vec<PathBuf>,
    pub stats: WalkStats,
}

/// Walks a tree and applies a [`ReplacementSet`] to every matching file.
///
/// Traversal is depth first with entries sorted by file name, so the order of
/// `WalkOutcome::modified` is stable for a given tree.
pub struct FileWalker<'a> {
    replacements: &'a ReplacementSet,
    filter: DirectoryFilter,
    suffix: &'a str,
    verbose: bool,
}

impl<'a> FileWalker<'a> {
    pub fn new(replacements: &'a ReplacementSet, filter: DirectoryFilter, suffix: &'a str) -> Self {
        Self {
            replacements,
            filter,
            suffix,
            verbose: false,
        }
    }

    /// Print a `Modified <path>` line for each rewritten file.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Walks `root`, rewriting every candidate file that contains a pattern.
    ///
    /// Per-file read and write failures are printed to stderr and the walk
    /// goes on. Only a failure of the traversal itself is returned as an error.
    pub fn walk(&self, root: &Path) -> Result<WalkOutcome> {
        let mut outcome = WalkOutcome::default();

        let entries = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.filter.admits(e));

        for entry in entries {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !entry.file_name().to_string_lossy().ends_with(self.suffix) {
                debug!(file = %entry.path().display(), "suffix does not match");
                continue;
            }
            if !file_type.is_file() {
                debug!(file = %entry.path().display(), "not a regular file, left alone");
                continue;
            }

            outcome.stats.candidates += 1;
            let path = entry.path();
            match self.replace_file(path) {
                Ok(true) => {
                    if self.verbose {
                        println!("Modified {}", path.display());
                    }
                    debug!(file = %path.display(), "modified");
                    outcome.modified.push(path.to_path_buf());
                }
                Ok(false) => {}
                Err(e) => {
                    outcome.stats.errors += 1;
                    eprintln!("{e}");
                }
            }
        }

        outcome.stats.modified = outcome.modified.len();
        info!(
            candidates = outcome.stats.candidates,
            modified = outcome.stats.modified,
            errors = outcome.stats.errors,
            "walk complete"
        );
        Ok(outcome)
    }

    /// Rewrites one file. Returns `Ok(false)` when no pattern occurs in it,
    /// in which case the file is not touched.
    pub fn replace_file(&self, path: &Path) -> Result<bool> {
        let content = fs::read(path).map_err(|e| Error::file_io(path, e))?;
        if !self.replacements.contains_any(&content) {
            return Ok(false);
        }
        let updated = self.replacements.apply_all(&content);
        write_atomic(path, &updated).map_err(|e| Error::file_io(path, e))?;
        Ok(true)
    }
}

/// Replaces the contents of `path` via a temporary file in the same directory.
///
/// Readers see either the old or the new contents, never a partial write.
/// The original permissions are carried over.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(contents)?;

    let perms = fs::metadata(path)?.permissions();
    fs::set_permissions(temp_file.path(), perms)?;

    temp_file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::replacements::Replacement;
    use tempfile::TempDir;

    fn foo_to_baz() -> ReplacementSet {
        ReplacementSet::new(vec![Replacement::new("foo", "baz").unwrap()]).unwrap()
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_filter_rules() {
        let strict = DirectoryFilter::new(false);
        assert!(strict.should_skip(".git"));
        assert!(strict.should_skip("vendor"));
        assert!(strict.should_skip("fakes"));
        assert!(strict.should_skip("myfakeclient"));
        assert!(!strict.should_skip("src"));
        assert!(!strict.should_skip("vendored"));
        assert!(!strict.should_skip(".github"));

        let fakes = DirectoryFilter::new(true);
        assert!(fakes.should_skip(".git"));
        assert!(fakes.should_skip("vendor"));
        assert!(!fakes.should_skip("fakes"));
    }

    #[test]
    fn test_walk_prunes_vcs_and_vendor() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let kept = write(root, "src/lib.rs", "foo");
        let git = write(root, ".git/hooks/x.rs", "foo");
        let vendor = write(root, "vendor/dep/lib.rs", "foo");

        let reps = foo_to_baz();
        let outcome = FileWalker::new(&reps, DirectoryFilter::new(true), ".rs")
            .walk(root)
            .unwrap();

        assert_eq!(outcome.modified, vec![kept.clone()]);
        assert_eq!(fs::read_to_string(kept).unwrap(), "baz");
        assert_eq!(fs::read_to_string(git).unwrap(), "foo");
        assert_eq!(fs::read_to_string(vendor).unwrap(), "foo");
    }

    #[test]
    fn test_fake_toggle() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let fake = write(root, "fakeclient/client.rs", "foo");
        let reps = foo_to_baz();

        let outcome = FileWalker::new(&reps, DirectoryFilter::new(false), ".rs")
            .walk(root)
            .unwrap();
        assert!(outcome.modified.is_empty());
        assert_eq!(fs::read_to_string(&fake).unwrap(), "foo");

        let outcome = FileWalker::new(&reps, DirectoryFilter::new(true), ".rs")
            .walk(root)
            .unwrap();
        assert_eq!(outcome.modified, vec![fake.clone()]);
        assert_eq!(fs::read_to_string(&fake).unwrap(), "baz");
    }

    #[test]
    fn test_root_is_never_filtered() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("vendor");
        let file = write(&root, "a.rs", "foo");
        let reps = foo_to_baz();

        let outcome = FileWalker::new(&reps, DirectoryFilter::new(false), ".rs")
            .walk(&root)
            .unwrap();
        assert_eq!(outcome.modified, vec![file]);
    }

    #[test]
    fn test_suffix_filter_and_untouched_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let other = write(root, "notes.txt", "foo");
        let clean = write(root, "clean.rs", "nothing here");
        let reps = foo_to_baz();

        let outcome = FileWalker::new(&reps, DirectoryFilter::default(), ".rs")
            .walk(root)
            .unwrap();

        assert!(outcome.modified.is_empty());
        assert_eq!(outcome.stats.candidates, 1);
        assert_eq!(fs::read_to_string(other).unwrap(), "foo");
        assert_eq!(fs::read_to_string(clean).unwrap(), "nothing here");
    }

    #[test]
    fn test_modified_order_is_lexical_depth_first() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let b = write(root, "b.rs", "foo");
        let a_inner = write(root, "a/z.rs", "foo");
        let a = write(root, "a.rs", "foo");
        let reps = foo_to_baz();

        let outcome = FileWalker::new(&reps, DirectoryFilter::default(), ".rs")
            .walk(root)
            .unwrap();
        assert_eq!(outcome.modified, vec![a_inner, a, b]);
    }

    #[test]
    fn test_second_walk_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "x.rs", "foo(bar)");
        let reps = foo_to_baz();
        let walker = FileWalker::new(&reps, DirectoryFilter::default(), ".rs");

        assert_eq!(walker.walk(dir.path()).unwrap().modified.len(), 1);
        assert!(walker.walk(dir.path()).unwrap().modified.is_empty());
    }

    #[test]
    fn test_missing_root_is_traversal_error() {
        let dir = TempDir::new().unwrap();
        let reps = foo_to_baz();
        let err = FileWalker::new(&reps, DirectoryFilter::default(), ".rs")
            .walk(&dir.path().join("gone"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Traversal);
    }

    #[test]
    fn test_unreadable_file_is_per_file_error() {
        let dir = TempDir::new().unwrap();
        let reps = foo_to_baz();
        let walker = FileWalker::new(&reps, DirectoryFilter::default(), ".rs");
        let err = walker.replace_file(&dir.path().join("missing.rs")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileIo);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_does_not_stop_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let a = write(root, "a.rs", "foo");
        let b = write(root, "b.rs", "foo");
        let c = write(root, "c.rs", "foo");
        fs::set_permissions(&b, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&b).is_ok() {
            // Privileged users ignore file modes.
            return;
        }

        let reps = foo_to_baz();
        let outcome = FileWalker::new(&reps, DirectoryFilter::default(), ".rs")
            .walk(root)
            .unwrap();
        fs::set_permissions(&b, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(outcome.modified, vec![a.clone(), c.clone()]);
        assert_eq!(outcome.stats.candidates, 3);
        assert_eq!(outcome.stats.errors, 1);
        assert_eq!(fs::read_to_string(a).unwrap(), "baz");
        assert_eq!(fs::read_to_string(b).unwrap(), "foo");
        assert_eq!(fs::read_to_string(c).unwrap(), "baz");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_traversal_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "a.rs", "foo");
        write(root, "locked/inner.rs", "foo");
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let reps = foo_to_baz();
        let result = FileWalker::new(&reps, DirectoryFilter::default(), ".rs").walk(root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Traversal);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_source_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let target = write(root, "real.txt", "foo");
        std::os::unix::fs::symlink(&target, root.join("link.rs")).unwrap();

        let reps = foo_to_baz();
        let outcome = FileWalker::new(&reps, DirectoryFilter::default(), ".rs")
            .walk(root)
            .unwrap();

        assert!(outcome.modified.is_empty());
        assert_eq!(outcome.stats.candidates, 0);
        assert_eq!(fs::read_to_string(target).unwrap(), "foo");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "x.rs", "old");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
