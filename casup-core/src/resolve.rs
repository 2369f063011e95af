// casup-core/src/resolve.rs
use std::env;
use std::path::{Path, PathBuf};

use casup_common::error::Result;
use casup_common::model::ArtifactRule;
use glob::MatchOptions;
use tracing::{debug, warn};

/// Expands `rule.pattern` recursively under `root_dir`.
///
/// Returns every matching regular file, sorted; an empty vector when nothing
/// matches. Wildcards never match dot-prefixed files or directories below the
/// root. Relative roots are taken from the current directory.
pub fn resolve(rule: &ArtifactRule, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let root = if root_dir.is_relative() {
        env::current_dir()?.join(root_dir)
    } else {
        root_dir.to_path_buf()
    };
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/**/{}", escaped_root.trim_end_matches('/'), rule.pattern);
    debug!("Resolving {}", pattern);

    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::default()
    };

    let mut matches = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        match entry {
            Ok(path) if is_hidden_below(&path, &root) => {
                debug!("Ignoring hidden match {}", path.display())
            }
            Ok(path) if path.is_file() => matches.push(path),
            Ok(path) => debug!("Ignoring non-file match {}", path.display()),
            Err(e) => warn!("Could not read {} while resolving {}: {}", e.path().display(), rule.pattern, e),
        }
    }
    matches.sort();
    matches.dedup();
    debug!("{} matched {} file(s)", rule.pattern, matches.len());
    Ok(matches)
}

fn is_hidden_below(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root).is_ok_and(|relative| {
        relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
    })
}
