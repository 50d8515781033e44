use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use walkdir::WalkDir;

use crate::core::environment::ExecutionEnvironment;
use crate::core::error::{Result, SpawnError};

/// `relative_path_prefix` as Webots will be able to resolve it.
pub type ResolvedPathPrefix = Option<String>;

// One lock per shared folder destination, so two spawns of the same package
// in this process can't interleave the existence check and the copy.
static COPY_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Last component of a path written with either separator, ignoring
/// trailing separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(|c: char| c == '/' || c == '\\');
    trimmed
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(trimmed)
}

/// Makes `relative_path_prefix` usable from the Webots side. Under WSL the
/// path is rewritten to its Windows form. With a shared folder the directory
/// is copied into the container side of the share (once) and the path is
/// rebound to the host side of the share. Both apply in that order.
/// Blocks on `wslpath` and on the copy.
pub fn reconcile_relative_path_prefix<E>(
    relative_path_prefix: Option<&str>,
    env: &E,
) -> Result<ResolvedPathPrefix>
where
    E: ExecutionEnvironment + ?Sized,
{
    resolve(relative_path_prefix, env, true)
}

/// Same path as `reconcile_relative_path_prefix` but nothing is written to
/// the shared folder. `wslpath` still runs.
pub fn preview_relative_path_prefix<E>(
    relative_path_prefix: Option<&str>,
    env: &E,
) -> Result<ResolvedPathPrefix>
where
    E: ExecutionEnvironment + ?Sized,
{
    resolve(relative_path_prefix, env, false)
}

fn resolve<E>(
    relative_path_prefix: Option<&str>,
    env: &E,
    copy: bool,
) -> Result<ResolvedPathPrefix>
where
    E: ExecutionEnvironment + ?Sized,
{
    let original = match relative_path_prefix {
        Some(prefix) if !prefix.is_empty() => prefix,
        other => return Ok(other.map(|p| p.to_string())),
    };

    let descriptor = env.descriptor();
    let mut resolved = original.to_string();

    if descriptor.wsl {
        resolved = env.to_windows_path(&resolved)?.replace('\\', "/");
        log::debug!(target: "urdf_spawner", "WSL path '{}' converted to '{}'.", original, resolved);
    }

    if descriptor.shared_folder {
        let name = basename(&resolved).to_string();
        let destination = Path::new(&env.container_shared_folder()?).join(&name);
        if copy {
            copy_to_shared_folder(Path::new(original), &destination)?;
        }
        resolved = format!(
            "{}/{}",
            env.host_shared_folder()?.trim_end_matches('/'),
            name
        );
        log::debug!(target: "urdf_spawner",
            "Relative path prefix remapped to the shared folder as '{}'.", resolved);
    }

    Ok(Some(resolved))
}

/// Copies `source` to `destination` unless `destination` already exists.
/// Returns whether a copy happened. An interrupted copy is not detected on
/// the next run, only existence is checked.
pub fn copy_to_shared_folder(source: &Path, destination: &Path) -> Result<bool> {
    let lock = destination_lock(destination);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    if destination.is_dir() {
        log::debug!(target: "urdf_spawner",
            "'{}' is already in the shared folder, skipping the copy.", destination.display());
        return Ok(false);
    }

    log::info!(target: "urdf_spawner",
        "Copying '{}' to the shared folder at '{}'.", source.display(), destination.display());
    copy_tree(source, destination)?;
    Ok(true)
}

fn destination_lock(destination: &Path) -> Arc<Mutex<()>> {
    let mut locks = COPY_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks
        .entry(destination.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

fn copy_tree(source: &Path, destination: &Path) -> Result<()> {
    let copy_error = |source_error: std::io::Error| SpawnError::Copy {
        source_dir: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source: source_error,
    };

    if !source.is_dir() {
        return Err(copy_error(std::io::Error::new(
            ErrorKind::NotFound,
            "source is not a directory",
        )));
    }

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| copy_error(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| copy_error(std::io::Error::new(ErrorKind::Other, e)))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(copy_error)?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(copy_error)?;
        }
    }

    Ok(())
}
