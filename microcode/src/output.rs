use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use log::{info, warn};

use crate::{allocator::Allocation, compile::Artifacts, error::MicrocodeError};

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(prefix.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// Writes `<prefix>.hex` and `<prefix>.sv`. Both are staged as `.tmp` files
/// and swapped in together: if either swap fails, the previous contents of
/// both targets are restored and no staging files are left behind.
pub(crate) fn write_artifacts(
    artifacts: &Artifacts,
    prefix: &Path,
) -> Result<(PathBuf, PathBuf), MicrocodeError> {
    let image_path = with_suffix(prefix, ".hex");
    let table_path = with_suffix(prefix, ".sv");
    let outputs = [
        (&image_path, &artifacts.sim_image),
        (&table_path, &artifacts.lookup_table),
    ];

    for (path, _) in outputs {
        check_target(path)?;
    }

    let mut staged: Vec<(PathBuf, &Path)> = Vec::new();
    for (path, contents) in outputs {
        let tmp = with_suffix(path, ".tmp");
        if let Err(e) = fs::write(&tmp, contents) {
            discard(&tmp);
            for (stale, _) in &staged {
                discard(stale);
            }
            return Err(MicrocodeError::io(tmp, e));
        }
        staged.push((tmp, path.as_path()));
    }

    commit(&staged)?;
    for (_, path) in &staged {
        info!("Wrote {}", path.display());
    }
    Ok((image_path, table_path))
}

/// A target may be missing or a regular file; anything else cannot be
/// replaced by a rename.
fn check_target(path: &Path) -> Result<(), MicrocodeError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.is_file() => Err(MicrocodeError::io(
            path,
            io::Error::other("not a regular file"),
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MicrocodeError::io(path, e)),
    }
}

/// Renames every staged file onto its target, all or nothing.
fn commit(staged: &[(PathBuf, &Path)]) -> Result<(), MicrocodeError> {
    let mut swapped: Vec<(&Path, Option<PathBuf>)> = Vec::new();
    for (index, (tmp, path)) in staged.iter().enumerate() {
        match swap_in(tmp, path) {
            Ok(backup) => swapped.push((path, backup)),
            Err(e) => {
                for (tmp, _) in &staged[index..] {
                    discard(tmp);
                }
                for (path, backup) in swapped.iter().rev() {
                    match backup {
                        Some(backup) => {
                            if let Err(e) = fs::rename(backup, path) {
                                warn!("Could not restore {}: {}", path.display(), e);
                            }
                        }
                        None => discard(path),
                    }
                }
                return Err(e);
            }
        }
    }
    for (_, backup) in swapped {
        if let Some(backup) = backup {
            discard(&backup);
        }
    }
    Ok(())
}

/// Moves `tmp` onto `path`, keeping the old `path` aside as `.bak`.
fn swap_in(tmp: &Path, path: &Path) -> Result<Option<PathBuf>, MicrocodeError> {
    let backup = if path.exists() {
        let backup = with_suffix(path, ".bak");
        fs::rename(path, &backup).map_err(|e| MicrocodeError::io(path, e))?;
        Some(backup)
    } else {
        None
    };
    if let Err(e) = fs::rename(tmp, path) {
        if let Some(backup) = &backup {
            if let Err(e) = fs::rename(backup, path) {
                warn!("Could not restore {}: {}", path.display(), e);
            }
        }
        return Err(MicrocodeError::io(path, e));
    }
    Ok(backup)
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Allocation summary for whoever maintains the opcode dispatch table.
pub(crate) fn listing(allocation: &Allocation) -> String {
    let row = |name: &str, base: &str, steps: &str, offset: &str| {
        format!("{:<16} {:>6} {:>6} {:>8}\n", name, base, steps, offset)
    };
    let mut out = row("program", "base", "steps", "offset");
    for placement in &allocation.placements {
        let offset = placement
            .relative_offset
            .map_or_else(|| "-".to_string(), |offset| offset.to_string());
        out.push_str(&row(
            &placement.name,
            &placement.base.to_string(),
            &placement.len.to_string(),
            &offset,
        ));
    }
    out
}
