//! Remote path normalization shared by the bundled clients
//!
//! Remote paths are plain strings. The bundled clients accept absolute paths,
//! paths relative to their working directory, and fully qualified forms such
//! as `mem://cluster/data/a.txt`; all of them are reduced to a canonical
//! absolute form (`/data/a.txt`, root is `/`).

use std::io;

/// Directory holding read-only snapshot views, e.g. `/data/.snapshot/s1`
pub const SNAPSHOT_DIR: &str = ".snapshot";

/// Strip a `scheme://authority` prefix, if any
fn strip_scheme(path: &str) -> &str {
    match path.find("://") {
        Some(idx) => {
            let rest = &path[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "/",
            }
        }
        None => path,
    }
}

/// Reduce `path` to a canonical absolute path, resolving relative paths
/// against `working_dir` and collapsing `.` and `..` components
pub fn normalize(working_dir: &str, path: &str) -> io::Result<String> {
    let path = strip_scheme(path.trim());
    if path.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Can not create a path from an empty string",
        ));
    }

    let joined;
    let absolute = if path.starts_with('/') {
        path
    } else {
        joined = format!("{}/{}", working_dir.trim_end_matches('/'), path);
        joined.as_str()
    };

    let mut components: Vec<&str> = Vec::new();
    for component in absolute.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("Path escapes the root: {path}"),
                    ));
                }
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return Ok("/".to_string());
    }
    Ok(format!("/{}", components.join("/")))
}

/// Parent of a canonical path; `None` for the root
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last component of a canonical path; empty for the root
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// True when `path` is `ancestor` itself or lies below it
pub fn is_within(ancestor: &str, path: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

/// Re-root `path` (which lies within `from`) under `to`
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    let rest = if from == "/" {
        &path[1..]
    } else {
        &path[from.len() + 1..]
    };
    join(to, rest)
}

/// Split `/dir/.snapshot/name/rest` into (`/dir`, `name`, `/rest`)
pub fn split_snapshot_path(path: &str) -> Option<(&str, &str, String)> {
    let marker = format!("/{SNAPSHOT_DIR}/");
    let idx = path.find(&marker)?;
    let dir = if idx == 0 { "/" } else { &path[..idx] };
    let after = &path[idx + marker.len()..];
    let (name, rest) = match after.find('/') {
        Some(slash) => (&after[..slash], &after[slash..]),
        None => (after, "/"),
    };
    if name.is_empty() {
        return None;
    }
    Some((dir, name, rest.to_string()))
}
