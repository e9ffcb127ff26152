//! `.txt` / `.md`: the whole file, lossily decoded.

use std::path::Path;

use tracing::warn;

pub(crate) fn preview(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "text file unreadable");
            crate::unreadable(path, &e)
        }
    }
}
