use std::path::PathBuf;

/// Filesystem locations a static-file-serving route should consult, in
/// order: a `static` directory next to the executable, then `./static`
/// under the current working directory. Only existing directories are
/// returned; the framework itself never serves files.
pub fn static_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            dirs.push(exe_dir.join("static"));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join("static"));
    }

    dirs.retain(|dir| dir.is_dir());
    dirs.dedup();
    dirs
}
