use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub reports_dir: PathBuf,
}

/// Creates the log and report directories and checks that reports can be
/// written before any monitoring starts.
pub fn ensure_directories(cfg: &DirectoryConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&cfg.logs_dir)?;
    let reports_dir = ensure_dir(&cfg.reports_dir)?;

    let marker_file = reports_dir.join(".write-test");
    fs::write(&marker_file, b"ok")
        .with_context(|| format!("reports directory {} is not writable", reports_dir.display()))?;
    fs::remove_file(&marker_file)?;
    Ok(ResolvedPaths {
        logs_dir,
        reports_dir,
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {}", path))?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(&dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o755);
            let _ = fs::set_permissions(&dir, perms);
        }
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let cfg = DirectoryConfig {
            logs_dir: root.path().join("a/logs").display().to_string(),
            reports_dir: root.path().join("b/reports").display().to_string(),
        };

        let paths = ensure_directories(&cfg).unwrap();
        assert!(paths.logs_dir.is_dir());
        assert!(paths.reports_dir.is_dir());
        assert!(!paths.reports_dir.join(".write-test").exists());
    }
}
