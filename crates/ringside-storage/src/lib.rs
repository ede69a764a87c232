//! Output storage for generated pages.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct StoredPage {
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub byte_size: usize,
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `html` to `<root>/<file_name>` through a temp file and rename.
    pub fn write_page(&self, file_name: &str, html: &str) -> Result<StoredPage> {
        let relative_path = PathBuf::from(file_name);
        let absolute_path = self.root.join(&relative_path);
        let parent = absolute_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(&parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }

        let temp_name = format!(".{}.{}.tmp", file_name.replace('/', "_"), std::process::id());
        let temp_path = parent.join(temp_name);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp_path)
            .with_context(|| format!("opening temp page file {}", temp_path.display()))?;
        file.write_all(html.as_bytes())
            .with_context(|| format!("writing temp page file {}", temp_path.display()))?;
        file.flush()
            .with_context(|| format!("flushing temp page file {}", temp_path.display()))?;
        drop(file);

        if let Err(err) = fs::rename(&temp_path, &absolute_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err).with_context(|| {
                format!(
                    "renaming temp page {} -> {}",
                    temp_path.display(),
                    absolute_path.display()
                )
            });
        }

        debug!(path = %absolute_path.display(), bytes = html.len(), "wrote page");
        Ok(StoredPage {
            relative_path,
            absolute_path,
            byte_size: html.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_create_missing_directories_and_overwrite() {
        let dir = tempdir().expect("tempdir");
        let store = OutputStore::new(dir.path().join("site"));

        let first = store.write_page("EC2026.html", "<p>one</p>").expect("first write");
        let second = store.write_page("EC2026.html", "<p>two!</p>").expect("second write");

        assert_eq!(first.absolute_path, second.absolute_path);
        assert_eq!(second.byte_size, 11);
        assert_eq!(fs::read_to_string(&second.absolute_path).unwrap(), "<p>two!</p>");
    }

    #[test]
    fn no_temp_files_are_left_behind() {
        let dir = tempdir().expect("tempdir");
        let store = OutputStore::new(dir.path());
        store.write_page("index.html", "<html></html>").expect("write");

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["index.html".to_string()]);
    }
}
