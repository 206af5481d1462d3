use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Collects the Rust source files under a root, honoring gitignore rules.
pub struct FileWalker {
    root: PathBuf,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && is_rust_source(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }
}

fn is_rust_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_rust_files_and_skips_others() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();
        fs::write(dir.path().join("b.txt"), "not code").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/c.rs"), "fn c() {}").unwrap();

        let files = FileWalker::new(dir.path().to_path_buf()).walk().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.rs", "c.rs"]);
    }

    #[test]
    fn accepts_a_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.rs");
        fs::write(&file, "fn s() {}").unwrap();

        let files = FileWalker::new(file.clone()).walk().unwrap();
        assert_eq!(files, vec![file]);
    }
}
