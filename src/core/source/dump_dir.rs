use std::{
    fs,
    path::{Path, PathBuf},
};

use super::{DumpSource, ToolFailure};

pub const DUMP_EXTENSION: &str = "ast";

/// Reads pre-generated dumps: `<dir>/<file name>.ast`, e.g. `dumps/format.cppm.ast`.
#[derive(Debug, Clone)]
pub struct DumpDir {
    pub dir: PathBuf,
}

impl DumpDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dump_path(&self, file: &Path) -> PathBuf {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.dir.join(format!("{}.{}", name, DUMP_EXTENSION))
    }
}

impl DumpSource for DumpDir {
    fn dump(&self, file: &Path) -> Result<String, ToolFailure> {
        let path = self.dump_path(file);
        if !path.is_file() {
            return Err(ToolFailure::MissingDump { path });
        }
        let content = fs::read_to_string(&path).map_err(|e| ToolFailure::Io {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if content.trim().is_empty() {
            return Err(ToolFailure::EmptyOutput {
                tool: path.display().to_string(),
            });
        }
        Ok(content)
    }

    fn describe(&self, file: &Path) -> String {
        format!("read {}", self.dump_path(file).display())
    }
}
