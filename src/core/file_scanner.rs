use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use colored::Colorize;
use glob::Pattern;
use walkdir::WalkDir;

/// Filters applied to module discovery.
#[derive(Debug, Clone)]
pub struct ModuleFilter<'a> {
    pub extension: &'a str,
    /// Module stems never scanned, e.g. `std`.
    pub exclude_modules: &'a [String],
    /// Glob patterns matched against the path relative to the source directory.
    pub ignores: &'a [String],
}

/// Result of scanning the source directory.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Sorted module file paths.
    pub files: Vec<PathBuf>,
    pub skipped_count: usize,
}

/// One module with the test file it pairs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInput {
    pub name: String,
    pub module_path: PathBuf,
    pub test_path: PathBuf,
}

/// Module name of a file: its stem.
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// List module files directly under `src_dir`.
pub fn scan_modules(src_dir: &Path, filter: &ModuleFilter<'_>, verbose: bool) -> Result<ScanResult> {
    if !src_dir.is_dir() {
        bail!("Source directory not found: {}", src_dir.display());
    }

    let mut patterns: Vec<Pattern> = Vec::new();
    for p in filter.ignores {
        match Pattern::new(p) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => {
                if verbose {
                    eprintln!(
                        "{} Invalid ignore pattern '{}': {}",
                        "warning:".bold().yellow(),
                        p,
                        e
                    );
                }
            }
        }
    }

    let mut result = ScanResult::default();

    for entry in WalkDir::new(src_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                result.skipped_count += 1;
                if verbose {
                    eprintln!("{} {}", "warning:".bold().yellow(), e);
                }
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(filter.extension)
        {
            continue;
        }

        let name = module_name(path);
        if filter.exclude_modules.iter().any(|m| *m == name) {
            continue;
        }

        let relative = path.strip_prefix(src_dir).unwrap_or(path);
        if patterns.iter().any(|p| p.matches_path(relative)) {
            if verbose {
                eprintln!("Note: Ignoring {}", path.display());
            }
            continue;
        }

        result.files.push(path.to_path_buf());
    }

    result.files.sort();
    Ok(result)
}
