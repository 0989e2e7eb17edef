use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};

use crate::{
    cli::args::CommonArgs,
    config::{CONFIG_FILE_NAME, Config, load_config},
    core::{
        exports::{NamespaceFilter, ScanOptions},
        file_scanner::{ModuleFilter, ModuleInput, module_name, scan_modules},
        heuristic::HeuristicExtractor,
        source::{CompilerDump, DumpDir, DumpProvider, DumpSource},
        usage::{FastLocator, Locator, TreeLocator, UsageStrategy},
    },
};

/// Everything a command needs: merged configuration, resolved directories and
/// the dump source. Read-only once built, shared across rayon tasks.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub root: PathBuf,
    pub config: Config,
    pub src_dir: PathBuf,
    pub test_dir: PathBuf,
    pub dump_source: DumpProvider,
    pub verbose: bool,
}

impl AnalysisContext {
    /// Create a new `AnalysisContext` from command line arguments.
    ///
    /// Priority: CLI args > config file > defaults. The config file is searched
    /// upward from `--root`.
    pub fn new(common_args: &CommonArgs) -> Result<Self> {
        let verbose = common_args.verbose;
        let root = common_args.root.clone();

        let config_result = load_config(&root)?;
        if verbose {
            match &config_result.path {
                Some(path) => eprintln!("Note: Using configuration from {}", path.display()),
                None => eprintln!(
                    "Note: No {} found, using default configuration",
                    CONFIG_FILE_NAME
                ),
            }
        }

        let mut config = config_result.config;
        if let Some(ref compiler) = common_args.compiler {
            config.compiler.path = compiler.clone();
        }
        if let Some(ref src_dir) = common_args.src_dir {
            config.src_dir = src_dir.to_string_lossy().into_owned();
        }
        if let Some(ref test_dir) = common_args.test_dir {
            config.test_dir = test_dir.to_string_lossy().into_owned();
        }

        let dump_source = match &common_args.dump_dir {
            Some(dir) => {
                if !dir.is_dir() {
                    bail!("Dump directory not found: {}", dir.display());
                }
                DumpProvider::Directory(DumpDir::new(dir.clone()))
            }
            None => compiler_source(&config),
        };

        let mut ctx = Self::from_parts(root, config, dump_source);
        ctx.verbose = verbose;
        Ok(ctx)
    }

    /// Build a context from already-loaded pieces, directories taken from `config`.
    pub fn from_parts(root: PathBuf, config: Config, dump_source: DumpProvider) -> Self {
        let src_dir = under_root(&root, &config.src_dir);
        let test_dir = under_root(&root, &config.test_dir);
        Self {
            root,
            config,
            src_dir,
            test_dir,
            dump_source,
            verbose: false,
        }
    }

    /// Fail the whole run when the dump source cannot work at all, instead of
    /// reporting the same failure once per module.
    pub fn preflight(&self) -> Result<()> {
        if self.verbose
            && let DumpProvider::Compiler(ref compiler) = self.dump_source
        {
            eprintln!("Note: Checking {} --version", compiler.program);
        }
        self.dump_source
            .preflight()
            .context("Cannot produce declaration dumps")
    }

    pub fn namespace_filter(&self) -> NamespaceFilter {
        NamespaceFilter {
            namespace: self.config.namespace.clone(),
            nested: self.config.nested_namespaces.clone(),
        }
    }

    pub fn scan_options(&self, module_name: &str) -> ScanOptions {
        ScanOptions {
            module_name: module_name.to_string(),
            namespaces: self.namespace_filter(),
            window: self.config.correlation_window,
        }
    }

    pub fn heuristic_extractor(&self) -> Result<HeuristicExtractor> {
        HeuristicExtractor::new(&self.config.namespace)
    }

    pub fn locator(&self, strategy: UsageStrategy) -> Locator {
        match strategy {
            UsageStrategy::Fast => Locator::Fast(FastLocator::new(self.config.namespace.clone())),
            UsageStrategy::Tree => Locator::Tree(TreeLocator {
                context_tokens: self.config.context_tokens,
            }),
        }
    }

    /// Module files in the source directory. Finding none is an error.
    pub fn discover_modules(&self) -> Result<Vec<PathBuf>> {
        let filter = ModuleFilter {
            extension: &self.config.module_extension,
            exclude_modules: &self.config.exclude_modules,
            ignores: &self.config.ignores,
        };
        let scan = scan_modules(&self.src_dir, &filter, self.verbose)?;
        if scan.files.is_empty() {
            bail!(
                "No module files (*.{}) found in {}",
                self.config.module_extension,
                self.src_dir.display()
            );
        }
        Ok(scan.files)
    }

    /// Pair a module with its conventional test file.
    pub fn pair(&self, module_path: &Path) -> ModuleInput {
        let name = module_name(module_path);
        ModuleInput {
            test_path: self.test_dir.join(self.config.test_file_name(&name)),
            name,
            module_path: module_path.to_path_buf(),
        }
    }
}

fn compiler_source(config: &Config) -> DumpProvider {
    DumpProvider::Compiler(CompilerDump {
        program: config.compiler.path.clone(),
        args: config.compiler.args.clone(),
        timeout: Duration::from_secs(config.compiler.timeout_secs),
        allowed_exit_codes: config.compiler.allowed_exit_codes.clone(),
    })
}

fn under_root(root: &Path, dir: &str) -> PathBuf {
    if root == Path::new(".") {
        PathBuf::from(dir)
    } else {
        root.join(dir)
    }
}
