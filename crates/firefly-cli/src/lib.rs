//! Library interface for the firefly command line

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use firefly_codegen::write_artifacts;
use firefly_compiler::{CompilationPipeline, CompilerConfig, ReportSummary, CONFIG_FILE_NAME};
use firefly_core::unit::{CompilationUnit, UnitKind};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const SOURCE_EXTENSION: &str = "firefly";

/// Find every `*.firefly` file under `root`
///
/// The directory of a file relative to `root` becomes the unit's package
/// path. Files are not read here; entries that cannot be listed come back as
/// errors so the pipeline can apply its input error policy.
pub fn discover_units(root: &Path) -> Vec<Result<CompilationUnit>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => {
                let is_source = entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION);
                is_source.then(|| source_unit(root, entry.path()))
            }
            Err(err) => Some(Err(anyhow::Error::new(err).context(format!(
                "Failed to list sources under {}",
                root.display()
            )))),
        })
        .collect()
}

fn source_unit(root: &Path, path: &Path) -> Result<CompilationUnit> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;

    let file_name = relative
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("{} has no UTF-8 file name", path.display()))?
        .to_string();

    let mut segments = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            let segment = component
                .as_os_str()
                .to_str()
                .with_context(|| format!("{} has a non UTF-8 directory", path.display()))?;
            segments.push(segment.to_string());
        }
    }

    let source = path.to_path_buf();
    Ok(CompilationUnit::new(
        file_name,
        segments.join("/"),
        UnitKind::Unit,
        move || fs::read_to_string(&source),
    ))
}

/// Configuration for a source tree
///
/// An explicit path must exist; otherwise `firefly.toml` at the root of the
/// tree is used when present.
pub fn load_config(source_dir: &Path, explicit: Option<&Path>) -> Result<CompilerConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = source_dir.join(CONFIG_FILE_NAME);
            if !candidate.is_file() {
                debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, source_dir.display());
                return Ok(CompilerConfig::default());
            }
            candidate
        }
    };

    info!("Loading configuration from {}", path.display());
    Ok(CompilerConfig::from_file(&path)?)
}

#[derive(Debug)]
pub struct CompileOutcome {
    pub summary: ReportSummary,
    /// Number of units that produced output
    pub compiled: usize,
    pub written: Vec<PathBuf>,
}

/// Compile a source tree, writing artifacts under `output_dir` as units finish
pub async fn compile_dir(
    source_dir: &Path,
    output_dir: &Path,
    config: CompilerConfig,
) -> Result<CompileOutcome> {
    let units = discover_units(source_dir);
    info!("Found {} source unit(s) in {}", units.len(), source_dir.display());

    let pipeline = CompilationPipeline::new(config)?;
    let mut compilation = pipeline.compile(futures::stream::iter(units));

    let mut compiled = 0;
    let mut written = Vec::new();
    while let Some(unit) = compilation.next_unit().await {
        let display = unit.unit().display_path();
        let dir = output_dir.to_path_buf();
        let paths = tokio::task::spawn_blocking(move || write_artifacts(&dir, &unit.artifacts))
            .await?
            .with_context(|| format!("Failed to write output of {}", display))?;
        compiled += 1;
        written.extend(paths);
    }

    let summary = compilation.finish().await?;
    Ok(CompileOutcome {
        summary,
        compiled,
        written,
    })
}
