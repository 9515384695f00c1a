pub mod compiler;
pub mod emitter;
pub mod error;
pub mod literal;
pub mod project;
pub mod target;

#[cfg(not(target_arch = "wasm32"))]
pub mod archive;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub use compiler::{compile_block, compile_chain, resolve_params};
pub use emitter::TextEmitter;
pub use error::{CompileError, ProjectError};
pub use project::{Block, Input, Monitor, Project, Target};
pub use target::{compile_project, compile_target, TargetOutput, DEFAULT_EXTENSION};

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub extension: String,
    pub keep_going: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            keep_going: false,
        }
    }
}

/// Compiles one target of a `project.json` document.
pub fn convert_target_source(project_json: &str, target_name: &str) -> Result<String> {
    let project = Project::from_json_str(project_json)?;
    let target = project
        .target(target_name)
        .ok_or_else(|| anyhow!("Target '{}' not found in project.", target_name))?;
    Ok(compile_target(&project, target)?)
}

pub fn convert_project(
    project: &Project,
    out_dir: &Path,
    options: &ConvertOptions,
) -> Result<Vec<PathBuf>> {
    convert_project_with_progress(
        project,
        out_dir,
        options,
        Option::<&mut fn(usize, usize, &str)>::None,
    )
}

/// Writes `<name>.<extension>` for every target under `out_dir`. Without
/// `keep_going` the first failing target aborts the run; documents written
/// before it stay on disk.
pub fn convert_project_with_progress<F>(
    project: &Project,
    out_dir: &Path,
    options: &ConvertOptions,
    mut progress: Option<&mut F>,
) -> Result<Vec<PathBuf>>
where
    F: FnMut(usize, usize, &str),
{
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create '{}'.", out_dir.display()))?;

    let outputs = compile_project(project);
    let total = outputs.len();
    let mut written = Vec::new();
    for (index, output) in outputs.into_iter().enumerate() {
        if let Some(cb) = progress.as_deref_mut() {
            cb(index + 1, total, &output.name);
        }
        let file_name = output.file_name(&options.extension);
        let text = match output.result {
            Ok(text) => text,
            Err(err) if options.keep_going => {
                warn!("Skipping target '{}': {}", output.name, err);
                continue;
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("Failed to convert target '{}'.", output.name)));
            }
        };
        let path = out_dir.join(file_name);
        fs::write(&path, text.as_bytes())
            .with_context(|| format!("Failed to write '{}'.", path.display()))?;
        info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    if args.extract_only && args.extract.is_none() {
        anyhow::bail!("--extract-only requires --extract.");
    }

    let total_stages = if args.extract_only {
        2
    } else {
        3 + usize::from(args.extract.is_some())
    };
    let progress = CliProgress::new("Convert", total_stages);
    let mut stage = 0usize;

    stage += 1;
    progress.emit(stage, "Resolving input path");
    let input = canonicalize_input(&args.input)?;

    let mut source = input.clone();
    if let Some(extract_dir) = &args.extract {
        if input.is_dir() || archive::is_json_file(&input) {
            anyhow::bail!("--extract needs an .sb3 archive as input.");
        }
        stage += 1;
        progress.emit(stage, "Extracting archive");
        let count = archive::extract_sb3(&input, extract_dir)?;
        info!("extracted {} files into {}", count, extract_dir.display());
        if args.extract_only {
            return Ok(());
        }
        source = extract_dir.clone();
    }

    stage += 1;
    progress.emit(stage, "Reading project");
    let project = archive::load_project(&source)?;

    stage += 1;
    progress.emit(stage, "Converting targets");
    let out_dir = match &args.output {
        Some(path) => path.clone(),
        None => default_output_dir(&input),
    };
    let options = ConvertOptions {
        extension: args.extension.clone(),
        keep_going: args.keep_going,
    };
    let mut per_target = |step: usize, total: usize, name: &str| {
        debug!("target {}/{}: {}", step, total, name);
    };
    let written =
        convert_project_with_progress(&project, &out_dir, &options, Some(&mut per_target))?;
    if written.len() < project.targets.len() {
        warn!(
            "{} of {} targets written to '{}'",
            written.len(),
            project.targets.len(),
            out_dir.display()
        );
    }
    Ok(())
}

pub fn canonicalize_input(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(anyhow!("Input not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

/// `<dir>/script` for an extracted directory, `<stem>_scs` beside a file.
pub fn default_output_dir(input: &Path) -> PathBuf {
    if input.is_dir() {
        return input.join("script");
    }
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("project");
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_scs", stem))
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}
