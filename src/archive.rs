use crate::project::Project;
use anyhow::{anyhow, Context, Result};
use log::debug;
use std::collections::VecDeque;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

pub const PROJECT_JSON: &str = "project.json";

pub fn read_project_json_from_sb3(input: &Path) -> Result<String> {
    let mut zip = open_sb3(input)?;
    let mut entry = zip
        .by_name(PROJECT_JSON)
        .map_err(|_| anyhow!("project.json not found in '{}'.", input.display()))?;
    let mut project_json = String::new();
    entry
        .read_to_string(&mut project_json)
        .with_context(|| format!("Failed to read project.json from '{}'.", input.display()))?;
    Ok(project_json)
}

/// Unpacks every file of the archive under `out_dir`. Returns the number of
/// files written.
pub fn extract_sb3(input: &Path, out_dir: &Path) -> Result<usize> {
    let mut zip = open_sb3(input)?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create '{}'.", out_dir.display()))?;

    let mut written = 0usize;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            debug!("skipping archive entry with unsafe path '{}'", entry.name());
            continue;
        };
        let path = out_dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&path)?;
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        fs::write(&path, bytes).with_context(|| format!("Failed to write '{}'.", path.display()))?;
        written += 1;
    }
    Ok(written)
}

/// Finds `project.json` in an extracted tree: the root first, then the
/// shallowest match in name order.
pub fn locate_project_json(dir: &Path) -> Result<PathBuf> {
    let mut queue = VecDeque::from([dir.to_path_buf()]);
    while let Some(current) = queue.pop_front() {
        let candidate = current.join(PROJECT_JSON);
        if candidate.is_file() {
            return Ok(candidate);
        }
        let mut subdirs = fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory '{}'.", current.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        subdirs.sort();
        queue.extend(subdirs);
    }
    Err(anyhow!("project.json not found under '{}'.", dir.display()))
}

/// Loads a project from an `.sb3` archive, a `project.json` file, or a
/// directory holding an extracted project.
pub fn load_project(input: &Path) -> Result<Project> {
    let (source, origin) = if input.is_dir() {
        let json_path = locate_project_json(input)?;
        let source = fs::read_to_string(&json_path)
            .with_context(|| format!("Failed to read '{}'.", json_path.display()))?;
        (source, json_path)
    } else if is_json_file(input) {
        let source = fs::read_to_string(input)
            .with_context(|| format!("Failed to read '{}'.", input.display()))?;
        (source, input.to_path_buf())
    } else {
        (read_project_json_from_sb3(input)?, input.to_path_buf())
    };
    Project::from_json_str(&source)
        .with_context(|| format!("Failed to load project from '{}'.", origin.display()))
}

pub fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn open_sb3(input: &Path) -> Result<ZipArchive<fs::File>> {
    let file =
        fs::File::open(input).with_context(|| format!("Failed to open '{}'.", input.display()))?;
    ZipArchive::new(file)
        .with_context(|| format!("'{}' is not a valid zip/.sb3 file.", input.display()))
}
