use crate::compiler::{
    lookup, missing_mutation, resolve_params, walk_chain, PROCEDURES_DEFINITION,
};
use crate::emitter::TextEmitter;
use crate::error::CompileError;
use crate::literal::{format_number, json_literal, quote_str};
use crate::project::{Block, Project, Target};
use log::debug;

pub const HEADER_COMMENT: &str = "// Generate by scratch-script";
pub const DEFAULT_EXTENSION: &str = "scs";

/// Compiled document for one target. Each target carries its own result so a
/// broken sprite never hides the others.
#[derive(Debug)]
pub struct TargetOutput {
    pub name: String,
    pub result: Result<String, CompileError>,
}

impl TargetOutput {
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.name, extension)
    }
}

pub fn compile_project(project: &Project) -> Vec<TargetOutput> {
    project
        .targets
        .iter()
        .map(|target| TargetOutput {
            name: target.name.clone(),
            result: compile_target(project, target),
        })
        .collect()
}

pub fn compile_target(project: &Project, target: &Target) -> Result<String, CompileError> {
    debug!(
        "compiling target '{}' ({} blocks)",
        target.name,
        target.blocks.len()
    );
    let mut out = TextEmitter::new();
    out.write_line(HEADER_COMMENT, true);
    out.write_line(
        &format!("#meta({}, {});", target.is_stage, quote_str(&target.name)),
        true,
    );

    for variable in target.variables.values() {
        out.write_line(
            &format!(
                "#init_var({}, {});",
                quote_str(&variable.name),
                json_literal(&variable.value)
            ),
            true,
        );
    }
    for list in target.lists.values() {
        out.write_line(
            &format!(
                "#init_list({}, {});",
                quote_str(&list.name),
                json_literal(&list.value)
            ),
            true,
        );
    }

    for root in target.top_level_blocks() {
        compile_script(project, target, root, &mut out)?;
    }
    Ok(out.into_text())
}

fn compile_script(
    project: &Project,
    target: &Target,
    root: &Block,
    out: &mut TextEmitter,
) -> Result<(), CompileError> {
    debug!("  script '{}' ({}) at {}, {}", root.id, root.opcode, root.x, root.y);
    out.write_line(
        &format!("@({}, {})", format_number(&root.x), format_number(&root.y)),
        true,
    );
    out.write_line(&script_header(project, target, root)?, true);
    out.add_indent(1);
    if let Some(next) = root.next.as_deref() {
        walk_chain(project, target, Some(root), next, out)?;
    }
    out.add_indent(-1);
    out.write_line("});", true);
    Ok(())
}

/// Opening line of a script, ending in the body's `{`.
fn script_header(project: &Project, target: &Target, root: &Block) -> Result<String, CompileError> {
    if root.opcode == PROCEDURES_DEFINITION {
        let prototype_id = root.input_block_id("custom_block").ok_or_else(|| {
            missing_mutation(target, root, "procedures_definition has no custom_block input")
        })?;
        let prototype = lookup(target, Some(root), prototype_id)?;
        let proccode = prototype.proccode().ok_or_else(|| {
            missing_mutation(target, root, "custom_block prototype carries no proccode")
        })?;
        return Ok(format!("{}({}, {{", root.opcode, quote_str(proccode)));
    }

    let params = resolve_params(project, target, root)?;
    if params.is_empty() {
        Ok(format!("{}({{", root.opcode))
    } else {
        Ok(format!("{}({}, {{", root.opcode, params))
    }
}
