//! Block graph lowering: argument lists, call forms and statement chains.

use crate::emitter::TextEmitter;
use crate::error::CompileError;
use crate::literal::{quote_literal, quote_str};
use crate::project::{Block, Input, Project, Target};

pub const PROCEDURES_CALL: &str = "procedures_call";
pub const PROCEDURES_DEFINITION: &str = "procedures_definition";
pub const EMPTY_INPUT: &str = "{}";

/// Comma-joined argument list for `block`: fields first, then inputs, each in
/// document order.
pub fn resolve_params(
    project: &Project,
    target: &Target,
    block: &Block,
) -> Result<String, CompileError> {
    let mut args = Vec::with_capacity(block.fields.len() + block.inputs.len());
    for field in block.fields.values() {
        args.push(quote_literal(&field.value));
    }
    for input in block.inputs.values() {
        args.push(resolve_input(project, target, block, input)?);
    }
    Ok(args.join(", "))
}

fn resolve_input(
    project: &Project,
    target: &Target,
    owner: &Block,
    input: &Input,
) -> Result<String, CompileError> {
    match input {
        Input::Empty => Ok(EMPTY_INPUT.to_string()),
        Input::Literal(value) => Ok(quote_literal(value)),
        Input::Reference { name, id } => Ok(resolve_reference(project, target, name, id)),
        Input::Block(id) => {
            let nested = lookup(target, Some(owner), id)?;
            if nested.next.is_none() {
                compile_block(project, target, nested)
            } else {
                compile_substack(project, target, owner, id)
            }
        }
    }
}

/// A monitor watching `id` wins over the target's own tables.
fn resolve_reference(project: &Project, target: &Target, name: &str, id: &str) -> String {
    if let Some(monitor) = project.monitor(id) {
        return format!("{}({})", monitor.opcode, quote_literal(&monitor.param()));
    }
    if target.variables.contains_key(id) {
        format!("data_variable{}", name)
    } else {
        format!("data_listcontents{}", name)
    }
}

/// Renders the chain starting at `start` as a braced body, one level deeper
/// than the braces. The result is spliced into the owner's argument list and
/// re-indented line by line by whoever writes the owning statement.
fn compile_substack(
    project: &Project,
    target: &Target,
    owner: &Block,
    start: &str,
) -> Result<String, CompileError> {
    let mut out = TextEmitter::new();
    out.write_line("{", true);
    out.add_indent(1);
    walk_chain(project, target, Some(owner), start, &mut out)?;
    out.add_indent(-1);
    out.write("}", true);
    Ok(out.into_text())
}

/// Call form `opcode(args)` of a single block.
pub fn compile_block(
    project: &Project,
    target: &Target,
    block: &Block,
) -> Result<String, CompileError> {
    let params = resolve_params(project, target, block)?;
    if block.opcode == PROCEDURES_CALL {
        let proccode = block.proccode().ok_or_else(|| {
            missing_mutation(target, block, "procedures_call carries no proccode")
        })?;
        let signature = quote_str(proccode);
        if params.is_empty() {
            return Ok(format!("{}({})", block.opcode, signature));
        }
        return Ok(format!("{}({}, {})", block.opcode, signature, params));
    }
    Ok(format!("{}({})", block.opcode, params))
}

/// Writes one `;`-terminated statement per block from `start` until a block
/// with no `next`. Every produced line goes through `out` at its current
/// indent, so multi-line statements stay aligned with the chain.
pub fn compile_chain(
    project: &Project,
    target: &Target,
    start: &str,
    out: &mut TextEmitter,
) -> Result<(), CompileError> {
    walk_chain(project, target, None, start, out)
}

pub(crate) fn walk_chain<'a>(
    project: &Project,
    target: &'a Target,
    mut referrer: Option<&'a Block>,
    start: &str,
    out: &mut TextEmitter,
) -> Result<(), CompileError> {
    let mut current = Some(start);
    while let Some(id) = current {
        let block = lookup(target, referrer, id)?;
        let statement = format!("{};", compile_block(project, target, block)?);
        for line in statement.split('\n') {
            out.write_line(line, true);
        }
        referrer = Some(block);
        current = block.next.as_deref();
    }
    Ok(())
}

/// Resolves `id` in the target's arena. `referrer` names the block holding
/// the reference so the error points at it.
pub(crate) fn lookup<'a>(
    target: &'a Target,
    referrer: Option<&Block>,
    id: &str,
) -> Result<&'a Block, CompileError> {
    target.block(id).ok_or_else(|| {
        let (block, opcode) = match referrer {
            Some(b) => (b.id.clone(), b.opcode.clone()),
            None => (id.to_string(), "chain start".to_string()),
        };
        CompileError::MalformedReference {
            target: target.name.clone(),
            block,
            opcode,
            missing: id.to_string(),
        }
    })
}

pub(crate) fn missing_mutation(
    target: &Target,
    block: &Block,
    detail: &'static str,
) -> CompileError {
    CompileError::MissingMutationData {
        target: target.name.clone(),
        block: block.id.clone(),
        opcode: block.opcode.clone(),
        detail,
    }
}
