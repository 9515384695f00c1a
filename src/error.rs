use thiserror::Error;

/// Raised while turning a parsed `project.json` into the typed model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("Invalid project.json: {0}")]
    Json(String),
    #[error("Invalid project.json: {0}")]
    Malformed(String),
}

/// Raised while compiling one target. Every variant names the target and the
/// block at fault so the offending script can be found in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("target '{target}': block '{block}' ({opcode}) references missing block '{missing}'")]
    MalformedReference {
        target: String,
        block: String,
        opcode: String,
        missing: String,
    },
    #[error("target '{target}': block '{block}' ({opcode}) has no usable procedure mutation: {detail}")]
    MissingMutationData {
        target: String,
        block: String,
        opcode: String,
        detail: &'static str,
    },
}

impl CompileError {
    pub fn target(&self) -> &str {
        match self {
            CompileError::MalformedReference { target, .. }
            | CompileError::MissingMutationData { target, .. } => target,
        }
    }

    pub fn block(&self) -> &str {
        match self {
            CompileError::MalformedReference { block, .. }
            | CompileError::MissingMutationData { block, .. } => block,
        }
    }
}
