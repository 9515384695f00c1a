const INDENT_WIDTH: usize = 4;

/// Indentation-aware text buffer. Emitters compose by value: a nested
/// emitter's text is spliced into its parent as a plain string.
#[derive(Debug, Clone, Default)]
pub struct TextEmitter {
    buffer: String,
    indent: usize,
}

impl TextEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, text: &str, indent: bool) {
        if indent {
            self.push_indent();
        }
        self.buffer.push_str(text);
    }

    pub fn write_line(&mut self, text: &str, indent: bool) {
        self.write(text, indent);
        self.buffer.push('\n');
    }

    /// Saturates at zero.
    pub fn add_indent(&mut self, delta: isize) {
        self.indent = self.indent.saturating_add_signed(delta);
    }

    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn into_text(self) -> String {
        self.buffer
    }

    fn push_indent(&mut self) {
        for _ in 0..self.indent * INDENT_WIDTH {
            self.buffer.push(' ');
        }
    }
}
