/// A small indentation-tracking line buffer, the text-emission equivalent of
/// `hebi_emit`'s bytecode builder: callers push one logical line at a time
/// and never touch indentation math directly.
pub struct AsmWriter {
  lines: Vec<String>,
  indent: usize,
}

impl AsmWriter {
  pub fn new() -> Self {
    Self {
      lines: Vec::new(),
      indent: 0,
    }
  }

  pub fn line(&mut self, text: impl AsRef<str>) {
    let pad = "    ".repeat(self.indent);
    self.lines.push(format!("{pad}{}", text.as_ref()));
  }

  pub fn blank(&mut self) {
    self.lines.push(String::new());
  }

  pub fn indent(&mut self) {
    self.indent += 1;
  }

  pub fn dedent(&mut self) {
    self.indent = self.indent.saturating_sub(1);
  }

  pub fn finish(self) -> String {
    self.lines.join("\n")
  }
}

impl Default for AsmWriter {
  fn default() -> Self {
    Self::new()
  }
}
