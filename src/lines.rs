use log::trace;

/// Source lines still waiting to be dispatched.
///
/// A cursor walks over the loaded lines. Lines handed back with [`LineQueue::push_front`]
/// are placed just before the cursor, so a look-ahead can be undone without shifting
/// the rest of the program.
#[derive(Debug, Clone, Default)]
pub struct LineQueue {
    lines: Vec<String>,
    cursor: usize,
}

impl LineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source(source: &str) -> Self {
        source.lines().collect()
    }

    pub fn peek(&self) -> Option<&str> {
        self.lines.get(self.cursor).map(String::as_str)
    }

    pub fn pop_front(&mut self) -> Option<String> {
        let line = self.lines.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(line)
    }

    pub fn push_front(&mut self, line: String) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.lines[self.cursor] = line;
        } else {
            self.lines.insert(0, line);
        }
    }

    pub fn push_back(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<S> for LineQueue {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
            cursor: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    #[error("Expected 'done' to close block but reached end of input")]
    Unterminated,
}

/// Whether a trimmed line opens a nested `if`/`while` block.
pub fn opens_block(line: &str) -> bool {
    (line.starts_with("if ") || line.starts_with("while ")) && line.ends_with(':')
}

/// Pops the body of a block from the queue.
///
/// The body is returned flat: nested headers and their `done` lines are kept verbatim.
/// The closing `done` is consumed but not returned. An `else` at the outer level is handed
/// back to the queue and ends the body.
pub fn read_block(queue: &mut LineQueue) -> Result<Vec<String>, BlockError> {
    let mut block = Vec::new();
    let mut depth = 0usize;

    while let Some(line) = queue.pop_front() {
        let line = line.trim();

        if opens_block(line) {
            depth += 1;
            block.push(line.to_string());
            continue;
        }

        if line == "done" {
            if depth == 0 {
                trace!("read block of {} lines", block.len());
                return Ok(block);
            }
            depth -= 1;
            block.push(line.to_string());
            continue;
        }

        if depth == 0 && (line == "else:" || line == "else") {
            queue.push_front(line.to_string());
            trace!("read block of {} lines, stopped at else", block.len());
            return Ok(block);
        }

        block.push(line.to_string());
    }

    Err(BlockError::Unterminated)
}

#[cfg(test)]
mod test {
    use super::*;

    fn queue(source: &[&str]) -> LineQueue {
        source.iter().copied().collect()
    }

    #[test]
    fn test_queue_push_front_after_pop() {
        let mut lines = queue(&["a", "b"]);
        assert_eq!(lines.pop_front().as_deref(), Some("a"));
        lines.push_front("x".to_string());
        assert_eq!(lines.peek(), Some("x"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.pop_front().as_deref(), Some("x"));
        assert_eq!(lines.pop_front().as_deref(), Some("b"));
        assert!(lines.pop_front().is_none());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_queue_push_front_on_fresh_queue() {
        let mut lines = LineQueue::new();
        lines.push_front("b".to_string());
        lines.push_front("a".to_string());
        lines.push_back("c".to_string());
        assert_eq!(lines.pop_front().as_deref(), Some("a"));
        assert_eq!(lines.pop_front().as_deref(), Some("b"));
        assert_eq!(lines.pop_front().as_deref(), Some("c"));
    }

    #[test]
    fn test_simple_block() {
        let mut lines = queue(&["  out 1", "out 2", "done", "out 3"]);
        assert_eq!(read_block(&mut lines).unwrap(), vec!["out 1", "out 2"]);
        assert_eq!(lines.peek(), Some("out 3"));
    }

    #[test]
    fn test_nested_block_is_flat() {
        let mut lines = queue(&["if a:", "out 1", "done", "out 2", "done"]);
        assert_eq!(
            read_block(&mut lines).unwrap(),
            vec!["if a:", "out 1", "done", "out 2"]
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn test_else_is_pushed_back() {
        let mut lines = queue(&["out 1", "  else:", "out 2", "done"]);
        assert_eq!(read_block(&mut lines).unwrap(), vec!["out 1"]);
        assert_eq!(lines.peek(), Some("else:"));
    }

    #[test]
    fn test_nested_else_is_kept() {
        let mut lines = queue(&["while a:", "else:", "done", "done"]);
        assert_eq!(
            read_block(&mut lines).unwrap(),
            vec!["while a:", "else:", "done"]
        );
    }

    #[test]
    fn test_unterminated_block() {
        let mut lines = queue(&["out 1", "if a:", "done"]);
        assert_eq!(read_block(&mut lines), Err(BlockError::Unterminated));
    }
}
