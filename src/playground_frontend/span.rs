use std::fmt;

/// Tracks position in source code for error messages.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct CodePosition {
    pub line_no: usize,
    pub column_no: usize,
}

impl CodePosition {
    pub fn new(line_no: usize, column_no: usize) -> Self {
        CodePosition { line_no, column_no }
    }

    pub fn start() -> Self {
        CodePosition::new(1, 1)
    }
}

impl Default for CodePosition {
    fn default() -> Self {
        CodePosition::start()
    }
}

impl fmt::Display for CodePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line_no, self.column_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::more_asserts::*;

    #[test]
    fn test_position_ordering() {
        assert_lt!(CodePosition::new(1, 9), CodePosition::new(2, 1));
        assert_gt!(CodePosition::new(3, 4), CodePosition::new(3, 2));
        assert_eq!(CodePosition::default().to_string(), "1:1");
    }
}
