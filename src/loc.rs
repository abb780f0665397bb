use std::sync::Arc;

/// Where a [`Loc`] points into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    File(Arc<std::path::PathBuf>),
    Unknown,
}

impl Source {
    pub fn from_file<P: AsRef<std::path::Path>>(filepath: P) -> Source {
        Source::File(Arc::new(filepath.as_ref().to_owned()))
    }
}

/// A [`LineCol`] is a container for a line and column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineCol(usize, usize);

impl LineCol {
    /// Builds a [`LineCol`] from a 1-based line and column.
    /// A zero in either position is treated as 1.
    pub fn new(line: usize, col: usize) -> LineCol {
        LineCol(line.saturating_sub(1), col.saturating_sub(1))
    }

    /// The line number. Starts with line 1.
    pub fn line(&self) -> usize {
        self.0 + 1
    }

    /// The column. Starts with column 1.
    pub fn col(&self) -> usize {
        self.1 + 1
    }
}

impl std::fmt::Display for LineCol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}:{}", self.line(), self.col())
    }
}

/// A [`Loc`] tracks the source position of a test or test step.
/// Diagnostics carry one so they can be rendered against the original source text.
#[derive(Clone, PartialEq, Eq)]
pub struct Loc {
    source: Source,
    start: Option<LineCol>,
}

impl std::fmt::Debug for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match (&self.source, &self.start) {
            (Source::File(path), Some(start)) => write!(f, "[{start}:{:?}]", path),
            (Source::File(path), None) => write!(f, "[{:?}]", path),
            (Source::Unknown, Some(start)) => write!(f, "[{start}]"),
            (Source::Unknown, None) => write!(f, "[?]"),
        }
    }
}

impl Loc {
    /// When the location of something is unknown, you can use this.
    pub fn unknown() -> Loc {
        Loc {
            source: Source::Unknown,
            start: None,
        }
    }

    pub fn new(source: Source, line: usize, col: usize) -> Loc {
        Loc {
            source,
            start: Some(LineCol::new(line, col)),
        }
    }

    pub fn in_source(source: Source) -> Loc {
        Loc {
            source,
            start: None,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// The start of the span, if known.
    pub fn start(&self) -> Option<&LineCol> {
        self.start.as_ref()
    }
}

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match (&self.source, &self.start) {
            (Source::File(path), Some(start)) => write!(f, "{}:{start}", path.display()),
            (Source::File(path), None) => write!(f, "{}", path.display()),
            (Source::Unknown, Some(start)) => write!(f, "{start}"),
            (Source::Unknown, None) => write!(f, "<unknown>"),
        }
    }
}

pub trait HasLoc {
    fn loc(&self) -> Loc;
}
