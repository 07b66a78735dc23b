//! Character input for the scanner.

use crate::diagnostics::DslError;
use crate::stream::Source;
use crate::trace::WriterSink;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Sentinel character returned for every read past the end of input.
pub const EOF_RUNE: char = '\0';

/// A sequential character source.
pub struct CharSource {
    chars: Box<dyn Iterator<Item = char>>,
}

impl CharSource {
    pub fn new(chars: impl Iterator<Item = char> + 'static) -> Self {
        Self {
            chars: Box::new(chars),
        }
    }

    /// Reads characters from `reader` one line at a time.
    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self::new(ReaderChars {
            reader: Box::new(reader),
            line: VecDeque::new(),
            done: false,
        })
    }

    /// Opens `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DslError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DslError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl From<&str> for CharSource {
    fn from(text: &str) -> Self {
        Self::new(text.chars().collect::<Vec<_>>().into_iter())
    }
}

impl From<String> for CharSource {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl Source for CharSource {
    type Item = char;

    fn pull(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn sentinel(&self) -> char {
        EOF_RUNE
    }
}

struct ReaderChars {
    reader: Box<dyn BufRead>,
    line: VecDeque<char>,
    done: bool,
}

impl Iterator for ReaderChars {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        while self.line.is_empty() && !self.done {
            let mut text = String::new();
            match self.reader.read_line(&mut text) {
                Ok(0) => self.done = true,
                Ok(_) => self.line.extend(text.chars()),
                Err(e) => {
                    // An unreadable source ends the input like EOF does.
                    tracing::warn!(error = %e, "treating read failure as end of input");
                    self.done = true;
                }
            }
        }
        self.line.pop_front()
    }
}

/// Creates (or truncates) a trace log file at `path`.
pub fn trace_to_file(path: impl AsRef<Path>) -> Result<WriterSink<File>, DslError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| DslError::CouldNotCreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WriterSink::new(file))
}
