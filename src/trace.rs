//! Grammar tracing.
//!
//! The scanner and parser narrate what they try and what they match so that
//! grammar authors can see why a rule took the branch it did. Narration goes
//! through a [`Tracer`], which handles indentation and line assembly, into a
//! [`TraceSink`]. With the default [`NullSink`] tracing is switched off and
//! callers skip formatting entirely.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

// ============================================================================
// SINKS
// ============================================================================

/// Destination for finished trace lines.
pub trait TraceSink {
    fn write_line(&mut self, line: &str);

    /// Whether anything is listening. Tracing is skipped when this is false.
    fn enabled(&self) -> bool {
        true
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn write_line(&mut self, _line: &str) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// TraceBuffer: collects trace lines into a shared string for tests and
/// programmatic inspection.
#[derive(Debug, Clone, Default)]
pub struct TraceBuffer {
    buffer: Rc<RefCell<String>>,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, one trace line per text line.
    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl TraceSink for TraceBuffer {
    fn write_line(&mut self, line: &str) {
        let mut buffer = self.buffer.borrow_mut();
        buffer.push_str(line);
        buffer.push('\n');
    }
}

/// Writes trace lines to any `io::Write`, such as a log file.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> TraceSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.writer, "{line}") {
            tracing::warn!(error = %e, "dropping trace line");
        }
    }
}

/// Forwards trace lines to the `tracing` ecosystem at `TRACE` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn write_line(&mut self, line: &str) {
        tracing::trace!(target: "dslkit::trace", "{line}");
    }

    fn enabled(&self) -> bool {
        tracing::enabled!(target: "dslkit::trace", tracing::Level::TRACE)
    }
}

// ============================================================================
// TRACER
// ============================================================================

/// How a trace message relates to the lines around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    /// Append to the line being assembled.
    None,
    /// Finish the current line and start a new one with this message.
    Newline,
    /// Finish the current line, indent one level deeper, start a new line.
    Increment,
    /// Finish the current line, print this message at the current depth,
    /// then outdent one level.
    Decrement,
    /// Print this message flush left.
    StartLine,
    /// Print this message flagged as an error.
    Error,
}

const ERROR_PREFIX: &str = "***";

/// Assembles trace fragments into indented lines.
pub struct Tracer {
    sink: Box<dyn TraceSink>,
    depth: usize,
    pending: String,
}

impl Tracer {
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        Self {
            sink,
            depth: 0,
            pending: String::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.sink.enabled()
    }

    pub fn log(&mut self, msg: &str, indent: Indent) {
        if !self.enabled() {
            return;
        }
        match indent {
            Indent::None => {}
            Indent::Newline => self.flush(),
            Indent::Increment => {
                self.flush();
                self.depth += 1;
            }
            Indent::Decrement => {
                self.flush();
                let line = format!("{}{}", self.prefix(), msg);
                self.sink.write_line(&line);
                self.depth = self.depth.saturating_sub(1);
                return;
            }
            Indent::StartLine => {
                self.flush();
                self.sink.write_line(msg);
                return;
            }
            Indent::Error => {
                self.flush();
                self.sink.write_line(&format!("{ERROR_PREFIX}{msg}"));
                return;
            }
        }
        self.pending.push_str(msg);
    }

    /// Writes out any partially assembled line.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let line = format!("{}{}", self.prefix(), self.pending);
        self.pending.clear();
        self.sink.write_line(&line);
    }

    fn prefix(&self) -> String {
        "\t".repeat(self.depth)
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Handle to a tracer shared by the scanner and the parser of one parse.
#[derive(Clone, Default)]
pub struct SharedTracer(Rc<RefCell<Tracer>>);

impl SharedTracer {
    pub fn new(sink: Box<dyn TraceSink>) -> Self {
        SharedTracer(Rc::new(RefCell::new(Tracer::new(sink))))
    }

    pub fn enabled(&self) -> bool {
        self.0.borrow().enabled()
    }

    pub fn log(&self, msg: &str, indent: Indent) {
        self.0.borrow_mut().log(msg, indent);
    }

    pub fn flush(&self) {
        self.0.borrow_mut().flush();
    }
}
