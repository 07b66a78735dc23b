//! Per-parse configuration.

use crate::ast::NodeSet;
use crate::token::TokenSet;
use crate::trace::{NullSink, TraceSink};

/// Consecutive rule invocations allowed at one input position before the
/// parse is abandoned with `InfiniteLoopDetected`.
pub const DEFAULT_LOOP_LIMIT: usize = 64;

/// Options for one parse.
///
/// ```
/// use dslkit::{ParseConfig, TraceBuffer};
///
/// let trace = TraceBuffer::new();
/// let config = ParseConfig::default()
///     .with_trace(trace.clone())
///     .with_loop_limit(16);
/// assert_eq!(config.loop_limit, 16);
/// ```
pub struct ParseConfig {
    pub(crate) trace: Box<dyn TraceSink>,
    pub loop_limit: usize,
    pub token_set: Option<TokenSet>,
    pub node_set: Option<NodeSet>,
}

impl ParseConfig {
    /// Sends scanner and parser traces to `sink`.
    pub fn with_trace(mut self, sink: impl TraceSink + 'static) -> Self {
        self.trace = Box::new(sink);
        self
    }

    pub fn with_loop_limit(mut self, limit: usize) -> Self {
        self.loop_limit = limit;
        self
    }

    /// Rejects token kinds missing from `tokens`.
    pub fn with_token_set(mut self, tokens: TokenSet) -> Self {
        self.token_set = Some(tokens);
        self
    }

    /// Rejects node kinds missing from `nodes`.
    pub fn with_node_set(mut self, nodes: NodeSet) -> Self {
        self.node_set = Some(nodes);
        self
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            trace: Box::new(NullSink),
            loop_limit: DEFAULT_LOOP_LIMIT,
            token_set: None,
            node_set: None,
        }
    }
}
