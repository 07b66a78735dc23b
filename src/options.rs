//! Matching options shared by the scanner and the parser, and the status
//! every matching call reports back.

/// Modifiers for a single `expect` call.
///
/// - `optional`: zero matches is not an error.
/// - `multiple`: keep matching until the first miss.
/// - `invert`: match anything that is *not* one of the branches.
/// - `skip`: consume the match without keeping it (no literal rune, no
///   pending token).
/// - `peek`: hold the match aside; it is only kept if a later non-peek match
///   succeeds, and pushed back otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub optional: bool,
    pub multiple: bool,
    pub invert: bool,
    pub skip: bool,
    pub peek: bool,
}

/// What a matching call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// This many items were matched.
    Matched(usize),
    /// Nothing matched and the call was optional.
    Empty,
    /// Nothing matched and an error was recorded.
    Failed,
    /// The call did nothing because an error is pending or the parse was
    /// aborted.
    Suppressed,
}

impl Outcome {
    pub fn matched(&self) -> bool {
        matches!(self, Outcome::Matched(_))
    }

    pub fn count(&self) -> usize {
        match self {
            Outcome::Matched(n) => *n,
            _ => 0,
        }
    }
}

/// Builder methods shared by every `expect` description.
macro_rules! option_builders {
    ($ty:ident) => {
        impl<'a> $ty<'a> {
            pub fn optional(mut self) -> Self {
                self.options.optional = true;
                self
            }

            pub fn multiple(mut self) -> Self {
                self.options.multiple = true;
                self
            }

            pub fn skip(mut self) -> Self {
                self.options.skip = true;
                self
            }

            pub fn peek(mut self) -> Self {
                self.options.peek = true;
                self
            }

            pub fn with_options(mut self, options: $crate::options::MatchOptions) -> Self {
                self.options = options;
                self
            }
        }
    };
}

pub(crate) use option_builders;
