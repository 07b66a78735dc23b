//! Buffered read-with-memory streams.
//!
//! Both the scanner (over characters) and the parser (over scanned tokens)
//! read through a [`PushbackStream`]. Every item ever read is kept in an
//! append-only buffer so that any number of `unread` calls, bounded by how
//! much has been read, can be replayed without asking the source again.

/// Something that produces items one at a time for a [`PushbackStream`].
pub trait Source {
    type Item: Clone;

    /// Produces the next item, or `None` once the source is exhausted.
    fn pull(&mut self) -> Option<Self::Item>;

    /// The item handed out for every read past the end of the source.
    fn sentinel(&self) -> Self::Item;
}

/// A stream that remembers what it has read and can step backwards over it.
#[derive(Debug)]
pub struct PushbackStream<S: Source> {
    source: S,
    buffer: Vec<S::Item>,
    unread: usize,
}

impl<S: Source> PushbackStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            unread: 0,
        }
    }

    /// Returns the oldest pushed-back item if there is one, otherwise pulls
    /// a fresh item from the source.
    ///
    /// An exhausted source yields its sentinel. The sentinel is recorded like
    /// any other item so that a following `unread` restores it.
    pub fn read(&mut self) -> S::Item {
        if self.unread > 0 {
            let item = self.buffer[self.buffer.len() - self.unread].clone();
            self.unread -= 1;
            return item;
        }
        let item = match self.source.pull() {
            Some(item) => item,
            None => self.source.sentinel(),
        };
        self.buffer.push(item.clone());
        item
    }

    /// Steps back over the most recently read item. Unreading more items
    /// than have been read is a no-op.
    pub fn unread(&mut self) {
        if self.unread < self.buffer.len() {
            self.unread += 1;
        }
    }

    /// Steps back over the `count` most recently read items.
    pub fn unread_many(&mut self, count: usize) {
        for _ in 0..count {
            self.unread();
        }
    }

    /// Number of items read and not pushed back.
    pub fn consumed(&self) -> usize {
        self.buffer.len() - self.unread
    }

    /// Number of pushed-back items waiting to be replayed.
    pub fn pending(&self) -> usize {
        self.unread
    }

    /// The item the next `read` replays, without touching the source.
    pub fn upcoming(&self) -> Option<&S::Item> {
        if self.unread == 0 {
            return None;
        }
        self.buffer.get(self.buffer.len() - self.unread)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
