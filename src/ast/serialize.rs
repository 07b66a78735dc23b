//! JSON shape of a tree.
//!
//! Each node serializes as `{"type", "tokens", "children"}` with `null` in
//! place of an empty list; the tree itself as `{"root": <node>}`.

use super::{Ast, NodeRef};
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};

struct Children<'a>(NodeRef<'a>);

impl Serialize for Children<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.child_count()))?;
        for child in self.0.children() {
            seq.serialize_element(&child)?;
        }
        seq.end()
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut node = serializer.serialize_struct("Node", 3)?;
        node.serialize_field("type", self.kind())?;
        if self.tokens().is_empty() {
            node.serialize_field("tokens", &None::<()>)?;
        } else {
            node.serialize_field("tokens", self.tokens())?;
        }
        if self.child_count() == 0 {
            node.serialize_field("children", &None::<()>)?;
        } else {
            node.serialize_field("children", &Children(*self))?;
        }
        node.end()
    }
}

impl Serialize for Ast {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut ast = serializer.serialize_struct("Ast", 1)?;
        ast.serialize_field("root", &self.root())?;
        ast.end()
    }
}

impl Ast {
    /// The tree as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
