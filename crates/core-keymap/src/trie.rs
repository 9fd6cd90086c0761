//! Compressed character trie over decoded key sequences.
//!
//! Key sequences are strings of decoded terminal bytes (`"\x1b[A"`, `"dw"`).
//! Nodes branch per code point; edges live in a small inline vector since
//! most nodes have a handful of children.

use crate::Binding;
use smallvec::SmallVec;
use tracing::trace;

/// Outcome of matching the pending key buffer against a trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The buffer is exactly one binding and no longer binding extends it.
    Exact(Binding),
    /// The buffer is a binding and also a strict prefix of longer bindings.
    Ambiguous(Binding),
    /// The buffer is a strict prefix of one or more bindings.
    Prefix,
    NoMatch,
}

#[derive(Debug, Clone)]
struct Edge {
    ch: char,
    next: usize,
}

#[derive(Debug, Clone)]
struct Node {
    terminal: Option<usize>, // index into bindings vec
    edges: SmallVec<[Edge; 4]>,
}

impl Node {
    fn new() -> Self {
        Self {
            terminal: None,
            edges: SmallVec::new(),
        }
    }
}

#[derive(Debug)]
pub struct MappingTrie {
    nodes: Vec<Node>,
    bindings: Vec<Binding>,
}

impl Default for MappingTrie {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

impl MappingTrie {
    pub fn build(entries: Vec<(String, Binding)>) -> Self {
        let mut trie = MappingTrie {
            nodes: vec![Node::new()],
            bindings: Vec::with_capacity(entries.len()),
        };
        for (sequence, binding) in entries {
            let mut cur = 0usize;
            for ch in sequence.chars() {
                let next = if let Some(e) = trie.nodes[cur].edges.iter().find(|e| e.ch == ch) {
                    e.next
                } else {
                    let new_idx = trie.nodes.len();
                    trie.nodes.push(Node::new());
                    trie.nodes[cur].edges.push(Edge { ch, next: new_idx });
                    new_idx
                };
                cur = next;
            }
            if trie.nodes[cur].terminal.is_some() {
                // Later binding overrides earlier.
                trace!(target: "input.map", node = cur, "terminal_override");
            }
            trie.nodes[cur].terminal = Some(trie.bindings.len());
            trie.bindings.push(binding);
        }
        trie
    }

    /// Number of distinct bound sequences.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.terminal.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Match the whole `pending` buffer.
    pub fn resolve(&self, pending: &str) -> Resolution {
        if pending.is_empty() {
            return Resolution::NoMatch;
        }
        let mut node_idx = 0usize;
        for (step, ch) in pending.chars().enumerate() {
            match self.nodes[node_idx].edges.iter().find(|e| e.ch == ch) {
                Some(edge) => {
                    node_idx = edge.next;
                    trace!(target: "input.map", step, node = node_idx, "advance");
                }
                None => return Resolution::NoMatch,
            }
        }
        let node = &self.nodes[node_idx];
        match (node.terminal, node.edges.is_empty()) {
            (Some(bi), true) => Resolution::Exact(self.bindings[bi].clone()),
            (Some(bi), false) => Resolution::Ambiguous(self.bindings[bi].clone()),
            (None, false) => Resolution::Prefix,
            // Only the root can be a non-terminal leaf (empty trie).
            (None, true) => Resolution::NoMatch,
        }
    }
}
