use std::{collections::VecDeque, fmt, string::String};

use crate::{arena::NodeId, AvlSet};

impl<T: fmt::Display> AvlSet<T> {
    /// Renders the tree shape as a Graphviz `digraph` named `name`.
    ///
    /// Nodes are labelled `value:height/size`; missing children are drawn as points so the
    /// left/right placement of every child is visible.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root() {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item {
            Node(NodeId),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let value = self.value(node);
                let (height, size) = (self.nodes[node].height, self.nodes[node].size);
                write!(w, "\"graph{name}-{value}\" [label=\"{value}:{height}/{size}\"]; ")?;

                for child in [self.nodes[node].left(), self.nodes[node].right()] {
                    match child {
                        Some(child) => {
                            let child_value = self.value(child);

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{value}\" -> \"graph{name}-{child_value}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{value}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
