use std::collections::{BTreeMap, HashSet};

use crate::manager::PddManager;
use crate::pdd::Pdd;
use crate::reference::NodeId;

impl PddManager {
    /// Renders the DAG reachable from `roots` in Graphviz format. Value
    /// nodes become squares labelled with their rational, decision nodes
    /// circles grouped per level; solid edges are `hi`, dashed edges `lo`.
    pub fn to_dot(&self, roots: &[Pdd<'_>]) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut visited = HashSet::new();
        let mut todo: Vec<NodeId> = Vec::new();
        for r in roots {
            self.check_manager(r);
            todo.push(r.id());
        }
        while let Some(p) = todo.pop() {
            if !visited.insert(p) {
                continue;
            }
            if !self.is_val(p) {
                todo.push(self.lo(p));
                todo.push(self.hi(p));
            }
        }

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape=circle, fixedsize=true];")?;

        // Value terminals
        writeln!(dot, "{{ rank=sink")?;
        for &id in visited.iter() {
            if self.is_val(id) {
                writeln!(dot, "{} [shape=square, label=\"{}\"];", id.raw(), self.val(id))?;
            }
        }
        writeln!(dot, "}}")?;

        // Decision nodes per level
        let mut levels = BTreeMap::<u32, Vec<NodeId>>::new();
        for &id in visited.iter() {
            if !self.is_val(id) {
                levels.entry(self.level(id)).or_default().push(id);
            }
        }
        for nodes in levels.values() {
            writeln!(dot, "{{ rank=same")?;
            for &id in nodes {
                let label = format!("<x<SUB>{}</SUB>>", self.var(id));
                writeln!(dot, "{} [label={}];", id.raw(), label)?;
            }
            writeln!(dot, "}}")?;
        }

        // Edges
        for &id in visited.iter() {
            if self.is_val(id) {
                continue;
            }
            writeln!(dot, "{} -> {};", id.raw(), self.hi(id).raw())?;
            writeln!(dot, "{} -> {} [style=dashed];", id.raw(), self.lo(id).raw())?;
        }

        // Roots
        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape=rect, label=\"{}\"];", i, root.id())?;
        }
        writeln!(dot, "}}")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} -> {};", i, root.id().raw())?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}
