//! The finalized configuration tree handed to downstream subsystems.

use serde_json::{json, Value};

use crate::command::Contexts;
use crate::conf::{AnyConf, ModuleConf};
use crate::error::Location;
use crate::module::ModuleId;

/// One module's record inside a context.
#[derive(Debug)]
pub struct Record {
    pub module: ModuleId,
    pub module_name: &'static str,
    pub conf: Box<dyn AnyConf>,
}

/// A configuration scope: the root, or one block in the source.
#[derive(Debug)]
pub struct ContextNode {
    context: Contexts,
    label: Vec<String>,
    location: Option<Location>,
    pub(crate) records: Vec<Record>,
    pub(crate) children: Vec<ContextNode>,
}

impl ContextNode {
    pub(crate) fn new(
        context: Contexts,
        label: Vec<String>,
        location: Option<Location>,
        records: Vec<Record>,
    ) -> Self {
        Self {
            context,
            label,
            location,
            records,
            children: Vec::new(),
        }
    }

    pub fn context(&self) -> Contexts {
        self.context
    }

    /// Directive name and arguments that opened this block; empty for the root.
    pub fn label(&self) -> &[String] {
        &self.label
    }

    /// Where the block was opened.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn children(&self) -> &[ContextNode] {
        &self.children
    }

    /// The record of concrete type `R`, if a module placed one here.
    pub fn conf<R: ModuleConf>(&self) -> Option<&R> {
        self.records.iter().find_map(|r| r.conf.downcast_ref::<R>())
    }

    /// The record of the module registered under `index`.
    pub fn conf_of(&self, index: usize) -> Option<&dyn AnyConf> {
        self.record(index).map(|r| r.conf.as_ref())
    }

    pub(crate) fn record(&self, index: usize) -> Option<&Record> {
        self.records.iter().find(|r| r.module.index == index)
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.module.index == index)
    }

    /// Children whose label starts with `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ContextNode> + 'a {
        self.children
            .iter()
            .filter(move |c| c.label.first().map(String::as_str) == Some(name))
    }

    /// Descend through children matching each label in turn, e.g.
    /// `[&["http"], &["server"], &["location", "/api"]]`.
    pub fn find(&self, path: &[&[&str]]) -> Option<&ContextNode> {
        let Some((head, rest)) = path.split_first() else {
            return Some(self);
        };
        self.children
            .iter()
            .filter(|c| c.label.len() == head.len() && c.label.iter().zip(head.iter()).all(|(a, b)| a == b))
            .find_map(|c| c.find(rest))
    }

    /// Label, records by module name, and children, recursively.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        let records = self
            .records
            .iter()
            .map(|r| Ok((r.module_name.to_string(), r.conf.to_json()?)))
            .collect::<serde_json::Result<serde_json::Map<String, Value>>>()?;
        let children = self
            .children
            .iter()
            .map(ContextNode::to_json)
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(json!({
            "label": self.label,
            "records": records,
            "children": children,
        }))
    }
}

/// Merge every record top-down against the nearest enclosing record of the
/// same module. `inherited` is indexed by module registry index.
pub(crate) fn resolve(node: &mut ContextNode, inherited: &[Option<&dyn AnyConf>]) {
    for record in node.records.iter_mut() {
        let parent = inherited.get(record.module.index).copied().flatten();
        record.conf.merge_from(parent);
    }

    let mut scope: Vec<Option<&dyn AnyConf>> = inherited.to_vec();
    for record in node.records.iter() {
        if let Some(slot) = scope.get_mut(record.module.index) {
            *slot = Some(record.conf.as_ref());
        }
    }

    for child in node.children.iter_mut() {
        resolve(child, &scope);
    }
}

/// Parse result: the root context and everything nested in it, fully merged.
#[derive(Debug)]
pub struct ConfigTree {
    root: ContextNode,
}

impl ConfigTree {
    pub(crate) fn finalize(mut root: ContextNode, modules: usize) -> Self {
        let inherited = vec![None; modules];
        resolve(&mut root, &inherited);
        Self { root }
    }

    pub fn root(&self) -> &ContextNode {
        &self.root
    }

    /// Depth-first walk over every context, root first.
    pub fn walk(&self) -> Vec<&ContextNode> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        self.root.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::Setting;
    use crate::module::ModuleType;
    use serde::Serialize;

    #[derive(Debug, Default, Serialize)]
    struct Timeouts {
        read: Setting<u64>,
        send: Setting<u64>,
    }

    impl ModuleConf for Timeouts {
        fn merge(&mut self, parent: Option<&Self>) {
            self.read.merge(parent.map(|p| &p.read), 60);
            self.send.merge(parent.map(|p| &p.send), 60);
        }
    }

    const BLOCK: Contexts = Contexts::from_bits_retain(1 << 1);

    fn record(read: Option<u64>) -> Record {
        Record {
            module: ModuleId {
                index: 0,
                ctx_index: 0,
                module_type: ModuleType::CORE,
            },
            module_name: "timeouts",
            conf: Box::new(Timeouts {
                read: read.map(Setting::new).unwrap_or_default(),
                send: Setting::unset(),
            }),
        }
    }

    fn node(label: &[&str], read: Option<u64>) -> ContextNode {
        let label = label.iter().map(|s| s.to_string()).collect();
        ContextNode::new(BLOCK, label, None, vec![record(read)])
    }

    #[test]
    fn test_resolve_inherits_through_levels() {
        let mut root = ContextNode::new(Contexts::MAIN, Vec::new(), None, vec![record(Some(5))]);
        let mut middle = node(&["server"], None);
        middle.children.push(node(&["location", "/"], None));
        middle.children.push(node(&["location", "/api"], Some(1)));
        root.children.push(middle);

        let tree = ConfigTree::finalize(root, 1);
        let read = |path: &[&[&str]]| {
            tree.root()
                .find(path)
                .and_then(|n| n.conf::<Timeouts>())
                .and_then(|t| t.read.get().copied())
        };

        assert_eq!(read(&[]), Some(5));
        assert_eq!(read(&[&["server"]]), Some(5));
        assert_eq!(read(&[&["server"], &["location", "/"]]), Some(5));
        assert_eq!(read(&[&["server"], &["location", "/api"]]), Some(1));

        let send = tree
            .root()
            .find(&[&["server"], &["location", "/api"]])
            .and_then(|n| n.conf::<Timeouts>())
            .and_then(|t| t.send.get().copied());
        assert_eq!(send, Some(60));
    }

    #[test]
    fn test_resolve_skips_levels_without_record() {
        let mut root = ContextNode::new(Contexts::MAIN, Vec::new(), None, vec![record(Some(9))]);
        let mut bare = ContextNode::new(BLOCK, vec!["bare".into()], None, Vec::new());
        bare.children.push(node(&["inner"], None));
        root.children.push(bare);

        let tree = ConfigTree::finalize(root, 1);
        let inner = tree.root().find(&[&["bare"], &["inner"]]).and_then(|n| n.conf::<Timeouts>());
        assert_eq!(inner.and_then(|t| t.read.get().copied()), Some(9));
    }

    #[test]
    fn test_walk_order() {
        let mut root = ContextNode::new(Contexts::MAIN, Vec::new(), None, Vec::new());
        let mut a = node(&["a"], None);
        a.children.push(node(&["a1"], None));
        root.children.push(a);
        root.children.push(node(&["b"], None));

        let tree = ConfigTree::finalize(root, 1);
        let labels: Vec<String> = tree
            .walk()
            .iter()
            .map(|n| n.label().join(" "))
            .collect();
        assert_eq!(labels, vec!["", "a", "a1", "b"]);
    }
}
