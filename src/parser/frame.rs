//! Open contexts and open sources.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::command::{BlockStrategy, Contexts};
use crate::conf::{ContextNode, Record};
use crate::error::Location;
use crate::module::ModuleType;
use crate::tokenizer::Tokenizer;

/// How statements inside a frame are dispatched.
pub(crate) enum Dispatch {
    /// Command-table lookup.
    Commands,
    /// Handed to the strategy of the block directive; `owner` is the
    /// registry index of the module that declared it.
    Strategy {
        strategy: Arc<dyn BlockStrategy>,
        owner: usize,
    },
}

/// One open block on the context stack.
pub(crate) struct Frame {
    pub context: Contexts,
    pub module_type: ModuleType,
    pub dispatch: Dispatch,
    pub node: ContextNode,
    /// `ONCE` directives already consumed here.
    pub seen: HashSet<&'static str>,
}

impl Frame {
    pub fn root(records: Vec<Record>) -> Self {
        Self {
            context: Contexts::MAIN,
            module_type: ModuleType::CORE,
            dispatch: Dispatch::Commands,
            node: ContextNode::new(Contexts::MAIN, Vec::new(), None, records),
            seen: HashSet::new(),
        }
    }

    pub fn block(
        context: Contexts,
        module_type: ModuleType,
        label: Vec<String>,
        location: Location,
        records: Vec<Record>,
    ) -> Self {
        Self {
            context,
            module_type,
            dispatch: Dispatch::Commands,
            node: ContextNode::new(context, label, Some(location), records),
            seen: HashSet::new(),
        }
    }

    pub fn strategy(
        context: Contexts,
        module_type: ModuleType,
        label: Vec<String>,
        location: Location,
        strategy: Arc<dyn BlockStrategy>,
        owner: usize,
    ) -> Self {
        Self {
            dispatch: Dispatch::Strategy { strategy, owner },
            ..Self::block(context, module_type, label, location, Vec::new())
        }
    }

    pub fn is_strategy(&self) -> bool {
        matches!(self.dispatch, Dispatch::Strategy { .. })
    }
}

/// One file (or in-memory buffer) being tokenized.
pub(crate) struct Source {
    pub tokenizer: Tokenizer,
    /// Directory relative includes resolve against.
    pub dir: Option<PathBuf>,
    /// Number of open frames (beyond the root) when this source started.
    pub base_depth: usize,
    /// Include nesting level; 0 for the top-level source.
    pub include_depth: usize,
}
