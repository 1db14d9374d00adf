//! Directive parser and context engine.
//!
//! # Data Flow
//! ```text
//! FileReader → Tokenizer → Statement
//!     → `}`          : seal current context, pop to parent
//!     → strategy body: hand statement to the block's BlockStrategy
//!     → otherwise    : look up command (context + module type)
//!                      → check argument count, block/no-block
//!                      → setter on the module's record, post-validator
//!                      → `{` pushes a child context
//! end of input at root depth → merge tree top-down → ConfigTree
//! ```
//!
//! # Design Decisions
//! - Single-threaded and synchronous; the first error aborts the parse
//! - Open contexts are owned by the parse stack, so an error at any depth
//!   drops all of them and no partial tree escapes
//! - Included files are spliced in place; each must balance its own blocks
//! - Relative includes resolve against the including file's directory

mod frame;

use std::path::{Path, PathBuf};

use tracing::Level;

use crate::command::{ArgShape, Args, BlockSpec, Command, Contexts, Handler};
use crate::conf::ConfigTree;
use crate::config::schema::{AmbiguityPolicy, ParserSettings};
use crate::error::{ConfError, ConfResult, ErrorKind, SetError};
use crate::module::{ModuleEntry, ModuleType, Registry};
use crate::observability::{ConfLogger, TracingLogger};
use crate::source::FileReader;
use crate::tokenizer::{Statement, Terminator, Tokenizer};

use frame::{Dispatch, Frame, Source};

static TRACING_LOGGER: TracingLogger = TracingLogger;

/// Parses configuration sources against a finalized registry.
pub struct Parser<'r> {
    registry: &'r Registry,
    reader: &'r dyn FileReader,
    logger: &'r dyn ConfLogger,
    settings: ParserSettings,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry, reader: &'r dyn FileReader) -> Self {
        Self {
            registry,
            reader,
            logger: &TRACING_LOGGER,
            settings: ParserSettings::default(),
        }
    }

    pub fn with_logger(mut self, logger: &'r dyn ConfLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Parse the file at `path` and everything it includes.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> ConfResult<ConfigTree> {
        let path = path.as_ref();
        let bytes = self.reader.read(path).map_err(|e| self.report(e))?;
        self.run(Source {
            tokenizer: Tokenizer::new(path.display().to_string(), bytes),
            dir: path.parent().map(Path::to_path_buf),
            base_depth: 0,
            include_depth: 0,
        })
    }

    /// Parse an in-memory source named `name`.
    pub fn parse_str(&self, name: &str, text: &str) -> ConfResult<ConfigTree> {
        self.run(Source {
            tokenizer: Tokenizer::new(name, text),
            dir: None,
            base_depth: 0,
            include_depth: 0,
        })
    }

    fn run(&self, source: Source) -> ConfResult<ConfigTree> {
        let file = source.tokenizer.file().clone();
        let run = Run {
            parser: self,
            root: Frame::root(self.registry.create_records(Contexts::MAIN, ModuleType::CORE)),
            stack: Vec::new(),
            sources: vec![source],
        };
        let tree = run.execute().map_err(|e| self.report(e))?;
        tracing::debug!(file = %file, contexts = tree.walk().len(), "Configuration parsed");
        Ok(tree)
    }

    fn report(&self, err: ConfError) -> ConfError {
        self.logger.log(Level::ERROR, err.location(), &err.to_string());
        err
    }
}

/// State of one parse.
struct Run<'p, 'r> {
    parser: &'p Parser<'r>,
    root: Frame,
    stack: Vec<Frame>,
    sources: Vec<Source>,
}

impl<'p, 'r> Run<'p, 'r> {
    fn execute(mut self) -> ConfResult<ConfigTree> {
        while let Some(source) = self.sources.last_mut() {
            match source.tokenizer.next_statement()? {
                Some(stmt) => self.statement(&stmt)?,
                None => self.end_source()?,
            }
        }
        Ok(ConfigTree::finalize(self.root.node, self.parser.registry.len()))
    }

    fn current(&mut self) -> &mut Frame {
        match self.stack.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    /// The frame below the current one.
    fn enclosing(&mut self) -> &mut Frame {
        let len = self.stack.len();
        if len >= 2 {
            &mut self.stack[len - 2]
        } else {
            &mut self.root
        }
    }

    fn base_depth(&self) -> usize {
        self.sources.last().map(|s| s.base_depth).unwrap_or(0)
    }

    fn end_source(&mut self) -> ConfResult<()> {
        let Some(source) = self.sources.pop() else {
            return Ok(());
        };
        if self.stack.len() != source.base_depth {
            return Err(ConfError::at(
                ErrorKind::UnexpectedEof,
                source.tokenizer.location(),
            ));
        }
        if source.include_depth > 0 {
            tracing::debug!(file = %source.tokenizer.file(), "Finished included file");
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &Statement) -> ConfResult<()> {
        if stmt.terminator == Terminator::BlockClose {
            return self.close_block(stmt);
        }
        if self.current().is_strategy() {
            return self.strategy_statement(stmt);
        }
        self.dispatch(stmt)
    }

    fn close_block(&mut self, stmt: &Statement) -> ConfResult<()> {
        if self.stack.len() <= self.base_depth() {
            return Err(ConfError::at(ErrorKind::UnbalancedBlock, stmt.location.clone()));
        }
        let Some(frame) = self.stack.pop() else {
            return Err(ConfError::at(ErrorKind::UnbalancedBlock, stmt.location.clone()));
        };

        tracing::debug!(
            block = %frame.node.label().join(" "),
            line = stmt.location.line,
            "Closed block"
        );
        if !frame.is_strategy() {
            self.current().node.children.push(frame.node);
        }
        Ok(())
    }

    fn dispatch(&mut self, stmt: &Statement) -> ConfResult<()> {
        let registry = self.parser.registry;
        let name = stmt.name();
        let location = &stmt.location;

        let (context, module_type) = {
            let frame = self.current();
            (frame.context, frame.module_type)
        };
        let (entry, cmd) = lookup(
            registry,
            self.parser.settings.ambiguity,
            name,
            context,
            module_type,
        )
        .map_err(|e| e.or_at(location))?;

        let nargs = stmt.values().len();
        if !cmd.shape().accepts(nargs) {
            return Err(ConfError::at(
                ErrorKind::ArgumentCountMismatch {
                    name: name.to_string(),
                    expected: cmd.shape().expected(),
                    actual: nargs,
                },
                location.clone(),
            ));
        }

        let opens_block = stmt.terminator == Terminator::BlockOpen;
        let takes_block = cmd.shape().contains(ArgShape::BLOCK);
        if opens_block && !takes_block {
            return Err(ConfError::at(
                ErrorKind::UnexpectedBlock {
                    name: name.to_string(),
                },
                location.clone(),
            ));
        }
        if takes_block && !opens_block {
            return Err(ConfError::at(
                ErrorKind::MissingBlock {
                    name: name.to_string(),
                },
                location.clone(),
            ));
        }

        if cmd.shape().contains(ArgShape::ONCE) && !self.current().seen.insert(cmd.name()) {
            return Err(ConfError::at(
                ErrorKind::DuplicateDirective {
                    name: name.to_string(),
                },
                location.clone(),
            ));
        }

        tracing::debug!(
            directive = name,
            module = entry.name(),
            line = location.line,
            "Dispatching directive"
        );

        match &cmd.handler {
            Handler::Include => return self.include(stmt),
            Handler::Slot(setter) => {
                let args = Args::new(name, stmt.values(), location, cmd.tag());
                let record = self
                    .current()
                    .node
                    .record_mut(entry.id().index)
                    .ok_or_else(|| SetError::RecordMismatch.into_conf(name, location.clone()))?;
                let value = setter
                    .set(&args, record.conf.as_mut())
                    .map_err(|e| e.into_conf(name, location.clone()))?;

                if let Some(post) = cmd.post() {
                    post.check(&value).map_err(|e| {
                        let reason = match e {
                            SetError::OutOfRange(reason) => reason,
                            other => other.to_string(),
                        };
                        SetError::OutOfRange(reason).into_conf(name, location.clone())
                    })?;
                }
            }
            Handler::None => {}
        }

        if let Some(spec) = cmd.block_spec() {
            self.open_block(stmt, entry, spec)?;
        }
        Ok(())
    }

    fn open_block(&mut self, stmt: &Statement, entry: &ModuleEntry, spec: &BlockSpec) -> ConfResult<()> {
        let limit = self.parser.settings.max_block_depth;
        if self.stack.len() >= limit {
            return Err(ConfError::at(ErrorKind::BlockDepth { limit }, stmt.location.clone()));
        }

        let label: Vec<String> = stmt.args.iter().map(|t| t.value.clone()).collect();
        let location = stmt.location.clone();
        let frame = match &spec.strategy {
            Some(strategy) => Frame::strategy(
                spec.context,
                spec.module_type,
                label,
                location,
                strategy.clone(),
                entry.id().index,
            ),
            None => {
                let records = self
                    .parser
                    .registry
                    .create_records(spec.context, spec.module_type);
                Frame::block(spec.context, spec.module_type, label, location, records)
            }
        };

        tracing::debug!(
            block = %frame.node.label().join(" "),
            line = stmt.location.line,
            depth = self.stack.len() + 1,
            "Opened block"
        );
        self.stack.push(frame);
        Ok(())
    }

    fn strategy_statement(&mut self, stmt: &Statement) -> ConfResult<()> {
        let (strategy, owner) = match &self.current().dispatch {
            Dispatch::Strategy { strategy, owner } => (strategy.clone(), *owner),
            Dispatch::Commands => return self.dispatch(stmt),
        };
        if stmt.terminator == Terminator::BlockOpen {
            return Err(ConfError::at(
                ErrorKind::UnexpectedBlock {
                    name: stmt.name().to_string(),
                },
                stmt.location.clone(),
            ));
        }

        let record = self
            .enclosing()
            .node
            .record_mut(owner)
            .ok_or_else(|| SetError::RecordMismatch.into_conf(stmt.name(), stmt.location.clone()))?;
        strategy
            .statement(stmt, record.conf.as_mut())
            .map_err(|e| e.into_conf(stmt.name(), stmt.location.clone()))
    }

    fn include(&mut self, stmt: &Statement) -> ConfResult<()> {
        let parser = self.parser;
        let (dir, depth) = match self.sources.last() {
            Some(source) => (source.dir.clone(), source.include_depth),
            None => (None, 0),
        };
        let limit = parser.settings.max_include_depth;
        if depth >= limit {
            return Err(ConfError::at(ErrorKind::IncludeDepth { limit }, stmt.location.clone()));
        }

        let pattern = stmt.values().first().map(|t| t.value.as_str()).unwrap_or("");
        let path = match &dir {
            Some(dir) if Path::new(pattern).is_relative() => dir.join(pattern),
            _ => PathBuf::from(pattern),
        };

        let paths = parser
            .reader
            .expand(&path)
            .map_err(|e| e.or_at(&stmt.location))?;
        if paths.is_empty() {
            parser.logger.log(
                Level::WARN,
                Some(&stmt.location),
                &format!("include pattern \"{}\" matched no files", pattern),
            );
        }

        // pushed in reverse so the first match is read first
        let base_depth = self.stack.len();
        for path in paths.iter().rev() {
            let bytes = parser.reader.read(path).map_err(|e| e.or_at(&stmt.location))?;
            tracing::debug!(file = %path.display(), line = stmt.location.line, "Including file");
            self.sources.push(Source {
                tokenizer: Tokenizer::new(path.display().to_string(), bytes),
                dir: path.parent().map(Path::to_path_buf),
                base_depth,
                include_depth: depth + 1,
            });
        }
        Ok(())
    }
}

/// Find the command for `name`. Candidates are taken in registration order.
fn lookup<'a>(
    registry: &'a Registry,
    policy: AmbiguityPolicy,
    name: &str,
    context: Contexts,
    module_type: ModuleType,
) -> ConfResult<(&'a ModuleEntry, &'a Command)> {
    let mut candidates = registry
        .lookup_commands(context, module_type)
        .filter(|(_, cmd)| cmd.name() == name);

    let Some(first) = candidates.next() else {
        return Err(ErrorKind::UnknownDirective {
            name: name.to_string(),
        }
        .into());
    };

    let rest: Vec<_> = candidates.collect();
    if rest.is_empty() || policy == AmbiguityPolicy::FirstRegistered {
        return Ok(first);
    }

    let modules = std::iter::once(first)
        .chain(rest)
        .map(|(entry, _)| entry.name().to_string())
        .collect();
    Err(ErrorKind::AmbiguousDirective {
        name: name.to_string(),
        modules,
    }
    .into())
}
