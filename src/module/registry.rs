//! Registration and lookup.

use std::collections::HashMap;

use crate::command::{Command, Contexts};
use crate::conf::{ConfigTree, Record};
use crate::error::{ConfError, ConfResult, ErrorKind};
use crate::module::{ConfModule, Module, ModuleId, ModuleType};

/// Collects modules before parsing begins.
pub struct RegistryBuilder {
    modules: Vec<Box<dyn Module>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            modules: vec![Box::new(ConfModule)],
        }
    }

    /// Add a module. Identity is `(type tag, name)`.
    pub fn register(&mut self, module: impl Module + 'static) -> ConfResult<&mut Self> {
        let duplicate = self
            .modules
            .iter()
            .any(|m| m.module_type() == module.module_type() && m.name() == module.name());
        if duplicate {
            return Err(ErrorKind::DuplicateModule {
                name: module.name().to_string(),
            }
            .into());
        }
        self.modules.push(Box::new(module));
        Ok(self)
    }

    /// Validate command tables, assign indices and run `init` hooks.
    pub fn finalize(self) -> ConfResult<Registry> {
        let mut per_type: HashMap<ModuleType, usize> = HashMap::new();
        let mut entries = Vec::with_capacity(self.modules.len());

        for (index, module) in self.modules.into_iter().enumerate() {
            let module_type = module.module_type();
            let ctx_index = per_type.entry(module_type).or_insert(0);
            let id = ModuleId {
                index,
                ctx_index: *ctx_index,
                module_type,
            };
            *ctx_index += 1;

            let commands = module.commands();
            for cmd in &commands {
                cmd.validate().map_err(|reason| {
                    ConfError::new(ErrorKind::InvalidCommand {
                        module: module.name().to_string(),
                        name: cmd.name().to_string(),
                        reason,
                    })
                })?;
            }

            entries.push(ModuleEntry {
                id,
                module,
                commands,
            });
        }

        for entry in &entries {
            entry.module.init().map_err(|reason| {
                ConfError::new(ErrorKind::HookFailed {
                    module: entry.name().to_string(),
                    reason,
                })
            })?;
        }

        tracing::debug!(modules = entries.len(), "Module registry finalized");
        Ok(Registry { entries })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered module with its assigned identity and command table.
pub struct ModuleEntry {
    id: ModuleId,
    module: Box<dyn Module>,
    commands: Vec<Command>,
}

impl ModuleEntry {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.module.name()
    }

    pub fn module(&self) -> &dyn Module {
        self.module.as_ref()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

/// The frozen module list. Shared read-only for the rest of the process.
pub struct Registry {
    entries: Vec<ModuleEntry>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ModuleEntry> {
        self.entries.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Commands legal in `context` for a block owned by `module_type`, in
    /// registration order. `CONF` commands are always included.
    pub fn lookup_commands(
        &self,
        context: Contexts,
        module_type: ModuleType,
    ) -> impl Iterator<Item = (&ModuleEntry, &Command)> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.id.module_type == module_type || e.id.module_type == ModuleType::CONF)
            .flat_map(move |e| {
                e.commands
                    .iter()
                    .filter(move |c| c.allowed_in(context))
                    .map(move |c| (e, c))
            })
    }

    /// Fresh records for every `module_type` module that keeps configuration
    /// in `context`.
    pub(crate) fn create_records(&self, context: Contexts, module_type: ModuleType) -> Vec<Record> {
        self.entries
            .iter()
            .filter(|e| e.id.module_type == module_type)
            .filter_map(|e| {
                e.module.create_conf(context).map(|conf| Record {
                    module: e.id,
                    module_name: e.name(),
                    conf,
                })
            })
            .collect()
    }

    /// Run every module's `init_context` hook once.
    pub fn init_context(&self, tree: &ConfigTree) -> ConfResult<()> {
        for entry in &self.entries {
            entry.module.init_context(tree).map_err(|reason| {
                ConfError::new(ErrorKind::HookFailed {
                    module: entry.name().to_string(),
                    reason,
                })
            })?;
        }
        Ok(())
    }
}
