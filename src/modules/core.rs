//! Process-wide settings in the main context.

use serde::Serialize;

use crate::command::{ArgShape, Command, Contexts};
use crate::conf::{AnyConf, ConfigTree, ModuleConf, Setting};
use crate::module::{Module, ModuleType};
use crate::slot::{self, NumBounds};

/// Main-context record of the `core` module.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CoreConf {
    pub worker_processes: Setting<i64>,
    pub daemon: Setting<bool>,
    pub error_log: Setting<String>,
    pub pid: Setting<String>,
    pub env: Setting<Vec<String>>,
}

impl ModuleConf for CoreConf {
    fn merge(&mut self, parent: Option<&Self>) {
        self.worker_processes
            .merge(parent.map(|p| &p.worker_processes), 1);
        self.daemon.merge(parent.map(|p| &p.daemon), true);
        self.error_log
            .merge_with(parent.map(|p| &p.error_log), || "logs/error.log".to_string());
        self.pid
            .merge_with(parent.map(|p| &p.pid), || "logs/nginx.pid".to_string());
        self.env.merge_with(parent.map(|p| &p.env), Vec::new);
    }
}

pub struct CoreModule;

impl Module for CoreModule {
    fn name(&self) -> &'static str {
        "core"
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::CORE
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("worker_processes", ArgShape::TAKE1 | ArgShape::ONCE, Contexts::MAIN)
                .with_setter(slot::num(|c: &mut CoreConf| &mut c.worker_processes))
                .with_post(NumBounds::new(1, 1024)),
            Command::new("daemon", ArgShape::FLAG, Contexts::MAIN)
                .with_setter(slot::flag(|c: &mut CoreConf| &mut c.daemon)),
            Command::new("error_log", ArgShape::TAKE1, Contexts::MAIN)
                .with_setter(slot::string(|c: &mut CoreConf| &mut c.error_log)),
            Command::new("pid", ArgShape::TAKE1 | ArgShape::ONCE, Contexts::MAIN)
                .with_setter(slot::string(|c: &mut CoreConf| &mut c.pid)),
            Command::new("env", ArgShape::ONE_MORE, Contexts::MAIN)
                .with_setter(slot::list(|c: &mut CoreConf| &mut c.env)),
        ]
    }

    fn create_conf(&self, context: Contexts) -> Option<Box<dyn AnyConf>> {
        (context == Contexts::MAIN).then(|| Box::new(CoreConf::default()) as Box<dyn AnyConf>)
    }

    fn init_context(&self, tree: &ConfigTree) -> Result<(), String> {
        let conf = tree
            .root()
            .conf::<CoreConf>()
            .ok_or_else(|| "main context has no core configuration".to_string())?;
        tracing::debug!(
            worker_processes = conf.worker_processes.value_or(1),
            daemon = conf.daemon.value_or(true),
            "Core context initialized"
        );
        Ok(())
    }
}
