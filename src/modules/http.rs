//! HTTP block, server and location contexts.
//!
//! # Data Flow
//! ```text
//! main (CORE)
//!   └─ http { }            HTTP_MAIN, opened by the CORE-type `http` module
//!        └─ server { }     HTTP_SRV
//!             └─ location /path { }   HTTP_LOC, may nest
//! ```
//!
//! # Design Decisions
//! - One record type for all three levels; a location inherits whatever
//!   its server and the http block set
//! - `types { }` is parsed by a block strategy into the enclosing record
//! - Duplicate `default_server` listeners are rejected in `init_context`

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::Serialize;

use crate::command::{ArgShape, Args, BlockSpec, BlockStrategy, Command, Contexts};
use crate::conf::{AnyConf, ConfigTree, ContextNode, ModuleConf, Setting};
use crate::error::SetError;
use crate::module::{Module, ModuleType};
use crate::slot::{self, Bufs, DurationBounds, Names, SlotValue};
use crate::tokenizer::Statement;

pub const HTTP: ModuleType = ModuleType::from_tag(*b"HTTP");

pub const HTTP_MAIN: Contexts = Contexts::from_bits_retain(1 << 1);
pub const HTTP_SRV: Contexts = Contexts::from_bits_retain(1 << 2);
pub const HTTP_LOC: Contexts = Contexts::from_bits_retain(1 << 3);
/// Inside `types { }`.
pub const HTTP_TYPES: Contexts = Contexts::from_bits_retain(1 << 4);

const HTTP_ANY: Contexts =
    Contexts::from_bits_retain(HTTP_MAIN.bits() | HTTP_SRV.bits() | HTTP_LOC.bits());
const SRV_LOC: Contexts = Contexts::from_bits_retain(HTTP_SRV.bits() | HTTP_LOC.bits());

pub const SSL_TLS1: u32 = 1 << 1;
pub const SSL_TLS1_1: u32 = 1 << 2;
pub const SSL_TLS1_2: u32 = 1 << 3;
pub const SSL_TLS1_3: u32 = 1 << 4;

const SSL_PROTOCOLS: Names = &[
    ("TLSv1", SSL_TLS1),
    ("TLSv1.1", SSL_TLS1_1),
    ("TLSv1.2", SSL_TLS1_2),
    ("TLSv1.3", SSL_TLS1_3),
];

const SERVER_TOKENS: Names = &[("off", 0), ("on", 1), ("build", 2)];

/// One `listen` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listen {
    pub addr: String,
    pub port: u16,
    pub default_server: bool,
}

impl Default for Listen {
    fn default() -> Self {
        Self {
            addr: "*".to_string(),
            port: 80,
            default_server: false,
        }
    }
}

/// Record of the `http_core` module, used at every HTTP level.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct HttpConf {
    pub listen: Setting<Vec<Listen>>,
    pub server_name: Setting<Vec<String>>,
    pub root: Setting<String>,
    pub sendfile: Setting<bool>,
    pub keepalive_timeout: Setting<Duration>,
    pub client_body_timeout: Setting<Duration>,
    pub client_max_body_size: Setting<u64>,
    pub client_body_buffers: Setting<Bufs>,
    pub gzip_types: Setting<Vec<String>>,
    pub ssl_protocols: Setting<u32>,
    pub server_tokens: Setting<u32>,
    pub default_type: Setting<String>,
    /// Extension → MIME type.
    pub types: Setting<BTreeMap<String, String>>,
}

fn default_types() -> BTreeMap<String, String> {
    [("html", "text/html"), ("gif", "image/gif"), ("jpg", "image/jpeg")]
        .into_iter()
        .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
        .collect()
}

impl ModuleConf for HttpConf {
    fn merge(&mut self, parent: Option<&Self>) {
        self.listen
            .merge_with(parent.map(|p| &p.listen), || vec![Listen::default()]);
        self.server_name
            .merge_with(parent.map(|p| &p.server_name), Vec::new);
        self.root
            .merge_with(parent.map(|p| &p.root), || "html".to_string());
        self.sendfile.merge(parent.map(|p| &p.sendfile), false);
        self.keepalive_timeout
            .merge(parent.map(|p| &p.keepalive_timeout), Duration::from_secs(75));
        self.client_body_timeout
            .merge(parent.map(|p| &p.client_body_timeout), Duration::from_secs(60));
        self.client_max_body_size
            .merge(parent.map(|p| &p.client_max_body_size), 1024 * 1024);
        self.client_body_buffers.merge(
            parent.map(|p| &p.client_body_buffers),
            Bufs {
                num: 4,
                size: 8 * 1024,
            },
        );
        self.gzip_types
            .merge_with(parent.map(|p| &p.gzip_types), || vec!["text/html".to_string()]);
        self.ssl_protocols
            .merge(parent.map(|p| &p.ssl_protocols), SSL_TLS1_2 | SSL_TLS1_3);
        self.server_tokens.merge(parent.map(|p| &p.server_tokens), 1);
        self.default_type
            .merge_with(parent.map(|p| &p.default_type), || "text/plain".to_string());
        self.types.merge_with(parent.map(|p| &p.types), default_types);
    }
}

/// `listen [addr:]port [default_server];`
fn set_listen(args: &Args<'_>, conf: &mut dyn AnyConf) -> Result<SlotValue, SetError> {
    let conf = conf
        .as_any_mut()
        .downcast_mut::<HttpConf>()
        .ok_or(SetError::RecordMismatch)?;

    let spec = args.require(0)?;
    let (addr, port) = match spec.rsplit_once(':') {
        Some((addr, port)) if !addr.is_empty() => (addr, port),
        Some(_) => return Err(SetError::invalid(spec, "missing address")),
        None => ("*", spec),
    };
    let port = port
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| SetError::invalid(spec, "invalid port"))?;

    let default_server = match args.get(1) {
        None => false,
        Some("default_server") => true,
        Some(other) => return Err(SetError::invalid(other, "unknown listen parameter")),
    };

    conf.listen.get_or_insert_with(Vec::new).push(Listen {
        addr: addr.to_string(),
        port,
        default_server,
    });
    Ok(SlotValue::Str(format!("{}:{}", addr, port)))
}

/// Parses `mime ext...;` lines into the enclosing record's type map.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypesBlock;

impl BlockStrategy for TypesBlock {
    fn statement(&self, statement: &Statement, conf: &mut dyn AnyConf) -> Result<(), SetError> {
        let conf = conf
            .as_any_mut()
            .downcast_mut::<HttpConf>()
            .ok_or(SetError::RecordMismatch)?;

        let mime = statement.name();
        let exts = statement.values();
        if exts.is_empty() {
            return Err(SetError::invalid(mime, "no file extensions given"));
        }

        // an explicit types block replaces the defaults
        let types = conf.types.get_or_insert_with(BTreeMap::new);
        for ext in exts {
            types.insert(ext.value.to_lowercase(), mime.to_string());
        }
        Ok(())
    }
}

/// CORE-type module owning the `http` block directive.
pub struct HttpModule;

impl Module for HttpModule {
    fn name(&self) -> &'static str {
        "http"
    }

    fn module_type(&self) -> ModuleType {
        ModuleType::CORE
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("http", ArgShape::NOARGS | ArgShape::ONCE, Contexts::MAIN)
                .with_block(BlockSpec::new(HTTP_MAIN, HTTP)),
        ]
    }
}

/// HTTP-type module with the server/location structure and its settings.
pub struct HttpCoreModule;

impl Module for HttpCoreModule {
    fn name(&self) -> &'static str {
        "http_core"
    }

    fn module_type(&self) -> ModuleType {
        HTTP
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::block("server", HTTP_MAIN, BlockSpec::new(HTTP_SRV, HTTP)),
            Command::new("location", ArgShape::TAKE12, SRV_LOC)
                .with_block(BlockSpec::new(HTTP_LOC, HTTP)),
            Command::block(
                "types",
                HTTP_ANY,
                BlockSpec::new(HTTP_TYPES, HTTP).with_strategy(TypesBlock),
            ),
            Command::new("listen", ArgShape::TAKE12, HTTP_SRV).with_setter(set_listen),
            Command::new("server_name", ArgShape::ONE_MORE, HTTP_SRV)
                .with_setter(slot::list(|c: &mut HttpConf| &mut c.server_name)),
            Command::new("root", ArgShape::TAKE1, HTTP_ANY)
                .with_setter(slot::string(|c: &mut HttpConf| &mut c.root)),
            Command::new("sendfile", ArgShape::FLAG, HTTP_ANY)
                .with_setter(slot::flag(|c: &mut HttpConf| &mut c.sendfile)),
            Command::new("keepalive_timeout", ArgShape::TAKE1, HTTP_ANY)
                .with_setter(slot::sec(|c: &mut HttpConf| &mut c.keepalive_timeout))
                .with_post(DurationBounds::new(Duration::ZERO, Duration::from_secs(3600))),
            Command::new("client_body_timeout", ArgShape::TAKE1, HTTP_ANY)
                .with_setter(slot::msec(|c: &mut HttpConf| &mut c.client_body_timeout)),
            Command::new("client_max_body_size", ArgShape::TAKE1, HTTP_ANY)
                .with_setter(slot::size(|c: &mut HttpConf| &mut c.client_max_body_size)),
            Command::new("client_body_buffers", ArgShape::TAKE2, HTTP_ANY)
                .with_setter(slot::bufs(|c: &mut HttpConf| &mut c.client_body_buffers)),
            Command::new("gzip_types", ArgShape::ONE_MORE, HTTP_ANY)
                .with_setter(slot::list(|c: &mut HttpConf| &mut c.gzip_types)),
            Command::new("ssl_protocols", ArgShape::ONE_MORE, HTTP_ANY).with_setter(
                slot::bitmask(|c: &mut HttpConf| &mut c.ssl_protocols, SSL_PROTOCOLS),
            ),
            Command::new("server_tokens", ArgShape::TAKE1, HTTP_ANY).with_setter(
                slot::enumeration(|c: &mut HttpConf| &mut c.server_tokens, SERVER_TOKENS),
            ),
            Command::new("default_type", ArgShape::TAKE1, HTTP_ANY)
                .with_setter(slot::string(|c: &mut HttpConf| &mut c.default_type)),
        ]
    }

    fn create_conf(&self, context: Contexts) -> Option<Box<dyn AnyConf>> {
        HTTP_ANY
            .contains(context)
            .then(|| Box::new(HttpConf::default()) as Box<dyn AnyConf>)
    }

    fn init_context(&self, tree: &ConfigTree) -> Result<(), String> {
        for http in tree.root().children_named("http") {
            check_default_servers(http)?;
        }
        Ok(())
    }
}

/// At most one `default_server` per address and port.
fn check_default_servers(http: &ContextNode) -> Result<(), String> {
    let mut seen = HashSet::new();
    for server in http.children_named("server") {
        let Some(conf) = server.conf::<HttpConf>() else {
            continue;
        };
        let listeners = conf.listen.get().map(Vec::as_slice).unwrap_or_default();
        for listen in listeners.iter().filter(|l| l.default_server) {
            if !seen.insert((listen.addr.clone(), listen.port)) {
                return Err(format!(
                    "a duplicate default server for {}:{}",
                    listen.addr, listen.port
                ));
            }
        }
    }
    tracing::debug!(servers = http.children_named("server").count(), "HTTP context initialized");
    Ok(())
}
