//! Shared helpers for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use directive_engine::{modules, ConfResult, ConfigTree, FsReader, MemoryReader, Parser, Registry};

/// Registry with the reference modules.
pub fn registry() -> Registry {
    modules::registry().expect("reference modules register")
}

/// Parse `text` with the reference modules and no files available.
#[allow(dead_code)]
pub fn parse(text: &str) -> ConfResult<ConfigTree> {
    let registry = registry();
    let reader = MemoryReader::new();
    Parser::new(&registry, &reader).parse_str("test.conf", text)
}

/// Write `files` under `dir` and parse `main` from disk.
#[allow(dead_code)]
pub fn parse_tree_on_disk(dir: &Path, files: &[(&str, &str)], main: &str) -> ConfResult<ConfigTree> {
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
    }
    let registry = registry();
    let main: PathBuf = dir.join(main);
    Parser::new(&registry, &FsReader).parse_file(main)
}
