//! `include` against the real filesystem.

use directive_engine::modules::{CoreConf, HttpConf};
use directive_engine::ErrorKind;

mod common;

#[test]
fn test_glob_include_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let tree = common::parse_tree_on_disk(
        dir.path(),
        &[
            ("nginx.conf", "include core.conf;\nhttp {\n    include sites/*.conf;\n}\n"),
            ("core.conf", "worker_processes 6;\n"),
            ("sites/20-b.conf", "server { listen 8002; }\n"),
            ("sites/10-a.conf", "server { listen 8001; }\n"),
            ("sites/readme.txt", "not a config"),
        ],
        "nginx.conf",
    )
    .unwrap();

    let core = tree.root().conf::<CoreConf>().unwrap();
    assert_eq!(core.worker_processes.get(), Some(&6));

    let http = tree.root().find(&[&["http"]]).unwrap();
    let ports: Vec<u16> = http
        .children_named("server")
        .filter_map(|s| s.conf::<HttpConf>())
        .filter_map(|c| c.listen.get().map(|l| l[0].port))
        .collect();
    assert_eq!(ports, vec![8001, 8002]);
}

#[test]
fn test_nested_relative_include() {
    let dir = tempfile::tempdir().unwrap();
    let tree = common::parse_tree_on_disk(
        dir.path(),
        &[
            ("main.conf", "include conf/http.conf;\n"),
            ("conf/http.conf", "http {\n include mime.conf;\n}\n"),
            ("conf/mime.conf", "types {\n application/wasm wasm;\n}\n"),
        ],
        "main.conf",
    )
    .unwrap();

    let http = tree.root().find(&[&["http"]]).and_then(|n| n.conf::<HttpConf>()).unwrap();
    let types = http.types.get().unwrap();
    assert_eq!(types.get("wasm").map(String::as_str), Some("application/wasm"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = common::parse_tree_on_disk(dir.path(), &[("main.conf", "include gone.conf;\n")], "main.conf")
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NotFound { .. }));
    assert_eq!(err.location().map(|l| l.line), Some(1));

    let err = common::parse_tree_on_disk(dir.path(), &[], "absent.conf").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::NotFound { .. }));
}

#[test]
fn test_included_file_error_location() {
    let dir = tempfile::tempdir().unwrap();
    let err = common::parse_tree_on_disk(
        dir.path(),
        &[
            ("main.conf", "http {\n include bad.conf;\n}\n"),
            ("bad.conf", "\n\nsendfile sometimes;\n"),
        ],
        "main.conf",
    )
    .unwrap_err();

    let location = err.location().unwrap();
    assert!(location.file.ends_with("bad.conf"));
    assert_eq!(location.line, 3);
}
