//! End-to-end parsing with the reference modules.

use std::time::Duration;

use directive_engine::modules::http::{SSL_TLS1_2, SSL_TLS1_3};
use directive_engine::modules::{CoreConf, HttpConf};
use directive_engine::slot::Bufs;
use directive_engine::ErrorKind;

mod common;

const SITE: &str = r#"
# main context
worker_processes 2;
daemon off;
env TZ PATH;

http {
    sendfile on;
    client_max_body_size 2m;
    gzip_types text/css;
    gzip_types application/json;

    server {
        listen 127.0.0.1:8080 default_server;
        server_name example.com "www.example.com";
        root '/srv/www';

        location / {
            client_body_timeout 1500;
        }

        location /static {
            sendfile off;
            client_body_buffers 8 16k;
        }
    }

    server {
        listen 8081;
    }
}
"#;

#[test]
fn test_inheritance_through_levels() {
    let tree = common::parse(SITE).unwrap();

    let core = tree.root().conf::<CoreConf>().unwrap();
    assert_eq!(core.worker_processes.get(), Some(&2));
    assert_eq!(core.daemon.get(), Some(&false));
    assert_eq!(core.env.get(), Some(&vec!["TZ".to_string(), "PATH".to_string()]));

    let root = tree
        .root()
        .find(&[&["http"], &["server"], &["location", "/"]])
        .and_then(|n| n.conf::<HttpConf>())
        .unwrap();
    assert_eq!(root.sendfile.get(), Some(&true));
    assert_eq!(root.root.get().map(String::as_str), Some("/srv/www"));
    assert_eq!(root.client_max_body_size.get(), Some(&(2 * 1024 * 1024)));
    assert_eq!(root.client_body_timeout.get(), Some(&Duration::from_millis(1500)));
    assert_eq!(
        root.gzip_types.get(),
        Some(&vec!["text/css".to_string(), "application/json".to_string()])
    );

    let statics = tree
        .root()
        .find(&[&["http"], &["server"], &["location", "/static"]])
        .and_then(|n| n.conf::<HttpConf>())
        .unwrap();
    assert_eq!(statics.sendfile.get(), Some(&false));
    assert_eq!(statics.client_body_buffers.get(), Some(&Bufs { num: 8, size: 16 * 1024 }));
    assert_eq!(statics.ssl_protocols.get(), Some(&(SSL_TLS1_2 | SSL_TLS1_3)));
}

#[test]
fn test_sibling_servers_do_not_share() {
    let tree = common::parse(SITE).unwrap();
    let http = tree.root().find(&[&["http"]]).unwrap();
    let servers: Vec<&HttpConf> = http
        .children_named("server")
        .filter_map(|s| s.conf::<HttpConf>())
        .collect();
    assert_eq!(servers.len(), 2);

    assert_eq!(
        servers[0].server_name.get(),
        Some(&vec!["example.com".to_string(), "www.example.com".to_string()])
    );
    assert_eq!(servers[1].server_name.get(), Some(&Vec::new()));
    assert_eq!(servers[1].root.get().map(String::as_str), Some("html"));
    assert_eq!(servers[1].listen.get().map(|l| l[0].port), Some(8081));
}

#[test]
fn test_init_context_hooks() {
    let registry = common::registry();
    let tree = common::parse(SITE).unwrap();
    assert!(registry.init_context(&tree).is_ok());

    let tree = common::parse(
        "http { server { listen 80 default_server; } server { listen 80 default_server; } }",
    )
    .unwrap();
    let err = registry.init_context(&tree).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::HookFailed { module, .. } if module == "http_core"
    ));
}

#[test]
fn test_json_dump() {
    let tree = common::parse("worker_processes 3;\nhttp { server { listen 9000; } }").unwrap();
    let json = tree.to_json().unwrap();

    assert_eq!(json["records"]["core"]["worker_processes"], 3);
    let server = &json["children"][0]["children"][0];
    assert_eq!(server["label"][0], "server");
    assert_eq!(server["records"]["http_core"]["listen"][0]["port"], 9000);
    assert_eq!(server["records"]["http_core"]["keepalive_timeout"]["secs"], 75);
}

#[test]
fn test_first_error_wins() {
    let err = common::parse("daemon on;\nhttp {\n  sendfile maybe;\n  frobnicate;\n}\n").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidDirectiveValue { .. }));
    assert_eq!(err.location().map(|l| l.line), Some(3));
}

#[test]
fn test_syntax_errors() {
    for text in ["\"unterminated", "daemon \"on\"x;", "{", "daemon on }"] {
        let err = common::parse(text).unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::Syntax(_) | ErrorKind::UnexpectedEof),
            "{}: {:?}",
            text,
            err
        );
    }
}
