mod common;

use std::fs;
use std::io::Read;

use loadline::http::resource::{self, Resource};

#[test]
fn test_request_path_origin_form() {
    assert_eq!(resource::request_path("/a.html").as_deref(), Some("/a.html"));
    assert_eq!(resource::request_path("/").as_deref(), Some("/index.html"));
    assert_eq!(
        resource::request_path("/my%20file.html").as_deref(),
        Some("/my file.html")
    );
}

#[test]
fn test_request_path_absolute_form() {
    assert_eq!(
        resource::request_path("http://example.com/docs/a.html").as_deref(),
        Some("/docs/a.html")
    );
    assert_eq!(
        resource::request_path("http://example.com").as_deref(),
        Some("/index.html")
    );
}

#[test]
fn test_request_path_without_path() {
    assert_eq!(resource::request_path("*"), None);
    assert_eq!(resource::request_path("example.com:443"), None);
}

#[test]
fn test_open_existing_file() {
    let root = common::document_root();

    let Resource::File { mut file, len } = resource::open(root.path(), "/").unwrap() else {
        panic!("index.html should resolve to a file");
    };

    let mut content = Vec::new();
    file.read_to_end(&mut content).unwrap();
    assert_eq!(len, common::INDEX.len() as u64);
    assert_eq!(content, common::INDEX);
}

#[test]
fn test_open_file_with_space() {
    let root = common::document_root();
    fs::write(root.path().join("my file.txt"), b"spaced").unwrap();

    assert!(matches!(
        resource::open(root.path(), "/my%20file.txt").unwrap(),
        Resource::File { len: 6, .. }
    ));
}

#[test]
fn test_absolute_form_opens_same_file_as_origin_form() {
    let root = common::document_root();
    fs::write(root.path().join("a{b}.html"), b"braces").unwrap();
    fs::write(root.path().join("q\"x.html"), b"quote").unwrap();

    for (origin, absolute, len) in [
        ("/a{b}.html", "http://example.com/a{b}.html", 6),
        ("/q\"x.html", "http://example.com:8080/q\"x.html", 5),
    ] {
        for uri in [origin, absolute] {
            assert!(
                matches!(
                    resource::open(root.path(), uri).unwrap(),
                    Resource::File { len: l, .. } if l == len
                ),
                "{uri}"
            );
        }
    }
}

#[test]
fn test_absolute_form_parent_segments_are_forbidden() {
    let root = common::document_root();

    assert!(matches!(
        resource::open(root.path(), "http://example.com/docs/../../secret").unwrap(),
        Resource::Forbidden
    ));
}

#[test]
fn test_open_missing_file() {
    let root = common::document_root();

    assert!(matches!(
        resource::open(root.path(), "/absent.html").unwrap(),
        Resource::Missing
    ));
    assert!(matches!(resource::open(root.path(), "*").unwrap(), Resource::Missing));
}

#[test]
fn test_path_below_a_file_is_missing() {
    let root = common::document_root();

    assert!(matches!(
        resource::open(root.path(), "/index.html/child").unwrap(),
        Resource::Missing
    ));
}

#[test]
fn test_directory_is_forbidden() {
    let root = common::document_root();
    fs::create_dir(root.path().join("docs")).unwrap();

    assert!(matches!(
        resource::open(root.path(), "/docs").unwrap(),
        Resource::Forbidden
    ));
}

#[test]
fn test_parent_segments_are_forbidden() {
    let root = common::document_root();

    for uri in ["/../etc/passwd", "/docs/../../secret", "/.."] {
        assert!(
            matches!(resource::open(root.path(), uri).unwrap(), Resource::Forbidden),
            "{uri}"
        );
    }
}

#[test]
fn test_unreadable_file_is_forbidden() {
    use std::os::unix::fs::PermissionsExt;

    if common::running_as_root() {
        // root bypasses file permissions
        return;
    }

    let root = common::document_root();
    let path = root.path().join("secret.html");
    fs::write(&path, b"secret").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    assert!(matches!(
        resource::open(root.path(), "/secret.html").unwrap(),
        Resource::Forbidden
    ));
}
