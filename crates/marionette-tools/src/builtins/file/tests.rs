use super::*;
use crate::error::Error;
use crate::registry::Action;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn workspace() -> (tempfile::TempDir, Arc<Workspace>) {
    let dir = tempfile::tempdir().unwrap();
    let ws = Arc::new(Workspace::new(dir.path().join("ws")).unwrap());
    (dir, ws)
}

#[test]
fn test_workspace_created_and_canonical() {
    let (_dir, ws) = workspace();
    assert!(ws.root().is_dir());
    assert!(ws.root().is_absolute());
}

#[test]
fn test_resolve_stays_inside() {
    let (_dir, ws) = workspace();

    let inside = ws.resolve("notes/todo.txt").unwrap();
    assert!(inside.starts_with(ws.root()));
    assert_eq!(ws.display(&inside), "notes/todo.txt");

    let dotted = ws.resolve("./a/../b.txt").unwrap();
    assert_eq!(dotted, ws.root().join("b.txt"));

    assert_eq!(ws.display(&ws.resolve(".").unwrap()), ".");
}

#[test]
fn test_resolve_rejects_escape() {
    let (_dir, ws) = workspace();

    assert!(matches!(
        ws.resolve("../outside.txt"),
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        ws.resolve("a/../../outside.txt"),
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        ws.resolve("/etc/passwd"),
        Err(Error::PermissionDenied(_))
    ));
}

#[test]
fn test_resolve_rejects_sibling_with_shared_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::new(dir.path().join("ws")).unwrap();
    std::fs::create_dir_all(dir.path().join("ws2")).unwrap();

    assert!(ws.resolve("../ws2/file.txt").is_err());
}

#[cfg(unix)]
#[test]
fn test_resolve_rejects_symlink_escape() {
    let dir = tempfile::tempdir().unwrap();
    let outside = dir.path().join("outside");
    std::fs::create_dir_all(&outside).unwrap();
    let ws = Workspace::new(dir.path().join("ws")).unwrap();
    std::os::unix::fs::symlink(&outside, ws.root().join("link")).unwrap();

    assert!(matches!(
        ws.resolve("link/secret.txt"),
        Err(Error::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn test_write_then_read() {
    let (_dir, ws) = workspace();
    let write = FileWriteAction::new(ws.clone());
    let read = FileReadAction::new(ws.clone());

    let out = write
        .execute(&params(json!({"path": "sub/hello.txt", "content": "hello"})))
        .await
        .unwrap();
    assert_eq!(out["bytes_written"], 5);

    write
        .execute(&params(
            json!({"path": "sub/hello.txt", "content": " world", "append": true}),
        ))
        .await
        .unwrap();

    let out = read
        .execute(&params(json!({"path": "sub/hello.txt"})))
        .await
        .unwrap();
    assert_eq!(out["content"], "hello world");
    assert_eq!(out["path"], "sub/hello.txt");

    write
        .execute(&params(json!({"path": "sub/hello.txt", "content": "reset"})))
        .await
        .unwrap();
    let out = read
        .execute(&params(json!({"path": "sub/hello.txt"})))
        .await
        .unwrap();
    assert_eq!(out["content"], "reset");
}

#[tokio::test]
async fn test_read_missing_file() {
    let (_dir, ws) = workspace();
    let err = FileReadAction::new(ws)
        .execute(&params(json!({"path": "nope.txt"})))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("file does not exist"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_read_io_failure_is_not_reported_missing() {
    let (_dir, ws) = workspace();
    std::fs::write(ws.root().join("plain.txt"), "x").unwrap();

    let read_err = FileReadAction::new(ws.clone())
        .execute(&params(json!({"path": "plain.txt/inner"})))
        .await
        .unwrap_err();
    assert!(matches!(read_err, Error::Io(_)), "{read_err}");

    let list_err = FileListAction::new(ws)
        .execute(&params(json!({"path": "plain.txt"})))
        .await
        .unwrap_err();
    assert!(matches!(list_err, Error::Io(_)), "{list_err}");
}

#[tokio::test]
async fn test_read_outside_workspace_denied() {
    let (_dir, ws) = workspace();
    let err = FileReadAction::new(ws)
        .execute(&params(json!({"path": "../../etc/passwd"})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
}

#[tokio::test]
async fn test_list_sorted_entries() {
    let (_dir, ws) = workspace();
    std::fs::write(ws.root().join("b.txt"), "bb").unwrap();
    std::fs::write(ws.root().join("a.txt"), "a").unwrap();
    std::fs::create_dir(ws.root().join("c")).unwrap();

    let out = FileListAction::new(ws)
        .execute(&Map::new())
        .await
        .unwrap();
    assert_eq!(out["count"], 3);
    assert_eq!(
        out["entries"],
        json!([
            {"name": "a.txt", "type": "file", "size": 1},
            {"name": "b.txt", "type": "file", "size": 2},
            {"name": "c", "type": "dir", "size": 0}
        ])
    );
}

#[tokio::test]
async fn test_exists_and_delete() {
    let (_dir, ws) = workspace();
    std::fs::write(ws.root().join("gone.txt"), "x").unwrap();
    let exists = FileExistsAction::new(ws.clone());
    let delete = FileDeleteAction::new(ws.clone());

    let out = exists
        .execute(&params(json!({"path": "gone.txt"})))
        .await
        .unwrap();
    assert_eq!(out["exists"], true);

    delete
        .execute(&params(json!({"path": "gone.txt"})))
        .await
        .unwrap();

    let out = exists
        .execute(&params(json!({"path": "gone.txt"})))
        .await
        .unwrap();
    assert_eq!(out["exists"], false);

    assert!(delete
        .execute(&params(json!({"path": "gone.txt"})))
        .await
        .is_err());
    assert!(matches!(
        delete.execute(&params(json!({"path": "."}))).await,
        Err(Error::PermissionDenied(_))
    ));
}
