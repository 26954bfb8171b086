//! Request/response contract between the editor front end and the vault
//!
//! Requests are JSON objects tagged by `op`. Required fields are modelled as
//! `Option` so that an absent field can be told apart from an empty one: an
//! absent `content` is a bad request, `""` is a valid document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{ErrorKind, VaultError};
use crate::core::file_system::{FileNode, NodeKind, Vault};

/// One operation requested by the client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    List,
    Read {
        path: Option<String>,
    },
    Write {
        path: Option<String>,
        content: Option<String>,
    },
    Create {
        path: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
    },
    Delete {
        path: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Move {
        old_path: Option<String>,
        new_path: Option<String>,
    },
    MoveInto {
        path: Option<String>,
        folder: Option<String>,
    },
    Import {
        name: Option<String>,
        content: Option<String>,
        folder: Option<String>,
    },
}

/// A request plus the client's correlation id
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(flatten)]
    pub request: Request,
}

/// Payload of a response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body {
    Tree { tree: Vec<FileNode> },
    Content { content: String },
    Relocated { success: bool, path: String },
    Success { success: bool },
    Error { error: String, kind: ErrorKind },
}

/// One response line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub status: u16,
    pub body: Body,
}

impl Response {
    fn ok(id: Option<Value>, body: Body) -> Self {
        Self {
            id,
            status: 200,
            body,
        }
    }

    fn error(id: Option<Value>, err: &VaultError) -> Self {
        let kind = err.kind();
        Self {
            id,
            status: kind.status(),
            body: Body::Error {
                error: err.to_string(),
                kind,
            },
        }
    }
}

/// Parse and serve one JSON request line
pub fn handle_line(vault: &Vault, line: &str) -> Response {
    match serde_json::from_str::<Envelope>(line) {
        Ok(envelope) => handle(vault, envelope),
        Err(e) => {
            tracing::warn!("Malformed request: {}", e);
            // Salvage the id if the line is at least a JSON object
            let id = serde_json::from_str::<Value>(line)
                .ok()
                .and_then(|v| v.get("id").cloned());
            Response::error(id, &VaultError::BadRequest(e.to_string()))
        }
    }
}

/// Serve a parsed request
pub fn handle(vault: &Vault, envelope: Envelope) -> Response {
    let Envelope { id, request } = envelope;
    match dispatch(vault, request) {
        Ok(body) => Response::ok(id, body),
        Err(err) => {
            tracing::warn!("Request failed: {}", err);
            Response::error(id, &err)
        }
    }
}

/// Validate a request and run it against the vault
pub fn dispatch(vault: &Vault, request: Request) -> Result<Body, VaultError> {
    let done = Body::Success { success: true };

    match request {
        Request::List => Ok(Body::Tree { tree: vault.list()? }),
        Request::Read { path } => {
            let path = required(path, "path")?;
            Ok(Body::Content {
                content: vault.read(&path)?,
            })
        }
        Request::Write { path, content } => {
            let path = required(path, "path")?;
            let content = content.ok_or_else(|| missing("content"))?;
            vault.write(&path, &content)?;
            Ok(done)
        }
        Request::Create { path, kind } => {
            let path = required(path, "path")?;
            let kind = parse_kind(&required(kind, "type")?)?;
            vault.create(&path, kind)?;
            Ok(done)
        }
        Request::Delete { path } => {
            vault.delete(&required(path, "path")?)?;
            Ok(done)
        }
        Request::Move { old_path, new_path } => {
            let old_path = required(old_path, "oldPath")?;
            let new_path = required(new_path, "newPath")?;
            vault.rename(&old_path, &new_path)?;
            Ok(done)
        }
        Request::MoveInto { path, folder } => {
            let path = required(path, "path")?;
            let moved = vault.move_into(&path, folder.as_deref().unwrap_or_default())?;
            Ok(Body::Relocated {
                success: true,
                path: moved,
            })
        }
        Request::Import {
            name,
            content,
            folder,
        } => {
            let name = required(name, "name")?;
            let content = content.ok_or_else(|| missing("content"))?;
            let imported = vault.import(&name, &content, folder.as_deref())?;
            Ok(Body::Relocated {
                success: true,
                path: imported,
            })
        }
    }
}

fn parse_kind(raw: &str) -> Result<NodeKind, VaultError> {
    match raw {
        "file" => Ok(NodeKind::File),
        "folder" => Ok(NodeKind::Folder),
        other => Err(VaultError::BadRequest(format!("Unknown type: {other}"))),
    }
}

/// A present, non-empty string field
fn required(value: Option<String>, field: &str) -> Result<String, VaultError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(missing(field)),
    }
}

fn missing(field: &str) -> VaultError {
    VaultError::BadRequest(format!("Missing {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn vault() -> (TempDir, Vault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        (dir, vault)
    }

    fn call(vault: &Vault, request: Value) -> Value {
        serde_json::to_value(handle_line(vault, &request.to_string())).unwrap()
    }

    #[test]
    fn test_parse_move_uses_camel_case_fields() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"id":7,"op":"move","oldPath":"a.md","newPath":"b.md"}"#)
                .unwrap();
        assert_eq!(envelope.id, Some(json!(7)));
        assert_eq!(
            envelope.request,
            Request::Move {
                old_path: Some("a.md".to_string()),
                new_path: Some("b.md".to_string()),
            }
        );
    }

    #[test]
    fn test_write_distinguishes_absent_and_empty_content() {
        let (_dir, vault) = vault();

        let absent = call(&vault, json!({"op": "write", "path": "a.md"}));
        assert_eq!(absent["status"], 400);
        assert_eq!(absent["body"]["kind"], "badRequest");

        let null = call(&vault, json!({"op": "write", "path": "a.md", "content": null}));
        assert_eq!(null["status"], 400);

        let empty = call(&vault, json!({"op": "write", "path": "a.md", "content": ""}));
        assert_eq!(empty["status"], 200);
        assert_eq!(empty["body"], json!({"success": true}));
        assert_eq!(vault.read("a.md").unwrap(), "");
    }

    #[test]
    fn test_missing_fields_are_bad_requests() {
        let (_dir, vault) = vault();
        for request in [
            json!({"op": "read"}),
            json!({"op": "read", "path": ""}),
            json!({"op": "create", "path": "x"}),
            json!({"op": "create", "type": "file"}),
            json!({"op": "create", "path": "x", "type": "symlink"}),
            json!({"op": "delete"}),
            json!({"op": "move", "oldPath": "a"}),
            json!({"op": "moveInto", "folder": "a"}),
            json!({"op": "import", "name": "a.md"}),
        ] {
            let response = call(&vault, request.clone());
            assert_eq!(response["status"], 400, "{request}");
        }
    }

    #[test]
    fn test_malformed_and_unknown_ops() {
        let (_dir, vault) = vault();
        let response = handle_line(&vault, "{not json");
        assert_eq!(response.status, 400);
        assert!(response.id.is_none());

        let response = call(&vault, json!({"id": "x1", "op": "format"}));
        assert_eq!(response["status"], 400);
        assert_eq!(response["id"], "x1");
    }

    #[test]
    fn test_status_codes_per_error_kind() {
        let (_dir, vault) = vault();
        vault.write("a.md", "A").unwrap();
        vault.write("b.md", "B").unwrap();

        let denied = call(&vault, json!({"op": "read", "path": "../etc/passwd"}));
        assert_eq!(denied["status"], 403);
        assert_eq!(denied["body"]["kind"], "accessDenied");

        let missing = call(&vault, json!({"op": "read", "path": "nope.md"}));
        assert_eq!(missing["status"], 404);

        let exists = call(&vault, json!({"op": "move", "oldPath": "a.md", "newPath": "b.md"}));
        assert_eq!(exists["status"], 409);
        assert!(exists["body"]["error"].as_str().unwrap().contains("b.md"));

        let io = call(&vault, json!({"op": "write", "path": "no/parent.md", "content": "x"}));
        assert_eq!(io["status"], 500);
        assert_eq!(io["body"]["kind"], "io");
    }

    #[test]
    fn test_list_read_and_id_echo() {
        let (_dir, vault) = vault();
        call(&vault, json!({"op": "create", "path": "notes", "type": "folder"}));
        call(&vault, json!({"op": "write", "path": "notes/todo.md", "content": "- buy milk"}));

        let list = call(&vault, json!({"id": 1, "op": "list"}));
        assert_eq!(list["id"], 1);
        assert_eq!(list["status"], 200);
        assert_eq!(
            list["body"]["tree"],
            json!([{
                "name": "notes",
                "path": "notes",
                "type": "folder",
                "children": [{"name": "todo.md", "path": "notes/todo.md", "type": "file"}]
            }])
        );

        let read = call(&vault, json!({"id": 2, "op": "read", "path": "notes/todo.md"}));
        assert_eq!(read["body"], json!({"content": "- buy milk"}));
    }

    #[test]
    fn test_move_into_and_import_report_paths() {
        let (_dir, vault) = vault();
        vault.create("inbox", NodeKind::Folder).unwrap();

        let imported = call(
            &vault,
            json!({"op": "import", "name": "C:\\tmp\\idea.md", "content": "idea"}),
        );
        assert_eq!(imported["body"], json!({"success": true, "path": "idea.md"}));

        let moved = call(&vault, json!({"op": "moveInto", "path": "idea.md", "folder": "inbox"}));
        assert_eq!(moved["body"], json!({"success": true, "path": "inbox/idea.md"}));
        assert_eq!(vault.read("inbox/idea.md").unwrap(), "idea");
    }
}
