//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes one photo session as tools an AI agent can call: upload a dish
//! photo, transform it, enlarge or download the result, clear, and inspect
//! status. Requests are handled one at a time, so at most one transform is
//! in flight.

use crate::error::{CulinaryError, Result};
use crate::photo::{build_prompt, ImageFormat, PhotoTransformer, TransformMode, UploadedImage};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Ceiling for a single transform, including the model round trip.
const TRANSFORM_TIMEOUT: Duration = Duration::from_secs(600);

/// Decodes a base64 string that may be imperfectly formatted.
///
/// LLMs frequently send base64 with issues that strict decoders reject:
/// - Data URI prefix (`data:image/png;base64,...`)
/// - Missing padding (`=` characters)
/// - Embedded whitespace or newlines
fn decode_base64_lenient(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;

    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD.decode(&cleaned)
}

/// MIME type from a `data:<mime>;base64,` prefix, if present.
fn data_url_mime(input: &str) -> Option<&str> {
    input
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(mime, _)| mime)
}

/// Decodes an uploaded base64 image or data URL, detecting its MIME type
/// when none is given.
fn decode_upload(image: &str, mime_type: Option<&str>) -> Result<UploadedImage> {
    let data = decode_base64_lenient(image)
        .map_err(|e| CulinaryError::FileRead(format!("invalid base64 in image: {e}")))?;
    let mime = mime_type
        .or_else(|| data_url_mime(image))
        .or_else(|| ImageFormat::from_magic_bytes(&data).map(|f| f.mime_type()))
        .unwrap_or("application/octet-stream");
    UploadedImage::from_bytes(&data, mime)
}

/// Validates that an output path is safe to write to.
///
/// Rejects paths containing directory traversal (`..`) components.
fn validate_output_path(path: &str) -> std::result::Result<(), String> {
    let path = std::path::Path::new(path);
    for component in path.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err("Path must not contain '..' components".into());
        }
    }
    Ok(())
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    fn text(id: Value, text: impl Into<String>) -> Self {
        Self::success(
            id,
            json!({ "content": [{ "type": "text", "text": text.into() }] }),
        )
    }
}

/// MCP tool definition.
#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    #[serde(default)]
    path: Option<String>,
    /// Base64 image or data URL.
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TransformParams {
    #[serde(default)]
    mode: Option<TransformMode>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DownloadParams {
    #[serde(default)]
    output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PromptParams {
    #[serde(default)]
    mode: TransformMode,
    #[serde(default)]
    label: Option<String>,
}

/// MCP server around a single photo session.
pub struct McpServer {
    initialized: bool,
    session: Session,
    transformer: PhotoTransformer,
}

impl McpServer {
    /// Creates a server that sends transforms through `transformer`.
    pub fn new(transformer: PhotoTransformer) -> Self {
        Self {
            initialized: false,
            session: Session::new(),
            transformer,
        }
    }

    /// Run the MCP server, reading from stdin and writing to stdout.
    pub async fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let response = self.handle_message(&line).await;
            if let Some(resp) = response {
                let json = serde_json::to_string(&resp).unwrap_or_else(|e| {
                    json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32603, "message": e.to_string()}}).to_string()
                });
                writeln!(stdout, "{}", json)?;
                stdout.flush()?;
            }
        }

        Ok(())
    }

    async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    -32700,
                    format!("Parse error: {}", e),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                -32600,
                "Invalid JSON-RPC version",
            ));
        }

        let id = request.id.clone().unwrap_or(Value::Null);

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(id, &request.params)),
            "initialized" | "notifications/initialized" => None,
            "tools/list" => Some(self.handle_tools_list(id)),
            "tools/call" => Some(self.handle_tools_call(id, &request.params).await),
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            _ => Some(JsonRpcResponse::error(
                id,
                -32601,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    fn handle_initialize(&mut self, id: Value, params: &Value) -> JsonRpcResponse {
        self.initialized = true;

        if let Some(client_info) = params.get("clientInfo") {
            tracing::info!(
                client = client_info.get("name").and_then(|v| v.as_str()).unwrap_or("unknown"),
                version = client_info.get("version").and_then(|v| v.as_str()).unwrap_or("unknown"),
                "mcp client connected"
            );
        }

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "culinary",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let mode_schema = json!({
            "type": "string",
            "enum": ["reimagine", "polish"],
            "description": "reimagine: contextual plating for the dish; polish: white-plate 45-degree studio shot"
        });

        let tools = vec![
            Tool {
                name: "upload_photo",
                description: "Select a food photo (PNG, JPEG or WebP) for transformation. Replaces any previous photo and clears the label.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path to an image file"
                        },
                        "image": {
                            "type": "string",
                            "description": "Base64-encoded image or data URL (alternative to path)"
                        },
                        "mime_type": {
                            "type": "string",
                            "enum": ["image/png", "image/jpeg", "image/webp"],
                            "description": "MIME type of raw base64 input (detected when omitted)"
                        }
                    },
                    "required": []
                }),
            },
            Tool {
                name: "transform_photo",
                description: "Turn the uploaded photo into a professional food photograph using Gemini.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "mode": mode_schema.clone(),
                        "label": {
                            "type": "string",
                            "description": "Optional menu item name, e.g. Signature Angus Burger"
                        }
                    },
                    "required": []
                }),
            },
            Tool {
                name: "enlarge_photo",
                description: "Return the generated photo at full size.",
                input_schema: json!({ "type": "object", "properties": {}, "required": [] }),
            },
            Tool {
                name: "download_photo",
                description: "Save the generated photo as professional-food-photo.jpeg.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "output_dir": {
                            "type": "string",
                            "description": "Directory to save into (default: current directory)"
                        }
                    },
                    "required": []
                }),
            },
            Tool {
                name: "clear_session",
                description: "Forget the uploaded photo, result, error and label.",
                input_schema: json!({ "type": "object", "properties": {}, "required": [] }),
            },
            Tool {
                name: "session_status",
                description: "Report the session status, mode, label and any error.",
                input_schema: json!({ "type": "object", "properties": {}, "required": [] }),
            },
            Tool {
                name: "build_prompt",
                description: "Show the prompt that would be sent for a mode and label.",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "mode": mode_schema,
                        "label": { "type": "string" }
                    },
                    "required": []
                }),
            },
        ];

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&mut self, id: Value, params: &Value) -> JsonRpcResponse {
        let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match tool_name {
            "upload_photo" => self.upload_photo(id, arguments),
            "transform_photo" => self.transform_photo(id, arguments).await,
            "enlarge_photo" => self.enlarge_photo(id),
            "download_photo" => self.download_photo(id, arguments),
            "clear_session" => {
                self.session.clear();
                JsonRpcResponse::text(id, "Session cleared.")
            }
            "session_status" => self.session_status(id),
            "build_prompt" => Self::prompt(id, arguments),
            _ => JsonRpcResponse::error(id, -32602, format!("Unknown tool: {}", tool_name)),
        }
    }

    fn upload_photo(&mut self, id: Value, arguments: Value) -> JsonRpcResponse {
        let params: UploadParams = match serde_json::from_value(arguments) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, format!("Invalid parameters: {}", e));
            }
        };

        let selected = match (&params.path, &params.image) {
            (Some(path), None) => self.session.select_file(path),
            (None, Some(image)) => match self.session.begin_upload() {
                Ok(ticket) => {
                    let decoded = decode_upload(image, params.mime_type.as_deref());
                    self.session.finish_upload(ticket, decoded)
                }
                Err(e) => Err(e),
            },
            _ => {
                return JsonRpcResponse::error(
                    id,
                    -32602,
                    "Provide exactly one of 'path' or 'image'",
                );
            }
        };

        match selected {
            Ok(image) => JsonRpcResponse::text(
                id,
                format!("Photo uploaded ({}). Ready to transform.", image.mime_type()),
            ),
            Err(e) => JsonRpcResponse::error(id, -32602, e.to_string()),
        }
    }

    async fn transform_photo(&mut self, id: Value, arguments: Value) -> JsonRpcResponse {
        let params: TransformParams = match serde_json::from_value(arguments) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, format!("Invalid parameters: {}", e));
            }
        };

        if let Some(mode) = params.mode {
            if let Err(e) = self.session.set_mode(mode) {
                return JsonRpcResponse::error(id, -32602, e.to_string());
            }
        }
        if let Some(label) = params.label {
            if let Err(e) = self.session.set_label(label) {
                return JsonRpcResponse::error(id, -32602, e.to_string());
            }
        }

        match self
            .session
            .transform_within(&self.transformer, TRANSFORM_TIMEOUT)
            .await
        {
            Ok(photo) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [
                        { "type": "image", "data": photo.base64(), "mimeType": photo.mime_type() },
                        { "type": "text", "text": "Professional photo ready. Use download_photo to save it." }
                    ]
                }),
            ),
            Err(e) => {
                let message = self
                    .session
                    .error_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.user_message());
                JsonRpcResponse::error(id, -32603, message)
            }
        }
    }

    fn enlarge_photo(&self, id: Value) -> JsonRpcResponse {
        match self.session.result() {
            Some(photo) => JsonRpcResponse::success(
                id,
                json!({
                    "content": [
                        { "type": "image", "data": photo.base64(), "mimeType": photo.mime_type() }
                    ]
                }),
            ),
            None => JsonRpcResponse::error(id, -32602, "No generated photo to enlarge."),
        }
    }

    fn download_photo(&self, id: Value, arguments: Value) -> JsonRpcResponse {
        let params: DownloadParams = match serde_json::from_value(arguments) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, format!("Invalid parameters: {}", e));
            }
        };

        let dir = params.output_dir.unwrap_or_else(|| ".".to_string());
        if let Err(msg) = validate_output_path(&dir) {
            return JsonRpcResponse::error(id, -32602, msg);
        }

        match self.session.download(&dir) {
            Ok(path) => JsonRpcResponse::text(id, format!("Saved {}", path.display())),
            Err(e) => JsonRpcResponse::error(id, -32603, e.user_message()),
        }
    }

    fn session_status(&self, id: Value) -> JsonRpcResponse {
        let status = json!({
            "status": self.session.status(),
            "mode": self.session.mode(),
            "label": self.session.label(),
            "has_photo": self.session.image().is_some(),
            "has_result": self.session.result().is_some(),
            "error": self.session.error_message(),
            "model": self.transformer.model_name(),
        });
        JsonRpcResponse::text(id, serde_json::to_string_pretty(&status).unwrap_or_default())
    }

    fn prompt(id: Value, arguments: Value) -> JsonRpcResponse {
        match serde_json::from_value::<PromptParams>(arguments) {
            Ok(p) => JsonRpcResponse::text(id, build_prompt(p.mode, p.label.as_deref())),
            Err(e) => JsonRpcResponse::error(id, -32602, format!("Invalid parameters: {}", e)),
        }
    }
}
