//! MCP server loop (line-delimited JSON-RPC over stdio).

use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use serde_json::{Map, Value, json};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, ServerCapabilities, ServerInfo, Tool,
};

/// Maximum accepted request line (1MB).
pub const MAX_LINE_SIZE: usize = 1024 * 1024;

/// The application side of the server: tool discovery and execution.
///
/// Each `tools/call` runs on its own task, so `call_tool` futures must be
/// `Send` and the handler is shared behind an `Arc`.
pub trait ToolHandler: Send + Sync + 'static {
    /// Name and version reported in `initialize`.
    fn info(&self) -> ServerInfo;

    /// Optional usage hint sent to the client in `initialize`.
    fn instructions(&self) -> Option<String> {
        None
    }

    /// Tools advertised by `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool. Failures are reported in-band via `CallToolResult::error`.
    fn call_tool(
        &self,
        name: String,
        arguments: Map<String, Value>,
    ) -> impl Future<Output = CallToolResult> + Send;
}

/// A running MCP server bound to one handler.
pub struct Server<H> {
    handler: Arc<H>,
}

impl<H: ToolHandler> Server<H> {
    pub fn new(handler: H) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn serve_stdio(self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve requests read from `reader`, writing responses to `writer`.
    ///
    /// Returns once the reader hits EOF and every in-flight tool call has
    /// written its response. Lines longer than [`MAX_LINE_SIZE`] are
    /// discarded as they stream in and answered with an invalid-request error.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_responses(writer, rx));
        let mut calls = JoinSet::new();
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_SIZE));
        // A decode error is followed by a single `None` before the stream resumes.
        let mut recovering = false;

        info!(tools = self.handler.tools().len(), "MCP server ready");

        loop {
            let line = match lines.next().await {
                Some(Ok(line)) => line,
                None if recovering => {
                    recovering = false;
                    continue;
                }
                None => break,
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(max = MAX_LINE_SIZE, "dropping oversized request");
                    let err = Error::MessageTooLarge { max: MAX_LINE_SIZE };
                    let error = JsonRpcError::invalid_request(err.to_string());
                    send(&tx, JsonRpcResponse::failure(None, error));
                    recovering = true;
                    continue;
                }
                Some(Err(LinesCodecError::Io(e))) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!(error = %e, "request is not valid UTF-8");
                    let error = JsonRpcError::parse_error(e.to_string());
                    send(&tx, JsonRpcResponse::failure(None, error));
                    recovering = true;
                    continue;
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(e.into()),
            };

            while let Some(joined) = calls.try_join_next() {
                log_join(joined);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.dispatch(request, &tx, &mut calls),
                Err(e) => {
                    warn!(error = %e, "unparseable request");
                    let error = JsonRpcError::parse_error(e.to_string());
                    send(&tx, JsonRpcResponse::failure(None, error));
                }
            }
        }

        debug!(in_flight = calls.len(), "input closed, draining tool calls");
        while let Some(joined) = calls.join_next().await {
            log_join(joined);
        }

        drop(tx);
        writer_task.await.map_err(|_| Error::WriterClosed)??;
        info!("MCP server stopped");
        Ok(())
    }

    fn dispatch(
        &self,
        request: JsonRpcRequest,
        tx: &UnboundedSender<JsonRpcResponse>,
        calls: &mut JoinSet<()>,
    ) {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities::tools_only(),
                    server_info: self.handler.info(),
                    instructions: self.handler.instructions(),
                },
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.handler.tools(),
                },
            ),
            "tools/call" => {
                let params = request
                    .params
                    .map(serde_json::from_value::<CallToolParams>);
                let params = match params {
                    Some(Ok(params)) => params,
                    Some(Err(e)) => {
                        let error = JsonRpcError::invalid_params(e.to_string());
                        send(tx, JsonRpcResponse::failure(Some(id), error));
                        return;
                    }
                    None => {
                        let error = JsonRpcError::invalid_params("missing params");
                        send(tx, JsonRpcResponse::failure(Some(id), error));
                        return;
                    }
                };

                let handler = Arc::clone(&self.handler);
                let tx = tx.clone();
                calls.spawn(async move {
                    let CallToolParams { name, arguments } = params;
                    debug!(tool = %name, "tool call");
                    let call = async {
                        handler
                            .call_tool(name.clone(), arguments.unwrap_or_default())
                            .await
                    };
                    let response = match AssertUnwindSafe(call).catch_unwind().await {
                        Ok(result) => JsonRpcResponse::success(id, result),
                        Err(_) => {
                            error!(tool = %name, "tool call panicked");
                            let error = JsonRpcError::internal(format!("tool {name} panicked"));
                            JsonRpcResponse::failure(Some(id), error)
                        }
                    };
                    send(&tx, response);
                });
                return;
            }
            other => JsonRpcResponse::failure(Some(id), JsonRpcError::method_not_found(other)),
        };

        send(tx, response);
    }
}

fn send(tx: &UnboundedSender<JsonRpcResponse>, response: JsonRpcResponse) {
    if tx.send(response).is_err() {
        error!("response writer is gone");
    }
}

fn log_join(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "tool call task failed");
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: UnboundedReceiver<JsonRpcResponse>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InputSchema;
    use tokio::io::AsyncReadExt;

    struct Echo;

    impl ToolHandler for Echo {
        fn info(&self) -> ServerInfo {
            ServerInfo {
                name: "echo".to_string(),
                version: "0.0.1".to_string(),
            }
        }

        fn tools(&self) -> Vec<Tool> {
            vec![
                Tool::new(
                    "echo",
                    "Echo the text argument",
                    InputSchema::new().string("text", "Text to echo").required("text"),
                ),
                Tool::new("boom", "Always panics", InputSchema::new()),
            ]
        }

        async fn call_tool(&self, name: String, arguments: Map<String, Value>) -> CallToolResult {
            match (name.as_str(), arguments.get("text").and_then(Value::as_str)) {
                ("echo", Some(text)) => CallToolResult::text(text),
                ("echo", None) => CallToolResult::error("missing text"),
                ("boom", _) => panic!("tool exploded"),
                _ => CallToolResult::error(format!("unknown tool: {name}")),
            }
        }
    }

    async fn run_reader<R: AsyncRead + Unpin>(input: R) -> Vec<Value> {
        let (server_end, mut client_end) = tokio::io::duplex(MAX_LINE_SIZE);
        Server::new(Echo).serve(input, server_end).await.unwrap();

        let mut output = String::new();
        client_end.read_to_string(&mut output).await.unwrap();
        output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    async fn run(lines: &[&str]) -> Vec<Value> {
        let mut input = lines.join("\n");
        input.push('\n');
        run_reader(input.as_bytes()).await
    }

    fn by_id(responses: &[Value], id: i64) -> &Value {
        responses.iter().find(|r| r["id"] == id).unwrap()
    }

    #[tokio::test]
    async fn initialize_and_list_tools() {
        let responses = run(&[
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        ])
        .await;

        assert_eq!(responses.len(), 2);
        let init = by_id(&responses, 1);
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["result"]["serverInfo"]["name"], "echo");
        let list = by_id(&responses, 2);
        assert_eq!(list["result"]["tools"][0]["name"], "echo");
        assert_eq!(list["result"]["tools"][0]["inputSchema"]["required"][0], "text");
    }

    #[tokio::test]
    async fn tool_call_round_trip() {
        let responses = run(&[
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"echo","arguments":{"text":"hi"}}}"#,
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"echo"}}"#,
        ])
        .await;

        let ok = by_id(&responses, 7);
        assert_eq!(ok["result"]["content"][0]["text"], "hi");
        assert!(ok["result"].get("isError").is_none());
        let failed = by_id(&responses, 8);
        assert_eq!(failed["result"]["isError"], true);
    }

    #[tokio::test]
    async fn protocol_errors() {
        let responses = run(&[
            "not json",
            r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call"}"#,
            r#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#,
        ])
        .await;

        assert_eq!(responses.len(), 4);
        let parse = responses.iter().find(|r| r["id"].is_null()).unwrap();
        assert_eq!(parse["error"]["code"], crate::error::PARSE_ERROR);
        assert_eq!(by_id(&responses, 3)["error"]["code"], crate::error::METHOD_NOT_FOUND);
        assert_eq!(by_id(&responses, 4)["error"]["code"], crate::error::INVALID_PARAMS);
        assert_eq!(by_id(&responses, 5)["result"], json!({}));
    }

    #[tokio::test]
    async fn panicking_tool_still_gets_a_response() {
        let responses = run(&[
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"boom"}}"#,
            r#"{"jsonrpc":"2.0","id":10,"method":"tools/call","params":{"name":"echo","arguments":{"text":"after"}}}"#,
        ])
        .await;

        let failed = by_id(&responses, 9);
        assert_eq!(failed["error"]["code"], crate::error::INTERNAL_ERROR);
        assert_eq!(failed["error"]["message"], "tool boom panicked");
        assert_eq!(by_id(&responses, 10)["result"]["content"][0]["text"], "after");
    }

    #[tokio::test]
    async fn oversized_line_is_discarded_while_streaming() {
        let oversized = tokio::io::repeat(b'x').take(4 * MAX_LINE_SIZE as u64);
        let rest = &b"\n{\"jsonrpc\":\"2.0\",\"id\":11,\"method\":\"ping\"}\n"[..];
        let responses = run_reader(oversized.chain(rest)).await;

        assert_eq!(responses.len(), 2);
        let rejected = responses.iter().find(|r| r["id"].is_null()).unwrap();
        assert_eq!(rejected["error"]["code"], crate::error::INVALID_REQUEST);
        assert_eq!(by_id(&responses, 11)["result"], json!({}));
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let template = r#"{"jsonrpc":"2.0","id":12,"method":"ping","params":{"pad":"PAD"}}"#;
        let pad = "p".repeat(MAX_LINE_SIZE - (template.len() - "PAD".len()));
        let padded = template.replace("PAD", &pad);
        assert_eq!(padded.len(), MAX_LINE_SIZE);

        let responses = run(&[&padded]).await;
        assert_eq!(by_id(&responses, 12)["result"], json!({}));
    }
}
