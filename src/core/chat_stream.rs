use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;

use crate::api::{GenerateContentRequest, GenerateContentResponse};
use crate::core::session::Source;
use crate::core::title::{resolve_title, title_prompt};
use crate::utils::url::construct_api_url;

/// Events emitted by background API tasks, tagged with the session they
/// belong to so late arrivals land in the right transcript.
#[derive(Clone, Debug)]
pub enum ChatEvent {
    /// A streamed piece of the reply. `delta` holds new text; `sources`
    /// holds any web grounding attached to this chunk.
    Fragment {
        session_id: String,
        delta: String,
        sources: Vec<Source>,
    },
    /// The stream failed. Terminal: no `Completed` follows.
    Failed { session_id: String, detail: String },
    /// The stream finished cleanly.
    Completed { session_id: String },
    /// A generated session title, already resolved against its fallback.
    TitleReady { session_id: String, title: String },
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(
    payload: &str,
    session_id: &str,
    tx: &mpsc::UnboundedSender<(ChatEvent, u64)>,
    stream_id: u64,
) -> bool {
    if payload.is_empty() {
        return false;
    }

    match serde_json::from_str::<GenerateContentResponse>(payload) {
        Ok(response) => {
            if response.error.is_some() {
                let _ = tx.send((
                    ChatEvent::Failed {
                        session_id: session_id.to_string(),
                        detail: format_api_error(payload),
                    },
                    stream_id,
                ));
                return true;
            }

            if let Some(reason) = response.finish_reason() {
                tracing::debug!(finish_reason = reason, "stream chunk carries finish reason");
            }

            let delta = response.text_delta();
            let sources = response.sources();
            if !delta.is_empty() || !sources.is_empty() {
                let _ = tx.send((
                    ChatEvent::Fragment {
                        session_id: session_id.to_string(),
                        delta,
                        sources,
                    },
                    stream_id,
                ));
            }
            false
        }
        Err(err) => {
            tracing::warn!(error = %err, payload, "skipping unparseable stream payload");
            false
        }
    }
}

fn process_sse_line(
    line: &str,
    session_id: &str,
    tx: &mpsc::UnboundedSender<(ChatEvent, u64)>,
    stream_id: u64,
) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, session_id, tx, stream_id))
        .unwrap_or(false)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                serde_json::Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{}\n```", trimmed)
    } else {
        format!("API Error:\n```\n{}\n```", trimmed)
    }
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request: GenerateContentRequest,
    pub session_id: String,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

pub struct TitleParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub first_message: String,
    pub session_id: String,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(ChatEvent, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(ChatEvent, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                base_url,
                api_key,
                model,
                request,
                session_id,
                cancel_token,
                stream_id,
            } = params;

            tokio::select! {
                _ = async {
                    let chat_url = construct_api_url(
                        &base_url,
                        &format!("models/{model}:streamGenerateContent"),
                    );

                    match client
                        .post(chat_url)
                        .query(&[("alt", "sse")])
                        .header("x-goog-api-key", &api_key)
                        .json(&request)
                        .send()
                        .await
                    {
                        Ok(response) => {
                            if !response.status().is_success() {
                                let error_text = response
                                    .text()
                                    .await
                                    .unwrap_or_else(|_| "<no body>".to_string());
                                let _ = tx_clone.send((
                                    ChatEvent::Failed {
                                        session_id: session_id.clone(),
                                        detail: format_api_error(&error_text),
                                    },
                                    stream_id,
                                ));
                                return;
                            }

                            let mut stream = response.bytes_stream();
                            let mut buffer: Vec<u8> = Vec::new();

                            while let Some(chunk) = stream.next().await {
                                if cancel_token.is_cancelled() {
                                    return;
                                }

                                let chunk_bytes = match chunk {
                                    Ok(bytes) => bytes,
                                    Err(err) => {
                                        let _ = tx_clone.send((
                                            ChatEvent::Failed {
                                                session_id: session_id.clone(),
                                                detail: format_api_error(&err.to_string()),
                                            },
                                            stream_id,
                                        ));
                                        return;
                                    }
                                };
                                buffer.extend_from_slice(&chunk_bytes);

                                while let Some(newline_pos) = memchr(b'\n', &buffer) {
                                    let line_str = match std::str::from_utf8(&buffer[..newline_pos]) {
                                        Ok(s) => s.trim(),
                                        Err(err) => {
                                            tracing::warn!(error = %err, "invalid UTF-8 in stream");
                                            buffer.drain(..=newline_pos);
                                            continue;
                                        }
                                    };

                                    let should_end = process_sse_line(
                                        line_str,
                                        &session_id,
                                        &tx_clone,
                                        stream_id,
                                    );
                                    buffer.drain(..=newline_pos);
                                    if should_end {
                                        return;
                                    }
                                }
                            }

                            let _ = tx_clone.send((
                                ChatEvent::Completed {
                                    session_id: session_id.clone(),
                                },
                                stream_id,
                            ));
                        }
                        Err(err) => {
                            let _ = tx_clone.send((
                                ChatEvent::Failed {
                                    session_id: session_id.clone(),
                                    detail: format_api_error(&err.to_string()),
                                },
                                stream_id,
                            ));
                        }
                    }
                } => {}
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    /// Ask the model for a session title in the background. Always emits
    /// `TitleReady`: a failed or implausible response resolves to the
    /// first-message fallback instead of going silent.
    pub fn spawn_title(&self, params: TitleParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let TitleParams {
                client,
                base_url,
                api_key,
                model,
                first_message,
                session_id,
                stream_id,
            } = params;

            let request = GenerateContentRequest::title(&title_prompt(&first_message));
            let title_url =
                construct_api_url(&base_url, &format!("models/{model}:generateContent"));

            let candidate = match client
                .post(title_url)
                .header("x-goog-api-key", &api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    match response.json::<GenerateContentResponse>().await {
                        Ok(body) => body.text_delta(),
                        Err(err) => {
                            tracing::warn!(error = %err, "title response did not parse");
                            String::new()
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!(status = %response.status(), "title request rejected");
                    String::new()
                }
                Err(err) => {
                    tracing::warn!(error = %err, "title request failed");
                    String::new()
                }
            };

            let title = resolve_title(&candidate, &first_message);
            let _ = tx_clone.send((ChatEvent::TitleReady { session_id, title }, stream_id));
        });
    }
}
