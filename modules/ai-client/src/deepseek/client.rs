use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::error::AiError;
use crate::traits::{ChunkStream, StreamChunk};
use crate::util::truncate_to_char_boundary;

pub(crate) const DEEPSEEK_API_URL: &str = "https://api.deepseek.com";
/// Error bodies beyond this are cut before they reach logs and errors.
const MAX_ERROR_BODY_BYTES: usize = 512;

pub(crate) struct DeepSeekClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl DeepSeekClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: DEEPSEEK_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| AiError::Config(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response, AiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let body = truncate_to_char_boundary(&body, MAX_ERROR_BODY_BYTES).to_string();
            return Err(AiError::Http { status, body });
        }

        Ok(response)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        debug!(model = %request.model, "DeepSeek chat request");
        let response = self.post(request).await?;
        Ok(response.json().await?)
    }

    /// Server-sent events stream. Transport failures after the response
    /// started arrive as a trailing `StreamChunk::Error`.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<ChunkStream, AiError> {
        debug!(model = %request.model, "DeepSeek streaming chat request");
        let response = self.post(request).await?;
        Ok(sse_chunks(response.bytes_stream()))
    }
}

/// Frame a raw SSE body into chunks. Bytes are buffered until a full line
/// arrives, so a UTF-8 character split across network reads decodes intact.
/// Stops after the first `Done` or `Error`.
pub(crate) fn sse_chunks<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let stream = async_stream::stream! {
        let mut body = Box::pin(body);
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(next) = body.next().await {
            match next {
                Ok(bytes) => buffer.extend_from_slice(bytes.as_ref()),
                Err(e) => {
                    yield StreamChunk::Error(e.to_string());
                    return;
                }
            }

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(event) = decode_sse_line(&line) {
                    let terminal = !matches!(event, StreamChunk::Token(_));
                    yield event;
                    if terminal {
                        return;
                    }
                }
            }
        }
        if let Some(event) = decode_sse_line(&buffer) {
            yield event;
        }
    };

    Box::pin(stream)
}

fn decode_sse_line(line: &[u8]) -> Option<StreamChunk> {
    match std::str::from_utf8(line) {
        Ok(line) => parse_sse_line(line),
        Err(e) => Some(StreamChunk::Error(format!("invalid UTF-8 in stream: {e}"))),
    }
}

/// Interpret one SSE line. Comments, blank lines and empty deltas yield
/// nothing.
pub(crate) fn parse_sse_line(line: &str) -> Option<StreamChunk> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() {
        return None;
    }
    if data == "[DONE]" {
        return Some(StreamChunk::Done);
    }

    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => return Some(StreamChunk::Error(format!("malformed stream event: {e}"))),
    };

    if let Some(error) = event.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Some(StreamChunk::Error(message));
    }

    let token: String = event
        .choices
        .into_iter()
        .filter_map(|c| c.delta.and_then(|d| d.content))
        .collect();

    if token.is_empty() {
        None
    } else {
        Some(StreamChunk::Token(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_line_yields_token() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#;
        assert_eq!(parse_sse_line(line), Some(StreamChunk::Token("Hel".into())));
    }

    #[test]
    fn done_marker_yields_done() {
        assert_eq!(parse_sse_line("data: [DONE]\n"), Some(StreamChunk::Done));
    }

    #[test]
    fn error_payload_yields_error() {
        let line = r#"data: {"error":{"message":"rate limited"}}"#;
        assert_eq!(
            parse_sse_line(line),
            Some(StreamChunk::Error("rate limited".into()))
        );
    }

    #[test]
    fn keepalive_and_empty_delta_are_skipped() {
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line(""), None);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            None
        );
    }

    #[test]
    fn garbage_data_yields_error() {
        assert!(matches!(
            parse_sse_line("data: {not json"),
            Some(StreamChunk::Error(_))
        ));
    }

    type Body = Vec<Result<Vec<u8>, std::io::Error>>;

    fn body(pieces: &[&[u8]]) -> Body {
        pieces.iter().map(|p| Ok(p.to_vec())).collect()
    }

    async fn framed(body: Body) -> Vec<StreamChunk> {
        sse_chunks(futures::stream::iter(body)).collect().await
    }

    #[tokio::test]
    async fn multibyte_char_split_across_reads_is_intact() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"Café\"}}]}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let chunks = framed(body(&[&line[..split], &line[split..], b"data: [DONE]\n"])).await;
        assert_eq!(
            chunks,
            vec![StreamChunk::Token("Café".into()), StreamChunk::Done]
        );
    }

    #[tokio::test]
    async fn line_split_across_reads_is_joined() {
        let chunks = framed(body(&[
            b"data: {\"choices\":[{\"del",
            b"ta\":{\"content\":\"Hel\"}}]}\n\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
            b"data: [DO",
            b"NE]\n",
        ]))
        .await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Token("Hel".into()),
                StreamChunk::Token("lo".into()),
                StreamChunk::Done,
            ]
        );
    }

    #[tokio::test]
    async fn unterminated_last_line_is_parsed() {
        let line: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}";
        let chunks = framed(body(&[line])).await;
        assert_eq!(chunks, vec![StreamChunk::Token("x".into())]);
    }

    #[tokio::test]
    async fn nothing_after_done_is_read() {
        let chunks = framed(body(&[
            b"data: [DONE]\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        ]))
        .await;
        assert_eq!(chunks, vec![StreamChunk::Done]);
    }

    #[tokio::test]
    async fn transport_error_ends_the_stream() {
        let mut pieces = body(&[b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n"]);
        pieces.push(Err(std::io::Error::other("connection reset")));
        let chunks = framed(pieces).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::Token("a".into()),
                StreamChunk::Error("connection reset".into()),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_an_error() {
        let chunks = framed(body(&[b"data: \xff\xfe\n"])).await;
        assert!(matches!(chunks.as_slice(), [StreamChunk::Error(_)]));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = DeepSeekClient::new("sk-test").with_base_url("https://proxy.local/v1/");
        assert_eq!(client.base_url, "https://proxy.local/v1");
    }
}
