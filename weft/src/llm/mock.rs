//! Scripted model client for tests and offline runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::conversation::Turn;
use crate::error::OracleError;
use crate::llm::{ModelClient, ModelResponse};
use crate::stream::TokenChunk;
use crate::tools::ToolSpec;

/// Plays back a fixed script of [`ModelResponse`]s, one per completion call.
///
/// When the script runs out the last entry repeats, so a single
/// `ToolCalls` entry models a model that never converges. Streaming replays
/// the most recent final answer, whole or character by character, and can be
/// made to drop the connection mid-reply for failure-path tests.
pub struct MockModel {
    script: Vec<ModelResponse>,
    cursor: AtomicUsize,
    last_final: Mutex<Option<String>>,
    stream_by_char: AtomicBool,
    fail_stream_after: Option<usize>,
}

impl MockModel {
    /// A model that always answers `text` directly.
    pub fn answering(text: impl Into<String>) -> Self {
        Self::scripted(vec![ModelResponse::FinalAnswer(text.into())])
    }

    /// A model that plays `script` in order, repeating the final entry.
    pub fn scripted(script: Vec<ModelResponse>) -> Self {
        Self {
            script,
            cursor: AtomicUsize::new(0),
            last_final: Mutex::new(None),
            stream_by_char: AtomicBool::new(false),
            fail_stream_after: None,
        }
    }

    /// Streams answers one character per chunk instead of a single chunk.
    pub fn with_stream_by_char(self) -> Self {
        self.stream_by_char.store(true, Ordering::SeqCst);
        self
    }

    /// Makes streaming emit `chunks` chunks and then fail with a provider
    /// error, leaving the reply incomplete.
    pub fn with_stream_failure_after(mut self, chunks: usize) -> Self {
        self.fail_stream_after = Some(chunks);
        self
    }

    /// How many completion calls have been made.
    pub fn completions(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    fn last_final_text(&self) -> Option<String> {
        self.last_final
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record_final(&self, text: &str) {
        *self.last_final.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_string());
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn complete(
        &self,
        _turns: &[Turn],
        _tools: &[ToolSpec],
    ) -> Result<ModelResponse, OracleError> {
        if self.script.is_empty() {
            return Err(OracleError::Provider("mock script is empty".to_string()));
        }
        let call = self.cursor.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.script.len() - 1);
        let response = self.script[index].clone();
        if let ModelResponse::FinalAnswer(ref text) = response {
            self.record_final(text);
        }
        Ok(response)
    }

    async fn complete_stream(
        &self,
        turns: &[Turn],
        tools: &[ToolSpec],
        chunk_tx: mpsc::Sender<TokenChunk>,
    ) -> Result<String, OracleError> {
        let text = match self.last_final_text() {
            Some(text) => text,
            // No prior final answer: consume the script like a real provider
            // that is asked to stream directly.
            None => match self.complete(turns, tools).await? {
                ModelResponse::FinalAnswer(text) => text,
                ModelResponse::ToolCalls(_) => {
                    return Err(OracleError::MalformedResponse(
                        "expected a text answer from the streaming call, got tool calls"
                            .to_string(),
                    ));
                }
            },
        };

        if let Some(limit) = self.fail_stream_after {
            let mut sent = 0usize;
            for c in text.chars() {
                if sent >= limit {
                    break;
                }
                let _ = chunk_tx.send(TokenChunk::new(c.to_string())).await;
                sent += 1;
            }
            return Err(OracleError::Provider("stream connection reset".to_string()));
        }

        if self.stream_by_char.load(Ordering::SeqCst) {
            for c in text.chars() {
                let _ = chunk_tx.send(TokenChunk::new(c.to_string())).await;
            }
        } else if !text.is_empty() {
            let _ = chunk_tx.send(TokenChunk::new(text.clone())).await;
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_plays_in_order_and_repeats_the_last_entry() {
        let model = MockModel::scripted(vec![
            ModelResponse::FinalAnswer("first".to_string()),
            ModelResponse::FinalAnswer("second".to_string()),
        ]);
        for expected in ["first", "second", "second"] {
            let response = model.complete(&[], &[]).await.unwrap();
            assert_eq!(response, ModelResponse::FinalAnswer(expected.to_string()));
        }
        assert_eq!(model.completions(), 3);
    }

    #[tokio::test]
    async fn stream_replays_the_answer_handed_out_by_complete() {
        let model = MockModel::answering("stream me").with_stream_by_char();
        let _ = model.complete(&[], &[]).await.unwrap();

        let (tx, mut rx) = mpsc::channel(64);
        let text = model.complete_stream(&[], &[], tx).await.unwrap();
        assert_eq!(text, "stream me");

        let mut reassembled = String::new();
        while let Ok(chunk) = rx.try_recv() {
            assert_eq!(chunk.text.chars().count(), 1);
            reassembled.push_str(&chunk.text);
        }
        assert_eq!(reassembled, "stream me");
    }

    #[tokio::test]
    async fn stream_failure_emits_partial_chunks_then_errors() {
        let model = MockModel::answering("abcdef").with_stream_failure_after(3);
        let _ = model.complete(&[], &[]).await.unwrap();

        let (tx, mut rx) = mpsc::channel(64);
        let err = model.complete_stream(&[], &[], tx).await.unwrap_err();
        assert!(matches!(err, OracleError::Provider(_)));

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[tokio::test]
    async fn empty_script_is_a_provider_error() {
        let model = MockModel::scripted(vec![]);
        let err = model.complete(&[], &[]).await.unwrap_err();
        assert!(matches!(err, OracleError::Provider(_)));
    }
}
