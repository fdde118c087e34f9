// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks. The decoder buffers partial lines, joins
//! consecutive `data:` lines of one event with `\n`, and yields the event data
//! when a blank line terminates the event. Comment lines and the `event`,
//! `id` and `retry` fields are ignored.

/// Stateful decoder for one server-sent-events stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line.
    pending: Vec<u8>,
    /// `data:` lines collected for the event being assembled.
    data: Vec<String>,
}

impl SseDecoder {
    /// Create a decoder with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body, returning the data of every completed event.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let event = self.data.join("\n");
            self.data.clear();
            return Some(event);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
