// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Delivery batch of Line Protocol lines.
//!
//! One batch is one request to the sink: lines joined by `\n`, with a
//! trailing newline.

/// Ordered Line Protocol lines produced by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    lines: Vec<String>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line. Empty strings are ignored.
    pub fn push(&mut self, line: String) {
        if !line.is_empty() {
            self.lines.push(line);
        }
    }

    /// Append every `Some` line in order.
    pub fn extend<I: IntoIterator<Item = Option<String>>>(&mut self, lines: I) {
        for line in lines.into_iter().flatten() {
            self.push(line);
        }
    }

    /// Request body: newline-joined with a trailing newline.
    pub fn to_body(&self) -> String {
        let mut body = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            body.push_str(line);
            body.push('\n');
        }
        body
    }

    /// Lines in delivery order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Get the current number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
