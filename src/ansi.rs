// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ANSI/line-ending normalization applied to console output at read time.
//!
//! Raw bytes are kept as-is in the session buffer; stripping only happens
//! when an agent reads it, so the multiplexer can replay the exact stream
//! if a future reader needs un-stripped bytes.

use regex::Regex;
use std::sync::LazyLock;

/// CSI and simple-ESC sequences: `ESC ( [@-Z\-_] | [ [0-?]* [ -/]* [@-~] )`.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    // Pattern is a fixed literal; a build that can't compile it is broken, not recoverable at runtime.
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1B(?:[@-Z\\\-_]|\[[0-?]*[ -/]*[@-~])").expect("static ansi regex is valid")
});

static THREE_OR_MORE_NEWLINES: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\n{3,}").expect("static newline regex is valid")
});

/// Strip ANSI escape sequences, fold CRLF/CR to LF, and collapse runs of
/// three-or-more LFs down to exactly two.
///
/// Invalid UTF-8 bytes are replaced (lossy decode) rather than rejected;
/// console streams frequently interleave control bytes with partial
/// multi-byte sequences split across reads.
pub fn strip(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let no_escapes = ANSI_ESCAPE.replace_all(&text, "");
    let folded = no_escapes.replace("\r\n", "\n").replace('\r', "\n");
    THREE_OR_MORE_NEWLINES.replace_all(&folded, "\n\n").into_owned()
}

#[cfg(test)]
#[path = "ansi_tests.rs"]
mod tests;
