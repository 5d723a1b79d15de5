//! Stack trace extraction.
//!
//! Error stack traces arrive as raw text. A [`StackFrameExtractor`] splits that
//! text into [`RawFrame`]s, and [`frames_of`] maps them onto the report's
//! frame shape, where missing pieces degrade to empty strings instead of
//! failing the report.

use super::schema::StackFrame;
use crate::domain::ErrorInfo;

/// One frame as understood by an extractor. Any part may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    pub type_name: Option<String>,
    pub function_name: Option<String>,
    pub method_name: Option<String>,
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
}

/// Turns raw stack trace text into frames
pub trait StackFrameExtractor: Send + Sync {
    fn extract(&self, stack: &str) -> Vec<RawFrame>;
}

/// Default extractor.
///
/// Understands V8-style frames (`at Type.method (file:line:col)`) and Rust
/// `std::backtrace` frames (`N: path::func` followed by `at file:line:col`).
/// Lines that look like neither, such as the leading message line, are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackTraceParser;

impl StackFrameExtractor for StackTraceParser {
    fn extract(&self, stack: &str) -> Vec<RawFrame> {
        let mut frames = Vec::new();
        // Set while the last frame is a Rust frame still waiting for its location
        let mut awaiting_location = false;

        for line in stack.lines() {
            let line = line.trim();
            if let Some(function) = rust_frame_function(line) {
                frames.push(split_rust_function(function));
                awaiting_location = true;
                continue;
            }

            let Some(rest) = line.strip_prefix("at ") else {
                awaiting_location = false;
                continue;
            };

            // A Rust frame's location is bare; `fn (file:line:col)` starts a new V8 frame
            if awaiting_location && !has_function_part(rest) {
                if let Some(frame) = frames.last_mut() {
                    let (file, line_number) = split_location(rest);
                    frame.file_name = file;
                    frame.line_number = line_number;
                }
            } else {
                frames.push(parse_v8_frame(rest));
            }
            awaiting_location = false;
        }

        frames
    }
}

/// Render the stack of `error` as report frames
pub fn frames_of(error: &ErrorInfo, extractor: &dyn StackFrameExtractor) -> Vec<StackFrame> {
    let Some(stack) = error.stack.as_deref() else {
        return Vec::new();
    };

    extractor
        .extract(stack)
        .into_iter()
        .map(|frame| StackFrame {
            declaring_class: frame
                .type_name
                .or_else(|| frame.function_name.clone())
                .unwrap_or_default(),
            method_name: frame
                .method_name
                .or(frame.function_name)
                .unwrap_or_default(),
            file_name: frame.file_name.unwrap_or_default(),
            line_number: frame.line_number.unwrap_or(0),
        })
        .collect()
}

/// `"12: my_crate::module::func"` -> `"my_crate::module::func"`
fn rust_frame_function(line: &str) -> Option<&str> {
    let (index, function) = line.split_once(": ")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let function = function.trim();
    // Message lines such as "500: Internal Server Error" are not symbols
    if function.is_empty() || (function.contains(char::is_whitespace) && !function.contains("::")) {
        return None;
    }
    Some(function)
}

fn has_function_part(rest: &str) -> bool {
    rest.ends_with(')') && rest.contains(" (")
}

fn split_rust_function(function: &str) -> RawFrame {
    let function = strip_symbol_hash(function);
    let mut frame = RawFrame {
        function_name: Some(function.to_string()),
        ..RawFrame::default()
    };
    if let Some((path, method)) = function.rsplit_once("::") {
        frame.type_name = Some(path.to_string());
        frame.method_name = Some(method.to_string());
    }
    frame
}

/// Drop the `::h0123456789abcdef` suffix of a mangled symbol
fn strip_symbol_hash(function: &str) -> &str {
    match function.rsplit_once("::") {
        Some((head, tail))
            if tail.len() == 17
                && tail.starts_with('h')
                && tail[1..].bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => function,
    }
}

fn parse_v8_frame(rest: &str) -> RawFrame {
    let rest = rest.strip_prefix("async ").unwrap_or(rest);

    let (function, location) = match rest.strip_suffix(')').and_then(|r| r.split_once(" (")) {
        Some((function, location)) => (Some(function), location),
        None => (None, rest),
    };

    let (file_name, line_number) = split_location(location);
    let mut frame = RawFrame {
        file_name,
        line_number,
        ..RawFrame::default()
    };

    if let Some(function) = function {
        let function = function.strip_prefix("new ").unwrap_or(function);
        // "Type.method [as alias]"
        let (function, alias) = match function.split_once(" [as ") {
            Some((f, alias)) => (f, alias.strip_suffix(']')),
            None => (function, None),
        };

        match function.rsplit_once('.') {
            Some((type_name, method)) => {
                frame.type_name = Some(type_name.to_string());
                if method != "<anonymous>" {
                    frame.function_name = Some(function.to_string());
                    frame.method_name = Some(alias.unwrap_or(method).to_string());
                }
            }
            None if function != "<anonymous>" => {
                frame.function_name = Some(function.to_string());
                frame.method_name = alias.map(str::to_string);
            }
            None => {}
        }
    }

    frame
}

/// `"file.js:10:5"` -> `(Some("file.js"), Some(10))`
fn split_location(location: &str) -> (Option<String>, Option<u32>) {
    let location = location.trim();
    if location.is_empty() {
        return (None, None);
    }

    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let head = parts.next();

    match (head, middle, last) {
        (Some(file), Some(line), Some(_column)) if line.parse::<u32>().is_ok() => {
            (Some(file.to_string()), line.parse().ok())
        }
        (_, Some(_), Some(line)) if line.parse::<u32>().is_ok() => {
            let file = location.rsplit_once(':').map(|(file, _)| file.to_string());
            (file, line.parse().ok())
        }
        _ => (Some(location.to_string()), None),
    }
}
