//! # INI Codec
//!
//! Converts between a two-level settings document (module → key → string) and
//! INI text.
//!
//! ## Format
//!
//! - `;` and `#` start a comment that runs to the end of the physical line,
//!   unless the separator is escaped.
//! - `[module]` switches the current module. Keys before the first header
//!   belong to the default module, which is never written as a header.
//! - `key=value` stores a field. The line is split at the first unescaped `=`.
//! - `\` escapes the characters `\`, newline, `[`, `]`, `=`, `;`, `#`, `"`,
//!   `'`, `.` and `:`.
//! - A line whose content ends in an odd run of backslashes has an escaped
//!   line break: the next physical line continues the same logical line, so a
//!   value (or key, or module name) may span several lines.
//!
//! The codec never fails. Constructs it does not understand are skipped.
use indexmap::IndexMap;

use crate::settings::DEFAULT_MODULE;

const COMMENT_1: char = ';';
const COMMENT_2: char = '#';
const ESCAPE_CHAR: char = '\\';
const FIELD_SEPARATOR: char = '=';
const LINE_SEPARATOR: char = '\n';
const SECTION_START: char = '[';
const SECTION_END: char = ']';

/// Characters escaped on write, in escaping order. The escape character itself
/// comes first so backslashes inserted by later steps are never doubled.
pub const ESCAPE_CHARS: [char; 11] = [
    ESCAPE_CHAR,
    LINE_SEPARATOR,
    SECTION_START,
    SECTION_END,
    FIELD_SEPARATOR,
    COMMENT_1,
    COMMENT_2,
    '"',
    '\'',
    '.',
    ':',
];

/// Keys of one INI module, in file order
pub type IniModule = IndexMap<String, String>;

/// Parsed INI document: module → key → value
pub type IniDocument = IndexMap<String, IniModule>;

/// INI codec bound to a default module name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniCodec {
    default_module: String,
}

impl Default for IniCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MODULE)
    }
}

impl IniCodec {
    /// Create a codec that maps header-less keys to `default_module`
    pub fn new(default_module: impl Into<String>) -> Self {
        Self {
            default_module: default_module.into(),
        }
    }

    /// Name of the module that holds keys written before any header
    pub fn default_module(&self) -> &str {
        &self.default_module
    }

    /// Parse INI text into a document.
    pub fn parse(&self, text: &str) -> IniDocument {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

        let mut document = IniDocument::new();
        let mut current_module = self.default_module.clone();
        let mut pending: Option<String> = None;

        for physical in normalized.split(LINE_SEPARATOR) {
            let stripped = remove_comments(physical);

            let line = match pending.take() {
                Some(mut accumulated) => {
                    accumulated.push_str(&stripped);
                    accumulated
                }
                None => stripped,
            };

            if is_end_escaped(&line) {
                let mut accumulated = line;
                accumulated.push(LINE_SEPARATOR);
                pending = Some(accumulated);
                continue;
            }

            self.parse_line(&line, &mut current_module, &mut document);
        }

        // Input ended inside a continuation
        if let Some(line) = pending {
            self.parse_line(&line, &mut current_module, &mut document);
        }

        document
    }

    fn parse_line(&self, line: &str, current_module: &mut String, document: &mut IniDocument) {
        if line.trim().is_empty() {
            return;
        }

        if let Some(name) = line
            .strip_prefix(SECTION_START)
            .and_then(|rest| rest.strip_suffix(SECTION_END))
        {
            *current_module = unescape(trim_unescaped(name));
            return;
        }

        let Some(index) = find_field_separator(line) else {
            return;
        };

        let key = unescape(trim_unescaped(&line[..index]));
        let value = unescape(line[index + FIELD_SEPARATOR.len_utf8()..].trim_start());

        document
            .entry(current_module.clone())
            .or_default()
            .insert(key, value);
    }

    /// Serialize a document to INI text.
    ///
    /// The default module is written first and without a header; modules with
    /// no keys are omitted entirely.
    pub fn stringify(&self, document: &IniDocument) -> String {
        let mut ini = String::new();

        if let Some(keys) = document.get(&self.default_module) {
            write_fields(&mut ini, keys);
        }

        for (module, keys) in document {
            if *module == self.default_module || keys.is_empty() {
                continue;
            }

            if !ini.is_empty() {
                ini.push(LINE_SEPARATOR);
            }
            ini.push(SECTION_START);
            ini.push_str(&escape(module));
            ini.push(SECTION_END);
            ini.push(LINE_SEPARATOR);

            write_fields(&mut ini, keys);
        }

        ini
    }
}

fn write_fields(ini: &mut String, keys: &IniModule) {
    for (key, value) in keys {
        ini.push_str(&escape(key));
        ini.push(FIELD_SEPARATOR);
        ini.push_str(&escape(value));
        ini.push(LINE_SEPARATOR);
    }
}

/// Parse INI text using the default module name.
pub fn parse(text: &str) -> IniDocument {
    IniCodec::default().parse(text)
}

/// Serialize a document using the default module name.
pub fn stringify(document: &IniDocument) -> String {
    IniCodec::default().stringify(document)
}

/// Prefix every special character with the escape character.
pub fn escape(value: &str) -> String {
    ESCAPE_CHARS.iter().fold(value.to_string(), |escaped, &special| {
        escaped.replace(special, &format!("{ESCAPE_CHAR}{special}"))
    })
}

/// Undo [`escape`], stepping through the alphabet in reverse order.
pub fn unescape(value: &str) -> String {
    ESCAPE_CHARS.iter().rev().fold(value.to_string(), |unescaped, &special| {
        unescaped.replace(&format!("{ESCAPE_CHAR}{special}"), &special.to_string())
    })
}

/// Length of the run of escape characters ending right before byte `end`.
fn escape_run_before(value: &str, end: usize) -> usize {
    value.as_bytes()[..end]
        .iter()
        .rev()
        .take_while(|&&byte| byte == ESCAPE_CHAR as u8)
        .count()
}

/// Whether the character starting at byte `index` is escaped.
fn is_escaped_at(value: &str, index: usize) -> bool {
    escape_run_before(value, index) % 2 == 1
}

/// Whether the value ends in an odd run of escape characters.
fn is_end_escaped(value: &str) -> bool {
    escape_run_before(value, value.len()) % 2 == 1
}

/// First unescaped occurrence of `separator`.
fn find_unescaped(value: &str, separator: char) -> Option<usize> {
    value
        .match_indices(separator)
        .map(|(index, _)| index)
        .find(|&index| !is_escaped_at(value, index))
}

/// Split point of a field line. Falls back to an escaped `=` when the line
/// has no unescaped one.
fn find_field_separator(line: &str) -> Option<usize> {
    find_unescaped(line, FIELD_SEPARATOR).or_else(|| line.find(FIELD_SEPARATOR))
}

fn remove_comments(line: &str) -> String {
    remove_comment(&remove_comment(line, COMMENT_1), COMMENT_2)
}

fn remove_comment(line: &str, separator: char) -> String {
    match find_unescaped(line, separator) {
        Some(index) => line[..index].trim_end().to_string(),
        None => line.to_string(),
    }
}

/// Trim surrounding whitespace, keeping whitespace that is itself escaped
/// (an escaped line break at either end of a key or module name).
fn trim_unescaped(value: &str) -> &str {
    let mut trimmed = value.trim_start();
    while let Some(last) = trimmed.chars().last() {
        let start = trimmed.len() - last.len_utf8();
        if !last.is_whitespace() || is_escaped_at(trimmed, start) {
            break;
        }
        trimmed = &trimmed[..start];
    }
    trimmed
}

#[cfg(test)]
mod tests;
