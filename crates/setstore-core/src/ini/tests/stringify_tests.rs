use indexmap::IndexMap;

use crate::ini::{escape, stringify, unescape, IniDocument, IniModule};
use crate::settings::DEFAULT_MODULE;

fn module(pairs: &[(&str, &str)]) -> IniModule {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn test_stringify_default_module_has_no_header() {
    let mut document = IniDocument::new();
    document.insert(DEFAULT_MODULE.to_string(), module(&[("a", "1"), ("b", "2")]));

    assert_eq!(stringify(&document), "a=1\nb=2\n");
}

#[test]
fn test_stringify_named_modules_after_default() {
    let mut document = IndexMap::new();
    document.insert("net".to_string(), module(&[("port", "80")]));
    document.insert(DEFAULT_MODULE.to_string(), module(&[("name", "x")]));
    document.insert("ui".to_string(), module(&[("theme", "dark")]));

    assert_eq!(
        stringify(&document),
        "name=x\n\n[net]\nport=80\n\n[ui]\ntheme=dark\n"
    );
}

#[test]
fn test_stringify_first_header_has_no_separator() {
    let mut document = IniDocument::new();
    document.insert("net".to_string(), module(&[("port", "80")]));

    assert_eq!(stringify(&document), "[net]\nport=80\n");
}

#[test]
fn test_stringify_skips_empty_modules() {
    let mut document = IniDocument::new();
    document.insert(DEFAULT_MODULE.to_string(), IniModule::new());
    document.insert("empty".to_string(), IniModule::new());
    document.insert("net".to_string(), module(&[("port", "80")]));

    assert_eq!(stringify(&document), "[net]\nport=80\n");
}

#[test]
fn test_stringify_empty_document() {
    assert_eq!(stringify(&IniDocument::new()), "");
}

#[test]
fn test_stringify_escapes_module_key_and_value() {
    let mut document = IniDocument::new();
    document.insert("a.b".to_string(), module(&[("k=1", "x;y#z")]));

    assert_eq!(stringify(&document), "[a\\.b]\nk\\=1=x\\;y\\#z\n");
}

#[test]
fn test_stringify_escapes_newline_as_continuation() {
    let mut document = IniDocument::new();
    document.insert(DEFAULT_MODULE.to_string(), module(&[("key", "line1\nline2")]));

    assert_eq!(stringify(&document), "key=line1\\\nline2\n");
}

#[test]
fn test_escape_covers_alphabet() {
    assert_eq!(escape("\\"), "\\\\");
    assert_eq!(escape("[x]"), "\\[x\\]");
    assert_eq!(escape("\"q\" 'q'"), "\\\"q\\\" \\'q\\'");
    assert_eq!(escape("a.b:c"), "a\\.b\\:c");
    assert_eq!(escape("plain text"), "plain text");
}

#[test]
fn test_escape_ordering_round_trip() {
    let original = "\\[x]=";

    assert_eq!(escape(original), "\\\\\\[x\\]\\=");
    assert_eq!(unescape(&escape(original)), original);
}
