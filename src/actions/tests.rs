#![cfg(test)]

use crate::actions::*;

fn block(action: &str, args: &str) -> String {
    format!(
        "```json\n{}\n```",
        serde_json::json!({ "action": action, "args": args })
    )
}

#[test]
fn plain_text_is_no_call() {
    let cases = [
        "",
        "The answer is 4.",
        "Thought: no tool needed here, I can answer directly.",
        "Here is some code:\n```rust\nfn main() {}\n```\ndone.",
    ];
    for (i, text) in cases.into_iter().enumerate() {
        assert_eq!(extract_action(text).unwrap(), Parsed::NoCall, "case {}", i);
    }
}

#[test]
fn well_formed_block_extracts() {
    let text = format!(
        "Thought: the user wants a file on their desktop.\nAction: {}",
        block("write_file", "~/Desktop/test.txt|Content here")
    );
    let Parsed::Call(call) = extract_action(&text).unwrap() else {
        panic!("expected a call");
    };
    assert_eq!(call.name, "write_file");
    assert_eq!(call.args, "~/Desktop/test.txt|Content here");
    assert!(text.contains(&call.raw));
}

#[test]
fn last_well_formed_block_wins() {
    let text = format!(
        "First try: {}\nActually, let me correct that: {}",
        block("read_file", "~/a.txt"),
        block("read_file", "~/b.txt"),
    );
    let Parsed::Call(call) = extract_action(&text).unwrap() else {
        panic!("expected a call");
    };
    assert_eq!(call.args, "~/b.txt");
}

#[test]
fn earlier_good_block_survives_later_broken_one() {
    let text = format!(
        "{}\n```json\n{{ \"action\": \"read_file\",\n```",
        block("search_web", "rust release date")
    );
    let Parsed::Call(call) = extract_action(&text).unwrap() else {
        panic!("expected a call");
    };
    assert_eq!(call.name, "search_web");
}

#[test]
fn malformed_blocks_are_errors_not_panics() {
    let cases = [
        // bad json
        "```json\n{ this is not json }\n```",
        // missing action
        "```json\n{ \"args\": \"x\" }\n```",
        // non-string args
        "```json\n{ \"action\": \"read_file\", \"args\": {\"path\": \"a\"} }\n```",
        // non-string action
        "```json\n{ \"action\": 7, \"args\": \"x\" }\n```",
        // extra keys
        "```json\n{ \"action\": \"read_file\", \"args\": \"a\", \"extra\": 1 }\n```",
        // not an object
        "```json\n[1, 2, 3]\n```",
        // truncated fence
        "```json\n{ \"action\": \"read_file\", \"args\": \"a\" }",
    ];
    for (i, text) in cases.into_iter().enumerate() {
        assert!(extract_action(text).is_err(), "case {}", i);
    }
}

#[test]
fn extraction_round_trips() {
    let original = ToolCall {
        name: "write_file".to_string(),
        args: "~/tmp/b.txt|a|b".to_string(),
        raw: String::new(),
    };
    let Parsed::Call(reparsed) = extract_action(&original.to_block()).unwrap() else {
        panic!("expected a call");
    };
    assert_eq!(reparsed.name, original.name);
    assert_eq!(reparsed.args, original.args);
    // And the rendered form is stable across one more pass.
    assert_eq!(reparsed.to_block(), original.to_block());
}

#[test]
fn args_with_embedded_pipes_survive() {
    let Parsed::Call(call) =
        extract_action(&block("write_file", "~/tmp/b.txt|a|b")).unwrap()
    else {
        panic!("expected a call");
    };
    assert_eq!(call.args, "~/tmp/b.txt|a|b");
}

#[test]
fn args_with_newlines_survive() {
    let Parsed::Call(call) =
        extract_action(&block("write_file", "notes.txt|line one\nline two\n")).unwrap()
    else {
        panic!("expected a call");
    };
    assert_eq!(call.args, "notes.txt|line one\nline two\n");
}
