//! Web search backed by the DuckDuckGo Instant Answer API: keyless, so the
//! tool works with zero configuration.

use super::common::{FromToolArgs, with_args};
use super::executor::{Failure, FailureKind};
use super::registry::{Param, ToolClass, ToolEntry};

pub const NAME: &str = "search_web";

const API_URL: &str = "https://api.duckduckgo.com/";

#[derive(Debug)]
pub struct Args {
    query: String,
}

impl FromToolArgs for Args {
    fn from_raw(raw: &str) -> Result<Self, Failure> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(Failure::new(
                FailureKind::InvalidArgs,
                "search_web requires a query",
            ));
        }
        Ok(Args {
            query: query.to_string(),
        })
    }
}

/// Dropped requests abort in flight, and connect-level faults are marked
/// transient so the dispatcher may retry exactly once.
pub async fn call(client: reqwest::Client, args: Args) -> Result<String, Failure> {
    let response = client
        .get(API_URL)
        .query(&[
            ("q", args.query.as_str()),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ])
        .send()
        .await
        .map_err(from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Failure::new(
            FailureKind::Io,
            format!("search endpoint answered {status}"),
        ));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| Failure::new(FailureKind::Io, format!("bad search payload: {e}")))?;
    Ok(format_results(&args.query, &body))
}

fn from_reqwest(error: reqwest::Error) -> Failure {
    let kind = if error.is_timeout() || error.is_connect() {
        FailureKind::TransientIo
    } else {
        FailureKind::Io
    };
    Failure::new(kind, error.to_string())
}

/// Flatten the instant-answer payload into readable sections.
fn format_results(query: &str, data: &serde_json::Value) -> String {
    let mut sections = vec![format!("results for: {query}")];

    if let Some(text) = data["AbstractText"].as_str()
        && !text.is_empty()
    {
        let source = data["AbstractSource"].as_str().unwrap_or("unknown");
        let url = data["AbstractURL"].as_str().unwrap_or("");
        sections.push(format!("summary ({source}):\n{text}\n{url}"));
    }

    if let Some(answer) = data["Answer"].as_str()
        && !answer.is_empty()
    {
        sections.push(format!("instant answer:\n{answer}"));
    }

    if let Some(definition) = data["Definition"].as_str()
        && !definition.is_empty()
    {
        sections.push(format!("definition:\n{definition}"));
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        let lines: Vec<String> = topics
            .iter()
            .filter_map(|topic| {
                let text = topic["Text"].as_str().filter(|t| !t.is_empty())?;
                let url = topic["FirstURL"].as_str().unwrap_or("");
                Some(format!("- {text} ({url})"))
            })
            .take(5)
            .collect();
        if !lines.is_empty() {
            sections.push(format!("related:\n{}", lines.join("\n")));
        }
    }

    if sections.len() == 1 {
        sections.push("no instant answer available for this query".to_string());
    }
    sections.join("\n\n")
}

pub fn entry(client: reqwest::Client) -> ToolEntry {
    ToolEntry::new(
        NAME,
        "Search the web for current information. Returns a short digest of instant answers.",
        vec![Param::required("query", "what to look up")],
        ToolClass::Network,
        with_args(move |args| call(client.clone(), args)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_is_invalid_args() {
        let err = Args::from_raw("").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidArgs);
    }

    #[test]
    fn abstract_and_topics_render_as_sections() {
        let data = serde_json::json!({
            "AbstractText": "Rust is a systems programming language.",
            "AbstractSource": "Wikipedia",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "Answer": "",
            "Definition": "",
            "RelatedTopics": [
                { "Text": "Cargo, the package manager", "FirstURL": "https://example.com/cargo" },
                { "Text": "", "FirstURL": "https://example.com/hidden" },
            ],
            "Redirect": "",
        });
        let out = format_results("rust language", &data);
        assert!(out.contains("results for: rust language"));
        assert!(out.contains("systems programming language"));
        assert!(out.contains("Wikipedia"));
        assert!(out.contains("Cargo, the package manager"));
        assert!(!out.contains("hidden"));
    }

    #[test]
    fn empty_payload_reports_no_answer() {
        let data = serde_json::json!({
            "AbstractText": "",
            "Answer": "",
            "Definition": "",
            "RelatedTopics": [],
        });
        let out = format_results("obscure thing", &data);
        assert!(out.contains("no instant answer"));
    }
}
