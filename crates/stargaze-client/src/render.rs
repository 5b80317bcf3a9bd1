//! Markdown to terminal text.
//!
//! Replies are parsed with `markdown` into an mdast tree and flattened into
//! plain lines: headings are underlined, links show their target in
//! parentheses, lists keep their markers and emphasis is reduced to its text.

use markdown::{mdast, to_mdast, ParseOptions};
use stargaze_types::{Message, ResponseMetadata};

/// Render one transcript entry.
pub fn render_message(message: &Message) -> String {
    match message {
        Message::User(text) => format!("You: {}", text),
        Message::Assistant(_) => {
            let mut out = format!("Assistant:\n{}", render_markdown(message.text()));
            if let Some(line) = message.metadata().and_then(metadata_line) {
                out.push_str("\n\n");
                out.push_str(&line);
            }
            out
        }
    }
}

/// Summary line for a detailed reply, e.g. `llama3 · 2.50s · 15 tokens`.
pub fn metadata_line(metadata: &ResponseMetadata) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(model) = &metadata.model {
        parts.push(model.clone());
    }
    if let Some(seconds) = metadata.duration_seconds() {
        parts.push(format!("{}s", seconds));
    }
    if let Some(tokens) = metadata.total_tokens() {
        parts.push(format!("{} tokens", tokens));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}

pub fn render_markdown(text: &str) -> String {
    let root = match to_mdast(text, &ParseOptions::gfm()) {
        Ok(node) => node,
        // Plain markdown never fails to parse; keep the raw text if it does
        Err(_) => return text.trim().to_string(),
    };

    let blocks = match &root {
        mdast::Node::Root(root) => render_blocks(&root.children, 0),
        other => render_block(other, 0),
    };
    blocks.join("\n\n")
}

fn render_blocks(nodes: &[mdast::Node], depth: usize) -> Vec<String> {
    nodes
        .iter()
        .flat_map(|node| render_block(node, depth))
        .filter(|block| !block.is_empty())
        .collect()
}

fn render_block(node: &mdast::Node, depth: usize) -> Vec<String> {
    match node {
        mdast::Node::Heading(heading) => {
            let title = render_inline(&heading.children);
            let marker = if heading.depth == 1 { '=' } else { '-' };
            let underline: String = std::iter::repeat(marker)
                .take(title.chars().count())
                .collect();
            vec![format!("{}\n{}", title, underline)]
        }
        mdast::Node::Paragraph(paragraph) => vec![render_inline(&paragraph.children)],
        mdast::Node::List(list) => vec![render_list(list, depth)],
        mdast::Node::Code(code) => vec![code
            .value
            .lines()
            .map(|line| format!("    {}", line))
            .collect::<Vec<_>>()
            .join("\n")],
        mdast::Node::Blockquote(blockquote) => vec![render_blocks(&blockquote.children, depth)
            .join("\n\n")
            .lines()
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n")],
        mdast::Node::ThematicBreak(_) => vec!["---".to_string()],
        mdast::Node::Html(html) => vec![html.value.clone()],
        other => match other.children() {
            Some(children) => render_blocks(children, depth),
            None => vec![render_inline(std::slice::from_ref(other))],
        },
    }
}

fn render_list(list: &mdast::List, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let mut number = list.start.unwrap_or(1);
    let mut lines = Vec::new();

    for node in &list.children {
        let mdast::Node::ListItem(item) = node else {
            continue;
        };

        let marker = if list.ordered {
            let marker = format!("{}.", number);
            number += 1;
            marker
        } else {
            "-".to_string()
        };

        let mut first = true;
        for child in &item.children {
            match child {
                mdast::Node::List(nested) => lines.push(render_list(nested, depth + 1)),
                other => {
                    for block in render_block(other, depth + 1) {
                        if first {
                            lines.push(format!("{}{} {}", indent, marker, block));
                            first = false;
                        } else {
                            lines.push(format!("{}  {}", indent, block));
                        }
                    }
                }
            }
        }

        if first {
            lines.push(format!("{}{}", indent, marker));
        }
    }

    lines.join("\n")
}

fn render_inline(nodes: &[mdast::Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            mdast::Node::Text(text) => out.push_str(&text.value),
            mdast::Node::InlineCode(code) => {
                out.push('`');
                out.push_str(&code.value);
                out.push('`');
            }
            mdast::Node::Strong(strong) => out.push_str(&render_inline(&strong.children)),
            mdast::Node::Emphasis(emphasis) => out.push_str(&render_inline(&emphasis.children)),
            mdast::Node::Delete(delete) => out.push_str(&render_inline(&delete.children)),
            mdast::Node::Link(link) => {
                let label = render_inline(&link.children);
                if label.is_empty() || label == link.url {
                    out.push_str(&link.url);
                } else {
                    out.push_str(&format!("{} ({})", label, link.url));
                }
            }
            mdast::Node::Image(image) => out.push_str(&image.alt),
            mdast::Node::Break(_) => out.push('\n'),
            mdast::Node::Html(html) => out.push_str(&html.value),
            other => {
                if let Some(children) = other.children() {
                    out.push_str(&render_inline(children));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_link_and_emphasis() {
        let rendered = render_markdown(
            "# Your Starred Repositories\n\n[pgai](https://github.com/timescale/pgai) - *RAG* in **Postgres**",
        );
        assert_eq!(
            rendered,
            "Your Starred Repositories\n=========================\n\npgai (https://github.com/timescale/pgai) - RAG in Postgres"
        );
    }

    #[test]
    fn test_lists() {
        let rendered = render_markdown("1. first\n2. second\n   - nested\n\n- `code`");
        assert_eq!(rendered, "1. first\n2. second\n  - nested\n\n- `code`");
    }

    #[test]
    fn test_metadata_line() {
        let metadata = ResponseMetadata {
            model: Some("llama3".to_string()),
            total_duration: Some(2_500_000_000),
            prompt_eval_count: Some(10),
            eval_count: Some(5),
            ..Default::default()
        };
        assert_eq!(
            metadata_line(&metadata).as_deref(),
            Some("llama3 · 2.50s · 15 tokens")
        );
        assert!(metadata_line(&ResponseMetadata::default()).is_none());
    }

    #[test]
    fn test_detailed_reply_shows_metadata() {
        let message = Message::assistant_with_metadata(
            "## Result",
            ResponseMetadata {
                total_duration: Some(1_234_000_000),
                ..Default::default()
            },
        );
        assert_eq!(render_message(&message), "Assistant:\nResult\n------\n\n1.23s");
        assert_eq!(render_message(&Message::user("**hi**")), "You: **hi**");
    }
}
