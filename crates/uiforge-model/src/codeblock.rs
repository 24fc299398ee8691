//! Code block extraction from model replies.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use regex::Regex;

static FENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+-]*[ \t]*\r?$\n?").expect("fence pattern is valid")
});

/// Language of a fenced code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    Tsx,
    Jsx,
    TypeScript,
    JavaScript,
    #[default]
    Unknown,
}

impl Language {
    /// Parse language from code fence info string.
    pub fn from_info(info: &str) -> Self {
        let lang = info.split_whitespace().next().unwrap_or("");
        match lang.to_lowercase().as_str() {
            "tsx" => Self::Tsx,
            "jsx" => Self::Jsx,
            "ts" | "typescript" => Self::TypeScript,
            "js" | "javascript" => Self::JavaScript,
            _ => Self::Unknown,
        }
    }

    /// Whether a block in this language can hold a component.
    pub fn is_component_source(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// A fenced or indented code block found in a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Language,
    pub source: String,
}

/// Collect every code block in `markdown`, in document order.
pub fn code_blocks(markdown: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CodeBlock> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match &kind {
                    CodeBlockKind::Fenced(info) => Language::from_info(info),
                    CodeBlockKind::Indented => Language::Unknown,
                };
                current = Some(CodeBlock {
                    language,
                    source: String::new(),
                });
            }
            Event::Text(text) => {
                if let Some(block) = current.as_mut() {
                    block.source.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Pull component source out of a model reply.
///
/// Prefers the first fenced block tagged as JS/TS/JSX/TSX. A reply without
/// fences is treated as raw source, minus any stray fence lines.
pub fn extract_source(reply: &str) -> String {
    if reply.contains("```") {
        let blocks = code_blocks(reply);
        let chosen = blocks
            .iter()
            .find(|block| block.language.is_component_source())
            .or_else(|| blocks.iter().find(|block| !block.source.trim().is_empty()));

        if let Some(block) = chosen {
            return block.source.trim().to_string();
        }
    }

    FENCE_LINE.replace_all(reply, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_language() {
        assert_eq!(Language::from_info("tsx"), Language::Tsx);
        assert_eq!(Language::from_info("JSX title=App"), Language::Jsx);
        assert_eq!(Language::from_info("javascript"), Language::JavaScript);
        assert_eq!(Language::from_info("ts"), Language::TypeScript);
        assert_eq!(Language::from_info("css"), Language::Unknown);
        assert_eq!(Language::from_info(""), Language::Unknown);
    }

    #[test]
    fn raw_source_is_returned_trimmed() {
        let reply = "\n\nexport default function A() { return <a />; }\n";

        assert_eq!(extract_source(reply), "export default function A() { return <a />; }");
    }

    #[test]
    fn prefers_component_fence() {
        let reply = r#"Here you go:

```css
.card { color: red; }
```

```tsx
export default function Card() {
  return <div className="card" />;
}
```

Let me know if you want changes."#;

        assert_eq!(
            extract_source(reply),
            "export default function Card() {\n  return <div className=\"card\" />;\n}"
        );
    }

    #[test]
    fn falls_back_to_first_untagged_block() {
        let reply = "```\nexport default () => <p />;\n```";

        assert_eq!(extract_source(reply), "export default () => <p />;");
    }

    #[test]
    fn unterminated_fence_still_yields_source() {
        let reply = "```jsx\nexport default () => <hr />;\n";

        assert_eq!(extract_source(reply), "export default () => <hr />;");
    }

    #[test]
    fn collects_blocks_in_order() {
        let blocks = code_blocks("```js\na\n```\n\ntext\n\n```tsx\nb\n```\n");

        assert_eq!(
            blocks,
            vec![
                CodeBlock {
                    language: Language::JavaScript,
                    source: "a\n".into()
                },
                CodeBlock {
                    language: Language::Tsx,
                    source: "b\n".into()
                },
            ]
        );
    }
}
