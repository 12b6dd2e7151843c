//! Meta review content-mode detection and structured rendering.
//!
//! The service sends the meta review as an untagged string. Detection is a
//! two-stage decode: if the trimmed text opens like JSON, try to parse it as a
//! structured value; anything else, including malformed JSON, is narrative.

use super::styled::{push_separated, SpanStyle, StyledLine};
use serde_json::Value;
use tracing::warn;

/// Structured meta review value. Container order is the order received.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// Any non-container JSON value.
    Scalar(Value),
    Sequence(Vec<MetaValue>),
    Mapping(Vec<(String, MetaValue)>),
}

impl From<Value> for MetaValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => MetaValue::Sequence(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                MetaValue::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            scalar => MetaValue::Scalar(scalar),
        }
    }
}

impl MetaValue {
    #[cfg(test)]
    pub fn to_json(&self) -> Value {
        match self {
            MetaValue::Scalar(v) => v.clone(),
            MetaValue::Sequence(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            MetaValue::Mapping(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Badge shown next to a field name.
    pub fn badge(&self) -> String {
        match self {
            MetaValue::Sequence(items) => items.len().to_string(),
            MetaValue::Mapping(_) => "object".to_string(),
            MetaValue::Scalar(Value::String(_)) => "string".to_string(),
            MetaValue::Scalar(Value::Number(_)) => "number".to_string(),
            MetaValue::Scalar(Value::Bool(_)) => "boolean".to_string(),
            MetaValue::Scalar(_) => "null".to_string(),
        }
    }

    /// Plain text for a scalar: strings unquoted, everything else as JSON.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            MetaValue::Scalar(Value::String(s)) => Some(s.clone()),
            MetaValue::Scalar(other) => Some(other.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetaReviewContent {
    /// Root is always a `Mapping` or a `Sequence`.
    Structured(MetaValue),
    /// Markdown source, verbatim.
    Narrative(String),
}

impl MetaReviewContent {
    pub fn is_structured(&self) -> bool {
        matches!(self, MetaReviewContent::Structured(_))
    }

    /// Top-level fields of structured content; sequence elements are keyed by index.
    pub fn fields(&self) -> Vec<(String, &MetaValue)> {
        match self {
            MetaReviewContent::Structured(MetaValue::Mapping(fields)) => {
                fields.iter().map(|(k, v)| (k.clone(), v)).collect()
            }
            MetaReviewContent::Structured(MetaValue::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetaReviewDecoder {
    /// Emit a warning when structured-looking content fails to parse.
    pub report_failures: bool,
}

impl MetaReviewDecoder {
    pub fn new(report_failures: bool) -> Self {
        Self { report_failures }
    }

    /// Decide how to show a raw meta review. `None` means show nothing.
    pub fn decode(&self, raw: Option<&str>) -> Option<MetaReviewContent> {
        let raw = raw?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with(['{', '[']) {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                    return Some(MetaReviewContent::Structured(value.into()));
                }
                Ok(_) => {}
                Err(err) => {
                    if self.report_failures {
                        warn!(
                            error = %err,
                            len = trimmed.len(),
                            "structured meta review did not parse; showing it as narrative"
                        );
                    }
                }
            }
        }

        Some(MetaReviewContent::Narrative(raw.to_string()))
    }
}

/// Render structured content as one labeled block per top-level field.
pub fn render_structured(content: &MetaReviewContent, max_depth: usize) -> Vec<StyledLine> {
    let mut out = Vec::new();
    let fields = content.fields();
    if fields.is_empty() {
        out.push(StyledLine::styled("(no fields)", SpanStyle::Muted));
        return out;
    }

    for (name, value) in fields {
        out.push(
            StyledLine::styled(format!("▸ {name}"), SpanStyle::Label)
                .with(format!("  [{}]", value.badge()), SpanStyle::Muted),
        );

        match value {
            MetaValue::Sequence(items) => {
                for item in items {
                    match item.scalar_text() {
                        Some(text) => push_wrapped_text(&mut out, "  • ", "    ", &text),
                        None => {
                            let dump = dump(item, max_depth.saturating_sub(1));
                            push_code_block(&mut out, "  • ", "    ", &dump);
                        }
                    }
                }
            }
            MetaValue::Mapping(_) => {
                push_code_block(&mut out, "  ", "  ", &dump(value, max_depth));
            }
            MetaValue::Scalar(_) => {
                let text = value.scalar_text().unwrap_or_default();
                push_wrapped_text(&mut out, "  ", "  ", &text);
            }
        }
        push_separated(&mut out, StyledLine::blank());
    }

    while out.last().is_some_and(StyledLine::is_blank) {
        out.pop();
    }
    out
}

fn push_wrapped_text(out: &mut Vec<StyledLine>, first: &str, rest: &str, text: &str) {
    for (i, line) in text.lines().enumerate() {
        let lead = if i == 0 { first } else { rest };
        out.push(StyledLine::styled(lead, SpanStyle::Muted).with(line, SpanStyle::Plain));
    }
    if text.lines().next().is_none() {
        out.push(StyledLine::styled(first, SpanStyle::Muted));
    }
}

fn push_code_block(out: &mut Vec<StyledLine>, first: &str, rest: &str, dump: &str) {
    for (i, line) in dump.lines().enumerate() {
        let lead = if i == 0 { first } else { rest };
        out.push(StyledLine::styled(lead, SpanStyle::Muted).with(line, SpanStyle::Code));
    }
}

/// JSON-style, 2-space indented dump. Containers deeper than `depth_left` become `…`.
pub fn dump(value: &MetaValue, depth_left: usize) -> String {
    let mut out = String::new();
    write_value(&mut out, value, depth_left, 0);
    out
}

fn write_value(out: &mut String, value: &MetaValue, depth_left: usize, indent: usize) {
    match value {
        MetaValue::Scalar(v) => out.push_str(&v.to_string()),
        MetaValue::Sequence(items) if items.is_empty() => out.push_str("[]"),
        MetaValue::Mapping(fields) if fields.is_empty() => out.push_str("{}"),
        _ if depth_left == 0 => out.push('…'),
        MetaValue::Sequence(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                out.push_str(if i == 0 { "\n" } else { ",\n" });
                push_indent(out, indent + 1);
                write_value(out, item, depth_left - 1, indent + 1);
            }
            out.push('\n');
            push_indent(out, indent);
            out.push(']');
        }
        MetaValue::Mapping(fields) => {
            out.push('{');
            for (i, (key, item)) in fields.iter().enumerate() {
                out.push_str(if i == 0 { "\n" } else { ",\n" });
                push_indent(out, indent + 1);
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_value(out, item, depth_left - 1, indent + 1);
            }
            out.push('\n');
            push_indent(out, indent);
            out.push('}');
        }
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> MetaReviewDecoder {
        MetaReviewDecoder::default()
    }

    fn strip_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_absent_or_blank_renders_nothing() {
        assert_eq!(decoder().decode(None), None);
        assert_eq!(decoder().decode(Some("")), None);
        assert_eq!(decoder().decode(Some("  \n\t ")), None);
    }

    #[test]
    fn test_object_is_structured() {
        let content = decoder()
            .decode(Some(r#"{"summary": ["a", "b"]}"#))
            .unwrap();
        assert!(content.is_structured());
        let fields = content.fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "summary");
        assert_eq!(
            fields[0].1,
            &MetaValue::Sequence(vec![
                MetaValue::Scalar(Value::from("a")),
                MetaValue::Scalar(Value::from("b")),
            ])
        );
    }

    #[test]
    fn test_leading_whitespace_is_ignored_for_detection() {
        let content = decoder().decode(Some("\n   {\"a\": 1}\n")).unwrap();
        assert!(content.is_structured());
    }

    #[test]
    fn test_malformed_json_falls_back_to_narrative_verbatim() {
        let content = decoder().decode(Some("{not valid json")).unwrap();
        assert_eq!(
            content,
            MetaReviewContent::Narrative("{not valid json".to_string())
        );

        let reporting = MetaReviewDecoder::new(true);
        assert!(!reporting.decode(Some("[1, 2")).unwrap().is_structured());
    }

    #[test]
    fn test_markdown_is_narrative() {
        let content = decoder().decode(Some("## Consensus\n- calm")).unwrap();
        assert!(!content.is_structured());
    }

    #[test]
    fn test_field_order_is_preserved() {
        let content = decoder()
            .decode(Some(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#))
            .unwrap();
        let names: Vec<_> = content.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_structured_round_trip_modulo_whitespace() {
        let source = r#"{
            "Consensus": ["prices rise", "demand holds"],
            "Risks": {"inflation": [1, 2, {"note": null}], "flag": true},
            "Summary": "short"
        }"#;
        let content = decoder().decode(Some(source)).unwrap();
        let MetaReviewContent::Structured(root) = &content else {
            panic!("expected structured content");
        };
        let reserialized = serde_json::to_string(&root.to_json()).unwrap();
        assert_eq!(strip_ws(&reserialized), strip_ws(source));
    }

    #[test]
    fn test_top_level_array_fields_are_indexed() {
        let content = decoder().decode(Some(r#"["first", {"k": "v"}]"#)).unwrap();
        let names: Vec<_> = content.fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["0", "1"]);
    }

    #[test]
    fn test_render_sequence_field_as_list() {
        let content = decoder()
            .decode(Some(r#"{"summary": ["a", "b"]}"#))
            .unwrap();
        let lines: Vec<String> = render_structured(&content, 8)
            .iter()
            .map(StyledLine::plain_text)
            .collect();
        assert_eq!(lines, ["▸ summary  [2]", "  • a", "  • b"]);
    }

    #[test]
    fn test_render_badges_and_dumps() {
        let content = decoder()
            .decode(Some(r#"{"score": 7, "detail": {"k": [1]}, "note": "multi\nline"}"#))
            .unwrap();
        let lines: Vec<String> = render_structured(&content, 8)
            .iter()
            .map(StyledLine::plain_text)
            .collect();
        assert_eq!(
            lines,
            [
                "▸ score  [number]",
                "  7",
                "",
                "▸ detail  [object]",
                "  {",
                "    \"k\": [",
                "      1",
                "    ]",
                "  }",
                "",
                "▸ note  [string]",
                "  multi",
                "  line",
            ]
        );
    }

    #[test]
    fn test_non_primitive_list_items_are_dumped() {
        let content = decoder()
            .decode(Some(r#"{"items": [{"a": 1}]}"#))
            .unwrap();
        let lines: Vec<String> = render_structured(&content, 8)
            .iter()
            .map(StyledLine::plain_text)
            .collect();
        assert_eq!(
            lines,
            ["▸ items  [1]", "  • {", "      \"a\": 1", "    }"]
        );
    }

    #[test]
    fn test_dump_is_depth_bounded() {
        let value: MetaValue = serde_json::json!({"b": {"c": {"d": 1}}}).into();
        assert_eq!(dump(&value, 2), "{\n  \"b\": {\n    \"c\": …\n  }\n}");
        assert_eq!(dump(&value, 0), "…");
    }

    #[test]
    fn test_deeply_nested_payload_renders_without_blowing_up() {
        let depth = 100;
        let source = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        let content = decoder().decode(Some(&format!("{{\"deep\": {source}}}"))).unwrap();
        let lines = render_structured(&content, 4);
        assert!(lines.iter().any(|l| l.plain_text().contains('…')));
    }

    #[test]
    fn test_empty_object_has_placeholder() {
        let content = decoder().decode(Some("{}")).unwrap();
        assert!(content.is_structured());
        let lines = render_structured(&content, 8);
        assert_eq!(lines[0].plain_text(), "(no fields)");
    }
}
