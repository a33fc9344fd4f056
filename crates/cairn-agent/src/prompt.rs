// SPDX-FileCopyrightText: 2026 Cairn Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt assembly and inline tool-call parsing.

use cairn_core::types::ToolCall;
use cairn_skill::ToolRegistry;
use serde_json::{json, Value};

const INLINE_CALL_FORMAT: &str = "If you cannot call tools natively, reply with only a JSON object \
of the form {\"tool\": \"<tool name>\", \"arguments\": {...}} and nothing else.";

/// Assemble the system prompt from the agent prompt, its tools, and any
/// retrieved document context.
pub fn system_prompt(base: &str, tools: &ToolRegistry, context: &str) -> String {
    let mut prompt = base.trim().to_string();

    if !tools.is_empty() {
        prompt.push_str("\n\nYou can use these tools:\n");
        prompt.push_str(&tools.catalogue());
        prompt.push_str("\n\n");
        prompt.push_str(INLINE_CALL_FORMAT);
    }

    if !context.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(context.trim_end());
        prompt.push_str("\n\nUse these documents when they are relevant and say which document you relied on.");
    }

    prompt
}

/// Strip a surrounding Markdown code fence, if any.
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop an info string such as `json` on the opening fence line.
    match rest.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with('{') => body.trim(),
        _ => rest.trim(),
    }
}

/// Recognise a reply that is only `{"tool": name, "arguments": {...}}` for a bound tool.
pub fn parse_inline_call(content: &str, tools: &ToolRegistry) -> Option<ToolCall> {
    let value: Value = serde_json::from_str(unfence(content)).ok()?;
    let object = value.as_object()?;
    let name = object.get("tool").and_then(Value::as_str)?;
    if !tools.contains(name) {
        return None;
    }
    let arguments = object
        .get("arguments")
        .or_else(|| object.get("parameters"))
        .cloned()
        .unwrap_or_else(|| json!({}));
    Some(ToolCall {
        name: name.to_string(),
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_config::model::ToolsConfig;
    use cairn_skill::builtin::ExecuteCodeTool;
    use cairn_skill::{AgentTool, BuiltinTool};

    fn code_tools() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(AgentTool::Builtin(BuiltinTool::ExecuteCode(ExecuteCodeTool::new(
            &ToolsConfig::default(),
        ))));
        registry
    }

    #[test]
    fn bare_prompt_has_no_tool_section() {
        let prompt = system_prompt("  Be helpful. ", &ToolRegistry::new(), "");
        assert_eq!(prompt, "Be helpful.");
    }

    #[test]
    fn tools_and_context_are_appended() {
        let prompt = system_prompt("Base.", &code_tools(), "Relevant documents:\n\n[1] a.md\ntext\n");
        assert!(prompt.starts_with("Base.\n\nYou can use these tools:\n- execute_code:"));
        assert!(prompt.contains("\"tool\": \"<tool name>\""));
        assert!(prompt.contains("[1] a.md"));
    }

    #[test]
    fn parses_plain_and_fenced_inline_calls() {
        let tools = code_tools();
        let call = parse_inline_call(r#"{"tool": "execute_code", "arguments": {"code": "print(1)"}}"#, &tools)
            .unwrap();
        assert_eq!(call.name, "execute_code");
        assert_eq!(call.arguments["code"], "print(1)");

        let fenced = "```json\n{\"tool\": \"execute_code\", \"parameters\": {\"code\": \"1\"}}\n```";
        assert_eq!(parse_inline_call(fenced, &tools).unwrap().arguments["code"], "1");
    }

    #[test]
    fn ignores_prose_and_unbound_tools() {
        let tools = code_tools();
        assert!(parse_inline_call("The answer is 4.", &tools).is_none());
        assert!(parse_inline_call(r#"{"tool": "rm_rf", "arguments": {}}"#, &tools).is_none());
        assert!(parse_inline_call(r#"{"answer": 4}"#, &tools).is_none());
    }
}
