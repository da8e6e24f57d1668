//! Mock 传输（用于测试与未配置端点时，无需服务）
//!
//! 默认按请求构造确定性的大纲 / playbook；也可预置脚本化回复。所有调用都会被记录。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::WizardError;
use crate::generation::RemoteTransport;

/// 预置回复
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(Value),
    Fail(String),
}

#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序消费预置回复，用完后回到默认行为
    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 已记录的 (method, params)
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl RemoteTransport for MockTransport {
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, WizardError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((method.to_string(), params.clone()));

        let scripted = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match scripted {
            Some(MockReply::Respond(value)) => Ok(value),
            Some(MockReply::Fail(reason)) => Err(WizardError::Transport(reason)),
            None => Ok(default_reply(&params)),
        }
    }
}

/// 无大纲时返回由提示词派生的大纲；有大纲时按大纲每行生成一个 debug 任务
fn default_reply(params: &Value) -> Value {
    let text = params.get("text").and_then(Value::as_str).unwrap_or_default();
    let generation_id = params
        .get("generationId")
        .and_then(Value::as_str)
        .unwrap_or_default();

    match params.get("outline").and_then(Value::as_str) {
        None => json!({
            "generationId": generation_id,
            "outline": outline_from_text(text),
        }),
        Some(outline) => json!({
            "generationId": generation_id,
            "outline": outline,
            "playbook": playbook_from_outline(text, outline),
        }),
    }
}

fn outline_from_text(text: &str) -> String {
    text.split(['.', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

fn playbook_from_outline(text: &str, outline: &str) -> String {
    let name = text.lines().next().map(str::trim).unwrap_or_default();
    let name = if name.is_empty() { "Generated playbook" } else { name };
    let mut out = format!("---\n- name: {}\n  hosts: all\n  tasks:\n", yaml_quote(name));
    for line in outline.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let step = line
            .split_once(". ")
            .filter(|(n, _)| n.chars().all(|c| c.is_ascii_digit()))
            .map(|(_, rest)| rest)
            .unwrap_or(line);
        let step = yaml_quote(step);
        out.push_str(&format!(
            "    - name: {step}\n      ansible.builtin.debug:\n        msg: {step}\n"
        ));
    }
    out
}

fn yaml_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_outline_reply() {
        let mock = MockTransport::new();
        let reply = mock
            .send_request(
                "playbook/generation",
                json!({"text": "Install nginx. Start the service", "generationId": "g1"}),
            )
            .await
            .unwrap();
        assert_eq!(reply["generationId"], "g1");
        assert_eq!(reply["outline"], "1. Install nginx\n2. Start the service");
        assert!(reply.get("playbook").is_none());
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_default_playbook_reply() {
        let mock = MockTransport::new();
        let reply = mock
            .send_request(
                "playbook/generation",
                json!({"text": "web", "outline": "1. Install nginx\n2. Start it", "generationId": "g2"}),
            )
            .await
            .unwrap();
        let playbook = reply["playbook"].as_str().unwrap();
        assert!(playbook.starts_with("---\n- name: \"web\""));
        assert!(playbook.contains("- name: \"Install nginx\""));
        assert!(playbook.contains("- name: \"Start it\""));
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockTransport::with_replies([
            MockReply::Fail("boom".into()),
            MockReply::Respond(json!({"message": ""})),
        ]);
        assert!(mock.send_request("m", json!({})).await.is_err());
        assert_eq!(mock.send_request("m", json!({})).await.unwrap()["message"], "");
        // 预置回复用完后回到默认行为
        assert!(mock.send_request("m", json!({})).await.unwrap().get("outline").is_some());
    }
}
