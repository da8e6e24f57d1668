//! 生成服务请求 / 响应
//!
//! 请求方法 `playbook/generation`；响应要么是成功载荷 `{playbook?, generationId, outline?}`，
//! 要么是带 `code` / `message` 的错误体。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{GenerationError, GenerationErrorKind};

/// 生成请求的方法名
pub const GENERATION_METHOD: &str = "playbook/generation";

/// 生成请求体（字段名与服务端约定一致）
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub access_token: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
    /// 当且仅当未提供大纲时为 true
    pub create_outline: bool,
    pub generation_id: String,
    pub wizard_id: String,
}

impl GenerationRequest {
    pub fn new(
        access_token: String,
        url: String,
        text: String,
        outline: Option<String>,
        generation_id: String,
        wizard_id: String,
    ) -> Self {
        let create_outline = outline.is_none();
        Self {
            access_token,
            url,
            text,
            outline,
            create_outline,
            generation_id,
            wizard_id,
        }
    }
}

/// 成功载荷；大纲阶段可能没有 playbook
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playbook: Option<String>,
    #[serde(default)]
    pub generation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
}

/// 归一化的生成结果：成功或类型化失败，二者互斥
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success(GenerationPayload),
    Failure(GenerationError),
}

impl GenerationResult {
    /// 将服务响应归一化：含 `code` 或 `message` 视为错误体，否则按成功载荷解析
    pub fn from_response(value: Value) -> Self {
        let is_error = value
            .as_object()
            .map(|o| o.contains_key("code") || o.contains_key("message"))
            .unwrap_or(false);

        if is_error {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let mut err = GenerationError::new(GenerationErrorKind::Remote, message);
            match value.get("code") {
                Some(Value::String(code)) => err = err.with_code(code.clone()),
                Some(Value::Number(code)) => err = err.with_code(code.to_string()),
                _ => {}
            }
            if let Some(detail) = value.get("detail").filter(|d| !d.is_null()) {
                err = err.with_detail(detail.clone());
            }
            return GenerationResult::Failure(err);
        }

        match serde_json::from_value::<GenerationPayload>(value) {
            Ok(payload) => GenerationResult::Success(payload),
            Err(e) => GenerationResult::Failure(GenerationError::new(
                GenerationErrorKind::Malformed,
                format!("Invalid generation response: {e}"),
            )),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GenerationResult::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_create_outline_flag() {
        let req = GenerationRequest::new(
            "tok".into(),
            "https://svc".into(),
            "install nginx".into(),
            None,
            "g1".into(),
            "w1".into(),
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["createOutline"], true);
        assert_eq!(json["URL"], "https://svc");
        assert_eq!(json["accessToken"], "tok");
        assert_eq!(json["wizardId"], "w1");
        assert!(json.get("outline").is_none());

        let req = GenerationRequest::new(
            "tok".into(),
            "https://svc".into(),
            "install nginx".into(),
            Some("1. install".into()),
            "g1".into(),
            "w1".into(),
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["createOutline"], false);
        assert_eq!(json["outline"], "1. install");
    }

    #[test]
    fn test_success_without_playbook() {
        let result = GenerationResult::from_response(json!({
            "outline": "1. consume events",
            "generationId": "g1"
        }));
        assert_eq!(
            result,
            GenerationResult::Success(GenerationPayload {
                playbook: None,
                generation_id: "g1".into(),
                outline: Some("1. consume events".into()),
            })
        );
    }

    #[test]
    fn test_error_body() {
        let result = GenerationResult::from_response(json!({
            "code": "permission_denied__user_trial_expired",
            "message": "Trial expired",
            "detail": {"url": "https://example.com/trial"}
        }));
        match result {
            GenerationResult::Failure(err) => {
                assert_eq!(err.kind, GenerationErrorKind::Remote);
                assert_eq!(err.code.as_deref(), Some("permission_denied__user_trial_expired"));
                assert_eq!(err.message, "Trial expired");
                assert!(err.detail.is_some());
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_error_with_numeric_code_and_empty_message() {
        let result = GenerationResult::from_response(json!({"code": 500, "message": ""}));
        match result {
            GenerationResult::Failure(err) => {
                assert_eq!(err.code.as_deref(), Some("500"));
                assert_eq!(err.user_message(), crate::core::UNKNOWN_ERROR);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_response() {
        let result = GenerationResult::from_response(json!("not an object"));
        match result {
            GenerationResult::Failure(err) => assert_eq!(err.kind, GenerationErrorKind::Malformed),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
