//! 用户请求体校验
//!
//! 先按类型解码，再做取值检查；任何一步失败都只返回错误，不会 panic。

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::model::UserPayload;

/// 请求体不满足约束的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure(pub String);

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 把任意 JSON 转换为已校验的 [`UserPayload`]
///
/// `age` 必须是 JSON 整数：`"21"`、`21.5` 以及 `21.0` 都会被拒绝。
pub fn parse_user(payload: &Value) -> Result<UserPayload, ValidationFailure> {
    let user = UserPayload::deserialize(payload).map_err(|e| ValidationFailure(e.to_string()))?;

    user.validate().map_err(|errors| {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        ValidationFailure(messages.join(", "))
    })?;

    Ok(user)
}

/// 请求体是否为合法的用户数据
pub fn validate(payload: &Value) -> bool {
    parse_user(payload).is_ok()
}
