// ==========================================
// 细胞培养生产排程系统 - 请求参数校验
// ==========================================
// 职责: 外部请求字符串 → 领域类型
// 红线: 校验失败在任何写入之前返回 ValidationError
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::{DATE_FORMAT, TIME_FORMAT};
use crate::domain::types::ParseEnumError;
use chrono::{NaiveDate, NaiveTime};
use std::str::FromStr;

/// 解析 YYYY-MM-DD 日期
pub fn parse_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError(format!("{}不能为空", field)));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|e| {
        ApiError::ValidationError(format!("{}格式错误（应为YYYY-MM-DD）: {} ({})", field, raw, e))
    })
}

/// 解析可缺省的日期；空字符串视为缺省
pub fn parse_optional_date(field: &str, raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(field, s).map(Some),
    }
}

/// 解析可缺省的 HH:mm 时刻；空字符串视为缺省
pub fn parse_optional_time(field: &str, raw: Option<&str>) -> ApiResult<Option<NaiveTime>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveTime::parse_from_str(s, TIME_FORMAT)
            .map(Some)
            .map_err(|e| ApiError::ValidationError(format!("{}格式错误（应为HH:mm）: {} ({})", field, s, e))),
    }
}

/// 解析枚举取值
pub fn parse_enum<T>(field: &str, raw: &str) -> ApiResult<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.parse::<T>()
        .map_err(|e| ApiError::ValidationError(format!("{}: {}", field, e)))
}

/// 解析可缺省的枚举取值
pub fn parse_optional_enum<T>(field: &str, raw: Option<&str>) -> ApiResult<Option<T>>
where
    T: FromStr<Err = ParseEnumError>,
{
    raw.map(|s| parse_enum(field, s)).transpose()
}

/// 必填非空字符串
pub fn require_non_empty(field: &str, value: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::ValidationError(format!("{}不能为空", field)));
    }
    Ok(trimmed.to_string())
}

/// 必填ID
pub fn require_id(field: &str, value: &str) -> ApiResult<()> {
    require_non_empty(field, value).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ScheduleStatus;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("expectedCompletionDate", "2025-01-08").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()
        );
        assert!(parse_date("expectedCompletionDate", "2025/01/08").unwrap_err().is_validation());
        assert!(parse_date("expectedCompletionDate", "2025-02-30").is_err());
        assert!(parse_date("expectedCompletionDate", "  ").is_err());
    }

    #[test]
    fn test_parse_optional_time() {
        assert_eq!(parse_optional_time("scheduledTime", None).unwrap(), None);
        assert_eq!(parse_optional_time("scheduledTime", Some("")).unwrap(), None);
        assert_eq!(
            parse_optional_time("scheduledTime", Some("09:00")).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0)
        );
        assert!(parse_optional_time("scheduledTime", Some("25:00")).is_err());
        assert!(parse_optional_time("scheduledTime", Some("9am")).is_err());
    }

    #[test]
    fn test_parse_enum_rejects_out_of_range() {
        let ok: ScheduleStatus = parse_enum("status", "IN_PROGRESS").unwrap();
        assert_eq!(ok, ScheduleStatus::InProgress);
        let err = parse_enum::<ScheduleStatus>("status", "PAUSED").unwrap_err();
        assert!(err.is_validation());
    }
}
