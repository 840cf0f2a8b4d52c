use crate::utils::error::{GatewayError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(GatewayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(GatewayError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(GatewayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(GatewayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(GatewayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 確認數值不超過另一個上限，例如單檔上限不可大於整包上限
pub fn validate_not_above(
    field_name: &str,
    value: usize,
    ceiling_name: &str,
    ceiling: usize,
) -> Result<()> {
    if value > ceiling {
        return Err(GatewayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must not exceed {} ({})", ceiling_name, ceiling),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("remote.endpoint", "https://latex.example.com/data").is_ok());
        assert!(validate_url("remote.endpoint", "http://localhost:2700").is_ok());
        assert!(validate_url("remote.endpoint", "").is_err());
        assert!(validate_url("remote.endpoint", "invalid-url").is_err());
        assert!(validate_url("remote.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("limits.max_files", 50, 1).is_ok());
        assert!(validate_positive_number("limits.max_files", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range_and_ceiling() {
        assert!(validate_range("remote.timeout_seconds", 90u64, 1, 600).is_ok());
        assert!(validate_range("remote.timeout_seconds", 0u64, 1, 600).is_err());
        assert!(validate_not_above("limits.max_text_file_bytes", 10, "limits.max_archive_bytes", 20).is_ok());
        assert!(validate_not_above("limits.max_text_file_bytes", 30, "limits.max_archive_bytes", 20).is_err());
    }
}
