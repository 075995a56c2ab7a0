//! Semantic validation results for loaded configuration.
//!
//! Loading succeeds as long as the files parse; values that are out of range
//! or that name unknown models are reported as [`ConfigIssue`]s and replaced
//! by defaults.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The value was rejected and a default used instead.
    Error,
    /// The value works but is probably not what was meant.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A numeric or enum field is outside its allowed range.
    InvalidValue { field: String, value: String },
    /// A field names a model that is not in the registry.
    UnknownModel { field: String, model: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn invalid_value(
        severity: Severity,
        field: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: ConfigIssueCode::InvalidValue {
                field: field.into(),
                value: value.to_string(),
            },
            message: message.into(),
        }
    }

    pub fn unknown_model(field: impl Into<String>, model: impl Into<String>) -> Self {
        let field = field.into();
        let model = model.into();
        Self {
            severity: Severity::Warning,
            message: format!("{}: unknown model '{}'", field, model),
            code: ConfigIssueCode::UnknownModel { field, model },
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_issue() {
        let issue = ConfigIssue::unknown_model("router.analysis_model", "gpt-9");
        assert!(!issue.is_error());
        assert_eq!(
            issue.code,
            ConfigIssueCode::UnknownModel {
                field: "router.analysis_model".into(),
                model: "gpt-9".into()
            }
        );
        assert_eq!(
            issue.to_string(),
            "[warning] router.analysis_model: unknown model 'gpt-9'"
        );
    }

    #[test]
    fn test_invalid_value_issue() {
        let issue = ConfigIssue::invalid_value(
            Severity::Error,
            "queue.concurrency_limit",
            0,
            "queue.concurrency_limit must be at least 1",
        );
        assert!(issue.is_error());
        assert!(matches!(
            issue.code,
            ConfigIssueCode::InvalidValue { ref value, .. } if value == "0"
        ));
    }
}
