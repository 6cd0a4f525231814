use thiserror::Error;

/// Errors that can occur while building, reading or writing a CFDI tree.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CfdiError {
    /// An attribute key did not resolve to any property of the node.
    #[error("{node}: unknown attribute '{key}'")]
    UnknownAttribute { node: &'static str, key: String },

    /// A child element or child key did not resolve to any child of the node.
    #[error("{node}: unknown child '{tag}'")]
    UnknownChild { node: &'static str, tag: String },

    /// Array data supplied for a unique child, or a single value for an array child.
    #[error("{node}: child '{child}' expects {expected}")]
    WrongRelation {
        node: &'static str,
        child: &'static str,
        expected: &'static str,
    },

    /// A unique child slot was populated twice.
    #[error("{node}: child '{child}' may only appear once")]
    DuplicateChild {
        node: &'static str,
        child: &'static str,
    },

    /// A setter rejected the supplied value.
    #[error("{node}: invalid value '{value}' for '{attribute}': {reason}")]
    InvalidValue {
        node: &'static str,
        attribute: &'static str,
        value: String,
        reason: String,
    },

    /// Loosely-typed input had the wrong shape (e.g. a number where a map was expected).
    #[error("{node}: invalid input: {reason}")]
    InvalidInput { node: &'static str, reason: String },

    /// A required attribute was absent or empty when the node was read for output.
    #[error("{node}: missing required attribute '{attribute}'")]
    MissingAttribute {
        node: &'static str,
        attribute: &'static str,
    },

    /// Node-level semantic validation failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Malformed decimal string or overflow.
    #[error("decimal error: {0}")]
    Decimal(String),

    /// Division by zero in decimal arithmetic.
    #[error("division by zero")]
    DivisionByZero,

    /// The original chain cannot be generated for this document.
    #[error("original chain error: {0}")]
    Chain(String),

    /// XML reading or writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// Builder encountered invalid or missing configuration.
    #[error("builder error: {0}")]
    Builder(String),

    /// An external collaborator (schema validator, signer, status service) failed.
    #[error("{service} error: {message}")]
    Service {
        service: &'static str,
        message: String,
    },
}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "emisor.regimen_fiscal").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
    /// SAT validation rule key if applicable (e.g. "CFDI40108").
    pub rule: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "[{}] {}: {}", rule, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl ValidationError {
    /// Create a validation error without a rule key.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: None,
        }
    }

    /// Create a validation error with a SAT rule key.
    pub fn with_rule(
        field: impl Into<String>,
        message: impl Into<String>,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule: Some(rule.into()),
        }
    }
}

/// An element that was tolerated rather than rejected while reading a
/// complement container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Container that recorded the element (e.g. "cfdi:Complemento").
    pub node: &'static str,
    /// Qualified tag of the tolerated element.
    pub tag: String,
    /// Namespace URI of the tolerated element, when declared.
    pub namespace: Option<String>,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}: unknown node {} ({})", self.node, self.tag, ns),
            None => write!(f, "{}: unknown node {}", self.node, self.tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_attribute_names_node_and_field() {
        let err = CfdiError::MissingAttribute {
            node: "cfdi:Emisor",
            attribute: "Rfc",
        };
        assert_eq!(
            err.to_string(),
            "cfdi:Emisor: missing required attribute 'Rfc'"
        );
    }

    #[test]
    fn validation_error_display_with_rule() {
        let e = ValidationError::with_rule("moneda", "unknown currency", "CFDI40116");
        assert_eq!(e.to_string(), "[CFDI40116] moneda: unknown currency");
        let e = ValidationError::new("moneda", "unknown currency");
        assert_eq!(e.to_string(), "moneda: unknown currency");
    }
}
