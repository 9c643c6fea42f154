//! Error types for relation hydration with actionable messages.
//!
//! Every failure carries an [`ErrorCode`] for programmatic handling plus an
//! [`ErrorContext`] describing the model, relation and (when available) the
//! SQL that was being executed.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: T{category}{number}
//! - 1xxx: Relation metadata errors (unknown relation, broken descriptor)
//! - 3xxx: Connection errors reported by a backend
//! - 5xxx: Query execution errors reported by a backend
//! - 6xxx: Data errors (record conversion)
//! - 7xxx: Configuration errors
//!
//! ```rust
//! use tether_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::relation_not_found("User", "orderz");
//! assert_eq!(err.code, ErrorCode::RelationNotFound);
//! assert!(err.to_string().contains("orderz"));
//! ```

use std::fmt;
use thiserror::Error;

/// Result type for hydration operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Relation errors (1xxx)
    /// Relation name does not exist on the model (T1001).
    RelationNotFound = 1001,
    /// Relation descriptor is missing the metadata its kind requires (T1002).
    InvalidDescriptor = 1002,

    // Connection errors (3xxx)
    /// Backend could not reach the store (T3001).
    ConnectionFailed = 3001,

    // Query execution errors (5xxx)
    /// Backend rejected or could not complete the fetch (T5000).
    QueryExecution = 5000,
    /// Query timeout (T5001).
    QueryTimeout = 5001,
    /// General database error (T5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Record could not be converted to the requested type (T6003).
    DeserializationError = 6003,

    // Configuration errors (7xxx)
    /// Invalid configuration (T7001).
    InvalidConfiguration = 7001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T1001").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RelationNotFound => "Relation not found",
            Self::InvalidDescriptor => "Invalid relation descriptor",
            Self::ConnectionFailed => "Database connection failed",
            Self::QueryExecution => "Query execution failed",
            Self::QueryTimeout => "Query timeout",
            Self::DatabaseError => "Database error",
            Self::DeserializationError => "Deserialization error",
            Self::InvalidConfiguration => "Invalid configuration",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The relation or column involved.
    pub field: Option<String>,
    /// The SQL query (if available).
    pub sql: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while hydrating relations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the relation or column.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the SQL query.
    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.context.sql = Some(sql.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create a relation not found error.
    pub fn relation_not_found(model: impl Into<String>, relation: impl Into<String>) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::RelationNotFound,
            format!("Relation '{}' is not declared on model {}", relation, model),
        )
        .with_model(&model)
        .with_field(&relation)
        .with_suggestion(format!("Check the spelling of '{}'", relation))
        .with_suggestion(format!("Register the relation for {} in the catalog", model))
    }

    /// Create an invalid descriptor error.
    pub fn invalid_descriptor(
        model: impl Into<String>,
        relation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::InvalidDescriptor,
            format!("Relation {}.{} is misconfigured: {}", model, relation, reason.into()),
        )
        .with_model(&model)
        .with_field(&relation)
        .with_help("Relation metadata comes from the catalog; fix the registration")
    }

    /// Create a query execution error.
    pub fn query_execution(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::QueryExecution, format!("Query execution failed: {}", message))
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ConnectionFailed, format!("Connection error: {}", message))
            .with_suggestion("Check that the database server is running")
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Query timed out after {}ms", duration_ms),
        )
        .with_suggestion("Narrow the relation with a custom query")
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message.into())
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::DeserializationError,
            format!("Failed to deserialize record: {}", message),
        )
        .with_suggestion("Check that the target type matches the record columns")
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(
            ErrorCode::InvalidConfiguration,
            format!("Invalid configuration: {}", message),
        )
    }

    // ============== Error Checks ==============

    /// Check if this is a relation not found error.
    pub fn is_relation_not_found(&self) -> bool {
        self.code == ErrorCode::RelationNotFound
    }

    /// Check if this is an invalid descriptor error.
    pub fn is_invalid_descriptor(&self) -> bool {
        self.code == ErrorCode::InvalidDescriptor
    }

    /// Check if this error originated in the backend while executing a fetch.
    pub fn is_query_execution(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::QueryExecution
                | ErrorCode::QueryTimeout
                | ErrorCode::DatabaseError
                | ErrorCode::ConnectionFailed
        )
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {}\n", op));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Relation: {}\n", field));
        }

        // SQL (truncated if too long)
        if let Some(ref sql) = self.context.sql {
            let sql_display = if sql.chars().count() > 200 {
                format!("{}...", sql.chars().take(200).collect::<String>())
            } else {
                sql.clone()
            };
            output.push_str(&format!("  → SQL: {}\n", sql_display));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}
