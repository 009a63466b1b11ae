//! Diagnostics emitted while reconciling renames.
//!
//! The engines never log conflicts on their own; they report them to a
//! [`DiagnosticsSink`] supplied by the caller.

use std::fmt;

use serde::Serialize;
use tracing::info;

use pea_core::types::TargetId;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
}

/// A non-fatal message produced by the aliasing engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Target the message is about, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetId>,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Capability to record diagnostics
pub trait DiagnosticsSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in emission order
impl DiagnosticsSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for &mut S {
    fn emit(&mut self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

/// Fan out to two sinks
impl<A: DiagnosticsSink, B: DiagnosticsSink> DiagnosticsSink for (A, B) {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.0.emit(diagnostic.clone());
        self.1.emit(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        match &diagnostic.target {
            Some(target) => info!(target_id = %target, "{}", diagnostic.message),
            None => info!("{}", diagnostic.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects_in_order() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.emit(Diagnostic::info("first"));
        sink.emit(Diagnostic::info("second").with_target(TargetId::new("app", "App")));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].message, "first");
        assert_eq!(sink[1].target, Some(TargetId::new("app", "App")));
    }

    #[test]
    fn test_tuple_sink_fans_out() {
        let mut collected: Vec<Diagnostic> = Vec::new();
        {
            let mut sink = (&mut collected, TracingSink);
            sink.emit(Diagnostic::info("dropped alias"));
        }
        assert_eq!(collected, vec![Diagnostic::info("dropped alias")]);
    }

    #[test]
    fn test_display_and_serialize() {
        let diagnostic = Diagnostic::info("alias dropped");
        assert_eq!(diagnostic.to_string(), "info: alias dropped");

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["severity"], "info");
        assert!(json.get("target").is_none());
    }
}
