use std::collections::BTreeMap;
use std::fmt;
use tracing::Level;

/// Tags attached to every line a component logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub component: &'static str,
    /// Tracked contract, e.g. "tempo 6kVA"
    pub contract: Option<String>,
    pub tags: BTreeMap<&'static str, String>,
}

impl LogContext {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            contract: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    pub fn with_field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.tags.insert(key, value.into());
        self
    }
}

/// `key=value` pairs after the component, in key order
impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(contract) = &self.contract {
            write!(f, "contract={}", contract)?;
            sep = ",";
        }
        for (key, value) in &self.tags {
            write!(f, "{}{}={}", sep, key, value)?;
            sep = ",";
        }
        Ok(())
    }
}

/// Logger stamping each event with `component` and its context tags
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    pub(crate) context: LogContext,
}

impl StructuredLogger {
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::INFO, message);
    }

    pub fn warn(&self, message: &str) {
        self.emit(Level::WARN, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::ERROR, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message);
    }

    fn emit(&self, level: Level, message: &str) {
        let component = self.context.component;
        let context = &self.context;
        // tracing needs the level as a constant at each call site
        match level {
            Level::ERROR => tracing::error!(component, %context, "{}", message),
            Level::WARN => tracing::warn!(component, %context, "{}", message),
            Level::INFO => tracing::info!(component, %context, "{}", message),
            _ => tracing::debug!(component, %context, "{}", message),
        }
    }
}

pub fn get_logger(component: &'static str) -> StructuredLogger {
    StructuredLogger::new(LogContext::new(component))
}

pub fn get_logger_with_context(context: LogContext) -> StructuredLogger {
    StructuredLogger::new(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_renders_tags_in_key_order() {
        let context = LogContext::new("tempo")
            .with_contract("tempo 9kVA")
            .with_field("b", "2")
            .with_field("a", String::from("1"));
        assert_eq!(context.component, "tempo");
        assert_eq!(context.to_string(), "contract=tempo 9kVA,a=1,b=2");
    }

    #[test]
    fn bare_component_has_empty_context() {
        let logger = get_logger("web");
        assert_eq!(logger.context.component, "web");
        assert_eq!(logger.context.to_string(), "");
        // No subscriber installed: must not panic
        logger.info("listening");
        logger.debug("detail");
    }
}
