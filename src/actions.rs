//! The action capability, the name → factory registry, and the built-in
//! actions.
//!
//! Actions are configured once at load time and invoked once per violation.
//! An action's internal fault (a pattern that no longer compiles, a missing
//! value) is recovered locally and reported through `tracing`; it never
//! affects the outcome of the validation pass.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::enums::{ActionOutcome, LogLevel};
use crate::error::{ConfigError, ConfigErrorKind};
use crate::request::MutableRequest;
use crate::response::MutableResponse;
use crate::types::ActionDef;
use crate::violation::Violation;

/// A unit of work run against one violation.
///
/// Implementations must be safe to invoke concurrently for independent
/// requests; any shared external resource needs its own internal
/// mutual-exclusion discipline.
pub trait Action: Send + Sync {
    /// Called once at load time with the parameter bag from configuration.
    fn configure(&mut self, parameters: &HashMap<String, String>) -> Result<(), ConfigError>;

    /// Run against one violation. Returning [`ActionOutcome::Break`] stops
    /// the remaining actions of this violation's chain.
    fn invoke(
        &self,
        violation: &Violation,
        request: &mut MutableRequest,
        response: &mut MutableResponse,
    ) -> ActionOutcome;
}

// ─── Registry ───────────────────────────────────────────────────────────────

type ActionFactory = Box<dyn Fn() -> Box<dyn Action> + Send + Sync>;

/// Maps capability names to action factories.
///
/// Configuration references actions by registry key; an unresolvable name is
/// a configuration error at compile time, never a runtime surprise.
pub struct ActionRegistry {
    factories: HashMap<String, ActionFactory>,
}

impl ActionRegistry {
    /// An empty registry. Most callers want [`with_builtins`](Self::with_builtins).
    pub fn new() -> Self {
        ActionRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry pre-populated with the built-in actions: `scrub`, `log`,
    /// `redirect`, `forward`, and `display-message`.
    pub fn with_builtins() -> Self {
        let mut registry = ActionRegistry::new();
        registry.register("scrub", || Box::new(Scrub));
        registry.register("log", || Box::<Log>::default());
        registry.register("redirect", || Box::<Redirect>::default());
        registry.register("forward", || Box::<Forward>::default());
        registry.register("display-message", || Box::<DisplayMessage>::default());
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Action> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiate and configure the action a definition refers to.
    pub(crate) fn instantiate(
        &self,
        def: &ActionDef,
        path: &str,
    ) -> Result<Arc<dyn Action>, ConfigError> {
        let factory = self.factories.get(&def.name).ok_or_else(|| ConfigError {
            kind: ConfigErrorKind::UnknownAction,
            path: path.to_string(),
            message: format!("unknown action '{}'", def.name),
        })?;

        let mut action = factory();
        action.configure(&def.parameters()).map_err(|mut e| {
            if e.path.is_empty() {
                e.path = path.to_string();
            }
            e
        })?;

        Ok(Arc::from(action))
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        ActionRegistry::with_builtins()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ActionRegistry").field("actions", &names).finish()
    }
}

fn missing_parameter(name: &str) -> ConfigError {
    ConfigError {
        kind: ConfigErrorKind::BadActionParameter,
        path: String::new(),
        message: format!("required action parameter '{}' is missing", name),
    }
}

// ─── scrub ──────────────────────────────────────────────────────────────────

/// Rewrites the offending parameter value in place, keeping only the
/// characters that individually satisfy the violated rule's pattern.
#[derive(Clone, Copy, Debug, Default)]
pub struct Scrub;

impl Action for Scrub {
    fn configure(&mut self, _parameters: &HashMap<String, String>) -> Result<(), ConfigError> {
        Ok(())
    }

    fn invoke(
        &self,
        violation: &Violation,
        request: &mut MutableRequest,
        _response: &mut MutableResponse,
    ) -> ActionOutcome {
        let (Some(name), Some(value)) = (violation.name(), violation.value()) else {
            return ActionOutcome::Continue;
        };
        if value.is_empty() {
            return ActionOutcome::Continue;
        }

        let pattern = match Regex::new(&format!("^(?:{})$", violation.pattern())) {
            Ok(p) => p,
            Err(e) => {
                error!(pattern = violation.pattern(), %e, "scrub: pattern failed to compile");
                return ActionOutcome::Continue;
            }
        };

        let mut buf = [0u8; 4];
        let scrubbed: String = value
            .chars()
            .filter(|c| pattern.is_match(c.encode_utf8(&mut buf)))
            .collect();

        request.replace_parameter_value(name, value, &scrubbed);
        info!(parameter = name, from = value, to = %scrubbed, "scrubbed parameter value");

        ActionOutcome::Continue
    }
}

// ─── log ────────────────────────────────────────────────────────────────────

/// Emits a `tracing` event for the violation at a configured level.
///
/// The message template expands `%ip`, `%uri`, `%name`, `%value`,
/// `%encoded_value` (HTML-entity encoded) and `%session` (the value of the
/// cookie named by the `session` parameter). Sinks — files, collectors —
/// belong to the subscriber the embedding application installs.
#[derive(Clone, Debug)]
pub struct Log {
    level: LogLevel,
    message: String,
    session_cookie: String,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: LogLevel::Warn,
            message: "request violation on %uri: %name=%encoded_value".to_string(),
            session_cookie: "SESSION".to_string(),
        }
    }
}

impl Action for Log {
    fn configure(&mut self, parameters: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(level) = parameters.get("level") {
            self.level = match level.as_str() {
                "debug" => LogLevel::Debug,
                "info" => LogLevel::Info,
                "warn" => LogLevel::Warn,
                "error" => LogLevel::Error,
                other => {
                    return Err(ConfigError {
                        kind: ConfigErrorKind::BadActionParameter,
                        path: String::new(),
                        message: format!("unknown log level '{}'", other),
                    });
                }
            };
        }
        if let Some(message) = parameters.get("message") {
            self.message = message.clone();
        }
        if let Some(session) = parameters.get("session") {
            self.session_cookie = session.clone();
        }
        Ok(())
    }

    fn invoke(
        &self,
        violation: &Violation,
        request: &mut MutableRequest,
        _response: &mut MutableResponse,
    ) -> ActionOutcome {
        let message = self.expand(violation, request);

        match self.level {
            LogLevel::Debug => debug!(target: "stinger::violation", "{}", message),
            LogLevel::Info => info!(target: "stinger::violation", "{}", message),
            LogLevel::Warn => warn!(target: "stinger::violation", "{}", message),
            LogLevel::Error => error!(target: "stinger::violation", "{}", message),
        }

        ActionOutcome::Continue
    }
}

impl Log {
    fn expand(&self, violation: &Violation, request: &MutableRequest) -> String {
        let value = violation.value().unwrap_or("NULL");
        let session = request
            .cookie(&self.session_cookie)
            .map(|c| c.value().to_string())
            .unwrap_or_else(|| "NULL".to_string());

        self.message
            .replace("%ip", request.remote_addr().unwrap_or("NULL"))
            .replace("%uri", violation.uri())
            .replace("%name", violation.name().unwrap_or("NULL"))
            .replace("%encoded_value", &encode_entities(value))
            .replace("%value", value)
            .replace("%session", &session)
    }
}

/// Minimal HTML-entity encoding for values echoed into logs or markup.
fn encode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

// ─── redirect ───────────────────────────────────────────────────────────────

/// Records a client redirect on the response and aborts the violation's
/// remaining chain — once the user is being sent elsewhere, later actions
/// have nothing to act on.
#[derive(Clone, Debug, Default)]
pub struct Redirect {
    location: String,
}

impl Action for Redirect {
    fn configure(&mut self, parameters: &HashMap<String, String>) -> Result<(), ConfigError> {
        self.location = parameters
            .get("location")
            .cloned()
            .ok_or_else(|| missing_parameter("location"))?;
        Ok(())
    }

    fn invoke(
        &self,
        violation: &Violation,
        _request: &mut MutableRequest,
        response: &mut MutableResponse,
    ) -> ActionOutcome {
        debug!(location = %self.location, %violation, "redirecting");
        response.send_redirect(&self.location);
        ActionOutcome::Break
    }
}

// ─── forward ────────────────────────────────────────────────────────────────

/// Records an internal forward to another handler and aborts the chain.
#[derive(Clone, Debug, Default)]
pub struct Forward {
    page: String,
}

impl Action for Forward {
    fn configure(&mut self, parameters: &HashMap<String, String>) -> Result<(), ConfigError> {
        self.page = parameters
            .get("page")
            .cloned()
            .ok_or_else(|| missing_parameter("page"))?;
        Ok(())
    }

    fn invoke(
        &self,
        violation: &Violation,
        _request: &mut MutableRequest,
        response: &mut MutableResponse,
    ) -> ActionOutcome {
        debug!(page = %self.page, %violation, "forwarding");
        response.forward_to(&self.page);
        ActionOutcome::Break
    }
}

// ─── display-message ────────────────────────────────────────────────────────

/// Appends a formatted HTML fragment to the response body.
#[derive(Clone, Debug)]
pub struct DisplayMessage {
    message: String,
    bgcolor: String,
}

impl Default for DisplayMessage {
    fn default() -> Self {
        DisplayMessage {
            message: String::new(),
            bgcolor: "#ffcccc".to_string(),
        }
    }
}

impl Action for DisplayMessage {
    fn configure(&mut self, parameters: &HashMap<String, String>) -> Result<(), ConfigError> {
        self.message = parameters
            .get("message")
            .cloned()
            .ok_or_else(|| missing_parameter("message"))?;
        if let Some(bgcolor) = parameters.get("bgcolor") {
            self.bgcolor = bgcolor.clone();
        }
        Ok(())
    }

    fn invoke(
        &self,
        _violation: &Violation,
        _request: &mut MutableRequest,
        response: &mut MutableResponse,
    ) -> ActionOutcome {
        response.write(&format!(
            "<table width=\"300\" border=\"1\" align=\"center\" bgcolor=\"{}\" cellpadding=\"2\">\n\
             <tr><td><div align=\"center\">{}</div></td></tr></table>\n",
            self.bgcolor,
            encode_entities(&self.message),
        ));
        ActionOutcome::Continue
    }
}
