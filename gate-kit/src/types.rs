//! Shared gate vocabulary: modes, event statuses and the gate context

use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Action a preflight run is admitting.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    Plan,
    Execute,
}

impl GateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Execute => "execute",
        }
    }
}

impl fmt::Display for GateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plan" => Ok(Self::Plan),
            "execute" => Ok(Self::Execute),
            other => Err(format!("unknown gate mode '{other}' (expected plan or execute)")),
        }
    }
}

/// Status recorded on every audit event.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pass,
    Fail,
    Warn,
    Info,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warn => "warn",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "unknown event status '{other}' (expected pass, fail, warn or info)"
            )),
        }
    }
}

/// Context threaded through every gate stage and every emitted event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateContext {
    pub mode: GateMode,
    pub phase: String,
    pub agent: String,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_class: Option<String>,
}

impl GateContext {
    /// Context with `phase` set to the mode name.
    pub fn new(mode: GateMode, agent: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            mode,
            phase: mode.as_str().to_string(),
            agent: agent.into(),
            pattern: pattern.into(),
            task_id: None,
            spec_id: None,
            task_class: None,
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    pub fn with_task_id(mut self, task_id: Option<String>) -> Self {
        self.task_id = task_id;
        self
    }

    pub fn with_task_class(mut self, task_class: Option<String>) -> Self {
        self.task_class = task_class;
        self
    }
}
