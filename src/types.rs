// src/types.rs

use std::str::FromStr;
use std::time::Duration;

use nix::sys::signal::Signal;
use serde::Deserialize;

/// Which tracked paths a watch inspects for deletions during a pass.
///
/// - `Watch`: only tracked paths that match the pattern of the watch being
///   evaluated (default).
/// - `All`: every tracked path of the job. A deletion anywhere triggers the
///   action of whichever watch is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionScope {
    Watch,
    All,
}

impl Default for DeletionScope {
    fn default() -> Self {
        DeletionScope::Watch
    }
}

impl FromStr for DeletionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "watch" => Ok(DeletionScope::Watch),
            "all" => Ok(DeletionScope::All),
            other => Err(format!(
                "invalid deletion_scope: {other} (expected \"watch\" or \"all\")"
            )),
        }
    }
}

/// Signal as written in the config: either a raw number or a name such as
/// `"SIGHUP"` / `"HUP"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SignalSpec {
    Number(i32),
    Name(String),
}

impl SignalSpec {
    /// Resolve to a concrete signal. `Ok(None)` means signal 0, i.e. deliver
    /// nothing.
    pub fn resolve(&self) -> Result<Option<Signal>, String> {
        match self {
            SignalSpec::Number(0) => Ok(None),
            SignalSpec::Number(n) => Signal::try_from(*n)
                .map(Some)
                .map_err(|e| format!("unknown signal number {n}: {e}")),
            SignalSpec::Name(name) => parse_signal_name(name).map(Some),
        }
    }
}

fn parse_signal_name(name: &str) -> Result<Signal, String> {
    let upper = name.trim().to_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    Signal::from_str(&full).map_err(|e| format!("unknown signal name '{name}': {e}"))
}

/// Parse a duration string such as `"500ms"`, `"5s"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ))
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
