//! Fault point injection for testing submission atomicity
//!
//! A fault point is a named location in the store's write path. When armed
//! with a hit number, the n-th pass through that point fails with an
//! injected error, which the store treats like any other storage failure.
//!
//! # Usage
//!
//! ```ignore
//! use survey_collector::fault_point::{points, FaultPoints};
//!
//! let faults = FaultPoints::new();
//! faults.arm(points::RESPONSE_INSERT, 20);
//! ```
//!
//! Process-wide arming is read from `SURVEY_FAULT_POINT=<name>:<hit>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Environment variable consulted by [`FaultPoints::from_env`]
pub const FAULT_POINT_ENV: &str = "SURVEY_FAULT_POINT";

/// A triggered fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedFault {
    pub point: String,
    pub hit: u32,
}

#[derive(Debug, Default)]
struct Armed {
    /// point name -> (hit that fails, hits seen so far)
    points: HashMap<String, (u32, u32)>,
}

/// Shared set of armed fault points.
///
/// Cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct FaultPoints {
    inner: Arc<Mutex<Armed>>,
}

impl FaultPoints {
    /// Creates an empty set with nothing armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `SURVEY_FAULT_POINT`; unset or unparsable means nothing armed.
    pub fn from_env() -> Self {
        let faults = Self::new();
        if let Ok(raw) = std::env::var(FAULT_POINT_ENV) {
            if let Some((name, hit)) = parse_spec(&raw) {
                faults.arm(&name, hit);
            }
        }
        faults
    }

    /// Arms `point` so that its `hit`-th pass (1-based) fails.
    pub fn arm(&self, point: &str, hit: u32) {
        if let Ok(mut armed) = self.inner.lock() {
            armed.points.insert(point.to_string(), (hit.max(1), 0));
        }
    }

    /// Disarms every point.
    pub fn clear(&self) {
        if let Ok(mut armed) = self.inner.lock() {
            armed.points.clear();
        }
    }

    pub fn is_armed(&self, point: &str) -> bool {
        self.inner
            .lock()
            .map(|armed| armed.points.contains_key(point))
            .unwrap_or(false)
    }

    /// Records a pass through `point`, failing on the armed hit.
    ///
    /// A point disarms itself after firing once.
    pub fn check(&self, point: &str) -> Result<(), InjectedFault> {
        let Ok(mut armed) = self.inner.lock() else {
            return Ok(());
        };
        let Some((target, seen)) = armed.points.get_mut(point) else {
            return Ok(());
        };

        *seen += 1;
        if *seen == *target {
            let hit = *seen;
            armed.points.remove(point);
            return Err(InjectedFault {
                point: point.to_string(),
                hit,
            });
        }
        Ok(())
    }
}

fn parse_spec(raw: &str) -> Option<(String, u32)> {
    let (name, hit) = raw.trim().split_once(':')?;
    let hit = hit.parse().ok()?;
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), hit))
}

/// All defined fault point names
pub mod points {
    pub const SURVEY_INSERT: &str = "survey_insert";
    pub const RESPONSE_INSERT: &str = "response_insert";
    pub const BEFORE_COMMIT: &str = "before_commit";

    /// Get all fault point names
    pub fn all() -> &'static [&'static str] {
        &[SURVEY_INSERT, RESPONSE_INSERT, BEFORE_COMMIT]
    }
}
