//! Per-call validation options

use serde::{Deserialize, Serialize};

/// What to do with a `denyXSS` value that contains markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XssPolicy {
    /// Remove the markup and keep validating the cleaned value
    #[default]
    Strip,
    /// Record an `xss` violation
    Reject,
}

/// Options for one validate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Abort the walk after the first violation
    pub stop_on_first_error: bool,
    pub xss_policy: XssPolicy,
    /// Run field transforms. Transforms are not assumed idempotent, so
    /// re-checking stored documents should turn this off.
    pub run_transforms: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            stop_on_first_error: false,
            xss_policy: XssPolicy::Strip,
            run_transforms: true,
        }
    }
}

impl ValidateOptions {
    /// Options for re-checking already normalized documents.
    pub fn recheck() -> Self {
        Self {
            run_transforms: false,
            ..Self::default()
        }
    }

    pub fn stop_on_first_error(mut self) -> Self {
        self.stop_on_first_error = true;
        self
    }

    pub fn with_xss_policy(mut self, policy: XssPolicy) -> Self {
        self.xss_policy = policy;
        self
    }
}
