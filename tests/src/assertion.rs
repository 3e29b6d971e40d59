//! Assertion builders for verifying patch results.

use canopy_patch::{PatchErrorKind, PatchResult};
use serde_json::Value;

use crate::error::{ScenarioError, ScenarioResult};

/// Expectations for one step.
#[derive(Default)]
pub struct Assertion {
    pub success: Option<bool>,
    pub rolled_back: Option<bool>,
    pub outcomes: Option<usize>,
    pub created: Option<usize>,
    pub max_depth: Option<usize>,

    // Error assertions
    pub kind: Option<PatchErrorKind>,
    pub operation: Option<String>,
    pub patch_index: Option<usize>,
    pub node_id: Option<Option<String>>,
    pub message: Option<String>,

    /// The observable tree must equal the state before the step.
    pub unchanged: bool,

    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&PatchResult) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("success", &self.success)
            .field("rolled_back", &self.rolled_back)
            .field("created", &self.created)
            .field("kind", &self.kind)
            .field("operation", &self.operation)
            .field("node_id", &self.node_id)
            .field("unchanged", &self.unchanged)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeds(mut self) -> Self {
        self.success = Some(true);
        self
    }

    pub fn fails(mut self) -> Self {
        self.success = Some(false);
        self
    }

    pub fn rolled_back(mut self, rolled_back: bool) -> Self {
        self.rolled_back = Some(rolled_back);
        self
    }

    pub fn outcomes(mut self, n: usize) -> Self {
        self.outcomes = Some(n);
        self
    }

    /// Total number of created nodes over all outcomes.
    pub fn created(mut self, n: usize) -> Self {
        self.created = Some(n);
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn kind(mut self, kind: PatchErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn patch_index(mut self, index: usize) -> Self {
        self.patch_index = Some(index);
        self
    }

    pub fn node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(Some(node_id.into()));
        self
    }

    pub fn message(mut self, fragment: impl Into<String>) -> Self {
        self.message = Some(fragment.into());
        self
    }

    pub fn unchanged(mut self) -> Self {
        self.unchanged = true;
        self
    }

    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&PatchResult) -> bool + Send + Sync + 'static,
    {
        self.custom = Some(Box::new(f));
        self
    }

    /// Verify the assertion against a result and the tree before and after.
    pub fn verify(
        &self,
        step: &str,
        result: &PatchResult,
        before: &Value,
        after: &Value,
    ) -> ScenarioResult<()> {
        let fail = |message: String| Err(ScenarioError::assertion_failed(step, message));

        if let Some(expected) = self.success {
            if result.success != expected {
                return fail(format!(
                    "expected success={}, got {} (error: {:?})",
                    expected, result.success, result.error
                ));
            }
        }
        if let Some(expected) = self.rolled_back {
            if result.rolled_back != expected {
                return fail(format!(
                    "expected rolled_back={}, got {}",
                    expected, result.rolled_back
                ));
            }
        }
        if let Some(expected) = self.outcomes {
            if result.outcomes.len() != expected {
                return fail(format!(
                    "expected {} outcomes, got {}",
                    expected,
                    result.outcomes.len()
                ));
            }
        }
        if let Some(expected) = self.created {
            let actual = result.created_nodes().count();
            if actual != expected {
                return fail(format!("expected {} created nodes, got {}", expected, actual));
            }
        }
        if let Some(expected) = self.max_depth {
            let actual = result.created_nodes().map(|n| n.depth).max().unwrap_or(0);
            if actual != expected {
                return fail(format!("expected max depth {}, got {}", expected, actual));
            }
        }

        self.verify_error(step, result)?;

        if self.unchanged && before != after {
            return fail("expected the tree to be unchanged".to_string());
        }

        if let Some(ref custom) = self.custom {
            if !custom(result) {
                return fail("custom assertion failed".to_string());
            }
        }

        Ok(())
    }

    fn verify_error(&self, step: &str, result: &PatchResult) -> ScenarioResult<()> {
        let expects_error = self.kind.is_some()
            || self.operation.is_some()
            || self.patch_index.is_some()
            || self.node_id.is_some()
            || self.message.is_some();
        if !expects_error {
            return Ok(());
        }
        let Some(error) = &result.error else {
            return Err(ScenarioError::assertion_failed(
                step,
                "expected an error, but the batch succeeded",
            ));
        };

        let mismatch = |what: &str, expected: String, actual: String| {
            Err(ScenarioError::assertion_failed(
                step,
                format!("expected error {} {}, got {}", what, expected, actual),
            ))
        };
        if let Some(kind) = self.kind {
            if error.kind != kind {
                return mismatch("kind", format!("{:?}", kind), format!("{:?}", error.kind));
            }
        }
        if let Some(ref operation) = self.operation {
            if &error.operation != operation {
                return mismatch("operation", operation.clone(), error.operation.clone());
            }
        }
        if let Some(index) = self.patch_index {
            if error.patch_index != index {
                return mismatch("index", index.to_string(), error.patch_index.to_string());
            }
        }
        if let Some(ref node_id) = self.node_id {
            let actual = error.node_id.as_ref().map(|id| id.to_string());
            if &actual != node_id {
                return mismatch("node id", format!("{:?}", node_id), format!("{:?}", actual));
            }
        }
        if let Some(ref fragment) = self.message {
            if !error.message.contains(fragment.as_str()) {
                return mismatch("message containing", fragment.clone(), error.message.clone());
            }
        }
        Ok(())
    }
}
