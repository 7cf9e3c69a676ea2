//! Target types for remote execution

use serde::{Deserialize, Serialize};

/// Where a command runs: one container of one pod in one namespace
///
/// Names are taken as the caller supplies them; the control plane is the
/// authority on whether they exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecTarget {
    /// Namespace the pod lives in
    pub namespace: String,
    /// Pod name
    pub pod: String,
    /// Container within the pod
    pub container: String,
}

impl ExecTarget {
    /// Create a new target
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pod: pod.into(),
            container: container.into(),
        }
    }
}

impl std::fmt::Display for ExecTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.pod, self.container)
    }
}
