use std::time::Duration;

/// Tunables shared by the sessions, their drivers and the built-in
/// collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// Upper bound on any single segmenter, compositor or lifter call
    pub call_timeout: Duration,
    /// Minimum mask alpha for a point to count as on the subject
    pub lift_threshold: f32,
    /// RGB distance from the key color treated as pure background
    pub key_tolerance: f32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            lift_threshold: 0.5,
            key_tolerance: 60.0,
        }
    }
}
