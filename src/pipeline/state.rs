//! Pipeline lifecycle state management

/// Pipeline state machine
///
/// Represents the current state of a pipeline. Transitions are validated
/// so lifecycle misuse surfaces as an error instead of undefined
/// behavior in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Graph constructed, worker not yet running
    Built,

    /// Worker running, callbacks firing
    Playing,

    /// Teardown requested, in-flight callbacks draining
    Draining,

    /// Worker quiesced, resources still held
    Stopped,

    /// Resources released; terminal state
    Destroyed,
}

impl PipelineState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        match (self, target) {
            // From Built
            (Built, Playing) => true,
            (Built, Draining) => true, // destroy without start

            // From Playing
            (Playing, Draining) => true,

            // From Draining
            (Draining, Stopped) => true,

            // From Stopped
            (Stopped, Destroyed) => true,

            // From Destroyed - no transitions allowed
            (Destroyed, _) => false,

            // Self-transitions
            (a, b) if a == b => true,

            // All other transitions invalid
            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            PipelineState::Built => "Built",
            PipelineState::Playing => "Playing",
            PipelineState::Draining => "Draining",
            PipelineState::Stopped => "Stopped",
            PipelineState::Destroyed => "Destroyed",
        }
    }

    /// Check if the pipeline worker is active
    pub fn is_playing(&self) -> bool {
        matches!(self, PipelineState::Playing)
    }

    /// Check if teardown has begun or completed
    pub fn is_shutting_down(&self) -> bool {
        matches!(
            self,
            PipelineState::Draining | PipelineState::Stopped | PipelineState::Destroyed
        )
    }

    /// Check if the pipeline has been fully released
    pub fn is_destroyed(&self) -> bool {
        matches!(self, PipelineState::Destroyed)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
