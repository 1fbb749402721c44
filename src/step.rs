use std::fmt;

/// Largest step id the scheduler hands out to ordinary steps.
pub const MAX_NORMAL_STEP_ID: u32 = 0xffff_fff0;
/// Step still waiting for resources.
pub const PENDING_STEP: u32 = 0xffff_fffd;
/// Extern container step that adopts processes outside the step.
pub const EXTERN_CONT: u32 = 0xffff_fffc;
/// The batch script.
pub const BATCH_SCRIPT: u32 = 0xffff_fffb;
/// Interactive step started by `salloc`.
pub const INTERACTIVE_STEP: u32 = 0xffff_fffa;

/// Kind of step behind a raw step id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Normal(u32),
    Batch,
    Extern,
    Interactive,
    Pending,
    /// A reserved value this plugin does not know about
    Reserved(u32),
}

impl StepId {
    pub const fn from_raw(raw: u32) -> Self {
        if raw <= MAX_NORMAL_STEP_ID {
            return Self::Normal(raw);
        }
        match raw {
            PENDING_STEP => Self::Pending,
            EXTERN_CONT => Self::Extern,
            BATCH_SCRIPT => Self::Batch,
            INTERACTIVE_STEP => Self::Interactive,
            other => Self::Reserved(other),
        }
    }

    pub const fn as_raw(self) -> u32 {
        match self {
            Self::Normal(raw) | Self::Reserved(raw) => raw,
            Self::Pending => PENDING_STEP,
            Self::Extern => EXTERN_CONT,
            Self::Batch => BATCH_SCRIPT,
            Self::Interactive => INTERACTIVE_STEP,
        }
    }
}

impl From<u32> for StepId {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

/// Job and step ids of the current invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobStepIdentity {
    pub job_id: u32,
    pub step_id: StepId,
}

impl JobStepIdentity {
    pub fn new<S: Into<StepId>>(job_id: u32, step_id: S) -> Self {
        Self {
            job_id,
            step_id: step_id.into(),
        }
    }
}

impl fmt::Display for JobStepIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step_id {
            StepId::Normal(step) => write!(f, "{}.{}", self.job_id, step),
            StepId::Batch => write!(f, "{}.batch", self.job_id),
            StepId::Extern => write!(f, "{}.extern", self.job_id),
            StepId::Interactive => write!(f, "{}.interactive", self.job_id),
            StepId::Pending => write!(f, "{}.pending", self.job_id),
            StepId::Reserved(raw) => write!(f, "{}.{:#x}", self.job_id, raw),
        }
    }
}
