use super::launchpad::FwState;
use crate::core::models::ids::FwId;

#[derive(Debug, Clone)]
pub enum Progress {
    LaunchStart { fw_id: FwId, name: String, total_tasks: u64 },
    TaskStart { index: usize, name: String },
    LaunchFinish { fw_id: FwId, state: FwState },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
