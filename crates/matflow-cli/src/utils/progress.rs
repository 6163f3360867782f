use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use matflow::engine::launchpad::FwState;
use matflow::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use tracing::warn;

#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb_guard) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::LaunchStart {
                    fw_id,
                    name,
                    total_tasks,
                } => {
                    pb_guard.reset();
                    pb_guard.set_length(total_tasks);
                    pb_guard.set_position(0);
                    pb_guard.set_style(Self::bar_style());
                    pb_guard.set_prefix(format!("[{fw_id}]"));
                    pb_guard.set_message(name);
                }
                Progress::TaskStart { index, name } => {
                    pb_guard.set_position(index as u64);
                    pb_guard.set_message(name);
                }
                Progress::LaunchFinish { state, .. } => {
                    let length = pb_guard.length().unwrap_or(0);
                    match state {
                        FwState::Completed => {
                            pb_guard.set_position(length);
                            pb_guard.finish_with_message("✓ Completed");
                        }
                        other => pb_guard.abandon_with_message(format!("✗ {other:?}")),
                    }
                }
                Progress::Message(msg) => {
                    if !pb_guard.is_finished() {
                        pb_guard.println(format!("  {}", msg));
                    } else {
                        pb_guard.set_message(msg);
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Failed to create spinner style template")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:>6} {msg:<32} [{bar:30.cyan/blue}] {pos}/{len} ({elapsed})")
            .expect("Failed to create bar style template")
            .with_key(
                "elapsed",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.elapsed().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
