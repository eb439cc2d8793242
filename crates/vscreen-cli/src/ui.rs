use indicatif::{
    HumanDuration, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::warn;
use vscreen::engine::progress::{Progress, ProgressCallback};

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

pub struct UiManager {
    mp: Arc<MultiProgress>,
    phase: Option<PhaseState>,
    event_receiver: mpsc::Receiver<UiEvent>,
    shutdown_receiver: watch::Receiver<bool>,
    _sentinel_bar: ProgressBar,
}

/// The phase currently on screen.
struct PhaseState {
    name: &'static str,
    started: Instant,
    bar: ProgressBar,
    /// Set once the phase turns into a counted batch of jobs.
    jobs: Option<u64>,
    status: Option<String>,
}

impl PhaseState {
    fn label(&self) -> String {
        match &self.status {
            Some(status) => format!("{} ({})", self.name, status),
            None => self.name.to_string(),
        }
    }

    /// One-line record left on screen when the phase ends, e.g.
    /// `✓ Docking: 480/500 jobs in 2 hours (cancelling)`.
    fn summary_line(&self) -> String {
        let elapsed = HumanDuration(self.started.elapsed());
        let mut line = match self.jobs {
            Some(total) => format!(
                "✓ {}: {}/{} jobs in {}",
                self.name,
                self.bar.position(),
                total,
                elapsed
            ),
            None => format!("✓ {} ({})", self.name, elapsed),
        };
        if let Some(status) = &self.status {
            line.push_str(&format!(" ({})", status));
        }
        line
    }
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, event_receiver) = mpsc::channel(1024);
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        let mp = Arc::new(MultiProgress::new());
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        let _sentinel_bar = mp.add(ProgressBar::hidden());
        let manager = Self {
            mp,
            phase: None,
            event_receiver,
            shutdown_receiver,
            _sentinel_bar,
        };

        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.event_receiver.recv() => {
                    self.handle_event(event);
                }
                result = self.shutdown_receiver.changed() => {
                    if result.is_err() || *self.shutdown_receiver.borrow() {
                        break;
                    }
                }
            }
        }
        while let Ok(event) = self.event_receiver.try_recv() {
            self.handle_event(event);
        }
        if let Some(phase) = self.phase.take() {
            phase.bar.finish_and_clear();
        }
        self._sentinel_bar.finish_and_clear();
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => {
                self.mp.println(msg).ok();
            }
            UiEvent::Progress(progress) => self.handle_progress(progress),
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                if let Some(previous) = self.phase.take() {
                    previous.bar.finish_and_clear();
                }

                let bar = self.mp.add(ProgressBar::new_spinner());
                bar.enable_steady_tick(Duration::from_millis(80));
                bar.set_style(Self::spinner_style());
                bar.set_message(name);

                self.phase = Some(PhaseState {
                    name,
                    started: Instant::now(),
                    bar,
                    jobs: None,
                    status: None,
                });
            }
            Progress::PhaseFinish => {
                if let Some(phase) = self.phase.take() {
                    phase.bar.finish_and_clear();
                    self.mp.println(phase.summary_line()).ok();
                }
            }
            Progress::TaskStart { total_steps } => {
                if let Some(phase) = self.phase.as_mut() {
                    phase.jobs = Some(total_steps);
                    phase.bar.disable_steady_tick();
                    phase.bar.set_style(Self::jobs_style());
                    phase.bar.set_length(total_steps);
                    phase.bar.set_position(0);
                }
            }
            Progress::TaskIncrement => {
                if let Some(phase) = self.phase.as_ref() {
                    phase.bar.inc(1);
                }
            }
            Progress::TaskFinish => {
                if let Some(phase) = self.phase.as_ref() {
                    phase.bar.finish();
                }
            }
            Progress::StatusUpdate { text } => {
                if let Some(phase) = self.phase.as_mut() {
                    phase.status = Some(text);
                    phase.bar.set_message(phase.label());
                }
            }
            Progress::Message(msg) => {
                self.mp.println(format!("  {}", msg)).ok();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .expect("Invalid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }

    /// Docking batches are long; show throughput in jobs per minute next to the count.
    fn jobs_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} jobs, {rate} ({eta})",
        )
        .expect("Invalid template")
        .with_key(
            "rate",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let per_minute = state.per_sec() * 60.0;
                let _ = write!(w, "{:.1}/min", per_minute);
            },
        )
        .with_key(
            "eta",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{}", HumanDuration(state.eta()));
            },
        )
        .progress_chars("━╸ ")
    }
}

#[derive(Clone)]
pub struct CliProgressHandler {
    sender: mpsc::Sender<UiEvent>,
}

impl CliProgressHandler {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                warn!("Failed to send progress update to UI channel: {}", e);
            }
        })
    }
}
