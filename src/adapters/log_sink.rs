//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing controller events through the `log`
//! facade (which DPrint routes to syslog, stdout or a file).  A console or
//! telemetry adapter would implement the same trait.

use log::info;

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControllerEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    /// Print logging status tables to stdout as well, for interactive use.
    echo_status: bool,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that also prints [`ControllerEvent::LoggingStatus`] tables to
    /// stdout.
    pub fn interactive() -> Self {
        Self { echo_status: true }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Started(state) => {
                info!("START | initial_state={state}");
            }
            ControllerEvent::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            ControllerEvent::ModulesReady => {
                info!("READY | all modules ready");
            }
            ControllerEvent::CurrentState(path) => {
                let names: Vec<String> = path.iter().map(ToString::to_string).collect();
                if self.echo_status {
                    println!("{}", names.join(" > "));
                } else {
                    info!("STATE | {}", names.join(" > "));
                }
            }
            ControllerEvent::LoggingStatus(lines) => {
                for line in lines {
                    if self.echo_status {
                        println!("{line}");
                    } else {
                        info!("{line}");
                    }
                }
            }
        }
    }
}
