//! productctl: drive the product controller from the console.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  stdin reader thread                                          │
//! │    "ready lpm" / "intent power" / "loglevel all 6" ...         │
//! │        │ parse_line()                                         │
//! │        ▼                                                      │
//! │  MAILBOX (Channel<CriticalSectionRawMutex, ControllerMsg, N>) │
//! │        │                                                      │
//! │        ▼  block_on(MAILBOX.run(..))                           │
//! │  ProductController<LogPorts>  ──▶  LogEventSink               │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `productctl [config.json]`.  Type `help` for the command list.

use std::io::BufRead as _;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use productctl::adapters::log_ports::LogPorts;
use productctl::adapters::log_sink::LogEventSink;
use productctl::app::commands::ControllerCommand;
use productctl::app::controller::ProductController;
use productctl::app::mailbox::{ControllerMsg, Mailbox};
use productctl::app::ports::{KeyEvent, KeyOrigin, KeyState};
use productctl::config::ControllerConfig;
use productctl::dprint::{self, LogLevel};
use productctl::error::MailboxError;
use productctl::product::context::{Module, NetworkStatus};
use productctl::product::events::{
    AdaptIqStatus, DspImage, Event, Intent, PairingStatus, PowerStatus, SelectionInfo, Source,
};
use productctl::product::ids::StateId;

static MAILBOX: Mailbox = Mailbox::new();

const HELP: &str = "\
commands:
  ready <caps|lpm|network|sts|bluetooth|swupdate|all>
  lpm <up|down>                       LPM IPC connect result
  lpm-power <coldboot|lowpower|network-standby|autowake|fullpower>
  intent <name>                       e.g. power, vol+, mute, play-pause, pair-speakers
  key <id>                            raw key press through the key map
  select <source> [account] [silent]  now-selection (SETUP ADAPTIQ, SETUP PAIRING, ...)
  network <profiles> <up|down>
  adaptiq <running|stopped>
  pairing <active|done>
  event <chime-done|accessories|stop-done|timeout|voice-listening|dsp-user|dsp-adaptiq|autowake-on|autowake-off>
  force <state>
  halt <on|off>
  loglevel <facility|all|prefix*> <level|off>
  status                              logging status table
  state                               current state path
  quit";

// ── Command parsing ───────────────────────────────────────────

fn on_off(word: &str) -> Option<bool> {
    match word {
        "on" | "up" | "true" | "1" => Some(true),
        "off" | "down" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn simple_event(name: &str) -> Option<Event> {
    let event = match name {
        "chime-done" => Event::ChimeDone,
        "accessories" => Event::AccessoriesKnown,
        "stop-done" => Event::StopPlaybackResponse,
        "timeout" => Event::InactivityTimeout,
        "voice-listening" => Event::VoiceListening,
        "dsp-user" => Event::DspBooted(DspImage::User),
        "dsp-adaptiq" => Event::DspBooted(DspImage::AdaptIq),
        "autowake-on" => Event::AutowakeStatus(true),
        "autowake-off" => Event::AutowakeStatus(false),
        "sts-init" => Event::StsSourcesInit,
        _ => return None,
    };
    Some(event)
}

/// Parse one console line into the messages it stands for.  `Ok(empty)`
/// for blank lines; `Err` carries a message for the user.
fn parse_line(line: &str) -> std::result::Result<Vec<ControllerMsg>, String> {
    let args: Vec<&str> = line.split_whitespace().collect();
    let bad = |what: &str| Err(format!("{what} (type 'help')"));
    let msg = match args.as_slice() {
        [] => return Ok(Vec::new()),
        ["ready", "all"] => {
            return Ok(Module::ALL
                .into_iter()
                .map(|module| ControllerMsg::ModuleReady {
                    module,
                    ready: true,
                })
                .collect());
        }
        ["ready", name] => match Module::from_name(name) {
            Some(module) => ControllerMsg::ModuleReady {
                module,
                ready: true,
            },
            None => return bad(&format!("unknown module '{name}'")),
        },
        ["lpm", state] => match on_off(state) {
            Some(up) => ControllerMsg::LpmConnected(up),
            None => return bad("lpm takes up|down"),
        },
        ["lpm-power", status] => match PowerStatus::from_name(status) {
            Some(s) => ControllerMsg::Event(Event::LpmPowerStatus(s)),
            None => return bad(&format!("unknown power status '{status}'")),
        },
        ["intent", name] => match Intent::from_name(name) {
            Some(intent) => ControllerMsg::Event(Event::Intent(intent)),
            None => return bad(&format!("unknown intent '{name}'")),
        },
        ["key", id] => match id.parse::<u32>() {
            Ok(key_id) => ControllerMsg::Key(KeyEvent {
                origin: KeyOrigin::Console,
                state: KeyState::Press,
                key_id,
            }),
            Err(_) => return bad(&format!("bad key id '{id}'")),
        },
        ["select", source, rest @ ..] => {
            let Some(source) = Source::from_name(source) else {
                return bad(&format!("unknown source '{source}'"));
            };
            let (account, silent) = match rest {
                [] => ("", false),
                ["silent"] => ("", true),
                [account] => (*account, false),
                [account, "silent"] => (*account, true),
                _ => return bad("select <source> [account] [silent]"),
            };
            let mut sel = SelectionInfo::new(source, account.to_ascii_uppercase());
            if silent {
                sel = sel.silent();
            }
            ControllerMsg::Event(Event::NowSelectionInfo(sel))
        }
        ["network", profiles, up] => match (profiles.parse::<u32>(), on_off(up)) {
            (Ok(wifi_profiles), Some(primary_up)) => ControllerMsg::NetworkStatus(NetworkStatus {
                bt_sink_devices: 0,
                wifi_profiles,
                primary_up,
            }),
            _ => return bad("network <profiles> <up|down>"),
        },
        ["adaptiq", "running"] => ControllerMsg::Event(Event::AdaptIqStatus(AdaptIqStatus::Running)),
        ["adaptiq", "stopped"] => {
            ControllerMsg::Event(Event::AdaptIqStatus(AdaptIqStatus::NotRunning))
        }
        ["pairing", phase @ ("active" | "done")] => {
            ControllerMsg::Event(Event::PairingStatus(PairingStatus {
                active: *phase == "active",
                from_lan: false,
                sub_valid: true,
                rear_valid: true,
            }))
        }
        ["event", name] => match simple_event(name) {
            Some(event) => ControllerMsg::Event(event),
            None => return bad(&format!("unknown event '{name}'")),
        },
        ["force", name] => match StateId::from_name(name) {
            Some(state) => ControllerMsg::Command(ControllerCommand::ForceState(state)),
            None => return bad(&format!("unknown state '{name}'")),
        },
        ["halt", flag] => match on_off(flag) {
            Some(halt) => ControllerMsg::Command(ControllerCommand::SetHalt(halt)),
            None => return bad("halt takes on|off"),
        },
        ["loglevel", facility, level] => {
            let level = if *level == "off" {
                None
            } else {
                match level.parse::<LogLevel>() {
                    Ok(l) => Some(l),
                    Err(e) => return bad(&e.to_string()),
                }
            };
            ControllerMsg::Command(ControllerCommand::SetLogLevel {
                facility: (*facility).to_string(),
                level,
            })
        }
        ["status"] => ControllerMsg::Command(ControllerCommand::LoggingStatus),
        ["state"] => ControllerMsg::Command(ControllerCommand::QueryState),
        ["quit" | "exit"] => ControllerMsg::Shutdown,
        [first, ..] => return bad(&format!("unknown command '{first}'")),
    };
    Ok(vec![msg])
}

/// Post, waiting for room while the controller catches up.
fn post_blocking(msg: ControllerMsg) {
    while let Err(MailboxError::Full) = MAILBOX.post(msg.clone()) {
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn spawn_console_reader() -> Result<()> {
    std::thread::Builder::new()
        .name("console".into())
        .spawn(|| {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim() == "help" {
                    println!("{HELP}");
                    continue;
                }
                match parse_line(&line) {
                    Ok(msgs) => {
                        let quit = msgs.contains(&ControllerMsg::Shutdown);
                        msgs.into_iter().for_each(post_blocking);
                        if quit {
                            return;
                        }
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            post_blocking(ControllerMsg::Shutdown);
        })
        .context("failed to spawn console thread")?;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Configuration ──────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::load(&path)
            .with_context(|| format!("failed to load controller config from {path}"))?,
        None => ControllerConfig::default(),
    };

    // ── 2. Logging ────────────────────────────────────────────
    let registry = dprint::init_default_registry(config.dprint.clone());
    dprint::install(Arc::clone(registry)).context("failed to install DPrint logger")?;
    registry.initialize(&config.product_name);
    info!("{} starting", config.product_name);

    // ── 3. Controller ─────────────────────────────────────────
    let mut sink = LogEventSink::interactive();
    let mut controller = ProductController::new(LogPorts::new(), config);
    controller.start(&mut sink);

    // ── 4. Console → mailbox → controller ─────────────────────
    spawn_console_reader()?;
    futures_lite::future::block_on(MAILBOX.run(&mut controller, registry, &mut sink));

    if let Some(state) = controller.context().hw.last_system_state() {
        info!("last requested system state: {state:?}");
    }
    warn!("shutting down in {}", controller.state());
    Ok(())
}
