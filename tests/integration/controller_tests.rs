//! End-to-end flows through ProductController → Hsm → product states →
//! collaborator ports.

use crate::mock_ports::{Call, MockPorts, RecordingSink};

use productctl::app::commands::ControllerCommand;
use productctl::app::controller::ProductController;
use productctl::app::events::ControllerEvent;
use productctl::app::ports::{KeyEvent, KeyOrigin, KeyState};
use productctl::config::ControllerConfig;
use productctl::dprint::LoggerRegistry;
use productctl::hsm::Outcome;
use productctl::product::context::{Module, NetworkStatus};
use productctl::product::events::{
    AdaptIqAction, AdaptIqStatus, DspImage, Event, Intent, PairingAction, PairingStatus,
    PowerStatus, SelectionInfo, Source, SystemState, account,
};
use productctl::product::ids::StateId;

type Controller = ProductController<MockPorts>;

fn started(config: ControllerConfig) -> (Controller, RecordingSink) {
    let mut ctrl = ProductController::new(MockPorts::new(), config);
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);
    (ctrl, sink)
}

fn all_ready(ctrl: &mut Controller, sink: &mut RecordingSink) {
    for m in Module::ALL {
        ctrl.set_module_ready(m, true, sink);
    }
}

fn configured_network() -> NetworkStatus {
    NetworkStatus {
        bt_sink_devices: 0,
        wifi_profiles: 1,
        primary_up: true,
    }
}

/// Booted with a configured network, sitting in NetworkStandby.
fn in_network_standby() -> (Controller, RecordingSink) {
    let (mut ctrl, mut sink) = started(ControllerConfig::default());
    ctrl.handle_network_status(configured_network(), &mut sink);
    all_ready(&mut ctrl, &mut sink);
    assert_eq!(ctrl.state(), StateId::NetworkStandby);
    ctrl.hw_mut().clear();
    (ctrl, sink)
}

fn select(ctrl: &mut Controller, sink: &mut RecordingSink, source: Source, acct: &str) {
    ctrl.dispatch(
        Event::NowSelectionInfo(SelectionInfo::new(source, acct)),
        sink,
    );
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boots_into_network_standby_when_configured() {
    let (mut ctrl, mut sink) = started(ControllerConfig::default());
    assert_eq!(ctrl.state(), StateId::Booting);
    assert!(ctrl.hw().made(&Call::Connect));

    ctrl.handle_network_status(configured_network(), &mut sink);
    // Still waiting on modules.
    assert_eq!(ctrl.state(), StateId::Booting);

    all_ready(&mut ctrl, &mut sink);
    assert_eq!(ctrl.state(), StateId::NetworkStandby);
    assert_eq!(ctrl.hw().last_system_state(), Some(SystemState::Standby));
    assert!(sink.events.contains(&ControllerEvent::ModulesReady));
    assert!(sink.events.contains(&ControllerEvent::StateChanged {
        from: StateId::Booting,
        to: StateId::NetworkStandby,
    }));
}

#[test]
fn unconfigured_product_goes_through_setup() {
    let (mut ctrl, mut sink) = started(ControllerConfig::default());
    all_ready(&mut ctrl, &mut sink);
    assert_eq!(ctrl.state(), StateId::Setup);
    assert!(ctrl.hw().made(&Call::WifiSetupMode));
    assert!(ctrl.hw().made(&Call::AccessPoint(true)));
    assert!(ctrl.hw().made(&Call::BleAdvertising(true)));

    // An unconfigured status keeps us in Setup.
    ctrl.handle_network_status(NetworkStatus::default(), &mut sink);
    assert_eq!(ctrl.state(), StateId::Setup);

    ctrl.handle_network_status(configured_network(), &mut sink);
    assert_eq!(ctrl.state(), StateId::NetworkStandby);
    assert!(ctrl.hw().made(&Call::AccessPoint(false)));
    assert!(ctrl.hw().made(&Call::BleAdvertising(false)));
    assert!(ctrl.hw().made(&Call::WifiAutoSwitching));
}

#[test]
fn forced_setup_overrides_configured_network() {
    let config = ControllerConfig {
        force_setup: true,
        ..ControllerConfig::default()
    };
    let (mut ctrl, mut sink) = started(config);
    ctrl.handle_network_status(configured_network(), &mut sink);
    all_ready(&mut ctrl, &mut sink);
    assert_eq!(ctrl.state(), StateId::Setup);
}

#[test]
fn first_boot_greeting_plays_chime_then_standby() {
    let config = ControllerConfig {
        first_boot_greeting: true,
        ..ControllerConfig::default()
    };
    let (mut ctrl, mut sink) = started(config);
    ctrl.handle_network_status(configured_network(), &mut sink);
    all_ready(&mut ctrl, &mut sink);

    // Booted immediately moves on and asks for full power.
    assert_eq!(ctrl.state(), StateId::FirstBootGreetingTransition);
    assert_eq!(ctrl.hw().last_system_state(), Some(SystemState::On));
    assert!(ctrl.context().boot_complete_at.is_some());

    // Full power before accessories are known is not enough.
    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::FullPower), &mut sink);
    assert_eq!(ctrl.state(), StateId::FirstBootGreetingTransition);

    ctrl.dispatch(Event::AccessoriesKnown, &mut sink);
    assert_eq!(ctrl.state(), StateId::FirstBootGreeting);
    assert!(ctrl.hw().made(&Call::Chime));

    ctrl.dispatch(Event::ChimeDone, &mut sink);
    assert_eq!(ctrl.state(), StateId::NetworkStandby);
    assert!(!ctrl.context().greeting_pending);
}

#[test]
fn lpm_connect_outcomes() {
    let (mut ctrl, mut sink) = started(ControllerConfig::default());
    ctrl.handle_lpm_connected(true, &mut sink);
    assert!(ctrl.context().readiness.lpm);
    // Booting asks the LPM for standby once the interface is up.
    assert_eq!(ctrl.hw().last_system_state(), Some(SystemState::Standby));

    ctrl.handle_lpm_connected(false, &mut sink);
    assert!(ctrl.hw().made(&Call::Reboot));
}

// ── Standby ───────────────────────────────────────────────────

#[test]
fn play_intent_turns_product_on_deselected() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.dispatch(Event::Intent(Intent::Play), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingDeselected);
    assert!(ctrl.is_in(StateId::On));
    assert!(ctrl.is_in(StateId::Playing));
    assert!(ctrl.hw().made(&Call::Execute(Intent::Play)));
    assert!(ctrl.context().normal_ops_monitor);
}

#[test]
fn unrelated_intent_is_swallowed_in_standby() {
    let (mut ctrl, mut sink) = in_network_standby();
    let outcome = ctrl.dispatch(Event::Intent(Intent::MuteToggle), &mut sink);
    // Top swallows intents nobody else wants.
    assert_eq!(outcome, Outcome::Handled);
    assert_eq!(ctrl.state(), StateId::NetworkStandby);
    assert!(ctrl.hw().calls.is_empty());
}

#[test]
fn selection_in_standby_goes_to_playing_selected() {
    let (mut ctrl, mut sink) = in_network_standby();
    select(&mut ctrl, &mut sink, Source::Product, "TV");
    assert_eq!(ctrl.state(), StateId::PlayingSelected);
}

#[test]
fn silent_selection_lands_in_silent_state() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.dispatch(
        Event::NowSelectionInfo(SelectionInfo::new(Source::Bluetooth, "").silent()),
        &mut sink,
    );
    assert_eq!(ctrl.state(), StateId::PlayingSelectedSilent);
}

#[test]
fn autowake_moves_between_standby_states() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.dispatch(Event::AutowakeStatus(true), &mut sink);
    assert_eq!(ctrl.state(), StateId::Idle);
    assert!(ctrl.context().autowake_monitor);

    ctrl.dispatch(Event::Intent(Intent::PlayPause), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingDeselected);
    assert!(!ctrl.context().autowake_monitor);
}

#[test]
fn voice_listening_starts_playing_transition() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.dispatch(Event::VoiceListening, &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingTransitionSwitch);
    assert_eq!(ctrl.hw().last_system_state(), Some(SystemState::On));

    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::FullPower), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingDeselected);
}

#[test]
fn power_off_returns_to_network_standby_unless_halted() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.dispatch(Event::Intent(Intent::Play), &mut sink);
    ctrl.hw_mut().clear();

    ctrl.dispatch(Event::Intent(Intent::PowerOff), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayableTransitionNetworkStandby);
    assert!(ctrl.hw().made(&Call::SystemState(SystemState::Standby)));
    assert!(ctrl.hw().made(&Call::PowerMacro(false)));

    let registry = LoggerRegistry::default();
    ctrl.handle_command(ControllerCommand::SetHalt(true), &registry, &mut sink)
        .expect("halt");
    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::NetworkStandby), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayableTransitionNetworkStandby);

    ctrl.handle_command(ControllerCommand::SetHalt(false), &registry, &mut sink)
        .expect("halt");
    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::NetworkStandby), &mut sink);
    assert_eq!(ctrl.state(), StateId::NetworkStandby);
}

#[test]
fn power_off_with_autowake_goes_idle() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.dispatch(Event::Intent(Intent::Play), &mut sink);
    ctrl.context_mut().autowake = true;
    ctrl.dispatch(Event::Intent(Intent::PowerToggle), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayableTransitionIdle);
    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::AutoWakeStandby), &mut sink);
    assert_eq!(ctrl.state(), StateId::Idle);
}

#[test]
fn low_power_round_trip_replays_cached_intent() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.dispatch(Event::InactivityTimeout, &mut sink);
    assert_eq!(ctrl.state(), StateId::LowPowerStandbyTransition);
    assert_eq!(ctrl.hw().last_system_state(), Some(SystemState::LowPower));

    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::LowPower), &mut sink);
    assert_eq!(ctrl.state(), StateId::LowPowerStandby);

    // Volume does not wake the product.
    ctrl.dispatch(Event::Intent(Intent::VolumeUp), &mut sink);
    assert_eq!(ctrl.state(), StateId::LowPowerStandby);

    ctrl.dispatch(Event::Intent(Intent::AuxIn), &mut sink);
    assert_eq!(ctrl.state(), StateId::LowPowerResume);
    assert_eq!(ctrl.context().cached_intent_count(), 1);

    ctrl.hw_mut().clear();
    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::NetworkStandby), &mut sink);
    assert!(ctrl.hw().made(&Call::Execute(Intent::AuxIn)));
    assert!(ctrl.is_in(StateId::On));
    assert_eq!(ctrl.context().cached_intent_count(), 0);
}

#[test]
fn low_power_resume_without_cache_returns_to_standby() {
    let (mut ctrl, mut sink) = in_network_standby();
    ctrl.handle_command(
        ControllerCommand::ForceState(StateId::LowPowerResume),
        &LoggerRegistry::default(),
        &mut sink,
    )
    .expect("force");
    ctrl.dispatch(Event::LpmPowerStatus(PowerStatus::NetworkStandby), &mut sink);
    assert_eq!(ctrl.state(), StateId::NetworkStandby);
}

// ── Playing ───────────────────────────────────────────────────

#[test]
fn volume_is_clamped_when_playing_starts() {
    let config = ControllerConfig {
        default_volume: 90,
        volume_threshold: 50,
        ..ControllerConfig::default()
    };
    let (mut ctrl, mut sink) = started(config);
    ctrl.handle_network_status(configured_network(), &mut sink);
    all_ready(&mut ctrl, &mut sink);
    ctrl.dispatch(Event::Intent(Intent::Play), &mut sink);
    assert!(ctrl.hw().made(&Call::Volume(50)));
    assert_eq!(ctrl.context().volume, 50);
}

#[test]
fn network_setup_selection_powers_and_mutes_amp() {
    let (mut ctrl, mut sink) = in_network_standby();
    select(&mut ctrl, &mut sink, Source::Setup, account::NETWORK);
    assert_eq!(ctrl.state(), StateId::PlayingSelectedSetupNetworkConfig);
    assert!(ctrl.hw().made(&Call::BleAdvertising(true)));
    assert!(ctrl.hw().made(&Call::RemotePairing(true)));
    assert!(ctrl.hw().made(&Call::Amp {
        powered: true,
        muted: true
    }));

    select(&mut ctrl, &mut sink, Source::Product, "TV");
    assert_eq!(ctrl.state(), StateId::PlayingSelected);
    assert!(ctrl.hw().made(&Call::Amp {
        powered: true,
        muted: false
    }));
    assert!(ctrl.hw().made(&Call::RemotePairing(false)));
}

#[test]
fn key_press_is_translated_and_dispatched() {
    let (mut ctrl, mut sink) = in_network_standby();
    let press = KeyEvent {
        origin: KeyOrigin::Ir,
        state: KeyState::Press,
        key_id: 5,
    };
    assert!(ctrl.handle_key_event(press, &mut sink));
    assert_eq!(ctrl.state(), StateId::PlayingDeselected);

    let unmapped = KeyEvent {
        key_id: 42,
        ..press
    };
    assert!(!ctrl.handle_key_event(unmapped, &mut sink));
}

// ── AdaptIQ ───────────────────────────────────────────────────

fn in_adaptiq() -> (Controller, RecordingSink) {
    let (mut ctrl, mut sink) = in_network_standby();
    select(&mut ctrl, &mut sink, Source::Setup, account::ADAPTIQ);
    assert_eq!(ctrl.state(), StateId::AdaptIQ);
    (ctrl, sink)
}

#[test]
fn adaptiq_start_prepares_calibration() {
    let (ctrl, _) = in_adaptiq();
    let hw = ctrl.hw();
    assert!(hw.made(&Call::SourceSelect(false)));
    assert!(hw.made(&Call::StartTimer(600)));
    assert!(hw.made(&Call::Voice(false)));
    assert!(hw.made(&Call::BootDsp(DspImage::AdaptIq)));
    assert!(!ctrl.context().source_select_allowed);
}

#[test]
fn adaptiq_completion_restores_user_image() {
    let (mut ctrl, mut sink) = in_adaptiq();
    ctrl.hw_mut().clear();
    ctrl.dispatch(Event::AdaptIqControl(AdaptIqAction::Advance), &mut sink);
    assert!(ctrl.hw().made(&Call::AdaptIq(AdaptIqAction::Advance)));

    ctrl.dispatch(Event::AdaptIqStatus(AdaptIqStatus::NotRunning), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingSelectedSilent);
    let hw = ctrl.hw();
    assert!(hw.made(&Call::BootDsp(DspImage::User)));
    assert!(hw.made(&Call::StopTimer));
    assert!(hw.made(&Call::StopPlayback));
    assert!(hw.made(&Call::Voice(true)));
    assert!(ctrl.context().adaptiq_completed);
    assert!(ctrl.context().source_select_allowed);
}

#[test]
fn adaptiq_timeout_cancels_then_stops_streams() {
    let (mut ctrl, mut sink) = in_adaptiq();
    ctrl.dispatch(Event::InactivityTimeout, &mut sink);
    assert_eq!(ctrl.state(), StateId::AdaptIQCancelling);
    assert!(ctrl.hw().made(&Call::AdaptIq(AdaptIqAction::Cancel)));
    assert!(ctrl.hw().made(&Call::StopTimer));

    // Volume is ignored while cancelling.
    assert_eq!(
        ctrl.dispatch(Event::Intent(Intent::VolumeUp), &mut sink),
        Outcome::Handled
    );
    assert!(!ctrl.hw().made(&Call::Execute(Intent::VolumeUp)));

    ctrl.dispatch(Event::AdaptIqStatus(AdaptIqStatus::NotRunning), &mut sink);
    assert!(ctrl.hw().made(&Call::BootDsp(DspImage::User)));

    ctrl.hw_mut().clear();
    ctrl.dispatch(Event::DspBooted(DspImage::User), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingSelectedStoppingStreams);
    // Exit of the cancelling state plus start of stopping-streams.
    assert_eq!(ctrl.hw().count(&Call::StopPlayback), 2);
    assert!(ctrl.hw().made(&Call::SourceSelect(true)));

    ctrl.dispatch(Event::StopPlaybackResponse, &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingDeselected);
    assert!(ctrl.context().selection.is_none());
}

#[test]
fn power_off_during_adaptiq_cancels() {
    let (mut ctrl, mut sink) = in_adaptiq();
    ctrl.dispatch(Event::Intent(Intent::PowerToggle), &mut sink);
    assert_eq!(ctrl.state(), StateId::AdaptIQCancelling);
}

// ── Accessory pairing ─────────────────────────────────────────

fn in_pairing() -> (Controller, RecordingSink) {
    let (mut ctrl, mut sink) = in_network_standby();
    select(&mut ctrl, &mut sink, Source::Setup, account::PAIRING);
    assert_eq!(ctrl.state(), StateId::AccessoryPairing);
    (ctrl, sink)
}

#[test]
fn pairing_starts_session_and_plays_tones_when_done() {
    let (mut ctrl, mut sink) = in_pairing();
    assert!(ctrl
        .hw()
        .made(&Call::Execute(Intent::SpeakerPairing(PairingAction::Start))));
    assert!(ctrl.hw().made(&Call::SourceSelect(false)));

    let mut status = PairingStatus {
        active: true,
        from_lan: false,
        sub_valid: true,
        rear_valid: false,
    };
    ctrl.dispatch(Event::PairingStatus(status), &mut sink);
    assert_eq!(ctrl.state(), StateId::AccessoryPairing);

    status.active = false;
    ctrl.dispatch(Event::PairingStatus(status), &mut sink);
    assert_eq!(ctrl.state(), StateId::PlayingSelectedSilent);
    assert!(ctrl.hw().made(&Call::AccessoryTones {
        sub: true,
        rear: false
    }));
    assert!(ctrl.hw().made(&Call::SourceSelect(true)));
}

#[test]
fn lan_pairing_skips_tones() {
    let (mut ctrl, mut sink) = in_pairing();
    ctrl.dispatch(
        Event::PairingStatus(PairingStatus {
            active: false,
            from_lan: true,
            sub_valid: true,
            rear_valid: true,
        }),
        &mut sink,
    );
    assert_eq!(ctrl.state(), StateId::PlayingSelectedSilent);
    assert!(!ctrl
        .hw()
        .calls
        .iter()
        .any(|c| matches!(c, Call::AccessoryTones { .. })));
}

#[test]
fn power_off_during_pairing_cancels() {
    let (mut ctrl, mut sink) = in_pairing();
    ctrl.dispatch(Event::Intent(Intent::PowerOff), &mut sink);
    assert_eq!(ctrl.state(), StateId::AccessoryPairingCancelling);
    assert!(ctrl
        .hw()
        .made(&Call::Execute(Intent::SpeakerPairing(PairingAction::Stop))));

    // Power intents are ignored until the session winds down.
    ctrl.dispatch(Event::Intent(Intent::PowerOn), &mut sink);
    assert_eq!(ctrl.state(), StateId::AccessoryPairingCancelling);

    ctrl.dispatch(
        Event::PairingStatus(PairingStatus {
            active: false,
            from_lan: false,
            sub_valid: false,
            rear_valid: false,
        }),
        &mut sink,
    );
    assert_eq!(ctrl.state(), StateId::PlayingSelectedStoppingStreams);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn force_state_emits_state_change() {
    let (mut ctrl, mut sink) = started(ControllerConfig::default());
    let registry = LoggerRegistry::default();
    ctrl.handle_command(
        ControllerCommand::ForceState(StateId::CriticalError),
        &registry,
        &mut sink,
    )
    .expect("force");
    assert_eq!(ctrl.state(), StateId::CriticalError);
    assert_eq!(
        sink.events.last(),
        Some(&ControllerEvent::StateChanged {
            from: StateId::Booting,
            to: StateId::CriticalError,
        })
    );
    // Every intent is ignored.
    assert_eq!(
        ctrl.dispatch(Event::Intent(Intent::PowerOn), &mut sink),
        Outcome::Handled
    );
    assert_eq!(ctrl.state(), StateId::CriticalError);
}

#[test]
fn query_state_reports_path_from_top() {
    let (mut ctrl, mut sink) = in_adaptiq();
    ctrl.handle_command(ControllerCommand::QueryState, &LoggerRegistry::default(), &mut sink)
        .expect("query");
    assert_eq!(
        sink.events.last(),
        Some(&ControllerEvent::CurrentState(vec![
            StateId::Top,
            StateId::On,
            StateId::Playing,
            StateId::PlayingSelected,
            StateId::AdaptIQ,
        ]))
    );
}

#[test]
fn logging_status_command_emits_table() {
    let (mut ctrl, mut sink) = started(ControllerConfig::default());
    let registry = LoggerRegistry::default();
    registry.skip_configuration();
    registry.register("Alpha");
    ctrl.handle_command(ControllerCommand::LoggingStatus, &registry, &mut sink)
        .expect("status");
    match sink.events.last() {
        Some(ControllerEvent::LoggingStatus(lines)) => {
            assert!(lines.iter().any(|l| l.trim_start().starts_with("Alpha")));
        }
        other => panic!("expected logging status, got {other:?}"),
    }
}
