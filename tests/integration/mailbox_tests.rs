//! Mailbox marshalling: messages posted from other threads are handled in
//! order on the controller task.

use futures_lite::future::block_on;

use crate::mock_ports::{Call, MockPorts, RecordingSink};

use productctl::app::commands::ControllerCommand;
use productctl::app::controller::ProductController;
use productctl::app::events::ControllerEvent;
use productctl::app::mailbox::{ControllerMsg, Mailbox};
use productctl::config::ControllerConfig;
use productctl::dprint::{LogLevel, LoggerRegistry};
use productctl::product::context::{Module, NetworkStatus};
use productctl::product::events::{Event, Intent};
use productctl::product::ids::StateId;

fn registry() -> LoggerRegistry {
    let r = LoggerRegistry::default();
    r.skip_configuration();
    r
}

fn boot_messages() -> Vec<ControllerMsg> {
    let mut msgs = vec![
        ControllerMsg::LpmConnected(true),
        ControllerMsg::NetworkStatus(NetworkStatus {
            bt_sink_devices: 0,
            wifi_profiles: 1,
            primary_up: false,
        }),
    ];
    msgs.extend(
        Module::ALL
            .into_iter()
            .filter(|m| *m != Module::Lpm)
            .map(|module| ControllerMsg::ModuleReady {
                module,
                ready: true,
            }),
    );
    msgs
}

#[test]
fn pump_drains_in_order() {
    let mailbox: Mailbox = Mailbox::new();
    let registry = registry();
    let mut ctrl = ProductController::new(MockPorts::new(), ControllerConfig::default());
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    for msg in boot_messages() {
        mailbox.post(msg).expect("post");
    }
    mailbox
        .post(ControllerMsg::Event(Event::Intent(Intent::Play)))
        .expect("post");

    let handled = mailbox.pump(&mut ctrl, &registry, &mut sink);
    assert_eq!(handled, 8);
    assert!(mailbox.is_empty());
    assert_eq!(ctrl.state(), StateId::PlayingDeselected);
    assert_eq!(
        sink.transitions(),
        vec![
            ("Booting".to_string(), "NetworkStandby".to_string()),
            ("NetworkStandby".to_string(), "PlayingDeselected".to_string()),
        ]
    );
}

#[test]
fn pump_stops_after_shutdown() {
    let mailbox: Mailbox<4> = Mailbox::new();
    let registry = registry();
    let mut ctrl = ProductController::new(MockPorts::new(), ControllerConfig::default());
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    mailbox.post(ControllerMsg::LpmConnected(true)).expect("post");
    mailbox.post(ControllerMsg::Shutdown).expect("post");
    mailbox.post(ControllerMsg::LpmConnected(false)).expect("post");

    assert_eq!(mailbox.pump(&mut ctrl, &registry, &mut sink), 2);
    assert_eq!(mailbox.len(), 1);
    assert!(!ctrl.hw().made(&Call::Reboot));
}

#[test]
fn run_handles_messages_from_another_thread() {
    static MAILBOX: Mailbox = Mailbox::new();
    let registry = registry();
    let mut ctrl = ProductController::new(MockPorts::new(), ControllerConfig::default());
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    let producer = std::thread::spawn(|| {
        for msg in boot_messages() {
            while MAILBOX.post(msg.clone()).is_err() {
                std::thread::yield_now();
            }
        }
        let cmd = ControllerMsg::Command(ControllerCommand::QueryState);
        while MAILBOX.post(cmd.clone()).is_err() {
            std::thread::yield_now();
        }
        while MAILBOX.post(ControllerMsg::Shutdown).is_err() {
            std::thread::yield_now();
        }
    });

    block_on(MAILBOX.run(&mut ctrl, &registry, &mut sink));
    producer.join().expect("producer thread");

    assert_eq!(ctrl.state(), StateId::NetworkStandby);
    assert_eq!(
        sink.events.last(),
        Some(&ControllerEvent::CurrentState(vec![
            StateId::Top,
            StateId::Playable,
            StateId::NetworkStandby,
        ]))
    );
}

#[test]
fn failed_command_does_not_stop_the_loop() {
    let mailbox: Mailbox = Mailbox::new();
    let registry = registry();
    let mut ctrl = ProductController::new(MockPorts::new(), ControllerConfig::default());
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    mailbox
        .post(ControllerMsg::Command(ControllerCommand::SetLogLevel {
            facility: "NoSuchFacility".into(),
            level: Some(LogLevel::Debug),
        }))
        .expect("post");
    mailbox
        .post(ControllerMsg::FrontDoorError {
            code: 404,
            subcode: 2,
            message: "endpoint missing".into(),
        })
        .expect("post");
    mailbox
        .post(ControllerMsg::Command(ControllerCommand::ForceState(
            StateId::SwUpdating,
        )))
        .expect("post");

    assert_eq!(mailbox.pump(&mut ctrl, &registry, &mut sink), 3);
    assert_eq!(ctrl.state(), StateId::SwUpdating);
}

#[test]
fn direct_set_log_level_reports_unknown_facility() {
    let registry = registry();
    let mut ctrl = ProductController::new(MockPorts::new(), ControllerConfig::default());
    let mut sink = RecordingSink::new();
    ctrl.start(&mut sink);

    let err = ctrl
        .handle_command(
            ControllerCommand::SetLogLevel {
                facility: "NoSuchFacility".into(),
                level: None,
            },
            &registry,
            &mut sink,
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "dprint: unknown facility 'NoSuchFacility'");

    // Patterns are accepted even when nothing matches yet.
    assert!(
        ctrl.handle_command(
            ControllerCommand::SetLogLevel {
                facility: "Nothing*".into(),
                level: Some(LogLevel::Info),
            },
            &registry,
            &mut sink,
        )
        .is_ok()
    );
}
