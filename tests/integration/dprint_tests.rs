//! DPrint registry behaviour through the public API: filtering, handle
//! lifetimes, patterns, configuration text and output backends.

use std::path::PathBuf;
use std::sync::Arc;

use productctl::config::DPrintSettings;
use productctl::dprint::{DPrint, LogLevel, LoggerRegistry, OutputLocation, parse_config};

/// Settings that never touch the environment, `/dev/log` or real media.
fn isolated_settings(media: &std::path::Path) -> DPrintSettings {
    DPrintSettings {
        env_var: "PRODUCTCTL_TEST_DPRINT_CONF_UNSET".into(),
        search_paths: Vec::new(),
        media_mount: media.display().to_string(),
        syslog_socket: media.join("no-syslog").display().to_string(),
        ..DPrintSettings::default()
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("productctl-it-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn registry(tag: &str) -> (Arc<LoggerRegistry>, PathBuf) {
    let dir = scratch_dir(tag);
    let r = Arc::new(LoggerRegistry::new(isolated_settings(&dir)));
    r.skip_configuration();
    (r, dir)
}

// ── Filtering ─────────────────────────────────────────────────

#[test]
fn is_log_truth_table() {
    let (r, _) = registry("truth");
    let d = DPrint::with_registry(Arc::clone(&r), "Table");

    let mut checked = 0;
    for enabled in [true, false] {
        for configured in [LogLevel::Error, LogLevel::Info] {
            r.set_facility_enabled("Table", enabled);
            r.set_facility_log_level("Table", configured);
            for msg in [
                LogLevel::Critical,
                LogLevel::Error,
                LogLevel::Info,
                LogLevel::Debug,
            ] {
                let expected = enabled && msg <= configured;
                assert_eq!(
                    d.is_log(msg),
                    expected,
                    "enabled={enabled} configured={configured} msg={msg}"
                );
                checked += 1;
            }
        }
    }
    assert_eq!(checked, 16);
}

#[test]
fn unknown_index_always_logs() {
    let (r, _) = registry("unknown");
    r.set_enabled_all(false);
    r.set_global_log_level(LogLevel::Critical);
    assert!(r.is_log(0, LogLevel::Insane));
    assert_eq!(r.facility_name(0).as_deref(), Some("*UNKNOWN*"));
}

// ── Handles ───────────────────────────────────────────────────

#[test]
fn two_handles_one_facility_lifecycle() {
    let (r, _) = registry("lifecycle");
    let a = DPrint::with_registry(Arc::clone(&r), "Alpha");
    let b = DPrint::with_registry(Arc::clone(&r), "Alpha");
    assert_eq!(a.id(), b.id());
    assert_eq!(r.refcount(a.id()), 2);

    assert!(r.apply_setting("Alpha", Some(LogLevel::Debug)));
    assert!(a.is_log(LogLevel::Debug) && b.is_log(LogLevel::Debug));
    assert!(!b.is_log(LogLevel::Verbose));

    assert!(r.apply_setting("Alpha", None));
    assert!(!a.is_log(LogLevel::Critical));

    let id = a.id();
    drop(a);
    assert_eq!(r.refcount(id), 1);
    drop(b);
    assert_eq!(r.lookup("Alpha"), None);

    // A released name is brought back by an administrative change.
    assert!(r.apply_setting("Alpha", Some(LogLevel::Warning)));
    let again = r.lookup("Alpha").expect("re-registered");
    assert_eq!(r.facility_state(again), Some((true, LogLevel::Warning)));
}

#[test]
fn never_registered_exact_name_applies_on_registration() {
    let (r, _) = registry("never");
    assert!(!r.apply_setting("Ghost", Some(LogLevel::Verbose)));
    assert_eq!(r.lookup("Ghost"), None);

    let ghost = DPrint::with_registry(Arc::clone(&r), "Ghost");
    assert!(ghost.is_log(LogLevel::Verbose));
    assert!(!ghost.is_log(LogLevel::Insane));
    assert_eq!(r.refcount(ghost.id()), 1);
}

#[test]
fn filtered_macro_arguments_are_not_evaluated() {
    let (r, _) = registry("macro");
    let d = DPrint::with_registry(Arc::clone(&r), "Lazy");
    r.set_facility_log_level("Lazy", LogLevel::Warning);
    let mut evaluated = false;
    let mut touch = || {
        evaluated = true;
        "x"
    };
    productctl::dprint!(d, LogLevel::Debug, "{}", touch());
    assert!(!evaluated);
}

// ── Patterns ──────────────────────────────────────────────────

#[test]
fn wildcard_applies_to_existing_and_future_facilities() {
    let (r, _) = registry("wildcard");
    let existing = DPrint::with_registry(Arc::clone(&r), "NetworkMgr");
    let other = DPrint::with_registry(Arc::clone(&r), "Audio");

    assert!(r.apply_setting("net*", None));
    assert!(!existing.is_log(LogLevel::Critical));
    assert!(other.is_log(LogLevel::Info));

    let later = DPrint::with_registry(Arc::clone(&r), "NETstack");
    assert!(!later.is_log(LogLevel::Critical));
}

#[test]
fn unmatched_wildcard_is_still_remembered() {
    let (r, _) = registry("remember");
    assert!(!r.set_facility_log_level("Front*", LogLevel::Insane));
    let d = DPrint::with_registry(Arc::clone(&r), "FrontDoor");
    assert!(d.is_log(LogLevel::Insane));
}

#[test]
fn later_pattern_wins_for_new_facilities() {
    let (r, _) = registry("order");
    r.set_facility_log_level("A*", LogLevel::Error);
    r.set_facility_log_level("AB*", LogLevel::Debug);
    let abc = DPrint::with_registry(Arc::clone(&r), "ABC");
    assert_eq!(r.facility_state(abc.id()), Some((true, LogLevel::Debug)));

    // Re-issuing the broader pattern makes it the latest.
    r.set_facility_log_level("A*", LogLevel::Error);
    let abd = DPrint::with_registry(Arc::clone(&r), "ABD");
    assert_eq!(r.facility_state(abd.id()), Some((true, LogLevel::Error)));
}

#[test]
fn all_changes_defaults_for_new_facilities() {
    let (r, _) = registry("all");
    r.set_enabled_all(false);
    let d = DPrint::with_registry(Arc::clone(&r), "Late");
    assert!(!d.is_log(LogLevel::Critical));
    r.set_global_log_level(LogLevel::Verbose);
    r.set_enabled_all(true);
    assert!(d.is_log(LogLevel::Verbose));
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn config_text_applies_commands_in_order() {
    let (r, _) = registry("conftext");
    let alpha = DPrint::with_registry(Arc::clone(&r), "Alpha");
    let beta = DPrint::with_registry(Arc::clone(&r), "Beta");
    let gamma = DPrint::with_registry(Arc::clone(&r), "Gamma");

    r.apply_config_text(
        "set stdout; Alpha debug\nBeta off # silence\nGamma 7 some-other-process\nbogus\n",
        "inline",
    );

    assert_eq!(r.output_location(), OutputLocation::Stdout);
    assert_eq!(r.facility_state(alpha.id()), Some((true, LogLevel::Debug)));
    assert_eq!(r.facility_state(beta.id()).map(|s| s.0), Some(false));
    // Process argument did not match this executable.
    assert_eq!(r.facility_state(gamma.id()), Some((true, LogLevel::Info)));
}

#[test]
fn inline_config_value_with_wildcard() {
    let (r, _) = registry("inline");
    let beta = DPrint::with_registry(Arc::clone(&r), "Beta");
    let gamma = DPrint::with_registry(Arc::clone(&r), "GammaOne");

    r.load_config_value("set stdout; Beta debug; Gamma* off", "BOSE_DPRINT_CONF");

    assert_eq!(r.output_location(), OutputLocation::Stdout);
    assert_eq!(r.facility_state(beta.id()), Some((true, LogLevel::Debug)));
    assert!(!gamma.is_log(LogLevel::Critical));
    let later = DPrint::with_registry(Arc::clone(&r), "gammaTwo");
    assert!(!later.is_log(LogLevel::Critical));
}

#[test]
fn inline_config_reaches_facilities_registered_afterwards() {
    let (r, _) = registry("later");
    r.load_config_value("set stdout; Beta debug; Gamma* off", "BOSE_DPRINT_CONF");

    let beta = DPrint::with_registry(Arc::clone(&r), "Beta");
    let gamma = DPrint::with_registry(Arc::clone(&r), "GammaOne");
    let other = DPrint::with_registry(Arc::clone(&r), "Delta");

    assert_eq!(r.output_location(), OutputLocation::Stdout);
    assert!(beta.is_log(LogLevel::Debug));
    assert!(!beta.is_log(LogLevel::Verbose));
    assert!(!gamma.is_log(LogLevel::Critical));
    assert_eq!(r.facility_state(other.id()), Some((true, LogLevel::Info)));
}

#[test]
fn config_value_naming_a_file_is_loaded() {
    let (r, dir) = registry("confvalue");
    let d = DPrint::with_registry(Arc::clone(&r), "Alpha");
    let path = dir.join("dprint.conf");
    std::fs::write(&path, "Alpha verbose\n").expect("write conf");

    r.load_config_value(&path.display().to_string(), "TEST_VAR");
    assert!(d.is_log(LogLevel::Verbose));

    // A missing file changes nothing.
    r.load_config_value("/nonexistent/dprint.conf", "TEST_VAR");
    assert!(d.is_log(LogLevel::Verbose));
}

#[test]
fn search_path_on_media_selects_file_output() {
    let dir = scratch_dir("search");
    std::fs::write(dir.join("dprint.conf"), "Alpha insane\n").expect("write conf");
    let settings = DPrintSettings {
        search_paths: vec![dir.join("dprint.conf").display().to_string()],
        ..isolated_settings(&dir)
    };
    let r = Arc::new(LoggerRegistry::new(settings));
    let d = DPrint::with_registry(Arc::clone(&r), "Alpha");

    r.initialize("SearchTest");
    assert_eq!(r.output_location(), OutputLocation::File);
    assert!(d.is_log(LogLevel::Insane));
    let log = r.log_file_path().expect("log file");
    assert!(log.starts_with(&dir));
}

#[test]
fn parser_reports_problems_without_stopping() {
    let parsed = parse_config("global 3\nAlpha loud\nset colour\nBeta 2\n", "t.conf", "exe");
    assert_eq!(parsed.commands.len(), 1);
    assert_eq!(parsed.commands[0].line, 4);
    assert_eq!(parsed.diagnostics.len(), 3);
    assert!(parsed.diagnostics[0].contains("deprecated"));
    assert!(parsed.diagnostics[1].contains("invalid level 'loud'"));
    assert_eq!(parsed.diagnostics[2], "Unknown 'set' command at t.conf line 3");
}

// ── Output ────────────────────────────────────────────────────

#[test]
fn file_output_writes_prefixed_lines() {
    let (r, dir) = registry("file");
    r.initialize("FileTest");
    let d = DPrint::with_registry(Arc::clone(&r), "Writer");

    r.set_output_location(OutputLocation::File)
        .expect("open log file");
    let path = r.log_file_path().expect("log file");
    assert!(path.starts_with(&dir));
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.ends_with(".log"));

    d.log_warning(format_args!("disk at {}%", 93));
    d.log_debug(format_args!("filtered"));

    let text = std::fs::read_to_string(&path).expect("read log");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(":Writer:WARNING]FileTest["));
    assert!(lines[0].ends_with("]disk at 93%"));
}

#[test]
fn stdout_toggle_switches_backend() {
    let (r, _) = registry("stdout");
    assert_eq!(r.output_location(), OutputLocation::Syslog);
    r.set_print_to_stdout(true);
    assert_eq!(r.output_location(), OutputLocation::Stdout);
    r.set_print_to_stdout(false);
    assert_eq!(r.output_location(), OutputLocation::Syslog);
}

#[test]
fn file_output_failure_keeps_previous_backend() {
    let dir = scratch_dir("nofile");
    let settings = isolated_settings(&dir.join("missing-mount"));
    let r = LoggerRegistry::new(settings);
    r.skip_configuration();
    r.set_print_to_stdout(true);
    assert!(r.set_output_location(OutputLocation::File).is_err());
    assert_eq!(r.output_location(), OutputLocation::Stdout);
}
