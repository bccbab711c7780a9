// End-to-end scenarios for a settings session backed by the on-disk store
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use updater_settings::{
    canonicalize, AccessGuard, BuildDefaults, ChangelogLocator, ChangelogOutcome, Error,
    ExecutionContext, FileBackend, GateDecision, RebootControl, Scheduler, SessionServices,
    SettingKey, SettingsSession, SettingsStore, UserId,
};

#[derive(Default)]
struct RecordingScheduler {
    calls: Mutex<Vec<bool>>,
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, immediate: bool) {
        self.calls.lock().unwrap().push(immediate);
    }
}

#[derive(Default)]
struct RecordingReboot {
    cancels: AtomicUsize,
}

impl RebootControl for RecordingReboot {
    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    data: TempDir,
    cache: TempDir,
    store: SettingsStore,
    scheduler: Arc<RecordingScheduler>,
    reboot: Arc<RecordingReboot>,
}

impl Harness {
    fn new() -> Self {
        let data = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let backend = FileBackend::open_device_protected(data.path()).unwrap();
        let store = SettingsStore::new(Arc::new(backend), BuildDefaults::builtin().unwrap());
        Harness {
            data,
            cache,
            store,
            scheduler: Arc::new(RecordingScheduler::default()),
            reboot: Arc::new(RecordingReboot::default()),
        }
    }

    fn start(&self) -> SettingsSession {
        let guarded = AccessGuard::default()
            .verify(&ExecutionContext::new(UserId::SYSTEM))
            .expect("system user is allowed");
        SettingsSession::start(
            guarded,
            SessionServices {
                store: self.store.clone(),
                scheduler: self.scheduler.clone(),
                reboot: self.reboot.clone(),
                changelog: ChangelogLocator::new(self.cache.path()),
            },
        )
        .expect("session starts")
    }

    fn schedules(&self) -> Vec<bool> {
        self.scheduler.calls.lock().unwrap().clone()
    }
}

#[test]
fn test_legacy_and_default_channels_resolve() {
    assert_eq!(canonicalize("stable-2021"), "stable6");

    let harness = Harness::new();
    // Nothing has ever been written: the build default "beta" is canonicalized
    assert_eq!(harness.store.channel(), "beta6");
}

#[test]
fn test_battery_toggle_schedules_once() {
    let harness = Harness::new();
    harness.store.write(SettingKey::BatteryNotLow, true.into());
    let mut session = harness.start();

    let decision = session.on_battery_not_low_changed(false);

    assert_eq!(decision, GateDecision::Scheduled { immediate: false });
    assert_eq!(harness.schedules(), vec![false]);
    assert!(!harness.store.battery_not_low());
}

#[test]
fn test_check_now_while_reboot_pending_does_nothing() {
    let harness = Harness::new();
    let mut session = harness.start();
    harness.store.set_waiting_for_reboot(true);

    assert_eq!(
        session.on_check_for_updates(),
        GateDecision::SuppressedPendingReboot
    );
    assert!(harness.schedules().is_empty());
}

#[test]
fn test_check_now_is_immediate() {
    let harness = Harness::new();
    let mut session = harness.start();
    session.on_check_for_updates();
    assert_eq!(harness.schedules(), vec![true]);
}

#[test]
fn test_disabling_idle_reboot_cancels_without_scheduling() {
    let harness = Harness::new();
    let mut session = harness.start();

    session.on_idle_reboot_changed(false);

    assert_eq!(harness.reboot.cancels.load(Ordering::SeqCst), 1);
    assert!(harness.schedules().is_empty());
    assert!(!harness.store.idle_reboot());
}

#[test]
fn test_clearing_marker_does_not_schedule_by_itself() {
    let harness = Harness::new();
    let mut session = harness.start();
    harness.store.set_waiting_for_reboot(true);
    session.on_channel_changed("stable");
    harness.store.set_waiting_for_reboot(false);
    assert!(harness.schedules().is_empty());

    session.on_channel_changed("beta");
    assert_eq!(harness.schedules(), vec![false]);
}

#[test]
fn test_changelog_lookup() {
    let harness = Harness::new();
    let mut session = harness.start();
    assert_eq!(session.on_changelog_clicked(), ChangelogOutcome::Unavailable);

    let dir = harness.cache.path().join("changelog");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("current.html"), "<p>release notes</p>").unwrap();

    match session.on_changelog_clicked() {
        ChangelogOutcome::Open(request) => {
            assert_eq!(request.title, "Changelog");
            assert_eq!(request.mime_type, "text/html");
            assert!(request.uri.to_string().ends_with("/changelog/current.html"));
            assert!(request.grant.read);
            assert!(!request.grant.write);
        }
        ChangelogOutcome::Unavailable => panic!("changelog should be available"),
    }
}

#[test]
fn test_settings_survive_restart() {
    let data = TempDir::new().unwrap();
    {
        let backend = FileBackend::open_device_protected(data.path()).unwrap();
        let store = SettingsStore::new(Arc::new(backend), BuildDefaults::builtin().unwrap());
        store.write(SettingKey::Channel, "security-express".into());
        store.write(SettingKey::NetworkType, 2i64.into());
    }
    let backend = FileBackend::open_device_protected(data.path()).unwrap();
    let store = SettingsStore::new(Arc::new(backend), BuildDefaults::builtin().unwrap());
    assert_eq!(store.channel(), "security-express6");
    assert_eq!(store.network_type(), 2);
}

#[test]
fn test_resume_picks_up_other_process_writes() {
    let harness = Harness::new();
    let mut session = harness.start();
    session.suspend();

    // A second handle on the same file stands in for the update pipeline process
    let pipeline_backend = FileBackend::open_device_protected(harness.data.path()).unwrap();
    let pipeline = SettingsStore::new(
        Arc::new(pipeline_backend),
        BuildDefaults::builtin().unwrap(),
    );
    pipeline.write(SettingKey::Channel, "stable-2021".into());
    pipeline.set_waiting_for_reboot(true);

    session.resume();
    assert_eq!(session.display().channel_summary.as_deref(), Some("Stable"));
    assert_eq!(
        session.on_network_type_changed(updater_settings::NetworkType::Unmetered),
        GateDecision::SuppressedPendingReboot
    );
}

#[test]
fn test_override_defaults_target_other_channel() {
    let defaults = BuildDefaults::from_ini_str("[defaults]\nchannel = stable\n").unwrap();
    let store = SettingsStore::new(Arc::new(updater_settings::MemoryBackend::new()), defaults);
    assert_eq!(store.channel(), "stable6");
}

#[test]
fn test_non_system_user_is_rejected() {
    let result = AccessGuard::default().verify(&ExecutionContext::new(UserId(10)));
    assert!(matches!(result, Err(Error::SecurityViolation(_))));
}

#[test]
fn test_marker_from_pipeline_process_suppresses_session_edit() {
    let harness = Harness::new();
    let mut session = harness.start();

    let pipeline_backend = FileBackend::open_device_protected(harness.data.path()).unwrap();
    let pipeline = SettingsStore::new(
        Arc::new(pipeline_backend),
        BuildDefaults::builtin().unwrap(),
    );
    pipeline.set_waiting_for_reboot(true);

    assert_eq!(
        session.on_battery_not_low_changed(true),
        GateDecision::SuppressedPendingReboot
    );
    assert!(harness.schedules().is_empty());

    let on_disk = FileBackend::open_device_protected(harness.data.path()).unwrap();
    assert!(
        SettingsStore::new(Arc::new(on_disk), BuildDefaults::builtin().unwrap())
            .waiting_for_reboot()
    );
}
