//! Integration tests for the producer/consumer handoff.
//!
//! These tests drive the public API the way a documentation UI does: artifacts
//! are evaluated in arbitrary order relative to the moment the index hook is
//! installed, and every payload must reach the hook intact.

use impl_index::{
    write_artifact, ArtifactFormat, ArtifactLoader, GatewayConfig, ImplementorRecord,
    PendingPolicy, Registry, RegistryBuilder, RegistryGateway,
};
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::TempDir;

type Log = Rc<RefCell<Vec<Registry>>>;

/// Consumer that records every registry it receives.
fn recording_consumer() -> (Log, impl FnMut(Registry) + 'static) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    (log, move |registry: Registry| sink.borrow_mut().push(registry))
}

/// `{"libA": [{description:"impl Debug for Foo", isSynthetic:false, subjectTypeIdentifiers:["libA::Foo"]}]}`
fn lib_a_payload() -> Registry {
    RegistryBuilder::new()
        .record(
            "libA",
            ImplementorRecord::new("impl Debug for Foo", false, ["libA::Foo"]).unwrap(),
        )
        .build()
        .unwrap()
}

fn generic_payload() -> Registry {
    RegistryBuilder::new()
        .record(
            "libB",
            ImplementorRecord::new(
                "impl<K, V> Debug for Map<K, V>",
                false,
                ["libB::Map", "libB::K", "libB::V"],
            )
            .unwrap(),
        )
        .record(
            "libB",
            ImplementorRecord::new("impl Send for Map", true, ["libB::Map"]).unwrap(),
        )
        .record(
            "libC",
            ImplementorRecord::new("impl Debug for Bar", false, ["libC::Bar"]).unwrap(),
        )
        .build()
        .unwrap()
}

#[test]
fn test_submit_before_install_delivers_on_install() {
    let mut gateway = RegistryGateway::new();
    gateway.submit(lib_a_payload());

    let (log, consumer) = recording_consumer();
    gateway.install_consumer(consumer);

    assert_eq!(log.borrow().as_slice(), &[lib_a_payload()]);
}

#[test]
fn test_install_before_submit_delivers_in_same_call() {
    let mut gateway = RegistryGateway::new();
    let (log, consumer) = recording_consumer();
    gateway.install_consumer(consumer);

    gateway.submit(lib_a_payload());
    // No deferred work: the record is visible as soon as submit returns.
    assert_eq!(log.borrow().as_slice(), &[lib_a_payload()]);
}

#[test]
fn test_only_latest_pre_install_payload_is_delivered() {
    let mut gateway = RegistryGateway::new();
    gateway.submit(lib_a_payload());
    gateway.submit(generic_payload());

    let (log, consumer) = recording_consumer();
    gateway.install_consumer(consumer);

    assert_eq!(log.borrow().as_slice(), &[generic_payload()]);
}

#[test]
fn test_replaced_consumer_gets_nothing_more() {
    let mut gateway = RegistryGateway::new();
    let (first, h1) = recording_consumer();
    let (second, h2) = recording_consumer();

    gateway.install_consumer(h1);
    gateway.submit(lib_a_payload());
    gateway.install_consumer(h2);
    gateway.submit(generic_payload());

    assert_eq!(first.borrow().as_slice(), &[lib_a_payload()]);
    assert_eq!(second.borrow().as_slice(), &[generic_payload()]);
}

#[test]
fn test_delivered_value_is_structurally_identical() {
    let mut gateway = RegistryGateway::new();
    let submitted = generic_payload();
    gateway.submit(submitted.clone());

    let (log, consumer) = recording_consumer();
    gateway.install_consumer(consumer);

    let log = log.borrow();
    let delivered = &log[0];
    let submitted_keys: Vec<_> = submitted.libraries().collect();
    let delivered_keys: Vec<_> = delivered.libraries().collect();
    assert_eq!(submitted_keys, delivered_keys);

    for (library, set) in submitted.iter() {
        let other = delivered.get(library).unwrap();
        assert_eq!(set.records(), other.records());
    }
}

#[test]
fn test_each_post_install_payload_delivered_once() {
    let mut gateway = RegistryGateway::new();
    let (log, consumer) = recording_consumer();
    gateway.install_consumer(consumer);

    gateway.submit(lib_a_payload());
    gateway.submit(generic_payload());
    gateway.submit(lib_a_payload());

    assert_eq!(log.borrow().len(), 3);
    assert_eq!(gateway.stats().delivered, 3);
}

#[test]
fn test_never_installed_keeps_payload_buffered() {
    let mut gateway = RegistryGateway::new();
    gateway.submit(lib_a_payload());

    assert!(!gateway.is_ready());
    assert_eq!(gateway.pending(), Some(&lib_a_payload()));
}

#[test]
fn test_merge_policy_lets_independent_artifacts_coexist() {
    let config = GatewayConfig::default().with_pending_policy(PendingPolicy::MergeByLibrary);
    let mut gateway = RegistryGateway::with_config(config);
    gateway.submit(lib_a_payload());
    gateway.submit(generic_payload());

    let (log, consumer) = recording_consumer();
    gateway.install_consumer(consumer);

    let log = log.borrow();
    assert_eq!(log.len(), 1);
    let names: Vec<_> = log[0].libraries().collect();
    assert_eq!(names, ["libA", "libB", "libC"]);
}

#[test]
fn test_artifact_tree_through_gateway() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("implementors");
    write_artifact(
        &root.join("core/fmt/trait.Debug.js"),
        &lib_a_payload(),
        ArtifactFormat::Script,
    )
    .unwrap();
    write_artifact(
        &root.join("core/marker/trait.Send.js"),
        &generic_payload(),
        ArtifactFormat::Script,
    )
    .unwrap();

    let report = ArtifactLoader::new(&root).load_all().unwrap();
    assert_eq!(report.files_loaded(), 2);
    assert_eq!(report.traits(), ["core::fmt::Debug", "core::marker::Send"]);

    // One gateway per trait, as each trait page runs its own index.
    for (trait_path, expected) in [
        ("core::fmt::Debug", lib_a_payload()),
        ("core::marker::Send", generic_payload()),
    ] {
        let mut gateway = RegistryGateway::new();
        assert_eq!(report.submit_trait(trait_path, &mut gateway), 1);

        let (log, consumer) = recording_consumer();
        gateway.install_consumer(consumer);
        assert_eq!(*log.borrow(), [expected]);
    }
}

#[test]
fn test_library_in_several_trait_artifacts_keeps_every_impl() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("implementors");
    let send = RegistryBuilder::new()
        .record(
            "libA",
            ImplementorRecord::new("impl Send for Foo", true, ["libA::Foo"]).unwrap(),
        )
        .build()
        .unwrap();
    write_artifact(
        &root.join("core/fmt/trait.Debug.js"),
        &lib_a_payload(),
        ArtifactFormat::Script,
    )
    .unwrap();
    write_artifact(&root.join("core/marker/trait.Send.js"), &send, ArtifactFormat::Script)
        .unwrap();

    let report = ArtifactLoader::new(&root).load_all().unwrap();
    assert_eq!(report.total_records(), 2);
    assert_eq!(report.trait_registry("core::fmt::Debug"), Some(lib_a_payload()));
    assert_eq!(report.trait_registry("core::marker::Send"), Some(send));

    let found: Vec<_> = report
        .records_for_type("libA::Foo")
        .into_iter()
        .map(|m| (m.trait_path, m.library, m.record.is_synthetic()))
        .collect();
    assert_eq!(
        found,
        [
            ("core::fmt::Debug".to_string(), "libA".to_string(), false),
            ("core::marker::Send".to_string(), "libA".to_string(), true),
        ]
    );
}

#[test]
fn test_same_trait_from_two_roots_follows_pending_policy() {
    let temp = TempDir::new().unwrap();
    let lib_b = RegistryBuilder::new()
        .record(
            "libB",
            ImplementorRecord::new("impl Debug for Bar", false, ["libB::Bar"]).unwrap(),
        )
        .build()
        .unwrap();
    let first = temp.path().join("docs-a");
    let second = temp.path().join("docs-b");
    write_artifact(
        &first.join("core/fmt/trait.Debug.js"),
        &lib_a_payload(),
        ArtifactFormat::Script,
    )
    .unwrap();
    write_artifact(&second.join("core/fmt/trait.Debug.js"), &lib_b, ArtifactFormat::Script)
        .unwrap();

    let mut report = ArtifactLoader::new(&first).load_all().unwrap();
    report.extend(ArtifactLoader::new(&second).load_all().unwrap());
    assert_eq!(report.traits(), ["core::fmt::Debug"]);

    let delivered = |policy: PendingPolicy| {
        let mut gateway =
            RegistryGateway::with_config(GatewayConfig::default().with_pending_policy(policy));
        assert_eq!(report.submit_trait("core::fmt::Debug", &mut gateway), 2);
        let (log, consumer) = recording_consumer();
        gateway.install_consumer(consumer);
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        log[0].libraries().map(str::to_string).collect::<Vec<_>>()
    };

    assert_eq!(delivered(PendingPolicy::SingleSlot), ["libB"]);
    assert_eq!(delivered(PendingPolicy::MergeByLibrary), ["libA", "libB"]);
}

#[test]
fn test_malformed_payload_never_reaches_gateway() {
    let mut gateway = RegistryGateway::new();
    let record = ImplementorRecord::new("impl Debug for Nothing", false, Vec::<String>::new());
    assert!(record.is_err());
    assert_eq!(gateway.stats().submitted, 0);

    let decoded: Result<Registry, _> =
        serde_json::from_str(r#"{"libA":[{"text":"impl","synthetic":false,"types":[]}]}"#);
    assert!(decoded.is_err());

    gateway.submit(lib_a_payload());
    assert_eq!(gateway.stats().submitted, 1);
}
