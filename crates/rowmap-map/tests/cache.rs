//! Concurrency behaviour of the projector cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use rowmap_map::{
    BoxError, CommandId, DeclaredProperties, Fingerprint, MapTarget, MappingError, MappingRuleSet,
    ProjectorCache, PropertyDescriptor, compile_or_fetch,
};

#[derive(Debug, Default)]
struct Widget {
    id: i64,
    label: String,
}

impl MapTarget for Widget {
    fn properties() -> Vec<PropertyDescriptor<Self>> {
        vec![
            PropertyDescriptor::field("Id", |w: &Widget| w.id, |w, v| w.id = v),
            PropertyDescriptor::field("Label", |w: &Widget| w.label.clone(), |w, v| {
                w.label = v;
            }),
        ]
    }
}

fn rules_with_label_alias(alias: &'static str) -> MappingRuleSet<Widget> {
    MappingRuleSet::<Widget>::builder()
        .configure("Label", move |rule| {
            rule.set_alias(alias);
        })
        .build(&DeclaredProperties)
        .expect("rules")
}

#[test]
fn concurrent_misses_compile_once() {
    const THREADS: usize = 8;
    let cache = Arc::new(ProjectorCache::new());
    let key = Fingerprint::of(&rules_with_label_alias("name"), &CommandId::new("widgets"));
    let invocations = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            let invocations = Arc::clone(&invocations);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache
                    .get_or_compile(&key, || {
                        invocations.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok::<_, BoxError>(String::from("compiled"))
                    })
                    .expect("compile")
            })
        })
        .collect();

    let values: Vec<Arc<String>> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(cache.compilations(), 1);
    assert!(values.iter().all(|value| Arc::ptr_eq(value, &values[0])));
}

#[test]
fn concurrent_compile_or_fetch_shares_one_projector() {
    const THREADS: usize = 6;
    let cache = Arc::new(ProjectorCache::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let rules = rules_with_label_alias("title");
                barrier.wait();
                cache
                    .compile_or_fetch(&rules, &CommandId::new("widgets"))
                    .expect("compile")
            })
        })
        .collect();

    let projectors: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .collect();
    assert_eq!(cache.compilations(), 1);
    assert_eq!(cache.len(), 1);
    assert!(projectors.iter().all(|p| Arc::ptr_eq(p, &projectors[0])));
}

#[test]
fn unrelated_fingerprints_compile_independently() {
    let cache = Arc::new(ProjectorCache::new());
    let slow_key = Fingerprint::of(&rules_with_label_alias("a"), &CommandId::new("widgets"));
    let fast_key = Fingerprint::of(&rules_with_label_alias("b"), &CommandId::new("widgets"));
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let slow = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            cache
                .get_or_compile(&slow_key, move || {
                    started_tx.send(()).expect("signal start");
                    release_rx
                        .recv_timeout(Duration::from_secs(10))
                        .map_err(|err| Box::new(err) as BoxError)?;
                    Ok::<_, BoxError>(1u8)
                })
                .expect("slow compile")
        })
    };

    started_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("slow compile started");
    // The slow key's compile lock is held; this must not wait for it.
    let fast = cache
        .get_or_compile(&fast_key, || Ok::<_, BoxError>(2u8))
        .expect("fast compile");
    assert_eq!(*fast, 2);

    release_tx.send(()).expect("release");
    assert_eq!(*slow.join().expect("thread"), 1);
    assert_eq!(cache.len(), 2);
}

#[test]
fn failure_is_retried_by_next_caller() {
    let cache = ProjectorCache::new();
    let key = Fingerprint::of(&rules_with_label_alias("x"), &CommandId::none());

    let err = cache
        .get_or_compile::<u8, _, _>(&key, || Err("compiler exploded"))
        .expect_err("first compile fails");
    match err {
        MappingError::Compilation(failure) => {
            assert_eq!(failure.target_type, "Widget");
            assert_eq!(failure.fingerprint, key.to_hex());
            assert_eq!(failure.source.to_string(), "compiler exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(cache.is_empty());

    let value = cache
        .get_or_compile(&key, || Ok::<_, BoxError>(9u8))
        .expect("retry compiles");
    assert_eq!(*value, 9);
    assert_eq!(cache.compilations(), 2);
}

#[test]
fn global_cache_returns_the_same_projector() {
    let rules = rules_with_label_alias("global-label");
    let command = CommandId::new("global-widgets");
    let first = compile_or_fetch(&rules, &command).expect("compile");
    let second = compile_or_fetch(&rules_with_label_alias("global-label"), &command)
        .expect("fetch");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(!ProjectorCache::global().is_empty());
}
