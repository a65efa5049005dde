// ResourceManager integration suite.
//
// Each test names the behavior it verifies. The invariants exercised:
// - Strong count equals the number of live strong handles.
// - No early destruction: a strongly held payload survives any collection.
// - Weak handles outlive their payload and still release cleanly.
// - Named lookups construct at most once and share one identity.
// - A pending named record is revived by a lookup before collection.
// - Collection runs to a fixed point across kinds.
use rc_resources::{
    CollectStats, GeometryBuffer, Handle, ManagerConfig, ResourceKind, ResourceManager,
    ResourceState, Scene, Script, Texture, WeakHandle,
};
use std::cell::Cell;

fn brick() -> Texture {
    Texture::solid(4, 4, [180, 60, 40, 255])
}

// Test: strong count follows clones and drops.
// Verifies: count == number of live handles at every step.
#[test]
fn strong_count_tracks_live_handles() {
    let mut m = ResourceManager::new();
    let h = m.new_from(brick());
    let mut copies: Vec<Handle<Texture>> = Vec::new();
    for n in 1..=5 {
        copies.push(h.clone());
        assert_eq!(h.strong_count(), n + 1);
    }
    while let Some(c) = copies.pop() {
        drop(c);
        assert_eq!(h.strong_count(), copies.len() + 1);
    }
    assert!(!m.is_pending(h.id()));
}

// Test: collection never touches a strongly held payload.
// Assumes: dropping a clone takes the count 2 -> 1, never to 0.
// Verifies: payload and identity survive repeated collection.
#[test]
fn no_early_destruction() {
    let mut m = ResourceManager::new();
    let h = m.new_from(brick());
    let other = h.clone();
    drop(other);
    for _ in 0..3 {
        let stats = m.collect_garbage();
        assert_eq!(stats, CollectStats::default());
        assert_eq!(h.get(&m).width, 4);
        assert_eq!(m.state(h.id()), Some(ResourceState::Active));
    }
}

// Test: a weak handle survives collection of its payload.
// Verifies: lock() fails after one collection; dropping the weak handle
// flags the tombstone and the next collection erases it.
#[test]
fn weak_survives_collection() {
    let mut m = ResourceManager::new();
    let h = m.new_from(brick());
    let id = h.id();
    let w = h.downgrade();
    drop(h);

    let stats = m.collect_garbage();
    assert_eq!(stats.tombstoned, 1);
    assert!(w.lock().is_none());
    assert!(!w.is_alive());
    assert_eq!(w.weak_count(), 1);
    assert_eq!(m.state(id), Some(ResourceState::Tombstoned));

    drop(w);
    assert!(m.is_pending(id));
    let stats = m.collect_garbage();
    assert_eq!(stats.erased, 1);
    assert!(!m.contains_id(id));
}

// Test: the texture scenario end to end.
// Verifies: pending after the drop, lock fails after collection, and the
// identity is gone once the last weak handle is released and collected.
#[test]
fn texture_scenario() {
    let mut m = ResourceManager::new();
    let h = m.new_from(brick());
    assert_eq!(h.strong_count(), 1);
    let id = h.id();
    let w = WeakHandle::from(&h);
    drop(h);
    assert!(m.is_pending(id));
    assert_eq!(m.pending_len::<Texture>(), 1);

    m.collect_garbage();
    assert!(w.lock().is_none());

    drop(w);
    m.collect_garbage();
    assert!(!m.contains_id(id));
    assert!(m.is_empty());
}

// Test: two back-to-back named requests.
// Verifies: the loader runs once; both handles compare equal.
#[test]
fn brick_png_loads_once() {
    let mut m = ResourceManager::new();
    let calls = Cell::new(0);
    let load = |_: &mut ResourceManager, _: &str| -> anyhow::Result<Texture> {
        calls.set(calls.get() + 1);
        Ok(brick())
    };
    let a = m.get_or_construct_named("brick.png", load).unwrap();
    let b = m.get_or_construct_named("brick.png", load).unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(a, b);
    assert_eq!(a.id(), b.id());
    assert_eq!(a.strong_count(), 2);
}

// Test: revival of a pending named record.
// Verifies: same identity, no second construction, nothing collected.
#[test]
fn revival_before_collection() {
    let mut m = ResourceManager::new();
    let calls = Cell::new(0);
    let load = |_: &mut ResourceManager, name: &str| -> anyhow::Result<Script> {
        calls.set(calls.get() + 1);
        Ok(Script::new(name, "return 1"))
    };
    let h = m.get_or_construct_named("init.lua", load).unwrap();
    let id = h.id();
    drop(h);
    assert!(m.is_pending(id));

    let again = m.get_or_construct_named("init.lua", load).unwrap();
    assert_eq!(again.id(), id);
    assert_eq!(calls.get(), 1);
    assert!(!m.is_pending(id));

    let stats = m.collect_garbage();
    assert_eq!(stats.erased, 0);
    assert_eq!(again.get(&m).source, "return 1");
}

// Test: a tombstoned named record is rebuilt into the same identity.
// Assumes: a weak handle keeps the record (and its name entry) alive.
// Verifies: the constructor runs again and old weak handles lock again.
#[test]
fn tombstoned_name_reconstructs_in_place() {
    let mut m = ResourceManager::new();
    let calls = Cell::new(0);
    let load = |_: &mut ResourceManager, name: &str| -> anyhow::Result<Script> {
        calls.set(calls.get() + 1);
        Ok(Script::new(name, format!("v{}", calls.get())))
    };
    let h = m.get_or_construct_named("ai.lua", load).unwrap();
    let id = h.id();
    let w = h.downgrade();
    drop(h);
    m.collect_garbage();
    assert!(m.contains_name::<Script>("ai.lua"));
    assert!(w.lock().is_none());

    let h = m.get_or_construct_named("ai.lua", load).unwrap();
    assert_eq!(calls.get(), 2);
    assert_eq!(h.id(), id);
    assert_eq!(h.get(&m).source, "v2");
    assert_eq!(w.lock().as_ref(), Some(&h));
}

// Test: fixed-point collection across kinds.
// Assumes: A (a scene) holds the only strong handle to named B (a script).
// Verifies: one collect_garbage call erases both, in two passes.
#[test]
fn fixed_point_collection() {
    let mut m = ResourceManager::new();
    let b = m
        .get_or_construct_named("b.lua", |_, n| Ok(Script::new(n, "")))
        .unwrap();
    let a = m.new_from(Scene::empty("a").with_script(b.clone()));
    let (a_id, b_id) = (a.id(), b.id());
    drop(b);
    assert!(!m.is_pending(b_id));
    drop(a);

    let stats = m.collect_garbage();
    assert_eq!(stats.passes, 2);
    assert_eq!(stats.erased, 2);
    assert!(!m.contains_id(a_id));
    assert!(!m.contains_id(b_id));
    assert!(!m.contains_name::<Script>("b.lua"));
    assert!(m.is_empty());
}

// Test: a chain deeper than the pass bound.
// Verifies: each call makes bounded progress and the rest stays pending.
#[test]
fn pass_bound_spreads_work_over_calls() {
    let mut m = ResourceManager::with_config(ManagerConfig::default().with_max_collect_passes(1));
    let script = m.new_from(Script::new("s", ""));
    let scene = m.new_from(Scene::empty("outer").with_script(script.clone()));
    drop(script);
    drop(scene);
    assert_eq!(m.collect_garbage().erased, 1);
    assert_eq!(m.pending_len::<Script>(), 1);
    assert_eq!(m.collect_garbage().erased, 1);
    assert!(m.is_empty());
}

// Test: failed constructors leave only an empty record behind.
// Verifies: error names kind and asset; the record is erased by the next
// collection; a later request retries construction.
#[test]
fn construction_failure_is_recoverable() {
    let mut m = ResourceManager::new();
    let err = m
        .get_or_construct_named::<Texture, _>("missing.png", |_, _| {
            anyhow::bail!("file not found")
        })
        .unwrap_err();
    assert_eq!(err.kind(), ResourceKind::Texture);
    assert_eq!(err.to_string(), "failed to construct texture 'missing.png'");
    assert_eq!(m.len::<Texture>(), 1);
    assert!(m.find_named::<Texture>("missing.png").is_none());

    assert_eq!(m.collect_garbage().erased, 1);
    assert!(!m.contains_name::<Texture>("missing.png"));

    let h = m
        .get_or_construct_named("missing.png", |_, _| Ok(brick()))
        .unwrap();
    assert_eq!(h.get(&m).height, 4);
}

// Test: constructors may load their own dependencies.
// Verifies: nested named requests of another kind work and the inner
// resource is shared.
#[test]
fn constructor_loads_dependencies() {
    let mut m = ResourceManager::new();
    let scene = m
        .get_or_construct_named("level", |m, name| {
            let s = m.get_or_construct_named("level.lua", |_, n| Ok(Script::new(n, "tick()")))?;
            Ok(Scene::empty(name).with_script(s))
        })
        .unwrap();
    let script = m.find_named::<Script>("level.lua").expect("cached by the constructor");
    assert_eq!(scene.get(&m).scripts[0], script);
    assert_eq!(script.strong_count(), 2);
}

// Test: mutable handles write through the manager.
// Verifies: writes are visible through const handles of the same record.
#[test]
fn mutable_access_is_shared() {
    let mut m = ResourceManager::new();
    let hm = m.new_mut_from(Script::new("s", "a"));
    let hc: Handle<Script> = hm.as_const();
    hm.get_mut(&mut m).source.push('b');
    assert_eq!(hc.get(&m).source, "ab");
    assert_eq!(hm.strong_count(), 2);
}

// Test: live_count and handles outliving their manager.
// Verifies: live_count counts strongly held records of every kind, and
// dropping a manager with handles outstanding neither panics nor leaves
// weak handles able to lock.
#[test]
fn handles_may_outlive_manager() {
    let mut m = ResourceManager::new();
    let t = m.new_from(brick());
    let s = m.new_from(Script::new("s", ""));
    let w = s.downgrade();
    assert_eq!(m.live_count(), 2);
    assert_eq!(m.total_len(), 2);
    drop(m);
    assert_eq!(t.strong_count(), 1);
    assert!(!w.is_alive());
    assert!(w.lock().is_none());
    let other = ResourceManager::new();
    assert!(t.try_get(&other).is_err());
}

// Test: find_named on a pending record.
// Verifies: the lookup revives it (same id, no longer pending) and the
// next collection erases nothing.
#[test]
fn find_named_revives_pending() {
    let mut m = ResourceManager::new();
    let h = m
        .get_or_construct_named("cfg.lua", |_, n| Ok(Script::new(n, "x = 1")))
        .unwrap();
    let id = h.id();
    drop(h);
    assert!(m.is_pending(id));

    let found = m.find_named::<Script>("cfg.lua").expect("still cached");
    assert_eq!(found.id(), id);
    assert!(!m.is_pending(id));
    let stats = m.collect_garbage();
    assert_eq!(stats.erased, 0);
    assert_eq!(stats.tombstoned, 0);
    assert_eq!(found.get(&m).source, "x = 1");
}

// Test: find_named on a tombstoned record.
// Verifies: None is returned, no strong reference is minted and the name
// entry stays for a later reconstruction.
#[test]
fn find_named_skips_tombstones() {
    let mut m = ResourceManager::new();
    let h = m
        .get_or_construct_named("gone.lua", |_, n| Ok(Script::new(n, "")))
        .unwrap();
    let w = h.downgrade();
    drop(h);
    m.collect_garbage();
    assert_eq!(m.state(w.id()), Some(ResourceState::Tombstoned));

    assert!(m.find_named::<Script>("gone.lua").is_none());
    assert_eq!(w.strong_count(), 0);
    assert!(m.contains_name::<Script>("gone.lua"));
    assert!(m.find_named::<Script>("never.lua").is_none());
}

// Test: get_or_insert_named_with on pending and tombstoned records.
// Verifies: a pending record is revived without calling `make`; a
// tombstoned one is rebuilt into the same identity.
#[test]
fn insert_named_with_revives_and_rebuilds() {
    let mut m = ResourceManager::new();
    let calls = Cell::new(0);
    let make = |_: &str| {
        calls.set(calls.get() + 1);
        GeometryBuffer::whole_screen_quad()
    };
    let h = m.get_or_insert_named_with("quad", make);
    let id = h.id();
    drop(h);
    assert!(m.is_pending(id));

    let h = m.get_or_insert_named_with("quad", make);
    assert_eq!(h.id(), id);
    assert_eq!(calls.get(), 1);
    assert!(!m.is_pending(id));

    let w = h.downgrade();
    drop(h);
    m.collect_garbage();
    assert!(w.lock().is_none());

    let h = m.get_or_insert_named_with("quad", make);
    assert_eq!(calls.get(), 2);
    assert_eq!(h.id(), id);
    assert_eq!(w.lock().as_ref(), Some(&h));
}

// Test: the shared full-screen quad across a collection.
// Verifies: whole_screen_quad rebuilds a tombstoned quad in place.
#[test]
fn whole_screen_quad_rebuilds_in_place() {
    let mut m = ResourceManager::new();
    let quad = m.whole_screen_quad();
    let w = quad.downgrade();
    drop(quad);
    m.collect_garbage();
    assert!(!w.is_alive());

    let quad = m.whole_screen_quad();
    assert_eq!(quad.id(), w.id());
    assert_eq!(quad.get(&m).triangle_count(), 2);
    assert!(w.is_alive());
}
