//! Access mask populating and applying passes.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{p, InstrumentedStore};
use stagebind::prelude::*;

#[derive(Clone, Debug, Default, PartialEq)]
struct Anim {
    label: String,
    value: i32,
}

impl Anim {
    const LABEL: FieldSpec = FieldSpec::new("label").uniform();
    const VALUE: FieldSpec = FieldSpec::new("value");
}

impl Sample for Anim {
    fn write(&self, w: &mut SampleWriter<'_>) -> Result<()> {
        w.value(&Self::LABEL, &self.label)?;
        w.value(&Self::VALUE, &self.value)
    }

    fn read(&mut self, r: &mut SampleReader<'_>) -> Result<()> {
        r.value(&Self::LABEL, &mut self.label)?;
        r.value(&Self::VALUE, &mut self.value)
    }
}

/// `/static` has a single sample, `/anim` is keyed at 1, 2 and 3.
fn setup() -> (Arc<Scene>, Arc<InstrumentedStore>) {
    let store = Arc::new(InstrumentedStore::new());
    let scene = Scene::with_store(store.clone());
    scene.set_time(1.0).unwrap();
    scene.write(&p("/static"), &Anim { label: "s".into(), value: 7 }).unwrap();
    for t in [1.0, 2.0, 3.0] {
        scene.set_time(t).unwrap();
        let s = Anim { label: "a".into(), value: t as i32 * 10 };
        scene.write(&p("/anim"), &s).unwrap();
    }
    (Arc::new(scene), store)
}

#[test]
fn test_no_mask_reads_everything() {
    let (scene, _) = setup();
    assert!(scene.should_read(&p("/static")));
    assert!(scene.should_read(&p("/anything")));
}

#[test]
fn test_populate_then_apply() {
    let (scene, store) = setup();
    scene.set_access_mask(Some(AccessMask::new()));
    scene.set_populating_access_mask(true);
    assert!(scene.should_read(&p("/static")));

    scene.set_time(1.0).unwrap();
    assert!(scene.read::<Anim>(&p("/static")).unwrap().is_some());
    assert!(scene.read::<Anim>(&p("/anim")).unwrap().is_some());

    scene.set_populating_access_mask(false);
    let mask = scene.access_mask().unwrap();
    assert_eq!(mask.paths(), vec![p("/anim")]);
    assert_eq!(
        mask.get(&p("/anim")).unwrap().dynamic_members,
        HashSet::from(["value".to_string()])
    );

    // Excluded prims read as missing without touching the store.
    let before = store.lookups(&p("/static"));
    assert!(!scene.should_read(&p("/static")));
    assert_eq!(scene.read::<Anim>(&p("/static")).unwrap(), None);
    assert_eq!(store.lookups(&p("/static")), before);

    // Only varying members are refreshed.
    scene.set_time(2.0).unwrap();
    let mut sample = Anim { label: "kept".into(), value: 0 };
    let report = scene.read_into(&p("/anim"), &mut sample).unwrap();
    assert!(report.found);
    assert_eq!(sample, Anim { label: "kept".into(), value: 20 });

    // Detaching restores full reads.
    let taken = scene.take_access_mask().unwrap();
    assert_eq!(taken.len(), 1);
    assert_eq!(
        scene.read::<Anim>(&p("/static")).unwrap(),
        Some(Anim { label: "s".into(), value: 7 })
    );
}

#[test]
fn test_bulk_read_populates_mask() {
    let (scene, store) = setup();
    scene.set_access_mask(Some(AccessMask::new()));
    scene.set_populating_access_mask(true);
    scene.set_time(3.0).unwrap();

    let paths = vec![p("/static"), p("/anim")];
    let first: Vec<_> = ReadAllJob::<Anim>::new(Arc::clone(&scene), paths.clone())
        .map(|item| item.unwrap())
        .collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first[1].sample.as_ref().unwrap().value, 30);

    scene.set_populating_access_mask(false);
    let lookups = store.lookups(&p("/static"));
    let second: Vec<_> = ReadAllJob::<Anim>::new(Arc::clone(&scene), paths)
        .map(|item| item.unwrap())
        .collect();

    assert_eq!(second.len(), 1);
    assert_eq!(second[0].path, p("/anim"));
    assert_eq!(second[0].sample, Some(Anim { label: String::new(), value: 30 }));
    assert_eq!(store.lookups(&p("/static")), lookups);
}

#[test]
fn test_masked_write_is_skipped() {
    let (scene, _) = setup();
    let mut mask = AccessMask::new();
    mask.include_members(p("/anim"), ["value"]);
    scene.set_access_mask(Some(mask));

    scene.write(&p("/new"), &Anim::default()).unwrap();
    scene.set_access_mask(None);
    assert_eq!(scene.prim_type(&p("/new")).unwrap(), None);
}
