use std::collections::BTreeSet;

use sole_engine::geom::{
    Mesh, NoiseKind, NoiseParameters, ScaleParameters, Target, Zone, ZoneSelector,
};
use sole_engine::io::{read_stl_file, write_stl_file};
use sole_engine::{
    JsonPresetStore, MemoryPresetStore, PresetError, PresetStore, ShaperError, ShaperSession,
    mesh_signature,
};

fn smoke_noise() -> NoiseParameters {
    NoiseParameters::new(NoiseKind::Simplex, 3.0, 0.01, 42)
}

fn smoke_scale() -> ScaleParameters {
    ScaleParameters::new(1.10, 0.95, 1.05)
}

#[test]
fn default_sole_loads() {
    let mut session = ShaperSession::default();
    session.load_default().expect("load default");
    let mesh = session.live_mesh().expect("live mesh");
    assert!(mesh.vertex_count() > 0);
    assert!(mesh.face_count() > 0);
}

#[test]
fn noise_is_repeatable_across_reset() {
    let mut session = ShaperSession::default();
    session.load_default().unwrap();
    let pristine = session.signature().unwrap();

    session.apply_noise(&smoke_noise()).unwrap();
    let first = session.signature().unwrap();
    assert_ne!(first, pristine);

    session.reset_mesh().unwrap();
    assert_eq!(session.signature().unwrap(), pristine);

    session.apply_noise(&smoke_noise()).unwrap();
    assert_eq!(session.signature().unwrap(), first);
}

#[test]
fn full_scale_matches_closed_form() {
    let mut session = ShaperSession::default();
    session.load_default().unwrap();
    let baseline = session.pristine().unwrap().clone();
    let origin = baseline.bbox().center();

    session
        .apply_scale(&smoke_scale(), ZoneSelector::FULL_ALL, &BTreeSet::new())
        .unwrap();

    let live = session.live_mesh().unwrap();
    for (new, p) in live.positions.iter().zip(baseline.positions()) {
        assert!((new[0] - (origin.x + (p[0] - origin.x) * 1.10)).abs() < 1e-12);
        assert!((new[1] - (origin.y + (p[1] - origin.y) * 0.95)).abs() < 1e-12);
        assert!((new[2] - (origin.z + (p[2] - origin.z) * 1.05)).abs() < 1e-12);
    }
}

#[test]
fn smoke_flow_with_presets() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonPresetStore::open(dir.path().join("presets.json")).unwrap();

    let mut session = ShaperSession::default();
    session.load_default().unwrap();
    session.apply_noise(&smoke_noise()).unwrap();
    session
        .apply_scale(&smoke_scale(), ZoneSelector::FULL_ALL, &BTreeSet::new())
        .unwrap();
    let shaped = session.signature().unwrap();

    session
        .save_preset(
            &mut store,
            "RuntimeSmoke",
            smoke_noise(),
            smoke_scale(),
            ZoneSelector::FULL_ALL,
        )
        .unwrap();
    let loaded = session.load_preset(&store, "RuntimeSmoke").unwrap();
    assert_eq!(loaded.noise, smoke_noise());
    assert_eq!(loaded.scale, smoke_scale());

    session.replay_preset(&store, "RuntimeSmoke", &BTreeSet::new()).unwrap();
    assert_eq!(session.signature().unwrap(), shaped);

    session.delete_preset(&mut store, "RuntimeSmoke").unwrap();
    assert!(store.list().is_empty());
    assert!(matches!(
        session.load_preset(&store, "RuntimeSmoke"),
        Err(ShaperError::Preset(PresetError::NotFound(_)))
    ));
}

#[test]
fn replay_from_reopened_store_is_bit_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presets.json");
    let selector = ZoneSelector::new(Zone::Heel, Target::All);
    let noise = NoiseParameters::new(NoiseKind::Perlin, 0.1 + 0.2, -0.0123456789, -987_654_321);

    let mut first = ShaperSession::default();
    first.load_default().unwrap();
    {
        let mut store = JsonPresetStore::open(&path).unwrap();
        first
            .save_preset(&mut store, "heel", noise, smoke_scale(), selector)
            .unwrap();
        first.replay_preset(&store, "heel", &BTreeSet::new()).unwrap();
    }

    let store = JsonPresetStore::open(&path).unwrap();
    let mut second = ShaperSession::default();
    second.load_default().unwrap();
    second.replay_preset(&store, "heel", &BTreeSet::new()).unwrap();

    let a = first.live_mesh().unwrap();
    let b = second.live_mesh().unwrap();
    for (pa, pb) in a.positions.iter().zip(&b.positions) {
        for k in 0..3 {
            assert_eq!(pa[k].to_bits(), pb[k].to_bits());
        }
    }
}

#[test]
fn selected_target_only_moves_selection() {
    let mut session = ShaperSession::default();
    session.load_default().unwrap();
    let before = session.live_mesh().unwrap().positions.clone();

    let selection: BTreeSet<usize> = (0..before.len()).step_by(7).collect();
    session
        .apply_scale(
            &ScaleParameters::uniform(1.5),
            ZoneSelector::new(Zone::Full, Target::Selected),
            &selection,
        )
        .unwrap();

    let after = &session.live_mesh().unwrap().positions;
    for (i, (a, b)) in after.iter().zip(&before).enumerate() {
        if !selection.contains(&i) {
            assert_eq!(a, b, "unselected vertex {i} moved");
        }
    }
}

#[test]
fn custom_mesh_without_faces_uses_fallback_normals() {
    let mesh = Mesh::new(
        (0..100)
            .map(|i| {
                let t = f64::from(i);
                [t * 0.01, (t * 0.37).sin() * 0.02, 0.0]
            })
            .collect(),
        vec![],
    );
    let mut session = ShaperSession::default();
    session.load_mesh(mesh.clone()).unwrap();
    session.apply_noise(&smoke_noise()).unwrap();

    let live = session.live_mesh().unwrap();
    for (new, old) in live.positions.iter().zip(&mesh.positions) {
        assert_eq!(new[0], old[0]);
        assert_eq!(new[1], old[1]);
    }
    assert_ne!(mesh_signature(live), mesh_signature(&mesh));
}

#[test]
fn memory_store_matches_json_store_contract() {
    let mut memory = MemoryPresetStore::new();
    let session = ShaperSession::default();
    session
        .save_preset(&mut memory, " spaced ", smoke_noise(), smoke_scale(), ZoneSelector::FULL_ALL)
        .unwrap();
    assert_eq!(memory.list(), vec!["spaced".to_string()]);
    assert!(session.save_preset(&mut memory, "", smoke_noise(), smoke_scale(), ZoneSelector::FULL_ALL).is_err());
}

#[test]
fn shaped_sole_exports_and_reimports_as_stl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shaped.stl");

    let mut session = ShaperSession::default();
    session.load_default().unwrap();
    session
        .apply_scale(&smoke_scale(), ZoneSelector::FULL_ALL, &BTreeSet::new())
        .unwrap();
    session.apply_noise(&smoke_noise()).unwrap();
    let shaped = session.live_mesh().unwrap().clone();
    write_stl_file(&path, &shaped).unwrap();

    let imported = read_stl_file(&path).unwrap();
    assert_eq!(imported.face_count(), shaped.triangulated_indices().len() / 3);

    let mut reloaded = ShaperSession::default();
    reloaded.load_mesh(imported).unwrap();
    let (a, b) = (
        shaped.bbox().unwrap(),
        reloaded.live_mesh().unwrap().bbox().unwrap(),
    );
    assert!((a.size().x - b.size().x).abs() < 1e-6);
    assert!((a.size().z - b.size().z).abs() < 1e-6);
}
