//! Tests for zoned scaling.

use std::collections::BTreeSet;

use crate::geom::{
    MeshSnapshot, ScaleParameters, Target, Tolerance, Zone, ZoneClassifier, ZoneLayout,
    ZoneSelection, ZoneSelector, default_sole_mesh, scale,
};

fn sole_snapshot() -> MeshSnapshot {
    MeshSnapshot::capture(&default_sole_mesh()).unwrap()
}

fn classify(baseline: &MeshSnapshot, layout: ZoneLayout, selector: ZoneSelector) -> ZoneSelection {
    let c = ZoneClassifier::new(layout, Tolerance::default_geom()).unwrap();
    c.classify(baseline.positions(), baseline.bbox(), selector, &BTreeSet::new())
        .unwrap()
}

#[test]
fn full_zone_matches_closed_form() {
    let baseline = sole_snapshot();
    let selection = classify(&baseline, ZoneLayout::default(), ZoneSelector::FULL_ALL);
    let params = ScaleParameters::new(1.10, 0.95, 1.05);

    let (positions, diag) = scale(&baseline, &selection, &params).unwrap();
    let o = baseline.bbox().center();

    assert_eq!(diag.scaled_count, baseline.vertex_count());
    assert_eq!(diag.blended_count, 0);
    for (new, p) in positions.iter().zip(baseline.positions()) {
        let expected = [
            o.x + (p[0] - o.x) * 1.10,
            o.y + (p[1] - o.y) * 0.95,
            o.z + (p[2] - o.z) * 1.05,
        ];
        for k in 0..3 {
            assert!((new[k] - expected[k]).abs() < 1e-12);
        }
    }
}

#[test]
fn unit_factors_reproduce_baseline_exactly() {
    let baseline = sole_snapshot();
    for zone in Zone::ALL {
        let selection = classify(
            &baseline,
            ZoneLayout::default(),
            ZoneSelector::new(zone, Target::All),
        );
        let (positions, _) = scale(&baseline, &selection, &ScaleParameters::IDENTITY).unwrap();
        assert_eq!(positions, baseline.positions());
    }
}

#[test]
fn heel_scaling_leaves_toe_alone() {
    let baseline = sole_snapshot();
    let layout = ZoneLayout::default().blend_margin(0.1);
    let heel = classify(&baseline, layout, ZoneSelector::new(Zone::Heel, Target::All));
    let (positions, diag) = scale(&baseline, &heel, &ScaleParameters::uniform(1.5)).unwrap();

    assert!(diag.blended_count > 0);
    for (i, (new, old)) in positions.iter().zip(baseline.positions()).enumerate() {
        if heel.contains(i) {
            continue;
        }
        assert_eq!(new, old, "vertex {i} outside the heel moved");
    }
}

#[test]
fn blended_vertices_move_less_than_core_vertices() {
    let baseline = sole_snapshot();
    let layout = ZoneLayout::default().blend_margin(0.2);
    let toe = classify(&baseline, layout, ZoneSelector::new(Zone::Toe, Target::All));
    let (positions, diag) = scale(&baseline, &toe, &ScaleParameters::new(1.0, 2.0, 1.0)).unwrap();
    let o = diag.origin;

    for (i, w) in toe.iter() {
        let old = baseline.positions()[i];
        let expected = o.y + (old[1] - o.y) * (1.0 + w);
        assert!((positions[i][1] - expected).abs() < 1e-12);
        assert_eq!(positions[i][0], old[0]);
        assert_eq!(positions[i][2], old[2]);
    }
}

#[test]
fn empty_selection_is_noop() {
    let baseline = sole_snapshot();
    let (positions, diag) =
        scale(&baseline, &ZoneSelection::default(), &ScaleParameters::uniform(3.0)).unwrap();
    assert_eq!(diag.scaled_count, 0);
    assert_eq!(positions, baseline.positions());
}
