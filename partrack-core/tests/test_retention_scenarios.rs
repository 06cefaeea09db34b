//! Track-begin retention decisions driven through the tracker

use partrack_core::diagnostics::DiagnosticKind;
use partrack_core::store::ParticleState;
use partrack_core::tests::test_helpers::{
    primary, run_track, secondary, step_between, truth_records,
};
use partrack_core::{
    FilterReason, ParticleTracker, TrackDisposition, TrackStart, TrackerConfig, TrackerError,
    NO_PARENT, NO_PARTICLE_ID,
};

fn tracker_with(config: TrackerConfig) -> ParticleTracker {
    ParticleTracker::new(config).unwrap()
}

#[test]
fn test_canonical_primary_accepted() {
    let mut tracker = tracker_with(TrackerConfig {
        energy_cut: 0.01,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));

    let disposition = run_track(&mut tracker, &primary(1, 0, "primary"), 3).unwrap();
    assert_eq!(disposition, TrackDisposition::Active);

    let ctx = tracker.event().unwrap();
    let particle = ctx.stores.active.get(1).unwrap();
    assert_eq!(particle.mother, NO_PARENT);
    assert_eq!(particle.process, "primary");
    assert!(particle.keep_full_trajectory());
    assert!(ctx.truth.track_truth(1).unwrap().from_canonical_primary);
    assert!(ctx.diagnostics.is_empty());

    let output = tracker.end_event().unwrap();
    assert_eq!(output.particles.len(), 1);
    assert_eq!(output.associations[0].generator_index, Some(0));
}

#[test]
fn test_primary_parent_forced_to_sentinel() {
    let mut tracker = tracker_with(TrackerConfig::default());
    tracker.begin_event(&truth_records(&["generator"]));
    let start = TrackStart {
        parent_id: 12,
        ..primary(1, 0, "primary")
    };
    run_track(&mut tracker, &start, 1).unwrap();
    let ctx = tracker.event().unwrap();
    assert_eq!(ctx.stores.active.get(1).unwrap().mother, NO_PARENT);
}

#[test]
fn test_compton_daughter_filtered() {
    let mut tracker = tracker_with(TrackerConfig {
        keep_em_shower_daughters: false,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 3).unwrap();

    let disposition = run_track(&mut tracker, &secondary(2, 1, "compt", 0.5), 2).unwrap();
    assert_eq!(
        disposition,
        TrackDisposition::Discarded(FilterReason::NotStoredProcess("compt".to_string()))
    );

    let ctx = tracker.event().unwrap();
    assert_eq!(ctx.process_counters["compt"], 1);
    assert_eq!(ctx.process_counters["phot"], 0);
    assert!(ctx.dropped_ancestry.descendants_of(1).unwrap().contains(&2));
    assert!(!ctx.stores.exists(2));
    assert_eq!(tracker.target_track_id(2), Some(-1));
    assert_eq!(tracker.target_track_id(1), Some(1));

    let output = tracker.end_event().unwrap();
    assert_eq!(output.process_counters["compt"], 1);
    assert!(output.dropped_ancestry.contains_track(2));
    assert_eq!(output.particles.len(), 1);
}

#[test]
fn test_filtered_daughter_kept_in_dropped_store() {
    let mut tracker = tracker_with(TrackerConfig {
        keep_em_shower_daughters: false,
        store_dropped_particles: true,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 3).unwrap();

    let disposition = run_track(&mut tracker, &secondary(2, 1, "eBrem", 0.5), 2).unwrap();
    assert_eq!(
        disposition,
        TrackDisposition::Dropped(FilterReason::NotStoredProcess("Brem".to_string()))
    );

    let ctx = tracker.event().unwrap();
    let dropped = ctx.stores.dropped.as_ref().unwrap();
    let particle = dropped.get(2).unwrap();
    assert_eq!(particle.mother, 1);
    assert_eq!(particle.num_trajectory_points(), 3);
    assert!(ctx.stores.active.get(2).is_none());

    let output = tracker.end_event().unwrap();
    let minimal = output.dropped_particles().unwrap();
    assert_eq!(minimal.len(), 1);
    assert_eq!(minimal[0].track_id, 2);
}

#[test]
fn test_energy_cut_discards_secondary() {
    let mut tracker = tracker_with(TrackerConfig {
        energy_cut: 0.01,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 3).unwrap();

    let disposition = run_track(&mut tracker, &secondary(2, 1, "eIoni", 0.001), 4).unwrap();
    assert_eq!(disposition, TrackDisposition::Discarded(FilterReason::EnergyCut));

    let ctx = tracker.event().unwrap();
    assert!(matches!(ctx.stores.active.state(2), ParticleState::Absent));
    assert!(ctx.dropped_ancestry.descendants_of(1).unwrap().contains(&2));
    assert_eq!(ctx.genealogy.parent_of(2), Some(1));
    assert_eq!(tracker.target_track_id(2), Some(-1));

    // The primary's trajectory is untouched by the dropped track's steps
    assert_eq!(ctx.stores.active.get(1).unwrap().num_trajectory_points(), 4);
}

#[test]
fn test_energy_cut_exempts_species_zero() {
    let mut tracker = tracker_with(TrackerConfig {
        energy_cut: 0.01,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 1).unwrap();

    let photon = TrackStart {
        pdg_code: 0,
        ..secondary(2, 1, "Scintillation", 1e-9)
    };
    assert_eq!(
        run_track(&mut tracker, &photon, 1).unwrap(),
        TrackDisposition::Active
    );
}

#[test]
fn test_descendant_of_dropped_track_reparented() {
    let mut tracker = tracker_with(TrackerConfig {
        energy_cut: 0.01,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 2).unwrap();
    run_track(&mut tracker, &secondary(2, 1, "muIoni", 0.002), 1).unwrap();
    run_track(&mut tracker, &secondary(3, 2, "eIoni", 0.001), 1).unwrap();
    run_track(&mut tracker, &secondary(4, 3, "eBrem", 0.5), 1).unwrap();

    let ctx = tracker.event().unwrap();
    assert_eq!(ctx.stores.active.get(4).unwrap().mother, 1);
    assert_eq!(ctx.dropped_ancestry.descendants_of(1).unwrap().len(), 2);

    let output = tracker.end_event().unwrap();
    assert_eq!(output.particle(1).unwrap().daughters, vec![4]);
}

#[test]
fn test_unresolved_parent_is_recoverable() {
    let mut tracker = tracker_with(TrackerConfig::default());
    tracker.begin_event(&truth_records(&["generator"]));

    // Primary whose record is erased by a malformed end
    tracker.begin_track(&primary(1, 0, "primary")).unwrap();
    tracker.step(&step_between(0.0, 1.0, "Transportation")).unwrap();
    tracker
        .end_track(&partrack_core::tests::test_helpers::malformed_end(1.0))
        .unwrap();

    let disposition = run_track(&mut tracker, &secondary(2, 1, "Decay", 0.5), 1).unwrap();
    assert_eq!(disposition, TrackDisposition::Active);

    let ctx = tracker.event().unwrap();
    assert_eq!(ctx.stores.active.get(2).unwrap().mother, 1);
    assert_eq!(ctx.diagnostics.of_kind(DiagnosticKind::UnresolvedParent).count(), 1);
}

#[test]
fn test_missing_parent_truth_is_fatal() {
    let mut tracker = tracker_with(TrackerConfig::default());
    tracker.begin_event(&truth_records(&["generator"]));
    let err = tracker
        .begin_track(&secondary(7, 99, "Decay", 0.5))
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::MissingTruthIndex {
            track: 7,
            parent: 99
        }
    ));
}

#[test]
fn test_only_primary_full_trajectories() {
    let mut tracker = tracker_with(TrackerConfig {
        keep_only_primary_full_trajectories: true,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator", "background"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 2).unwrap();
    run_track(&mut tracker, &primary(2, 1, "primaryBackground"), 2).unwrap();
    run_track(&mut tracker, &secondary(3, 1, "Decay", 0.5), 2).unwrap();
    run_track(&mut tracker, &secondary(4, 2, "Decay", 0.5), 2).unwrap();

    let ctx = tracker.event().unwrap();
    let active = &ctx.stores.active;
    assert!(active.get(1).unwrap().keep_full_trajectory());
    assert!(!active.get(2).unwrap().keep_full_trajectory());
    assert!(active.get(3).unwrap().keep_full_trajectory());
    assert!(!active.get(4).unwrap().keep_full_trajectory());

    assert_eq!(active.get(2).unwrap().process, "primaryBackground");
    assert_eq!(
        ctx.diagnostics
            .of_kind(DiagnosticKind::NonCanonicalPrimary)
            .count(),
        1
    );
    assert_eq!(ctx.truth.track_truth(4).unwrap().truth_index, 1);
}

#[test]
fn test_unexpected_primary_label_overridden() {
    let mut tracker = tracker_with(TrackerConfig {
        keep_only_primary_full_trajectories: true,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "Decay"), 2).unwrap();

    let ctx = tracker.event().unwrap();
    let particle = ctx.stores.active.get(1).unwrap();
    assert_eq!(particle.process, "primary");
    assert!(particle.keep_full_trajectory());
    assert!(ctx.diagnostics.has_warnings());
    assert_eq!(
        ctx.diagnostics
            .of_kind(DiagnosticKind::PrimaryLabelOverridden)
            .count(),
        1
    );
}

#[test]
fn test_generator_allow_list_limits_full_trajectories() {
    let mut tracker = tracker_with(TrackerConfig {
        keep_gen_trajectories: vec!["cosmics".to_string()],
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator", "cosmics"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 4).unwrap();
    run_track(&mut tracker, &primary(2, 1, "primary"), 4).unwrap();

    let ctx = tracker.event().unwrap();
    let beam = ctx.stores.active.get(1).unwrap();
    let cosmic = ctx.stores.active.get(2).unwrap();
    assert!(!beam.keep_full_trajectory());
    assert_eq!(beam.num_trajectory_points(), 2);
    assert!(cosmic.keep_full_trajectory());
    assert_eq!(cosmic.num_trajectory_points(), 5);
}

#[test]
fn test_resumed_track_adds_no_record() {
    let mut tracker = tracker_with(TrackerConfig::default());
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 1).unwrap();

    let resumed = TrackStart {
        proper_time: 2.5,
        ..secondary(2, 1, "Decay", 0.5)
    };
    assert_eq!(
        run_track(&mut tracker, &resumed, 2).unwrap(),
        TrackDisposition::Resumed
    );
    let ctx = tracker.event().unwrap();
    assert!(!ctx.stores.exists(2));
    assert!(ctx.truth.track_truth(2).is_some());
}

#[test]
fn test_no_ancestor_target_when_ancestor_unstored() {
    let mut tracker = tracker_with(TrackerConfig {
        energy_cut: 0.01,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    tracker.begin_track(&secondary(5, 40, "eIoni", 0.001)).unwrap();
    assert_eq!(tracker.target_track_id(5), Some(NO_PARTICLE_ID));
}

#[test]
fn test_callbacks_require_event() {
    let mut tracker = tracker_with(TrackerConfig::default());
    let err = tracker.begin_track(&primary(1, 0, "primary")).unwrap_err();
    assert!(matches!(err, TrackerError::NoEventInProgress));
    assert!(matches!(
        tracker.end_event().unwrap_err(),
        TrackerError::NoEventInProgress
    ));
}

#[test]
fn test_ancestor_walks_end_at_stored_tracks() {
    let mut tracker = tracker_with(TrackerConfig {
        energy_cut: 0.01,
        keep_em_shower_daughters: false,
        store_dropped_particles: true,
        ..TrackerConfig::default()
    });
    tracker.begin_event(&truth_records(&["generator"]));
    run_track(&mut tracker, &primary(1, 0, "primary"), 2).unwrap();
    run_track(&mut tracker, &secondary(2, 1, "compt", 0.5), 1).unwrap();
    run_track(&mut tracker, &secondary(3, 2, "eIoni", 0.005), 1).unwrap();
    run_track(&mut tracker, &secondary(4, 3, "Decay", 0.5), 1).unwrap();
    run_track(&mut tracker, &secondary(5, 2, "Decay", 0.5), 1).unwrap();
    run_track(&mut tracker, &secondary(6, 4, "Decay", 0.5), 1).unwrap();

    let ctx = tracker.event().unwrap();
    // Only filtered tracks and re-parented survivors are linked
    assert_eq!(ctx.genealogy.parent_of(1), None);
    assert_eq!(ctx.genealogy.parent_of(5), None);
    assert_eq!(ctx.genealogy.parent_of(6), None);
    assert_eq!(ctx.genealogy.parent_of(4), Some(3));

    let accepted: Vec<_> = ctx.stores.active.live().map(|p| (p.track_id, p.mother)).collect();
    assert_eq!(accepted.len(), 4);
    for (track, mother) in accepted {
        for id in [track, mother] {
            let walk = ctx.genealogy.walk(id);
            assert!(!walk.cycle);
            if let Some(ancestor) = walk.ancestor {
                assert!(ctx.stores.exists(ancestor), "track {} walks to {}", id, ancestor);
            }
            assert_eq!(ctx.genealogy.resolve_ancestor(id), walk.ancestor);
        }
    }
    assert_eq!(ctx.genealogy.resolve_ancestor(4), Some(1));
    assert_eq!(ctx.genealogy.resolve_ancestor(6), None);
    assert_eq!(ctx.diagnostics.of_kind(DiagnosticKind::GenealogyCycle).count(), 0);
}
