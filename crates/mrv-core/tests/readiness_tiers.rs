//! # Readiness Tier Tests (T0-T3)
//!
//! End-to-end checks of the assessment flow against the on-disk store.
//!
//! ## Tiers
//! - T0: Input Integrity
//! - T1: Deterministic Scoring
//! - T2: Narrative Structure
//! - T3: Persistence and History

use mrv_core::{
    Dimension, MrvError, Project, ProjectId, Ratings, RedbStore, ScoreStore, Session, Stage,
    build_narrative, classify_stage, compute_score, rank_dimensions,
};
use tempfile::tempdir;

// =============================================================================
// TIER T0: INPUT INTEGRITY
// =============================================================================

mod t0_input_integrity {
    use super::*;

    /// T0.1: Every value in range is accepted.
    #[test]
    fn in_range_ratings_accepted() {
        for value in 0..=5 {
            assert!(Ratings::new([value; 6]).is_ok());
        }
    }

    /// T0.2: A value above five is rejected with the offending dimension.
    #[test]
    fn out_of_range_rating_rejected() {
        let result = Ratings::new([3, 3, 3, 3, 3, 9]);
        assert!(matches!(
            result,
            Err(MrvError::InvalidRating {
                dimension: Dimension::Uncertainty,
                value: 9
            })
        ));
    }

    /// T0.3: Deserialized ratings can be validated after the fact.
    #[test]
    fn deserialized_ratings_validate() {
        let ratings: Ratings = serde_json::from_str(
            r#"{"boundary":1,"baseline":2,"assumptions":3,"ef_trace":4,"data_quality":5,"uncertainty":7}"#,
        )
        .expect("parse");
        assert!(ratings.validate().is_err());
    }
}

// =============================================================================
// TIER T1: DETERMINISTIC SCORING
// =============================================================================

mod t1_deterministic_scoring {
    use super::*;

    /// T1.1: Extremes map to 0 and 100.
    #[test]
    fn extremes() {
        assert_eq!(compute_score(&Ratings::new([0; 6]).expect("valid")), 0.0);
        assert_eq!(compute_score(&Ratings::new([5; 6]).expect("valid")), 100.0);
    }

    /// T1.2: Stage boundaries are half-open.
    #[test]
    fn stage_boundaries() {
        assert_eq!(classify_stage(49.9), Stage::Early);
        assert_eq!(classify_stage(50.0), Stage::Intermediate);
        assert_eq!(classify_stage(74.9), Stage::Intermediate);
        assert_eq!(classify_stage(75.0), Stage::Strong);
    }

    /// T1.3: Scenario (3,3,3,2,3,2) is 53.33% and Intermediate.
    #[test]
    fn default_scenario() {
        let ratings = Ratings::new([3, 3, 3, 2, 3, 2]).expect("valid");
        let pct = compute_score(&ratings);
        assert!((pct - 160.0 / 3.0).abs() < 1e-9);
        assert_eq!(classify_stage(pct), Stage::Intermediate);
    }
}

// =============================================================================
// TIER T2: NARRATIVE STRUCTURE
// =============================================================================

mod t2_narrative_structure {
    use super::*;

    /// T2.1: The scenario names ef_trace and uncertainty as weakest.
    #[test]
    fn scenario_weakest_and_strongest() {
        let ratings = Ratings::new([3, 3, 3, 2, 3, 2]).expect("valid");
        let ranking = rank_dimensions(&ratings);

        let weakest: Vec<_> = ranking.weakest.iter().map(|(d, _)| *d).collect();
        assert_eq!(weakest, vec![Dimension::EfTrace, Dimension::Uncertainty]);
        assert!(ranking.strongest.iter().all(|(_, v)| *v == 3));

        let narrative = build_narrative(compute_score(&ratings), &ratings);
        assert!(narrative.contains("- **Weakest areas:** Ef Trace (2/5), Uncertainty (2/5)"));
        assert!(
            narrative.contains("- **Strongest areas:** Assumptions (3/5), Data Quality (3/5)")
        );
    }

    /// T2.2: The narrative carries every required section.
    #[test]
    fn all_sections_present() {
        let ratings = Ratings::new([5, 4, 3, 2, 1, 0]).expect("valid");
        let narrative = build_narrative(compute_score(&ratings), &ratings);

        for section in [
            "### Carbon Integrity Narrative",
            "- **MRV Readiness (screening):** 50%",
            "- **Maturity stage:** Intermediate (decision-support)",
            "- **Strongest areas:** Baseline (4/5), Boundary (5/5)",
            "- **Weakest areas:** Uncertainty (0/5), Data Quality (1/5)",
            "- **Recommendation:**",
            "not an audit outcome",
        ] {
            assert!(narrative.contains(section), "missing: {section}");
        }
    }
}

// =============================================================================
// TIER T3: PERSISTENCE AND HISTORY
// =============================================================================

mod t3_persistence {
    use super::*;

    /// T3.1: A fresh store lists no projects and saving is refused.
    #[test]
    fn empty_store_refuses_save() {
        let temp = tempdir().expect("temp dir");
        let mut session = Session::with_redb(temp.path().join("mrv.redb")).expect("open");

        assert!(session.list_projects().is_empty());
        assert!(session.active_project().is_none());

        let assessment = session.assess(Ratings::default());
        assert!(matches!(
            session.save(&assessment, "notes"),
            Err(MrvError::NoActiveProject)
        ));
    }

    /// T3.2: Save, reopen, read back: identical ratings and score.
    #[test]
    fn saved_snapshot_survives_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("mrv.redb");

        let (id, assessment) = {
            let mut session = Session::with_redb(&path).expect("open");
            session
                .upsert_project(Project::new("p-1").with_code("CR-1").with_name("Cookstoves"))
                .expect("seed");
            let assessment = session.assess(Ratings::default());
            let id = session.save(&assessment, "invoices missing").expect("save");
            (id, assessment)
        };

        let session = Session::with_redb(&path).expect("reopen");
        let stored = session.get_score(&id).expect("get").expect("present");
        assert_eq!(stored.ratings, assessment.ratings);
        assert_eq!(stored.score_pct.to_bits(), assessment.score_pct.to_bits());
        assert_eq!(stored.narrative, assessment.narrative);
    }

    /// T3.3: Deleting a project keeps its scores with the reference cleared.
    #[test]
    fn delete_project_orphans_scores() {
        let temp = tempdir().expect("temp dir");
        let mut session = Session::with_redb(temp.path().join("mrv.redb")).expect("open");
        session.upsert_project(Project::new("p-1")).expect("seed");
        let assessment = session.assess(Ratings::new([4; 6]).expect("valid"));
        let id = session.save(&assessment, "").expect("save");

        assert!(session.delete_project(&ProjectId::new("p-1")).expect("delete"));
        let stored = session.get_score(&id).expect("get").expect("kept");
        assert_eq!(stored.project_id, None);
        assert_eq!(session.score_count().expect("count"), 1);
    }

    /// T3.4: Schema creation is safe on every start.
    #[test]
    fn reopen_is_idempotent() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("mrv.redb");
        let mut store = RedbStore::open(&path).expect("open");
        store.ensure_schema().expect("again");
        drop(store);
        let store = RedbStore::open(&path).expect("reopen");
        assert_eq!(store.score_count().expect("count"), 0);
    }

    /// T3.5: History is per project and carries deltas.
    #[test]
    fn history_tracks_improvement() {
        let temp = tempdir().expect("temp dir");
        let mut session = Session::with_redb(temp.path().join("mrv.redb")).expect("open");
        session.upsert_project(Project::new("p-1")).expect("seed");
        session.upsert_project(Project::new("p-2")).expect("seed");

        let p1 = ProjectId::new("p-1");
        let p2 = ProjectId::new("p-2");
        let low = session.assess(Ratings::new([2; 6]).expect("valid"));
        let high = session.assess(Ratings::new([4; 6]).expect("valid"));
        let mid = session.assess(Ratings::new([3; 6]).expect("valid"));
        let first = session.save_for(&p1, &low, "").expect("save");
        session.save_for(&p2, &low, "").expect("save");
        let second = session.save_for(&p1, &high, "").expect("save");
        let third = session.save_for(&p1, &mid, "").expect("save");

        let history = session.history(&p1).expect("history");
        let ids: Vec<_> = history.iter().map(|h| h.score.mrv_id.clone()).collect();
        assert_eq!(ids, vec![first, second, third]);
        assert_eq!(history[0].change_pct, None);
        assert_eq!(history[1].change_pct, Some(40.0));
        assert!(history[2].change_pct.is_some_and(|c| c < 0.0));

        assert_eq!(session.history(&p2).expect("history").len(), 1);
        assert!(session.history(&ProjectId::new("p-3")).expect("history").is_empty());
    }
}
