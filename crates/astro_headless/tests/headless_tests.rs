//! Integration tests for the headless runner: content files, batches and
//! determinism checks.

use std::path::PathBuf;

use astro_core::data::parse_roster;
use astro_headless::{
    run_batch, run_encounter, run_encounter_with, verify_determinism, BatchConfig, BatchResults,
    Encounter, EncounterError, PlayerPolicy, RunOptions, RunResult,
};

fn content(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("content").join(path)
}

mod content_files {
    use super::*;

    #[test]
    fn test_encounter_files_match_builtins() {
        for name in Encounter::BUILTIN {
            let path = content(&format!("encounters/{name}.ron"));
            let loaded = Encounter::load(&path).unwrap();
            assert_eq!(Some(loaded), Encounter::builtin(name), "{}", path.display());
        }
    }

    #[test]
    fn test_resolve_accepts_paths() {
        let path = content("encounters/gnasher_den.ron");
        let encounter = Encounter::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(encounter.name, "gnasher_den");
        assert_eq!(encounter.bonus_experience, 60);
    }

    #[test]
    fn test_missing_file() {
        let err = Encounter::load(content("encounters/nowhere.ron")).unwrap_err();
        assert!(matches!(err, EncounterError::FileNotFound(_)));
    }

    #[test]
    fn test_monster_roster_is_valid() {
        let path = content("monsters.ron");
        let text = std::fs::read_to_string(&path).unwrap();
        let roster = parse_roster("monsters.ron", &text).unwrap();
        assert_eq!(roster.len(), 3);
        for monster in &roster {
            assert!(monster.validate().is_empty(), "{}: {:?}", monster.name, monster.validate());
        }
    }

    #[test]
    fn test_invalid_encounter_reports_every_problem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(
            &path,
            r#"Encounter(
                name: "broken",
                player: (level: 40),
                monsters: [(name: "", base: (hp: 0))],
                max_ticks: 0,
            )"#,
        )
        .unwrap();

        let encounter = Encounter::load(&path).unwrap();
        let errors = encounter.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(matches!(
            encounter.ensure_valid(),
            Err(EncounterError::Invalid { .. })
        ));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = Encounter::from_ron_str("Encounter(name: ").unwrap_err();
        assert!(matches!(err, EncounterError::ParseError(_)));
    }
}

mod runs {
    use super::*;

    #[test]
    fn test_every_policy_finishes_row_house() {
        let encounter = Encounter::row_house();
        for policy in PlayerPolicy::ALL {
            for seed in 0..5 {
                let metrics = run_encounter(&encounter, seed, policy).unwrap();
                assert_ne!(metrics.result, RunResult::Timeout, "{policy} seed {seed}");
                assert_eq!(metrics.hp_start, 100);
                if metrics.result == RunResult::Win {
                    assert_eq!(metrics.monsters_defeated, 2);
                    assert_eq!(metrics.experience, 100);
                    assert!(metrics.hp_end > 0);
                } else {
                    assert_eq!(metrics.hp_end, 0);
                }
            }
        }
    }

    #[test]
    fn test_win_pays_bonus_and_levels() {
        let encounter = Encounter::from_ron_str(
            r#"Encounter(
                name: "rat",
                monsters: [(name: "Tunnel Rat", experience: 20, base: (hp: 30, off: 8, def: 5, dmg_phy: 1))],
                bonus_experience: 250,
            )"#,
        )
        .unwrap();
        for seed in 0..10 {
            let metrics = run_encounter(&encounter, seed, PlayerPolicy::Steady).unwrap();
            assert_eq!(metrics.result, RunResult::Win);
            assert_eq!(metrics.experience, 270);
            // 270 experience clears the level 2 threshold only.
            assert_eq!(metrics.levels_gained, 1);
        }
    }

    #[test]
    fn test_narration_is_recorded_on_request() {
        let options = RunOptions {
            record_narration: true,
            max_ticks: None,
        };
        let metrics = run_encounter_with(&Encounter::row_house(), 3, PlayerPolicy::Steady, options).unwrap();
        let last = metrics.narration.last().unwrap();
        assert!(last == "You are victorious!" || last == "You have been defeated.", "{last}");

        let quiet = run_encounter(&Encounter::row_house(), 3, PlayerPolicy::Steady).unwrap();
        assert!(quiet.narration.is_empty());
        assert_eq!(quiet.final_state_hash, metrics.final_state_hash);
    }

    #[test]
    fn test_verify_determinism_across_policies() {
        for policy in PlayerPolicy::ALL {
            let check = verify_determinism(&Encounter::gnasher_den(), 99, 4, policy).unwrap();
            assert!(check.passed(), "{policy}");
        }
    }
}

mod batches {
    use super::*;

    #[test]
    fn test_batch_results_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new("row_house", 12)
            .with_seed(1000)
            .with_policy(PlayerPolicy::Guarded)
            .with_output(dir.path().to_path_buf());

        let results = run_batch(config.clone()).unwrap();
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_runs, 12);
        assert_eq!(
            results.summary.wins + results.summary.losses + results.summary.timeouts,
            12
        );

        let path = dir.path().join("nested").join("batch_results.json");
        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.config, config);
        assert_eq!(loaded.runs, results.runs);
        assert_eq!(loaded.summary.wins, results.summary.wins);
    }

    #[test]
    fn test_batch_matches_single_runs() {
        let results = run_batch(BatchConfig::new("gnasher_den", 6).with_seed(20)).unwrap();
        let encounter = Encounter::gnasher_den();
        for run in &results.runs {
            let single = run_encounter(&encounter, run.seed, PlayerPolicy::Steady).unwrap();
            assert_eq!(&single, run);
        }
    }

    #[test]
    fn test_batch_from_file() {
        let path = content("encounters/row_house.ron");
        let results = run_batch(BatchConfig::new(path.to_str().unwrap(), 4)).unwrap();
        assert_eq!(results.runs.len(), 4);
        assert!(results.runs.iter().all(|r| r.encounter == "row_house"));
    }
}
