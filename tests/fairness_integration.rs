//! Integration tests for merit-proportional time slicing
//!
//! These drive schedulers the way a population manager does:
//! - births and rewards adjust merit
//! - deaths drop merit to zero
//! - one `next_id` per simulated cycle

use merit_slicer::schedule::{
    ConstSchedule, DemeProbSchedule, IntegratedSchedule, ProbDemeProbSchedule,
};
use merit_slicer::{ChangeList, Merit, Schedule, SchedulerConfig, SlicingMethod};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn tally(schedule: &mut impl Schedule, cycles: usize) -> Vec<usize> {
    let mut counts = vec![0; schedule.item_count()];
    for _ in 0..cycles {
        let id = schedule.next_id().expect("something to schedule");
        counts[id] += 1;
    }
    counts
}

#[test]
fn test_integrated_exact_split_over_one_period() {
    init_tracing();
    let mut schedule = IntegratedSchedule::new(4);
    schedule.adjust(0, Merit::new(4.0), 0).unwrap();
    schedule.adjust(1, Merit::new(2.0), 0).unwrap();
    schedule.adjust(2, Merit::new(1.0), 0).unwrap();
    schedule.adjust(3, Merit::new(1.0), 0).unwrap();

    assert_eq!(tally(&mut schedule, 8), vec![4, 2, 1, 1]);
    assert!(schedule.is_consistent());
}

#[test]
fn test_integrated_arbitrary_merits_are_exact() {
    init_tracing();
    let merits = [13.0, 6.0, 1.0, 9.0, 0.0, 32.0, 3.0];
    let total: f64 = merits.iter().sum();

    let mut schedule = IntegratedSchedule::new(merits.len());
    for (id, &merit) in merits.iter().enumerate() {
        schedule.set_merit(id, Merit::new(merit)).unwrap();
    }

    // Skip into the chain so the measured window starts mid-period
    let warmup = tally(&mut schedule, 11);
    assert_eq!(warmup.iter().sum::<usize>(), 11);

    let periods = 5;
    let counts = tally(&mut schedule, periods * total as usize);
    for (id, &merit) in merits.iter().enumerate() {
        let expected = periods as f64 * merit;
        let diff = (counts[id] as f64 - expected).abs();
        // Phase offset of the window can shift at most one period's worth
        assert!(
            diff <= merit,
            "item {}: got {}, expected about {}",
            id,
            counts[id],
            expected
        );
    }
    assert_eq!(counts[4], 0);
}

#[test]
fn test_population_churn_keeps_every_policy_consistent() {
    init_tracing();
    for code in 0..=5i64 {
        let config = SchedulerConfig {
            slicing_method: SlicingMethod::try_from(code).unwrap(),
            item_count: 16,
            num_demes: 4,
            burst_size: 3,
            seed: 99,
        };
        let mut scheduler = config.build().unwrap();
        scheduler.set_change_list(Some(ChangeList::with_capacity(16)));

        for round in 0..50usize {
            let born = (round * 7) % 16;
            let died = (round * 5 + 3) % 16;
            scheduler
                .set_merit(born, Merit::new((round % 9) as f64 + 1.0))
                .unwrap();
            scheduler.set_merit(died, Merit::new(0.0)).unwrap();

            for _ in 0..10 {
                if let Some(id) = scheduler.next_id() {
                    assert!(scheduler.status(id) > 0.0, "{:?} ran dead item {}", config.slicing_method, id);
                }
            }
            assert!(scheduler.is_consistent(), "{:?}", config.slicing_method);
        }

        let changes = scheduler.change_list().unwrap();
        assert!(changes.change_count() > 0);
        assert!(changes.change_count() <= 16);
    }
}

#[test]
fn test_const_round_robin_window() {
    let mut schedule = ConstSchedule::new(10);
    for id in [1, 4, 5, 8] {
        schedule.set_merit(id, Merit::new(id as f64)).unwrap();
    }
    for _ in 0..3 {
        let mut window: Vec<_> = (0..4).map(|_| schedule.next_id().unwrap()).collect();
        window.sort_unstable();
        assert_eq!(window, vec![1, 4, 5, 8]);
    }
}

#[test]
fn test_deme_zero_merit_deme_is_skipped() {
    init_tracing();
    let mut schedule = DemeProbSchedule::with_seed(4, 2, 3).unwrap();
    schedule.adjust(2, Merit::new(1.0), 1).unwrap();
    schedule.adjust(3, Merit::new(2.0), 1).unwrap();

    let counts = tally(&mut schedule, 300);
    assert_eq!(counts[0] + counts[1], 0);
    assert!(counts[3] > counts[2]);
}

#[test]
fn test_prob_deme_ignores_dead_demes() {
    let mut schedule = ProbDemeProbSchedule::with_seed(9, 3, 5).unwrap();
    schedule.adjust(6, Merit::new(1.0), 2).unwrap();
    schedule.adjust(1, Merit::new(4.0), 0).unwrap();
    schedule.adjust(1, Merit::new(0.0), 0).unwrap();

    let counts = tally(&mut schedule, 100);
    assert_eq!(counts[6], 100);
}

#[test]
fn test_config_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("merit-slicer-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let toml_path = dir.join("slicer.toml");
    std::fs::write(
        &toml_path,
        "slicing_method = \"deme_probabilistic\"\nitem_count = 20\nnum_demes = 5\n",
    )
    .unwrap();
    let config = SchedulerConfig::load(&toml_path).unwrap();
    assert_eq!(config.slicing_method, SlicingMethod::DemeProbabilistic);

    let json_path = dir.join("slicer.json");
    std::fs::write(&json_path, serde_json::to_string(&config).unwrap()).unwrap();
    assert_eq!(SchedulerConfig::load(&json_path).unwrap(), config);

    let scheduler = config.build().unwrap();
    assert_eq!(scheduler.item_count(), 20);

    std::fs::remove_dir_all(&dir).unwrap();
}
