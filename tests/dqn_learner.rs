use grid_arena::ai::{DqnConfig, DqnLearner};
use grid_arena::checkpoint::{CheckpointManager, CheckpointManagerConfig, CheckpointMetrics};

const STATE_DIM: usize = 6;
const NUM_ACTIONS: usize = 9;

fn config(seed: u64) -> DqnConfig {
    DqnConfig {
        learning_rate: 1e-3,
        batch_size: 4,
        replay_capacity: 64,
        hidden_1: 16,
        hidden_2: 8,
        seed: Some(seed),
        ..Default::default()
    }
}

fn state(i: usize) -> Vec<f32> {
    (0..STATE_DIM).map(|j| ((i * 7 + j * 3) % 5) as f32 / 4.0).collect()
}

fn all_actions() -> Vec<usize> {
    (0..NUM_ACTIONS).collect()
}

fn feed(learner: &mut DqnLearner, steps: usize) {
    for i in 0..steps {
        let action = i % NUM_ACTIONS;
        let reward = if action == 5 { 1.0 } else { 0.0 };
        learner
            .observe(&state(i), action, reward, &state(i + 1), i % 4 == 3, &all_actions())
            .unwrap();
        learner.train_step(4).unwrap();
    }
}

#[test]
fn selection_respects_legal_set_even_against_the_argmax() {
    let mut learner = DqnLearner::new(STATE_DIM, NUM_ACTIONS, config(3));
    feed(&mut learner, 40);

    let s = state(0);
    let favourite = learner.greedy_action(&s, &all_actions()).unwrap();
    let legal: Vec<usize> = all_actions()
        .into_iter()
        .filter(|&a| a != favourite)
        .take(2)
        .collect();

    for eps in [0.0, 0.5, 1.0] {
        learner.set_epsilon(eps);
        for _ in 0..100 {
            let action = learner.select_action(&s, &legal).unwrap();
            assert!(legal.contains(&action), "picked {action} outside {legal:?}");
        }
    }
}

#[test]
fn epsilon_never_increases_or_drops_below_minimum() {
    let mut cfg = config(4);
    cfg.epsilon_decay = 0.8;
    cfg.epsilon_min = 0.2;
    let mut learner = DqnLearner::new(STATE_DIM, NUM_ACTIONS, cfg);

    let mut last = learner.epsilon();
    for i in 0..40 {
        learner
            .observe(&state(i), i % NUM_ACTIONS, 0.0, &state(i + 1), false, &all_actions())
            .unwrap();
        learner.train_step(4).unwrap();
        assert!(learner.epsilon() <= last);
        assert!(learner.epsilon() >= 0.2);
        last = learner.epsilon();
    }
    assert!((last - 0.2).abs() < 1e-6);
}

#[test]
fn save_then_load_reproduces_greedy_choices() {
    let dir = tempfile::tempdir().unwrap();
    let mut trained = DqnLearner::new(STATE_DIM, NUM_ACTIONS, config(5));
    feed(&mut trained, 30);
    trained.update_target_network();
    trained.save(dir.path()).unwrap();

    let mut restored = DqnLearner::new(STATE_DIM, NUM_ACTIONS, config(99));
    restored.load(dir.path()).unwrap();

    assert_eq!(restored.train_steps(), trained.train_steps());
    assert!((restored.epsilon() - trained.epsilon()).abs() < 1e-6);
    for i in 0..10 {
        let s = state(i);
        assert_eq!(
            restored.greedy_action(&s, &all_actions()).unwrap(),
            trained.greedy_action(&s, &all_actions()).unwrap()
        );
        let a = trained.q_values(&s).unwrap();
        let b = restored.q_values(&s).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-5);
        }
    }
}

#[test]
fn checkpoint_manager_resumes_latest() {
    let dir = tempfile::tempdir().unwrap();
    let manager = CheckpointManager::new(CheckpointManagerConfig {
        checkpoint_dir: dir.path().to_path_buf(),
        ..Default::default()
    });

    let mut learner = DqnLearner::new(STATE_DIM, NUM_ACTIONS, config(6));
    feed(&mut learner, 12);
    let metrics = CheckpointMetrics {
        average_reward: 0.5,
        training_steps: learner.train_steps(),
        ..Default::default()
    };
    manager.save_checkpoint(&learner, "synthetic", &metrics, 10).unwrap();
    feed(&mut learner, 8);
    manager.save_checkpoint(&learner, "synthetic", &metrics, 20).unwrap();

    let mut resumed = DqnLearner::new(STATE_DIM, NUM_ACTIONS, config(7));
    let data = manager.load_latest(&mut resumed).unwrap();
    assert_eq!(data.metadata.episode, 20);
    assert_eq!(data.metadata.environment, "synthetic");
    assert_eq!(resumed.train_steps(), learner.train_steps());
    assert_eq!(manager.list_checkpoints().unwrap().len(), 2);
}
