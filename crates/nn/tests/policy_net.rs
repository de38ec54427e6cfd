use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reversi_core::{Board, Player};
use reversi_nn::{
    policy_net_topology, ExportedModel, NnConfig, PolicyNet, POLICY_B1, POLICY_B2, POLICY_W1,
    POLICY_W2,
};
use reversi_selfplay::{
    generate_greedy_samples, play_episode, PolicyValueModel, SelfPlayConfig,
};
use reversi_weights::load_weights;

fn small_net() -> PolicyNet {
    PolicyNet::new(NnConfig::default().with_hidden_size(16).with_learning_rate(1e-2)).unwrap()
}

#[test]
fn export_uses_policy_block_names() {
    let net = small_net();
    let tensors = net.export_tensors().unwrap();
    let names: Vec<&str> = tensors.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec![POLICY_W1, POLICY_B1, POLICY_W2, POLICY_B2]);
    assert_eq!(tensors[0].shape(), vec![16, 64]);
    assert_eq!(tensors[2].shape(), vec![64, 16]);
    policy_net_topology(16).check(&tensors).unwrap();
}

#[test]
fn fit_on_greedy_games_lowers_loss() {
    let mut rng = StdRng::seed_from_u64(3);
    let samples = generate_greedy_samples(5, &SelfPlayConfig::default(), &mut rng).unwrap();
    let mut net = small_net();

    let first = net.train_epoch(&samples, 32, &mut rng).unwrap();
    let last = net.fit(&samples, 40, 32, &mut rng).unwrap();
    assert!(first.is_finite() && last.is_finite());
    assert!(last < first, "loss went from {first} to {last}");
}

#[test]
fn fitted_net_imitates_greedy_opening() {
    let mut rng = StdRng::seed_from_u64(8);
    let samples = generate_greedy_samples(20, &SelfPlayConfig::default(), &mut rng).unwrap();
    let mut net = small_net();
    net.fit(&samples, 60, 64, &mut rng).unwrap();

    // Black's greedy opening moves all tie, so any of them counts
    let board = Board::new();
    let (logits, value) = net.predict(&board.features(Player::Black)).unwrap();
    assert_eq!(value, 0.0);
    let best = (0..64)
        .max_by(|&a, &b| logits[a].total_cmp(&logits[b]))
        .unwrap();
    assert!(board.legal_moves(Player::Black).contains(&best));
}

#[test]
fn rejected_import_leaves_net_unchanged() {
    let mut net = small_net();
    let before = net.export_tensors().unwrap();

    let wider = PolicyNet::new(NnConfig::default().with_hidden_size(8)).unwrap();
    assert!(net.import_tensors(&wider.export_tensors().unwrap()).is_err());

    let mut partial = before.clone();
    partial.pop();
    assert!(net.import_tensors(&partial).is_err());

    assert_eq!(net.export_tensors().unwrap(), before);
}

#[test]
fn save_load_and_play_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("othello_weights_custom.txt");
    let net = small_net();
    net.save(&path).unwrap();

    let loaded = PolicyNet::load(&path, NnConfig::default().with_hidden_size(16)).unwrap();
    let features = Board::new().features(Player::Black);
    assert_eq!(net.predict(&features).unwrap(), loaded.predict(&features).unwrap());
    assert!(load_weights(&path, &policy_net_topology(32)).is_err());

    let exported = ExportedModel::load(&path).unwrap();
    assert!(!exported.has_value_head());
    assert_eq!(exported.hidden_size(), 16);
    let (a_logits, _) = net.predict(&features).unwrap();
    let (b_logits, b_value) = exported.predict(&features).unwrap();
    for (a, b) in a_logits.iter().zip(&b_logits) {
        assert_relative_eq!(*a, *b, epsilon = 1e-5);
    }
    assert_eq!(b_value, 0.0);

    let mut rng = StdRng::seed_from_u64(1);
    let record = play_episode(&exported, &SelfPlayConfig::default(), &mut rng).unwrap();
    assert!(!record.is_empty());
}
