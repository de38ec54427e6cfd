//! Train an Othello actor-critic by self-play, or check an existing weight file
//!
//! Usage: cargo run --release --bin reversi-train -- --episodes 1000
//!
//! With `--supervised` a policy-only network is fitted to greedy games instead.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tch::{Cuda, Device};

use reversi_core::Player;
use reversi_nn::{
    actor_critic_topology, policy_net_topology, ActorCriticNet, ExportedModel, NnConfig,
    PolicyNet,
};
use reversi_selfplay::{
    generate_greedy_samples, play_episode, SelfPlayConfig, Trainer, TrainerConfig,
};
use reversi_weights::load_weights;

const ACTOR_CRITIC_WEIGHTS: &str = "othello_actor_critic_weights_custom.txt";
const POLICY_WEIGHTS: &str = "othello_weights_custom.txt";

#[derive(Parser, Debug)]
#[command(name = "reversi-train")]
#[command(about = "Self-play actor-critic training for Othello", long_about = None)]
struct Args {
    /// Weight file to load, or to write after training
    /// (defaults to othello_actor_critic_weights_custom.txt, or
    /// othello_weights_custom.txt with --supervised)
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Fit a policy-only network to greedy games instead of self-play
    #[arg(long)]
    supervised: bool,

    /// Greedy games to generate in supervised mode
    #[arg(long, default_value_t = 100)]
    games: usize,

    /// Training epochs in supervised mode
    #[arg(long, default_value_t = 1000)]
    epochs: usize,

    /// Mini-batch size in supervised mode
    #[arg(long, default_value_t = 64)]
    batch_size: usize,

    /// Number of self-play episodes
    #[arg(long, default_value_t = 50_000)]
    episodes: u32,

    /// Width of the shared hidden layer
    #[arg(long, default_value_t = 128)]
    hidden_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Step cap per episode
    #[arg(long, default_value_t = 60)]
    max_steps: usize,

    /// Log progress every N episodes
    #[arg(long, default_value_t = 100)]
    log_interval: u32,

    /// Seed for move sampling and parameter initialisation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Train on CUDA when available
    #[arg(long)]
    cuda: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let selfplay = SelfPlayConfig::default().with_max_steps(args.max_steps);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let weights = args.weights.clone().unwrap_or_else(|| {
        PathBuf::from(if args.supervised {
            POLICY_WEIGHTS
        } else {
            ACTOR_CRITIC_WEIGHTS
        })
    });

    if weights.exists() {
        info!(
            "Found existing weights at {}, skipping training",
            weights.display()
        );
        return check_weights(&weights, &args, &selfplay, &mut rng);
    }

    let device = if args.cuda {
        info!(
            "CUDA available: {}, device count: {}",
            Cuda::is_available(),
            Cuda::device_count()
        );
        Device::cuda_if_available()
    } else {
        Device::Cpu
    };
    info!("Using device: {device:?}");
    tch::manual_seed(args.seed as i64);

    let nn_config = NnConfig::default()
        .with_hidden_size(args.hidden_size)
        .with_learning_rate(args.learning_rate)
        .with_device(device);

    if args.supervised {
        return train_supervised(&weights, &args, nn_config, &selfplay, &mut rng);
    }

    let mut net = ActorCriticNet::new(nn_config)?;

    let trainer = Trainer::new(
        selfplay,
        TrainerConfig::default()
            .with_episodes(args.episodes)
            .with_log_interval(args.log_interval),
    );
    let stats = trainer.run(&mut net, &mut rng).context("Training failed")?;
    if stats.fallbacks > 0 {
        warn!(
            "{} moves fell back to the first legal move during training",
            stats.fallbacks
        );
    }

    net.save(&weights)?;
    info!("Training complete");
    Ok(())
}

/// Fit a policy net to greedy-vs-greedy games and save it
fn train_supervised(
    path: &Path,
    args: &Args,
    nn_config: NnConfig,
    selfplay: &SelfPlayConfig,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let samples = generate_greedy_samples(args.games, selfplay, rng)
        .context("Failed to generate greedy games")?;
    anyhow::ensure!(!samples.is_empty(), "Greedy games produced no samples");

    let mut net = PolicyNet::new(nn_config)?;
    let loss = net
        .fit(&samples, args.epochs, args.batch_size, rng)
        .context("Training failed")?;
    info!("Final loss: {loss:.4}");

    net.save(path)?;
    info!("Training complete");
    Ok(())
}

/// Validate a weight file and play one sample episode with it
fn check_weights(
    path: &Path,
    args: &Args,
    selfplay: &SelfPlayConfig,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let topology = if args.supervised {
        policy_net_topology(args.hidden_size)
    } else {
        actor_critic_topology(args.hidden_size)
    };
    let tensors = load_weights(path, &topology)
        .with_context(|| format!("Failed to load weights from {}", path.display()))?;
    for tensor in &tensors {
        info!("  {}: {:?}", tensor.name, tensor.shape());
    }

    let model = ExportedModel::from_tensors(&tensors)?;
    let record = play_episode(&model, selfplay, rng)?;
    info!(
        "Sample episode: {} moves, {} passes, result {:?}, final count black {} / white {}",
        record.len(),
        record.passes,
        record.result,
        record.final_board.count(Player::Black),
        record.final_board.count(Player::White),
    );
    if record.fallback_count() > 0 {
        warn!("{} moves used the fallback policy", record.fallback_count());
    }
    Ok(())
}
