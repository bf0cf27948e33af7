use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};
use volta::{Profile, VoltaConfig};
use volta_charging_env::map::MapSnapshot;
use volta_core::record::{AggregateRecorder, NullRecorder};
use volta_tensorboard::TensorboardRecorder;

const MODEL_DIR: &str = "./model/dqn";
const MODEL_DIR_FINE_TUNED: &str = "./model/dqn_fine_tuned";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Initial,
    FineTune,
}

impl From<ProfileArg> for Profile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Initial => Profile::Initial,
            ProfileArg::FineTune => Profile::FineTune,
        }
    }
}

/// Train and run a DQN agent for electric-vehicle charging logistics
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train from scratch on the simulated maps
    Train {
        /// YAML configuration overriding the profile
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory the model is saved in
        #[arg(long, default_value = MODEL_DIR)]
        model_dir: String,

        /// Number of episodes
        #[arg(long)]
        episodes: Option<usize>,

        /// Learning rate overriding the configuration
        #[arg(long)]
        lr: Option<f64>,

        /// Do not write TensorBoard event files
        #[arg(long)]
        no_tensorboard: bool,
    },

    /// Fine-tune a trained model on a single map
    FineTune {
        /// Directory of the model to start from
        #[arg(long, default_value = MODEL_DIR)]
        base: PathBuf,

        /// YAML configuration overriding the profile
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory the fine-tuned model is saved in
        #[arg(long, default_value = MODEL_DIR_FINE_TUNED)]
        model_dir: String,

        /// Number of episodes
        #[arg(long)]
        episodes: Option<usize>,

        /// Learning rate overriding the configuration
        #[arg(long)]
        lr: Option<f64>,

        /// Do not write TensorBoard event files
        #[arg(long)]
        no_tensorboard: bool,
    },

    /// Evaluate a trained model greedily on the simulator
    Play {
        /// Directory of the model
        #[arg(long, default_value = MODEL_DIR)]
        model_dir: PathBuf,

        /// Number of episodes
        #[arg(long, default_value_t = 5)]
        episodes: usize,

        /// YAML configuration overriding the profile
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print one recommendation per customer of a dumped map as JSON
    Recommend {
        /// Directory of the model
        #[arg(long, default_value = MODEL_DIR)]
        model_dir: PathBuf,

        /// Map dumped by the game server
        #[arg(long)]
        map: PathBuf,

        /// Current tick of the game
        #[arg(long, default_value_t = 0)]
        tick: i64,

        /// YAML configuration the model was trained with
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the configuration of a profile as YAML
    Config {
        /// Profile
        #[arg(long, value_enum, default_value_t = ProfileArg::Initial)]
        profile: ProfileArg,

        /// Output file, stdout if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn run_training(
    config: &VoltaConfig,
    init_params: Option<&Path>,
    model_dir: &str,
    tensorboard: bool,
) -> Result<()> {
    let mut recorder: Box<dyn AggregateRecorder> = if tensorboard {
        Box::new(TensorboardRecorder::new(model_dir))
    } else {
        Box::new(NullRecorder)
    };
    let (_, rewards) = volta::train(config, init_params, recorder.as_mut())?;
    let n = rewards.len().max(1) as f32;
    info!(
        "Finished {} episodes, mean reward {:.2}",
        rewards.len(),
        rewards.iter().sum::<f32>() / n
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Train {
            config,
            model_dir,
            episodes,
            lr,
            no_tensorboard,
        } => {
            let config = Profile::Initial.resolve(config.as_deref(), &model_dir, episodes, lr)?;
            run_training(&config, None, &model_dir, !no_tensorboard)?;
        }
        Command::FineTune {
            base,
            config,
            model_dir,
            episodes,
            lr,
            no_tensorboard,
        } => {
            let config = Profile::FineTune.resolve(config.as_deref(), &model_dir, episodes, lr)?;
            run_training(&config, Some(&base), &model_dir, !no_tensorboard)?;
        }
        Command::Play {
            model_dir,
            episodes,
            config,
        } => {
            let config = Profile::Initial.resolve(config.as_deref(), MODEL_DIR, None, None)?;
            let record = volta::play(&config, &model_dir, episodes)?;
            info!(
                "Mean return over {} episodes: {:.2}",
                episodes,
                record.get_scalar("episode_return")?
            );
        }
        Command::Recommend {
            model_dir,
            map,
            tick,
            config,
        } => {
            let config = Profile::Initial.resolve(config.as_deref(), MODEL_DIR, None, None)?;
            let map = MapSnapshot::load(&map)?;
            for rec in volta::recommend(&config, &model_dir, &map, tick)? {
                println!("{}", serde_json::to_string(&rec)?);
            }
        }
        Command::Config { profile, out } => {
            let config = Profile::from(profile).config(MODEL_DIR);
            match out {
                Some(path) => config.save(path)?,
                None => print!("{}", serde_yaml::to_string(&config)?),
            }
        }
    }

    Ok(())
}
