//! Consensus gate CLI
//!
//! Inspect checkpoints, check block hashes against them, verify proof of
//! work and compute retarget difficulties from recorded chain history.

use clap::{Parser, Subcommand};
use consensus_gate::checkpoints::{Checkpoints, StaticTxtRecords, TxtResolver};
use consensus_gate::consensus::{
    validate_pow, DifficultyAlgorithm, DifficultySample, RetargetSchedule,
};
use consensus_gate::constants::DIFFICULTY_TARGET_V2;
use consensus_gate::crypto::{hash_bytes, Hash};
use consensus_gate::network::NetworkType;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "consensus-gate", version, about = "Checkpoint and difficulty consensus checks")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(clap::Args, Debug)]
struct CheckpointSource {
    /// Network profile (mainnet, testnet, stagenet, devnet)
    #[arg(long, default_value_t = NetworkType::Mainnet)]
    network: NetworkType,

    /// JSON checkpoint file merged over the hard-coded table
    #[arg(long)]
    checkpoints: Option<PathBuf>,

    /// File of "<height>:<hash>" TXT records fetched out of band
    #[arg(long = "txt-records")]
    txt_records: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load checkpoints and print a summary
    Checkpoints {
        #[command(flatten)]
        source: CheckpointSource,

        /// Write the merged set back out as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Check a block hash against the checkpoints
    CheckBlock {
        #[command(flatten)]
        source: CheckpointSource,

        /// Block height
        #[arg(long)]
        height: u64,

        /// Block hash (hex)
        #[arg(long)]
        hash: Hash,

        /// Current main chain height, to evaluate the block as an alternative
        #[arg(long = "chain-height")]
        chain_height: Option<u64>,
    },

    /// Check a hash against a difficulty
    CheckHash {
        /// PoW hash (hex)
        #[arg(long, conflicts_with = "data", required_unless_present = "data")]
        hash: Option<Hash>,

        /// Hash raw data with BLAKE3 instead. Self-test only: BLAKE3 is not
        /// the chain's proof-of-work hash, so the verdict says nothing about
        /// a real block.
        #[arg(long)]
        data: Option<String>,

        #[arg(long)]
        difficulty: u64,
    },

    /// Compute the next difficulty from a JSON list of samples
    Difficulty {
        /// v2, v3 or v4, used when no activations are given
        #[arg(long, default_value_t = DifficultyAlgorithm::V2)]
        algorithm: DifficultyAlgorithm,

        /// Retarget rule activation as "<height>:<algorithm>", repeatable
        #[arg(long = "activation", value_parser = parse_activation)]
        activations: Vec<(u64, DifficultyAlgorithm)>,

        /// Height of the block being retargeted
        #[arg(long, default_value_t = 0)]
        height: u64,

        /// JSON array of {"timestamp", "cumulative_difficulty"}, oldest first
        #[arg(long)]
        samples: PathBuf,

        #[arg(long = "target-seconds", default_value_t = DIFFICULTY_TARGET_V2)]
        target_seconds: u64,
    },
}

fn parse_activation(s: &str) -> Result<(u64, DifficultyAlgorithm), String> {
    let (height, algorithm) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <height>:<algorithm>, got {}", s))?;
    let height = height
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid activation height {}: {}", height, e))?;
    Ok((height, algorithm.trim().parse()?))
}

fn load_checkpoints(source: &CheckpointSource) -> Result<Checkpoints, Box<dyn std::error::Error>> {
    let mut checkpoints = Checkpoints::for_network(source.network)?;
    let resolver = match &source.txt_records {
        Some(path) => Some(StaticTxtRecords::from_file(path)?),
        None => None,
    };
    let resolver = resolver.as_ref().map(|r| r as &dyn TxtResolver);
    match &source.checkpoints {
        Some(path) => checkpoints.load_new_checkpoints(path, source.network, resolver)?,
        None => {
            if let Some(resolver) = resolver {
                checkpoints.load_checkpoints_from_dns(source.network, resolver)?;
            }
        }
    }
    info!(network = %source.network, count = checkpoints.len(), "checkpoints loaded");
    Ok(checkpoints)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Checkpoints { source, save } => {
            let checkpoints = load_checkpoints(&source)?;
            println!("Network:     {}", source.network);
            println!("Checkpoints: {}", checkpoints.len());
            match checkpoints.max_height() {
                Some(height) => println!("Max height:  {}", height),
                None => println!("Max height:  (none)"),
            }
            if let Some(path) = save {
                checkpoints.save_checkpoints_to_json(&path)?;
                println!("Saved to {}", path.display());
            }
        }
        Commands::CheckBlock {
            source,
            height,
            hash,
            chain_height,
        } => {
            let checkpoints = load_checkpoints(&source)?;
            let status = checkpoints.check_block(height, &hash);
            println!("Checkpoint:  {}", status.is_checkpoint());
            println!("Accepted:    {}", status.is_accepted());
            if let Some(chain_height) = chain_height {
                println!(
                    "Alternative: {}",
                    checkpoints.is_alternative_block_allowed(chain_height, height)
                );
            }
        }
        Commands::CheckHash {
            hash,
            data,
            difficulty,
        } => {
            let hash = match (hash, data) {
                (Some(hash), _) => hash,
                (None, Some(data)) => hash_bytes(data.as_bytes()),
                (None, None) => return Err("either --hash or --data is required".into()),
            };
            println!("Hash:        {}", hash);
            println!("Difficulty:  {}", difficulty);
            println!("Valid PoW:   {}", validate_pow(&hash, difficulty).is_ok());
        }
        Commands::Difficulty {
            algorithm,
            activations,
            height,
            samples,
            target_seconds,
        } => {
            let schedule = if activations.is_empty() {
                RetargetSchedule::fixed(algorithm)
            } else {
                RetargetSchedule::new(activations)?
            };
            let algorithm = schedule.algorithm_at(height);

            let contents = std::fs::read_to_string(&samples)?;
            let samples: Vec<DifficultySample> = serde_json::from_str(&contents)?;
            let next = schedule.next_difficulty_from_samples(height, &samples, target_seconds)?;
            println!("Height:      {}", height);
            println!("Algorithm:   {}", algorithm);
            println!(
                "Samples:     {}/{}",
                samples.len().min(algorithm.blocks_count()),
                algorithm.blocks_count()
            );
            println!("Next:        {}", next);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activation() {
        assert_eq!(parse_activation("0:v2"), Ok((0, DifficultyAlgorithm::V2)));
        assert_eq!(parse_activation(" 1200 : lwma4"), Ok((1200, DifficultyAlgorithm::V4)));
        assert!(parse_activation("v3").is_err());
        assert!(parse_activation("x:v3").is_err());
        assert!(parse_activation("10:v9").is_err());
    }

    #[test]
    fn test_difficulty_command_parses_schedule() {
        let cli = Cli::try_parse_from([
            "consensus-gate",
            "difficulty",
            "--samples",
            "s.json",
            "--activation",
            "0:v2",
            "--activation",
            "500:v4",
            "--height",
            "600",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Difficulty {
                activations,
                height,
                ..
            } => {
                let schedule = RetargetSchedule::new(activations).unwrap();
                assert_eq!(schedule.algorithm_at(height), DifficultyAlgorithm::V4);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_data_flag_is_labelled_self_test() {
        use clap::CommandFactory;
        let cmd = Cli::command();
        let check_hash = cmd.find_subcommand("check-hash").unwrap();
        let data = check_hash
            .get_arguments()
            .find(|arg| arg.get_id() == "data")
            .unwrap();
        let help = data.get_long_help().or(data.get_help()).unwrap().to_string();
        assert!(help.contains("not the chain's proof-of-work hash"), "{}", help);
    }
}
