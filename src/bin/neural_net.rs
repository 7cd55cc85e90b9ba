use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{Args as ArgsTrait, Parser, Subcommand, ValueEnum};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format;

use bpnnet::feedforward::{Hyperparameters, Net, Pass, RunOutcome, Sample};
use bpnnet::training_data::{self, TrainingData};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trains a network on a training data file, one example at a time.
    Train(TrainConfig),
    /// Writes a training data file for a two-input logic gate.
    Generate(GenerateConfig),
}

#[derive(ArgsTrait, Clone, Debug)]
struct TrainConfig {
    /// Training data file. The first line holds the topology, e.g. `topology: 2 4 1`,
    /// followed by pairs of `in: ...` and `out: ...` lines.
    #[arg(verbatim_doc_comment)]
    file: PathBuf,

    /// Overall net training rate (eta).
    #[arg(long, default_value_t = Hyperparameters::default().learning_rate)]
    learning_rate: f64,

    /// Multiplier of the last weight change (alpha).
    #[arg(long, default_value_t = Hyperparameters::default().momentum)]
    momentum: f64,

    /// Number of training samples the recent average error is averaged over.
    #[arg(long, default_value_t = Hyperparameters::default().error_smoothing)]
    smoothing: f64,

    /// Seed of the initial weights. Random if not given.
    #[arg(long)]
    seed: Option<u64>,

    /// Only report the final error instead of every pass.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(ArgsTrait, Clone, Debug)]
struct GenerateConfig {
    /// The logic gate to learn.
    #[arg(long, value_enum, default_value_t = Gate::Xor)]
    gate: Gate,

    /// Number of examples to write.
    #[arg(long, default_value_t = 2000)]
    samples: usize,

    /// Seed of the example inputs. Random if not given.
    #[arg(long)]
    seed: Option<u64>,

    /// File to write to. Standard output if not given.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Gate {
    And,
    Or,
    Xor,
}

impl Gate {
    fn apply(self, a: bool, b: bool) -> bool {
        match self {
            Gate::And => a && b,
            Gate::Or => a || b,
            Gate::Xor => a != b,
        }
    }
}

fn main() {
    let args = Args::parse();

    set_default_logging();

    let event_format = format().with_target(false).without_time();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .event_format(event_format)
        .with_writer(io::stderr)
        .init();

    let result = match args.command {
        Command::Train(config) => run_training(config),
        Command::Generate(config) => run_generate(config),
    };

    if let Err(err) = result {
        error!("{}", err);
        process::exit(1);
    }
}

fn set_default_logging() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
}

fn run_training(config: TrainConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = TrainingData::open(&config.file)?;

    // Without a topology there is nothing to build
    let topology = data.topology()?;

    let hyperparameters = Hyperparameters::default()
        .with_learning_rate(config.learning_rate)
        .with_momentum(config.momentum)
        .with_error_smoothing(config.smoothing);

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(?topology, seed, "building net");
    let mut trainer = Net::seeded(&topology, hyperparameters, seed)?.build_trainer();

    // A malformed line ends the run, like an example with the wrong amount of inputs
    let samples = data.by_ref().map_while(|sample| match sample {
        Ok(sample) => Some(sample),
        Err(err) => {
            warn!("{}", err);
            None
        }
    });

    let quiet = config.quiet;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut report_error = None;

    let summary = trainer.run(samples, |sample, pass| {
        if quiet || report_error.is_some() {
            return;
        }
        if let Err(err) = report_pass(&mut out, sample, pass) {
            report_error = Some(err);
        }
    })?;

    if let Some(err) = report_error {
        return Err(err.into());
    }

    if let RunOutcome::Abandoned { pass, mismatch } = summary.outcome {
        writeln!(out, "\nPass {}: {}", pass, mismatch)?;
    }
    writeln!(
        out,
        "\nNet recent average error: {}\nDone",
        summary.recent_average_error
    )?;
    Ok(())
}

fn report_pass<W: Write>(out: &mut W, sample: &Sample, pass: &Pass) -> io::Result<()> {
    writeln!(out)?;
    write!(out, "Pass {}", pass.number)?;
    show_vector_vals(out, ": Inputs:", &sample.inputs)?;
    show_vector_vals(out, "Outputs:", &pass.outputs)?;
    show_vector_vals(out, "Targets:", &sample.targets)?;
    writeln!(
        out,
        "Net recent average error: {}",
        pass.recent_average_error
    )
}

fn show_vector_vals<W: Write>(out: &mut W, label: &str, values: &[f64]) -> io::Result<()> {
    write!(out, "{}", label)?;
    for v in values {
        write!(out, " {}", v)?;
    }
    writeln!(out)
}

fn run_generate(config: GenerateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut writer: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    training_data::write_topology(&mut writer, &[2, 4, 1])?;
    for _ in 0..config.samples {
        let (a, b): (bool, bool) = (rng.gen(), rng.gen());
        let target = config.gate.apply(a, b);
        let sample = Sample {
            inputs: vec![f64::from(u8::from(a)), f64::from(u8::from(b))],
            targets: vec![f64::from(u8::from(target))],
        };
        training_data::write_sample(&mut writer, &sample)?;
    }
    writer.flush()?;

    info!(gate = ?config.gate, samples = config.samples, seed, "wrote training data");
    Ok(())
}
