use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

use glyph_trainer::{
    bitmap::DEFAULT_GRID, persist, train::load_config, BinaryImage, Encoding, OcrNetwork,
    Segmentation, TrainConfig,
};

/// Train and run a glyph recognizer stored in a `.json` or `.zip` file.
#[derive(Parser, Debug)]
#[command(name = "glyph-trainer", version)]
struct Cli {
    /// Log level: off, error, warn, info, debug or trace
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new, initialized recognizer
    New {
        file: PathBuf,
        /// Comma-separated class labels
        #[arg(long, value_delimiter = ',')]
        classes: Vec<String>,
        /// Target encoding: one_hot or binary
        #[arg(long, default_value = "one_hot")]
        encoding: String,
        /// Hidden layer sizes, input side first
        #[arg(long, value_delimiter = ',')]
        hidden: Vec<usize>,
        /// Feature grid as COLUMNSxROWS
        #[arg(long, value_parser = parse_grid)]
        grid: Option<(u32, u32)>,
    },
    /// Add sample images to a class
    AddSample {
        file: PathBuf,
        class: String,
        images: Vec<PathBuf>,
        /// Create the class if it does not exist yet
        #[arg(long)]
        create: bool,
        /// Luminance below which a pixel counts as ink
        #[arg(long, default_value_t = glyph_trainer::bitmap::DEFAULT_THRESHOLD)]
        threshold: u8,
    },
    /// Train on the stored samples and write the weights back
    Train {
        file: PathBuf,
        /// JSON training configuration
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        learning_rate: Option<f64>,
        #[arg(long)]
        momentum: Option<f64>,
        #[arg(long)]
        cycles: Option<usize>,
        /// Keep the current weights instead of drawing new ones
        #[arg(long)]
        keep_weights: bool,
    },
    /// Read the glyphs in an image
    Recognize {
        file: PathBuf,
        image: PathBuf,
        /// Glyph segmentation: whole, columns, rows or connected
        #[arg(long, default_value = "columns")]
        segmentation: String,
        #[arg(long, default_value_t = 0.5)]
        max_distance: f64,
        #[arg(long, default_value_t = glyph_trainer::bitmap::DEFAULT_THRESHOLD)]
        threshold: u8,
        /// Denoise rows and columns with this run threshold first
        #[arg(long)]
        denoise: Option<u32>,
    },
    /// Describe a stored recognizer
    Info { file: PathBuf },
}

fn parse_grid(s: &str) -> Result<(u32, u32), String> {
    let (columns, rows) = s.split_once('x').ok_or_else(|| format!("expected COLUMNSxROWS, got {s:?}"))?;
    let columns = columns.parse::<u32>().map_err(|e| e.to_string())?;
    let rows = rows.parse::<u32>().map_err(|e| e.to_string())?;
    if columns == 0 || rows == 0 {
        return Err("grid dimensions must be positive".to_owned());
    }
    Ok((columns, rows))
}

fn init_log(level: LevelFilter) -> anyhow::Result<()> {
    let stderr = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{h({l})} {M}] {m}{n}")))
        .build();
    let appender = Appender::builder().build("stderr", Box::new(stderr));
    let config = Config::builder()
        .appender(appender)
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn open(file: &Path) -> anyhow::Result<OcrNetwork> {
    persist::open(file).with_context(|| format!("cannot open recognizer {}", file.display()))
}

fn save(ocr: &OcrNetwork, file: &Path) -> anyhow::Result<()> {
    persist::save(ocr, file).with_context(|| format!("cannot save recognizer {}", file.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level: LevelFilter = cli.log_level.parse()
        .map_err(|_| anyhow::anyhow!("unknown log level {:?}", cli.log_level))?;
    init_log(level)?;

    match cli.command {
        Command::New { file, classes, encoding, hidden, grid } => {
            let encoding: Encoding = encoding.parse()?;
            let mut ocr = OcrNetwork::with_classes(encoding, classes);
            for size in hidden {
                ocr.network_mut().add_layer(size);
            }
            ocr.initialize(grid.unwrap_or(DEFAULT_GRID));
            save(&ocr, &file)?;
            println!("{}", ocr.network());
        }
        Command::AddSample { file, class, images, create, threshold } => {
            let mut ocr = open(&file)?;
            if create && ocr.add_class(class.as_str()) {
                log::warn!("added class {class:?}, the network must be retrained");
            }
            for path in &images {
                let image = BinaryImage::open(path, threshold)
                    .with_context(|| format!("cannot read sample {}", path.display()))?;
                ocr.add_sample(&class, image)?;
            }
            save(&ocr, &file)?;
            println!("{class}: {} samples", ocr.samples().len(&class));
        }
        Command::Train { file, config, learning_rate, momentum, cycles, keep_weights } => {
            let mut ocr = open(&file)?;
            let mut config = match config {
                Some(path) => load_config(&path)
                    .with_context(|| format!("cannot load config {}", path.display()))?,
                None => TrainConfig::default(),
            };
            config.learning_rate = learning_rate.unwrap_or(config.learning_rate);
            config.momentum = momentum.unwrap_or(config.momentum);
            config.max_cycles = cycles.unwrap_or(config.max_cycles);
            if keep_weights {
                config.reinitialize = false;
            }

            if ocr.samples().is_empty() {
                bail!("{} has no samples to train on", file.display());
            }
            let history = ocr.train(&config)?;
            for stats in &history {
                match stats.validation_error {
                    Some(validation) => println!(
                        "cycle {:>4}  train {:.6}  validation {:.6}  ({} ms)",
                        stats.cycle, stats.train_error, validation, stats.elapsed_ms
                    ),
                    None => println!(
                        "cycle {:>4}  train {:.6}  ({} ms)",
                        stats.cycle, stats.train_error, stats.elapsed_ms
                    ),
                }
            }
            save(&ocr, &file)?;
        }
        Command::Recognize { file, image, segmentation, max_distance, threshold, denoise } => {
            let ocr = open(&file)?;
            let segmentation: Segmentation = segmentation.parse().map_err(anyhow::Error::msg)?;
            let mut image = BinaryImage::open(&image, threshold)
                .with_context(|| format!("cannot read image {}", image.display()))?;
            if let Some(run) = denoise {
                image.denoise(run);
            }
            for reading in ocr.recognize_string(&image, segmentation, max_distance)? {
                println!("{reading}");
            }
        }
        Command::Info { file } => {
            let ocr = open(&file)?;
            let (columns, rows) = ocr.grid();
            println!("{}", ocr.network());
            println!("state:    {:?}", ocr.network().state());
            println!("encoding: {}", ocr.network().encoding());
            println!("grid:     {columns}x{rows}");
            for class in ocr.classes() {
                println!("  {class:?}: {} samples", ocr.samples().len(class));
            }
        }
    }
    Ok(())
}
