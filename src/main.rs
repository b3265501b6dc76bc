use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dupix::config::Config;
use dupix::core::duplicate::{find_duplicates, validate_threshold};
use dupix::core::extractor::{Algorithm, Extractor, PerceptualExtractor};
use dupix::core::fingerprint::Fingerprint;
use dupix::core::scanner::{Discovery, Scanner};
use dupix::core::store::{
    build_store_par_with_progress, build_store_with_progress, DirectorySource,
};
use dupix::report::Report;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "dupix", version, about = "Find near-duplicate images by perceptual hash")]
struct Cli {
    /// Config file (default: `<config dir>/dupix/config.json`)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find and list near-duplicate image pairs
    Scan {
        /// Directory to scan
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,
        /// Maximum Hamming distance for a pair to count as duplicate
        #[arg(short, long, allow_negative_numbers = true)]
        threshold: Option<i64>,
        /// Perceptual hash algorithm
        #[arg(long, value_enum)]
        algorithm: Option<Algorithm>,
        /// Hash grid side length, at least 1 (fingerprint is about size² bits)
        #[arg(long)]
        hash_size: Option<u32>,
        /// Only look at files directly inside `DIR`
        #[arg(long)]
        no_recursive: bool,
        /// Hash images one at a time
        #[arg(long)]
        sequential: bool,
        /// List closest pairs first
        #[arg(long)]
        sort_by_distance: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the fingerprints of two images and their distance
    Compare {
        image_a: PathBuf,
        image_b: PathBuf,
        #[arg(long, value_enum)]
        algorithm: Option<Algorithm>,
        #[arg(long)]
        hash_size: Option<u32>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            path,
            threshold,
            algorithm,
            hash_size,
            no_recursive,
            sequential,
            sort_by_distance,
            json,
        } => {
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            if let Some(algorithm) = algorithm {
                config.algorithm = algorithm;
            }
            if let Some(hash_size) = hash_size {
                config.hash_size = hash_size;
            }
            if no_recursive {
                config.recursive = false;
            }
            if sequential {
                config.parallel = false;
            }

            let mut report = scan(&path, &config, json)?;
            if sort_by_distance {
                report.sort_by_distance();
            }

            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report.render_text());
            }
        }

        Commands::Compare {
            image_a,
            image_b,
            algorithm,
            hash_size,
        } => {
            let extractor = PerceptualExtractor::new(
                algorithm.unwrap_or(config.algorithm),
                hash_size.unwrap_or(config.hash_size),
            )?;
            let a = fingerprint_file(&extractor, &image_a)?;
            let b = fingerprint_file(&extractor, &image_b)?;
            let distance = a.distance(&b);

            println!("{}: {}", image_a.display(), a);
            println!("{}: {}", image_b.display(), b);
            println!("distance: {} of {} bits", distance, a.padded_bits());
            println!(
                "duplicate at threshold {}: {}",
                config.threshold,
                i64::from(distance) <= config.threshold
            );
        }
    }

    Ok(())
}

/// Discover, fingerprint and compare the images under `root`.
fn scan(root: &Path, config: &Config, quiet: bool) -> Result<Report> {
    validate_threshold(config.threshold)?;
    let extractor = PerceptualExtractor::new(config.algorithm, config.hash_size)?;

    let status = |msg: String| {
        if !quiet {
            println!("{}", msg);
        }
    };

    status(format!("▶ Scanning for duplicates in: {}", root.display()));
    let Discovery { images, rejected } = discover(root, config)?;
    let images_found = images.len() + rejected.len();

    let source = DirectorySource::new(root);
    info!(
        "Hashing {} image(s) with {:?}, hash size {}",
        images_found,
        extractor.algorithm(),
        extractor.hash_size()
    );

    let bar = ProgressBar::new(images.len() as u64);
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}",
    )?);

    let (store, extract_errors) = benchmark("hashing all images", quiet, || {
        if config.parallel {
            status(format!("▶ Parallel hashing {} images…", images.len()));
            build_store_par_with_progress(images, &source, &extractor, |id| {
                bar.set_message(id.to_string());
                bar.inc(1);
            })
        } else {
            status(format!("▶ Hashing {} images…", images.len()));
            build_store_with_progress(images, &source, &extractor, |id| {
                bar.set_message(id.to_string());
                bar.inc(1);
            })
        }
    });
    bar.finish_and_clear();

    let mut errors = rejected;
    errors.extend(extract_errors);

    let duplicates = benchmark("comparing fingerprints", quiet, || {
        find_duplicates(&store, config.threshold)
    })?;

    Ok(Report::new(
        root.to_string_lossy(),
        config.threshold,
        images_found,
        store.len(),
        duplicates,
        errors,
    ))
}

fn discover(root: &Path, config: &Config) -> Result<Discovery> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Scanning for images…");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let images = Scanner::new(config.extensions.as_slice(), config.recursive)
        .scan(root)
        .with_context(|| format!("Failed to scan {:?}", root))?;

    spinner.finish_and_clear();
    Ok(images)
}

fn fingerprint_file(extractor: &PerceptualExtractor, path: &Path) -> Result<Fingerprint> {
    let bytes = fs::read(path).with_context(|| format!("Failed to open {:?}", path))?;
    extractor
        .extract(&bytes)
        .with_context(|| format!("Failed to fingerprint {:?}", path))
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, quiet: bool, f: F) -> T {
    let start = Instant::now();
    let result = f();
    if quiet {
        info!("{} took {:.2?}", label, start.elapsed());
    } else {
        println!("⏱ {} took {:.2?}", label, start.elapsed());
    }
    result
}
