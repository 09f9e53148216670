use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use cvtoolkit::datasets::{export, YoloLabelsDataset};
use cvtoolkit::metrics::{BinaryMask, ConfusionCounts};

#[derive(Parser)]
#[command(name = "cvtoolkit")]
#[command(about = "Inspect YOLO label datasets and evaluate blur masks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a label folder or JSON export and apply filters
    Labels {
        /// Folder of `*.txt` label files, or a `.json` annotation export
        path: PathBuf,

        #[arg(long)]
        image_width: u32,

        #[arg(long)]
        image_height: u32,

        /// Class ids to keep (repeatable)
        #[arg(long = "class")]
        classes: Vec<u32>,

        /// Minimum box area in pixels
        #[arg(long, requires = "max_area")]
        min_area: Option<f64>,

        /// Maximum box area in pixels
        #[arg(long, requires = "min_area")]
        max_area: Option<f64>,

        /// Minimum box area as a fraction of the image area
        #[arg(long, requires = "max_percentage")]
        min_percentage: Option<f64>,

        /// Maximum box area as a fraction of the image area
        #[arg(long, requires = "min_percentage")]
        max_percentage: Option<f64>,

        #[arg(long)]
        min_confidence: Option<f32>,

        /// Write the filtered labels to a `.csv` or `.parquet` file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print every remaining detection
        #[arg(long)]
        show: bool,
    },

    /// Compare predicted blur masks against ground-truth masks
    Blur {
        /// Folder of ground-truth mask images
        truth: PathBuf,
        /// Folder of predicted mask images with matching file names
        prediction: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Labels {
            path,
            image_width,
            image_height,
            classes,
            min_area,
            max_area,
            min_percentage,
            max_percentage,
            min_confidence,
            export: export_path,
            show,
        } => {
            let mut dataset = YoloLabelsDataset::open(&path, (image_width, image_height))
                .with_context(|| format!("loading labels from {}", path.display()))?;

            if !classes.is_empty() {
                dataset.filter_by_class(classes);
            }
            if let (Some(min), Some(max)) = (min_area, max_area) {
                dataset.filter_by_size((min, max));
            }
            if let (Some(min), Some(max)) = (min_percentage, max_percentage) {
                dataset.filter_by_size_percentage((min, max));
            }
            if let Some(threshold) = min_confidence {
                dataset.filter_by_confidence(threshold)?;
            }

            let filtered = dataset.get_filtered_labels();
            log::info!(
                "{} of {} detections kept across {} images",
                filtered.total_records(),
                dataset.get_labels().total_records(),
                filtered.len()
            );
            for (class_id, count) in filtered.class_histogram() {
                println!("class {class_id}: {count}");
            }

            if show {
                let batch = export::to_record_batch(filtered)?;
                println!("{}", arrow::util::pretty::pretty_format_batches(&[batch])?);
            }
            if let Some(out) = export_path {
                export::write_file(filtered, &out)
                    .with_context(|| format!("exporting to {}", out.display()))?;
            }
        }
        Commands::Blur { truth, prediction } => {
            let counts = evaluate_mask_folders(&truth, &prediction)?;
            println!("{}", serde_json::to_string_pretty(&counts.statistics())?);
        }
    }

    Ok(())
}

fn evaluate_mask_folders(truth_dir: &Path, prediction_dir: &Path) -> Result<ConfusionCounts> {
    let mut names: Vec<_> = std::fs::read_dir(prediction_dir)
        .with_context(|| format!("reading {}", prediction_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name())
        .collect();
    names.sort();

    let mut counts = ConfusionCounts::default();
    let mut pairs = 0usize;
    for name in names {
        let truth_path = truth_dir.join(&name);
        if !truth_path.is_file() {
            log::warn!(
                "No ground truth for {}, skipping",
                Path::new(&name).display()
            );
            continue;
        }
        let truth = BinaryMask::open(&truth_path)?;
        let predicted = BinaryMask::open(&prediction_dir.join(&name))?;
        counts = counts
            .update(&truth, &predicted)
            .with_context(|| format!("comparing {}", truth_path.display()))?;
        pairs += 1;
    }

    if pairs == 0 {
        bail!(
            "No matching mask pairs between {} and {}",
            truth_dir.display(),
            prediction_dir.display()
        );
    }
    log::info!("Evaluated {pairs} mask pairs");
    Ok(counts)
}
