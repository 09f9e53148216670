use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Write a synthetic YOLO label folder for experiments.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output folder, created if missing
    #[arg(default_value = "sample_labels")]
    output: PathBuf,

    #[arg(long, default_value_t = 20)]
    images: usize,

    #[arg(long, default_value_t = 5)]
    classes: u32,

    #[arg(long, default_value_t = 12)]
    max_detections: usize,

    /// Append a confidence column, like a prediction export
    #[arg(long)]
    with_confidence: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Normalized box that stays inside the image.
fn random_box(rng: &mut StdRng) -> (f32, f32, f32, f32) {
    // Mostly small objects with a long tail of large ones.
    let scale: f32 = rng.gen::<f32>().powi(3);
    let width = (0.01 + 0.6 * scale * rng.gen_range(0.5..1.5f32)).min(0.95);
    let height = (0.01 + 0.6 * scale * rng.gen_range(0.5..1.5f32)).min(0.95);
    let x_center = rng.gen_range(width / 2.0..=1.0 - width / 2.0);
    let y_center = rng.gen_range(height / 2.0..=1.0 - height / 2.0);
    (x_center, y_center, width, height)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    let mut total = 0usize;
    for image in 0..args.images {
        // Some images carry no objects, which leaves an empty label file.
        let count = rng.gen_range(0..=args.max_detections);
        let mut content = String::new();
        for _ in 0..count {
            let class_id = rng.gen_range(0..args.classes.max(1));
            let (xc, yc, w, h) = random_box(&mut rng);
            write!(content, "{class_id} {xc:.6} {yc:.6} {w:.6} {h:.6}")?;
            if args.with_confidence {
                write!(content, " {:.4}", rng.gen_range(0.05..1.0f32))?;
            }
            content.push('\n');
        }

        let path = args.output.join(format!("frame_{image:05}.txt"));
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        total += count;
    }

    println!(
        "Wrote {total} detections for {} images to {}",
        args.images,
        args.output.display()
    );
    Ok(())
}
