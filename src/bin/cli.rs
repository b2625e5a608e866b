//! CLI application for swapping the faces of two images.
//!
//! Usage:
//!   face-swap a.jpg b.jpg --landmarks-a a.json --landmarks-b b.json -o both.png
//!   face-swap a.jpg b.jpg --landmarks-a a.json --landmarks-b b.json --output-a a2.png --json
//!   RUST_LOG=debug face-swap ...            # stage trace

use clap::Parser;
use face_swap::{
    load_options, CloneMode, DirectionReport, FaceSwapper, PointSet, SwapOptions, SwapReport,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "face-swap")]
#[command(author, version, about = "Swap the faces of two images", long_about = None)]
struct Args {
    /// First image
    #[arg(required = true)]
    image_a: PathBuf,

    /// Second image
    #[arg(required = true)]
    image_b: PathBuf,

    /// 68-point landmarks of the face in the first image (JSON)
    #[arg(long)]
    landmarks_a: PathBuf,

    /// 68-point landmarks of the face in the second image (JSON)
    #[arg(long)]
    landmarks_b: PathBuf,

    /// Write both results side by side
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the first image with the second face
    #[arg(long)]
    output_a: Option<PathBuf>,

    /// Write the second image with the first face
    #[arg(long)]
    output_b: Option<PathBuf>,

    /// Options file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seamless clone mode: normal or mixed
    #[arg(long)]
    mode: Option<CloneMode>,

    /// Paste the warped face without matching its color
    #[arg(long)]
    no_color_correction: bool,

    /// Print the report as JSON
    #[arg(short, long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    image_a: String,
    image_b: String,
    options: &'a SwapOptions,
    report: &'a SwapReport,
    written: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = match &args.config {
        Some(path) => load_options(path)?,
        None => SwapOptions::default(),
    };
    if let Some(mode) = args.mode {
        options.clone_mode = mode;
    }
    if args.no_color_correction {
        options.color_correction = false;
    }

    log::info!("loading {:?} and {:?}", args.image_a, args.image_b);
    let image_a = image::open(&args.image_a)?.to_rgb8();
    let image_b = image::open(&args.image_b)?.to_rgb8();
    let landmarks_a = PointSet::load_json(&args.landmarks_a)?;
    let landmarks_b = PointSet::load_json(&args.landmarks_b)?;

    let result = FaceSwapper::new(options).swap(
        &image_a,
        Some(&landmarks_a),
        &image_b,
        Some(&landmarks_b),
    )?;

    let mut written = Vec::new();
    if let Some(ref path) = args.output {
        result.side_by_side().save(path)?;
        written.push(path.display().to_string());
    }
    if let Some(ref path) = args.output_a {
        result.image_a.save(path)?;
        written.push(path.display().to_string());
    }
    if let Some(ref path) = args.output_b {
        result.image_b.save(path)?;
        written.push(path.display().to_string());
    }
    if written.is_empty() {
        log::warn!("no output path given; pass -o, --output-a or --output-b to save the result");
    }

    let output = Output {
        image_a: args.image_a.display().to_string(),
        image_b: args.image_b.display().to_string(),
        options: &options,
        report: &result.report,
        written,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_human_readable(&output));
    }

    Ok(())
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();

    s.push_str(&format!("Images: {} <-> {}\n", output.image_a, output.image_b));
    s.push_str(&format!(
        "Clone mode: {:?}, color correction: {}\n",
        output.options.clone_mode,
        if output.options.color_correction { "on" } else { "off" }
    ));

    for report in [&output.report.into_a, &output.report.into_b] {
        format_direction(&mut s, report);
    }

    if !output.written.is_empty() {
        s.push_str("\nWritten:\n");
        for path in &output.written {
            s.push_str(&format!("  {}\n", path));
        }
    }

    s
}

fn format_direction(s: &mut String, report: &DirectionReport) {
    let t = &report.transform;
    let shift = t.translation();

    s.push_str(&format!("\n--- {} ---\n", report.direction));
    s.push_str(&format!(
        "Transform: scale {:.4}, rotation {:.2} deg, shift ({:.1}, {:.1})\n",
        t.scale(),
        t.rotation().to_degrees(),
        shift.x,
        shift.y
    ));
    if let Some(rms) = report.alignment_rms {
        s.push_str(&format!("Alignment RMS: {:.2} px\n", rms));
    }
    match report.blur_kernel {
        Some(k) => s.push_str(&format!("Color blur: {} px kernel\n", k)),
        None => s.push_str("Color blur: off\n"),
    }
    s.push_str(&format!(
        "Face mask: {} px (hull {:.0} px)\n",
        report.mask_area, report.hull_area
    ));
    s.push_str(&format!(
        "Poisson solve: {} unknowns, {} iterations, residual {:.1e}\n",
        report.clone.unknowns, report.clone.iterations, report.clone.residual
    ));
}
