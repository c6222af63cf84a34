//! retex CLI - Command-line tool for decoding DDS and TGA images.
//!
//! This is the main entry point for the retex command-line application.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use retex::prelude::*;

/// retex - DDS and TGA image decoder
#[derive(Parser)]
#[command(name = "retex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show image format, dimensions and header details
    Info {
        /// Input DDS or TGA file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Decode an image and write it as PNG
    Convert {
        /// Input DDS or TGA file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Keep DDS pixels in partial edge blocks instead of cropping to a multiple of 4
        #[arg(long)]
        keep_edges: bool,
    },

    /// Validate a TGA header, optionally repairing stray color map fields
    TgaCheck {
        /// Input TGA file
        #[arg(short, long)]
        input: PathBuf,

        /// Rewrite the header in place if it needs repair
        #[arg(long)]
        fix: bool,
    },

    /// Convert every image under a directory to PNG
    Batch {
        /// Input directory
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "RETEX_OUTPUT")]
        output: PathBuf,

        /// Filter pattern (glob-style, matched against the path relative to the input)
        #[arg(short, long, env = "RETEX_FILTER")]
        filter: Option<String>,

        /// Keep DDS pixels in partial edge blocks
        #[arg(long)]
        keep_edges: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
        Commands::Convert {
            input,
            output,
            keep_edges,
        } => {
            cmd_convert(&input, &output, keep_edges)?;
        }
        Commands::TgaCheck { input, fix } => {
            cmd_tga_check(&input, fix)?;
        }
        Commands::Batch {
            input,
            output,
            filter,
            keep_edges,
        } => {
            cmd_batch(&input, &output, filter.as_deref(), keep_edges)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn decode_options(keep_edges: bool) -> DdsDecodeOptions {
    DdsDecodeOptions {
        edges: if keep_edges {
            EdgePolicy::Keep
        } else {
            EdgePolicy::Truncate
        },
        ..Default::default()
    }
}

fn cmd_info(input: &Path) -> Result<()> {
    let image = retex::decode_file(input)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    let meta = image.metadata();

    println!("File:    {}", input.display());
    println!("Format:  {:?}", image.kind());
    println!("Size:    {}x{}", meta.width, meta.height);
    println!("Layout:  {:?}", meta.layout);
    println!("Color:   {:?}", meta.format);
    println!("Alpha:   {}", meta.has_alpha);

    match &image {
        DecodedImage::Dds(dds) => {
            let header = dds.header();
            println!("FourCC:  {}", dds.four_cc());
            println!("Decoder: {:?}", dds.format());
            println!(
                "Stored:  {}x{}, {} mip level(s)",
                header.width(),
                header.height(),
                header.mipmap_count.get().max(1)
            );
        }
        DecodedImage::Tga(tga) => {
            let header = tga.header();
            println!("Version: {:?}", tga.version());
            println!(
                "Type:    {} ({})",
                header.image_type,
                if tga.is_compressed() { "RLE" } else { "raw" }
            );
            println!("Bits:    {}", header.bits_per_pixel);
            println!(
                "Origin:  {}, {}",
                if tga.bottom_to_top() { "bottom" } else { "top" },
                if tga.right_to_left() { "right" } else { "left" }
            );
            println!("Alpha bits: {}", tga.alpha_bits());
            if !tga.image_id().is_empty() {
                println!("Image ID: {} bytes", tga.image_id().len());
            }
            if let Some(palette) = tga.palette() {
                println!("Palette: {} entries", palette.len());
            }
            if tga.extension_area().is_some() {
                println!("Extension area: present");
            }
            if !tga.trailing_bytes().is_empty() {
                println!("Trailing data: {} bytes", tga.trailing_bytes().len());
            }
        }
    }

    Ok(())
}

fn cmd_convert(input: &Path, output: &Path, keep_edges: bool) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let start = Instant::now();
    convert_file(input, output, &decode_options(keep_edges))?;

    println!("Conversion complete in {:?}", start.elapsed());

    Ok(())
}

fn cmd_tga_check(input: &Path, fix: bool) -> Result<()> {
    if fix {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(input)
            .with_context(|| format!("Failed to open {} for writing", input.display()))?;

        let repaired = retex::tga::validate_and_repair(&mut file).context("Invalid TGA header")?;
        if repaired {
            println!("{}: header repaired", input.display());
        } else {
            println!("{}: OK", input.display());
        }
        return Ok(());
    }

    let mut file = File::open(input).context("Failed to open input file")?;
    let header = retex::tga::validate(&mut file).context("Invalid TGA header")?;

    println!(
        "{}: OK ({:?}, {} bits, {}x{}{})",
        input.display(),
        header.pixel_format(),
        header.bits_per_pixel,
        header.width(),
        header.height(),
        if header.is_compressed() { ", RLE" } else { "" }
    );

    if header.needs_repair() {
        println!("  stray color map range; run with --fix to clear it");
    }

    Ok(())
}

fn cmd_batch(input: &Path, output: &Path, filter: Option<&str>, keep_edges: bool) -> Result<()> {
    let pattern = filter
        .map(glob::Pattern::new)
        .transpose()
        .context("Invalid filter pattern")?;

    let extensions: Vec<&str> = [ImageKind::Dds, ImageKind::Tga]
        .iter()
        .flat_map(|kind| kind.extensions().iter().copied())
        .collect();

    let files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
        })
        .filter(|path| match (&pattern, path.strip_prefix(input)) {
            (Some(pattern), Ok(relative)) => pattern.matches_path(relative),
            _ => true,
        })
        .collect();

    println!("Converting {} images to {}...", files.len(), output.display());

    fs::create_dir_all(output)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let options = decode_options(keep_edges);
    let start = Instant::now();

    let errors: Vec<(PathBuf, anyhow::Error)> = files
        .par_iter()
        .filter_map(|path| {
            let relative = path.strip_prefix(input).unwrap_or(path);
            let output_path = output.join(relative).with_extension("png");
            let result = convert_file(path, &output_path, &options);
            pb.inc(1);
            result.err().map(|e| (path.clone(), e))
        })
        .collect();

    pb.finish_with_message("Done");

    for (path, error) in &errors {
        warn!(path = %path.display(), "conversion failed");
        eprintln!("Error converting {}: {:#}", path.display(), error);
    }

    println!(
        "Converted {} images in {:?} ({} errors)",
        files.len() - errors.len(),
        start.elapsed(),
        errors.len()
    );

    Ok(())
}

/// Decode `input` and write it to `output` as PNG.
fn convert_file(input: &Path, output: &Path, options: &DdsDecodeOptions) -> Result<()> {
    let image = retex::decode_file_with(input, options)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    let (width, height) = (image.width(), image.height());
    debug!(path = %input.display(), width, height, kind = ?image.kind(), "decoded");

    let rgba = image::RgbaImage::from_raw(width as u32, height as u32, image.to_rgba8())
        .context("Decoded buffer does not match image dimensions")?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    rgba.save_with_format(output, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(())
}
