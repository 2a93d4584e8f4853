use anyhow::Context as _;
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vigil_audio::{AmbientSource, AudioSettings};
use vigil_fire::noise;
use vigil_fire::{EmitterConfig, FireEmitter, FireSample, FireSettings, FireStyle, FireSystem};
use vigil_render_wgpu::ProgramLayout;
use vigil_render_wgpu::shaders::PROGRAMS;
use vigil_scene::MemorialScene;

#[derive(Parser)]
#[command(name = "vigil-cli", about = "Inspect and validate vigil scene data")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default settings
    Info,
    /// Validate every WGSL program and list its uniforms and attributes
    Shaders,
    /// Generate fire samples and report their bounds
    Emitter {
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sample the fire noise functions at a point
    Noise {
        x: f32,
        y: f32,
        #[arg(default_value = "0")]
        z: f32,
    },
    /// List the static renderables
    Scene,
    /// Render the ambient mix offline and report its level
    Audio {
        /// Seconds of audio to render
        #[arg(short, long, default_value = "30")]
        duration: f32,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

/// Min/max of one sample attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct Range {
    min: f32,
    max: f32,
}

impl Range {
    fn of(values: impl Iterator<Item = f32>) -> Option<Self> {
        values.fold(None, |acc, v| {
            Some(match acc {
                None => Range { min: v, max: v },
                Some(r) => Range {
                    min: r.min.min(v),
                    max: r.max.max(v),
                },
            })
        })
    }
}

#[derive(Debug, Serialize)]
struct EmitterReport {
    seed: u64,
    count: usize,
    bytes: usize,
    radius: Range,
    height: Range,
    size: Range,
    phase: Range,
}

impl EmitterReport {
    fn new(seed: u64, samples: &[FireSample]) -> Option<Self> {
        Some(Self {
            seed,
            count: samples.len(),
            bytes: samples.len() * FireSample::STRIDE,
            radius: Range::of(samples.iter().map(FireSample::radius))?,
            height: Range::of(samples.iter().map(FireSample::height))?,
            size: Range::of(samples.iter().map(|s| s.size))?,
            phase: Range::of(samples.iter().map(|s| s.seed))?,
        })
    }
}

#[derive(Debug, Serialize)]
struct AudioReport {
    samples: u64,
    tones: u64,
    peak: f32,
    rms: f32,
}

fn render_audio(settings: &AudioSettings, seconds: f32) -> anyhow::Result<AudioReport> {
    let mut source = AmbientSource::new(settings)?;
    let total = (seconds.max(0.0) * settings.sample_rate as f32) as usize;
    let (mut peak, mut sum_sq) = (0.0f32, 0.0f64);
    for sample in source.by_ref().take(total) {
        peak = peak.max(sample.abs());
        sum_sq += (sample as f64) * (sample as f64);
    }
    let rms = if total == 0 {
        0.0
    } else {
        (sum_sq / total as f64).sqrt() as f32
    };
    Ok(AudioReport {
        samples: source.position(),
        tones: source.tones_started(),
        peak,
        rms,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let fire = FireSettings::default();
            let audio = AudioSettings::default();
            println!("vigil-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "fire: style={} speed={} samples={}",
                fire.style,
                fire.speed(),
                fire.emitter.count
            );
            println!(
                "audio: sample_rate={} master_gain={}",
                audio.sample_rate, audio.master_gain
            );
            println!("programs: {}", PROGRAMS.len());
        }
        Commands::Shaders => {
            for program in &PROGRAMS {
                let layout = ProgramLayout::check(program)?;
                println!("{} OK", layout.label());
                for (name, slot) in layout.uniforms() {
                    println!(
                        "  uniform {name:<20} group={} binding={} offset={:>3} size={}",
                        slot.group, slot.binding, slot.offset, slot.size
                    );
                }
                for (name, location) in layout.attributes() {
                    println!("  attribute {name:<18} location={location}");
                }
            }
        }
        Commands::Emitter { seed, json } => {
            let system = FireSystem::new(FireSettings {
                style: FireStyle::Point,
                seed: Some(seed),
                ..FireSettings::default()
            })?;
            let report = EmitterReport::new(seed, system.samples())
                .context("emitter produced no samples")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("seed={} count={} bytes={}", report.seed, report.count, report.bytes);
                for (label, r) in [
                    ("radius", report.radius),
                    ("height", report.height),
                    ("size", report.size),
                    ("phase", report.phase),
                ] {
                    println!("  {label:<7} [{:.3}, {:.3}]", r.min, r.max);
                }
            }
        }
        Commands::Noise { x, y, z } => {
            let p = Vec3::new(x, y, z);
            println!("simplex3({x}, {y}, {z}) = {:.6}", noise::simplex3(p));
            println!("simplex3_unit          = {:.6}", noise::simplex3_unit(p));
            println!("value2({x}, {y})        = {:.6}", noise::value2(Vec2::new(x, y)));
        }
        Commands::Scene => {
            let scene = MemorialScene::build()?;
            let camera = &scene.camera;
            println!(
                "camera eye={} target={} fov={}",
                camera.eye, camera.target, camera.fov_y
            );
            for r in &scene.renderables {
                println!(
                    "{:<16} vertices={:>5} indices={:>5} at {}",
                    r.name,
                    r.mesh.vertex_count(),
                    r.mesh.index_count(),
                    r.transform.translation
                );
            }
        }
        Commands::Audio { duration, seed } => {
            let settings = AudioSettings {
                seed: Some(seed),
                ..AudioSettings::default()
            };
            let report = render_audio(&settings, duration)?;
            println!(
                "samples={} tones={} peak={:.4} rms={:.4}",
                report.samples, report.tones, report.peak, report.rms
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn range_of_empty_is_none() {
        assert_eq!(Range::of(std::iter::empty()), None);
        assert_eq!(
            Range::of([2.0, -1.0, 5.0].into_iter()),
            Some(Range { min: -1.0, max: 5.0 })
        );
    }

    #[test]
    fn emitter_report_stays_in_bounds() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let emitter = FireEmitter::generate(&EmitterConfig::default(), &mut rng).unwrap();
        let report = EmitterReport::new(1, emitter.samples()).unwrap();
        assert_eq!(report.count, 460);
        assert_eq!(report.bytes, 460 * 20);
        assert!(report.height.min >= 0.06 && report.height.max <= 0.31);
        assert!(report.size.min >= 18.0 && report.size.max <= 32.0);
        assert!(report.phase.min >= 0.0 && report.phase.max < 10.0);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["count"], 460);
    }

    #[test]
    fn offline_audio_starts_a_tone_immediately() {
        let settings = AudioSettings {
            seed: Some(3),
            ..AudioSettings::default()
        };
        let report = render_audio(&settings, 1.0).unwrap();
        assert_eq!(report.samples, 44_100);
        assert_eq!(report.tones, 1);
        assert!(report.peak > 0.0 && report.peak < 0.024);
        assert!(report.rms > 0.0 && report.rms <= report.peak);
    }
}
