use anyhow::{Context, Result};
use clap::Parser;
use gazecue_core::Participant;
use gazecue_experiment::{ExperimentConfig, next_participant_id};
use gazecue_render::Layout;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gazecue",
    version,
    about = "Gaze-cueing reaction time experiment",
    long_about = "Shows gaze-cue stimuli followed by L/T targets and records which key was \
                  pressed and how fast. Results are written to <data-dir>/<participant>.json."
)]
pub struct Cli {
    /// Experiment parameters as JSON; missing keys take their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stimulus images, searched recursively
    #[arg(long, default_value = "resources/stimuli")]
    pub stimuli: PathBuf,

    /// Target letter images
    #[arg(long, default_value = "resources/targets")]
    pub targets: PathBuf,

    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// TrueType font for on-screen text (bundled DejaVu Sans otherwise)
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Defaults to one past the highest id already in the data directory
    #[arg(long)]
    pub participant: Option<u32>,

    #[arg(long)]
    pub age: u32,

    /// 1 male, 2 female, 3 other
    #[arg(long)]
    pub gender: u8,

    /// Culture code 1-9
    #[arg(long)]
    pub culture: u8,

    /// Stimulus size in pixels, WIDTHxHEIGHT
    #[arg(long, default_value = "400x400", value_parser = parse_size)]
    pub stimulus_size: (u32, u32),

    /// Target size in pixels, WIDTHxHEIGHT
    #[arg(long, default_value = "100x100", value_parser = parse_size)]
    pub target_size: (u32, u32),

    /// Horizontal distance from the centre to each target, in pixels
    #[arg(long, default_value_t = 500.0)]
    pub target_offset: f32,

    /// Run in a window instead of fullscreen
    #[arg(long, default_value_t = false)]
    pub windowed: bool,

    /// Show participant and trial details on screen
    #[arg(long, default_value_t = false)]
    pub trial_debugging: bool,

    /// Fixed shuffle seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Display and file settings of the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stimuli_dir: PathBuf,
    pub targets_dir: PathBuf,
    pub data_dir: PathBuf,
    pub font: Option<PathBuf>,
    pub stimulus_size: (u32, u32),
    pub target_size: (u32, u32),
    pub layout: Layout,
    pub fullscreen: bool,
}

/// Everything the app needs before the window opens.
#[derive(Debug, Clone)]
pub struct Setup {
    pub app: AppConfig,
    pub experiment: ExperimentConfig,
    pub participant: Participant,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    pub fn into_setup(self) -> Result<Setup> {
        let mut experiment = match &self.config {
            Some(path) => ExperimentConfig::from_json_file(path)?,
            None => ExperimentConfig::default(),
        };
        experiment.trial_debugging |= self.trial_debugging;
        if self.seed.is_some() {
            experiment.seed = self.seed;
        }
        experiment.validate()?;

        let id = match self.participant {
            Some(id) => id,
            None => next_participant_id(&self.data_dir)
                .context("choosing the next participant id")?,
        };
        let participant = Participant::new(id, self.age, self.gender, self.culture)?;

        Ok(Setup {
            app: AppConfig {
                stimuli_dir: self.stimuli,
                targets_dir: self.targets,
                data_dir: self.data_dir,
                font: self.font,
                stimulus_size: self.stimulus_size,
                target_size: self.target_size,
                layout: Layout {
                    target_offset_px: self.target_offset,
                },
                fullscreen: !self.windowed,
            },
            experiment,
            participant,
        })
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid dimension {v:?} in {s:?}"))
    };
    Ok((parse(w)?, parse(h)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec!["gazecue", "--age", "30", "--gender", "2", "--culture", "1"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn sizes_parse_both_ways() {
        assert_eq!(parse_size("400x300"), Ok((400, 300)));
        assert_eq!(parse_size("64X64"), Ok((64, 64)));
        assert!(parse_size("400").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn defaults_match_the_standard_layout() {
        let c = cli(&[]);
        assert_eq!(c.stimulus_size, (400, 400));
        assert_eq!(c.target_size, (100, 100));
        assert_eq!(c.target_offset, 500.0);
        assert_eq!(c.log_level(), log::LevelFilter::Warn);
    }

    #[test]
    fn participant_id_comes_from_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("4.json"), "{}").unwrap();
        let setup = cli(&["--data-dir", dir.path().to_str().unwrap(), "-vv"])
            .into_setup()
            .unwrap();
        assert_eq!(setup.participant.id, 5);
        assert!(setup.app.fullscreen);
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{ "seed": 1, "trial_debugging": false }"#).unwrap();
        let setup = cli(&[
            "--config",
            config.to_str().unwrap(),
            "--seed",
            "9",
            "--trial-debugging",
            "--participant",
            "3",
            "--windowed",
        ])
        .into_setup()
        .unwrap();
        assert_eq!(setup.experiment.seed, Some(9));
        assert!(setup.experiment.trial_debugging);
        assert_eq!(setup.participant.id, 3);
        assert!(!setup.app.fullscreen);
    }

    #[test]
    fn invalid_participant_is_rejected() {
        let young = Cli::try_parse_from([
            "gazecue", "--participant", "1", "--age", "12", "--gender", "1", "--culture", "1",
        ])
        .unwrap();
        assert!(young.into_setup().is_err());
    }
}
