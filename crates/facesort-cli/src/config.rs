use anyhow::Context;
use facesort_core::MatchPolicy;
use std::path::{Path, PathBuf};

/// Env var overriding the ONNX model directory.
const MODEL_DIR_ENV: &str = "FACESORT_MODEL_DIR";
const DEFAULT_MODEL_DIR: &str = "models";

/// Everything one run needs: where the event lives, where the models are,
/// and the matching policy.
pub struct RunConfig {
    pub event_path: PathBuf,
    pub model_dir: PathBuf,
    pub policy: MatchPolicy,
}

/// CLI-level policy tweaks, applied on top of defaults or a policy file.
#[derive(Debug, Default)]
pub struct PolicyOverrides {
    pub tolerance: Option<f32>,
    pub margin: Option<f32>,
    pub top_candidates: Option<usize>,
    pub disable_recheck: bool,
    pub disable_bootstrap: bool,
}

impl RunConfig {
    /// Assemble a run configuration: policy defaults, then the optional
    /// TOML policy file, then CLI flags. Model dir resolution: flag, then
    /// `FACESORT_MODEL_DIR`, then `./models`.
    pub fn assemble(
        event_path: PathBuf,
        policy_file: Option<&Path>,
        model_dir: Option<PathBuf>,
        overrides: PolicyOverrides,
    ) -> anyhow::Result<Self> {
        let mut policy = match policy_file {
            Some(path) => load_policy_file(path)?,
            None => MatchPolicy::default(),
        };

        if let Some(tolerance) = overrides.tolerance {
            policy.tolerance = tolerance;
        }
        if let Some(margin) = overrides.margin {
            policy.margin = margin;
        }
        if let Some(top_candidates) = overrides.top_candidates {
            policy.top_candidates = top_candidates;
        }
        if overrides.disable_recheck {
            policy.recheck = false;
        }
        if overrides.disable_bootstrap {
            policy.bootstrap.enabled = false;
        }

        Ok(Self {
            event_path,
            model_dir: resolve_model_dir(model_dir),
            policy,
        })
    }
}

fn load_policy_file(path: &Path) -> anyhow::Result<MatchPolicy> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading policy file {}", path.display()))?;
    let policy = toml::from_str(&raw)
        .with_context(|| format!("parsing policy file {}", path.display()))?;
    tracing::info!(path = %path.display(), "policy file loaded");
    Ok(policy)
}

fn resolve_model_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var(MODEL_DIR_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_defaults_without_file_or_flags() {
        let config = RunConfig::assemble(
            PathBuf::from("/tmp/event"),
            None,
            Some(PathBuf::from("/models")),
            PolicyOverrides::default(),
        )
        .unwrap();
        assert!((config.policy.tolerance - 0.45).abs() < 1e-6);
        assert!(config.policy.recheck);
        assert!(config.policy.bootstrap.enabled);
    }

    #[test]
    fn test_policy_file_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "tolerance = 0.50\n\n[bootstrap]\ntop_k = 10").unwrap();

        let config = RunConfig::assemble(
            PathBuf::from("/tmp/event"),
            Some(&path),
            None,
            PolicyOverrides::default(),
        )
        .unwrap();
        assert!((config.policy.tolerance - 0.50).abs() < 1e-6);
        assert_eq!(config.policy.bootstrap.top_k, 10);
        // Unmentioned keys keep their defaults.
        assert!((config.policy.margin - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_cli_flags_beat_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        std::fs::write(&path, "tolerance = 0.50\nrecheck = true\n").unwrap();

        let config = RunConfig::assemble(
            PathBuf::from("/tmp/event"),
            Some(&path),
            None,
            PolicyOverrides {
                tolerance: Some(0.40),
                disable_recheck: true,
                ..PolicyOverrides::default()
            },
        )
        .unwrap();
        assert!((config.policy.tolerance - 0.40).abs() < 1e-6);
        assert!(!config.policy.recheck);
    }

    #[test]
    fn test_malformed_policy_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        std::fs::write(&path, "tolerance = \"loose\"").unwrap();

        let result = RunConfig::assemble(
            PathBuf::from("/tmp/event"),
            Some(&path),
            None,
            PolicyOverrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_model_dir_flag_wins() {
        let dir = resolve_model_dir(Some(PathBuf::from("/opt/models")));
        assert_eq!(dir, PathBuf::from("/opt/models"));
    }
}
