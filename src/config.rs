use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::coverage::CoverageStrategy;
use crate::error::FrameGateError;
use crate::pipeline::{PipelineConfig, DEFAULT_FPS};
use crate::scoring::{PolicyParams, ScoringPolicy};
use crate::session::PromotionRule;

pub const CONFIG_ENV: &str = "FRAMEGATE_CONFIG";
pub const POLICY_ENV: &str = "FRAMEGATE_POLICY";
pub const COVERAGE_ENV: &str = "FRAMEGATE_COVERAGE";
pub const PROMOTION_ENV: &str = "FRAMEGATE_PROMOTION";
pub const FPS_ENV: &str = "FRAMEGATE_FPS";
pub const ACCEPT_THRESHOLD_ENV: &str = "FRAMEGATE_ACCEPT_THRESHOLD";

#[derive(Debug, Deserialize, Default)]
struct GateConfigFile {
    policy: Option<String>,
    promotion: Option<String>,
    fps: Option<f64>,
    scoring: Option<ScoringConfigFile>,
    coverage: Option<CoverageConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ScoringConfigFile {
    accept_threshold: Option<f32>,
    frame_stride: Option<u32>,
    equalize_histogram: Option<bool>,
    face_overlap_threshold: Option<f32>,
    body_overlap_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct CoverageConfigFile {
    strategy: Option<String>,
    validate: Option<bool>,
}

/// Resolved gate configuration: policy preset with any overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub params: PolicyParams,
    pub coverage: CoverageStrategy,
    pub validate_coverage: bool,
    pub promotion: PromotionRule,
    pub fps: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            params: PolicyParams::default(),
            coverage: CoverageStrategy::default(),
            validate_coverage: true,
            promotion: PromotionRule::default(),
            fps: DEFAULT_FPS,
        }
    }
}

impl GateConfig {
    /// Optional JSON file at `FRAMEGATE_CONFIG`, then `FRAMEGATE_*` overrides,
    /// then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var(CONFIG_ENV).ok();
        let mut file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => read_config_file(Path::new(path))?,
            _ => GateConfigFile::default(),
        };
        apply_env(&mut file_cfg)?;
        let cfg = Self::from_file(file_cfg)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a JSON document without consulting the environment.
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: GateConfigFile =
            serde_json::from_str(raw).map_err(|e| anyhow!("invalid config: {}", e))?;
        let cfg = Self::from_file(file)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: GateConfigFile) -> Result<Self> {
        let policy = match file.policy.as_deref() {
            Some(raw) => raw.parse::<ScoringPolicy>().map_err(|e| anyhow!(e))?,
            None => ScoringPolicy::default(),
        };
        let mut params = policy.params();
        if let Some(scoring) = file.scoring {
            if let Some(threshold) = scoring.accept_threshold {
                params.accept_threshold = threshold;
            }
            if let Some(stride) = scoring.frame_stride {
                params.frame_stride = stride;
            }
            if let Some(equalize) = scoring.equalize_histogram {
                params.equalize_histogram = equalize;
            }
            if let Some(face) = scoring.face_overlap_threshold {
                params.face_overlap_threshold = face;
            }
            if let Some(body) = scoring.body_overlap_threshold {
                params.body_overlap_threshold = body;
            }
        }

        let coverage = file.coverage.unwrap_or_default();
        let strategy = match coverage.strategy.as_deref() {
            Some(raw) => raw.parse::<CoverageStrategy>().map_err(|e| anyhow!(e))?,
            None => CoverageStrategy::default(),
        };
        let promotion = match file.promotion.as_deref() {
            Some(raw) => raw.parse::<PromotionRule>().map_err(|e| anyhow!(e))?,
            None => PromotionRule::default(),
        };

        Ok(Self {
            params,
            coverage: strategy,
            validate_coverage: coverage.validate.unwrap_or(true),
            promotion,
            fps: file.fps.unwrap_or(DEFAULT_FPS),
        })
    }

    pub fn validate(&self) -> std::result::Result<(), FrameGateError> {
        let invalid = |msg: String| Err(FrameGateError::Config(msg));
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return invalid(format!("fps must be positive, got {}", self.fps));
        }
        let p = &self.params;
        for (name, value) in [
            ("accept_threshold", p.accept_threshold),
            ("face_overlap_threshold", p.face_overlap_threshold),
            ("body_overlap_threshold", p.body_overlap_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if p.frame_stride == 0 {
            return invalid("frame_stride must be at least 1".to_string());
        }
        if p.require_valid_coverage && !self.validate_coverage {
            return invalid(format!(
                "{:?} policy requires coverage validation",
                p.policy
            ));
        }
        Ok(())
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            params: self.params,
            coverage: self.coverage,
            validate_coverage: self.validate_coverage,
            fps: self.fps,
        }
    }
}

fn apply_env(file: &mut GateConfigFile) -> Result<()> {
    if let Some(policy) = non_empty_env(POLICY_ENV) {
        file.policy = Some(policy);
    }
    if let Some(promotion) = non_empty_env(PROMOTION_ENV) {
        file.promotion = Some(promotion);
    }
    if let Some(strategy) = non_empty_env(COVERAGE_ENV) {
        file.coverage.get_or_insert_with(Default::default).strategy = Some(strategy);
    }
    if let Some(fps) = non_empty_env(FPS_ENV) {
        let fps: f64 = fps
            .parse()
            .map_err(|_| anyhow!("{} must be a number of frames per second", FPS_ENV))?;
        file.fps = Some(fps);
    }
    if let Some(threshold) = non_empty_env(ACCEPT_THRESHOLD_ENV) {
        let threshold: f32 = threshold
            .parse()
            .map_err(|_| anyhow!("{} must be a number in [0, 1]", ACCEPT_THRESHOLD_ENV))?;
        file.scoring
            .get_or_insert_with(Default::default)
            .accept_threshold = Some(threshold);
    }
    Ok(())
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<GateConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
