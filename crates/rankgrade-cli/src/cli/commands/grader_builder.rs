use super::super::args::{GradeArgs, JudgeArgs};
use rankgrade_core::config::{load_config, PipelineConfig, StageTimeouts};
use rankgrade_core::providers::judge::fake::FakeJudge;
use rankgrade_core::providers::judge::openai::OpenAiJudge;
use rankgrade_core::providers::judge::tracing::TracingJudge;
use rankgrade_core::{Grader, TextJudge};
use std::sync::Arc;

/// Config file (or defaults) with CLI/env overrides applied, then validated.
pub(crate) fn resolve_config(args: &GradeArgs) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };

    let judge = &args.judge;
    if let Some(provider) = &judge.judge {
        cfg.judge.provider = provider.trim().to_ascii_lowercase();
    }
    if let Some(model) = &judge.judge_model {
        cfg.judge.model = model.clone();
    }
    if let Some(base_url) = &judge.judge_base_url {
        cfg.judge.base_url = base_url.clone();
    }
    if let Some(max_tokens) = judge.judge_max_tokens {
        cfg.judge.max_tokens = max_tokens;
    }
    if let Some(integrity) = args.integrity {
        cfg.integrity = integrity.into();
    }
    if let Some(secs) = args.timeout_secs {
        cfg.timeouts = StageTimeouts::uniform(secs);
    }

    cfg.validate()?;
    Ok(cfg)
}

pub(crate) fn build_judge(
    cfg: &PipelineConfig,
    args: &JudgeArgs,
) -> anyhow::Result<Arc<dyn TextJudge>> {
    let inner: Arc<dyn TextJudge> = match cfg.judge.provider.as_str() {
        "openai" => {
            let api_key = match &args.api_key {
                Some(k) if !k.trim().is_empty() => k.clone(),
                _ => std::env::var("OPENAI_API_KEY").map_err(|_| {
                    anyhow::anyhow!(
                        "judge provider is openai but no API key was given (--api-key, RANKGRADE_API_KEY or OPENAI_API_KEY)"
                    )
                })?,
            };
            Arc::new(
                OpenAiJudge::new(cfg.judge.model.clone(), api_key, cfg.judge.max_tokens)
                    .with_base_url(cfg.judge.base_url.clone())
                    .with_json_mode(cfg.judge.json_mode),
            )
        }
        "fake" => {
            let mut fake = FakeJudge::new("fake-judge");
            if let Some(position) = args.fake_position {
                fake = fake.with_position(position);
            }
            Arc::new(fake)
        }
        other => anyhow::bail!("unknown judge provider: {} (expected openai or fake)", other),
    };

    tracing::debug!(
        provider = inner.provider_name(),
        model = inner.model(),
        "judge configured"
    );
    Ok(Arc::new(TracingJudge::new(inner)))
}

pub(crate) fn build_grader(args: &GradeArgs) -> anyhow::Result<Grader> {
    let cfg = resolve_config(args)?;
    let judge = build_judge(&cfg, &args.judge)?;
    Ok(Grader::new(judge, cfg))
}
