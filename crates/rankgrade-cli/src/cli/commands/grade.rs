use super::super::args::{GradeArgs, OutputFormat};
use super::grader_builder::build_grader;
use crate::exit_codes;
use rankgrade_core::errors::ErrorEnvelope;
use rankgrade_core::model::GradeResponse;
use rankgrade_core::GradingRequest;
use std::io::Read;
use std::path::Path;
use tokio_util::sync::CancellationToken;

pub async fn run(args: GradeArgs) -> anyhow::Result<i32> {
    let request = match read_request(&args) {
        Ok(request) => request,
        Err(message) => {
            let envelope = ErrorEnvelope::invalid_input(message);
            emit_error(&envelope, args.format, args.output.as_deref())?;
            return Ok(exit_codes::for_kind(envelope.error.kind));
        }
    };

    let grader = match build_grader(&args) {
        Ok(grader) => grader,
        Err(e) => {
            eprintln!("config error: {e:#}");
            let envelope = ErrorEnvelope::config(format!("{e:#}"));
            if args.format == OutputFormat::Json {
                emit_error(&envelope, args.format, args.output.as_deref())?;
            }
            return Ok(exit_codes::for_kind(envelope.error.kind));
        }
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling grading");
            on_signal.cancel();
        }
    });

    match grader.grade_with_cancel(&request, &cancel).await {
        Ok(outcome) => {
            let response = outcome.to_response();
            emit_response(&response, args.format, args.output.as_deref())?;
            Ok(exit_codes::SUCCESS)
        }
        Err(err) => {
            emit_error(&err.to_envelope(), args.format, args.output.as_deref())?;
            Ok(exit_codes::for_kind(err.kind()))
        }
    }
}

fn read_request(args: &GradeArgs) -> Result<GradingRequest, String> {
    let mut request = if let Some(path) = &args.request {
        let raw = read_source(path)?;
        serde_json::from_str::<GradingRequest>(&raw)
            .map_err(|e| format!("request is not valid JSON: {}", e))?
    } else {
        let content = match (&args.content, &args.content_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => read_source(path)?,
            (None, None) => String::new(),
        };
        GradingRequest::new(
            args.topic.clone().unwrap_or_default(),
            content,
            args.rubric.clone().unwrap_or_default(),
        )
    };

    if let Some(n) = args.sample_count {
        request.sample_count = n;
    }
    Ok(request)
}

fn read_source(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {}", e))?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))
}

fn emit_response(
    response: &GradeResponse,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(response)?;
    if let Some(path) = output {
        std::fs::write(path, &json)?;
    }
    match format {
        OutputFormat::Json => println!("{}", json),
        OutputFormat::Text => {
            let r = &response.result;
            println!(
                "score {} (rank {} of {}, percentile {})",
                r.score, r.rank, r.total_samples, r.percentile
            );
            if !r.reasoning.is_empty() {
                println!("{}", r.reasoning);
            }
            if let Some(diag) = &response.diagnostics {
                if let Some(v) = &diag.range_violation {
                    println!("note: judge rank {} was clamped to {}", v.raw, v.clamped);
                }
                for w in &diag.integrity_warnings {
                    println!("note: ranking repaired: {}", w);
                }
                if let Some(short) = &diag.short_corpus {
                    println!(
                        "note: corpus has {} of {} requested samples",
                        short.received, short.requested
                    );
                }
            }
        }
    }
    Ok(())
}

fn emit_error(
    envelope: &ErrorEnvelope,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(envelope)?;
    if let Some(path) = output {
        std::fs::write(path, &json)?;
    }
    match format {
        OutputFormat::Json => println!("{}", json),
        OutputFormat::Text => {
            let body = &envelope.error;
            match body.stage {
                Some(stage) => eprintln!("error [{}/{}]: {}", stage, body.kind, body.message),
                None => eprintln!("error [{}]: {}", body.kind, body.message),
            }
        }
    }
    Ok(())
}
