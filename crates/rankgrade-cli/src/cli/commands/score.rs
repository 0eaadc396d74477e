use super::super::args::{OutputFormat, ScoreArgs};
use crate::exit_codes;
use rankgrade_core::score::map_rank;
use serde_json::json;

pub fn run(args: ScoreArgs) -> anyhow::Result<i32> {
    if args.total == 0 || args.rank == 0 || args.rank > args.total {
        eprintln!(
            "invalid input: rank must be within 1..={} (got rank {})",
            args.total, args.rank
        );
        return Ok(exit_codes::CONFIG_ERROR);
    }

    let card = map_rank(args.rank, args.total);
    match args.format {
        OutputFormat::Json => {
            let out = json!({
                "score": card.display(),
                "rank": args.rank,
                "totalSamples": args.total,
                "percentile": card.percentile,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!(
            "score {} (rank {} of {}, percentile {})",
            card.display(),
            args.rank,
            args.total,
            card.percentile
        ),
    }
    Ok(exit_codes::SUCCESS)
}
