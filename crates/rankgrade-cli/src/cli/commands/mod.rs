use super::args::*;

pub mod grade;
pub(crate) mod grader_builder;
pub mod init_config;
pub mod score;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Grade(args) => grade::run(args).await,
        Command::Score(args) => score::run(args),
        Command::InitConfig(args) => init_config::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::grader_builder::{build_judge, resolve_config};
    use super::*;
    use clap::Parser;
    use rankgrade_core::config::IntegrityMode;
    use serial_test::serial;

    fn grade_args(argv: &[&str]) -> GradeArgs {
        let mut full = vec!["rankgrade", "grade"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).cmd {
            Command::Grade(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    #[serial(rankgrade_env)]
    fn flags_override_config_defaults() {
        let args = grade_args(&[
            "--judge",
            "FAKE",
            "--judge-model",
            "m-1",
            "--integrity",
            "permissive",
            "--timeout-secs",
            "7",
        ]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.judge.provider, "fake");
        assert_eq!(cfg.judge.model, "m-1");
        assert_eq!(cfg.integrity, IntegrityMode::Permissive);
        assert_eq!(cfg.timeouts.ranking_secs, 7);
    }

    #[test]
    #[serial(rankgrade_env)]
    fn zero_timeout_is_rejected() {
        let args = grade_args(&["--timeout-secs", "0"]);
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    #[serial(rankgrade_env)]
    fn openai_without_key_is_a_config_error() {
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("RANKGRADE_API_KEY");
        let args = grade_args(&["--judge", "openai"]);
        let cfg = resolve_config(&args).unwrap();
        let err = build_judge(&cfg, &args.judge).err().unwrap();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    #[serial(rankgrade_env)]
    fn unknown_provider_is_rejected() {
        let args = grade_args(&["--judge", "oracle"]);
        let cfg = resolve_config(&args).unwrap();
        let err = build_judge(&cfg, &args.judge).err().unwrap();
        assert!(err.to_string().contains("unknown judge provider"));
    }
}
