use super::super::args::InitConfigArgs;
use crate::exit_codes;
use rankgrade_core::config::write_sample_config;

pub fn run(args: InitConfigArgs) -> anyhow::Result<i32> {
    if args.path.exists() && !args.force {
        eprintln!(
            "Skipped {} (exists; pass --force to overwrite)",
            args.path.display()
        );
        return Ok(exit_codes::CONFIG_ERROR);
    }
    if let Some(parent) = args.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    write_sample_config(&args.path)?;
    eprintln!("Created {}", args.path.display());
    Ok(exit_codes::SUCCESS)
}
