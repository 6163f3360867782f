use super::{read_workflow, write_workflow};
use crate::cli::PowerupArgs;
use crate::config::PartialPowerupPipeline;
use crate::error::Result;
use matflow::workflows::powerups::apply_powerups;
use std::path::Path;
use tracing::info;

pub fn run(args: PowerupArgs) -> Result<()> {
    let base_dir = args.config.parent().unwrap_or(Path::new("."));
    let powerups = PartialPowerupPipeline::from_file(&args.config)?.into_powerups(base_dir)?;
    info!("Loaded {} powerup(s) from {:?}", powerups.len(), args.config);

    let workflow = read_workflow(&args.input)?;
    let workflow = apply_powerups(workflow, &powerups)?;

    write_workflow(&workflow, &args.output)?;
    let names: Vec<&str> = powerups.iter().map(|p| p.name()).collect();
    println!(
        "✓ Applied {} to '{}', written to: {}",
        names.join(", "),
        workflow.name(),
        args.output.display()
    );
    Ok(())
}
