use anyhow::{Context, Result};
use std::process::ExitCode;

use reach_pose::config::Config;
use reach_pose::grid::GridStore;
use reach_pose::predictor::PosePredictor;
use reach_pose::validation::load_cases;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<ExitCode> {
    reach_pose::logging::init();

    // Usage: reach_validate [--json] [config.toml]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let config_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or(CONFIG_PATH);

    let config = Config::load_or_default(config_path);
    let data = &config.data;

    let grid = GridStore::load(&data.grid_path, data.delimiter)
        .with_context(|| format!("grid: {}", data.grid_path))?;
    let cases = load_cases(&data.reference_path, data.delimiter)
        .with_context(|| format!("reference cases: {}", data.reference_path))?;

    let predictor = PosePredictor::new(grid, config.prediction.options());
    let report = config.validation.harness().run_all(&predictor, &cases);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("=== Reach Pose Validation ===");
        println!("グリッド: {}", data.grid_path);
        println!("参照ケース: {}", data.reference_path);
        println!();
        print!("{}", report);
    }

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        if !json {
            eprintln!("{} / {} ケースが不一致", report.total - report.passed, report.total);
        }
        Ok(ExitCode::FAILURE)
    }
}
