//! The `pokebench leaderboard` command.

use clap::Args;
use pokebench_core::leaderboard::{model_averages, ModelAverage};
use pokebench_core::{Config, PokeBench};

/// Arguments for the `leaderboard` command.
#[derive(Args, Debug)]
pub struct LeaderboardArgs {
    /// Print averages as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Only include rows for this benchmark name
    #[arg(long)]
    pub benchmark: Option<String>,
}

/// Execute the leaderboard command.
pub async fn execute(args: LeaderboardArgs, config: Config) -> anyhow::Result<()> {
    let leaderboard = PokeBench::new(config).leaderboard();
    let mut rows = leaderboard.rows()?;
    if let Some(benchmark) = &args.benchmark {
        rows.retain(|row| &row.benchmark == benchmark);
    }
    let averages = model_averages(&rows);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&averages)?);
    } else if averages.is_empty() {
        eprintln!("No results in {}", leaderboard.path().display());
    } else {
        print!("{}", render_table(&averages));
    }
    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn render_table(averages: &[ModelAverage]) -> String {
    let width = averages
        .iter()
        .map(|a| a.model.chars().count())
        .max()
        .unwrap_or(0)
        .max("Model".len());

    let mut out = format!(
        "{:>4}  {:<width$}  {:>8}  {:>8}  {:>8}  {:>4}\n",
        "#", "Model", "Top1", "Top5", "F1", "Runs"
    );
    for (rank, avg) in averages.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:<width$}  {:>8}  {:>8}  {:>8}  {:>4}\n",
            rank + 1,
            avg.model,
            cell(avg.avg_top1),
            cell(avg.avg_top5),
            cell(avg.avg_macro_f1),
            avg.count
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table() {
        let table = render_table(&[
            ModelAverage {
                model: "a/strong-model".into(),
                avg_top1: Some(0.9),
                avg_top5: Some(0.95),
                avg_macro_f1: Some(0.8812),
                count: 2,
            },
            ModelAverage {
                model: "b/m".into(),
                avg_top1: None,
                avg_top5: None,
                avg_macro_f1: None,
                count: 1,
            },
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Model"));
        assert!(lines[1].starts_with("   1  a/strong-model"));
        assert!(lines[1].contains("90.00%"));
        assert!(lines[1].contains("88.12%"));
        assert!(lines[2].contains("   -"));
        assert!(lines[2].ends_with("   1"));
    }
}
