use anyhow::{bail, Context, Result};
use std::io::{self, Write};

use reach_pose::config::Config;
use reach_pose::grid::GridStore;
use reach_pose::predictor::{JointVariable, PosePredictor, PredictionQuery};
use reach_pose::subject::{FixedSubject, SubjectMetrics};
use reach_pose::ReachSession;

const CONFIG_PATH: &str = "config.toml";

/// 引数を全て f64 として読む。失敗した位置と値をエラーに含める
fn parse_numbers<const N: usize>(args: &[&str]) -> Result<[f64; N]> {
    if args.len() != N {
        bail!("{} 個の数値が必要です（{} 個）", N, args.len());
    }
    let mut values = [0.0; N];
    for (i, (slot, arg)) in values.iter_mut().zip(args).enumerate() {
        *slot = arg
            .parse()
            .with_context(|| format!("引数 {} が数値ではありません: {:?}", i + 1, arg))?;
    }
    Ok(values)
}

fn parse_query(args: &[&str]) -> Result<PredictionQuery> {
    let [direction, height, progression] = parse_numbers::<3>(args)?;
    Ok(PredictionQuery::new(direction, height, progression))
}

fn main() -> Result<()> {
    reach_pose::logging::init();

    let config = Config::load_or_default(CONFIG_PATH);
    let mut subject: FixedSubject = config.subject.subject()?;

    let grid = GridStore::load(&config.data.grid_path, config.data.delimiter)
        .with_context(|| format!("grid: {}", config.data.grid_path))?;

    println!("=== Reach Pose ===");
    println!("グリッド: {} ({} ノード)", config.data.grid_path, grid.len());
    println!(
        "方向: {:?}  高さ: {:?}",
        grid.axes().directions(),
        grid.axes().heights()
    );
    println!("進行度: {:?}", config.prediction.progression);
    println!();
    println!("コマンド:");
    println!("  m a b           - 体節長を設定 (例: m 0.92 0.36)");
    println!("  p dir h prog    - 骨盤・胸の姿勢を予測 (例: p 22.5 0.5 0.5)");
    println!("  j dir h prog    - 関節値（補正前）を表示");
    println!("  h level         - 高さ指定子をメートルに変換 (例: h 1.5)");
    println!("  q               - 終了");
    println!();

    let mut session = ReachSession::new(PosePredictor::new(grid, config.prediction.options()));

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "m" if parts.len() == 3 => {
                let [a, b] = match parse_numbers::<2>(&parts[1..]) {
                    Ok(values) => values,
                    Err(e) => {
                        println!("エラー: {:#}", e);
                        continue;
                    }
                };
                match SubjectMetrics::new(a, b) {
                    Ok(metrics) => {
                        subject.metrics = metrics;
                        // 計測はセッション単位で固定なので作り直す
                        session = ReachSession::new(session.predictor().clone());
                        println!("体節長: 足首→骨盤 {} m, 骨盤→胸 {} m", a, b);
                    }
                    Err(e) => println!("エラー: {}", e),
                }
            }
            "p" if parts.len() == 4 => {
                let query = match parse_query(&parts[1..]) {
                    Ok(query) => query,
                    Err(e) => {
                        println!("エラー: {:#}", e);
                        continue;
                    }
                };
                match session.tick(&subject, &query) {
                    Ok(Some(estimate)) => {
                        let p = estimate.pelvis.position;
                        let c = estimate.chest.position;
                        println!("骨盤: [{:.4}, {:.4}, {:.4}]", p.x, p.y, p.z);
                        for (variable, value) in &estimate.pelvis.orientation {
                            println!("  {} = {:.4}", variable.name(), value);
                        }
                        println!("胸:   [{:.4}, {:.4}, {:.4}]", c.x, c.y, c.z);
                        for (variable, value) in &estimate.chest.orientation {
                            println!("  {} = {:.4}", variable.name(), value);
                        }
                    }
                    Ok(None) => println!("体節長が未設定です"),
                    Err(e) => println!("エラー: {}", e),
                }
            }
            "j" if parts.len() == 4 => {
                let query = match parse_query(&parts[1..]) {
                    Ok(query) => query,
                    Err(e) => {
                        println!("エラー: {:#}", e);
                        continue;
                    }
                };
                match session.predictor().predict_joints(&query) {
                    Ok(prediction) => {
                        for joint in JointVariable::ALL {
                            println!("  {} = {:.6}", joint.name(), prediction.joint(joint));
                        }
                    }
                    Err(e) => println!("エラー: {}", e),
                }
            }
            "h" if parts.len() == 2 => {
                let [level] = match parse_numbers::<1>(&parts[1..]) {
                    Ok(values) => values,
                    Err(e) => {
                        println!("エラー: {:#}", e);
                        continue;
                    }
                };
                match subject.heights {
                    Some(heights) => println!("高さ {} → {:.4} m", level, heights.to_meters(level)),
                    None => println!("リーチ高さが未設定です"),
                }
            }
            "q" => {
                println!("終了します");
                break;
            }
            _ => {
                println!("不明なコマンド: {}", input.trim());
            }
        }
    }

    Ok(())
}
