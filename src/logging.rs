use tracing_subscriber::EnvFilter;

/// 既定のログレベル（RUST_LOG が無いとき）
const DEFAULT_FILTER: &str = "reach_pose=info";

/// バイナリ用の tracing サブスクライバを stderr に設定する。
///
/// 既に設定済みなら false（2回目以降の呼び出しは何もしない）。
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
