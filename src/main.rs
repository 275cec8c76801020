use anyhow::Result;
use challenge_solver::utils::logging;
use challenge_solver::{orchestrator, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    // 启动触发服务
    orchestrator::start(config).await
}
