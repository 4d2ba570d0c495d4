use std::sync::Arc;

use ping_agent::{AppConfig, IcmpProbeIssuer, JobSupervisor, JsonLinesSink, LogEventSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = AppConfig::load_or_default();
    if let Some(target) = std::env::args().nth(1) {
        config.target = target;
    }
    config.validate()?;

    let summaries_path = AppConfig::get_config_path()?.with_file_name("summaries.jsonl");
    log::info!("Writing group summaries to {}", summaries_path.display());

    let supervisor = JobSupervisor::new(
        Arc::new(IcmpProbeIssuer::new(&config.behavior)),
        &config,
        Arc::new(JsonLinesSink::new(summaries_path)),
        Arc::new(LogEventSink),
    );

    supervisor.start(config.target.clone()).await;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            supervisor.stop().await;
        }
        _ = wait_for_idle(&supervisor) => {}
    }
    Ok(())
}

/// Resolves once the job ends on its own (group limit reached or fault).
async fn wait_for_idle(supervisor: &JobSupervisor) {
    while supervisor.is_active().await {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }
}
