use anyhow::Context;
use tracing::{debug, error, info};
use ytmigrate::{logging, LogFormat, MigrationConfig, MigrationPipeline, VimeoCredentials};

fn main() -> anyhow::Result<()> {
    let config = MigrationConfig {
        log_format: LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref()),
        ..Default::default()
    };
    let _logging = logging::init(config.log_format);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: MigrationConfig) -> anyhow::Result<()> {
    let credentials = VimeoCredentials::from_env().context("loading Vimeo credentials")?;
    let pipeline = MigrationPipeline::from_config(&config, &credentials)
        .context("building migration pipeline")?;

    info!(
        input = %config.input_file.display(),
        output = %config.output_dir.display(),
        "Starting migration"
    );
    debug!("Effective configuration: {}", config.to_json()?);

    let run = pipeline
        .run_from_file()
        .await
        .with_context(|| format!("reading {}", config.input_file.display()))?;

    for job in run.jobs.iter().filter(|j| j.error_message.is_some()) {
        error!(
            url = %job.source_url,
            "Not migrated: {}",
            job.error_message.as_deref().unwrap_or_default()
        );
    }

    info!(
        total = run.stats.total_jobs,
        completed = run.stats.completed_jobs,
        failed = run.stats.failed_jobs,
        thumbnails = run.stats.thumbnails_uploaded,
        bytes = run.stats.total_bytes_downloaded,
        "Done"
    );

    match pipeline.ledger().read_all().await {
        Ok(records) => info!(
            rows = records.len(),
            "Mapping ledger {} now holds {} rows",
            pipeline.ledger().path().display(),
            records.len()
        ),
        Err(e) => error!("Could not read mapping ledger {}: {}", pipeline.ledger().path().display(), e),
    }
    Ok(())
}
