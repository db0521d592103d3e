use anyhow::Context;
use clap::Parser;
use customer_migration::config::toml_config::MigrationConfig;
use customer_migration::core::ConfigProvider;
use customer_migration::utils::discovery::{self, CANDIDATE_COUNT};
use customer_migration::utils::error::ErrorSeverity;
use customer_migration::utils::{logger, validation::Validate};
use customer_migration::{CliConfig, EtlEngine, LocalStorage, MigrationPipeline, RunContext};
use std::path::{Path, PathBuf};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    let run = RunContext::new();
    tracing::info!("🚀 Starting execution with ID: {}", run.run_id);

    // 載入 TOML 配置（未指定時使用預設值）
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match MigrationConfig::from_file(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    std::process::exit(1);
                }
            }
        }
        None => MigrationConfig::default(),
    };

    // 應用命令列覆蓋設定
    args.apply_to(&mut config);

    // 決定輸入檔案，CSV 先於 XML
    if config.source.csv.is_none() {
        let csv = resolve_input(
            &config.source.input_dir,
            "csv",
            "CSV",
            &config.source.example_csv,
            args.no_prompt,
        )?;
        config.source.csv = Some(csv);
    }
    if config.source.xml.is_none() {
        let xml = resolve_input(
            &config.source.input_dir,
            "xml",
            "XML",
            &config.source.example_xml,
            args.no_prompt,
        )?;
        config.source.xml = Some(xml);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &run, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return Ok(());
    }

    // 創建存儲和移轉管道；相對路徑以目前工作目錄為準
    let storage = LocalStorage::new(".".to_string());
    let pipeline = MigrationPipeline::new(storage, config, run);

    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output) => {
            println!("✅ {}/{} customers migrated", output.found, output.total);
            println!("📁 Output file: {}", output.xml_path);
            println!("📝 Migration log: {}", output.log_path);
            if let Some(archive) = &output.archive_path {
                println!("🗜️ Archive: {}", archive);
            }
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Migration failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

/// 從輸入資料夾挑選檔案，沒有選擇時退回範例檔
fn resolve_input(
    input_dir: &str,
    extension: &str,
    file_type: &str,
    example: &str,
    no_prompt: bool,
) -> anyhow::Result<String> {
    let candidates = discovery::latest_files(Path::new(input_dir), extension, CANDIDATE_COUNT)
        .with_context(|| format!("Failed to list {} files in '{}'", file_type, input_dir))?;

    let selected: Option<PathBuf> = if no_prompt {
        candidates.into_iter().next()
    } else {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        discovery::select_file(&candidates, file_type, &mut stdin.lock(), &mut stdout)
            .with_context(|| format!("Failed to read {} file selection", file_type))?
    };

    let path = match selected {
        Some(path) => path.to_string_lossy().into_owned(),
        None => {
            tracing::info!("📂 Using example {} file", file_type);
            example.to_string()
        }
    };

    tracing::debug!("{} input resolved to '{}'", file_type, path);
    Ok(path)
}

fn display_config_summary(config: &MigrationConfig, run: &RunContext, args: &CliConfig) {
    println!("📋 Configuration Summary:");
    println!("  Migration: {}", config.migration.name);
    println!("  Source XML: {}", config.source_xml());
    println!("  Mapping CSV: {}", config.mapping_csv());
    println!("  Output: {}", run.output_dir(config.output_path()));
    println!(
        "  Rules: segment {}, brand {} -> {}, default delivery day {}",
        config.rules.segment_id,
        config.rules.source_brand,
        config.rules.target_brand,
        config.rules.default_delivery_day
    );
    println!("  Archive: {}", config.archive_outputs());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
}
