pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::toml_config::{CompressionConfig, MigrationConfig};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "customer-migration")]
    #[command(about = "Migrate customer records from an XML export using a CSV mapping list")]
    pub struct CliConfig {
        /// Path to an optional TOML configuration file
        #[arg(short, long)]
        pub config: Option<String>,

        /// Source customer export (skips the interactive picker)
        #[arg(long)]
        pub xml: Option<String>,

        /// Mapping CSV (skips the interactive picker)
        #[arg(long)]
        pub csv: Option<String>,

        /// Folder scanned for the newest .xml and .csv files
        #[arg(long)]
        pub input_dir: Option<String>,

        /// Base folder for dated output folders
        #[arg(long)]
        pub output_path: Option<String>,

        /// Also bundle the output XML and log into a ZIP archive
        #[arg(long)]
        pub archive: bool,

        /// Never prompt; pick the newest candidate file
        #[arg(long)]
        pub no_prompt: bool,

        /// Dry run - resolve inputs and show the plan without writing anything
        #[arg(long)]
        pub dry_run: bool,

        /// Enable verbose output
        #[arg(short, long)]
        pub verbose: bool,

        /// Emit logs as JSON lines
        #[arg(long)]
        pub log_json: bool,
    }

    impl CliConfig {
        /// 命令列參數優先於 TOML 設定
        pub fn apply_to(&self, config: &mut MigrationConfig) {
            if let Some(xml) = &self.xml {
                config.source.xml = Some(xml.clone());
            }
            if let Some(csv) = &self.csv {
                config.source.csv = Some(csv.clone());
            }
            if let Some(input_dir) = &self.input_dir {
                config.source.input_dir = input_dir.clone();
            }
            if let Some(output_path) = &self.output_path {
                config.load.output_path = output_path.clone();
            }
            if self.archive {
                config.load.compression = Some(CompressionConfig { enabled: true });
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::core::ConfigProvider;

        #[test]
        fn test_cli_overrides_toml_values() {
            let args = CliConfig::parse_from([
                "customer-migration",
                "--xml",
                "in/export.xml",
                "--output-path",
                "out",
                "--archive",
            ]);

            let mut config = MigrationConfig::from_toml_str(
                "[source]\nxml = \"old.xml\"\ncsv = \"list.csv\"\n",
            )
            .unwrap();
            args.apply_to(&mut config);

            assert_eq!(config.source_xml(), "in/export.xml");
            assert_eq!(config.mapping_csv(), "list.csv");
            assert_eq!(config.output_path(), "out");
            assert!(config.archive_outputs());
        }

        #[test]
        fn test_flags_default_off() {
            let args = CliConfig::parse_from(["customer-migration"]);
            assert!(args.config.is_none());
            assert!(!args.archive);
            assert!(!args.no_prompt);
            assert!(!args.dry_run);

            let mut config = MigrationConfig::default();
            args.apply_to(&mut config);
            assert!(!config.archive_outputs());
        }
    }
}
