use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileRoundConfig};
use super::models::{AnalyzeConfig, DockConfig, ScreenConfig};
use crate::cli::{AnalyzeArgs, CampaignArgs, ConversionArgs, DockArgs, DockingArgs, ScreenArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use std::path::PathBuf;
use std::str::FromStr;
use vscreen::core::models::job::DockingBox;
use vscreen::engine::config::{
    AnalysisConfig, AnalysisConfigBuilder, RoundConfig, RoundConfigBuilder, ScreenLayout,
};

/// The file and default layers of one campaign, with `--set` overrides already applied.
struct Campaign {
    defaults: DefaultsConfig,
    file: FileConfig,
    layout: ScreenLayout,
}

impl Campaign {
    fn load(args: &CampaignArgs) -> Result<Self> {
        let defaults = DefaultsConfig::default();

        let file_config = if let Some(config_path) = &args.config {
            FileConfig::from_file(config_path)?
        } else {
            FileConfig::default()
        };
        let file = apply_set_values(file_config, &args.set_values)?;

        let work_dir = args
            .work_dir
            .clone()
            .or_else(|| file.work_dir.clone())
            .unwrap_or_else(|| defaults.work_dir.clone());
        let tag = args.tag.clone().or_else(|| file.tag.clone()).ok_or_else(|| {
            CliError::Config(
                "A campaign tag is required either in the config file (`tag`) or via --tag."
                    .to_string(),
            )
        })?;
        if tag.trim().is_empty() || tag.contains(['/', '\\']) {
            return Err(CliError::Config(format!(
                "Invalid campaign tag '{}': it must be a non-empty directory-name fragment.",
                tag
            )));
        }

        Ok(Self {
            layout: ScreenLayout::new(work_dir, tag),
            defaults,
            file,
        })
    }

    fn input_extension(&self) -> String {
        self.file
            .input_extension
            .clone()
            .unwrap_or_else(|| self.defaults.input_extension.clone())
    }

    fn library(&self) -> PathBuf {
        self.file
            .library
            .clone()
            .unwrap_or_else(|| self.defaults.library.clone())
    }

    fn engine(&self, docking: &DockingArgs) -> PathBuf {
        docking
            .engine
            .clone()
            .or_else(|| self.file.docking.as_ref().and_then(|d| d.engine.clone()))
            .unwrap_or_else(|| self.defaults.engine.clone())
    }

    fn round_file(&self, round: u8) -> FileRoundConfig {
        let section = if round == 1 {
            &self.file.round_one
        } else {
            &self.file.round_two
        };
        section.clone().unwrap_or_default()
    }

    fn exhaustiveness(&self, round: u8) -> u32 {
        self.round_file(round).exhaustiveness.unwrap_or(if round == 1 {
            self.defaults.round_one_exhaustiveness
        } else {
            self.defaults.round_two_exhaustiveness
        })
    }

    /// Size of the first-round selection, which is also the input of the second round.
    fn round_one_cut(&self) -> usize {
        self.round_file(1)
            .select_top
            .unwrap_or(self.defaults.round_one_cut)
    }

    fn round_config(
        &self,
        docking: &DockingArgs,
        round: u8,
        input_dir: PathBuf,
        exhaustiveness: u32,
        select_top: Option<usize>,
        jobs: Option<usize>,
    ) -> Result<RoundConfig> {
        let file_docking = self.file.docking.clone().unwrap_or_default();

        let receptor = docking
            .receptor
            .clone()
            .or(file_docking.receptor)
            .ok_or_else(|| required("docking.receptor", "--receptor"))?;
        if !receptor.exists() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Receptor file does not exist: {}", receptor.display()),
            )));
        }
        let center = docking
            .center
            .or(file_docking.center)
            .ok_or_else(|| required("docking.center", "--center"))?;
        let size = docking
            .size
            .or(file_docking.size)
            .ok_or_else(|| required("docking.size", "--size"))?;

        let mut builder = RoundConfigBuilder::new()
            .receptor(receptor)
            .pocket(DockingBox::from_arrays(center, size))
            .exhaustiveness(exhaustiveness)
            .layout(self.layout.round(round))
            .input_dir(input_dir)
            .input_extension(self.input_extension())
            .select_top(select_top);
        if let Some(n) = jobs.or(self.file.max_concurrency) {
            builder = builder.max_concurrency(n);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn analysis_config(&self, conversion: &ConversionArgs) -> Result<(PathBuf, AnalysisConfig)> {
        let file_analysis = self.file.analysis.clone().unwrap_or_default();

        let converter = conversion
            .converter
            .clone()
            .or(file_analysis.converter)
            .unwrap_or_else(|| self.defaults.converter.clone());

        let analysis = AnalysisConfigBuilder::from_layout(&self.layout)
            .top_poses(
                conversion
                    .top_poses
                    .or(file_analysis.top_poses)
                    .unwrap_or(self.defaults.top_poses),
            )
            .result_extension(self.input_extension())
            .target_format(
                conversion
                    .target_format
                    .clone()
                    .or(file_analysis.target_format)
                    .unwrap_or_else(|| self.defaults.target_format.clone()),
            )
            .bond_order_warning(
                file_analysis
                    .bond_order_warning
                    .unwrap_or_else(|| self.defaults.bond_order_warning.clone()),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok((converter, analysis))
    }
}

fn required(key: &str, flag: &str) -> CliError {
    CliError::Config(format!(
        "A value for '{}' is required either in the config file or via {}.",
        key, flag
    ))
}

pub fn build_dock_config(args: &DockArgs, jobs: Option<usize>) -> Result<DockConfig> {
    let campaign = Campaign::load(&args.campaign)?;
    let round_file = campaign.round_file(args.round);

    let input_dir = match &args.input {
        Some(path) => path.clone(),
        None if args.round == 1 => campaign.library(),
        None => campaign
            .layout
            .round(1)
            .selection_dir(campaign.round_one_cut()),
    };

    let exhaustiveness = args
        .exhaustiveness
        .unwrap_or_else(|| campaign.exhaustiveness(args.round));

    let select_top = if args.no_select {
        None
    } else if args.round == 1 {
        Some(args.select_top.unwrap_or_else(|| campaign.round_one_cut()))
    } else {
        args.select_top.or(round_file.select_top)
    };

    let round = campaign.round_config(
        &args.docking,
        args.round,
        input_dir,
        exhaustiveness,
        select_top,
        jobs,
    )?;

    Ok(DockConfig {
        engine: campaign.engine(&args.docking),
        round,
    })
}

pub fn build_analyze_config(args: &AnalyzeArgs) -> Result<AnalyzeConfig> {
    let campaign = Campaign::load(&args.campaign)?;
    let (converter, analysis) = campaign.analysis_config(&args.conversion)?;
    Ok(AnalyzeConfig {
        converter,
        analysis,
    })
}

pub fn build_screen_config(args: &ScreenArgs, jobs: Option<usize>) -> Result<ScreenConfig> {
    let campaign = Campaign::load(&args.campaign)?;

    let cut = args.cut.unwrap_or_else(|| campaign.round_one_cut());
    let library = args.input.clone().unwrap_or_else(|| campaign.library());

    let round_one = campaign.round_config(
        &args.docking,
        1,
        library,
        campaign.exhaustiveness(1),
        Some(cut),
        jobs,
    )?;
    let round_two = campaign.round_config(
        &args.docking,
        2,
        round_one.layout.selection_dir(cut),
        campaign.exhaustiveness(2),
        campaign.round_file(2).select_top,
        jobs,
    )?;
    let (converter, analysis) = campaign.analysis_config(&args.conversion)?;

    Ok(ScreenConfig {
        engine: campaign.engine(&args.docking),
        converter,
        round_one,
        round_two,
        analysis,
    })
}

fn parse_set_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn parse_set_vector(key: &str, value: &str) -> Result<[f64; 3]> {
    parser::parse_vec3(value)
        .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", key, e)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "work-dir" => config.work_dir = Some(PathBuf::from(value_str)),
            "tag" => config.tag = Some(value_str.to_string()),
            "library" => config.library = Some(PathBuf::from(value_str)),
            "input-extension" => config.input_extension = Some(value_str.to_string()),
            "max-concurrency" => {
                config.max_concurrency = Some(parse_set_value(key, value_str, "integer")?);
            }
            "docking.engine" => {
                config.docking.get_or_insert_with(Default::default).engine =
                    Some(PathBuf::from(value_str));
            }
            "docking.receptor" => {
                config.docking.get_or_insert_with(Default::default).receptor =
                    Some(PathBuf::from(value_str));
            }
            "docking.center" => {
                config.docking.get_or_insert_with(Default::default).center =
                    Some(parse_set_vector(key, value_str)?);
            }
            "docking.size" => {
                config.docking.get_or_insert_with(Default::default).size =
                    Some(parse_set_vector(key, value_str)?);
            }
            "round-one.exhaustiveness" => {
                config.round_one.get_or_insert_with(Default::default).exhaustiveness =
                    Some(parse_set_value(key, value_str, "integer")?);
            }
            "round-one.select-top" => {
                config.round_one.get_or_insert_with(Default::default).select_top =
                    Some(parse_set_value(key, value_str, "integer")?);
            }
            "round-two.exhaustiveness" => {
                config.round_two.get_or_insert_with(Default::default).exhaustiveness =
                    Some(parse_set_value(key, value_str, "integer")?);
            }
            "round-two.select-top" => {
                config.round_two.get_or_insert_with(Default::default).select_top =
                    Some(parse_set_value(key, value_str, "integer")?);
            }
            "analysis.converter" => {
                config.analysis.get_or_insert_with(Default::default).converter =
                    Some(PathBuf::from(value_str));
            }
            "analysis.top-poses" => {
                config.analysis.get_or_insert_with(Default::default).top_poses =
                    Some(parse_set_value(key, value_str, "integer")?);
            }
            "analysis.target-format" => {
                config.analysis.get_or_insert_with(Default::default).target_format =
                    Some(value_str.to_string());
            }
            "analysis.bond-order-warning" => {
                config
                    .analysis
                    .get_or_insert_with(Default::default)
                    .bond_order_warning = Some(value_str.to_string());
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};
    use vscreen::engine::config::DEFAULT_BOND_ORDER_WARNING;

    fn receptor(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("2bv6_final_proto.pdbqt");
        fs::write(&path, "ATOM\n").unwrap();
        path
    }

    fn campaign_args(dir: &TempDir) -> CampaignArgs {
        CampaignArgs {
            config: None,
            work_dir: Some(dir.path().to_path_buf()),
            tag: Some("2bv6".to_string()),
            set_values: vec![],
        }
    }

    fn docking_args(dir: &TempDir) -> DockingArgs {
        DockingArgs {
            receptor: Some(receptor(dir)),
            center: Some([80.64, 2.39, 4.29]),
            size: Some([30.0, 30.0, 30.0]),
            engine: None,
        }
    }

    fn base_dock_args(dir: &TempDir, round: u8) -> DockArgs {
        DockArgs {
            campaign: campaign_args(dir),
            docking: docking_args(dir),
            round,
            input: None,
            exhaustiveness: None,
            select_top: None,
            no_select: false,
        }
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("campaign.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn round_one_defaults_reproduce_first_pass() {
        let dir = tempdir().unwrap();
        let config = build_dock_config(&base_dock_args(&dir, 1), Some(4)).expect("build ok");

        assert_eq!(config.engine, PathBuf::from("./psovina"));
        assert_eq!(config.round.params.exhaustiveness, 8);
        assert_eq!(config.round.select_top, Some(500));
        assert_eq!(config.round.max_concurrency, 4);
        assert_eq!(config.round.input_dir, PathBuf::from("SD_Library"));
        assert_eq!(config.round.input_extension, "pdbqt");
        assert_eq!(
            config.round.layout.results_dir(),
            dir.path().join("dock1_results_2bv6")
        );
    }

    #[test]
    fn round_two_defaults_read_round_one_selection() {
        let dir = tempdir().unwrap();
        let config = build_dock_config(&base_dock_args(&dir, 2), None).expect("build ok");

        assert_eq!(config.round.params.exhaustiveness, 32);
        assert_eq!(config.round.select_top, None);
        assert_eq!(config.round.input_dir, dir.path().join("dock1_top500_2bv6"));
        assert_eq!(
            config.round.layout.results_dir(),
            dir.path().join("dock2_results_2bv6")
        );
    }

    #[test]
    fn file_values_are_merged_and_cli_overrides_them() {
        let dir = tempdir().unwrap();
        let receptor = receptor(&dir);
        let cfg_path = write_config(
            &dir,
            &format!(
                r#"
                tag = "file-tag"
                library = "ligands"
                max-concurrency = 6

                [docking]
                engine = "/opt/vina/bin/vina"
                receptor = "{}"
                center = [1.0, 2.0, 3.0]
                size = [20.0, 22.0, 24.0]

                [round-one]
                exhaustiveness = 12
                select-top = 250
                "#,
                receptor.display()
            ),
        );

        let mut args = base_dock_args(&dir, 1);
        args.campaign.config = Some(cfg_path);
        args.campaign.tag = None;
        args.docking = DockingArgs::default();
        args.exhaustiveness = Some(16);

        let config = build_dock_config(&args, None).expect("build ok");

        assert_eq!(config.engine, PathBuf::from("/opt/vina/bin/vina"));
        assert_eq!(config.round.params.exhaustiveness, 16);
        assert_eq!(config.round.select_top, Some(250));
        assert_eq!(config.round.max_concurrency, 6);
        assert_eq!(config.round.input_dir, PathBuf::from("ligands"));
        assert_eq!(config.round.params.pocket, DockingBox::from_arrays([1.0, 2.0, 3.0], [20.0, 22.0, 24.0]));
        assert_eq!(
            config.round.layout.selection_dir(250),
            dir.path().join("dock1_top250_file-tag")
        );
    }

    #[test]
    fn set_values_override_file_values() {
        let dir = tempdir().unwrap();
        let cfg_path = write_config(&dir, "[round-one]\nselect-top = 250\n");

        let mut args = base_dock_args(&dir, 1);
        args.campaign.config = Some(cfg_path);
        args.campaign.set_values = vec![
            "round-one.select-top=100".to_string(),
            "round-one.exhaustiveness=4".to_string(),
            "input-extension=.pdbqt".to_string(),
        ];

        let config = build_dock_config(&args, None).expect("build ok");

        assert_eq!(config.round.select_top, Some(100));
        assert_eq!(config.round.params.exhaustiveness, 4);
        assert_eq!(config.round.input_extension, "pdbqt");
    }

    #[test]
    fn no_select_disables_copying() {
        let dir = tempdir().unwrap();
        let mut args = base_dock_args(&dir, 1);
        args.no_select = true;

        let config = build_dock_config(&args, None).expect("build ok");

        assert_eq!(config.round.select_top, None);
    }

    #[test]
    fn missing_tag_is_a_config_error() {
        let dir = tempdir().unwrap();
        let mut args = base_dock_args(&dir, 1);
        args.campaign.tag = None;

        let result = build_dock_config(&args, None);

        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("tag")));
    }

    #[test]
    fn missing_pocket_is_a_config_error() {
        let dir = tempdir().unwrap();
        let mut args = base_dock_args(&dir, 1);
        args.docking.center = None;

        let result = build_dock_config(&args, None);

        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("docking.center")));
    }

    #[test]
    fn nonexistent_receptor_is_reported() {
        let dir = tempdir().unwrap();
        let mut args = base_dock_args(&dir, 1);
        args.docking.receptor = Some(dir.path().join("absent.pdbqt"));

        let result = build_dock_config(&args, None);

        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for bad in ["round-one.select-top", "unknown.key=1", "round-one.select-top=many"] {
            let dir = tempdir().unwrap();
            let mut args = base_dock_args(&dir, 1);
            args.campaign.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_dock_config(&args, None), Err(CliError::Config(_))),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn analyze_config_uses_campaign_layout() {
        let dir = tempdir().unwrap();
        let args = AnalyzeArgs {
            campaign: campaign_args(&dir),
            conversion: ConversionArgs {
                top_poses: Some(5),
                converter: None,
                target_format: None,
            },
        };

        let config = build_analyze_config(&args).expect("build ok");

        assert_eq!(config.converter, PathBuf::from("obabel"));
        assert_eq!(config.analysis.top_poses, 5);
        assert_eq!(config.analysis.target_format, "mol2");
        assert_eq!(config.analysis.bond_order_warning, DEFAULT_BOND_ORDER_WARNING);
        assert_eq!(
            config.analysis.round_two_results,
            dir.path().join("dock2_results_2bv6")
        );
        assert_eq!(
            config.analysis.scores_file,
            dir.path().join("scores_final_2bv6.txt")
        );
    }

    #[test]
    fn screen_config_chains_rounds_through_the_cut() {
        let dir = tempdir().unwrap();
        let args = ScreenArgs {
            campaign: campaign_args(&dir),
            docking: docking_args(&dir),
            conversion: ConversionArgs::default(),
            input: Some(PathBuf::from("library")),
            cut: Some(50),
        };

        let config = build_screen_config(&args, Some(2)).expect("build ok");

        assert_eq!(config.round_one.input_dir, Path::new("library"));
        assert_eq!(config.round_one.select_top, Some(50));
        assert_eq!(config.round_one.params.exhaustiveness, 8);
        assert_eq!(config.round_two.input_dir, dir.path().join("dock1_top50_2bv6"));
        assert_eq!(config.round_two.select_top, None);
        assert_eq!(config.round_two.params.exhaustiveness, 32);
        assert_eq!(config.round_two.max_concurrency, 2);
        assert_eq!(config.analysis.top_poses, 10);
        assert_eq!(
            config.analysis.final_poses_dir,
            dir.path().join("final_poses_2bv6")
        );
    }
}
