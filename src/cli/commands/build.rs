use std::{collections::BTreeMap, env, path::Path, sync::Arc};

use anyhow::{Context, Result};
use regex::Regex;

use super::super::{
    args::BuildCommand,
    exit_status::ExitStatus,
    report::{BuildMode, print_build},
};
use crate::{
    bundler::{
        Compiler, Plugin,
        plugins::{CleanPlugin, DefinePlugin, NormalModuleReplacementPlugin},
    },
    config::{Config, GlobalizeConfig, load_config, load_config_file},
    inject::{GlobalizePlugin, TempDirWriter},
    synthesis::{CldrData, GlobalizeSynthesizer, RuntimeRequireTemplate},
};

pub fn build(cmd: BuildCommand) -> Result<ExitStatus> {
    let cwd = env::current_dir().context("Failed to read the current directory")?;
    let loaded = match &cmd.config {
        Some(path) => load_config_file(&cwd.join(path))?,
        None => load_config(&cwd)?,
    };
    let base_dir = loaded
        .base_dir
        .canonicalize()
        .with_context(|| format!("Invalid project directory {}", loaded.base_dir.display()))?;

    let mode = if cmd.globalize {
        BuildMode::Globalize
    } else {
        BuildMode::Standard
    };

    let plugins = plugins(&loaded.config, &base_dir, mode)?;
    let compiler = Compiler::new(loaded.config.build_options(&base_dir), plugins)?;
    let output = compiler.run()?;

    print_build(&output, mode, cmd.verbose);
    Ok(ExitStatus::Success)
}

/// Plugins for `mode`, in application order.
pub fn plugins(config: &Config, base_dir: &Path, mode: BuildMode) -> Result<Vec<Box<dyn Plugin>>> {
    let mut plugins: Vec<Box<dyn Plugin>> = Vec::new();

    if config.clean {
        plugins.push(Box::new(CleanPlugin));
    }

    let cldr_data = match mode {
        BuildMode::Standard => CldrData::from_patterns(base_dir, &config.define.cldr_files)
            .context("Failed to load CLDR data")?
            .to_json(),
        BuildMode::Globalize => "null".to_string(),
    };
    plugins.push(Box::new(DefinePlugin::new(BTreeMap::from([(
        config.define.key.clone(),
        cldr_data,
    )]))));

    if mode == BuildMode::Globalize {
        plugins.push(Box::new(globalize_plugin(&config.globalize, base_dir)?));
    }

    Ok(plugins)
}

fn globalize_plugin(config: &GlobalizeConfig, base_dir: &Path) -> Result<GlobalizePlugin> {
    let synthesizer = GlobalizeSynthesizer::new(
        &config.default_locale,
        base_dir.join(&config.cldr_root),
        Box::new(RuntimeRequireTemplate::new(base_dir.join(&config.runtime_dist))),
    )
    .with_signatures(config.formatters.clone())
    .with_messages(config.messages.clone());

    let plugin = GlobalizePlugin::new(Arc::new(synthesizer), Arc::new(TempDirWriter::default()))?
        .with_target(Regex::new(&config.target)?)
        .with_replacement(NormalModuleReplacementPlugin::from_pattern(
            &config.request,
            config.runtime_request.clone(),
        )?)
        .with_variable(config.variable.clone());
    Ok(plugin)
}
