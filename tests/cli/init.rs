use anyhow::{Context, Result};
use serde_json::Value;

use crate::CliTest;

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    assert_eq!(parsed["entry"], "./src/index.js");
    assert_eq!(parsed["define"]["key"], "__CLDR_DATA__");
    assert_eq!(parsed["globalize"]["defaultLocale"], "en");
    assert!(
        parsed["globalize"]["messages"].get("guestInfo").is_some(),
        "Config should carry the guestInfo message"
    );
    assert!(
        content.contains("  "),
        "Config should use 2-space indentation"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "✓ Created .intlpackrc.json\n"
    );

    assert!(test.root().join(".intlpackrc.json").exists());
    let content = test.read_file(".intlpackrc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".intlpackrc.json", "{}")?;

    let output = test.command().arg("init").output()?;
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stderr),
        "Error: .intlpackrc.json already exists\n"
    );
    assert_eq!(test.read_file(".intlpackrc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::with_globalize_project()?;

    test.command().arg("init").output()?;

    let output = test.build_command().arg("--globalize").output()?;
    assert!(
        output.status.success(),
        "Build should work with initialized config. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    Ok(())
}
