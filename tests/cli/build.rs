use anyhow::Result;

use crate::CliTest;

/// Rendered code of the module under `header`, up to its first line starting with `}`.
fn module_body<'a>(bundle: &'a str, header: &str) -> &'a str {
    let start = bundle
        .find(header)
        .unwrap_or_else(|| panic!("module `{}` not in bundle", header));
    let body = &bundle[start..];
    let body = &body[body.find('\n').unwrap() + 1..];
    let body = &body[body.find('\n').unwrap() + 1..];
    &body[..body.find("\n}").unwrap()]
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_globalize_mode_injects_formatters_first() -> Result<()> {
    let test = CliTest::with_globalize_project()?;

    let output = test.build_command().arg("--globalize").output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("in globalize mode"));

    let bundle = test.read_file("dist/bundle.js")?;
    let entry = module_body(
        &bundle,
        &format!("/* 0 {} */", test.root().join("src/index.js").display()),
    );
    let lines: Vec<&str> = entry.lines().collect();

    // Injected require, then the entry's own code untouched apart from its
    // own dependencies.
    assert_eq!(lines[0], "__intlpack_require__(2);");
    assert_eq!(lines[1], "const Globalize = __intlpack_require__(1);");
    assert_eq!(lines[2], "");
    assert_eq!(lines[3], "Globalize.locale('en');");
    assert!(entry.contains("const cldrData = null;"));

    let runtime = test
        .root()
        .join("node_modules/globalize/dist/globalize-runtime.js");
    assert!(bundle.contains(&format!("/* 1 {} */", runtime.display())));
    assert!(!bundle.contains("dist/globalize.js */"));

    let formatters_header = bundle
        .lines()
        .find(|line| line.starts_with("/* 2 "))
        .unwrap();
    assert!(formatters_header.ends_with("formatters.js */"));
    assert!(bundle.contains("const Globalize = __intlpack_require__(1);\n__intlpack_require__(3);"));
    assert!(bundle.contains(r#"Globalize.locale("en");"#));
    assert!(bundle.contains("Globalize._formatters"));
    assert!(bundle.contains(r#"formatters["messageFormatter(\"guestInfo\")"]"#));
    assert!(bundle.contains("module.exports = Globalize;"));

    Ok(())
}

#[test]
fn test_globalize_mode_from_env() -> Result<()> {
    let test = CliTest::with_globalize_project()?;

    let output = test
        .build_command()
        .env("INTLPACK_GLOBALIZE", "true")
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let bundle = test.read_file("dist/bundle.js")?;
    assert!(bundle.contains("formatters.js */"));

    Ok(())
}

#[test]
fn test_standard_mode_embeds_cldr_data() -> Result<()> {
    let test = CliTest::with_globalize_project()?;

    let output = test.build_command().output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("✓ Built 2 modules in standard mode"));

    let bundle = test.read_file("dist/bundle.js")?;
    let entry = module_body(
        &bundle,
        &format!("/* 0 {} */", test.root().join("src/index.js").display()),
    );
    assert!(entry.starts_with("const Globalize = __intlpack_require__(1);\n"));
    assert!(entry.contains(r#"const cldrData = {"main":{"en":{"dates":{"calendars":"#));
    assert!(entry.contains(r#""plurals-type-ordinal":{"en":"#));

    let library = test.root().join("node_modules/globalize/dist/globalize.js");
    assert!(bundle.contains(&format!("/* 1 {} */", library.display())));
    assert!(!bundle.contains("globalize-runtime"));
    assert!(!bundle.contains("formatters.js"));

    Ok(())
}

#[test]
fn test_clean_removes_stale_output() -> Result<()> {
    let test = CliTest::with_globalize_project()?;
    test.write_file("dist/stale.js", "old")?;

    let output = test.build_command().output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!test.root().join("dist/stale.js").exists());
    assert!(test.root().join("dist/bundle.js").exists());

    Ok(())
}

#[test]
fn test_clean_disabled_by_config() -> Result<()> {
    let test = CliTest::with_globalize_project()?;
    test.write_file(".intlpackrc.json", r#"{ "clean": false }"#)?;
    test.write_file("dist/stale.js", "old")?;

    let output = test.build_command().output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(test.root().join("dist/stale.js").exists());

    Ok(())
}

#[test]
fn test_verbose_lists_modules() -> Result<()> {
    let test = CliTest::with_globalize_project()?;

    let output = test.build_command().args(["--globalize", "-v"]).output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = stdout(&output);
    assert!(stdout.contains(&format!(
        "[0] {}",
        test.root().join("src/index.js").display()
    )));
    assert!(stdout.contains("    commonjs globalize -> [1]"));
    assert!(stdout.contains("    injected "));

    Ok(())
}

#[test]
fn test_unresolved_require_is_a_warning() -> Result<()> {
    let test = CliTest::with_globalize_project()?;
    test.write_file(
        "src/index.js",
        "const Globalize = require('globalize');\nrequire('./missing');\n",
    )?;

    let output = test.build_command().output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = stdout(&output);
    assert!(stdout.contains("warning: Module not found: Can't resolve './missing'"));
    assert!(stdout.contains("(1 warning)"));

    let bundle = test.read_file("dist/bundle.js")?;
    assert!(bundle.contains("function intlpackMissingModule()"));
    assert!(bundle.contains("Cannot find module './missing'"));

    Ok(())
}

#[test]
fn test_malformed_message_fails_the_build() -> Result<()> {
    let test = CliTest::with_globalize_project()?;
    test.write_file(
        ".intlpackrc.json",
        r#"{ "globalize": { "messages": { "broken": "{gender, select, male {he}}" } } }"#,
    )?;

    let output = test.build_command().arg("--globalize").output()?;
    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr(&output);
    assert!(stderr.starts_with("Error: "));
    assert!(stderr.contains("Failed to compile Globalize formatters"));
    assert!(stderr.contains("Invalid message 'broken'"));
    assert!(!test.root().join("dist/bundle.js").exists());

    Ok(())
}

#[test]
fn test_missing_entry_fails() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(
        ".intlpackrc.json",
        r#"{ "define": { "cldrFiles": [] } }"#,
    )?;

    let output = test.build_command().output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Entry module not found"));

    Ok(())
}

#[test]
fn test_explicit_config_path() -> Result<()> {
    let test = CliTest::with_globalize_project()?;
    test.write_file(
        "conf/intlpack.json",
        r#"{ "entry": "../src/index.js", "output": { "filename": "app.js" }, "define": { "cldrFiles": [] } }"#,
    )?;

    // Paths are relative to the config file, so `globalize` is not found from `conf/`.
    let output = test
        .build_command()
        .args(["--config", "conf/intlpack.json"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Can't resolve 'globalize'"));
    assert!(test.root().join("conf/dist/app.js").exists());

    Ok(())
}
