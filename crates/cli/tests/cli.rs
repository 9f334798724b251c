use assert_cmd::Command;

fn bookshelf() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    cmd.env_remove("BOOKSHELF_ENV")
        .env("BOOKSHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn help_lists_subcommands() {
    let output = bookshelf().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["serve", "migrate", "routes", "config"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn routes_prints_resource_paths() {
    let output = bookshelf().arg("routes").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let routes: Vec<Vec<&str>> = stdout
        .lines()
        .map(|line| line.split_whitespace().collect())
        .collect();
    assert!(routes.contains(&vec!["GET", "/books/"]));
    assert!(routes.contains(&vec!["POST", "/author/"]));
    assert!(routes.contains(&vec!["PUT", "/book/{id}/"]));
    assert!(!stdout.contains("/api/"));
}

#[test]
fn config_honors_environment_overrides() {
    let output = bookshelf()
        .arg("config")
        .env("BOOKSHELF_SERVER__PORT", "9191")
        .output()
        .unwrap();
    assert!(output.status.success());

    let settings: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(settings["server"]["port"], 9191);
    assert_eq!(settings["database"]["endpoint"], "memory://");
}

#[test]
fn migrate_on_memory_store_applies_nothing() {
    let output = bookshelf()
        .arg("migrate")
        .env("BOOKSHELF_DATABASE__ENDPOINT", "memory://")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .contains("applied 0 migration(s)"));
}

#[test]
fn unknown_subcommand_fails() {
    bookshelf().arg("shelve").assert().failure();
}
