// Copyright © 2024 Pathway

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use assert_matches::assert_matches;
use mockall::mock;
use mockall::predicate::eq;
use tempfile::tempdir;

use abstract_files::config::env::Error as EnvError;
use abstract_files::config::{
    resolve_storage_info, AppSettingsReader, ConfigurationReader, EnvConfigurationReader,
    EnvironmentProvider, FileStorageConfig, MACHINE_PREFIXES_KEY,
};
use abstract_files::descriptor::FileDescriptor;
use abstract_files::error::Error;
use abstract_files::text_file::TextFileOptions;

use super::helpers::{read_text, write_text};

mock! {
    #[derive(Debug)]
    Reader {}
    impl ConfigurationReader for Reader {
        fn get_configuration_value(&self, category: &str, key: &str) -> Option<String>;
    }
}

mock! {
    #[derive(Debug)]
    Environment {}
    impl EnvironmentProvider for Environment {
        fn machine_name(&self) -> Option<String>;
    }
}

fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

#[test]
fn test_machine_prefixes_select_keys() {
    let mut reader = AppSettingsReader::new(settings(&[
        (MACHINE_PREFIXES_KEY, "DevBox/Dev.;buildhost/Ci."),
        ("Dev.Storage.Root", "/dev/root"),
        ("Ci.Storage.Root", "/ci/root"),
        ("Storage.Root", "/plain/root"),
    ]));
    let prefixes = reader.machine_prefixes().unwrap();
    assert_eq!(prefixes.get("devbox").map(String::as_str), Some("Dev."));
    assert_eq!(prefixes.get("buildhost").map(String::as_str), Some("Ci."));

    reader.pretend_machine("DEVBOX");
    assert_eq!(reader.current_prefix(), Some("Dev."));
    assert_eq!(
        reader.get_configuration_value("Storage", "Root").as_deref(),
        Some("/dev/root")
    );

    reader.pretend_machine("buildhost");
    assert_eq!(
        reader.get_configuration_value("Storage", "Root").as_deref(),
        Some("/ci/root")
    );

    reader.pretend_machine("unknown-host");
    assert_eq!(reader.current_prefix(), None);
    assert_eq!(
        reader.get_configuration_value("Storage", "Root").as_deref(),
        Some("/plain/root")
    );

    reader.pretend_machine("devbox");
    reader.ignore_machine_sections();
    assert!(reader.machine_prefixes().is_none());
    assert_eq!(
        reader.get_configuration_value("Storage", "Root").as_deref(),
        Some("/plain/root")
    );
    assert_eq!(reader.get_configuration_value("Storage", "Missing"), None);
}

#[test]
fn test_machine_name_comes_from_environment() {
    let mut environment = MockEnvironment::new();
    environment
        .expect_machine_name()
        .times(2)
        .returning(|| Some("BuildHost".to_string()));
    let mut reader = AppSettingsReader::with_environment(
        settings(&[
            (MACHINE_PREFIXES_KEY, "buildhost/Ci."),
            ("Ci.Storage.Root", "/ci/root"),
            ("Storage.Root", "/plain/root"),
        ]),
        Arc::new(environment),
    );
    assert_eq!(reader.current_prefix(), Some("Ci."));
    assert_eq!(
        reader.get_configuration_value("Storage", "Root").as_deref(),
        Some("/ci/root")
    );

    reader.ignore_machine_sections();
    assert_eq!(reader.current_prefix(), None);
    reader.reset();
    assert_eq!(reader.current_prefix(), Some("Ci."));

    let mut anonymous = MockEnvironment::new();
    anonymous.expect_machine_name().times(1).returning(|| None);
    let reader = AppSettingsReader::with_environment(
        settings(&[(MACHINE_PREFIXES_KEY, "buildhost/Ci."), ("Storage.Root", "/plain/root")]),
        Arc::new(anonymous),
    );
    assert_eq!(reader.current_prefix(), None);
    assert_eq!(
        reader.get_configuration_value("Storage", "Root").as_deref(),
        Some("/plain/root")
    );
}

#[test]
fn test_malformed_machine_prefix_sections_are_skipped() {
    let reader = AppSettingsReader::new(settings(&[(
        MACHINE_PREFIXES_KEY,
        "broken; ok / Pre. ;/empty-machine;",
    )]));
    let prefixes = reader.machine_prefixes().unwrap();
    assert_eq!(prefixes.len(), 1);
    assert_eq!(prefixes.get("ok").map(String::as_str), Some("Pre."));
}

#[test]
fn test_settings_from_json() -> eyre::Result<()> {
    let mut reader = AppSettingsReader::from_json_str(
        r#"{"Storage.Kind": "memory", "MachinePrefixes": "worker1/W1."}"#,
    )?;
    reader.ignore_machine_sections();
    assert_eq!(
        reader.get_configuration_value("Storage", "Kind").as_deref(),
        Some("memory")
    );

    assert_matches!(
        AppSettingsReader::from_json_str("{not json"),
        Err(Error::Json(_))
    );
    assert_matches!(
        AppSettingsReader::from_json_str(r#"{"Storage.Retries": 3}"#),
        Err(Error::Json(_))
    );

    let dir = tempdir()?;
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"Storage.RootFolder": "/var/data"}"#)?;
    let mut reader = AppSettingsReader::from_json_file(&path)?;
    reader.ignore_machine_sections();
    assert_eq!(
        reader.get_configuration_value("Storage", "RootFolder").as_deref(),
        Some("/var/data")
    );
    assert_matches!(
        AppSettingsReader::from_json_file(&dir.path().join("missing.json")),
        Err(Error::Io(_))
    );
    Ok(())
}

#[test]
fn test_env_variable_names() {
    let reader = EnvConfigurationReader::with_prefix("app");
    assert_eq!(
        reader.variable_name("Storage", "Root-Folder"),
        "APP_STORAGE_ROOT_FOLDER"
    );
    let reader = EnvConfigurationReader::new();
    assert_eq!(reader.variable_name("storage", "kind"), "STORAGE_KIND");
    assert_eq!(reader.variable_name("", "kind"), "KIND");
}

#[test]
fn test_env_reader_values() -> eyre::Result<()> {
    let reader = EnvConfigurationReader::with_prefix("abstract_files_test");
    env::set_var("ABSTRACT_FILES_TEST_STORAGE_FLUSH_SIZE", "512");
    env::set_var("ABSTRACT_FILES_TEST_STORAGE_KIND", "local");
    env::set_var("ABSTRACT_FILES_TEST_STORAGE_BROKEN_SIZE", "many");

    assert_eq!(
        reader.get_configuration_value("Storage", "Kind").as_deref(),
        Some("local")
    );
    assert_eq!(reader.get_configuration_value("Storage", "Unset"), None);
    assert_eq!(reader.get_parsed::<u32>("Storage", "Flush Size")?, Some(512));
    assert_eq!(reader.get_parsed::<u32>("Storage", "Unset")?, None);
    assert_matches!(
        reader.get_parsed::<u32>("Storage", "Broken.Size"),
        Err(EnvError::ParsingFailed(name, _)) if name == "ABSTRACT_FILES_TEST_STORAGE_BROKEN_SIZE"
    );
    Ok(())
}

#[test]
fn test_storage_info_reference_is_resolved() -> eyre::Result<()> {
    let mut reader = MockReader::new();
    reader
        .expect_get_configuration_value()
        .with(eq("Storage"), eq("Connection"))
        .times(1)
        .returning(|_, _| Some("UseDevelopmentStorage=true".to_string()));
    reader
        .expect_get_configuration_value()
        .with(eq("Storage"), eq("Missing"))
        .times(1)
        .returning(|_, _| None);

    assert_eq!(
        resolve_storage_info("appSettingsKey=Storage.Connection", &reader)?,
        "UseDevelopmentStorage=true"
    );
    assert_matches!(
        resolve_storage_info("appSettingsKey=Storage.Missing", &reader),
        Err(Error::NotFound(_))
    );
    Ok(())
}

#[test]
fn test_storage_info_without_reference() -> eyre::Result<()> {
    // any lookup would fail the test, nothing is expected
    let reader = MockReader::new();
    let connection_string = "AccountName=acc;AccountKey=a2V5;EndpointSuffix=core.windows.net";
    assert_eq!(
        resolve_storage_info(connection_string, &reader)?,
        connection_string
    );
    assert_eq!(
        resolve_storage_info("appSettingsKey=a=b;c=d", &reader)?,
        "appSettingsKey=a=b;c=d"
    );
    assert_matches!(
        resolve_storage_info("appSettingsKey=NoCategory", &reader),
        Err(Error::InvalidArgument(_))
    );
    assert_matches!(
        resolve_storage_info("  ", &reader),
        Err(Error::InvalidArgument(_))
    );
    Ok(())
}

#[test]
fn test_local_storage_from_configuration() -> eyre::Result<()> {
    let root = tempdir()?;
    let mut reader = AppSettingsReader::new(settings(&[
        ("Output.Kind", "Local"),
        ("Output.RootFolder", root.path().to_str().unwrap()),
    ]));
    reader.ignore_machine_sections();

    let config = FileStorageConfig::from_configuration(&reader, "Output")?;
    assert_eq!(config.kind(), "local");
    let storage = config.create()?;
    let file = FileDescriptor::in_container("reports", "daily.txt")?;
    write_text(storage.as_ref(), &file, &TextFileOptions::default(), "ok")?;
    assert_eq!(read_text(storage.as_ref(), &file)?, "ok");
    assert!(root.path().join("reports").join("daily.txt").is_file());
    Ok(())
}

#[test]
fn test_memory_storage_from_configuration() -> eyre::Result<()> {
    let mut reader = AppSettingsReader::new(settings(&[("Scratch.Kind", "memory")]));
    reader.ignore_machine_sections();
    let config = FileStorageConfig::from_configuration(&reader, "Scratch")?;
    assert_eq!(config.kind(), "blob");

    // every storage created from one configuration shares the store
    let file = FileDescriptor::in_container("shared", "note.txt")?;
    write_text(config.create()?.as_ref(), &file, &TextFileOptions::default(), "hi")?;
    assert_eq!(read_text(config.create()?.as_ref(), &file)?, "hi");
    Ok(())
}

#[test]
fn test_incomplete_storage_configuration() {
    let mut reader = AppSettingsReader::new(settings(&[
        ("Bad.Kind", "ftp"),
        ("Rootless.Kind", "local"),
    ]));
    reader.ignore_machine_sections();
    assert_matches!(
        FileStorageConfig::from_configuration(&reader, "Bad"),
        Err(Error::InvalidArgument(_))
    );
    assert_matches!(
        FileStorageConfig::from_configuration(&reader, "Rootless"),
        Err(Error::NotFound(_))
    );
    assert_matches!(
        FileStorageConfig::from_configuration(&reader, "Absent"),
        Err(Error::NotFound(_))
    );
}
