// Copyright © 2024 Pathway

use assert_matches::assert_matches;

use abstract_files::descriptor::FileDescriptor;
use abstract_files::error::Error;

#[test]
fn test_descriptor_parts() -> eyre::Result<()> {
    let file = FileDescriptor::new("logs", ["2024", "01"], "app.txt")?;
    assert_eq!(file.container(), "logs");
    assert_eq!(file.path_segments(), ["2024", "01"]);
    assert_eq!(file.file_name(), "app.txt");
    assert_eq!(file.to_string(), "logs/2024/01/app.txt");

    let loose = FileDescriptor::in_container("", "loose.txt")?;
    assert!(loose.path_segments().is_empty());
    assert_eq!(loose.to_string(), "loose.txt");
    Ok(())
}

#[test]
fn test_descriptor_needs_file_name() {
    for name in ["", " ", "\t\n"] {
        assert_matches!(
            FileDescriptor::in_container("logs", name),
            Err(Error::InvalidArgument(_))
        );
    }
}

#[test]
fn test_descriptor_equality() -> eyre::Result<()> {
    let segments = vec!["a".to_string(), "b".to_string()];
    assert_eq!(
        FileDescriptor::new("c", segments, "f")?,
        FileDescriptor::new("c", ["a", "b"], "f")?
    );
    assert_ne!(
        FileDescriptor::new("c", ["a"], "f")?,
        FileDescriptor::new("C", ["a"], "f")?
    );
    Ok(())
}
