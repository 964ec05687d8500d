use blobpull_lib::config::Config;
use blobpull_lib::paths::{SegmentRename, TransformRules};
use blobpull_lib::storage::OpendalBlobStore;
use eyre::Result;
use opendal::Operator;
use opendal::services::Memory;
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("blobpull_lib=debug")
        .try_init();
}

pub fn create_test_config() -> Config {
    Config {
        output: None,
        container: None,
        delimiter: Some(";".to_string()),
        transform: TransformRules {
            separator_aliases: vec!["\\".to_string()],
            escape_chars: vec!["\"".to_string()],
            segment_renames: vec![SegmentRename {
                from: "OriginalFiler".to_string(),
                to: "OriginalFiles".to_string(),
            }],
        },
    }
}

/// Temporary directory holding `config.json` built from [`create_test_config`].
pub fn setup_test_environment() -> Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;

    let config = create_test_config();
    let config_path = temp_dir.path().join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    Ok(temp_dir)
}

pub fn write_list_file(dir: &TempDir, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// A store with one in-memory operator per container, seeded with
/// `(container, blob_path, contents)` triples.
pub async fn memory_store(blobs: &[(&str, &str, &[u8])]) -> Result<OpendalBlobStore> {
    let mut operators: HashMap<String, Operator> = HashMap::new();
    for (container, blob_path, contents) in blobs {
        let op = match operators.get(*container) {
            Some(op) => op.clone(),
            None => {
                let op = Operator::new(Memory::default())?.finish();
                operators.insert(container.to_string(), op.clone());
                op
            }
        };
        op.write(blob_path, contents.to_vec()).await?;
    }
    Ok(OpendalBlobStore::from_operators(operators))
}
