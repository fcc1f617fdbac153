//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! All file I/O lives here; the core never touches the filesystem.

use crate::cli::SnapshotFormat;
use skein_core::{
    ElementsSection, Group, InstanceOptions, InstanceRegistry, LayoutOptions, Skein, SkeinError,
    Snapshot, formats, snapshot_from_bytes, snapshot_to_bytes,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum snapshot file size (500 MB).
///
/// This prevents memory exhaustion from malicious or accidental large
/// files; the envelope decoder enforces the same bound independently.
const MAX_SNAPSHOT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SkeinError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SkeinError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SkeinError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path (resolving symlinks and "..") and ensures it
/// names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, SkeinError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| SkeinError::Io(format!("Invalid file path '{}': {}", path.display(), e)))?;

    if !canonical.is_file() {
        return Err(SkeinError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, SkeinError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        SkeinError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    let filename = path
        .file_name()
        .ok_or_else(|| SkeinError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SNAPSHOT FILE I/O
// =============================================================================

/// Read a snapshot file, sniffing the encoding from its leading bytes.
fn read_snapshot(path: &Path) -> Result<(Snapshot, SnapshotFormat), SkeinError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_SNAPSHOT_FILE_SIZE)?;

    let bytes =
        std::fs::read(&path).map_err(|e| SkeinError::Io(format!("Cannot read file: {}", e)))?;

    if bytes.starts_with(formats::MAGIC_BYTES) {
        Ok((snapshot_from_bytes(&bytes)?, SnapshotFormat::Envelope))
    } else {
        let snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| SkeinError::Deserialization(format!("malformed JSON snapshot: {e}")))?;
        Ok((snapshot, SnapshotFormat::Json))
    }
}

/// Encode a snapshot in the requested format.
fn encode_snapshot(snapshot: &Snapshot, format: SnapshotFormat) -> Result<Vec<u8>, SkeinError> {
    match format {
        SnapshotFormat::Json => {
            let mut bytes = serde_json::to_vec_pretty(snapshot)
                .map_err(|e| SkeinError::Serialization(e.to_string()))?;
            bytes.push(b'\n');
            Ok(bytes)
        }
        SnapshotFormat::Envelope => snapshot_to_bytes(snapshot),
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), SkeinError> {
    let path = validate_output_path(path)?;
    std::fs::write(&path, bytes).map_err(|e| SkeinError::Io(format!("Cannot write file: {}", e)))
}

/// Node/edge counts for one element section.
fn section_counts(section: &ElementsSection) -> (usize, usize) {
    match section {
        ElementsSection::Grouped { nodes, edges } => (nodes.len(), edges.len()),
        ElementsSection::Flat(descs) => {
            let edges = descs
                .iter()
                .filter(|desc| match desc.group {
                    Some(group) => group == Group::Edges,
                    None => desc.data.contains_key("source") && desc.data.contains_key("target"),
                })
                .count();
            (descs.len() - edges, edges)
        }
    }
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Run a snapshot through a headless bootstrap and capture the settled
/// result.
pub async fn cmd_run(
    file: &Path,
    layout: &str,
    output: Option<&Path>,
    format: SnapshotFormat,
) -> Result<(), SkeinError> {
    let (snapshot, _) = read_snapshot(file)?;

    let mut options = InstanceOptions::new().layout(LayoutOptions::named(layout));
    if let Some(elements) = snapshot.elements.clone() {
        options = options.elements(elements);
    }
    if let Some(style) = snapshot.style.clone() {
        options = options.style(style).style_enabled(true);
    }

    let registry = InstanceRegistry::new();
    let cy = Skein::new(options, &registry).await?;

    // Viewport and flags arrive after the bootstrap, through the
    // reconciliation path.
    let settings_only = Snapshot {
        elements: None,
        style: None,
        ..snapshot
    };
    cy.apply(&settings_only)?;

    tracing::info!(
        elements = cy.element_count(),
        layout,
        "instance settled"
    );

    let result = cy.capture();
    let bytes = encode_snapshot(&result, format)?;
    match output {
        Some(path) => write_bytes(path, &bytes)?,
        None => {
            let text = String::from_utf8_lossy(&bytes);
            println!("{}", text.trim_end());
        }
    }
    cy.destroy();
    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Convert a snapshot between JSON and the binary envelope.
pub fn cmd_convert(
    file: &Path,
    output: &Path,
    format: Option<SnapshotFormat>,
) -> Result<(), SkeinError> {
    let (snapshot, read_format) = read_snapshot(file)?;

    // Default to the opposite encoding of the input.
    let format = format.unwrap_or(match read_format {
        SnapshotFormat::Json => SnapshotFormat::Envelope,
        SnapshotFormat::Envelope => SnapshotFormat::Json,
    });

    let bytes = encode_snapshot(&snapshot, format)?;
    write_bytes(output, &bytes)?;
    tracing::info!(?format, output = %output.display(), "snapshot converted");
    Ok(())
}

// =============================================================================
// INFO COMMAND
// =============================================================================

/// Inspect a snapshot file.
pub fn cmd_info(file: &Path, json_mode: bool) -> Result<(), SkeinError> {
    let (snapshot, read_format) = read_snapshot(file)?;

    let (nodes, edges) = snapshot
        .elements
        .as_ref()
        .map_or((0, 0), section_counts);
    let style_rules = snapshot.style.as_ref().map_or(0, |sheet| sheet.len());

    if json_mode {
        let output = serde_json::json!({
            "file": file.to_string_lossy(),
            "format": match read_format {
                SnapshotFormat::Json => "json",
                SnapshotFormat::Envelope => "envelope",
            },
            "nodes": nodes,
            "edges": edges,
            "styleRules": style_rules,
            "zoom": snapshot.zoom,
            "pan": snapshot.pan,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output)
                .map_err(|e| SkeinError::Serialization(e.to_string()))?
        );
    } else {
        println!("Snapshot: {}", file.display());
        println!(
            "  Format:      {}",
            match read_format {
                SnapshotFormat::Json => "json",
                SnapshotFormat::Envelope => "envelope",
            }
        );
        println!("  Nodes:       {}", nodes);
        println!("  Edges:       {}", edges);
        println!("  Style rules: {}", style_rules);
        if let Some(zoom) = snapshot.zoom {
            println!("  Zoom:        {}", zoom);
        }
        if let Some(pan) = snapshot.pan {
            println!("  Pan:         ({}, {})", pan.x, pan.y);
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::ElementDesc;

    fn sample() -> Snapshot {
        Snapshot {
            elements: Some(ElementsSection::Flat(vec![
                ElementDesc::node("a"),
                ElementDesc::node("b"),
                ElementDesc::edge("ab", "a", "b"),
            ])),
            zoom: Some(1.5),
            ..Snapshot::default()
        }
    }

    #[test]
    fn section_counts_infer_flat_edges() {
        let snapshot = sample();
        let (nodes, edges) = snapshot
            .elements
            .as_ref()
            .map_or((0, 0), section_counts);
        assert_eq!((nodes, edges), (2, 1));
    }

    #[test]
    fn sniffing_distinguishes_json_from_envelope() {
        let dir = tempfile::tempdir().expect("tempdir");

        let json_path = dir.path().join("graph.json");
        std::fs::write(
            &json_path,
            serde_json::to_vec(&sample()).expect("serialize"),
        )
        .expect("write json");
        let (_, format) = read_snapshot(&json_path).expect("read json");
        assert_eq!(format, SnapshotFormat::Json);

        let env_path = dir.path().join("graph.skein");
        std::fs::write(
            &env_path,
            snapshot_to_bytes(&sample()).expect("encode"),
        )
        .expect("write envelope");
        let (snapshot, format) = read_snapshot(&env_path).expect("read envelope");
        assert_eq!(format, SnapshotFormat::Envelope);
        assert_eq!(snapshot.zoom, Some(1.5));
    }

    #[test]
    fn convert_defaults_to_the_opposite_encoding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("graph.json");
        std::fs::write(
            &input,
            serde_json::to_vec(&sample()).expect("serialize"),
        )
        .expect("write");

        let output = dir.path().join("graph.skein");
        cmd_convert(&input, &output, None).expect("convert");

        let bytes = std::fs::read(&output).expect("read output");
        assert!(bytes.starts_with(formats::MAGIC_BYTES));
        let restored = snapshot_from_bytes(&bytes).expect("decode");
        assert_eq!(restored.zoom, Some(1.5));
    }

    #[test]
    fn missing_input_reports_io_error() {
        let err = read_snapshot(Path::new("/nonexistent/graph.json")).expect_err("missing");
        assert!(matches!(err, SkeinError::Io(_)));
    }
}
