//! Builds a [`ContextDescriptor`] from a file path, an in-memory blob, or a
//! multi-file bundle.
//!
//! Grounded on the stat-then-dispatch pattern of [`crate::io::FileReader`]:
//! full content is read (and fully estimated) under a 16 MiB threshold;
//! above it, only a bounded prefix (64 KiB) is sniffed and read, and the
//! token estimate is scaled by the size ratio rather than computed exactly.

use std::path::Path;

use crate::error::Error;
use crate::estimator::{estimate_tokens_bytes, is_binary_looking};
use crate::io::FileReader;
use crate::model::{ContextDescriptor, DataKind, Origin};

/// Inputs larger than this are sampled rather than read in full when
/// estimating tokens and sniffing structure.
const FULL_READ_THRESHOLD_BYTES: u64 = 16 * 1024 * 1024;

/// Size of the bounded prefix read for sniffing and sampled estimation.
const SNIFF_PREFIX_BYTES: usize = 64 * 1024;

const CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "go", "java", "c", "cpp", "rb", "cc", "h", "hpp",
];

/// Builds a descriptor for a single file on disk.
///
/// # Errors
///
/// Returns [`Error::InputUnreadable`] if the file cannot be stat'd or
/// read.
pub fn describe_file(path: &Path) -> Result<ContextDescriptor, Error> {
    let reader = FileReader::open(path)?;
    let total_bytes = reader.size();

    if total_bytes == 0 {
        return Ok(ContextDescriptor {
            origin: Origin::FilePath(path.to_path_buf()),
            total_bytes: 0,
            estimated_tokens: 0,
            data_kind: DataKind::Unknown,
            files_count: 1,
            has_structure: false,
        });
    }

    let extension_kind = sniff_extension(path);

    let (data_kind, has_structure, estimated_tokens) =
        if total_bytes <= FULL_READ_THRESHOLD_BYTES {
            let bytes = reader.read_to_bytes()?;
            let (kind, structured) = sniff_content(extension_kind, &bytes);
            let tokens = estimate_tokens_bytes(&bytes);
            (kind, structured, tokens)
        } else {
            let prefix = reader.read_prefix(SNIFF_PREFIX_BYTES)?;
            let (kind, structured) = sniff_content(extension_kind, &prefix);
            let prefix_tokens = estimate_tokens_bytes(&prefix);
            let ratio = total_bytes as f64 / prefix.len().max(1) as f64;
            let scaled = (prefix_tokens as f64 * ratio).round() as u64;
            (kind, structured, scaled)
        };

    Ok(ContextDescriptor {
        origin: Origin::FilePath(path.to_path_buf()),
        total_bytes,
        estimated_tokens,
        data_kind,
        files_count: 1,
        has_structure,
    })
}

/// Builds a descriptor for an in-memory blob.
#[must_use]
pub fn describe_content(content: &str) -> ContextDescriptor {
    let bytes = content.as_bytes();
    if bytes.is_empty() {
        return ContextDescriptor {
            origin: Origin::InMemory,
            total_bytes: 0,
            estimated_tokens: 0,
            data_kind: DataKind::Unknown,
            files_count: 1,
            has_structure: false,
        };
    }

    let total_bytes = bytes.len() as u64;
    let (data_kind, has_structure, estimated_tokens) = if total_bytes <= FULL_READ_THRESHOLD_BYTES
    {
        let (kind, structured) = sniff_content(None, bytes);
        (kind, structured, estimate_tokens_bytes(bytes))
    } else {
        let prefix = &bytes[..SNIFF_PREFIX_BYTES.min(bytes.len())];
        let (kind, structured) = sniff_content(None, prefix);
        let prefix_tokens = estimate_tokens_bytes(prefix);
        let ratio = total_bytes as f64 / prefix.len().max(1) as f64;
        (kind, structured, (prefix_tokens as f64 * ratio).round() as u64)
    };

    ContextDescriptor {
        origin: Origin::InMemory,
        total_bytes,
        estimated_tokens,
        data_kind,
        files_count: 1,
        has_structure,
    }
}

/// Builds a descriptor for a multi-file bundle. Per-file size/kind
/// sniffing happens later in `file-parallel` decomposition; the
/// descriptor only needs aggregate size/count for routing.
///
/// # Errors
///
/// Returns [`Error::InputUnreadable`] if any file cannot be stat'd.
pub fn describe_files(paths: &[std::path::PathBuf]) -> Result<ContextDescriptor, Error> {
    let mut total_bytes: u64 = 0;
    let mut estimated_tokens: u64 = 0;
    for path in paths {
        let d = describe_file(path)?;
        total_bytes += d.total_bytes;
        estimated_tokens += d.estimated_tokens;
    }
    Ok(ContextDescriptor {
        origin: Origin::InMemory,
        total_bytes,
        estimated_tokens,
        data_kind: DataKind::Unknown,
        files_count: paths.len().max(1),
        has_structure: false,
    })
}

fn sniff_extension(path: &Path) -> Option<DataKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(DataKind::Json),
        "csv" => Some(DataKind::Csv),
        "log" => Some(DataKind::Log),
        other if CODE_EXTENSIONS.contains(&other) => Some(DataKind::Code),
        _ => None,
    }
}

/// Sniffs `dataKind` and structural confirmation from a bounded prefix.
/// `extension_hint` takes priority; falls back to content sniffing when
/// absent or unrecognised.
fn sniff_content(extension_hint: Option<DataKind>, prefix: &[u8]) -> (DataKind, bool) {
    if is_binary_looking(prefix) {
        return (DataKind::Binary, false);
    }
    let Ok(text) = std::str::from_utf8(prefix) else {
        return (DataKind::Binary, false);
    };
    let trimmed = text.trim_start();

    if let Some(kind) = extension_hint {
        let structured = match kind {
            DataKind::Json => looks_like_json(trimmed),
            DataKind::Csv => looks_like_csv(text),
            DataKind::Log => looks_like_log(text),
            DataKind::Code => true,
            _ => false,
        };
        return (kind, structured);
    }

    if looks_like_json(trimmed) {
        return (DataKind::Json, true);
    }
    if looks_like_csv(text) {
        return (DataKind::Csv, true);
    }
    if looks_like_log(text) {
        return (DataKind::Log, true);
    }
    (DataKind::Text, false)
}

fn looks_like_json(trimmed: &str) -> bool {
    matches!(trimmed.chars().next(), Some('{' | '['))
}

fn looks_like_csv(text: &str) -> bool {
    let mut lines = text.lines().take(2);
    let Some(first) = lines.next() else {
        return false;
    };
    let Some(second) = lines.next() else {
        return first.contains(',');
    };
    let first_fields = first.split(',').count();
    first_fields > 1 && first_fields == second.split(',').count()
}

fn looks_like_log(text: &str) -> bool {
    let Some(first_line) = text.lines().next() else {
        return false;
    };
    // A timestamp-prefixed line starts with four digits (a year) followed
    // by a date/time separator, e.g. "2024-01-02T03:04:05" or "2024-01-02 ...".
    let mut chars = first_line.chars();
    let year_digits = (&mut chars).take(4).filter(char::is_ascii_digit).count();
    year_digits == 4 && matches!(chars.next(), Some('-' | '/'))
}
