// ── Snapshot archive ──
//
// A tar archive holding one `inventory_<host>` member (the snapshot as
// pretty JSON) and one member per staged image file. Older archives were
// gzip-compressed; reading detects that from the magic bytes.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::SnapshotDocument;

/// Prefix of the member that holds the snapshot document.
pub const INVENTORY_PREFIX: &str = "inventory_";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

fn archive_error(message: impl Into<String>) -> CoreError {
    CoreError::Archive {
        message: message.into(),
    }
}

/// Member names are plain file names; anything that could escape the
/// staging directory is refused.
fn check_member_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(archive_error(format!("refusing archive member {name:?}")));
    }
    Ok(())
}

/// Write `document` and every image it lists from `staging` to `path`.
pub fn write_archive(
    path: &Path,
    document: &SnapshotDocument,
    host: &str,
    staging: &Path,
) -> Result<(), CoreError> {
    let member = format!("{INVENTORY_PREFIX}{}", host.replace(['/', '\\'], "_"));
    check_member_name(&member)?;

    // Through `Value` so object keys come out sorted.
    let json = serde_json::to_vec_pretty(&serde_json::to_value(document)?)?;

    let mut builder = tar::Builder::new(File::create(path)?);
    let mut header = tar::Header::new_ustar();
    let size = u64::try_from(json.len()).map_err(|_| archive_error("document too large"))?;
    header.set_size(size);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, &member, json.as_slice())?;

    for image in document.images.iter().flatten() {
        check_member_name(&image.name)?;
        let source = staging.join(&image.name);
        debug!(image = %image.name, "adding image to archive");
        let mut file = File::open(&source).map_err(|e| {
            archive_error(format!("staged image {} unreadable: {e}", source.display()))
        })?;
        builder.append_file(&image.name, &mut file)?;
    }

    builder.into_inner()?;
    info!(path = %path.display(), "archive written");
    Ok(())
}

fn open_archive(path: &Path) -> Result<tar::Archive<Box<dyn Read>>, CoreError> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let gzipped = match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e.into()),
    };
    file.seek(SeekFrom::Start(0))?;

    let reader: Box<dyn Read> = if gzipped {
        debug!("archive is gzip-compressed");
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(tar::Archive::new(reader))
}

/// Read the raw snapshot document from `path`, extracting every other
/// member into `staging`.
///
/// The document is returned untyped so it can be normalized before
/// deserialization.
pub fn read_archive(path: &Path, staging: &Path) -> Result<Value, CoreError> {
    std::fs::create_dir_all(staging)?;
    let mut archive = open_archive(path)?;
    let mut document = None;

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().into_owned();
        check_member_name(&name)?;

        if document.is_none() && name.starts_with(INVENTORY_PREFIX) {
            debug!(member = %name, "reading snapshot document");
            let mut text = String::new();
            entry.read_to_string(&mut text)?;
            document = Some(serde_json::from_str(&text)?);
        } else {
            let mut out = File::create(staging.join(&name))?;
            io::copy(&mut entry, &mut out)?;
        }
    }

    document.ok_or_else(|| {
        CoreError::invalid_snapshot(format!(
            "{} has no {INVENTORY_PREFIX}* member",
            path.display()
        ))
    })
}
