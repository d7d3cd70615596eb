//! Open → transfer → close compositions shared by every adapter.

use tfsgate_client::{ChecksumAlgorithm, FileName, FileStat, OpenMode, RemoteFile, Session};
use tracing::{info, warn};

use crate::{TransferEngine, TransferError};

/// Stores `data` as a new remote file and returns its assigned name.
///
/// The file only exists once `close` succeeds; a failed commit is a
/// [`TransferError::FinalizeFailure`] even though every byte was accepted.
pub fn put<S, C>(
    session: &S,
    data: &[u8],
    suffix: Option<&str>,
    engine: &TransferEngine<C>,
) -> Result<FileName, TransferError>
where
    S: Session + ?Sized,
    C: ChecksumAlgorithm,
{
    let mut file = session
        .open(None, suffix, OpenMode::Write)
        .map_err(TransferError::Open)?;

    let written = engine
        .write(&mut file, data)
        .map_err(|e| release(&mut file, e))?;

    let name = file.close().map_err(|source| {
        warn!(size = written, error = %source, "commit of written file failed");
        TransferError::FinalizeFailure { source }
    })?;

    info!(%name, size = written, "remote file stored");
    Ok(name)
}

/// Fetches and verifies the full contents of `name`.
pub fn get<S, C>(
    session: &S,
    name: &FileName,
    suffix: Option<&str>,
    engine: &TransferEngine<C>,
) -> Result<Vec<u8>, TransferError>
where
    S: Session + ?Sized,
    C: ChecksumAlgorithm,
{
    let mut file = session
        .open(Some(name), suffix, OpenMode::Read)
        .map_err(TransferError::Open)?;

    let data = engine
        .read_file(&mut file)
        .map_err(|e| release(&mut file, e))?;

    file.close().map_err(|e| {
        warn!(%name, error = %e, "close after read failed");
        TransferError::CloseFailure(e)
    })?;

    info!(%name, size = data.len(), "remote file fetched");
    Ok(data)
}

/// Opens `name` for reading only long enough to fetch its metadata.
pub fn stat<S>(session: &S, name: &FileName, suffix: Option<&str>) -> Result<FileStat, TransferError>
where
    S: Session + ?Sized,
{
    let mut file = session
        .open(Some(name), suffix, OpenMode::Read)
        .map_err(TransferError::Open)?;

    let stat = match file.stat() {
        Ok(stat) if stat.size > 0 => stat,
        Ok(stat) => {
            let err = TransferError::InvalidMetadata { size: stat.size };
            return Err(release(&mut file, err));
        }
        Err(e) => return Err(release(&mut file, TransferError::Stat(e))),
    };

    file.close().map_err(TransferError::CloseFailure)?;
    Ok(stat)
}

/// Aborts `file` after a failed transfer and hands `err` back.
///
/// Aborting never commits, so a failed write leaves no partial file.
fn release<F: RemoteFile + ?Sized>(file: &mut F, err: TransferError) -> TransferError {
    if let Err(e) = file.abort() {
        warn!(error = %e, "releasing handle after failed transfer failed");
    }
    err
}
