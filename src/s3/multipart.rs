//! Drives one file through create → upload parts → complete, aborting the
//! remote session if anything fails after it was opened.

use bytes::Bytes;
use std::io::SeekFrom;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, error, info, warn};

use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::s3::partition::{partition, undersized_parts, PartRange, TOTAL_PARTS};
use crate::s3::store::{CompletedPart, MultipartStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Created,
    SessionOpen,
    AllPartsUploaded,
    Completed,
    Aborting,
    Aborted,
}

/// An open upload on the store plus the parts it has accepted so far.
/// `finish` and `cancel` consume it.
#[derive(Debug)]
pub struct UploadSession {
    upload_id: String,
    parts: Vec<CompletedPart>,
}

#[derive(Debug)]
pub struct UploadReport {
    pub upload_id: String,
    pub parts: usize,
    pub bytes: u64,
    pub elapsed: Duration,
}

pub struct MultipartUploader<'a, S: MultipartStore + ?Sized> {
    store: &'a S,
    bucket: &'a str,
    key: &'a str,
    state: UploadState,
}

impl<'a, S: MultipartStore + ?Sized> MultipartUploader<'a, S> {
    pub fn new(store: &'a S, bucket: &'a str, key: &'a str) -> Self {
        Self {
            store,
            bucket,
            key,
            state: UploadState::Created,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    fn transition(&mut self, next: UploadState) {
        debug!(from = ?self.state, to = ?next, key = self.key, "upload state");
        self.state = next;
    }

    /// Uploads the whole file. On success the object exists on the store; on
    /// failure after the session opened, the session has been aborted.
    pub async fn upload_file(&mut self, path: &Path) -> Result<UploadReport> {
        let start_time = Instant::now();
        let mut file = File::open(path)
            .await
            .map_err(|err| Error::local_io(path, err))?;
        let file_size = file
            .metadata()
            .await
            .map_err(|err| Error::local_io(path, err))?
            .len();

        let ranges = partition(file_size, TOTAL_PARTS);
        let undersized = undersized_parts(&ranges);
        if !undersized.is_empty() {
            warn!(
                file_size,
                parts = undersized.len(),
                "parts below the 5MB store minimum, strict stores will reject completion"
            );
        }

        let mut session = self.begin().await?;

        for range in &ranges {
            if let Err(err) = self.upload_one_part(&mut file, path, range, &mut session).await {
                self.cancel(session).await;
                return Err(err);
            }
        }
        self.transition(UploadState::AllPartsUploaded);

        let upload_id = session.upload_id.clone();
        let parts = session.parts.len();
        self.finish(session).await?;

        Ok(UploadReport {
            upload_id,
            parts,
            bytes: file_size,
            elapsed: start_time.elapsed(),
        })
    }

    pub async fn begin(&mut self) -> Result<UploadSession> {
        let upload_id = self
            .store
            .create_multipart_upload(self.bucket, self.key)
            .await
            .map_err(Error::Session)?;
        info!(bucket = self.bucket, key = self.key, %upload_id, "multipart upload created");
        self.transition(UploadState::SessionOpen);
        Ok(UploadSession {
            upload_id,
            parts: Vec::with_capacity(TOTAL_PARTS),
        })
    }

    pub async fn upload_one_part(
        &mut self,
        file: &mut File,
        path: &Path,
        range: &PartRange,
        session: &mut UploadSession,
    ) -> Result<()> {
        let body = read_range(file, range)
            .await
            .map_err(|err| Error::local_io(path, err))?;

        let e_tag = self
            .store
            .upload_part(
                self.bucket,
                self.key,
                &session.upload_id,
                range.part_number,
                body,
            )
            .await
            .map_err(|source| Error::Transfer {
                part_number: range.part_number,
                source,
            })?;
        debug!(
            part_number = range.part_number,
            start = range.start,
            end = range.end,
            %e_tag,
            "part uploaded"
        );

        session.parts.push(CompletedPart {
            part_number: range.part_number,
            e_tag,
        });
        Ok(())
    }

    pub async fn finish(&mut self, session: UploadSession) -> Result<()> {
        let completed = self
            .store
            .complete_multipart_upload(self.bucket, self.key, &session.upload_id, &session.parts)
            .await;
        match completed {
            Ok(()) => {
                info!(key = self.key, upload_id = %session.upload_id, "multipart upload completed");
                self.transition(UploadState::Completed);
                Ok(())
            }
            Err(source) => {
                self.cancel(session).await;
                Err(Error::Completion(source))
            }
        }
    }

    /// Best effort: an abort failure is logged, the caller already has the
    /// error that got it here.
    pub async fn cancel(&mut self, session: UploadSession) {
        self.transition(UploadState::Aborting);
        match self
            .store
            .abort_multipart_upload(self.bucket, self.key, &session.upload_id)
            .await
        {
            Ok(()) => {
                warn!(key = self.key, upload_id = %session.upload_id, "multipart upload aborted")
            }
            Err(err) => {
                error!(key = self.key, upload_id = %session.upload_id, "abort failed: {err}")
            }
        }
        self.transition(UploadState::Aborted);
    }
}

async fn read_range(file: &mut File, range: &PartRange) -> std::io::Result<Bytes> {
    let mut buf = vec![0u8; range.len() as usize];
    file.seek(SeekFrom::Start(range.start)).await?;
    file.read_exact(&mut buf).await?;
    Ok(Bytes::from(buf))
}

/// Uploads `config.file_path` to `config.bucket_name/config.object_name`.
pub async fn multipart_upload<S>(store: &S, config: &UploadConfig) -> Result<UploadReport>
where
    S: MultipartStore + ?Sized,
{
    let mut uploader = MultipartUploader::new(store, &config.bucket_name, &config.object_name);
    let result = uploader.upload_file(&config.file_path).await;
    debug!(state = ?uploader.state(), "upload finished");
    result
}
