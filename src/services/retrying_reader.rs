use std::sync::Arc;

use futures::StreamExt;

use crate::{
    domain::{
        errors::StorageError,
        models::ReadOptions,
        value_objects::ObjectKey,
    },
    ports::storage::{ByteStream, ObjectBackend, ReadRequest},
};

/// Stream `key` from `backend`, retrying failed attempts.
///
/// Nothing happens until the returned stream is polled. A failure, whether
/// opening the object or halfway through its body, is retried after
/// `options.try_freq()` until `options.tries()` attempts have been made.
/// Retries resume at the first byte not yet delivered and are pinned to the
/// ETag of the first response, so the consumer sees every byte exactly once.
/// When attempts run out the stream yields a single
/// [`StorageError::ReadFailed`] and ends.
pub fn read_with_retry(
    backend: Arc<dyn ObjectBackend>,
    key: ObjectKey,
    options: ReadOptions,
) -> ByteStream {
    let stream = async_stream::stream! {
        let bucket = backend.bucket().to_string();
        let mut attempt: u32 = 0;
        let mut delivered: u64 = 0;
        let mut e_tag: Option<String> = None;
        let mut total_size: Option<u64> = None;

        'attempts: loop {
            attempt += 1;
            let request = ReadRequest::resume(delivered, e_tag.clone());

            let failure = match backend.open_read(&key, request).await {
                Ok(read) => {
                    if e_tag.is_none() {
                        e_tag = read.e_tag;
                    }
                    if total_size.is_none() {
                        total_size = read.size;
                    }

                    let mut body = read.stream;
                    let mut failure = None;
                    while let Some(chunk) = body.next().await {
                        match chunk {
                            Ok(bytes) => {
                                delivered += bytes.len() as u64;
                                yield Ok(bytes);
                            }
                            Err(err) => {
                                failure = Some(err);
                                break;
                            }
                        }
                    }

                    match failure {
                        Some(err) => err,
                        None => break 'attempts,
                    }
                }
                Err(err) => err,
            };

            // The body broke after its last byte; nothing is missing.
            if total_size.is_some_and(|size| delivered >= size) {
                tracing::debug!(key = %key, bucket = %bucket, error = %failure, "Ignoring failure after complete body");
                break 'attempts;
            }

            if matches!(failure, StorageError::ObjectModified { .. }) {
                tracing::error!(key = %key, bucket = %bucket, delivered, "Object changed during read");
                yield Err(failure);
                break 'attempts;
            }

            if attempt >= options.tries() {
                tracing::error!(
                    key = %key,
                    bucket = %bucket,
                    attempts = attempt,
                    error = %failure,
                    "Giving up on read"
                );
                yield Err(StorageError::ReadFailed {
                    bucket: bucket.clone(),
                    key: key.to_string(),
                    attempts: attempt,
                    message: failure.to_string(),
                });
                break 'attempts;
            }

            tracing::warn!(
                key = %key,
                bucket = %bucket,
                attempt,
                remaining = options.tries() - attempt,
                delivered,
                error = %failure,
                "Read failed, retrying"
            );
            tokio::time::sleep(options.try_freq()).await;
        }
    };

    Box::pin(stream)
}
