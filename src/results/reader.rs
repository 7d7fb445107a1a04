//! Streamed page reads

use crate::multipart::Record;
use crate::transport::{PartReader, StreamIndex, TransportResult};

/// Read one page of a streamed result.
///
/// Each record gets its absolute position in the result set as its index.
pub async fn load_page(
    reader: &dyn PartReader,
    index: &StreamIndex,
    page: usize,
    page_size: usize,
) -> TransportResult<Vec<Record>> {
    let start = page * page_size;
    let parts = reader.read_parts(index.directory(), start, page_size).await?;

    Ok(parts
        .into_iter()
        .enumerate()
        .map(|(offset, record)| record.with_index(start + offset))
        .collect())
}
