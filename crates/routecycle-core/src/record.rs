//! Bytes-level parsing of routing-claim records.
//!
//! A record is one pipe-delimited line, `source|destination|claim_id|status_code`.
//! Both the partitioner (pass 1) and the per-bucket graph builder (pass 2)
//! parse with the same function, so a bucket file round-trips to exactly the
//! records that were routed into it.
//!
//! Everything here stays on raw bytes. On inputs of tens of millions of
//! lines, per-line UTF-8 decoding dominates the partition pass, so no field
//! is ever materialized as a `str` until the single winning key is rendered
//! at the very end of the run.

/// Grouping key for a record: `(claim_id, status_code)` as raw bytes.
///
/// Distinct byte sequences are distinct keys; no normalization is applied.
pub type GroupKey = (Box<[u8]>, Box<[u8]>);

/// One parsed input line, borrowing its four fields from the line buffer.
///
/// Only `claim_id` and `status_code` participate in grouping; `source` and
/// `destination` become the endpoints of the record's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Edge source node.
    pub source: &'a [u8],
    /// Edge destination node.
    pub destination: &'a [u8],
    /// First half of the grouping key.
    pub claim_id: &'a [u8],
    /// Second half of the grouping key. The split is bounded at four fields,
    /// so any further `|` bytes on the line remain part of this field.
    pub status_code: &'a [u8],
}

/// The best cycle found within one bucket: the owning key and its length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketResult {
    /// `claim_id` bytes of the winning key.
    pub claim_id: Box<[u8]>,
    /// `status_code` bytes of the winning key.
    pub status_code: Box<[u8]>,
    /// Length of the longest simple cycle in that key's subgraph (≥ 1).
    pub cycle_length: usize,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Strips any trailing `\n` and `\r` bytes from a raw line.
pub fn trim_line_terminator(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

/// Parses one raw line into a [`RawRecord`].
///
/// The line may still carry its terminator; it is stripped first. Returns
/// `None` for empty lines and for lines that do not yield four
/// pipe-separated fields (the malformed-line policy is to skip silently, so
/// callers only count these).
pub fn parse_record(raw_line: &[u8]) -> Option<RawRecord<'_>> {
    let line = trim_line_terminator(raw_line);
    if line.is_empty() {
        return None;
    }

    let mut fields = line.splitn(4, |&b| b == b'|');
    let source = fields.next()?;
    let destination = fields.next()?;
    let claim_id = fields.next()?;
    let status_code = fields.next()?;

    Some(RawRecord {
        source,
        destination,
        claim_id,
        status_code,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
