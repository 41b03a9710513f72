//! Recording and playback of sensor event streams.
//!
//! Bag files let the daemon run offline against captured input. The
//! format is a fixed-size header (magic, version, time range, count)
//! followed by length-prefixed postcard-encoded [`SensorEvent`] records.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::SensorEvent;

/// Magic bytes at the start of a bag file.
pub const BAG_MAGIC: [u8; 4] = *b"LBAG";

/// Current bag file format version.
pub const BAG_VERSION: u16 = 1;

/// Size of the bag file header in bytes.
pub const HEADER_SIZE: usize = 64;

#[derive(Debug, Error)]
pub enum BagError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Codec(#[from] postcard::Error),
    #[error("Invalid bag file: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, BagError>;

/// Bag file header, padded to [`HEADER_SIZE`] bytes on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BagHeader {
    pub magic: [u8; 4],
    pub version: u16,
    /// Timestamp of the first timestamped event in microseconds
    pub start_time_us: u64,
    /// Timestamp of the last timestamped event in microseconds
    pub end_time_us: u64,
    /// Total number of events in the file
    pub event_count: u64,
}

impl BagHeader {
    pub fn is_valid(&self) -> bool {
        self.magic == BAG_MAGIC
    }

    pub fn duration_us(&self) -> u64 {
        self.end_time_us.saturating_sub(self.start_time_us)
    }
}

/// Writes an event stream to disk.
///
/// Header space is reserved up front; `finish()` seeks back and fills it
/// in, so an unfinished file fails the magic check on open.
pub struct BagRecorder {
    writer: BufWriter<File>,
    event_count: u64,
    start_time_us: Option<u64>,
    end_time_us: u64,
}

impl BagRecorder {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&[0u8; HEADER_SIZE])?;
        Ok(Self {
            writer,
            event_count: 0,
            start_time_us: None,
            end_time_us: 0,
        })
    }

    /// Append one event.
    pub fn record(&mut self, event: &SensorEvent) -> Result<()> {
        if let Some(timestamp) = event.timestamp_us() {
            if self.start_time_us.is_none() {
                self.start_time_us = Some(timestamp);
            }
            self.end_time_us = timestamp;
        }

        let bytes = postcard::to_allocvec(event)?;
        let len = bytes.len() as u32;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&bytes)?;
        self.event_count += 1;
        Ok(())
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Write the final header and close the file.
    pub fn finish(mut self) -> Result<BagHeader> {
        self.writer.flush()?;
        self.writer.seek(SeekFrom::Start(0))?;

        let header = BagHeader {
            magic: BAG_MAGIC,
            version: BAG_VERSION,
            start_time_us: self.start_time_us.unwrap_or(0),
            end_time_us: self.end_time_us,
            event_count: self.event_count,
        };
        let header_bytes = postcard::to_allocvec(&header)?;
        let mut buffer = [0u8; HEADER_SIZE];
        let len = header_bytes.len().min(HEADER_SIZE);
        buffer[..len].copy_from_slice(&header_bytes[..len]);
        self.writer.write_all(&buffer)?;
        self.writer.flush()?;
        Ok(header)
    }
}

/// Reads an event stream back from disk, in recorded order.
pub struct BagPlayer {
    reader: BufReader<File>,
    header: BagHeader,
    events_read: u64,
}

impl BagPlayer {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut buffer = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buffer)?;
        let header: BagHeader = postcard::from_bytes(&buffer)
            .map_err(|e| BagError::InvalidFormat(format!("bad header: {}", e)))?;
        if !header.is_valid() {
            return Err(BagError::InvalidFormat("bad magic bytes".to_string()));
        }
        if header.version != BAG_VERSION {
            return Err(BagError::InvalidFormat(format!(
                "unsupported version {}",
                header.version
            )));
        }

        Ok(Self {
            reader,
            header,
            events_read: 0,
        })
    }

    pub fn header(&self) -> &BagHeader {
        &self.header
    }

    /// Read the next event, or `None` at end of file.
    pub fn next_event(&mut self) -> Result<Option<SensorEvent>> {
        if self.events_read >= self.header.event_count {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        self.reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        let mut payload = vec![0u8; len];
        self.reader.read_exact(&mut payload)?;
        let event: SensorEvent = postcard::from_bytes(&payload)?;
        self.events_read += 1;
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OdometryPose, Pose2D, RangeScan};
    use tempfile::tempdir;

    fn odometry_event(timestamp_us: u64) -> SensorEvent {
        SensorEvent::Odometry(OdometryPose {
            timestamp_us,
            x: 1.0,
            y: 2.0,
            theta: 0.5,
        })
    }

    #[test]
    fn test_record_and_replay() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("run.bag");

        let mut recorder = BagRecorder::create(&path).expect("create");
        recorder
            .record(&SensorEvent::InitialPose(
                crate::core::types::InitialPoseEstimate::new(Pose2D::identity()),
            ))
            .expect("record");
        recorder.record(&odometry_event(100)).expect("record");
        recorder
            .record(&SensorEvent::Scan(RangeScan::new(150, vec![1.0; 360])))
            .expect("record");
        recorder.record(&odometry_event(200)).expect("record");
        let header = recorder.finish().expect("finish");
        assert_eq!(header.event_count, 4);
        assert_eq!(header.start_time_us, 100);
        assert_eq!(header.end_time_us, 200);

        let mut player = BagPlayer::open(&path).expect("open");
        assert_eq!(player.header().duration_us(), 100);

        let mut events = Vec::new();
        while let Some(event) = player.next_event().expect("read") {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert_eq!(events[1], odometry_event(100));
        match &events[2] {
            SensorEvent::Scan(scan) => assert_eq!(scan.ranges.len(), 360),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("not_a.bag");
        std::fs::write(&path, vec![0xAB; 128]).expect("write");
        assert!(matches!(
            BagPlayer::open(&path),
            Err(BagError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_open_rejects_unfinished_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("partial.bag");
        let mut recorder = BagRecorder::create(&path).expect("create");
        recorder.record(&odometry_event(1)).expect("record");
        // Drop without finish(); the header stays zeroed.
        drop(recorder);
        assert!(BagPlayer::open(&path).is_err());
    }
}
