//! Binary layout of a saved world.
//!
//! All values are little-endian and there are no length prefixes or magic
//! bytes:
//!
//! - 24-byte header: observer position (3 x `f32`), camera pitch (`f32`),
//!   player yaw (`f32`), generation seed (`i32`)
//! - chunk records until end of file: coordinate (3 x `i32`) followed by
//!   `chunk_size³` block-type bytes in canonical grid order
//!
//! The chunk size is not stored. A file is decoded against the current
//! settings and rejected if its records do not fit them.

use std::collections::HashSet;

use cgmath::Point3;

use super::SaveError;
use crate::engine_state::{
    voxels::chunk::{coordinate::ChunkCoordinate, settings::ChunkSettings, voxel_grid::VoxelGrid},
    ObserverPose,
};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 24;

/// Size of the coordinate that starts every chunk record.
const COORDINATE_SIZE: usize = 12;

/// Largest chunk size considered when diagnosing a size mismatch.
const MAX_CHUNK_SIZE: u32 = 256;

/// Size of one chunk record for a given chunk size.
pub fn record_size(chunk_size: u32) -> usize {
    let size = chunk_size as usize;
    COORDINATE_SIZE + size * size * size
}

/// Everything a save file holds.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveGame {
    /// Observer pose at the time of saving
    pub observer: ObserverPose,
    /// Generation seed of the saved world
    pub seed: i32,
    /// Chunk grids, written in this order
    pub chunks: Vec<(ChunkCoordinate, VoxelGrid)>,
}

impl SaveGame {
    /// Serializes the save into a single buffer.
    pub fn encode(&self) -> Vec<u8> {
        let body: usize = self
            .chunks
            .iter()
            .map(|(_, grid)| COORDINATE_SIZE + grid.as_bytes().len())
            .sum();
        let mut bytes = Vec::with_capacity(HEADER_SIZE + body);

        let ObserverPose {
            position,
            camera_pitch,
            player_yaw,
        } = self.observer;
        for value in [position.x, position.y, position.z, camera_pitch, player_yaw] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes.extend_from_slice(&self.seed.to_le_bytes());

        for (coordinate, grid) in &self.chunks {
            for value in [coordinate.x, coordinate.y, coordinate.z] {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
            bytes.extend_from_slice(grid.as_bytes());
        }

        bytes
    }

    /// Decodes and validates a save against the current chunk settings.
    ///
    /// Nothing is returned unless the whole buffer decodes: the header is
    /// complete and finite, the records divide the remaining bytes exactly,
    /// every block type is air or in the palette, no coordinate repeats and
    /// every chunk, the observer's included, lies inside the `i32` block space.
    pub fn decode(bytes: &[u8], settings: &ChunkSettings) -> Result<Self, SaveError> {
        let mut reader = ByteReader::new(bytes);

        let (observer, seed) = read_header(&mut reader).ok_or_else(|| SaveError::CorruptSaveData {
            reason: format!(
                "header needs {HEADER_SIZE} bytes, found {}",
                bytes.len()
            ),
        })?;
        check_observer(&observer, settings.chunk_size)?;

        let body = reader.rest();
        if body.len() % record_size(settings.chunk_size) != 0 {
            return Err(diagnose_partial_body(body, settings));
        }
        let chunks = read_records(body, settings.chunk_size, settings)?;

        Ok(SaveGame {
            observer,
            seed,
            chunks,
        })
    }
}

/// Rejects observer poses the world cannot stream around.
fn check_observer(observer: &ObserverPose, chunk_size: u32) -> Result<(), SaveError> {
    let ObserverPose {
        position,
        camera_pitch,
        player_yaw,
    } = *observer;
    let finite = [position.x, position.y, position.z, camera_pitch, player_yaw]
        .iter()
        .all(|value| value.is_finite());
    if !finite {
        return Err(SaveError::CorruptSaveData {
            reason: format!("observer pose {observer:?} is not finite"),
        });
    }

    let center = ChunkCoordinate::from_world_position(position, chunk_size);
    if !center.is_addressable(chunk_size) {
        return Err(SaveError::CorruptSaveData {
            reason: format!("observer position {position:?} lies outside the block space"),
        });
    }
    Ok(())
}

/// Decodes a record area that holds a whole number of `chunk_size` records.
fn read_records(
    body: &[u8],
    chunk_size: u32,
    settings: &ChunkSettings,
) -> Result<Vec<(ChunkCoordinate, VoxelGrid)>, SaveError> {
    let size = chunk_size as usize;
    let cells_per_chunk = size * size * size;
    let mut reader = ByteReader::new(body);
    let mut chunks = Vec::with_capacity(body.len() / record_size(chunk_size));
    let mut seen = HashSet::new();

    while reader.remaining() > 0 {
        let (coordinate, cells) = read_record(&mut reader, cells_per_chunk).ok_or_else(|| {
            SaveError::CorruptSaveData {
                reason: format!("chunk record cut short at byte {}", HEADER_SIZE + reader.offset),
            }
        })?;

        if !coordinate.is_addressable(chunk_size) {
            return Err(SaveError::CorruptSaveData {
                reason: format!("chunk {coordinate:?} lies outside the block space"),
            });
        }
        if !seen.insert(coordinate) {
            return Err(SaveError::DuplicateChunk(coordinate));
        }
        if let Some(&block_type) = cells.iter().find(|&&t| !settings.is_known_type(t)) {
            return Err(SaveError::InvalidBlockType {
                coordinate,
                block_type,
            });
        }

        let grid = VoxelGrid::from_cells(size, cells.to_vec()).ok_or_else(|| {
            SaveError::CorruptSaveData {
                reason: format!("chunk {coordinate:?} has the wrong number of cells"),
            }
        })?;
        chunks.push((coordinate, grid));
    }

    Ok(chunks)
}

/// Explains why the record area is not a whole number of records.
///
/// Another chunk size is only blamed when the whole area decodes cleanly as
/// records of that size. Anything else is reported as corruption.
fn diagnose_partial_body(body: &[u8], settings: &ChunkSettings) -> SaveError {
    let chunk_size = settings.chunk_size;
    let found = (1..=MAX_CHUNK_SIZE)
        .filter(|&candidate| candidate != chunk_size)
        .filter(|&candidate| body.len() % record_size(candidate) == 0)
        .find(|&candidate| read_records(body, candidate, settings).is_ok());

    match found {
        Some(found) => SaveError::IncompatibleChunkSize {
            expected: chunk_size,
            found,
        },
        None => SaveError::CorruptSaveData {
            reason: format!(
                "{} bytes of chunk data is not a whole number of {}-byte records, \
                 the file is truncated or damaged",
                body.len(),
                record_size(chunk_size)
            ),
        },
    }
}

fn read_header(reader: &mut ByteReader) -> Option<(ObserverPose, i32)> {
    let position = Point3::new(reader.read_f32()?, reader.read_f32()?, reader.read_f32()?);
    let camera_pitch = reader.read_f32()?;
    let player_yaw = reader.read_f32()?;
    let seed = reader.read_i32()?;

    Some((
        ObserverPose {
            position,
            camera_pitch,
            player_yaw,
        },
        seed,
    ))
}

fn read_record<'a>(
    reader: &mut ByteReader<'a>,
    cells: usize,
) -> Option<(ChunkCoordinate, &'a [u8])> {
    let coordinate = ChunkCoordinate::new(reader.read_i32()?, reader.read_i32()?, reader.read_i32()?);
    Some((coordinate, reader.take(cells)?))
}

/// Forward-only cursor over a byte slice.
struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Everything not read yet, consuming it.
    fn rest(&mut self) -> &'a [u8] {
        let bytes = self.bytes;
        let rest = &bytes[self.offset..];
        self.offset = self.bytes.len();
        rest
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(len)?;
        let slice = self.bytes.get(self.offset..end)?;
        self.offset = end;
        Some(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }

    fn read_f32(&mut self) -> Option<f32> {
        self.take_array().map(f32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take_array().map(i32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(chunk_size: u32) -> ChunkSettings {
        ChunkSettings {
            chunk_size,
            ..ChunkSettings::default()
        }
    }

    fn single_chunk_save() -> SaveGame {
        SaveGame {
            observer: ObserverPose {
                position: Point3::new(1.5, 30.0, -2.25),
                camera_pitch: -0.3,
                player_yaw: 1.25,
            },
            seed: -77,
            chunks: vec![(ChunkCoordinate::new(0, 0, 0), VoxelGrid::filled(4, 1))],
        }
    }

    #[test]
    fn layout_is_little_endian_without_prefixes() {
        let bytes = single_chunk_save().encode();

        assert_eq!(bytes.len(), HEADER_SIZE + record_size(4));
        assert_eq!(&bytes[0..4], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &(-0.3f32).to_le_bytes());
        assert_eq!(&bytes[20..24], &(-77i32).to_le_bytes());
        assert_eq!(&bytes[24..36], &[0u8; 12]);
        assert!(bytes[36..].iter().all(|&b| b == 1));
    }

    #[test]
    fn decode_restores_everything() {
        let mut save = single_chunk_save();
        let mut grid = VoxelGrid::empty(4);
        grid.set(Point3::new(3, 0, 2), 4);
        save.chunks.push((ChunkCoordinate::new(-1, 2, 5), grid));

        let decoded = SaveGame::decode(&save.encode(), &settings(4)).expect("valid save");
        assert_eq!(decoded, save);
    }

    #[test]
    fn header_only_file_has_no_chunks() {
        let save = SaveGame {
            chunks: Vec::new(),
            ..single_chunk_save()
        };
        let decoded = SaveGame::decode(&save.encode(), &settings(4)).expect("valid save");
        assert!(decoded.chunks.is_empty());
        assert_eq!(decoded.seed, -77);
    }

    #[test]
    fn truncated_files_are_corrupt() {
        let bytes = single_chunk_save().encode();

        let short_header = SaveGame::decode(&bytes[..10], &settings(4));
        assert!(matches!(short_header, Err(SaveError::CorruptSaveData { .. })));

        let short_record = SaveGame::decode(&bytes[..bytes.len() - 1], &settings(4));
        assert!(matches!(short_record, Err(SaveError::CorruptSaveData { .. })));
    }

    #[test]
    fn other_chunk_sizes_are_reported() {
        let bytes = single_chunk_save().encode();
        let result = SaveGame::decode(&bytes, &settings(2));
        assert!(matches!(
            result,
            Err(SaveError::IncompatibleChunkSize {
                expected: 2,
                found: 4
            })
        ));
    }

    #[test]
    fn cut_records_are_not_blamed_on_another_size() {
        let mut save = single_chunk_save();
        save.chunks.push((ChunkCoordinate::new(1, 0, 0), VoxelGrid::filled(4, 1)));
        let bytes = save.encode();
        let cut = &bytes[..bytes.len() - 12];
        assert_eq!(cut.len() - HEADER_SIZE, 140);
        assert_eq!(140 % record_size(2), 0);

        let result = SaveGame::decode(cut, &settings(4));
        assert!(matches!(result, Err(SaveError::CorruptSaveData { .. })));
    }

    #[test]
    fn unreachable_observers_are_corrupt() {
        for position in [
            Point3::new(1.0e30, 0.0, 0.0),
            Point3::new(0.0, f32::NAN, 0.0),
            Point3::new(0.0, 0.0, f32::NEG_INFINITY),
        ] {
            let mut save = single_chunk_save();
            save.observer.position = position;
            save.chunks.clear();

            let result = SaveGame::decode(&save.encode(), &settings(4));
            assert!(
                matches!(result, Err(SaveError::CorruptSaveData { .. })),
                "{position:?} was accepted"
            );
        }

        let mut save = single_chunk_save();
        save.observer.player_yaw = f32::INFINITY;
        let result = SaveGame::decode(&save.encode(), &settings(4));
        assert!(matches!(result, Err(SaveError::CorruptSaveData { .. })));
    }

    #[test]
    fn chunks_beyond_the_block_space_are_corrupt() {
        let mut save = single_chunk_save();
        save.chunks[0].0 = ChunkCoordinate::new(i32::MAX, 0, 0);

        let result = SaveGame::decode(&save.encode(), &settings(4));
        assert!(matches!(result, Err(SaveError::CorruptSaveData { .. })));
    }

    #[test]
    fn unknown_block_types_are_rejected() {
        let mut bytes = single_chunk_save().encode();
        let last = bytes.len() - 1;
        bytes[last] = 200;

        let result = SaveGame::decode(&bytes, &settings(4));
        assert!(matches!(
            result,
            Err(SaveError::InvalidBlockType { block_type: 200, .. })
        ));
    }

    #[test]
    fn repeated_coordinates_are_rejected() {
        let mut save = single_chunk_save();
        save.chunks.push((ChunkCoordinate::new(0, 0, 0), VoxelGrid::empty(4)));

        let result = SaveGame::decode(&save.encode(), &settings(4));
        assert!(matches!(result, Err(SaveError::DuplicateChunk(c)) if c == ChunkCoordinate::new(0, 0, 0)));
    }
}
