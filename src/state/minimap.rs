use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::codec::{OtmmReader, OtmmWriter, Position, LAYER_COUNT};
use crate::config::MinimapConfig;
use crate::error::{Error, Result};
use crate::renderer::TextureCache;
use super::block::{local_offset, BlockKey, MinimapBlock};
use super::index::{SharedBlock, SpatialIndex};
use super::marker::{Marker, MarkerStore};
use super::tile::{MinimapTile, TileInfo};

/// Outcome of reading an OTMM stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub description: String,
    pub blocks: usize,
    /// Reading stopped at a corrupt or truncated record
    pub truncated: bool,
}

pub(crate) fn read_block(block: &SharedBlock) -> RwLockReadGuard<'_, MinimapBlock> {
    block.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_block(block: &SharedBlock) -> RwLockWriteGuard<'_, MinimapBlock> {
    block.write().unwrap_or_else(PoisonError::into_inner)
}

/// Sparse minimap cache over every elevation layer.
///
/// One lock guards the per-layer indexes. It is only held long enough to
/// find, insert or copy out block handles. Block contents are locked only
/// after it is released.
#[derive(Debug)]
pub struct Minimap {
    layers: Mutex<Vec<SpatialIndex>>,
    markers: RwLock<MarkerStore>,
    config: MinimapConfig,
}

impl Default for Minimap {
    fn default() -> Self {
        Self::new(MinimapConfig::default())
    }
}

impl Minimap {
    pub fn new(config: MinimapConfig) -> Self {
        Self {
            layers: Mutex::new((0..LAYER_COUNT).map(|_| SpatialIndex::new()).collect()),
            markers: RwLock::new(MarkerStore::new()),
            config,
        }
    }

    pub fn config(&self) -> &MinimapConfig {
        &self.config
    }

    pub(crate) fn layers(&self) -> MutexGuard<'_, Vec<SpatialIndex>> {
        self.layers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn markers(&self) -> RwLockReadGuard<'_, MarkerStore> {
        self.markers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn markers_mut(&self) -> RwLockWriteGuard<'_, MarkerStore> {
        self.markers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every block, releasing their textures
    pub fn clean(&self, textures: &mut dyn TextureCache) {
        let drained: Vec<SharedBlock> = self.layers().iter_mut().flat_map(|l| l.drain()).collect();
        for block in &drained {
            write_block(block).clean(textures);
        }
    }

    pub fn has_block(&self, pos: Position) -> bool {
        pos.is_valid() && self.layers()[pos.z as usize].contains(BlockKey::from_position(pos))
    }

    pub fn get_block(&self, pos: Position) -> Option<SharedBlock> {
        if !pos.is_valid() {
            return None;
        }
        self.layers()[pos.z as usize].get(BlockKey::from_position(pos)).cloned()
    }

    /// Block holding `pos`, created on first use. `None` for layers above `MAX_Z`.
    pub fn get_or_create_block(&self, pos: Position) -> Option<SharedBlock> {
        if !pos.is_valid() {
            return None;
        }
        let mut layers = self.layers();
        Some(Arc::clone(layers[pos.z as usize].get_or_create(BlockKey::from_position(pos))))
    }

    pub fn block_count(&self) -> usize {
        self.layers().iter().map(SpatialIndex::len).sum()
    }

    pub fn layer_block_count(&self, z: u8) -> usize {
        self.layers().get(z as usize).map(SpatialIndex::len).unwrap_or(0)
    }

    pub fn seen_block_count(&self) -> usize {
        self.seen_blocks().len()
    }

    /// Record what the map model currently knows about `pos`
    pub fn update_tile(&self, pos: Position, tile: Option<&TileInfo>) {
        let minimap_tile = MinimapTile::from_tile(tile);
        if minimap_tile == MinimapTile::default() {
            return;
        }
        let Some(block) = self.get_or_create_block(pos) else {
            tracing::debug!(?pos, "ignoring tile update above the top layer");
            return;
        };
        let (x, y) = local_offset(pos);
        write_block(&block).update_tile(x, y, minimap_tile);
    }

    pub fn get_tile(&self, pos: Position) -> MinimapTile {
        self.thread_safe_get_tile(pos).1
    }

    /// Copy out the owning block handle under the cache lock, then read the
    /// tile from it
    pub fn thread_safe_get_tile(&self, pos: Position) -> (Option<SharedBlock>, MinimapTile) {
        if !pos.is_valid() {
            return (None, MinimapTile::default());
        }
        let block = self.layers()[pos.z as usize].get(BlockKey::from_position(pos)).cloned();
        match block {
            Some(block) => {
                let (x, y) = local_offset(pos);
                let tile = read_block(&block).tile(x, y);
                (Some(block), tile)
            }
            None => (None, MinimapTile::default()),
        }
    }

    /// Seen blocks across all layers, in layer then index order
    fn seen_blocks(&self) -> Vec<(Position, SharedBlock)> {
        let all: Vec<(Position, SharedBlock)> = self
            .layers()
            .iter()
            .enumerate()
            .flat_map(|(z, layer)| layer.iter().map(move |(key, block)| (key.origin(z as u8), Arc::clone(block))))
            .collect();
        all.into_iter().filter(|(_, block)| read_block(block).was_seen()).collect()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encode every seen block as an OTMM stream
    pub fn write_otmm<W: Write + Seek>(&self, inner: W) -> Result<W> {
        let mut writer = OtmmWriter::new(inner, &self.config.description, self.config.compression_level)?;
        for (origin, block) in self.seen_blocks() {
            let payload = read_block(&block).to_bytes();
            writer.write_block(origin, &payload)?;
        }
        writer.finish()
    }

    /// Merge blocks from an OTMM stream.
    ///
    /// A bad signature or version fails the whole load. A corrupt record
    /// stops the read but keeps every block before it.
    pub fn read_otmm<R: Read + Seek>(&self, inner: R) -> Result<LoadReport> {
        let mut reader = OtmmReader::new(inner)?;
        let mut report = LoadReport {
            description: reader.header().description.clone(),
            blocks: 0,
            truncated: false,
        };

        loop {
            match reader.next_block() {
                Ok(Some(record)) => {
                    let Some(block) = self.get_or_create_block(record.position) else {
                        break;
                    };
                    let mut block = write_block(&block);
                    block.load_bytes(&record.payload)?;
                    block.mark_dirty();
                    block.just_saw();
                    report.blocks += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, blocks = report.blocks, "OTMM stream corrupted, keeping blocks read so far");
                    report.truncated = true;
                    break;
                }
            }
        }

        Ok(report)
    }

    pub fn load_otmm(&self, path: impl AsRef<Path>) -> Result<LoadReport> {
        let path = path.as_ref();
        let result = File::open(path)
            .map_err(Error::from)
            .and_then(|file| self.read_otmm(BufReader::new(file)));
        match &result {
            Ok(report) => tracing::info!(path = %path.display(), blocks = report.blocks, truncated = report.truncated, "loaded OTMM minimap"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to load OTMM minimap"),
        }
        result
    }

    /// Save through `<path>.tmp`, replacing `path` only with a plausible file
    pub fn save_otmm(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let started = Instant::now();
        let result = self.save_otmm_atomic(path);
        match &result {
            Ok(()) => tracing::info!(
                path = %path.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "saved OTMM minimap"
            ),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to save OTMM minimap"),
        }
        result
    }

    fn save_otmm_atomic(&self, path: &Path) -> Result<()> {
        let tmp_path = tmp_path(path);
        let result = self.write_tmp(&tmp_path).and_then(|size| {
            if size <= self.config.min_save_size {
                return Err(Error::SaveTooSmall { size, min: self.config.min_save_size });
            }
            fs::rename(&tmp_path, path).map_err(Error::from)
        });

        if result.is_err() && tmp_path.exists() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                tracing::warn!(path = %tmp_path.display(), error = %e, "failed to remove temporary save file");
            }
        }
        result
    }

    /// Write the OTMM stream to `tmp_path` and return its size on disk
    fn write_tmp(&self, tmp_path: &Path) -> Result<u64> {
        let file = File::create(tmp_path)?;
        let mut out = self.write_otmm(BufWriter::new(file))?;
        out.flush()?;
        drop(out);
        Ok(fs::metadata(tmp_path)?.len())
    }

    // ------------------------------------------------------------------
    // Markers
    // ------------------------------------------------------------------

    pub fn add_marker(&self, pos: Position, icon: u8, description: impl Into<String>) {
        self.markers_mut().add(pos, icon, description);
    }

    pub fn remove_marker(&self, pos: Position) -> Option<Marker> {
        self.markers_mut().remove(pos)
    }

    pub fn clear_markers(&self) {
        self.markers_mut().clear();
    }

    pub fn has_marker(&self, pos: Position) -> bool {
        self.markers().contains(pos)
    }

    pub fn get_marker(&self, pos: Position) -> Option<Marker> {
        self.markers().get(pos).cloned()
    }

    pub fn markers_in_range(&self, center: Position, range: i32) -> Vec<Marker> {
        self.markers().in_range(center, range)
    }

    pub fn marker_count(&self) -> usize {
        self.markers().len()
    }

    pub fn markers_loaded(&self) -> bool {
        self.markers().is_loaded()
    }

    pub fn load_markers_from_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let result = fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|text| self.markers_mut().load_json(&text));
        match &result {
            Ok(count) => tracing::info!(path = %path.display(), count, "loaded minimap markers"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to load minimap markers"),
        }
        result
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
