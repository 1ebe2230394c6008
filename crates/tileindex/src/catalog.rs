use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{IndexError, StatusOr};

/// Key of the root tile in a catalog. Every other tile is keyed by its digit path.
pub const ROOT_KEY: &str = "root";

/// Digit path of a tile from the root: "24" is the 4th child of the 2nd child of
/// the root. The root itself has the empty path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(String);

impl TileId {
    pub fn root() -> Self {
        TileId(String::new())
    }

    /// Child in quadrant 1..=4 (top-left, top-right, bottom-left, bottom-right).
    /// Any other quadrant has no child.
    pub fn child(&self, quadrant: u8) -> Option<Self> {
        (1..=4).contains(&quadrant).then(|| self.push_digit(quadrant))
    }

    pub fn children(&self) -> [TileId; 4] {
        [1, 2, 3, 4].map(|quadrant| self.push_digit(quadrant))
    }

    fn push_digit(&self, quadrant: u8) -> Self {
        let mut path = self.0.clone();
        path.push(char::from(b'0' + quadrant));
        TileId(path)
    }

    /// Parses a digit path; `root` and the empty string both name the root.
    pub fn parse(s: &str) -> Option<Self> {
        if s == ROOT_KEY {
            return Some(Self::root());
        }
        s.bytes()
            .all(|b| (b'1'..=b'4').contains(&b))
            .then(|| TileId(s.to_string()))
    }

    pub fn depth(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name under which the tile image is stored in a catalog.
    pub fn catalog_key(&self) -> &str {
        if self.is_root() {
            ROOT_KEY
        } else {
            &self.0
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_key())
    }
}

/// Answers whether a tile image exists for a given id.
pub trait TileCatalog: Send + Sync {
    fn contains(&self, id: &TileId) -> bool;
}

/// Tile images stored as `<dir>/<key>.png`.
#[derive(Clone, Debug)]
pub struct DirCatalog {
    dir: PathBuf,
}

impl DirCatalog {
    pub fn new(dir: impl AsRef<Path>) -> StatusOr<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(IndexError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("tile directory not found: {:?}", dir),
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &TileId) -> PathBuf {
        self.dir.join(format!("{}.png", id.catalog_key()))
    }
}

impl TileCatalog for DirCatalog {
    fn contains(&self, id: &TileId) -> bool {
        self.path_for(id).is_file()
    }
}

/// In-memory set of tile ids, used where no image files are needed.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    ids: HashSet<TileId>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding every tile of a full quad tree down to `depth`.
    pub fn complete(depth: u32) -> Self {
        let mut catalog = Self::new();
        let mut level = vec![TileId::root()];
        catalog.insert(TileId::root());
        for _ in 0..depth {
            level = level.iter().flat_map(|id| id.children()).collect();
            for id in &level {
                catalog.insert(id.clone());
            }
        }
        catalog
    }

    pub fn insert(&mut self, id: TileId) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: &TileId) {
        self.ids.remove(id);
    }

    pub fn into_ids(self) -> impl Iterator<Item = TileId> {
        self.ids.into_iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl TileCatalog for MemoryCatalog {
    fn contains(&self, id: &TileId) -> bool {
        self.ids.contains(id)
    }
}

impl FromIterator<TileId> for MemoryCatalog {
    fn from_iter<I: IntoIterator<Item = TileId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
