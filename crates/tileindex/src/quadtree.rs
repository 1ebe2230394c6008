use log::{debug, info};

use crate::{BoundingBox, IndexConfig, IndexError, StatusOr, TileCatalog, TileId};

/// A tile in the index
#[derive(Clone, Debug, PartialEq)]
pub struct TileNode {
    pub id: TileId,
    pub bbox: BoundingBox,
    pub depth: u32,
    /// Arena indexes of the four quadrants, `None` for leaves.
    children: Option<[usize; 4]>,
}

impl TileNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Quad tree of tiles over one fixed root box. Nodes are stored in an arena and
/// never change after [`TileIndex::build`].
#[derive(Clone, Debug)]
pub struct TileIndex {
    nodes: Vec<TileNode>,
    config: IndexConfig,
}

impl TileIndex {
    /// Builds the tree by quartering every node for which the catalog holds all four
    /// children, down to `config.max_depth`.
    pub fn build(config: IndexConfig, catalog: &dyn TileCatalog) -> StatusOr<Self> {
        config.validate()?;

        let mut index = TileIndex {
            nodes: vec![TileNode {
                id: TileId::root(),
                bbox: config.root,
                depth: 0,
                children: None,
            }],
            config,
        };
        index.subdivide(0, catalog)?;

        info!(
            "Built tile index with {} tiles, deepest level {}",
            index.nodes.len(),
            index.deepest_level()
        );
        Ok(index)
    }

    fn subdivide(&mut self, idx: usize, catalog: &dyn TileCatalog) -> StatusOr<()> {
        let (id, bbox, depth) = {
            let node = &self.nodes[idx];
            (node.id.clone(), node.bbox, node.depth)
        };
        if depth >= self.config.max_depth {
            return Ok(());
        }

        let child_ids = id.children();
        let present = child_ids.iter().filter(|c| catalog.contains(c)).count();
        match present {
            0 => return Ok(()),
            4 => {}
            _ => return Err(IndexError::IncompleteLevel { parent: id, present }),
        }

        let first = self.nodes.len();
        for (child_id, child_bbox) in child_ids.into_iter().zip(bbox.quadrants()) {
            self.nodes.push(TileNode {
                id: child_id,
                bbox: child_bbox,
                depth: depth + 1,
                children: None,
            });
        }
        self.nodes[idx].children = Some([first, first + 1, first + 2, first + 3]);

        for child in first..first + 4 {
            self.subdivide(child, catalog)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn root(&self) -> &TileNode {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, node: &TileNode) -> impl Iterator<Item = &TileNode> + '_ {
        node.children
            .into_iter()
            .flatten()
            .map(move |idx| &self.nodes[idx])
    }

    /// Looks up a tile by id by walking its digit path.
    #[cfg(test)]
    fn get(&self, id: &TileId) -> Option<&TileNode> {
        let mut node = self.root();
        for digit in id.as_str().bytes() {
            let quadrant = (digit - b'1') as usize;
            let children = node.children?;
            node = &self.nodes[children[quadrant]];
        }
        Some(node)
    }

    pub fn deepest_level(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Number of tiles on each level, index 0 being the root level.
    pub fn level_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.deepest_level() as usize + 1];
        for node in &self.nodes {
            counts[node.depth as usize] += 1;
        }
        counts
    }

    /// Tiles at `depth` that intersect `query`. A branch that ends above `depth`
    /// contributes its deepest tile instead.
    pub fn collect_tiles(&self, depth: u32, query: &BoundingBox) -> Vec<&TileNode> {
        let mut tiles = Vec::new();
        self.collect_into(0, depth, query, &mut tiles);
        tiles
    }

    fn collect_into<'a>(
        &'a self,
        idx: usize,
        depth: u32,
        query: &BoundingBox,
        tiles: &mut Vec<&'a TileNode>,
    ) {
        let node = &self.nodes[idx];
        if !node.bbox.intersects(query) {
            return;
        }
        if node.depth >= depth {
            tiles.push(node);
            return;
        }
        match node.children {
            Some(children) => {
                for child in children {
                    self.collect_into(child, depth, query, tiles);
                }
            }
            None => {
                debug!(
                    "Branch '{}' ends at depth {}, substituting it for depth {}",
                    node.id, node.depth, depth
                );
                tiles.push(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCatalog;

    fn unit_config(max_depth: u32) -> IndexConfig {
        IndexConfig {
            root: BoundingBox::new(1.0, 0.0, 0.0, 1.0),
            max_depth,
            tile_size: 256,
        }
    }

    #[test]
    fn test_build_complete_tree() {
        let index = TileIndex::build(unit_config(3), &MemoryCatalog::complete(3)).unwrap();
        assert_eq!(index.len(), 1 + 4 + 16 + 64);
        assert_eq!(index.level_counts(), vec![1, 4, 16, 64]);
    }

    #[test]
    fn test_build_stops_at_max_depth() {
        let index = TileIndex::build(unit_config(2), &MemoryCatalog::complete(4)).unwrap();
        assert_eq!(index.deepest_level(), 2);
    }

    #[test]
    fn test_children_quarter_parent() {
        let index = TileIndex::build(unit_config(2), &MemoryCatalog::complete(2)).unwrap();
        for node in (0..index.len()).map(|i| &index.nodes[i]) {
            let children: Vec<_> = index.children(node).collect();
            if node.is_leaf() {
                assert!(children.is_empty());
                continue;
            }
            assert_eq!(children.len(), 4);
            for (child, (quadrant, expected)) in
                children.iter().zip((1u8..=4).zip(node.bbox.quadrants()))
            {
                assert_eq!(Some(child.id.clone()), node.id.child(quadrant));
                assert_eq!(child.bbox, expected);
                assert_eq!(child.depth, node.depth + 1);
            }
        }
    }

    #[test]
    fn test_get_by_id() {
        let index = TileIndex::build(unit_config(2), &MemoryCatalog::complete(2)).unwrap();
        let tile = index.get(&TileId::parse("24").unwrap()).unwrap();
        assert_eq!(tile.bbox, BoundingBox::new(0.75, 0.75, 0.5, 1.0));
        assert!(index.get(&TileId::parse("241").unwrap()).is_none());
    }

    #[test]
    fn test_incomplete_level_aborts() {
        let mut catalog = MemoryCatalog::complete(2);
        catalog.remove(&TileId::parse("23").unwrap());
        match TileIndex::build(unit_config(2), &catalog) {
            Err(IndexError::IncompleteLevel { parent, present }) => {
                assert_eq!(parent.as_str(), "2");
                assert_eq!(present, 3);
            }
            other => panic!("expected incomplete level, got {:?}", other.map(|i| i.len())),
        }
    }

    #[test]
    fn test_collect_whole_region() {
        let index = TileIndex::build(unit_config(3), &MemoryCatalog::complete(3)).unwrap();
        let root = index.root().bbox;
        assert_eq!(index.collect_tiles(0, &root).len(), 1);
        assert_eq!(index.collect_tiles(2, &root).len(), 16);
    }

    #[test]
    fn test_collect_only_intersecting() {
        let index = TileIndex::build(unit_config(2), &MemoryCatalog::complete(2)).unwrap();
        let query = BoundingBox::new(0.9, 0.1, 0.6, 0.4);
        let tiles = index.collect_tiles(2, &query);
        let mut ids: Vec<_> = tiles.iter().map(|t| t.id.as_str().to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["11", "12", "13", "14"]);
        assert!(tiles.iter().all(|t| t.bbox.intersects(&query)));
    }

    #[test]
    fn test_collect_outside_region_is_empty() {
        let index = TileIndex::build(unit_config(2), &MemoryCatalog::complete(2)).unwrap();
        let query = BoundingBox::new(10.0, 10.0, 9.0, 11.0);
        assert!(index.collect_tiles(2, &query).is_empty());
    }

    #[test]
    fn test_collect_substitutes_shallow_branch() {
        // quadrant 4 is only rendered down to depth 1
        let catalog: MemoryCatalog = MemoryCatalog::complete(2)
            .into_ids()
            .filter(|id| !(id.depth() == 2 && id.as_str().starts_with('4')))
            .collect();
        let index = TileIndex::build(unit_config(2), &catalog).unwrap();

        let tiles = index.collect_tiles(2, &index.root().bbox);
        assert_eq!(tiles.len(), 12 + 1);
        let shallow: Vec<_> = tiles.iter().filter(|t| t.depth == 1).collect();
        assert_eq!(shallow.len(), 1);
        assert_eq!(shallow[0].id.as_str(), "4");
    }

    #[test]
    fn test_collect_covers_query() {
        let index = TileIndex::build(unit_config(3), &MemoryCatalog::complete(3)).unwrap();
        // sticks out of the indexed region to the east and south
        let query = BoundingBox::new(0.83, 0.12, -0.4, 1.6);
        let tiles = index.collect_tiles(3, &query);
        assert!(tiles.iter().all(|t| t.bbox.intersects(&query)));

        let covered = index.root().bbox.intersection(&query).unwrap();
        assert_eq!(covered, BoundingBox::new(0.83, 0.12, 0.0, 1.0));
        let steps = 40;
        for i in 0..=steps {
            for j in 0..=steps {
                let lat = covered.lrlat + covered.lat_height() * i as f64 / steps as f64;
                let lon = covered.ullon + covered.lon_width() * j as f64 / steps as f64;
                assert!(
                    tiles.iter().any(|t| t.bbox.contains_point(lat, lon)),
                    "({}, {}) not covered",
                    lat,
                    lon
                );
            }
        }
    }

    #[test]
    fn test_collect_is_repeatable() {
        let index = TileIndex::build(unit_config(3), &MemoryCatalog::complete(3)).unwrap();
        let query = BoundingBox::new(0.7, 0.2, 0.3, 0.9);
        assert_eq!(index.collect_tiles(3, &query), index.collect_tiles(3, &query));
    }
}
