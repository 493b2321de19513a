//! Tests for layered tiles, uniqueness assignment, and the buffer adapter

#[cfg(test)]
mod tests {
    use tileweave::spatial::tiles::{
        LayeredTile, MapBuffer, TileGrid, TileHandle, UniqueTileMap,
    };
    use tileweave::spatial::Region;

    // Tests element-wise equality and the empty sentinel
    // Verified by comparing only the first layer
    #[test]
    fn test_layered_tile_equality() {
        let a = LayeredTile::new(vec![Some(TileHandle(1)), None]);
        let b = LayeredTile::new(vec![Some(TileHandle(1)), None]);
        let c = LayeredTile::new(vec![Some(TileHandle(1)), Some(TileHandle(2))]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        assert!(LayeredTile::empty(3).is_empty());
        assert!(!c.is_empty());
        assert_eq!(c.layer(1), Some(TileHandle(2)));
        assert_eq!(c.layer(5), None);
    }

    // Tests indices are assigned once and stay stable
    // Verified by assigning a fresh index on every lookup
    #[test]
    fn test_unique_map_assignment() {
        let mut unique = UniqueTileMap::new();
        let grass = LayeredTile::new(vec![Some(TileHandle(10))]);
        let wall = LayeredTile::new(vec![Some(TileHandle(20))]);

        assert_eq!(unique.get_or_assign(&grass), 0);
        assert_eq!(unique.get_or_assign(&wall), 1);
        assert_eq!(unique.get_or_assign(&grass), 0);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique.index_of(&wall), Some(1));
    }

    // Tests rebuilding a map from a tile table preserves the indices
    // Verified by reversing the table before rebuilding
    #[test]
    fn test_unique_map_from_tiles() {
        let tiles = vec![
            LayeredTile::new(vec![Some(TileHandle(3))]),
            LayeredTile::new(vec![Some(TileHandle(7))]),
        ];
        let mut unique = UniqueTileMap::from_tiles(tiles);
        assert_eq!(
            unique.index_of(&LayeredTile::new(vec![Some(TileHandle(7))])),
            Some(1)
        );
        assert_eq!(
            unique.get_or_assign(&LayeredTile::new(vec![Some(TileHandle(9))])),
            2
        );
    }

    // Tests block reads reflect writes, including clears
    // Verified by ignoring the None write path
    #[test]
    fn test_map_buffer_read_write() {
        let mut buffer = MapBuffer::new(2);
        buffer.set(0, 3, -2, Some(TileHandle(5)));
        buffer.set(1, 3, -2, Some(TileHandle(6)));
        assert_eq!(buffer.get(0, 3, -2), Some(TileHandle(5)));

        buffer.set(0, 3, -2, None);
        assert_eq!(buffer.get(0, 3, -2), None);
        assert_eq!(buffer.get(1, 3, -2), Some(TileHandle(6)));

        let block = buffer.read_block(1, Region::new([3, -2], [2, 2]));
        assert_eq!(block[[0, 0]], Some(TileHandle(6)));
        assert_eq!(block[[1, 1]], None);
    }

    // Tests occupied bounds cover exactly the written cells
    // Verified by off-by-one on the inclusive maximum
    #[test]
    fn test_occupied_bounds() {
        let mut buffer = MapBuffer::new(1);
        assert!(buffer.occupied_bounds(0).is_none());

        buffer.set(0, -1, 2, Some(TileHandle(1)));
        buffer.set(0, 4, 5, Some(TileHandle(1)));
        let bounds = buffer.occupied_bounds(0).unwrap();
        assert_eq!(bounds.origin, [-1, 2]);
        assert_eq!(bounds.size, [6, 4]);
    }
}
