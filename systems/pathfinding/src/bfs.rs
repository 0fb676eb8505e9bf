//! Breadth-first wave scan grouped by graph distance.

use std::collections::VecDeque;

use fogline_core::{CellCoord, GridView};

const UNVISITED: u32 = u32::MAX;

/// Cells reached by a wave scan, grouped by distance from its origin.
///
/// Layer `d` holds exactly the cells whose shortest 4-connected walkable
/// distance from the origin is `d`. Movement costs play no role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanLayers {
    layers: Vec<Vec<CellCoord>>,
}

impl ScanLayers {
    /// Number of layers, `radius + 1` for an in-bounds origin with the radius
    /// capped at the grid's cell count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Reports whether the scan produced no layers at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Cells at the provided distance from the origin.
    #[must_use]
    pub fn layer(&self, distance: usize) -> Option<&[CellCoord]> {
        self.layers.get(distance).map(Vec::as_slice)
    }

    /// Iterator over layers in increasing distance.
    pub fn iter(&self) -> impl Iterator<Item = &[CellCoord]> {
        self.layers.iter().map(Vec::as_slice)
    }

    /// Total number of cells across every layer.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }
}

/// Groups the cells within `radius` steps of `origin` by distance.
///
/// The origin forms layer 0 even when it is blocked, so a scan from a cell
/// that was just walled over still reports the cell itself; expansion only
/// enters walkable neighbours. An origin outside the grid yields no layers.
/// Layers past the reachable region are present but empty. No distance can
/// exceed the cell count, so larger radii are capped there.
#[must_use]
pub fn scan_layers(grid: GridView<'_>, origin: CellCoord, radius: u32) -> ScanLayers {
    let Some(origin_index) = grid.index(origin) else {
        return ScanLayers::default();
    };
    let radius = radius.min(u32::try_from(grid.cell_count()).unwrap_or(u32::MAX));

    let layer_count = usize::try_from(radius).map_or(0, |radius| radius.saturating_add(1));
    let mut layers: Vec<Vec<CellCoord>> = vec![Vec::new(); layer_count];
    let mut distances = vec![UNVISITED; grid.cell_count()];
    let mut queue = VecDeque::new();

    distances[origin_index] = 0;
    if let Some(first) = layers.first_mut() {
        first.push(origin);
    }
    queue.push_back(origin);

    while let Some(cell) = queue.pop_front() {
        let Some(current_index) = grid.index(cell) else {
            continue;
        };
        let current_distance = distances[current_index];
        if current_distance >= radius {
            continue;
        }

        let next_distance = current_distance + 1;
        for neighbor in grid.neighbors(cell) {
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            if distances[neighbor_index] != UNVISITED {
                continue;
            }

            distances[neighbor_index] = next_distance;
            if let Some(layer) = usize::try_from(next_distance)
                .ok()
                .and_then(|distance| layers.get_mut(distance))
            {
                layer.push(neighbor);
            }
            queue.push_back(neighbor);
        }
    }

    ScanLayers { layers }
}
