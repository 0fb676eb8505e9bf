#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fog-of-war driver that reveals wave scans one layer at a time.
//!
//! A scan trigger runs a layered breadth-first search from the triggering
//! cell. Every layer then stays pending for a fixed duration before it joins
//! the reveal mask, which produces the expanding "sonar" effect. Within a
//! level the mask only ever grows.

use std::time::Duration;

use fogline_core::{
    CellCoord, Direction, Event, GridView, DEFAULT_LAYER_DURATION, DEFAULT_SCAN_RADIUS,
    MAX_SCAN_RADIUS,
};
use fogline_system_pathfinding::{scan_layers, ScanLayers};
use tracing::debug;

/// Configuration parameters required to construct the fog driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FogConfig {
    radius: u32,
    layer_duration: Duration,
}

impl FogConfig {
    /// Creates a configuration, rejecting a zero layer duration and radii
    /// above [`MAX_SCAN_RADIUS`].
    pub fn new(radius: u32, layer_duration: Duration) -> Result<Self, FogConfigError> {
        if layer_duration.is_zero() {
            return Err(FogConfigError::ZeroLayerDuration);
        }
        if radius > MAX_SCAN_RADIUS {
            return Err(FogConfigError::RadiusTooLarge { radius });
        }
        Ok(Self {
            radius,
            layer_duration,
        })
    }

    /// Maximum scan distance in cells.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Time each layer stays pending before it is revealed.
    #[must_use]
    pub const fn layer_duration(&self) -> Duration {
        self.layer_duration
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SCAN_RADIUS,
            layer_duration: DEFAULT_LAYER_DURATION,
        }
    }
}

/// Reasons a [`FogConfig`] cannot be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FogConfigError {
    /// Layers must stay pending for a positive amount of time.
    #[error("fog layer duration must be positive")]
    ZeroLayerDuration,
    /// The scan radius exceeds [`MAX_SCAN_RADIUS`].
    #[error("fog scan radius {radius} exceeds the limit of 1024")]
    RadiusTooLarge {
        /// Rejected radius.
        radius: u32,
    },
}

/// Dense, grow-only set of revealed cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealMask {
    revealed: Vec<bool>,
    columns: u32,
    rows: u32,
    count: usize,
}

impl RevealMask {
    /// Creates a mask with every cell hidden.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            revealed: vec![false; capacity],
            columns,
            rows,
            count: 0,
        }
    }

    /// Dimensions the mask covers.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Reports whether the cell has been revealed. Cells outside the mask
    /// are never revealed.
    #[must_use]
    pub fn is_revealed(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.revealed.get(index).copied())
            .unwrap_or(false)
    }

    /// Number of revealed cells.
    #[must_use]
    pub const fn revealed_count(&self) -> usize {
        self.count
    }

    /// Reveals a cell. Returns `true` when it was hidden before.
    pub fn reveal(&mut self, cell: CellCoord) -> bool {
        let Some(slot) = self.index(cell).and_then(|index| self.revealed.get_mut(index)) else {
            return false;
        };
        if *slot {
            return false;
        }
        *slot = true;
        self.count += 1;
        true
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Time-paced driver turning scan layers into revealed cells.
#[derive(Debug)]
pub struct FogReveal {
    config: FogConfig,
    mask: RevealMask,
    layers: ScanLayers,
    current_layer: usize,
    timer: Duration,
}

impl FogReveal {
    /// Creates a fully hidden driver covering a grid of the given size.
    #[must_use]
    pub fn new(config: FogConfig, columns: u32, rows: u32) -> Self {
        Self {
            config,
            mask: RevealMask::new(columns, rows),
            layers: ScanLayers::default(),
            current_layer: 0,
            timer: Duration::ZERO,
        }
    }

    /// Consumes world events, starting scans and pacing reveals.
    pub fn handle(&mut self, events: &[Event], grid: GridView<'_>) {
        for event in events {
            match event {
                Event::GridConfigured { columns, rows } => self.reset(*columns, *rows),
                Event::ScanRequested { origin } => self.start_scan(*origin, grid),
                Event::TimeAdvanced { dt } => self.advance(*dt, grid),
                _ => {}
            }
        }
    }

    /// Hides every cell and forgets pending layers, e.g. on a level change.
    pub fn reset(&mut self, columns: u32, rows: u32) {
        self.mask = RevealMask::new(columns, rows);
        self.layers = ScanLayers::default();
        self.current_layer = 0;
        self.timer = Duration::ZERO;
    }

    /// Runs a scan from `origin` whose layers will be revealed over time.
    ///
    /// Layers still pending from an earlier scan are replaced; cells already
    /// revealed stay revealed.
    pub fn start_scan(&mut self, origin: CellCoord, grid: GridView<'_>) {
        self.ensure_dimensions(grid);
        self.layers = scan_layers(grid, origin, self.config.radius);
        self.current_layer = 0;
        self.timer = Duration::ZERO;
        debug!(
            column = origin.column(),
            row = origin.row(),
            layers = self.layers.len(),
            "scan started"
        );
    }

    /// Reveals a complete scan from `origin` immediately.
    pub fn reveal_now(&mut self, origin: CellCoord, grid: GridView<'_>) {
        self.start_scan(origin, grid);
        while self.current_layer < self.layers.len() {
            self.reveal_current_layer(grid);
        }
    }

    /// Advances the reveal timer, revealing at most one layer.
    pub fn advance(&mut self, dt: Duration, grid: GridView<'_>) {
        if !self.is_animating() {
            return;
        }

        self.timer = self.timer.saturating_add(dt);
        if self.timer >= self.config.layer_duration {
            self.reveal_current_layer(grid);
            self.timer = Duration::ZERO;
        }
    }

    /// Reports whether the cell has been revealed.
    #[must_use]
    pub fn is_revealed(&self, cell: CellCoord) -> bool {
        self.mask.is_revealed(cell)
    }

    /// Index of the next layer to be revealed.
    #[must_use]
    pub const fn current_layer(&self) -> usize {
        self.current_layer
    }

    /// Number of layers in the latest scan.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Reports whether layers are still pending.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.current_layer < self.layers.len()
    }

    /// Number of revealed cells.
    #[must_use]
    pub const fn revealed_count(&self) -> usize {
        self.mask.revealed_count()
    }

    /// Read-only access to the reveal mask.
    #[must_use]
    pub fn mask(&self) -> &RevealMask {
        &self.mask
    }

    fn ensure_dimensions(&mut self, grid: GridView<'_>) {
        let (columns, rows) = grid.dimensions();
        if self.mask.dimensions() != (columns, rows) {
            self.mask = RevealMask::new(columns, rows);
        }
    }

    fn reveal_current_layer(&mut self, grid: GridView<'_>) {
        let Some(layer) = self.layers.layer(self.current_layer) else {
            self.current_layer = self.layers.len();
            return;
        };

        let mut newly_revealed = 0_usize;
        for &cell in layer {
            if self.mask.reveal(cell) {
                newly_revealed += 1;
            }
            // Walls framing the scanned area become visible with it.
            for direction in Direction::ALL {
                let Some(neighbor) = cell.step(direction) else {
                    continue;
                };
                if grid.contains(neighbor)
                    && !grid.is_walkable(neighbor)
                    && self.mask.reveal(neighbor)
                {
                    newly_revealed += 1;
                }
            }
        }

        debug!(layer = self.current_layer, newly_revealed, "fog layer revealed");
        self.current_layer += 1;
    }
}

impl Default for FogReveal {
    fn default() -> Self {
        Self::new(FogConfig::default(), 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogline_core::Cell;

    fn step(fog: &mut FogReveal, grid: GridView<'_>) {
        fog.advance(DEFAULT_LAYER_DURATION, grid);
    }

    #[test]
    fn config_rejects_zero_layer_duration() {
        assert_eq!(
            FogConfig::new(5, Duration::ZERO),
            Err(FogConfigError::ZeroLayerDuration)
        );
        assert_eq!(FogConfig::default().radius(), 5);
    }

    #[test]
    fn config_rejects_oversized_radius() {
        let layer = Duration::from_millis(150);
        assert_eq!(
            FogConfig::new(4_000_000_000, layer),
            Err(FogConfigError::RadiusTooLarge {
                radius: 4_000_000_000
            })
        );
        assert_eq!(
            FogConfig::new(MAX_SCAN_RADIUS, layer).map(|config| config.radius()),
            Ok(MAX_SCAN_RADIUS)
        );
    }

    #[test]
    fn layers_are_revealed_one_per_layer_duration() {
        let cells = vec![Cell::FLOOR; 100];
        let grid = GridView::new(&cells, 10, 10);
        let config = FogConfig::new(2, Duration::from_millis(150)).expect("valid config");
        let mut fog = FogReveal::new(config, 10, 10);

        fog.start_scan(CellCoord::new(2, 2), grid);
        assert!(fog.is_animating());
        assert_eq!(fog.revealed_count(), 0);

        fog.advance(Duration::from_millis(100), grid);
        assert_eq!(fog.revealed_count(), 0);
        fog.advance(Duration::from_millis(50), grid);
        assert_eq!(fog.revealed_count(), 1);
        assert_eq!(fog.current_layer(), 1);

        step(&mut fog, grid);
        assert_eq!(fog.revealed_count(), 5);
        step(&mut fog, grid);
        assert_eq!(fog.revealed_count(), 13);
        assert!(!fog.is_animating());

        step(&mut fog, grid);
        assert_eq!(fog.revealed_count(), 13);
    }

    #[test]
    fn walls_adjacent_to_revealed_cells_become_visible() {
        let mut cells = vec![Cell::FLOOR; 9];
        cells[1] = Cell::WALL;
        let grid = GridView::new(&cells, 3, 3);
        let mut fog = FogReveal::new(
            FogConfig::new(0, Duration::from_millis(10)).expect("valid config"),
            3,
            3,
        );

        fog.reveal_now(CellCoord::new(0, 0), grid);

        assert!(fog.is_revealed(CellCoord::new(0, 0)));
        assert!(fog.is_revealed(CellCoord::new(1, 0)));
        assert!(!fog.is_revealed(CellCoord::new(0, 1)));
    }

    #[test]
    fn level_change_hides_everything() {
        let cells = vec![Cell::FLOOR; 16];
        let grid = GridView::new(&cells, 4, 4);
        let mut fog = FogReveal::new(FogConfig::default(), 4, 4);
        fog.reveal_now(CellCoord::new(1, 1), grid);
        assert_eq!(fog.revealed_count(), 16);

        fog.handle(&[Event::GridConfigured { columns: 6, rows: 6 }], grid);

        assert_eq!(fog.revealed_count(), 0);
        assert_eq!(fog.mask().dimensions(), (6, 6));
        assert!(!fog.is_animating());
    }

    #[test]
    fn new_scan_replaces_pending_layers_without_hiding() {
        let cells = vec![Cell::FLOOR; 100];
        let grid = GridView::new(&cells, 10, 10);
        let mut fog = FogReveal::new(
            FogConfig::new(3, Duration::from_millis(150)).expect("valid config"),
            10,
            10,
        );

        fog.start_scan(CellCoord::new(0, 0), grid);
        step(&mut fog, grid);
        step(&mut fog, grid);
        let before = fog.revealed_count();

        fog.handle(
            &[Event::ScanRequested {
                origin: CellCoord::new(9, 9),
            }],
            grid,
        );
        assert_eq!(fog.current_layer(), 0);
        assert!(fog.is_revealed(CellCoord::new(0, 0)));
        assert_eq!(fog.revealed_count(), before);
    }

    #[test]
    fn mask_ignores_out_of_bounds_cells() {
        let mut mask = RevealMask::new(2, 2);
        assert!(!mask.reveal(CellCoord::new(2, 0)));
        assert!(mask.reveal(CellCoord::new(1, 1)));
        assert!(!mask.reveal(CellCoord::new(1, 1)));
        assert_eq!(mask.revealed_count(), 1);
    }
}
