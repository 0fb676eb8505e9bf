#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system responsible for emitting wall and trap commands.

use fogline_core::{BuildError, CellCoord, Command, Event, TrapKind};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player asked for a wall on this frame.
    pub build_wall: bool,
    /// Trap the player asked for on this frame, if any.
    pub trap: Option<TrapKind>,
    /// Cell explicitly targeted by the cursor; defaults to the player's cell.
    pub cursor_cell: Option<CellCoord>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        build_wall: bool,
        trap: Option<TrapKind>,
        cursor_cell: Option<CellCoord>,
    ) -> Self {
        Self {
            build_wall,
            trap,
            cursor_cell,
        }
    }
}

/// Builder system that translates input into construction commands.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    last_rejection: Option<BuildError>,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_rejection: None,
        }
    }

    /// Consumes world events and adapter-derived input to emit builder commands.
    ///
    /// Structures are placed on the cursor cell when one is given and on the
    /// player's own cell otherwise. Without either nothing is emitted.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: BuilderInput,
        player_cell: Option<CellCoord>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::BuildRejected { reason, .. } => self.last_rejection = Some(*reason),
                Event::WallBuilt { .. }
                | Event::TrapPlaced { .. }
                | Event::GridConfigured { .. } => {
                    self.last_rejection = None;
                }
                _ => {}
            }
        }

        let Some(cell) = input.cursor_cell.or(player_cell) else {
            return;
        };

        if input.build_wall {
            out.push(Command::BuildWall { cell });
        }

        if let Some(kind) = input.trap {
            out.push(Command::PlaceTrap { cell, kind });
        }
    }

    /// Reason the most recent build request failed, cleared by the next success.
    #[must_use]
    pub const fn last_rejection(&self) -> Option<BuildError> {
        self.last_rejection
    }
}
